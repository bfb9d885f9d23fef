//! The SOM engine: parameters, stopping policy and the map itself.

pub mod convergence;
pub mod params;
pub mod som;
