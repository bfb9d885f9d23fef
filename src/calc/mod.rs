//! Calculations like metrics, neighborhood, nearest neighbor search, decay schedules, ...

pub mod decay;
pub mod metric;
pub mod neighborhood;
pub mod nn;
