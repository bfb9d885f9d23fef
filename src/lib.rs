//! Self-organizing maps / Kohonen networks for classifying glyph feature vectors.
//!
//! The engine lives in [`map::som`](map/som/index.html). Everything around it (loading tables,
//! persistence, reports) is thin glue that never reaches into training.

pub mod calc;
pub mod cli;
pub mod data;
pub mod error;
pub mod map;
pub mod proc;
pub mod storage;

pub use error::{Result, SomError};

use core::fmt;

/// Error type for failed parsing of `String`s to `enum`s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError(String);

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ParseEnumError {}
