//! Parsing error re-export
//!
//! This module re-exports the per-container parsing error types.

pub use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
