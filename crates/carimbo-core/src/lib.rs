#![forbid(unsafe_code)]

//! Shared foundation for the carimbo signature library.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use algorithm::AlgorithmSuite;
pub use error::{Error, Result};
