//! Input/Output operations for metric evaluation
//!
//! This module handles logging setup and report formatting.

mod output;

pub use output::{print_validation_report, setup_output};
