//! Math tools module
//!
//! Tools for calculating and running code.

mod calculator;
mod python;

pub use calculator::{evaluate, format_number, CalculatorTool};
pub use python::{sanitize_code, PythonTool};
