//! End-to-end tests for anomaly-sheets-xlsx.
//!
//! Each test builds the exact package it needs in memory (zip container plus
//! literal SpreadsheetML parts), then runs the reader or the highlighter
//! over the bytes and inspects the result.

mod common;
mod highlighting;

pub use common::*;
