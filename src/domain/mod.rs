//! Core domain types and logic.

pub mod cell;
pub mod ohlcv;
pub mod calendar;
pub mod resample;
pub mod returns;
pub mod rolling;
pub mod indicator;
pub mod ratio;
pub mod sentiment;
pub mod feature;
pub mod table;
pub mod plan;
pub mod inputs;
pub mod assembler;
pub mod config_validation;
pub mod error;
