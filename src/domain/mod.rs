//! Core domain types and logic.

pub mod asset;
pub mod builder;
pub mod config_validation;
pub mod document;
pub mod error;
pub mod exit;
pub mod indicator;
pub mod outcome;
pub mod overlay;
pub mod rule;
pub mod symbols;
pub mod timeframe;
