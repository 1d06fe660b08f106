//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod json_document;
pub mod mock_submission_adapter;
pub mod static_quote_adapter;
