//! stratbuilder: a step-gated builder for per-symbol trading strategy
//! documents.
//!
//! Hexagonal layout: the document model and builder live in [`domain`],
//! collaborator traits in [`ports`], concrete implementations in
//! [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod logging;
pub mod ports;
pub mod quote_feed;
