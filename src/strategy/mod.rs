//! Evaluation strategies
//!
//! - Batch XPath: many expressions against one document, parallel with the
//!   `parallel` feature

pub mod parallel;

pub use parallel::evaluate_all;
