//! Core XML parsing primitives
//!
//! This module contains the fundamental building blocks for XML parsing:
//! - Scanner: memchr-accelerated delimiter detection and name checks
//! - Tokenizer: Pull tokenizer for XML token extraction
//! - Entities: XML entity decoding and encoding with Cow (zero-copy when possible)
//! - Attributes: Attribute parsing and extraction

pub mod attributes;
pub mod entities;
pub mod scanner;
pub mod tokenizer;
