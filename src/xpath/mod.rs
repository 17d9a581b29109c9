//! XPath 1.0 Engine
//!
//! Full XPath 1.0 implementation with:
//! - All 13 axes
//! - The core function library
//! - Compiled expression caching
//!
//! Attributes are not nodes here: `@name` selects attribute values as
//! strings, which is all structural matching needs.

pub mod lexer;
pub mod parser;
pub mod compiler;
pub mod eval;
pub mod axes;
pub mod functions;
pub mod value;
pub mod cache;

pub use cache::XPathCache;
pub use compiler::{compile, CompiledExpr};
pub use eval::{evaluate, evaluate_compiled, evaluate_from_node, EvalContext};
pub use value::XPathValue;
