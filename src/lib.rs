//! xmlstructure - XML building and structural matching for tests
//!
//! Components:
//! - Builder: cursor-driven construction of documents (`XmlBuilder`)
//! - Matcher: XPath checks, CSS-or-XPath lookup and recursive structural
//!   containment against a target document (`XmlStructure`)
//! - Normalizer: documents, builders, node handles, XML text and JSON values
//!   into documents (`IntoXml`)
//!
//! Underneath sit an arena DOM with its parser and serializer, an XPath 1.0
//! engine with a compiled-expression cache, and a CSS selector translator.
//!
//! ```
//! use xmlstructure::{XmlBuilder, XmlStructure};
//!
//! let mut schema = XmlBuilder::new();
//! schema.child("user").child("email");
//!
//! let target = XmlStructure::new(
//!     "<users><user><name>davert</name><email>davert@mail.ua</email></user></users>",
//! )?;
//! assert!(target.contains_structure(&schema)?);
//! # Ok::<(), xmlstructure::Error>(())
//! ```

pub mod builder;
pub mod css;
pub mod dom;
pub mod error;
pub mod input;
pub mod structure;
pub mod xpath;

mod core;
mod reader;
mod strategy;

pub use builder::XmlBuilder;
pub use dom::{NodeKind, NodeRef, ParseOptions, XmlDocument};
pub use error::{Error, Result};
pub use input::IntoXml;
pub use structure::XmlStructure;
