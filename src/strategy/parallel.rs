//! Batch XPath evaluation
//!
//! Uses Rayon to evaluate many expressions against one document at once.
//! Without the `parallel` feature the same entry points run serially.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::dom::{DocumentAccess, DOCUMENT_NODE};
use crate::xpath::{evaluate_compiled, EvalContext, XPathCache, XPathValue};

/// Evaluate every expression from the document node, compiling through the
/// shared cache. Results come back in input order.
pub fn evaluate_all<D: DocumentAccess + Sync>(
    doc: &D,
    cache: &XPathCache,
    xpaths: &[&str],
) -> Vec<Result<XPathValue, String>> {
    let run = |xpath: &&str| {
        let compiled = cache.get_or_compile(xpath)?;
        evaluate_compiled(&compiled, &EvalContext::new(doc, DOCUMENT_NODE))
    };

    #[cfg(feature = "parallel")]
    {
        xpaths.par_iter().map(run).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        xpaths.iter().map(run).collect()
    }
}
