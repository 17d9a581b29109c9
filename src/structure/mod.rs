//! Structural assertions over one target document
//!
//! [`XmlStructure`] answers three questions about the document it was built
//! from: does an XPath expression select anything, which node does a CSS or
//! XPath selector find first, and does the document contain the tag
//! structure of a schema document.

pub mod matcher;

use log::debug;

use crate::css::css_to_xpath;
use crate::dom::{DocumentAccess, NodeId, NodeRef, XmlDocument, DOCUMENT_NODE};
use crate::error::{Error, Result};
use crate::input::IntoXml;
use crate::strategy;
use crate::xpath::cache::DEFAULT_CAPACITY;
use crate::xpath::{evaluate_compiled, EvalContext, XPathCache, XPathValue};

/// Read-only matcher over a target document.
///
/// Compiled XPath expressions are cached, so the matcher is cheap to query
/// repeatedly and can be shared across threads.
///
/// ```
/// use xmlstructure::XmlStructure;
///
/// let xml = XmlStructure::new("<users><user><email/></user></users>")?;
/// assert!(xml.xpath_matches("//user/email")?);
/// assert_eq!(xml.find_element("users > user")?.name(), Some("user"));
/// assert!(xml.contains_structure("<user><email/></user>")?);
/// # Ok::<(), xmlstructure::Error>(())
/// ```
pub struct XmlStructure {
    doc: XmlDocument,
    cache: XPathCache,
}

impl XmlStructure {
    pub fn new(input: impl IntoXml) -> Result<Self> {
        Self::with_cache_capacity(input, DEFAULT_CAPACITY)
    }

    /// Matcher keeping up to `capacity` compiled expressions
    pub fn with_cache_capacity(input: impl IntoXml, capacity: usize) -> Result<Self> {
        Ok(XmlStructure {
            doc: input.into_xml()?,
            cache: XPathCache::new(capacity),
        })
    }

    /// The target document
    pub fn document(&self) -> &XmlDocument {
        &self.doc
    }

    /// Does `expr` select anything?
    ///
    /// A node-set is true when non-empty and a string list when it has any
    /// member; other results use XPath boolean conversion, so
    /// `count(//item) > 0` works as expected.
    pub fn xpath_matches(&self, expr: &str) -> Result<bool> {
        self.evaluate(expr)
            .map(|value| value.to_boolean())
            .map_err(|message| malformed(expr, &message))
    }

    /// [`xpath_matches`](Self::xpath_matches) for a batch of expressions,
    /// results in input order
    pub fn xpath_matches_all(&self, exprs: &[&str]) -> Vec<Result<bool>> {
        strategy::evaluate_all(&self.doc, &self.cache, exprs)
            .into_iter()
            .zip(exprs)
            .map(|(result, expr)| {
                result
                    .map(|value| value.to_boolean())
                    .map_err(|message| malformed(expr, &message))
            })
            .collect()
    }

    /// First node, in document order, selected by `selector` read as CSS,
    /// or failing that read as XPath.
    ///
    /// Only node-sets yield an element. An expression ending in an attribute
    /// step such as `//item/@id` selects strings, so it fails with
    /// [`Error::ElementNotFound`] here even though
    /// [`xpath_matches`](Self::xpath_matches) is true for it.
    pub fn find_element(&self, selector: &str) -> Result<NodeRef<'_>> {
        match css_to_xpath(selector) {
            Ok(xpath) => {
                if let Some(id) = self.first_node(&xpath) {
                    return Ok(NodeRef::new(&self.doc, id));
                }
                debug!(
                    target: "xmlstructure::structure",
                    "CSS reading of {:?} ({}) matched nothing, trying XPath",
                    selector,
                    xpath
                );
            }
            Err(err) => {
                debug!(
                    target: "xmlstructure::structure",
                    "{:?} is not a CSS selector ({}), trying XPath",
                    selector,
                    err
                );
            }
        }

        self.first_node(selector)
            .map(|id| NodeRef::new(&self.doc, id))
            .ok_or_else(|| Error::ElementNotFound(selector.to_string()))
    }

    /// Does the target contain the tag structure of `schema`?
    ///
    /// Every element named like the schema root, at any depth, is tried as
    /// the anchor.
    pub fn contains_structure(&self, schema: impl IntoXml) -> Result<bool> {
        let schema = schema.into_xml()?;
        Ok(self.find_structure_in(&schema)?.is_some())
    }

    /// The first anchor element, in document order, that contains the tag
    /// structure of `schema`
    pub fn find_structure(&self, schema: impl IntoXml) -> Result<Option<NodeRef<'_>>> {
        let schema = schema.into_xml()?;
        Ok(self
            .find_structure_in(&schema)?
            .map(|id| NodeRef::new(&self.doc, id)))
    }

    fn find_structure_in(&self, schema: &XmlDocument) -> Result<Option<NodeId>> {
        let schema_root = schema.root_element_id().ok_or(Error::EmptySchema)?;
        let tag = schema.node_name(schema_root).unwrap_or("");

        let candidates = self.doc.elements_by_tag_name(tag);
        if candidates.is_empty() {
            return Err(Error::ElementNotFound(tag.to_string()));
        }

        debug!(
            target: "xmlstructure::structure",
            "matching <{}> schema against {} candidates",
            tag,
            candidates.len()
        );
        Ok(candidates
            .into_iter()
            .find(|&candidate| matcher::matches(schema, schema_root, &self.doc, candidate)))
    }

    fn evaluate(&self, expr: &str) -> std::result::Result<XPathValue, String> {
        let compiled = self.cache.get_or_compile(expr)?;
        evaluate_compiled(&compiled, &EvalContext::new(&self.doc, DOCUMENT_NODE))
    }

    fn first_node(&self, xpath: &str) -> Option<NodeId> {
        match self.evaluate(xpath) {
            Ok(XPathValue::NodeSet(nodes)) => nodes.first().copied(),
            Ok(_) => None,
            Err(message) => {
                debug!(target: "xmlstructure::structure", "{:?} failed: {}", xpath, message);
                None
            }
        }
    }
}

impl std::fmt::Debug for XmlStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlStructure")
            .field("nodes", &self.doc.node_count())
            .field("cache", &self.cache)
            .finish()
    }
}

fn malformed(expr: &str, message: &str) -> Error {
    debug!(target: "xmlstructure::structure", "malformed locator {:?}: {}", expr, message);
    Error::MalformedLocator(expr.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOP: &str = r#"<shop>
        <div class="item first"><name>apple</name></div>
        <div class="item"><name>pear</name><price>2</price></div>
        <item id="x"/>
    </shop>"#;

    fn shop() -> XmlStructure {
        XmlStructure::new(SHOP).unwrap()
    }

    #[test]
    fn test_xpath_matches() {
        let xml = shop();
        assert!(xml.xpath_matches("//div/price").unwrap());
        assert!(!xml.xpath_matches("//div/weight").unwrap());
        assert!(xml.xpath_matches("count(//div) > 1").unwrap());
        assert!(!xml.xpath_matches("count(//span) > 0").unwrap());
        assert!(xml.xpath_matches("//item/@id").unwrap());
        assert!(!xml.xpath_matches("//div/@id").unwrap());
    }

    #[test]
    fn test_malformed_locator() {
        let xml = shop();
        assert_eq!(
            xml.xpath_matches("//div[").unwrap_err(),
            Error::MalformedLocator("//div[".to_string())
        );
        assert!(matches!(xml.xpath_matches("nosuch(1)"), Err(Error::MalformedLocator(_))));
    }

    #[test]
    fn test_find_element_css_then_xpath() {
        let xml = shop();
        let first = xml.find_element("div.item").unwrap();
        assert_eq!(first.attribute("class"), Some("item first"));

        let second = xml.find_element("//div[2]").unwrap();
        assert_eq!(second.attribute("class"), Some("item"));

        let item = xml.find_element("//item[1]").unwrap();
        assert_eq!(item.attribute("id"), Some("x"));

        assert_eq!(
            xml.find_element("span").unwrap_err(),
            Error::ElementNotFound("span".to_string())
        );
        assert_eq!(
            xml.find_element("//[").unwrap_err(),
            Error::ElementNotFound("//[".to_string())
        );
    }

    #[test]
    fn test_find_element_needs_a_node_set() {
        let xml = shop();
        assert!(xml.xpath_matches("//item/@id").unwrap());
        assert_eq!(
            xml.find_element("//item/@id").unwrap_err(),
            Error::ElementNotFound("//item/@id".to_string())
        );
    }

    #[test]
    fn test_contains_structure() {
        let xml = shop();
        assert!(xml.contains_structure("<div><name/><price/></div>").unwrap());
        assert!(!xml.contains_structure("<div><weight/></div>").unwrap());
        assert_eq!(
            xml.contains_structure("<span/>").unwrap_err(),
            Error::ElementNotFound("span".to_string())
        );
        assert_eq!(xml.contains_structure("").unwrap_err(), Error::EmptySchema);
        assert_eq!(xml.contains_structure(()).unwrap_err(), Error::EmptySchema);
    }

    #[test]
    fn test_find_structure_returns_anchor() {
        let xml = shop();
        let anchor = xml.find_structure("<div><price/></div>").unwrap().unwrap();
        assert_eq!(anchor.attribute("class"), Some("item"));
        assert!(xml.find_structure("<div><item/></div>").unwrap().is_none());
    }

    #[test]
    fn test_batch_matches() {
        let xml = shop();
        let results = xml.xpath_matches_all(&["//name", "//nothing", "//("]);
        assert_eq!(results[0], Ok(true));
        assert_eq!(results[1], Ok(false));
        assert_eq!(results[2], Err(Error::MalformedLocator("//(".to_string())));
    }

    #[test]
    fn test_cache_capacity() {
        let xml = XmlStructure::with_cache_capacity(SHOP, 1).unwrap();
        xml.xpath_matches("//a").unwrap();
        xml.xpath_matches("//b").unwrap();
        assert_eq!(xml.cache.len(), 1);
    }

    #[test]
    fn test_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<XmlStructure>();
    }
}
