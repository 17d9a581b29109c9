//! CSS selectors translated to XPath 1.0
//!
//! Supports type, universal, id, class and attribute selectors, the four
//! combinators, selector groups and the structural pseudo-classes. Every
//! alternative is anchored with `descendant-or-self::` so the result can be
//! evaluated from the document node.
//!
//! Element and attribute names are case-sensitive.

mod parser;
mod translator;

use log::trace;
use thiserror::Error;

/// Why a selector could not be translated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CssError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected end of selector")]
    UnexpectedEnd,
    #[error("unexpected {found:?} at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("invalid nth expression {0:?}")]
    InvalidNth(String),
    #[error("unsupported selector {0}")]
    Unsupported(String),
}

/// Translate a CSS selector into an XPath expression.
///
/// ```
/// use xmlstructure::css::css_to_xpath;
///
/// assert_eq!(css_to_xpath("list > item").unwrap(), "descendant-or-self::list/item");
/// assert!(css_to_xpath("//item[1]").is_err());
/// ```
pub fn css_to_xpath(selector: &str) -> Result<String, CssError> {
    let group = parser::parse(selector)?;
    let xpath = translator::translate(&group)?;
    trace!(target: "xmlstructure::css", "{} => {}", selector, xpath);
    Ok(xpath)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::XmlDocument;
    use crate::xpath::{evaluate, XPathValue};

    const DOC: &str = r#"<shop>
        <list id="fruit" class="produce  fresh">
            <item lang="en-GB">apple</item>
            <item>pear</item>
            <note/>
            <item class="last">plum</item>
        </list>
        <list id="tools">
            <item>saw</item>
        </list>
        <empty/>
    </shop>"#;

    fn names_of(selector: &str) -> Vec<String> {
        let doc = XmlDocument::parse(DOC).unwrap();
        let xpath = css_to_xpath(selector).unwrap();
        match evaluate(&doc, &xpath).unwrap() {
            XPathValue::NodeSet(nodes) => nodes
                .into_iter()
                .map(|id| {
                    let node = doc.node(id).unwrap();
                    match node.name() {
                        Some("item") => node.text().trim().to_string(),
                        other => other.unwrap_or_default().to_string(),
                    }
                })
                .collect(),
            other => panic!("{} gave {:?}", xpath, other),
        }
    }

    #[test]
    fn test_selectors_against_document() {
        assert_eq!(names_of("#tools item"), vec!["saw"]);
        assert_eq!(names_of(".fresh > item:first-child"), vec!["apple"]);
        assert_eq!(names_of("item:last-child"), vec!["plum", "saw"]);
        assert_eq!(names_of("item:nth-child(odd)"), vec!["apple", "saw"]);
        assert_eq!(names_of("item:nth-child(2n)"), vec!["pear", "plum"]);
        assert_eq!(names_of("item:nth-of-type(2)"), vec!["pear"]);
        assert_eq!(names_of("item:only-child"), vec!["saw"]);
        assert_eq!(names_of("item + note"), vec!["note"]);
        assert_eq!(names_of("note ~ item"), vec!["plum"]);
        assert_eq!(names_of("item + item"), vec!["pear"]);
        assert_eq!(names_of("[lang|=en]"), vec!["apple"]);
        assert_eq!(names_of("item:not(.last):contains('p')"), vec!["apple", "pear"]);
        assert_eq!(names_of(":root"), vec!["shop"]);
        assert_eq!(names_of("note:empty, empty"), vec!["note", "empty"]);
    }

    #[test]
    fn test_errors() {
        assert_eq!(css_to_xpath(""), Err(CssError::Empty));
        assert_eq!(css_to_xpath("item >"), Err(CssError::UnexpectedEnd));
        assert!(matches!(css_to_xpath("a:hover"), Err(CssError::Unsupported(_))));
        assert!(matches!(css_to_xpath("[a='x"), Err(CssError::UnterminatedString { .. })));
        assert!(matches!(css_to_xpath("li:nth-child(z)"), Err(CssError::InvalidNth(_))));
        assert!(matches!(
            css_to_xpath("count(//x)"),
            Err(CssError::UnexpectedChar { found: '(', .. })
        ));
    }
}
