//! End-to-end builder scenarios

use xmlstructure::{Error, NodeKind, XmlBuilder, XmlDocument, XmlStructure};

/// users > user with a value, an email, a cart and an active flag
fn users_document() -> Result<XmlBuilder, Error> {
    let mut xml = XmlBuilder::new();
    xml.child("users")
        .child("user")
        .set_value("1")
        .child("email")
        .set_value("davert@mail.ua")
        .set_attribute("valid", "true")?
        .to_parent()?
        .child("cart")
        .set_attribute("empty", "false")?
        .child("items")
        .child("item")
        .set_value("useful item")
        .to_ancestor("user")?
        .child("active")
        .set_value("1");
    Ok(xml)
}

#[test]
fn builds_the_users_document() {
    let xml = users_document().unwrap();
    assert_eq!(
        xml.serialize().unwrap(),
        concat!(
            "<?xml version=\"1.0\"?>\n",
            "<users><user>1",
            "<email valid=\"true\">davert@mail.ua</email>",
            "<cart empty=\"false\"><items><item>useful item</item></items></cart>",
            "<active>1</active>",
            "</user></users>\n"
        )
    );
    assert_eq!(xml.to_string(), xml.serialize().unwrap());
}

#[test]
fn serialized_output_parses_back() {
    let xml = users_document().unwrap();
    let text = xml.serialize().unwrap();
    let reparsed = XmlDocument::parse(&text).unwrap();
    assert_eq!(reparsed.to_xml().unwrap(), text);
}

#[test]
fn built_document_feeds_the_matcher() {
    let xml = users_document().unwrap();
    let matcher = XmlStructure::new(&xml).unwrap();

    assert!(matcher.xpath_matches("//email[@valid='true']").unwrap());
    assert!(matcher.contains_structure("<user><cart><items><item/></items></cart></user>").unwrap());
    assert_eq!(matcher.find_element("cart > items > item").unwrap().text(), "useful item");
}

#[test]
fn cursor_errors() {
    let mut xml = XmlBuilder::new();
    assert_eq!(xml.to_parent().err(), Some(Error::NoParent));
    assert_eq!(xml.set_attribute("a", "b").err(), Some(Error::InvalidOperation));
    assert_eq!(
        xml.to_ancestor("users").err(),
        Some(Error::AncestorNotFound("users".to_string()))
    );

    xml.child("users").child("user");
    assert_eq!(
        xml.to_ancestor("user").err(),
        Some(Error::AncestorNotFound("user".to_string()))
    );
    assert_eq!(xml.cursor().name(), Some("user"));
}

#[test]
fn document_node_is_reachable_again() {
    let mut xml = XmlBuilder::new();
    xml.child("a").to_parent().unwrap();
    assert_eq!(xml.cursor().kind(), NodeKind::Document);

    // a second top-level element is appended; the first stays the root
    xml.child("b");
    assert_eq!(xml.document().root().unwrap().name(), Some("a"));
    assert!(matches!(xml.serialize(), Err(Error::SerializationFailed(_))));
    assert!(XmlStructure::new(&xml).unwrap().xpath_matches("/b").unwrap());
}

#[test]
fn escapes_values_and_attributes() {
    let mut xml = XmlBuilder::new();
    xml.child("q").set_value("a < b & c").set_attribute("title", "\"x\" & <y>").unwrap();
    assert_eq!(
        xml.serialize().unwrap(),
        "<?xml version=\"1.0\"?>\n<q title=\"&quot;x&quot; &amp; &lt;y&gt;\">a &lt; b &amp; c</q>\n"
    );
}
