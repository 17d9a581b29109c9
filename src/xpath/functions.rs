//! XPath 1.0 Functions
//!
//! Implements the XPath 1.0 core function library:
//!
//! Node Set Functions:
//! - position(), last(), count(), local-name(), namespace-uri(), name(), id()
//!
//! String Functions:
//! - string(), concat(), starts-with(), contains(), substring(),
//!   substring-before(), substring-after(), string-length(),
//!   normalize-space(), translate()
//!
//! Boolean Functions:
//! - boolean(), not(), true(), false(), lang()
//!
//! Number Functions:
//! - number(), sum(), floor(), ceiling(), round()

use super::value::{parse_number, XPathValue};
#[cfg(test)]
use crate::dom::XmlDocument;
use crate::dom::{self, DocumentAccess, NodeId, NodeKind};

const KNOWN_FUNCTIONS: &[&str] = &[
    "position",
    "last",
    "count",
    "local-name",
    "namespace-uri",
    "name",
    "id",
    "string",
    "concat",
    "starts-with",
    "contains",
    "substring",
    "substring-before",
    "substring-after",
    "string-length",
    "normalize-space",
    "translate",
    "boolean",
    "not",
    "true",
    "false",
    "lang",
    "number",
    "sum",
    "floor",
    "ceiling",
    "round",
];

/// Whether `name` is a core library function
pub fn is_known(name: &str) -> bool {
    KNOWN_FUNCTIONS.contains(&name)
}

/// Evaluate a function call
pub fn call<D: DocumentAccess>(
    name: &str,
    args: Vec<XPathValue>,
    doc: &D,
    context: NodeId,
    position: usize,
    size: usize,
) -> Result<XPathValue, String> {
    match name {
        // Node Set Functions
        "position" => no_args(name, &args).map(|_| XPathValue::Number(position as f64)),
        "last" => no_args(name, &args).map(|_| XPathValue::Number(size as f64)),
        "count" => fn_count(args),
        "local-name" => fn_local_name(args, doc, context),
        "namespace-uri" => fn_namespace_uri(args, doc, context),
        "name" => fn_name(args, doc, context),
        "id" => fn_id(args),

        // String Functions
        "string" => fn_string(args, doc, context),
        "concat" => fn_concat(args, doc),
        "starts-with" => fn_starts_with(args, doc),
        "contains" => fn_contains(args, doc),
        "substring" => fn_substring(args, doc),
        "substring-before" => fn_substring_before(args, doc),
        "substring-after" => fn_substring_after(args, doc),
        "string-length" => fn_string_length(args, doc, context),
        "normalize-space" => fn_normalize_space(args, doc, context),
        "translate" => fn_translate(args, doc),

        // Boolean Functions
        "boolean" => fn_boolean(args),
        "not" => fn_not(args),
        "true" => no_args(name, &args).map(|_| XPathValue::Boolean(true)),
        "false" => no_args(name, &args).map(|_| XPathValue::Boolean(false)),
        "lang" => fn_lang(args, doc, context),

        // Number Functions
        "number" => fn_number(args, doc, context),
        "sum" => fn_sum(args, doc),
        "floor" => fn_floor(args, doc),
        "ceiling" => fn_ceiling(args, doc),
        "round" => fn_round(args, doc),

        _ => Err(format!("Unknown function: {}", name)),
    }
}

fn no_args(name: &str, args: &[XPathValue]) -> Result<(), String> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(format!("{}() takes no arguments", name))
    }
}

// Node Set Functions

fn fn_count(args: Vec<XPathValue>) -> Result<XPathValue, String> {
    if args.len() != 1 {
        return Err("count() requires exactly 1 argument".to_string());
    }
    match &args[0] {
        XPathValue::NodeSet(nodes) => Ok(XPathValue::Number(nodes.len() as f64)),
        XPathValue::StringList(values) => Ok(XPathValue::Number(values.len() as f64)),
        _ => Err("count() argument must be a node-set".to_string()),
    }
}

/// The node a name function applies to: the first argument node, or the
/// context node when called without arguments. `Ok(None)` for an empty set.
fn target_node(name: &str, args: &[XPathValue], context: NodeId) -> Result<Option<NodeId>, String> {
    match args {
        [] => Ok(Some(context)),
        [XPathValue::NodeSet(nodes)] => Ok(nodes.first().copied()),
        [_] => Err(format!("{}() argument must be a node-set", name)),
        _ => Err(format!("{}() requires 0 or 1 arguments", name)),
    }
}

fn fn_local_name<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D, context: NodeId) -> Result<XPathValue, String> {
    let name = target_node("local-name", &args, context)?
        .and_then(|node| doc.node_local_name(node))
        .unwrap_or("");
    Ok(XPathValue::String(name.to_string()))
}

/// Resolve the namespace of an element from the `xmlns` declarations in
/// scope; prefixes bound nowhere resolve to the empty string
fn fn_namespace_uri<D: DocumentAccess>(
    args: Vec<XPathValue>,
    doc: &D,
    context: NodeId,
) -> Result<XPathValue, String> {
    let Some(node) = target_node("namespace-uri", &args, context)? else {
        return Ok(XPathValue::String(String::new()));
    };
    let Some(name) = doc.node_name(node).filter(|_| doc.node_kind_of(node) == Some(NodeKind::Element)) else {
        return Ok(XPathValue::String(String::new()));
    };

    let declaration = match name.split_once(':') {
        Some((prefix, _)) => format!("xmlns:{}", prefix),
        None => "xmlns".to_string(),
    };

    let mut current = Some(node);
    while let Some(id) = current {
        if let Some(uri) = doc.get_attribute(id, &declaration) {
            return Ok(XPathValue::String(uri.to_string()));
        }
        current = doc.parent_of(id);
    }
    Ok(XPathValue::String(String::new()))
}

fn fn_name<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D, context: NodeId) -> Result<XPathValue, String> {
    let name = target_node("name", &args, context)?
        .and_then(|node| doc.node_name(node))
        .unwrap_or("");
    Ok(XPathValue::String(name.to_string()))
}

fn fn_id(_args: Vec<XPathValue>) -> Result<XPathValue, String> {
    Err("id() is not supported: documents carry no DTD attribute types".to_string())
}

// String Functions

fn fn_string<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D, context: NodeId) -> Result<XPathValue, String> {
    let value = match args.as_slice() {
        [] => dom::node_string_value(doc, context),
        [arg] => arg.string_in(doc),
        _ => return Err("string() requires 0 or 1 arguments".to_string()),
    };
    Ok(XPathValue::String(value))
}

fn fn_concat<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D) -> Result<XPathValue, String> {
    if args.len() < 2 {
        return Err("concat() requires at least 2 arguments".to_string());
    }
    let result: String = args.iter().map(|a| a.string_in(doc)).collect();
    Ok(XPathValue::String(result))
}

fn two_strings<D: DocumentAccess>(name: &str, args: &[XPathValue], doc: &D) -> Result<(String, String), String> {
    match args {
        [a, b] => Ok((a.string_in(doc), b.string_in(doc))),
        _ => Err(format!("{}() requires exactly 2 arguments", name)),
    }
}

fn fn_starts_with<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D) -> Result<XPathValue, String> {
    let (s, prefix) = two_strings("starts-with", &args, doc)?;
    Ok(XPathValue::Boolean(s.starts_with(&prefix)))
}

fn fn_contains<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D) -> Result<XPathValue, String> {
    let (s, pattern) = two_strings("contains", &args, doc)?;
    Ok(XPathValue::Boolean(s.contains(&pattern)))
}

/// Characters at 1-based positions p with round(start) <= p < round(start) + round(len)
fn fn_substring<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D) -> Result<XPathValue, String> {
    if args.len() < 2 || args.len() > 3 {
        return Err("substring() requires 2 or 3 arguments".to_string());
    }

    let s = args[0].string_in(doc);
    let start = xpath_round(args[1].number_in(doc));
    let end = match args.get(2) {
        Some(len) => start + xpath_round(len.number_in(doc)),
        None => f64::INFINITY,
    };

    let result: String = s
        .chars()
        .enumerate()
        .filter(|&(i, _)| {
            let p = (i + 1) as f64;
            p >= start && p < end
        })
        .map(|(_, c)| c)
        .collect();

    Ok(XPathValue::String(result))
}

fn fn_substring_before<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D) -> Result<XPathValue, String> {
    let (s, pattern) = two_strings("substring-before", &args, doc)?;
    let result = match s.find(&pattern) {
        Some(pos) => s[..pos].to_string(),
        None => String::new(),
    };
    Ok(XPathValue::String(result))
}

fn fn_substring_after<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D) -> Result<XPathValue, String> {
    let (s, pattern) = two_strings("substring-after", &args, doc)?;
    let result = match s.find(&pattern) {
        Some(pos) => s[pos + pattern.len()..].to_string(),
        None => String::new(),
    };
    Ok(XPathValue::String(result))
}

fn fn_string_length<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D, context: NodeId) -> Result<XPathValue, String> {
    let s = match args.as_slice() {
        [] => dom::node_string_value(doc, context),
        [arg] => arg.string_in(doc),
        _ => return Err("string-length() requires 0 or 1 arguments".to_string()),
    };
    Ok(XPathValue::Number(s.chars().count() as f64))
}

fn fn_normalize_space<D: DocumentAccess>(
    args: Vec<XPathValue>,
    doc: &D,
    context: NodeId,
) -> Result<XPathValue, String> {
    let s = match args.as_slice() {
        [] => dom::node_string_value(doc, context),
        [arg] => arg.string_in(doc),
        _ => return Err("normalize-space() requires 0 or 1 arguments".to_string()),
    };

    let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
    Ok(XPathValue::String(normalized))
}

fn fn_translate<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D) -> Result<XPathValue, String> {
    if args.len() != 3 {
        return Err("translate() requires exactly 3 arguments".to_string());
    }

    let s = args[0].string_in(doc);
    let from: Vec<char> = args[1].string_in(doc).chars().collect();
    let to: Vec<char> = args[2].string_in(doc).chars().collect();

    let result: String = s
        .chars()
        .filter_map(|c| match from.iter().position(|&fc| fc == c) {
            Some(pos) => to.get(pos).copied(),
            None => Some(c),
        })
        .collect();

    Ok(XPathValue::String(result))
}

// Boolean Functions

fn fn_boolean(args: Vec<XPathValue>) -> Result<XPathValue, String> {
    if args.len() != 1 {
        return Err("boolean() requires exactly 1 argument".to_string());
    }
    Ok(XPathValue::Boolean(args[0].to_boolean()))
}

fn fn_not(args: Vec<XPathValue>) -> Result<XPathValue, String> {
    if args.len() != 1 {
        return Err("not() requires exactly 1 argument".to_string());
    }
    Ok(XPathValue::Boolean(!args[0].to_boolean()))
}

fn fn_lang<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D, context: NodeId) -> Result<XPathValue, String> {
    if args.len() != 1 {
        return Err("lang() requires exactly 1 argument".to_string());
    }
    let target_lang = args[0].string_in(doc).to_lowercase();

    // Nearest xml:lang on the ancestor-or-self chain decides
    let mut node = Some(context);
    while let Some(id) = node {
        if let Some(lang_val) = doc.get_attribute(id, "xml:lang") {
            let lang_lower = lang_val.to_lowercase();
            let matches = lang_lower == target_lang
                || (lang_lower.starts_with(&target_lang)
                    && lang_lower.as_bytes().get(target_lang.len()) == Some(&b'-'));
            return Ok(XPathValue::Boolean(matches));
        }
        node = doc.parent_of(id);
    }
    Ok(XPathValue::Boolean(false))
}

// Number Functions

fn fn_number<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D, context: NodeId) -> Result<XPathValue, String> {
    let value = match args.as_slice() {
        [] => parse_number(&dom::node_string_value(doc, context)),
        [arg] => arg.number_in(doc),
        _ => return Err("number() requires 0 or 1 arguments".to_string()),
    };
    Ok(XPathValue::Number(value))
}

fn fn_sum<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D) -> Result<XPathValue, String> {
    if args.len() != 1 {
        return Err("sum() requires exactly 1 argument".to_string());
    }

    match args[0].member_strings(doc) {
        Some(values) => Ok(XPathValue::Number(values.iter().map(|s| parse_number(s)).sum())),
        None => Err("sum() argument must be a node-set".to_string()),
    }
}

fn one_number<D: DocumentAccess>(name: &str, args: &[XPathValue], doc: &D) -> Result<f64, String> {
    match args {
        [arg] => Ok(arg.number_in(doc)),
        _ => Err(format!("{}() requires exactly 1 argument", name)),
    }
}

fn fn_floor<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D) -> Result<XPathValue, String> {
    Ok(XPathValue::Number(one_number("floor", &args, doc)?.floor()))
}

fn fn_ceiling<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D) -> Result<XPathValue, String> {
    Ok(XPathValue::Number(one_number("ceiling", &args, doc)?.ceil()))
}

fn fn_round<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D) -> Result<XPathValue, String> {
    Ok(XPathValue::Number(xpath_round(one_number("round", &args, doc)?)))
}

/// XPath rounding: halves go towards positive infinity
fn xpath_round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        n
    } else {
        (n + 0.5).floor()
    }
}
