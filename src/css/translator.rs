//! Selector AST to XPath 1.0
//!
//! Each compound selector becomes one location step whose conditions are
//! folded into a single predicate as `(a) and (b)`.

use super::parser::{AttrOp, Combinator, ComplexSelector, CompoundSelector, Condition, Nth, Pseudo};
use super::CssError;

/// Translate a parsed selector group into one XPath expression
pub fn translate(group: &[ComplexSelector]) -> Result<String, CssError> {
    let paths = group.iter().map(translate_complex).collect::<Result<Vec<_>, _>>()?;
    Ok(paths.join(" | "))
}

fn translate_complex(selector: &ComplexSelector) -> Result<String, CssError> {
    let mut path = format!("descendant-or-self::{}", step(&selector.first)?);

    for (combinator, compound) in &selector.rest {
        match combinator {
            Combinator::Descendant => {
                path.push_str("/descendant-or-self::*/");
                path.push_str(&step(compound)?);
            }
            Combinator::Child => {
                path.push('/');
                path.push_str(&step(compound)?);
            }
            Combinator::GeneralSibling => {
                path.push_str("/following-sibling::");
                path.push_str(&step(compound)?);
            }
            Combinator::Adjacent => {
                // position() counts following-sibling::* so the name moves into the predicate
                let mut condition = compound
                    .element
                    .as_deref()
                    .map(|name| format!("name() = {}", literal(name)));
                condition = and(condition, Some("position() = 1".to_string()));
                for c in &compound.conditions {
                    condition = and(condition, Some(translate_condition(c, compound.element.as_deref())?));
                }
                path.push_str("/following-sibling::*");
                push_predicate(&mut path, condition);
            }
        }
    }

    Ok(path)
}

fn step(compound: &CompoundSelector) -> Result<String, CssError> {
    let mut step = compound.element.clone().unwrap_or_else(|| "*".to_string());
    push_predicate(&mut step, conditions(compound)?);
    Ok(step)
}

fn conditions(compound: &CompoundSelector) -> Result<Option<String>, CssError> {
    let mut condition = None;
    for c in &compound.conditions {
        condition = and(condition, Some(translate_condition(c, compound.element.as_deref())?));
    }
    Ok(condition)
}

fn push_predicate(step: &mut String, condition: Option<String>) {
    if let Some(condition) = condition {
        step.push('[');
        step.push_str(&condition);
        step.push(']');
    }
}

fn and(left: Option<String>, right: Option<String>) -> Option<String> {
    match (left, right) {
        (Some(l), Some(r)) => Some(format!("({}) and ({})", l, r)),
        (l, r) => l.or(r),
    }
}

fn translate_condition(condition: &Condition, element: Option<&str>) -> Result<String, CssError> {
    match condition {
        Condition::Id(id) => Ok(format!("@id = {}", literal(id))),
        Condition::Class(class) => Ok(token_match("@class", class)),
        Condition::Attribute { name, matcher } => Ok(attribute(&format!("@{}", name), matcher.as_ref())),
        Condition::Pseudo(pseudo) => translate_pseudo(pseudo, element),
    }
}

fn token_match(attr: &str, token: &str) -> String {
    format!(
        "{attr} and contains(concat(' ', normalize-space({attr}), ' '), {})",
        literal(&format!(" {} ", token))
    )
}

fn attribute(attr: &str, matcher: Option<&(AttrOp, String)>) -> String {
    let (op, value) = match matcher {
        None => return attr.to_string(),
        Some((op, value)) => (*op, value.as_str()),
    };

    match op {
        AttrOp::Equals => format!("{} = {}", attr, literal(value)),
        AttrOp::NotEquals => format!("not({attr}) or {attr} != {}", literal(value)),
        AttrOp::Includes if value.is_empty() || value.contains(char::is_whitespace) => "0".to_string(),
        AttrOp::Includes => token_match(attr, value),
        AttrOp::DashMatch => format!(
            "{attr} and ({attr} = {} or starts-with({attr}, {}))",
            literal(value),
            literal(&format!("{}-", value))
        ),
        AttrOp::Prefix | AttrOp::Suffix | AttrOp::Substring if value.is_empty() => "0".to_string(),
        AttrOp::Prefix => format!("{attr} and starts-with({attr}, {})", literal(value)),
        AttrOp::Suffix => format!(
            "{attr} and substring({attr}, string-length({attr}) - {}) = {}",
            value.chars().count() - 1,
            literal(value)
        ),
        AttrOp::Substring => format!("{attr} and contains({attr}, {})", literal(value)),
    }
}

fn translate_pseudo(pseudo: &Pseudo, element: Option<&str>) -> Result<String, CssError> {
    let of_type = |pseudo_name: &str| {
        element.ok_or_else(|| CssError::Unsupported(format!("*:{} requires an element name", pseudo_name)))
    };

    Ok(match pseudo {
        Pseudo::FirstChild => "count(preceding-sibling::*) = 0".to_string(),
        Pseudo::LastChild => "count(following-sibling::*) = 0".to_string(),
        Pseudo::OnlyChild => "count(../*) = 1".to_string(),
        Pseudo::FirstOfType => format!("count(preceding-sibling::{}) = 0", of_type("first-of-type")?),
        Pseudo::LastOfType => format!("count(following-sibling::{}) = 0", of_type("last-of-type")?),
        Pseudo::OnlyOfType => format!("count(../{}) = 1", of_type("only-of-type")?),
        Pseudo::Empty => "not(*) and not(string-length())".to_string(),
        Pseudo::Root => "not(parent::*)".to_string(),
        Pseudo::NthChild(nth) => nth_condition(*nth, "count(preceding-sibling::*) + 1"),
        Pseudo::NthLastChild(nth) => nth_condition(*nth, "count(following-sibling::*) + 1"),
        Pseudo::NthOfType(nth) => nth_condition(
            *nth,
            &format!("count(preceding-sibling::{}) + 1", of_type("nth-of-type")?),
        ),
        Pseudo::NthLastOfType(nth) => nth_condition(
            *nth,
            &format!("count(following-sibling::{}) + 1", of_type("nth-last-of-type")?),
        ),
        Pseudo::Not(inner) => {
            let name_test = inner
                .element
                .as_deref()
                .map(|name| format!("name() = {}", literal(name)));
            let condition = and(name_test, conditions(inner)?);
            format!("not({})", condition.as_deref().unwrap_or("true()"))
        }
        Pseudo::Contains(text) => format!("contains(string(.), {})", literal(text)),
    })
}

/// Positions `p` with `p = a*n + b` for some `n >= 0`
fn nth_condition(nth: Nth, position: &str) -> String {
    let Nth { a, b } = nth;
    if a == 0 {
        return format!("{} = {}", position, b);
    }
    if a > 0 {
        if a == 1 && b <= 1 {
            return "true()".to_string();
        }
        format!("({p}) >= {b} and (({p}) - {b}) mod {a} = 0", p = position, b = b, a = a)
    } else {
        format!("({p}) <= {b} and ({b} - ({p})) mod {a} = 0", p = position, b = b, a = -a)
    }
}

/// Quote a value as an XPath string literal
fn literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{}'", part))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}
