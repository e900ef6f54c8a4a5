//! Key enumeration for index signatures.
//!
//! An index signature's parameter (`string`, `symbol`, a template literal, a
//! refinement or union of those) is compiled once into a [`KeyFilter`]; the
//! filter then picks the matching own keys of each object, in insertion order.
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{Ast, Predicate, TemplateLiteral, TemplateSpanType};
use crate::value::{Object, PropertyKey};

const NUMBER_PATTERN: &str = r"[+-]?\d*\.?\d+(?:[Ee][+-]?\d+)?";
const STRING_PATTERN: &str = ".*";

static IDENTIFIER: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$"));

pub enum KeyFilter {
    Strings,
    Symbols,
    Pattern(Regex),
    Refined(Box<KeyFilter>, Predicate),
    AnyOf(Vec<KeyFilter>),
    Nothing,
}

impl KeyFilter {
    pub fn new(parameter: &Ast) -> Self {
        match parameter {
            Ast::StringKeyword => Self::Strings,
            Ast::SymbolKeyword => Self::Symbols,
            Ast::TemplateLiteral(t) => match template_regex(t) {
                Ok(rx) => Self::Pattern(rx),
                Err(error) => {
                    warn!("template literal index signature has no usable pattern: {error}");
                    Self::Nothing
                }
            },
            Ast::Refinement(r) => Self::Refined(Box::new(Self::new(&r.from)), r.predicate.clone()),
            Ast::Union(types) => Self::AnyOf(types.iter().map(|t| Self::new(t)).collect()),
            Ast::TypeAlias(alias) => Self::new(&alias.ty),
            _ => Self::Nothing,
        }
    }

    pub fn matches(&self, key: &PropertyKey) -> bool {
        match self {
            Self::Strings => matches!(key, PropertyKey::String(_)),
            Self::Symbols => matches!(key, PropertyKey::Symbol(_)),
            Self::Pattern(rx) => key.as_str().is_some_and(|s| rx.is_match(s)),
            Self::Refined(inner, predicate) => inner.matches(key) && predicate(&key.to_value()),
            Self::AnyOf(filters) => filters.iter().any(|f| f.matches(key)),
            Self::Nothing => false,
        }
    }
}

/// Own keys of `input` covered by an index signature compiled into `filter`.
pub fn keys_for_index_signature<'a>(
    input: &'a Object,
    filter: &'a KeyFilter,
) -> impl Iterator<Item = &'a PropertyKey> + 'a {
    input.keys().filter(move |k| filter.matches(k))
}

/// Anchored pattern accepting exactly the strings a template literal
/// describes.
pub fn template_pattern(t: &TemplateLiteral) -> String {
    let mut pattern = format!("^{}", regex::escape(&t.head));
    for span in &t.spans {
        pattern.push_str(match span.ty {
            TemplateSpanType::String => STRING_PATTERN,
            TemplateSpanType::Number => NUMBER_PATTERN,
        });
        pattern.push_str(&regex::escape(&span.literal));
    }
    pattern.push('$');
    pattern
}

pub fn template_regex(t: &TemplateLiteral) -> Result<Regex, regex::Error> {
    Regex::new(&template_pattern(t))
}

/// Whether a string key may be printed without quotes.
pub fn is_identifier(s: &str) -> bool {
    matches!(&*IDENTIFIER, Ok(rx) if rx.is_match(s))
}

// ------------------------------- Tests ------------------------------------ //
