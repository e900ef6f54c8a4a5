//! The schema AST.
//!
//! A closed, immutable description of a value shape. Nodes are shared through
//! `AstRef` so that one child can appear under several parents, and so that
//! compilers can key caches on node identity.
//!
//! The free functions at the bottom build nodes; they do no validation beyond
//! collapsing degenerate unions and template literals.
use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;

use crate::value::{PropertyKey, Symbol, Value};

pub type AstRef = Arc<Ast>;

/// Deferred definition of a self-referential node. It receives the lazy node
/// itself so the body can refer back to it without an `Arc` cycle.
pub type Thunk = Arc<dyn Fn(&AstRef) -> AstRef + Send + Sync>;

pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Debug)]
pub enum Ast {
    TypeAlias(TypeAlias),
    Literal(LiteralValue),
    UniqueSymbol(Symbol),
    UndefinedKeyword,
    VoidKeyword,
    NeverKeyword,
    UnknownKeyword,
    AnyKeyword,
    StringKeyword,
    NumberKeyword,
    BooleanKeyword,
    BigIntKeyword,
    SymbolKeyword,
    ObjectKeyword,
    Enums(Vec<(String, EnumValue)>),
    TemplateLiteral(TemplateLiteral),
    Tuple(Tuple),
    TypeLiteral(TypeLiteral),
    Union(Vec<AstRef>),
    Lazy(Lazy),
    Refinement(Refinement),
    Transform(Transform),
}

/// Field-less tag of an [`Ast`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AstKind {
    TypeAlias,
    Literal,
    UniqueSymbol,
    UndefinedKeyword,
    VoidKeyword,
    NeverKeyword,
    UnknownKeyword,
    AnyKeyword,
    StringKeyword,
    NumberKeyword,
    BooleanKeyword,
    BigIntKeyword,
    SymbolKeyword,
    ObjectKeyword,
    Enums,
    TemplateLiteral,
    Tuple,
    TypeLiteral,
    Union,
    Lazy,
    Refinement,
    Transform,
}

/// A named, possibly generic, declaration. `ty` is the structural body;
/// hooks registered under `id` may replace it.
#[derive(Debug)]
pub struct TypeAlias {
    pub id: String,
    pub type_parameters: Vec<AstRef>,
    pub ty: AstRef,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    BigInt(BigInt),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnumValue {
    String(String),
    Number(f64),
}

#[derive(Debug)]
pub struct TemplateLiteral {
    pub head: String,
    pub spans: Vec<TemplateSpan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSpanType {
    String,
    Number,
}

#[derive(Debug)]
pub struct TemplateSpan {
    pub ty: TemplateSpanType,
    pub literal: String,
}

#[derive(Debug)]
pub struct Tuple {
    pub elements: Vec<Element>,
    pub rest: Option<Rest>,
}

#[derive(Debug)]
pub struct Element {
    pub ty: AstRef,
    pub is_optional: bool,
}

/// Variadic section of a tuple: `head` repeats zero or more times, then each
/// of `tail` appears exactly once.
#[derive(Debug)]
pub struct Rest {
    pub head: AstRef,
    pub tail: Vec<AstRef>,
}

#[derive(Debug)]
pub struct TypeLiteral {
    pub property_signatures: Vec<PropertySignature>,
    pub index_signatures: Vec<IndexSignature>,
}

#[derive(Debug)]
pub struct PropertySignature {
    pub name: PropertyKey,
    pub ty: AstRef,
    pub is_optional: bool,
}

/// `parameter` is one of `string`, `symbol`, a template literal, or a
/// refinement of those.
#[derive(Debug)]
pub struct IndexSignature {
    pub parameter: AstRef,
    pub ty: AstRef,
}

pub struct Lazy {
    pub thunk: Thunk,
}

pub struct Refinement {
    pub from: AstRef,
    pub description: String,
    pub predicate: Predicate,
}

#[derive(Debug)]
pub struct Transform {
    pub from: AstRef,
    pub to: AstRef,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Ast {
    pub fn kind(&self) -> AstKind {
        match self {
            Self::TypeAlias(_) => AstKind::TypeAlias,
            Self::Literal(_) => AstKind::Literal,
            Self::UniqueSymbol(_) => AstKind::UniqueSymbol,
            Self::UndefinedKeyword => AstKind::UndefinedKeyword,
            Self::VoidKeyword => AstKind::VoidKeyword,
            Self::NeverKeyword => AstKind::NeverKeyword,
            Self::UnknownKeyword => AstKind::UnknownKeyword,
            Self::AnyKeyword => AstKind::AnyKeyword,
            Self::StringKeyword => AstKind::StringKeyword,
            Self::NumberKeyword => AstKind::NumberKeyword,
            Self::BooleanKeyword => AstKind::BooleanKeyword,
            Self::BigIntKeyword => AstKind::BigIntKeyword,
            Self::SymbolKeyword => AstKind::SymbolKeyword,
            Self::ObjectKeyword => AstKind::ObjectKeyword,
            Self::Enums(_) => AstKind::Enums,
            Self::TemplateLiteral(_) => AstKind::TemplateLiteral,
            Self::Tuple(_) => AstKind::Tuple,
            Self::TypeLiteral(_) => AstKind::TypeLiteral,
            Self::Union(_) => AstKind::Union,
            Self::Lazy(_) => AstKind::Lazy,
            Self::Refinement(_) => AstKind::Refinement,
            Self::Transform(_) => AstKind::Transform,
        }
    }

    /// Type arguments handed to hooks, already in declaration order.
    pub fn type_arguments(&self) -> &[AstRef] {
        match self {
            Self::TypeAlias(alias) => &alias.type_parameters,
            _ => &[],
        }
    }
}

impl Lazy {
    /// Identity of the defining closure.
    pub fn key(&self) -> usize {
        Arc::as_ptr(&self.thunk) as *const () as usize
    }
}

impl fmt::Debug for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lazy({:#x})", self.key())
    }
}

impl fmt::Debug for Refinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refinement")
            .field("from", &self.from)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl LiteralValue {
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String(a), Value::String(b)) => a == b,
            (Self::Number(a), Value::Number(b)) => a == b,
            (Self::Boolean(a), Value::Bool(b)) => a == b,
            (Self::Null, Value::Null) => true,
            (Self::BigInt(a), Value::BigInt(b)) => a == b,
            _ => false,
        }
    }
}

impl EnumValue {
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String(a), Value::String(b)) => a == b,
            (Self::Number(a), Value::Number(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self { Self::String(value.to_owned()) }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self { Self::Number(value) }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self { Self::Boolean(value) }
}

impl From<BigInt> for LiteralValue {
    fn from(value: BigInt) -> Self { Self::BigInt(value) }
}

impl Element {
    pub fn required(ty: AstRef) -> Self {
        Self { ty, is_optional: false }
    }

    pub fn optional(ty: AstRef) -> Self {
        Self { ty, is_optional: true }
    }
}

impl PropertySignature {
    pub fn required(name: impl Into<PropertyKey>, ty: AstRef) -> Self {
        Self { name: name.into(), ty, is_optional: false }
    }

    pub fn optional(name: impl Into<PropertyKey>, ty: AstRef) -> Self {
        Self { name: name.into(), ty, is_optional: true }
    }
}

impl IndexSignature {
    pub fn new(parameter: AstRef, ty: AstRef) -> Self {
        Self { parameter, ty }
    }
}

impl TemplateSpan {
    pub fn new(ty: TemplateSpanType, literal: impl Into<String>) -> Self {
        Self { ty, literal: literal.into() }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

pub fn undefined() -> AstRef { Arc::new(Ast::UndefinedKeyword) }
pub fn void() -> AstRef { Arc::new(Ast::VoidKeyword) }
pub fn never() -> AstRef { Arc::new(Ast::NeverKeyword) }
pub fn unknown() -> AstRef { Arc::new(Ast::UnknownKeyword) }
pub fn any() -> AstRef { Arc::new(Ast::AnyKeyword) }
pub fn string() -> AstRef { Arc::new(Ast::StringKeyword) }
pub fn number() -> AstRef { Arc::new(Ast::NumberKeyword) }
pub fn boolean() -> AstRef { Arc::new(Ast::BooleanKeyword) }
pub fn bigint() -> AstRef { Arc::new(Ast::BigIntKeyword) }
pub fn symbol() -> AstRef { Arc::new(Ast::SymbolKeyword) }
pub fn object() -> AstRef { Arc::new(Ast::ObjectKeyword) }

pub fn literal(value: impl Into<LiteralValue>) -> AstRef {
    Arc::new(Ast::Literal(value.into()))
}

pub fn null() -> AstRef {
    Arc::new(Ast::Literal(LiteralValue::Null))
}

pub fn unique_symbol(symbol: Symbol) -> AstRef {
    Arc::new(Ast::UniqueSymbol(symbol))
}

pub fn enums<I, S>(members: I) -> AstRef
where
    I: IntoIterator<Item = (S, EnumValue)>,
    S: Into<String>,
{
    Arc::new(Ast::Enums(members.into_iter().map(|(k, v)| (k.into(), v)).collect()))
}

/// A template literal with no spans is just its head.
pub fn template_literal(head: impl Into<String>, spans: Vec<TemplateSpan>) -> AstRef {
    let head = head.into();
    if spans.is_empty() {
        return literal(head.as_str());
    }
    Arc::new(Ast::TemplateLiteral(TemplateLiteral { head, spans }))
}

pub fn tuple(elements: Vec<Element>, rest: Option<Rest>) -> AstRef {
    Arc::new(Ast::Tuple(Tuple { elements, rest }))
}

/// `ReadonlyArray<item>`: a tuple made only of a variadic head.
pub fn array(item: AstRef) -> AstRef {
    tuple(Vec::new(), Some(Rest { head: item, tail: Vec::new() }))
}

pub fn type_literal(
    property_signatures: Vec<PropertySignature>,
    index_signatures: Vec<IndexSignature>,
) -> AstRef {
    Arc::new(Ast::TypeLiteral(TypeLiteral { property_signatures, index_signatures }))
}

/// Zero members collapse to `never`, one member to itself.
pub fn union(mut types: Vec<AstRef>) -> AstRef {
    match types.len() {
        0 => never(),
        1 => types.remove(0),
        _ => Arc::new(Ast::Union(types)),
    }
}

pub fn lazy(thunk: impl Fn(&AstRef) -> AstRef + Send + Sync + 'static) -> AstRef {
    Arc::new(Ast::Lazy(Lazy { thunk: Arc::new(thunk) }))
}

pub fn refinement(
    from: AstRef,
    description: impl Into<String>,
    predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
) -> AstRef {
    Arc::new(Ast::Refinement(Refinement {
        from,
        description: description.into(),
        predicate: Arc::new(predicate),
    }))
}

pub fn transform(from: AstRef, to: AstRef) -> AstRef {
    Arc::new(Ast::Transform(Transform { from, to }))
}

pub fn type_alias(id: impl Into<String>, type_parameters: Vec<AstRef>, ty: AstRef) -> AstRef {
    Arc::new(Ast::TypeAlias(TypeAlias { id: id.into(), type_parameters, ty }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_unions_collapse() {
        assert_eq!(union(vec![]).kind(), AstKind::NeverKeyword);
        assert_eq!(union(vec![string()]).kind(), AstKind::StringKeyword);
        assert_eq!(union(vec![string(), number()]).kind(), AstKind::Union);
    }

    #[test]
    fn lazy_thunk_sees_its_own_node() {
        let node = lazy(|this| array(this.clone()));
        let Ast::Lazy(l) = node.as_ref() else { unreachable!() };
        let body = (l.thunk)(&node);
        let Ast::Tuple(t) = body.as_ref() else { panic!("expected tuple, got {body:?}") };
        assert!(Arc::ptr_eq(&t.rest.as_ref().unwrap().head, &node));
    }

    #[test]
    fn spanless_template_is_a_literal() {
        let node = template_literal("abc", vec![]);
        assert!(matches!(node.as_ref(), Ast::Literal(LiteralValue::String(s)) if s == "abc"));
    }
}
