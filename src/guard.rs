//! Membership tests compiled from the AST.
//!
//! A [`Guard`] answers "does this value belong to this schema?". Unions pair
//! each member's guard with its printer, compiled from the same node, to pick
//! the member to print with.
use std::fmt;
use std::sync::Arc;

use crate::ast::{Ast, AstRef};
use crate::compiler::{Compiler, Deferred, Match};
use crate::keys::{self, KeyFilter};
use crate::value::{PropertyKey, Value};

type TestFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct Guard {
    schema: AstRef,
    test: TestFn,
}

impl Guard {
    pub fn new(schema: AstRef, test: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self { schema, test: Arc::new(test) }
    }

    pub fn schema(&self) -> &AstRef {
        &self.schema
    }

    pub fn test(&self, value: &Value) -> bool {
        (self.test)(value)
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guard({:?})", self.schema.kind())
    }
}

/// Dispatch table for membership tests.
pub struct Is;

impl Match for Is {
    type Output = Guard;

    fn rule(&self, ast: &AstRef, go: &Compiler<Self>) -> Guard {
        let schema = ast.clone();
        match ast.as_ref() {
            Ast::TypeAlias(alias) => go.compile(&alias.ty),
            Ast::Literal(literal) => {
                let literal = literal.clone();
                Guard::new(schema, move |v| literal.matches(v))
            }
            Ast::UniqueSymbol(symbol) => {
                let symbol = symbol.clone();
                Guard::new(schema, move |v| matches!(v, Value::Symbol(s) if *s == symbol))
            }
            Ast::UndefinedKeyword | Ast::VoidKeyword => Guard::new(schema, Value::is_undefined),
            Ast::NeverKeyword => Guard::new(schema, |_| false),
            Ast::UnknownKeyword | Ast::AnyKeyword => Guard::new(schema, |_| true),
            Ast::StringKeyword => Guard::new(schema, |v| matches!(v, Value::String(_))),
            Ast::NumberKeyword => Guard::new(schema, |v| matches!(v, Value::Number(_))),
            Ast::BooleanKeyword => Guard::new(schema, |v| matches!(v, Value::Bool(_))),
            Ast::BigIntKeyword => Guard::new(schema, |v| matches!(v, Value::BigInt(_))),
            Ast::SymbolKeyword => Guard::new(schema, |v| matches!(v, Value::Symbol(_))),
            Ast::ObjectKeyword => Guard::new(schema, |v| {
                matches!(v, Value::Array(_) | Value::Object(_) | Value::Set(_) | Value::Map(_))
            }),
            Ast::Enums(members) => {
                let values = members.iter().map(|(_, v)| v.clone()).collect::<Vec<_>>();
                Guard::new(schema, move |v| values.iter().any(|e| e.matches(v)))
            }
            Ast::TemplateLiteral(t) => match keys::template_regex(t) {
                Ok(rx) => Guard::new(schema, move |v| matches!(v, Value::String(s) if rx.is_match(s))),
                Err(_) => Guard::new(schema, |_| false),
            },
            Ast::Tuple(tuple) => {
                let elements = tuple
                    .elements
                    .iter()
                    .map(|e| (go.compile(&e.ty), e.is_optional))
                    .collect::<Vec<_>>();
                let rest = tuple.rest.as_ref().map(|r| {
                    (go.compile(&r.head), r.tail.iter().map(|t| go.compile(t)).collect::<Vec<_>>())
                });
                Guard::new(schema, move |v| {
                    let Some(xs) = v.as_array() else { return false };
                    for (i, (guard, is_optional)) in elements.iter().enumerate() {
                        match xs.get(i) {
                            Some(x) if !guard.test(x) => return false,
                            None if !is_optional => return false,
                            _ => {}
                        }
                    }
                    // missing optional elements shorten the fixed section
                    let start = elements.len().min(xs.len());
                    match &rest {
                        None => xs.len() <= elements.len(),
                        Some((head, tail)) => {
                            if xs.len() - start < tail.len() {
                                return false;
                            }
                            let end = xs.len() - tail.len();
                            xs[start..end].iter().all(|x| head.test(x))
                                && xs[end..].iter().zip(tail).all(|(x, g)| g.test(x))
                        }
                    }
                })
            }
            Ast::TypeLiteral(literal) => {
                let properties = literal
                    .property_signatures
                    .iter()
                    .map(|ps| (ps.name.clone(), go.compile(&ps.ty), ps.is_optional))
                    .collect::<Vec<_>>();
                let indexes = literal
                    .index_signatures
                    .iter()
                    .map(|sig| (KeyFilter::new(&sig.parameter), go.compile(&sig.ty)))
                    .collect::<Vec<_>>();
                Guard::new(schema, move |v| {
                    let Some(obj) = v.as_object() else { return false };
                    for (name, guard, is_optional) in &properties {
                        match obj.get(name) {
                            Some(x) if !guard.test(x) => return false,
                            None if !is_optional => return false,
                            _ => {}
                        }
                    }
                    let named = |k: &PropertyKey| properties.iter().any(|(name, ..)| name == k);
                    indexes.iter().all(|(filter, guard)| {
                        keys::keys_for_index_signature(obj, filter)
                            .filter(|k| !named(*k))
                            .all(|k| guard.test(&obj[k]))
                    })
                })
            }
            Ast::Union(types) => {
                let members = types.iter().map(|t| go.compile(t)).collect::<Vec<_>>();
                Guard::new(schema, move |v| members.iter().any(|m| m.test(v)))
            }
            Ast::Lazy(_) => go.compile(ast),
            Ast::Refinement(refinement) => {
                let from = go.compile(&refinement.from);
                let predicate = refinement.predicate.clone();
                Guard::new(schema, move |v| from.test(v) && predicate(v))
            }
            Ast::Transform(transform) => go.compile(&transform.to),
        }
    }

    fn deferred(&self, ast: &AstRef, target: Deferred<Self>) -> Guard {
        Guard::new(ast.clone(), move |v| target.get().test(v))
    }
}

/// Membership test for `ast`, compiled in its own pass.
pub fn is(ast: &AstRef) -> Guard {
    Compiler::new(Is).compile(ast)
}

// ------------------------------- Tests ------------------------------------ //
