//! Printers: schema-driven debug rendering.
//!
//! [`Pretty`] is the dispatch table handed to the generic [`Compiler`]; each
//! rule turns one AST kind into a [`Printer`]. Printers assume their input
//! already conforms to the schema; the only failures are the two contract
//! violations in [`PrettyError`].
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::ast::{Ast, AstRef};
use crate::compiler::{Compiler, Deferred, Hook, HookRegistry, LazyBodies, Match};
use crate::error::{PrettyError, Result};
use crate::format::format_any;
use crate::guard::{Guard, Is};
use crate::keys::{self, KeyFilter};
use crate::value::{self, PropertyKey, UNDEFINED, Value};

type PrintFn = Arc<dyn Fn(&Value) -> Result<String> + Send + Sync>;

// ————————————————————————————————————————————————————————————————————————————
// PRINTER
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone)]
pub struct Printer {
    schema: AstRef,
    repr: Repr,
}

#[derive(Clone)]
enum Repr {
    Direct(PrintFn),
    Deferred(Deferred<Pretty>),
}

impl Printer {
    pub fn new(
        schema: AstRef,
        print: impl Fn(&Value) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        Self { schema, repr: Repr::Direct(Arc::new(print)) }
    }

    pub fn schema(&self) -> &AstRef {
        &self.schema
    }

    pub fn print(&self, value: &Value) -> Result<String> {
        match &self.repr {
            Repr::Direct(print) => print(value),
            Repr::Deferred(target) => target.get().print(value),
        }
    }

    /// Whether both printers forward to the same memoized lazy compile.
    pub fn same_recursion(&self, other: &Printer) -> bool {
        match (&self.repr, &other.repr) {
            (Repr::Deferred(a), Repr::Deferred(b)) => a.same_target(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Printer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Direct(_) => write!(f, "Printer({:?})", self.schema.kind()),
            Repr::Deferred(target) => write!(f, "Printer({target:?})"),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DISPATCH TABLE
// ————————————————————————————————————————————————————————————————————————————

/// One printer compilation pass: the hooks in effect plus the guard compiler
/// used for union members. Build it with [`compiler`].
pub struct Pretty {
    hooks: Arc<HookRegistry<Printer>>,
    guards: Compiler<Is>,
}

impl Match for Pretty {
    type Output = Printer;

    fn hook(&self, ast: &Ast) -> Option<Hook<Printer>> {
        self.hooks.lookup(ast).cloned()
    }

    fn rule(&self, ast: &AstRef, go: &Compiler<Self>) -> Printer {
        let schema = ast.clone();
        match ast.as_ref() {
            Ast::TypeAlias(alias) => go.compile(&alias.ty),
            Ast::VoidKeyword => Printer::new(schema, |_| Ok("void(0)".to_owned())),
            Ast::NeverKeyword => Printer::new(schema, |_| Err(PrettyError::Never)),
            Ast::Literal(_) => Printer::new(schema, |v| Ok(literal(v))),
            Ast::SymbolKeyword
            | Ast::UniqueSymbol(_)
            | Ast::UndefinedKeyword
            | Ast::NumberKeyword
            | Ast::BooleanKeyword => to_string(schema),
            Ast::StringKeyword | Ast::TemplateLiteral(_) | Ast::Enums(_) => stringify(schema),
            Ast::UnknownKeyword | Ast::AnyKeyword | Ast::ObjectKeyword => format(schema),
            Ast::BigIntKeyword => Printer::new(schema, |v| Ok(format!("{}n", v.to_display_string()))),
            Ast::Tuple(tuple) => {
                let elements = tuple
                    .elements
                    .iter()
                    .map(|e| (go.compile(&e.ty), e.is_optional))
                    .collect::<Vec<_>>();
                let rest = tuple.rest.as_ref().map(|r| {
                    (go.compile(&r.head), r.tail.iter().map(|t| go.compile(t)).collect::<Vec<_>>())
                });
                Printer::new(schema, move |v| {
                    let input = v.as_array().unwrap_or_default();
                    let mut output: Vec<String> = Vec::new();
                    // ---------------------------------------------
                    // handle elements
                    // ---------------------------------------------
                    for (i, (printer, is_optional)) in elements.iter().enumerate() {
                        match input.get(i) {
                            Some(x) => output.push(printer.print(x)?),
                            None if *is_optional => continue,
                            None => output.push(printer.print(&UNDEFINED)?),
                        }
                    }
                    // ---------------------------------------------
                    // handle rest element
                    // ---------------------------------------------
                    if let Some((head, tail)) = &rest {
                        let start = elements.len().min(input.len());
                        let end = input.len().saturating_sub(tail.len()).max(start);
                        for x in input.get(start..end).unwrap_or_default() {
                            output.push(head.print(x)?);
                        }
                        // ---------------------------------------------
                        // handle post rest elements
                        // ---------------------------------------------
                        for (j, printer) in tail.iter().enumerate() {
                            output.push(printer.print(input.get(end + j).unwrap_or(&UNDEFINED))?);
                        }
                    }
                    Ok(format!("[{}]", output.join(", ")))
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
                Printer::new(schema, move |v| {
                    let Some(input) = v.as_object() else { return Ok(format_any(v)) };
                    let mut output: Vec<String> = Vec::new();
                    let mut claimed: HashSet<&PropertyKey> = HashSet::new();
                    // ---------------------------------------------
                    // handle property signatures
                    // ---------------------------------------------
                    for (name, printer, is_optional) in &properties {
                        let value = match input.get(name) {
                            Some(x) => x,
                            None if *is_optional => continue,
                            None => &UNDEFINED,
                        };
                        output.push(format!("{}: {}", pretty_property_key(name), printer.print(value)?));
                        claimed.insert(name);
                    }
                    // ---------------------------------------------
                    // handle index signatures
                    // ---------------------------------------------
                    for (filter, printer) in &indexes {
                        for key in keys::keys_for_index_signature(input, filter) {
                            if !claimed.insert(key) {
                                continue;
                            }
                            output.push(format!("{}: {}", pretty_property_key(key), printer.print(&input[key])?));
                        }
                    }
                    Ok(if output.is_empty() {
                        "{}".to_owned()
                    } else {
                        format!("{{ {} }}", output.join(", "))
                    })
                })
            }
            Ast::Union(types) => {
                let members = types
                    .iter()
                    .map(|m| (self.guards.compile(m), go.compile(m)))
                    .collect::<Vec<(Guard, Printer)>>();
                Printer::new(schema, move |v| match members.iter().find(|(is, _)| is.test(v)) {
                    Some((_, printer)) => printer.print(v),
                    None => Err(PrettyError::NoMatchingMember { actual: format_any(v) }),
                })
            }
            Ast::Lazy(_) => go.compile(ast),
            Ast::Refinement(refinement) => go.compile(&refinement.from),
            Ast::Transform(transform) => go.compile(&transform.to),
        }
    }

    fn deferred(&self, ast: &AstRef, target: Deferred<Self>) -> Printer {
        Printer { schema: ast.clone(), repr: Repr::Deferred(target) }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LEAVES
// ————————————————————————————————————————————————————————————————————————————

fn to_string(schema: AstRef) -> Printer {
    Printer::new(schema, |v| Ok(v.to_display_string()))
}

fn stringify(schema: AstRef) -> Printer {
    Printer::new(schema, |v| Ok(json_literal(v)))
}

fn format(schema: AstRef) -> Printer {
    Printer::new(schema, |v| Ok(format_any(v)))
}

fn literal(v: &Value) -> String {
    match v {
        Value::BigInt(i) => format!("{i}n"),
        other => json_literal(other),
    }
}

/// Literal form of a scalar: strings quoted, everything else bare.
fn json_literal(v: &Value) -> String {
    match v {
        Value::String(s) => value::quote(s),
        Value::Number(n) if !n.is_finite() => "null".to_owned(),
        Value::Number(_) | Value::Bool(_) | Value::Null => v.to_display_string(),
        other => format_any(other),
    }
}

fn pretty_property_key(key: &PropertyKey) -> String {
    match key {
        PropertyKey::String(s) if keys::is_identifier(s) => s.clone(),
        PropertyKey::String(s) => value::quote(s),
        PropertyKey::Symbol(s) => s.to_string(),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// FRONT API
// ————————————————————————————————————————————————————————————————————————————

/// Compile a printer using the default hooks.
pub fn compile(ast: &AstRef) -> Printer {
    compile_with(ast, crate::data::default_hooks())
}

pub fn compile_with(ast: &AstRef, hooks: Arc<HookRegistry<Printer>>) -> Printer {
    compiler(hooks).compile(ast)
}

/// A printer pass whose union guards evaluate lazy thunks through the same
/// bodies as the printers, so both are compiled from one body node.
pub fn compiler(hooks: Arc<HookRegistry<Printer>>) -> Compiler<Pretty> {
    let bodies = LazyBodies::default();
    let guards = Compiler::with_bodies(Is, bodies.clone());
    Compiler::with_bodies(Pretty { hooks, guards }, bodies)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{self, Element, EnumValue, IndexSignature, PropertySignature, Rest, TemplateSpan, TemplateSpanType};
    use crate::compiler::HookKey;
    use crate::value::Symbol;
    use num_bigint::BigInt;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pretty(ast: &AstRef, v: serde_json::Value) -> String {
        compile(ast).print(&Value::from(v)).unwrap()
    }

    #[test]
    fn leaves() {
        assert_eq!(pretty(&ast::string(), json!("a\"b")), r#""a\"b""#);
        assert_eq!(pretty(&ast::number(), json!(1.5)), "1.5");
        assert_eq!(pretty(&ast::number(), json!(2)), "2");
        assert_eq!(pretty(&ast::boolean(), json!(true)), "true");
        assert_eq!(pretty(&ast::literal("a"), json!("a")), r#""a""#);
        assert_eq!(pretty(&ast::literal(1.0), json!(1)), "1");
        assert_eq!(pretty(&ast::null(), json!(null)), "null");
        assert_eq!(pretty(&ast::unknown(), json!({"a": [1]})), r#"{"a":[1]}"#);
        assert_eq!(pretty(&ast::any(), json!("x")), r#""x""#);
        assert_eq!(pretty(&ast::object(), json!([1, "a"])), r#"[1,"a"]"#);

        let e = ast::enums([("A", EnumValue::String("a".into())), ("B", EnumValue::Number(1.0))]);
        assert_eq!(pretty(&e, json!("a")), r#""a""#);
        assert_eq!(pretty(&e, json!(1)), "1");

        let t = ast::template_literal("id-", vec![TemplateSpan::new(TemplateSpanType::Number, "")]);
        assert_eq!(pretty(&t, json!("id-1")), r#""id-1""#);
    }

    #[test]
    fn non_json_leaves() {
        let big = Value::BigInt(BigInt::from(10).pow(20));
        assert_eq!(compile(&ast::bigint()).print(&big).unwrap(), "100000000000000000000n");
        assert_eq!(compile(&ast::literal(BigInt::from(1))).print(&Value::BigInt(BigInt::from(1))).unwrap(), "1n");
        assert_eq!(compile(&ast::void()).print(&Value::Undefined).unwrap(), "void(0)");
        assert_eq!(compile(&ast::undefined()).print(&Value::Undefined).unwrap(), "undefined");
        let s = Value::from(Symbol::new("k"));
        assert_eq!(compile(&ast::symbol()).print(&s).unwrap(), "Symbol(k)");
        assert_eq!(compile(&ast::unique_symbol(Symbol::new("k"))).print(&s).unwrap(), "Symbol(k)");
    }

    #[test]
    fn never_always_fails() {
        let printer = compile(&ast::never());
        assert_eq!(printer.print(&Value::Null), Err(PrettyError::Never));
        assert_eq!(printer.print(&Value::Undefined), Err(PrettyError::Never));
    }

    #[test]
    fn rendering_is_deterministic() {
        let printer = compile(&ast::number());
        let v = Value::from(0.1 + 0.2);
        assert_eq!(printer.print(&v).unwrap(), printer.print(&v.clone()).unwrap());
    }

    #[test]
    fn fixed_tuple() {
        let t = ast::tuple(
            vec![Element::required(ast::number()), Element::required(ast::number()), Element::required(ast::number())],
            None,
        );
        assert_eq!(pretty(&t, json!([1, 2, 3])), "[1, 2, 3]");
        assert_eq!(pretty(&ast::tuple(vec![], None), json!([])), "[]");
    }

    #[test]
    fn optional_trailing_elements_are_omitted() {
        let t = ast::tuple(vec![Element::required(ast::number()), Element::optional(ast::number())], None);
        assert_eq!(pretty(&t, json!([1])), "[1]");
        assert_eq!(pretty(&t, json!([1, 2])), "[1, 2]");
    }

    #[test]
    fn variadic_tuple() {
        let t = ast::tuple(
            vec![Element::required(ast::number())],
            Some(Rest { head: ast::string(), tail: vec![ast::boolean()] }),
        );
        assert_eq!(pretty(&t, json!([1, "a", "b", true])), r#"[1, "a", "b", true]"#);
        assert_eq!(pretty(&t, json!([1, true])), "[1, true]");
    }

    #[test]
    fn missing_optional_before_rest_selects_the_tuple_member() {
        let t = ast::tuple(
            vec![Element::required(ast::number()), Element::optional(ast::string())],
            Some(Rest { head: ast::boolean(), tail: vec![] }),
        );
        assert_eq!(pretty(&t, json!([1])), "[1]");
        let u = ast::union(vec![ast::null(), t]);
        assert_eq!(pretty(&u, json!([1])), "[1]");
        assert_eq!(pretty(&u, json!([1, "a", true, false])), r#"[1, "a", true, false]"#);
        assert_eq!(pretty(&u, json!(null)), "null");
    }

    #[test]
    fn several_tail_elements_follow_the_run_in_order() {
        let t = ast::tuple(
            vec![],
            Some(Rest { head: ast::number(), tail: vec![ast::string(), ast::boolean(), ast::null()] }),
        );
        assert_eq!(pretty(&t, json!([1, 2, "a", false, null])), r#"[1, 2, "a", false, null]"#);
        assert_eq!(pretty(&t, json!(["a", false, null])), r#"["a", false, null]"#);
    }

    #[test]
    fn arrays() {
        assert_eq!(pretty(&ast::array(ast::string()), json!(["a", "b"])), r#"["a", "b"]"#);
        assert_eq!(pretty(&ast::array(ast::string()), json!([])), "[]");
    }

    #[test]
    fn record_with_optional_property() {
        let r = ast::type_literal(vec![PropertySignature::optional("a", ast::number())], vec![]);
        assert_eq!(pretty(&r, json!({})), "{}");
        assert_eq!(pretty(&r, json!({"a": 1})), "{ a: 1 }");
    }

    #[test]
    fn record_keys_follow_declaration_order_and_quote_when_needed() {
        let r = ast::type_literal(
            vec![
                PropertySignature::required("b", ast::string()),
                PropertySignature::required("a-b", ast::number()),
                PropertySignature::required(Symbol::new("tag"), ast::boolean()),
            ],
            vec![],
        );
        let mut v = Value::object([("a-b", Value::from(1)), ("b", Value::from("x"))]);
        if let Value::Object(o) = &mut v {
            o.insert(PropertyKey::Symbol(Symbol::new("tag")), Value::Bool(true));
        }
        assert_eq!(compile(&r).print(&v).unwrap(), r#"{ b: "x", "a-b": 1, Symbol(tag): true }"#);
    }

    #[test]
    fn index_signature_does_not_repeat_named_keys() {
        let r = ast::type_literal(
            vec![PropertySignature::required("a", ast::number())],
            vec![IndexSignature::new(ast::string(), ast::number())],
        );
        assert_eq!(pretty(&r, json!({"b": 2, "a": 1, "c d": 3})), r#"{ a: 1, b: 2, "c d": 3 }"#);
    }

    #[test]
    fn later_index_signatures_skip_keys_already_printed() {
        let prefixed = ast::template_literal("x-", vec![TemplateSpan::new(TemplateSpanType::String, "")]);
        let r = ast::type_literal(
            vec![],
            vec![
                IndexSignature::new(prefixed, ast::number()),
                IndexSignature::new(ast::string(), ast::unknown()),
            ],
        );
        assert_eq!(pretty(&r, json!({"y": "a", "x-1": 1})), r#"{ "x-1": 1, y: "a" }"#);
    }

    #[test]
    fn union_first_listed_member_wins() {
        let short = ast::refinement(ast::string(), "short", |v| matches!(v, Value::String(s) if s.len() < 3));
        let loud = ast::transform(ast::string(), ast::string());

        // both members accept "ab"; only the order decides
        let mut hooks = HookRegistry::new();
        hooks.register(HookKey::Kind(ast::AstKind::Transform), |ast: &AstRef, _: &[Printer]| {
            Printer::new(ast.clone(), |v| Ok(format!("loud({})", v.to_display_string())))
        });
        let hooks = Arc::new(hooks);
        let first = ast::union(vec![loud.clone(), short.clone()]);
        let second = ast::union(vec![short, loud]);
        let v = Value::from("ab");
        assert_eq!(compile_with(&first, hooks.clone()).print(&v).unwrap(), "loud(ab)");
        assert_eq!(compile_with(&second, hooks).print(&v).unwrap(), r#""ab""#);
    }

    #[test]
    fn union_dispatches_on_membership() {
        let u = ast::union(vec![ast::string(), ast::number()]);
        assert_eq!(pretty(&u, json!("1")), r#""1""#);
        assert_eq!(pretty(&u, json!(1)), "1");
    }

    #[test]
    fn union_without_match_is_an_error() {
        let u = ast::union(vec![ast::string(), ast::number()]);
        let err = compile(&u).print(&Value::from(json!([true]))).unwrap_err();
        assert_eq!(err, PrettyError::NoMatchingMember { actual: "[true]".into() });
        assert_eq!(err.to_string(), "value [true] does not match any member of the union");
    }

    fn category(forced: Arc<AtomicUsize>) -> AstRef {
        ast::lazy(move |this| {
            forced.fetch_add(1, Ordering::SeqCst);
            ast::type_literal(
                vec![
                    PropertySignature::required("name", ast::string()),
                    PropertySignature::required("subcategories", ast::array(this.clone())),
                ],
                vec![],
            )
        })
    }

    #[test]
    fn recursive_record_renders_nested_levels() {
        let forced = Arc::new(AtomicUsize::new(0));
        let printer = compile(&category(forced.clone()));
        let v = json!({"name": "a", "subcategories": [
            {"name": "b", "subcategories": [
                {"name": "c", "subcategories": [{"name": "d", "subcategories": []}]}
            ]}
        ]});
        let v = Value::from(v);
        let out = printer.print(&v).unwrap();
        assert_eq!(
            out,
            r#"{ name: "a", subcategories: [{ name: "b", subcategories: [{ name: "c", subcategories: [{ name: "d", subcategories: [] }] }] }] }"#
        );
        assert_eq!(printer.print(&v).unwrap(), out);
        assert_eq!(forced.load(Ordering::SeqCst), 1, "the lazy body is compiled once");
    }

    #[test]
    fn lazy_union_evaluates_its_thunk_once() {
        let forced = Arc::new(AtomicUsize::new(0));
        let counter = forced.clone();
        let list = ast::lazy(move |this| {
            counter.fetch_add(1, Ordering::SeqCst);
            ast::union(vec![
                ast::null(),
                ast::type_literal(vec![PropertySignature::required("next", this.clone())], vec![]),
            ])
        });
        let v = json!({"next": {"next": {"next": null}}});
        assert_eq!(pretty(&list, v), "{ next: { next: { next: null } } }");
        assert_eq!(forced.load(Ordering::SeqCst), 1, "guards and printers share one body");
    }

    #[test]
    fn recursive_occurrences_share_one_printer() {
        let node = category(Arc::new(AtomicUsize::new(0)));
        let pass = compiler(crate::data::default_hooks());
        let first = pass.compile(&node);
        let second = pass.compile(&node);
        assert!(first.same_recursion(&second));

        let elsewhere = compile(&node);
        assert!(!first.same_recursion(&elsewhere), "separate passes memoize separately");
    }

    #[test]
    fn deep_recursion_within_reason() {
        let list = ast::lazy(|this| {
            ast::union(vec![
                ast::null(),
                ast::tuple(vec![Element::required(ast::number()), Element::required(this.clone())], None),
            ])
        });
        let mut v = json!(null);
        for i in (0..50).rev() {
            v = json!([i, v]);
        }
        let out = pretty(&list, v);
        assert!(out.starts_with("[0, [1, [2, "));
        assert!(out.ends_with(&format!("null{}", "]".repeat(50))));
    }

    #[test]
    fn refinements_print_like_their_base() {
        let positive = ast::refinement(ast::number(), "positive", |v| matches!(v, Value::Number(n) if *n > 0.0));
        let record = |ty: AstRef| ast::type_literal(vec![PropertySignature::required("n", ty)], vec![]);
        let v = json!({"n": 4.5});
        assert_eq!(pretty(&record(positive), v.clone()), pretty(&record(ast::number()), v));
    }

    #[test]
    fn transforms_print_their_output_side() {
        let parsed = ast::transform(ast::string(), ast::number());
        assert_eq!(pretty(&parsed, json!(12)), "12");
    }

    #[test]
    fn kind_hooks_override_rules_everywhere() {
        let hooks = HookRegistry::<Printer>::new().with(HookKey::Kind(ast::AstKind::NumberKeyword), |ast, _| {
            Printer::new(ast.clone(), |v| Ok(format!("#{}", v.to_display_string())))
        });
        let t = ast::array(ast::number());
        let printer = compile_with(&t, Arc::new(hooks));
        assert_eq!(printer.print(&Value::from(json!([1, 2]))).unwrap(), "[#1, #2]");
    }

    #[test]
    fn alias_without_hook_prints_its_body() {
        let alias = ast::type_alias("Id", vec![], ast::string());
        assert_eq!(pretty(&alias, json!("x")), r#""x""#);
    }
}
