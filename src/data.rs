//! Data types that print through hooks rather than through their structural
//! body, and the default hook registry that knows about them.
//!
//! Each constructor returns a `TypeAlias`. Its body is a faithful structural
//! fallback, so a printer compiled without these hooks still works, just
//! less readably.
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::ast::{self, AstRef, PropertySignature};
use crate::compiler::{HookKey, HookRegistry};
use crate::error::Result;
use crate::format::format_any;
use crate::guard;
use crate::pretty::Printer;
use crate::value::{PropertyKey, UNDEFINED, Value};

pub const READONLY_SET: &str = "ReadonlySet";
pub const READONLY_MAP: &str = "ReadonlyMap";
pub const OPTION: &str = "Option";

static DEFAULT_HOOKS: Lazy<Arc<HookRegistry<Printer>>> = Lazy::new(|| {
    let mut hooks = HookRegistry::new();
    hooks
        .register(HookKey::Alias(READONLY_SET.into()), readonly_set_pretty)
        .register(HookKey::Alias(READONLY_MAP.into()), readonly_map_pretty)
        .register(HookKey::Alias(OPTION.into()), option_pretty);
    Arc::new(hooks)
});

/// Hooks used by [`crate::compile`] and [`crate::render`].
pub fn default_hooks() -> Arc<HookRegistry<Printer>> {
    DEFAULT_HOOKS.clone()
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

/// A set whose members all satisfy `item`.
pub fn readonly_set(item: AstRef) -> AstRef {
    let is_item = guard::is(&item);
    let body = ast::refinement(ast::object(), READONLY_SET, move |v| {
        matches!(v, Value::Set(xs) if xs.iter().all(|x| is_item.test(x)))
    });
    ast::type_alias(READONLY_SET, vec![item], body)
}

pub fn readonly_map(key: AstRef, value: AstRef) -> AstRef {
    let is_key = guard::is(&key);
    let is_value = guard::is(&value);
    let body = ast::refinement(ast::object(), READONLY_MAP, move |v| {
        matches!(v, Value::Map(entries) if entries.iter().all(|(k, v)| is_key.test(k) && is_value.test(v)))
    });
    ast::type_alias(READONLY_MAP, vec![key, value], body)
}

/// `{ _tag: "None" } | { _tag: "Some", value }`
pub fn option(value: AstRef) -> AstRef {
    let none = ast::type_literal(vec![PropertySignature::required("_tag", ast::literal("None"))], vec![]);
    let some = ast::type_literal(
        vec![
            PropertySignature::required("_tag", ast::literal("Some")),
            PropertySignature::required("value", value.clone()),
        ],
        vec![],
    );
    ast::type_alias(OPTION, vec![value], ast::union(vec![none, some]))
}

/// Value-side helpers matching [`option`].
pub fn some(value: Value) -> Value {
    Value::object([("_tag", Value::from("Some")), ("value", value)])
}

pub fn none() -> Value {
    Value::object([("_tag", Value::from("None"))])
}

// ————————————————————————————————————————————————————————————————————————————
// HOOKS
// ————————————————————————————————————————————————————————————————————————————

fn readonly_set_pretty(ast: &AstRef, args: &[Printer]) -> Printer {
    let [item] = args else { return fallback(ast) };
    let item = item.clone();
    Printer::new(ast.clone(), move |v| {
        let Value::Set(xs) = v else { return Ok(format_any(v)) };
        let items = xs.iter().map(|x| item.print(x)).collect::<Result<Vec<_>>>()?;
        Ok(format!("new Set([{}])", items.join(", ")))
    })
}

fn readonly_map_pretty(ast: &AstRef, args: &[Printer]) -> Printer {
    let [key, value] = args else { return fallback(ast) };
    let (key, value) = (key.clone(), value.clone());
    Printer::new(ast.clone(), move |v| {
        let Value::Map(entries) = v else { return Ok(format_any(v)) };
        let entries = entries
            .iter()
            .map(|(k, v)| Ok(format!("[{}, {}]", key.print(k)?, value.print(v)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("new Map([{}])", entries.join(", ")))
    })
}

fn option_pretty(ast: &AstRef, args: &[Printer]) -> Printer {
    let [value] = args else { return fallback(ast) };
    let value = value.clone();
    let tag = PropertyKey::from("_tag");
    let inner = PropertyKey::from("value");
    Printer::new(ast.clone(), move |v| {
        let Some(obj) = v.as_object() else { return Ok(format_any(v)) };
        match obj.get(&tag) {
            Some(Value::String(t)) if t == "Some" => {
                let x = obj.get(&inner).unwrap_or(&UNDEFINED);
                Ok(format!("some({})", value.print(x)?))
            }
            Some(Value::String(t)) if t == "None" => Ok("none()".to_owned()),
            _ => Ok(format_any(v)),
        }
    })
}

/// Used when a hook is registered on an alias with the wrong arity.
fn fallback(ast: &AstRef) -> Printer {
    log::warn!("hook arity does not match the type arguments of {ast:?}");
    Printer::new(ast.clone(), |v| Ok(format_any(v)))
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pretty::{compile, compile_with};

    fn set(xs: Vec<Value>) -> Value {
        Value::Set(xs)
    }

    #[test]
    fn readonly_set_prints_as_a_constructor_call() {
        let schema = readonly_set(ast::string());
        let printer = compile(&schema);
        assert_eq!(printer.print(&set(vec![])).unwrap(), "new Set([])");
        assert_eq!(
            printer.print(&set(vec![Value::from("a"), Value::from("b")])).unwrap(),
            r#"new Set(["a", "b"])"#
        );
    }

    #[test]
    fn readonly_set_guard_checks_items() {
        let is = guard::is(&readonly_set(ast::string()));
        assert!(is.test(&set(vec![])));
        assert!(is.test(&set(vec![Value::from("a")])));
        assert!(!is.test(&set(vec![Value::from("a"), Value::from(1)])));
        assert!(!is.test(&Value::Null));
        assert!(!is.test(&Value::Undefined));
    }

    #[test]
    fn readonly_map_prints_entries() {
        let schema = readonly_map(ast::string(), ast::number());
        let v = Value::Map(vec![(Value::from("a"), Value::from(1)), (Value::from("b"), Value::from(2))]);
        assert_eq!(compile(&schema).print(&v).unwrap(), r#"new Map([["a", 1], ["b", 2]])"#);
    }

    #[test]
    fn option_prints_some_and_none() {
        let printer = compile(&option(ast::number()));
        assert_eq!(printer.print(&some(Value::from(1))).unwrap(), "some(1)");
        assert_eq!(printer.print(&none()).unwrap(), "none()");
    }

    #[test]
    fn nested_data_types_compose() {
        let schema = option(readonly_set(ast::number()));
        let v = some(set(vec![Value::from(1), Value::from(2)]));
        assert_eq!(compile(&schema).print(&v).unwrap(), "some(new Set([1, 2]))");
    }

    #[test]
    fn without_hooks_the_structural_body_prints() {
        let bare = Arc::new(HookRegistry::new());
        let printer = compile_with(&option(ast::number()), bare.clone());
        assert_eq!(printer.print(&some(Value::from(1))).unwrap(), r#"{ _tag: "Some", value: 1 }"#);
        assert_eq!(printer.print(&none()).unwrap(), r#"{ _tag: "None" }"#);

        let set_printer = compile_with(&readonly_set(ast::string()), bare);
        assert_eq!(set_printer.print(&set(vec![Value::from("a")])).unwrap(), "{}");
    }

    #[test]
    fn wrong_arity_falls_back_to_format_any() {
        let alias = ast::type_alias(READONLY_SET, vec![], ast::unknown());
        assert_eq!(compile(&alias).print(&Value::from(1)).unwrap(), "1");
    }
}
