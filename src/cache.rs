//! Process-scoped printer cache behind [`render`].
//!
//! Populated the first time a schema node is rendered, keyed by the node's
//! address, and never evicted: an entry keeps its node alive so the address
//! cannot be reused while the entry exists. It lives until the process exits.
use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::ast::AstRef;
use crate::error::Result;
use crate::pretty::{self, Printer};
use crate::value::Value;

static PRINTERS: Lazy<Mutex<HashMap<usize, (AstRef, Printer)>>> = Lazy::new(Default::default);

/// The cached printer for `schema`, compiling it on first use.
pub fn printer_for(schema: &AstRef) -> Printer {
    let key = Arc::as_ptr(schema) as usize;
    if let Some((_, printer)) = PRINTERS.lock().get(&key) {
        return printer.clone();
    }
    debug!("compiling printer for {:?} schema {key:#x}", schema.kind());
    // compiled outside the lock; if another thread won the race its printer
    // is kept and ours is dropped
    let printer = pretty::compile(schema);
    PRINTERS
        .lock()
        .entry(key)
        .or_insert_with(|| (schema.clone(), printer))
        .1
        .clone()
}

/// Render `value` against `schema`; the same as `compile(schema).print(value)`
/// but compiling each schema only once per process.
pub fn render(schema: &AstRef, value: &Value) -> Result<String> {
    printer_for(schema).print(value)
}
