//! Generic AST compiler driver.
//!
//! A [`Match`] is a dispatch table: one rule per [`AstKind`], producing some
//! output (a printer, a guard, ...). [`Compiler`] walks an AST with it:
//! - lazy nodes are memoized per compilation pass and compiled on first use,
//! - other nodes consult the table's hook lookup first,
//! - everything else goes to the table's rule for the node's kind.
//!
//! Self-reference never creates an `Arc` cycle: the first occurrence of a lazy
//! node owns its deferred state, every later occurrence in the same pass holds
//! a weak back-reference to it.
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use log::{debug, trace};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::ast::{Ast, AstKind, AstRef, Lazy, Thunk};

// ————————————————————————————————————————————————————————————————————————————
// HOOKS
// ————————————————————————————————————————————————————————————————————————————

/// Custom rule: receives the node it replaces and the outputs compiled from
/// the node's type arguments.
pub type Hook<T> = Arc<dyn Fn(&AstRef, &[T]) -> T + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HookKey {
    /// Matches a `TypeAlias` by id.
    Alias(String),
    /// Matches every node of a kind.
    Kind(AstKind),
}

pub struct HookRegistry<T> {
    hooks: IndexMap<HookKey, Hook<T>>,
}

impl<T> Default for HookRegistry<T> {
    fn default() -> Self {
        Self { hooks: IndexMap::new() }
    }
}

impl<T> HookRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        key: HookKey,
        hook: impl Fn(&AstRef, &[T]) -> T + Send + Sync + 'static,
    ) -> &mut Self {
        self.hooks.insert(key, Arc::new(hook));
        self
    }

    pub fn with(
        mut self,
        key: HookKey,
        hook: impl Fn(&AstRef, &[T]) -> T + Send + Sync + 'static,
    ) -> Self {
        self.register(key, hook);
        self
    }

    /// Alias id first, then node kind.
    pub fn lookup(&self, ast: &Ast) -> Option<&Hook<T>> {
        let by_alias = match ast {
            Ast::TypeAlias(alias) => self.hooks.get(&HookKey::Alias(alias.id.clone())),
            _ => None,
        };
        by_alias.or_else(|| self.hooks.get(&HookKey::Kind(ast.kind())))
    }
}

impl<T> fmt::Debug for HookRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.hooks.keys()).finish()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DISPATCH TABLE
// ————————————————————————————————————————————————————————————————————————————

pub trait Match: Sized + Send + Sync + 'static {
    type Output: Clone + Send + Sync + 'static;

    fn hook(&self, _ast: &Ast) -> Option<Hook<Self::Output>> {
        None
    }

    /// Rule for every kind except `Lazy`. Children are compiled through `go`.
    fn rule(&self, ast: &AstRef, go: &Compiler<Self>) -> Self::Output;

    /// Wraps a lazy node whose body is compiled on first use of `target`.
    fn deferred(&self, ast: &AstRef, target: Deferred<Self>) -> Self::Output;
}

// ————————————————————————————————————————————————————————————————————————————
// DRIVER
// ————————————————————————————————————————————————————————————————————————————

/// Bodies of the lazy nodes forced during a pass, keyed like the memo table.
///
/// Compilers that take part in the same pass (e.g. a printer compiler and the
/// guard compiler it uses for unions) share one `LazyBodies`, so each thunk is
/// evaluated at most once and every compiler sees the same body node.
#[derive(Clone, Default)]
pub struct LazyBodies {
    // the lazy node is kept so its thunk address cannot be reused as a key
    cells: Arc<Mutex<HashMap<usize, (AstRef, Arc<OnceCell<AstRef>>)>>>,
}

impl LazyBodies {
    fn force(&self, ast: &AstRef, thunk: &Thunk) -> AstRef {
        let key = Arc::as_ptr(thunk) as *const () as usize;
        let cell = self
            .cells
            .lock()
            .entry(key)
            .or_insert_with(|| (ast.clone(), Arc::default()))
            .1
            .clone();
        // evaluated outside the lock; concurrent callers wait on the cell
        cell.get_or_init(|| {
            trace!("evaluating thunk of lazy node {key:#x}");
            thunk(ast)
        })
        .clone()
    }
}

impl fmt::Debug for LazyBodies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LazyBodies({})", self.cells.lock().len())
    }
}

/// One compilation pass. Clones share the table, the memo table and the lazy
/// bodies.
pub struct Compiler<M: Match> {
    table: Arc<M>,
    memo: Arc<Mutex<HashMap<usize, Weak<DeferredState<M>>>>>,
    bodies: LazyBodies,
}

impl<M: Match> Clone for Compiler<M> {
    fn clone(&self) -> Self {
        Self { table: self.table.clone(), memo: self.memo.clone(), bodies: self.bodies.clone() }
    }
}

impl<M: Match> Compiler<M> {
    pub fn new(table: M) -> Self {
        Self::with_bodies(table, LazyBodies::default())
    }

    /// A compiler that evaluates lazy thunks through `bodies`, shared with
    /// the other compilers of the same pass.
    pub fn with_bodies(table: M, bodies: LazyBodies) -> Self {
        Self { table: Arc::new(table), memo: Arc::default(), bodies }
    }

    pub fn compile(&self, ast: &AstRef) -> M::Output {
        if let Ast::Lazy(lazy) = ast.as_ref() {
            return self.compile_lazy(ast, lazy);
        }
        if let Some(hook) = self.table.hook(ast) {
            debug!("hook replaces the {:?} rule", ast.kind());
            let args = ast
                .type_arguments()
                .iter()
                .map(|arg| self.compile(arg))
                .collect::<Vec<_>>();
            return hook(ast, &args);
        }
        self.table.rule(ast, self)
    }

    fn compile_lazy(&self, ast: &AstRef, lazy: &Lazy) -> M::Output {
        let key = lazy.key();
        let target = {
            let mut memo = self.memo.lock();
            match memo.get(&key).and_then(Weak::upgrade) {
                Some(state) => {
                    trace!("memo hit for lazy node {key:#x}");
                    Deferred(Link::Back {
                        state: Arc::downgrade(&state),
                        ast: ast.clone(),
                        compiler: self.clone(),
                    })
                }
                None => {
                    let state = Arc::new(DeferredState {
                        ast: ast.clone(),
                        thunk: lazy.thunk.clone(),
                        compiler: self.clone(),
                        cell: OnceCell::new(),
                    });
                    memo.insert(key, Arc::downgrade(&state));
                    Deferred(Link::Owner(state))
                }
            }
        };
        self.table.deferred(ast, target)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DEFERRED
// ————————————————————————————————————————————————————————————————————————————

struct DeferredState<M: Match> {
    ast: AstRef,
    thunk: Thunk,
    compiler: Compiler<M>,
    cell: OnceCell<M::Output>,
}

impl<M: Match> DeferredState<M> {
    fn force(&self) -> M::Output {
        self.cell
            .get_or_init(|| {
                let body = self.compiler.bodies.force(&self.ast, &self.thunk);
                self.compiler.compile(&body)
            })
            .clone()
    }
}

enum Link<M: Match> {
    Owner(Arc<DeferredState<M>>),
    Back {
        state: Weak<DeferredState<M>>,
        ast: AstRef,
        compiler: Compiler<M>,
    },
}

/// Handle to the compiled body of a lazy node.
pub struct Deferred<M: Match>(Link<M>);

impl<M: Match> Clone for Deferred<M> {
    fn clone(&self) -> Self {
        match &self.0 {
            Link::Owner(state) => Self(Link::Owner(state.clone())),
            Link::Back { state, ast, compiler } => Self(Link::Back {
                state: state.clone(),
                ast: ast.clone(),
                compiler: compiler.clone(),
            }),
        }
    }
}

impl<M: Match> Deferred<M> {
    /// The body output, compiled on the first call of any handle sharing this
    /// state.
    pub fn get(&self) -> M::Output {
        match &self.0 {
            Link::Owner(state) => state.force(),
            Link::Back { state, ast, compiler } => match state.upgrade() {
                Some(state) => state.force(),
                // owner dropped (e.g. discarded by a hook): compile afresh
                None => compiler.compile(ast),
            },
        }
    }

    /// Whether both handles resolve to the same memoized state.
    pub fn same_target(&self, other: &Self) -> bool {
        self.target() == other.target()
    }

    fn target(&self) -> *const () {
        match &self.0 {
            Link::Owner(state) => Arc::as_ptr(state) as *const (),
            Link::Back { state, .. } => state.as_ptr() as *const (),
        }
    }
}

impl<M: Match> fmt::Debug for Deferred<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match &self.0 {
            Link::Owner(_) => "owner",
            Link::Back { .. } => "back",
        };
        write!(f, "Deferred({role}, {:p})", self.target())
    }
}

// ------------------------------- Tests ------------------------------------ //
