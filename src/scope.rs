//! Per-thread stack of current contexts.
//!
//! Each thread keeps its own stack, so workers evaluating the same graph
//! under different contexts never see each other's [`Context::current`].
//!
//! ```
//! use std::sync::Arc;
//! use compute_context::{Context, Scope};
//!
//! let mut context = Context::new();
//! context.set_frame(10.0).unwrap();
//! let context = Arc::new(context);
//! {
//!     let _scope = Scope::new(&context);
//!     assert_eq!(Context::current().frame().unwrap(), 10.0);
//! }
//! assert_eq!(Context::current().frame().unwrap(), 1.0);
//! ```

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::{Arc, LazyLock};

use tracing::{debug, trace};

use crate::context::Context;

static DEFAULT_CONTEXT: LazyLock<Arc<Context>> = LazyLock::new(|| {
    debug!("initializing default context");
    Arc::new(Context::new())
});

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Arc<Context>>> = const { RefCell::new(Vec::new()) };
}

/// Makes a context current on the calling thread until dropped.
///
/// Scopes on one thread must be dropped in reverse order of creation.
/// Dropping out of order is a programming error and panics.
#[must_use = "the context is only current while the scope is alive"]
pub struct Scope {
    context: Arc<Context>,
    depth: usize,
    // The pop must happen on the thread that pushed.
    _not_send: PhantomData<*const ()>,
}

impl Scope {
    pub fn new(context: &Arc<Context>) -> Self {
        let depth = CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.push(context.clone());
            stack.len()
        });
        trace!(depth, "pushed context");
        Self {
            context: context.clone(),
            depth,
            _not_send: PhantomData,
        }
    }

    /// The context this scope made current.
    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        let popped = CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let len = stack.len();
            (len, stack.pop())
        });
        trace!(depth = self.depth, "popped context");
        // Skip the check while unwinding so a failed assertion elsewhere is not turned into an abort.
        if std::thread::panicking() {
            return;
        }
        match popped {
            (len, Some(top)) if len == self.depth && Arc::ptr_eq(&top, &self.context) => {}
            (len, _) => panic!(
                "context scopes dropped out of order: scope pushed at depth {} but the stack had depth {}",
                self.depth, len
            ),
        }
    }
}

impl Context {
    /// The innermost context scoped on this thread, or the default context.
    pub fn current() -> Arc<Context> {
        CONTEXT_STACK
            .with(|stack| stack.borrow().last().cloned())
            .unwrap_or_else(|| Context::default_context().clone())
    }

    /// The process-wide context returned when no scope is active.
    ///
    /// Created on first use and never destroyed.
    pub fn default_context() -> &'static Arc<Context> {
        &DEFAULT_CONTEXT
    }
}

/// Number of scopes currently active on the calling thread.
pub fn depth() -> usize {
    CONTEXT_STACK.with(|stack| stack.borrow().len())
}

/// Runs `f` with `context` current on this thread.
pub fn with_context<R>(context: &Arc<Context>, f: impl FnOnce() -> R) -> R {
    let _scope = Scope::new(context);
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn context_at(frame: f64) -> Arc<Context> {
        let mut c = Context::new();
        c.set_frame(frame).unwrap();
        Arc::new(c)
    }

    #[test]
    fn empty_stack_resolves_to_default() {
        assert_eq!(depth(), 0);
        assert!(Arc::ptr_eq(&Context::current(), Context::default_context()));
    }

    #[test]
    fn scopes_nest() {
        let a = context_at(2.0);
        let b = context_at(3.0);
        let outer = Scope::new(&a);
        {
            let _inner = Scope::new(&b);
            assert!(Arc::ptr_eq(&Context::current(), &b));
            assert_eq!(depth(), 2);
        }
        assert!(Arc::ptr_eq(&Context::current(), &a));
        drop(outer);
        assert!(Arc::ptr_eq(&Context::current(), Context::default_context()));
    }

    #[test]
    fn with_context_pops_on_early_return() {
        let a = context_at(4.0);
        let result: Result<(), &str> = with_context(&a, || {
            assert_eq!(Context::current().frame().unwrap(), 4.0);
            Err::<(), &str>("stop")?;
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(depth(), 0);
    }

    #[test]
    #[should_panic(expected = "out of order")]
    fn out_of_order_drop_panics() {
        let a = context_at(1.0);
        let b = context_at(2.0);
        let first = Scope::new(&a);
        let second = Scope::new(&b);
        std::mem::forget(second);
        drop(first);
    }
}
