//! Evaluation contexts for a dependency-graph computation engine.
//!
//! A [`Context`] is a small named-value environment ("which frame, which
//! shot, which variant") that parameterizes a computation. Each thread keeps
//! a stack of current contexts, pushed and popped with [`Scope`], so the same
//! graph can be evaluated under different contexts on different workers.
//! [`Context::hash`] fingerprints a context for use in cache keys, and
//! [`Context::substitute`] expands `$name`, `#` and `~` markers in strings.

pub mod context;
pub mod data;
pub mod errors;
pub mod hash;
pub mod name;
pub mod ownership;
pub mod scope;
pub mod signal;
pub mod substitute;
mod parser;

pub use context::{Context, FRAME};
pub use data::{DataType, FromData};
pub use errors::{ContextError, Result};
pub use hash::{ContextHash, ContextHasher};
pub use name::Name;
pub use ownership::Ownership;
pub use scope::{with_context, Scope};
pub use signal::{ChangedSignal, ConnectionId};
pub use substitute::{has_substitutions, has_substitutions_with, Substitutions, MAX_RECURSION_DEPTH};

/// Re-exported so callers can build values without naming `serde_json` themselves.
pub use serde_json::Value;
