//! Expansion of `$name`, `#` and `~` markers against a context.
//!
//! - `$name` / `${name}` expands to the context entry `name` (strings are
//!   expanded recursively, numbers are written in decimal, anything else
//!   contributes nothing), falling back to the environment variable of the
//!   same name. Unknown names expand to nothing.
//! - A run of N `#` becomes the rounded frame, zero-padded to N digits.
//! - A `~` at the very start of the output becomes `$HOME`.

use std::env;

use serde_json::Value;
use tracing::trace;

use crate::context::Context;
use crate::data::number_text;
use crate::errors::{ContextError, Result};
use crate::parser::Scanner;

/// Deepest nesting of string variables expanded inside each other.
pub const MAX_RECURSION_DEPTH: usize = 8;

/// Which markers [`Context::substitute_with`] expands. Disabled markers are
/// copied through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Substitutions {
    pub variables: bool,
    pub frame: bool,
    pub tilde: bool,
}

impl Substitutions {
    pub const fn all() -> Self {
        Self {
            variables: true,
            frame: true,
            tilde: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            variables: false,
            frame: false,
            tilde: false,
        }
    }

    pub const fn without_variables(self) -> Self {
        Self {
            variables: false,
            ..self
        }
    }

    pub const fn without_frame(self) -> Self {
        Self {
            frame: false,
            ..self
        }
    }

    pub const fn without_tilde(self) -> Self {
        Self {
            tilde: false,
            ..self
        }
    }

    fn is_trigger(&self, c: char) -> bool {
        match c {
            '$' => self.variables,
            '#' => self.frame,
            '~' => self.tilde,
            _ => false,
        }
    }
}

impl Default for Substitutions {
    fn default() -> Self {
        Self::all()
    }
}

/// Cheap check for whether `s` could be changed by substitution.
pub fn has_substitutions(s: &str) -> bool {
    has_substitutions_with(s, Substitutions::all())
}

pub fn has_substitutions_with(s: &str, substitutions: Substitutions) -> bool {
    s.chars().any(|c| substitutions.is_trigger(c))
}

impl Context {
    /// Expands every marker in `s`. Does not modify the context.
    pub fn substitute(&self, s: &str) -> Result<String> {
        self.substitute_with(s, Substitutions::all())
    }

    pub fn substitute_with(&self, s: &str, substitutions: Substitutions) -> Result<String> {
        let mut out = String::with_capacity(s.len());
        self.substitute_into(s, substitutions, &mut out, 0)?;
        Ok(out)
    }

    fn substitute_into(
        &self,
        s: &str,
        substitutions: Substitutions,
        out: &mut String,
        depth: usize,
    ) -> Result<()> {
        if depth > MAX_RECURSION_DEPTH {
            return Err(ContextError::RecursionLimitExceeded {
                depth: MAX_RECURSION_DEPTH,
            });
        }

        let mut scanner = Scanner::new(s);
        while let Some(c) = scanner.bump() {
            match c {
                '$' if substitutions.variables => {
                    let name = if scanner.consume_char('{') {
                        scanner.capture_until('}')
                    } else {
                        scanner.take_while(|c| c.is_ascii_alphanumeric())
                    };
                    self.expand_variable(name, substitutions, out, depth)?;
                }
                '#' if substitutions.frame => {
                    let width = 1 + scanner.count_run('#');
                    let frame = self.frame()?.round() as i64;
                    out.push_str(&format!("{frame:0width$}"));
                }
                '~' if substitutions.tilde && out.is_empty() => match env::var_os("HOME") {
                    Some(home) => out.push_str(&home.to_string_lossy()),
                    None => out.push('~'),
                },
                _ => out.push(c),
            }
        }
        Ok(())
    }

    fn expand_variable(
        &self,
        name: &str,
        substitutions: Substitutions,
        out: &mut String,
        depth: usize,
    ) -> Result<()> {
        let expanded = self.with_entry(name, |value| match value {
            Value::String(text) => {
                trace!(name, depth, "expanding context variable");
                self.substitute_into(text, substitutions, out, depth + 1)
            }
            other => {
                if let Some(text) = number_text(other) {
                    out.push_str(&text);
                }
                Ok(())
            }
        });
        match expanded {
            Some(result) => result,
            None => {
                if let Some(text) = environment_variable(name) {
                    out.push_str(&text);
                }
                Ok(())
            }
        }
    }
}

fn environment_variable(name: &str) -> Option<String> {
    // Names the platform cannot look up are simply unset.
    if name.is_empty() || name.contains(['=', '\0']) {
        return None;
    }
    env::var_os(name).map(|v| v.to_string_lossy().into_owned())
}
