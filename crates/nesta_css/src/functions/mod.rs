//! Built-in function registry.
//!
//! The registry is owned by the compiler and handed to the solver; it is
//! read-only after setup. Functions are keyed on lowercase name and arity,
//! so one name can carry several arities.

mod builtins;

use std::collections::HashMap;

use cow_utils::CowUtils;
use nesta_shared::byte_stream::Location;
use nesta_shared::errors::CssResult;

use crate::values::Value;

/// A native function over already-folded values
pub type CssFn = fn(&[Value], Location) -> CssResult<Value>;

pub struct FunctionRegistry {
    funcs: HashMap<(String, usize), CssFn>,
}

impl FunctionRegistry {
    /// An empty registry, without even the builtins
    #[must_use]
    pub fn empty() -> Self {
        Self {
            funcs: HashMap::new(),
        }
    }

    /// A registry with the built-in color functions registered
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("rgb", 3, builtins::rgb);
        registry.register("hsl", 3, builtins::hsl);
        registry
    }

    pub fn register(&mut self, name: &str, arity: usize, func: CssFn) {
        self.funcs.insert((name.to_ascii_lowercase(), arity), func);
    }

    #[must_use]
    pub fn lookup(&self, name: &str, arity: usize) -> Option<CssFn> {
        self.funcs
            .get(&(name.to_ascii_lowercase(), arity))
            .copied()
    }

    /// True when the name is registered under any arity
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        let name = name.cow_to_ascii_lowercase();
        self.funcs.keys().any(|(n, _)| n.as_str() == name.as_ref())
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
