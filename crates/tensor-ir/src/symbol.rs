//! Names shared by every graph in the process.
//!
//! Dialect names, operation names and attribute keys are all [`Symbol`]s. A
//! graph stores a symbol per op and per attribute entry, so the name table
//! lives outside any one [`IrContext`](crate::IrContext) and is never
//! cleared.

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use lasso::{Rodeo, Spur};
use parking_lot::RwLock;

static NAMES: LazyLock<RwLock<Rodeo>> = LazyLock::new(Default::default);

/// An interned name such as `pd`, `matmul` or `transpose_x`.
///
/// Comparing or hashing two symbols compares keys; the text is only read
/// for printing and for `==` against a `&str`. `Ord` follows first-intern
/// order, not the alphabet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(Spur);

impl Symbol {
    /// Symbol for a name known at compile time.
    pub fn new(text: &'static str) -> Self {
        Self::lookup(text).unwrap_or_else(|| Symbol(NAMES.write().get_or_intern_static(text)))
    }

    /// Symbol for a name built at runtime, e.g. from a parsed op string.
    pub fn from_dynamic(text: &str) -> Self {
        Self::lookup(text).unwrap_or_else(|| Symbol(NAMES.write().get_or_intern(text)))
    }

    // Names repeat far more often than they appear, so try a shared lock first.
    fn lookup(text: &str) -> Option<Self> {
        NAMES.read().get(text).map(Symbol)
    }

    /// Run `f` on the symbol's text.
    ///
    /// Takes a recursive read lock: `f` may print or compare other symbols
    /// while a writer is waiting.
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(NAMES.read_recursive().resolve(&self.0))
    }
}

impl From<&'static str> for Symbol {
    fn from(text: &'static str) -> Self {
        Symbol::new(text)
    }
}

impl From<Cow<'_, str>> for Symbol {
    fn from(text: Cow<'_, str>) -> Self {
        Symbol::from_dynamic(&text)
    }
}

impl From<String> for Symbol {
    fn from(text: String) -> Self {
        Symbol::from_dynamic(&text)
    }
}

/// Declares zero-argument functions returning fixed symbols, one per name.
///
/// ```
/// use tensor_ir::symbols;
///
/// symbols! {
///     PD => "pd",
///     #[allow(dead_code)]
///     TRANSPOSE_X => "transpose_x",
/// }
///
/// assert_eq!(PD(), "pd");
/// ```
#[macro_export]
macro_rules! symbols {
    ($($(#[$attr:meta])* $name:ident => $text:literal),* $(,)?) => {
        $(
            $(#[$attr])*
            #[allow(non_snake_case)]
            #[inline]
            pub fn $name() -> $crate::Symbol {
                $crate::Symbol::new($text)
            }
        )*
    };
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.with_str(|s| s == other)
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        *self == **other
    }
}

impl PartialEq<Symbol> for &str {
    fn eq(&self, other: &Symbol) -> bool {
        *other == **self
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_str(|s| f.write_str(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    symbols! {
        KEEP_DIM => "keep_dim",
    }

    #[test]
    fn same_text_same_symbol() {
        let a = Symbol::new("op1_name");
        let b = Symbol::from_dynamic(&String::from("op1_name"));
        assert_eq!(a, b);
        assert_eq!(a, Symbol::from(Cow::Borrowed("op1_name")));
        assert_ne!(a, Symbol::new("op2_name"));
    }

    #[test]
    fn compares_with_str() {
        let sym = Symbol::new("builtin");
        assert_eq!(sym, "builtin");
        assert!("builtin" == sym);
        assert!(sym != "builtin.f32");
        assert_eq!(sym.to_string(), "builtin");
    }

    #[test]
    fn declared_symbols_match_runtime_names() {
        let parsed = format!("{}_{}", "keep", "dim");
        assert_eq!(KEEP_DIM(), Symbol::from(parsed));
    }

    #[test]
    fn display_inside_with_str() {
        let outer = Symbol::new("pd");
        let inner = Symbol::new("matmul");
        let joined = outer.with_str(|o| format!("{o}.{inner}"));
        assert_eq!(joined, "pd.matmul");
    }
}
