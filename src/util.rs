use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use fmt::{Debug, Display, Formatter};
use once_cell::sync::Lazy;

pub(crate) type BuildHasher = fxhash::FxBuildHasher;

pub(crate) type HashMap<K, V> = hashbrown::HashMap<K, V, BuildHasher>;
pub(crate) type HashSet<K> = hashbrown::HashSet<K, BuildHasher>;

pub(crate) type IndexSet<K> = indexmap::IndexSet<K, BuildHasher>;

static STRINGS: Lazy<Mutex<IndexSet<&'static str>>> = Lazy::new(Default::default);

/// An interned string, used as an operation code.
///
/// Structural hashing compares and hashes opcodes on every operation node it
/// visits, so opcodes are interned: a [`Symbol`] is a 4-byte index into a
/// global table, and `Copy`, `Eq`, `Ord`, and `Hash` all work on that index.
///
/// The intern table leaks its strings, which is fine for the small, fixed
/// vocabulary of operation names a graph uses.
///
/// # Example
/// ```rust
/// use valnum::Symbol;
///
/// assert_eq!(Symbol::from("add"), Symbol::from("add"));
/// assert_eq!(Symbol::from("add"), "add".parse().unwrap());
///
/// assert_ne!(Symbol::from("add"), Symbol::from("mul"));
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl Symbol {
    /// Get the string that this symbol represents
    pub fn as_str(self) -> &'static str {
        let i = self.0 as usize;
        let strings = STRINGS
            .lock()
            .unwrap_or_else(|err| panic!("Failed to acquire valnum's global string cache: {}", err));
        strings.get_index(i).unwrap()
    }
}

fn leak(s: &str) -> &'static str {
    Box::leak(s.to_owned().into_boxed_str())
}

fn intern(s: &str) -> Symbol {
    let mut strings = STRINGS
        .lock()
        .unwrap_or_else(|err| panic!("Failed to acquire valnum's global string cache: {}", err));
    let i = match strings.get_full(s) {
        Some((i, _)) => i,
        None => strings.insert_full(leak(s)).0,
    };
    Symbol(i as u32)
}

impl<S: AsRef<str>> From<S> for Symbol {
    fn from(s: S) -> Self {
        intern(s.as_ref())
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.into())
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self.as_str(), f)
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self.as_str(), f)
    }
}
