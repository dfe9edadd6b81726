//! Hashed identifiers for node types and endpoints.
//!
//! An [`Identifier`] is a 32-bit FNV-1a hash of a human readable name.
//! Identifiers compare, order and hash by their numeric value only, the
//! name is kept around purely for diagnostics.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, OnceLock};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Computes the 32-bit FNV-1a hash of a byte string.
pub const fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// A stable identifier built from a name or an explicit numeric value.
///
/// Identifiers are `Copy` so they can travel through the real-time
/// command queues without allocating.
///
/// # Example
///
/// ```ignore
/// const PLAY: Identifier = Identifier::new("Play");
/// assert_eq!(PLAY, Identifier::from_value(fnv1a(b"Play")));
/// assert_eq!(PLAY.debug_name(), "Play");
/// ```
#[derive(Clone, Copy)]
pub struct Identifier {
    value: u32,
    name: Option<&'static str>,
}

impl Identifier {
    /// Creates an identifier by hashing a static name.
    pub const fn new(name: &'static str) -> Self {
        Self {
            value: fnv1a(name.as_bytes()),
            name: Some(name),
        }
    }

    /// Creates an identifier from a raw numeric value. It has no debug name.
    pub const fn from_value(value: u32) -> Self {
        Self { value, name: None }
    }

    /// Creates an identifier from a name only known at runtime.
    ///
    /// The name is interned for the lifetime of the process so the
    /// resulting identifier stays `Copy`. Only call this while building
    /// graphs, never from the audio thread.
    ///
    /// Interned names are never freed. Repeated names are stored once, but
    /// a host that keeps loading descriptions with new endpoint names grows
    /// the interner for as long as it runs.
    pub fn intern(name: &str) -> Self {
        Self::new(intern_name(name))
    }

    /// Returns the numeric value.
    pub const fn value(&self) -> u32 {
        self.value
    }

    /// Returns the name this identifier was built from, or an empty string.
    pub fn debug_name(&self) -> &'static str {
        self.name.unwrap_or("")
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Identifier {}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "Identifier({:?}, {:#010x})", name, self.value),
            None => write!(f, "Identifier({:#010x})", self.value),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "{}", self.value),
        }
    }
}

fn intern_name(name: &str) -> &'static str {
    static NAMES: OnceLock<Mutex<HashSet<&'static str>>> = OnceLock::new();

    let mut names = NAMES
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(existing) = names.get(name) {
        return *existing;
    }

    let leaked: &'static str = Box::leak(name.to_owned().into_boxed_str());
    names.insert(leaked);
    leaked
}
