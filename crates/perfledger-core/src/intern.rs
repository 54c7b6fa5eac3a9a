//! Shared string type for currencies.
//!
//! Currencies are repeated on every amount, cost and price in a ledger, and
//! the split engine clones them freely while building inventories. An
//! [`InternedStr`] is an `Arc<str>` so those clones are a reference count
//! bump, and equality short-circuits on pointer identity.
//!
//! # Example
//!
//! ```
//! use perfledger_core::InternedStr;
//!
//! let usd = InternedStr::new("USD");
//! let copy = usd.clone();
//!
//! assert_eq!(usd, copy);
//! assert_eq!(copy.as_str(), "USD");
//! ```

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A cheaply clonable, immutable string.
#[derive(Debug, Clone, Eq)]
pub struct InternedStr(Arc<str>);

impl Serialize for InternedStr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for InternedStr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(s))
    }
}

impl PartialOrd for InternedStr {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InternedStr {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl InternedStr {
    /// Create a new shared string.
    pub fn new(s: impl Into<Arc<str>>) -> Self {
        Self(s.into())
    }

    /// Get the string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

}

impl PartialEq for InternedStr {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl std::hash::Hash for InternedStr {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl std::fmt::Display for InternedStr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for InternedStr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for InternedStr {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for InternedStr {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for InternedStr {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&String> for InternedStr {
    fn from(s: &String) -> Self {
        Self::new(s.as_str())
    }
}

impl From<&Self> for InternedStr {
    fn from(s: &Self) -> Self {
        s.clone()
    }
}

impl PartialEq<str> for InternedStr {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for InternedStr {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<String> for InternedStr {
    fn eq(&self, other: &String) -> bool {
        self.as_str() == other
    }
}

impl Default for InternedStr {
    fn default() -> Self {
        Self::new("")
    }
}

impl std::borrow::Borrow<str> for InternedStr {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_equality_without_shared_allocation() {
        let s1 = InternedStr::new("GBP");
        let s2 = InternedStr::new("GBP");

        assert_eq!(s1, s2);
        assert_eq!(s1, "GBP");
        assert_ne!(s1, InternedStr::new("USD"));
    }

    #[test]
    fn test_ordering_follows_str() {
        let mut currencies = vec![
            InternedStr::new("USD"),
            InternedStr::new("AA"),
            InternedStr::new("GBP"),
        ];
        currencies.sort();
        let names: Vec<&str> = currencies.iter().map(InternedStr::as_str).collect();
        assert_eq!(names, ["AA", "GBP", "USD"]);
    }

    #[test]
    fn test_borrow_lookup() {
        let mut map = HashMap::new();
        map.insert(InternedStr::new("VLS"), 1);
        assert_eq!(map.get("VLS"), Some(&1));
    }
}
