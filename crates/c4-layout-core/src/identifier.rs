//! Validated identifiers backed by a global string interner.
//!
//! An [`Id`] can only be obtained through [`Id::new`] (or its `FromStr` /
//! `TryFrom` equivalents), which checks the identifier grammar
//! `^[A-Za-z][A-Za-z0-9_-]*$`. Every `Id` in scope is therefore well-formed.
//!
//! Identifiers are interned, so `Id` is `Copy` and hashes as a small integer.
//! Ordering compares the underlying strings, which keeps every sorted
//! collection of ids independent of interning order.

use std::{
    cmp::Ordering,
    fmt,
    str::FromStr,
    sync::{Mutex, MutexGuard, OnceLock},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};
use thiserror::Error;

/// Global string interner for identifier storage.
///
/// # Thread Safety
///
/// Access is serialized through a `Mutex`; ids themselves are plain symbols
/// and can be shared freely across threads.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        // A poisoned interner still holds valid symbols; keep using it.
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Reasons an identifier string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("identifier must not be empty")]
    Empty,

    #[error("malformed identifier `{value}`: unexpected `{found}` at position {position}")]
    Malformed {
        value: String,
        found: char,
        position: usize,
    },
}

/// A validated, interned identifier.
///
/// # Examples
///
/// ```
/// use c4_layout_core::identifier::Id;
///
/// let api = Id::new("api_gateway").unwrap();
/// assert_eq!(api, "api_gateway");
///
/// assert!(Id::new("").is_err());
/// assert!(Id::new("9lives").is_err());
/// assert!(Id::new("has space").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Validates `name` and interns it.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Empty`] for an empty string and
    /// [`IdError::Malformed`] when the first character is not an ASCII letter
    /// or a later character is not an ASCII letter, digit, `_` or `-`.
    pub fn new(name: &str) -> Result<Self, IdError> {
        validate(name)?;
        Ok(Self(interner().get_or_intern(name)))
    }

    /// Returns an owned copy of the identifier text.
    pub fn as_string(&self) -> String {
        interner()
            .resolve(self.0)
            .map(str::to_owned)
            .unwrap_or_default()
    }
}

/// Checks the identifier grammar without interning.
pub fn validate(name: &str) -> Result<(), IdError> {
    let mut chars = name.chars().enumerate();
    let Some((_, first)) = chars.next() else {
        return Err(IdError::Empty);
    };
    if !first.is_ascii_alphabetic() {
        return Err(IdError::Malformed {
            value: name.to_string(),
            found: first,
            position: 0,
        });
    }
    for (position, ch) in chars {
        if !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '-') {
            return Err(IdError::Malformed {
                value: name.to_string(),
                found: ch,
                position,
            });
        }
    }
    Ok(())
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interner = interner();
        let value = interner.resolve(self.0).unwrap_or_default();
        f.write_str(value)
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({self})")
    }
}

impl PartialOrd for Id {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Id {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.0 == other.0 {
            return Ordering::Equal;
        }
        let interner = interner();
        let lhs = interner.resolve(self.0).unwrap_or_default();
        let rhs = interner.resolve(other.0).unwrap_or_default();
        lhs.cmp(rhs)
    }
}

impl FromStr for Id {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Id {
    type Error = IdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        interner().resolve(self.0) == Some(other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Id::new(&raw).map_err(serde::de::Error::custom)
    }
}
