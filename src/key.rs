//! Service key types identifying what a factory produces or requires.

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;

/// Key for service storage and lookup.
///
/// Keys uniquely identify a kind of service inside a `FactoryGroup` or a
/// resolved set. A key maps to at most one entry in either collection.
///
/// # Key Types
///
/// - **Type**: derived from a Rust type (the common case)
/// - **TypeNamed**: the same type registered under a distinct name
/// - **Token**: an explicit token supplied by whoever computed the keys
///
/// # Examples
///
/// ```rust
/// use ferrous_scope::{Key, key_of_type, named_key_of_type};
///
/// struct Settings;
///
/// let by_type = key_of_type::<Settings>();
/// let by_name = named_key_of_type::<Settings>("replica");
/// let token = Key::Token("settings");
///
/// assert_ne!(by_type, by_name);
/// assert_eq!(by_name.service_name(), Some("replica"));
/// assert_eq!(token.display_name(), "settings");
/// ```
#[derive(Debug, Clone, Copy)]
pub enum Key {
    /// Concrete type key with TypeId and name for diagnostics
    ///
    /// The TypeId provides identity while the name helps with debugging.
    Type(TypeId, &'static str),
    /// Named concrete type key with TypeId, typename, and name
    ///
    /// Like `Type` but with an additional string name for cases where
    /// multiple instances of the same type need different registrations.
    TypeNamed(TypeId, &'static str, &'static str),
    /// Explicit token key
    ///
    /// Used by factories assembled with `FactoryBuilder` when keys come from
    /// an external extractor rather than from Rust types.
    Token(&'static str),
}

impl Key {
    /// Get the type or token name for display
    ///
    /// ```rust
    /// use ferrous_scope::Key;
    /// use std::any::TypeId;
    ///
    /// let type_key = Key::Type(TypeId::of::<String>(), "alloc::string::String");
    /// assert_eq!(type_key.display_name(), "alloc::string::String");
    ///
    /// let named_key = Key::TypeNamed(TypeId::of::<u32>(), "u32", "port");
    /// assert_eq!(named_key.display_name(), "u32");
    /// ```
    pub fn display_name(&self) -> &'static str {
        match self {
            Key::Type(_, name) => name,
            Key::TypeNamed(_, name, _) => name,
            Key::Token(name) => name,
        }
    }

    /// Get the service name for named keys, or None otherwise
    pub fn service_name(&self) -> Option<&'static str> {
        match self {
            Key::Type(_, _) | Key::Token(_) => None,
            Key::TypeNamed(_, _, name) => Some(name),
        }
    }

    /// The `TypeId` behind type-derived keys.
    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            Key::Type(id, _) | Key::TypeNamed(id, _, _) => Some(*id),
            Key::Token(_) => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Key::Type(_, _) => 0,
            Key::TypeNamed(_, _, _) => 1,
            Key::Token(_) => 2,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::TypeNamed(_, name, service) => write!(f, "{}[{}]", name, service),
            _ => f.write_str(self.display_name()),
        }
    }
}

// TypeId-only comparison for type keys; the name is diagnostic
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) => a == b,
            (Key::TypeNamed(a, _, name_a), Key::TypeNamed(b, _, name_b)) => {
                a == b && name_a == name_b
            }
            (Key::Token(a), Key::Token(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Agrees with `PartialEq`: one TypeId is one type whatever name it carries.
// Distinct types order by name so key order is readable and stable across
// runs; TypeId breaks ties between distinct types sharing a name.
impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) if a == b => Ordering::Equal,
            (Key::Type(a, name_a), Key::Type(b, name_b)) => {
                name_a.cmp(name_b).then_with(|| a.cmp(b))
            }
            (Key::TypeNamed(a, _, name_a), Key::TypeNamed(b, _, name_b)) if a == b => {
                name_a.cmp(name_b)
            }
            (Key::TypeNamed(a, ty_a, name_a), Key::TypeNamed(b, ty_b, name_b)) => ty_a
                .cmp(ty_b)
                .then_with(|| name_a.cmp(name_b))
                .then_with(|| a.cmp(b)),
            (Key::Token(a), Key::Token(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Key::TypeNamed(id, _, name) => {
                1u8.hash(state);
                id.hash(state);
                name.hash(state);
            }
            Key::Token(name) => {
                2u8.hash(state);
                name.hash(state);
            }
        }
    }
}

/// Key derived from a Rust type.
#[inline(always)]
pub fn key_of_type<T: 'static + ?Sized>() -> Key {
    Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}

/// Key derived from a Rust type plus a registration name.
#[inline(always)]
pub fn named_key_of_type<T: 'static + ?Sized>(name: &'static str) -> Key {
    Key::TypeNamed(TypeId::of::<T>(), std::any::type_name::<T>(), name)
}
