//! Newtype IDs for type-safe entity references.
//!
//! Source (commerce) ids and Target (profile) ids are all plain integers on
//! the wire. The `define_id!` macro keeps them from being mixed up, which
//! matters most for addresses: a Source address id is the correlation key of a
//! bulk profile request while the Target profile id is what an update needs.

/// Macro to define a type-safe integer ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - `new()`, `as_i32()` and `is_set()` (nonzero)
/// - `From<i32>` and `Into<i32>` implementations
///
/// # Example
///
/// ```rust
/// # use profile_bridge_core::define_id;
/// define_id!(WarehouseId);
///
/// let id = WarehouseId::new(7);
/// assert!(id.is_set());
/// assert_eq!(id.as_i32(), 7);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            Default,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }

            /// Whether the id is a real assignment (both platforms use 0 for "none").
            #[must_use]
            pub const fn is_set(&self) -> bool {
                self.0 != 0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Source (commerce platform) ids
define_id!(SourceUserId);
define_id!(SourceAddressId);
define_id!(SourceGroupId);
define_id!(SourceRegionId);

// Target (profile platform) ids
define_id!(TargetProfileId);
define_id!(TargetStateCode);

/// Target user identifier.
///
/// The profile platform returns user ids as strings and expects them back
/// verbatim in URL paths, so this one is not an integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct TargetUserId(String);

impl TargetUserId {
    /// Create a new Target user id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TargetUserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl ::core::fmt::Display for TargetUserId {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        f.write_str(&self.0)
    }
}
