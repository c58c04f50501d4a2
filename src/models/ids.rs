//! Newtype wrappers for identifiers.
//!
//! Backend ids are opaque strings (document ids such as
//! `"64f1c2..."`); client-generated ids are plain counters.

use serde::{Deserialize, Serialize};

/// Defines a newtype id around a `Copy` integer.
macro_rules! define_copy_id {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty)
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Creates a new identifier from the given value.
            #[inline]
            #[must_use]
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            /// Returns the inner value.
            #[inline]
            #[must_use]
            pub const fn get(self) -> $inner {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

/// Defines a newtype id around a backend-issued `String`.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from the given string.
            #[inline]
            #[must_use]
            pub fn new<T: Into<String>>(value: T) -> Self {
                Self(value.into())
            }

            /// Returns a reference to the inner string.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the wrapper and returns the inner string.
            #[inline]
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };
}

define_string_id! {
    /// Backend identifier of a user account.
    UserId
}

define_string_id! {
    /// Backend identifier of a product.
    ProductId
}

define_copy_id! {
    /// Identifier of a notification, unique within its queue.
    ToastId(u64)
}

define_copy_id! {
    /// Handle of a scheduled expiry timer, usable for cancellation.
    TimerHandle(u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_serializes_as_plain_string() {
        let id = ProductId::new("p1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""p1""#);
        let back: ProductId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn string_id_display_and_conversions() {
        let id: UserId = "u-42".into();
        assert_eq!(id.to_string(), "u-42");
        assert_eq!(id.as_str(), "u-42");
        assert_eq!(id.into_inner(), "u-42");
    }

    #[test]
    fn toast_ids_order_by_value() {
        let first = ToastId::new(1);
        let second = ToastId::new(2);
        assert!(first < second);
        assert_eq!(second.get(), 2);
        assert_eq!(first.to_string(), "1");
    }
}
