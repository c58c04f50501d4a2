//! Enumeration types for constrained values.

use serde::{Deserialize, Serialize};

/// Account role assigned at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Browses products and checks out.
    #[default]
    Customer,
    /// Manages a product catalogue.
    Merchant,
}

impl core::fmt::Display for Role {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match *self {
            Self::Customer => "customer",
            Self::Merchant => "merchant",
        })
    }
}

/// Visual kind of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    /// Completed action.
    Success,
    /// Failed action.
    Error,
    /// Something needs attention.
    Warning,
    /// Neutral information.
    #[default]
    Info,
    /// Action in progress; usually morphed into success or error later.
    Loading,
}

/// Sort direction for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

impl SortOrder {
    /// Returns the query-string value.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}
