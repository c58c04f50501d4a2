//! Error types for the storefront client library.

use crate::messages;

/// All errors that can occur when using the storefront client.
#[derive(Debug, thiserror::Error)]
pub enum StorefrontError {
    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Durable storage backend failed.
    #[error("storage error: {0}")]
    Storage(Box<dyn core::error::Error + Send + Sync>),

    /// HTTP transport failed before a response was received.
    #[cfg(any(feature = "async", feature = "blocking"))]
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status or a `success: false` body.
    #[error("api error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// User-facing message derived from the response.
        message: String,
    },

    /// A request URL could not be built.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The credential token payload could not be decoded.
    #[error("token decode error: {0}")]
    TokenDecode(String),

    /// Input was rejected at the call boundary.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl StorefrontError {
    /// Returns `true` if the API rejected the credentials (HTTP 401).
    #[inline]
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(*self, Self::Api { status: 401, .. })
    }

    /// Returns the message to surface to the user for this error.
    #[inline]
    #[must_use]
    pub fn user_message(&self) -> String {
        match *self {
            Self::Api { ref message, .. } => message.clone(),
            #[cfg(any(feature = "async", feature = "blocking"))]
            Self::Http(ref err) => {
                if err.is_timeout() {
                    messages::error::TIMEOUT.to_owned()
                } else {
                    messages::error::NETWORK_ERROR.to_owned()
                }
            }
            Self::Validation(ref err) => err.to_string(),
            Self::TokenDecode(_) => messages::error::TOKEN_EXPIRED.to_owned(),
            Self::Serialization(_) | Self::Storage(_) | Self::InvalidUrl(_) => {
                messages::error::SOMETHING_WENT_WRONG.to_owned()
            }
        }
    }
}

/// Form and call-boundary validation failures.
///
/// The display text is the message shown next to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field was left empty.
    #[error("This field is required")]
    Required {
        /// Name of the field.
        field: &'static str,
    },

    /// A field is shorter than its minimum length.
    #[error("{label} must be at least {min} characters")]
    TooShort {
        /// Name of the field.
        field: &'static str,
        /// Human label used in the message.
        label: &'static str,
        /// Minimum number of characters.
        min: usize,
    },

    /// The email address is malformed.
    #[error("Please enter a valid email address")]
    InvalidEmail,

    /// The password is too short.
    #[error("Password must be at least 6 characters")]
    WeakPassword,

    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Price is negative or not a number.
    #[error("Price must be positive")]
    InvalidPrice,

    /// Cart quantity below the floor of one.
    #[error("quantity must be at least 1, got {0}")]
    QuantityTooLow(i64),

    /// Checkout attempted with nothing in the cart.
    #[error("Your cart is empty")]
    EmptyCart,
}

impl ValidationError {
    /// Returns the name of the field this error refers to, if any.
    #[inline]
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match *self {
            Self::Required { field } | Self::TooShort { field, .. } => Some(field),
            Self::InvalidEmail => Some("email"),
            Self::WeakPassword => Some("password"),
            Self::PasswordMismatch => Some("confirm_password"),
            Self::InvalidPrice => Some("price"),
            Self::QuantityTooLow(_) => Some("quantity"),
            Self::EmptyCart => None,
        }
    }
}

/// Convenience alias for results in this crate.
pub type Result<T> = core::result::Result<T, StorefrontError>;
