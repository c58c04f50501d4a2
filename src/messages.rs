//! User-facing message catalogue.
//!
//! Every string surfaced through a toast or an error's
//! [`user_message`](crate::error::StorefrontError::user_message) lives
//! here so callers and tests agree on the exact wording.

/// Error messages.
pub mod error {
    /// Session token expired or unreadable.
    pub const TOKEN_EXPIRED: &str = "Session expired. Please login again";
    /// Request requires an authenticated session.
    pub const LOGIN_REQUIRED: &str = "Please login to continue";
    /// Authenticated but not permitted.
    pub const UNAUTHORIZED: &str = "You are not authorized to perform this action";
    /// Generic field validation failure.
    pub const REQUIRED_FIELD: &str = "This field is required";
    /// Transport failed without a response.
    pub const NETWORK_ERROR: &str = "Network error. Please check your connection";
    /// HTTP 500.
    pub const SERVER_ERROR: &str = "Server error. Please try again later";
    /// Request exceeded the client timeout.
    pub const TIMEOUT: &str = "Request timeout. Please try again";
    /// Fallback for unrecognised API failures.
    pub const UNKNOWN_ERROR: &str = "An unexpected error occurred";
    /// HTTP 404.
    pub const RESOURCE_NOT_FOUND: &str = "Resource not found";
    /// HTTP 409 without a backend message.
    pub const OPERATION_FAILED: &str = "Operation failed. Please try again";
    /// HTTP 429.
    pub const TOO_MANY_REQUESTS: &str = "Too many requests. Please try again later.";
    /// Local failure with nothing more specific to say.
    pub const SOMETHING_WENT_WRONG: &str = "Something went wrong. Please try again";
}

/// Success messages.
pub mod success {
    /// Customer login.
    pub const LOGIN: &str = "Login successful";
    /// Merchant login.
    pub const MERCHANT_LOGIN: &str = "Login successful. Your merchant dashboard is ready";
    /// Customer registration.
    pub const REGISTER: &str = "Registration successful";
    /// Merchant registration.
    pub const MERCHANT_REGISTER: &str =
        "Registration successful. Start adding products from your merchant dashboard";
    /// Logout.
    pub const LOGOUT: &str = "Logout successful";
    /// Profile update.
    pub const PROFILE_UPDATED: &str = "Data updated successfully";
    /// Merchant created a product.
    pub const PRODUCT_CREATED: &str = "Product created successfully";
    /// Merchant updated a product.
    pub const PRODUCT_UPDATED: &str = "Product updated successfully";
    /// Merchant deleted a product.
    pub const PRODUCT_DELETED: &str = "Product deleted successfully";
    /// Simulated payment went through.
    pub const ORDER_PLACED: &str = "Your product is ready to ship! Thank you!";
}

/// Progress messages shown on loading toasts.
pub mod info {
    /// Login in flight.
    pub const LOGGING_IN: &str = "Logging in...";
    /// Registration in flight.
    pub const REGISTERING: &str = "Creating account...";
    /// Product list request in flight.
    pub const LOADING_PRODUCTS: &str = "Loading products...";
    /// Product save in flight.
    pub const SAVING_PRODUCT: &str = "Saving product...";
    /// Checkout in flight.
    pub const PROCESSING: &str = "Processing...";
}

/// Builds the toast shown after a product lands in the cart.
#[inline]
#[must_use]
pub fn added_to_cart(title: &str) -> String {
    format!("{title} added to cart!")
}
