//! HTTP client for the storefront REST API.
//!
//! Provides both async and blocking client variants behind feature flags.
//! Failed calls come back as [`StorefrontError::Api`] carrying a message
//! that can be shown to the user as-is.

use core::time::Duration;

use url::Url;

use crate::error::{Result, StorefrontError};
use crate::messages;
use crate::models::{Product, ProductEnvelope};

/// Base URL of the hosted storefront backend.
pub const DEFAULT_BASE_URL: &str = "https://e-com-backend-y9ps.onrender.com/api";

/// Per-request timeout unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// `POST` login endpoint.
const LOGIN_PATH: &[&str] = &["auth", "login"];
/// `POST` register endpoint.
const REGISTER_PATH: &[&str] = &["auth", "register"];
/// `GET` profile endpoint.
const PROFILE_PATH: &[&str] = &["auth", "profile"];
/// Product collection; single products live below it.
const PRODUCTS_SEGMENT: &str = "products";
/// Products owned by the signed-in merchant.
const MERCHANT_PRODUCTS_PATH: &[&str] = &["products", "merchant", "my-products"];
/// Liveness endpoint.
const HEALTH_PATH: &[&str] = &["health"];

/// Appends path segments and query pairs to the API base URL.
fn endpoint(base: &Url, segments: &[&str], query: &[(&'static str, String)]) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| StorefrontError::InvalidUrl(base.to_string()))?;
        let _path = path.pop_if_empty().extend(segments);
    }
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        let _pairs = pairs.extend_pairs(query);
    }
    Ok(url)
}

/// Parses a configured base URL.
fn parse_base_url(raw: &str) -> Result<Url> {
    Url::parse(raw.trim_end_matches('/'))
        .map_err(|err| StorefrontError::InvalidUrl(format!("{raw}: {err}")))
}

/// Pulls the backend's own message out of an error body:
/// `error.message` first, then a top-level `message`.
fn backend_message(body: &serde_json::Value) -> Option<String> {
    body.pointer("/error/message")
        .or_else(|| body.get("message"))
        .and_then(serde_json::Value::as_str)
        .filter(|message| !message.trim().is_empty())
        .map(str::to_owned)
}

/// Joins the `msg` of every entry in a validation `errors` array.
fn field_messages(body: &serde_json::Value) -> Option<String> {
    let joined = body
        .get("errors")?
        .as_array()?
        .iter()
        .filter_map(|entry| entry.get("msg").and_then(serde_json::Value::as_str))
        .collect::<Vec<_>>()
        .join(", ");
    (!joined.is_empty()).then_some(joined)
}

/// Maps an HTTP error status and its body to a user-facing message.
///
/// Bodies that are not JSON are treated as empty.
#[inline]
#[must_use]
pub fn normalize_api_error(status: u16, body: &str) -> String {
    let json: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
    let backend = backend_message(&json);
    match status {
        401 => messages::error::LOGIN_REQUIRED.to_owned(),
        403 => messages::error::UNAUTHORIZED.to_owned(),
        404 => messages::error::RESOURCE_NOT_FOUND.to_owned(),
        409 => backend.unwrap_or_else(|| messages::error::OPERATION_FAILED.to_owned()),
        422 => backend
            .or_else(|| field_messages(&json))
            .unwrap_or_else(|| messages::error::REQUIRED_FIELD.to_owned()),
        429 => messages::error::TOO_MANY_REQUESTS.to_owned(),
        500 => messages::error::SERVER_ERROR.to_owned(),
        _ => backend.unwrap_or_else(|| messages::error::UNKNOWN_ERROR.to_owned()),
    }
}

/// Rejects a 2xx body that explicitly reports `success: false`.
fn check_success_flag(status: u16, body: &str) -> Result<()> {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return Ok(());
    };
    if json.get("success").and_then(serde_json::Value::as_bool) == Some(false) {
        let message =
            backend_message(&json).unwrap_or_else(|| messages::error::UNKNOWN_ERROR.to_owned());
        tracing::debug!(status, message = %message, "API reported failure");
        return Err(StorefrontError::Api { status, message });
    }
    Ok(())
}

/// Unwraps the product carried by a single-product response.
fn into_product(envelope: ProductEnvelope) -> Result<Product> {
    envelope.product.ok_or_else(|| StorefrontError::Api {
        status: 200,
        message: envelope
            .message
            .unwrap_or_else(|| messages::error::UNKNOWN_ERROR.to_owned()),
    })
}

/// Generates a storefront client (async or blocking) with builder, methods, and tests.
macro_rules! define_client {
    (
        client_name: $client:ident,
        builder_name: $builder:ident,
        http_type: $http_type:ty,
        request_type: $req_type:ty,
        response_type: $resp_type:ty,
        client_doc: $client_doc:expr,
        builder_doc: $builder_doc:expr,
        $(async_kw: $async_kw:tt,)?
        $(await_kw: $await_ext:tt,)?
    ) => {
        #[doc = $builder_doc]
        #[derive(Debug)]
        pub struct $builder {
            /// Bearer token sent with every request.
            token: Option<SecretString>,
            /// Base URL override (for testing).
            base_url: Option<String>,
            /// Per-request timeout.
            timeout: Duration,
        }

        impl $builder {
            /// Sets the bearer token sent with every request.
            #[inline]
            #[must_use]
            pub fn token<T: Into<String>>(mut self, token: T) -> Self {
                self.token = Some(SecretString::from(token.into()));
                self
            }

            /// Overrides the base URL (useful for testing with a mock server).
            #[inline]
            #[must_use]
            pub fn base_url<T: Into<String>>(mut self, url: T) -> Self {
                self.base_url = Some(url.into());
                self
            }

            /// Overrides the per-request timeout.
            #[inline]
            #[must_use]
            pub const fn timeout(mut self, timeout: Duration) -> Self {
                self.timeout = timeout;
                self
            }

            /// Builds the client.
            ///
            /// # Errors
            ///
            /// Returns [`StorefrontError::InvalidUrl`] if the base URL does not parse.
            /// Returns [`StorefrontError::Http`] if the HTTP client fails to build.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub fn build(self) -> Result<$client> {
                let base_url = parse_base_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
                tracing::debug!(base_url = %base_url, authenticated = self.token.is_some(), "building client");
                let http = <$http_type>::builder().timeout(self.timeout).build()?;

                Ok($client {
                    http,
                    token: self.token,
                    base_url,
                })
            }
        }

        #[doc = $client_doc]
        #[derive(Debug)]
        pub struct $client {
            /// Underlying HTTP client.
            http: $http_type,
            /// Bearer token, if signed in.
            token: Option<SecretString>,
            /// API base URL.
            base_url: Url,
        }

        impl $client {
            /// Creates a new builder for configuring the client.
            #[inline]
            #[must_use]
            pub const fn builder() -> $builder {
                $builder {
                    token: None,
                    base_url: None,
                    timeout: DEFAULT_TIMEOUT,
                }
            }

            /// Returns the API base URL.
            #[inline]
            #[must_use]
            pub const fn base_url(&self) -> &Url {
                &self.base_url
            }

            /// Returns `true` if requests carry a bearer token.
            #[inline]
            #[must_use]
            pub const fn is_authenticated(&self) -> bool {
                self.token.is_some()
            }

            /// Signs in via `POST /auth/login`.
            ///
            /// # Errors
            ///
            /// Returns an error if the HTTP request fails, the server returns a
            /// non-success status, or the response cannot be deserialized.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
                let url = endpoint(&self.base_url, LOGIN_PATH, &[])?;
                self.execute(self.http.post(url).json(credentials)) $( .$await_ext )?
            }

            /// Creates an account via `POST /auth/register`.
            ///
            /// # Errors
            ///
            /// Returns an error if the HTTP request fails, the server returns a
            /// non-success status, or the response cannot be deserialized.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn register(&self, registration: &Registration) -> Result<AuthResponse> {
                let url = endpoint(&self.base_url, REGISTER_PATH, &[])?;
                self.execute(self.http.post(url).json(registration)) $( .$await_ext )?
            }

            /// Fetches the signed-in user via `GET /auth/profile`.
            ///
            /// # Errors
            ///
            /// Returns an error if the HTTP request fails, the server returns a
            /// non-success status, or the response cannot be deserialized.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn profile(&self) -> Result<ProfileResponse> {
                let url = endpoint(&self.base_url, PROFILE_PATH, &[])?;
                self.execute(self.http.get(url)) $( .$await_ext )?
            }

            /// Lists products via `GET /products`.
            ///
            /// # Errors
            ///
            /// Returns an error if the HTTP request fails, the server returns a
            /// non-success status, or the response cannot be deserialized.
            #[inline]
            #[tracing::instrument(skip_all, fields(page = filter.page))]
            pub $($async_kw)? fn products(&self, filter: &ProductFilter) -> Result<ProductPage> {
                let url = endpoint(&self.base_url, &[PRODUCTS_SEGMENT], &filter.query_pairs())?;
                self.execute(self.http.get(url)) $( .$await_ext )?
            }

            /// Fetches one product via `GET /products/{id}`.
            ///
            /// # Errors
            ///
            /// Returns an error if the HTTP request fails, the server returns a
            /// non-success status, or the body carries no product.
            #[inline]
            #[tracing::instrument(skip_all, fields(product = %id))]
            pub $($async_kw)? fn product(&self, id: &ProductId) -> Result<Product> {
                let url = endpoint(&self.base_url, &[PRODUCTS_SEGMENT, id.as_str()], &[])?;
                let envelope: ProductEnvelope = self.execute(self.http.get(url)) $( .$await_ext )? ?;
                into_product(envelope)
            }

            /// Creates a product via `POST /products` (merchants only).
            ///
            /// # Errors
            ///
            /// Returns an error if the HTTP request fails, the server returns a
            /// non-success status, or the body carries no product.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn create_product(&self, draft: &ProductDraft) -> Result<Product> {
                let url = endpoint(&self.base_url, &[PRODUCTS_SEGMENT], &[])?;
                let envelope: ProductEnvelope =
                    self.execute(self.http.post(url).json(draft)) $( .$await_ext )? ?;
                into_product(envelope)
            }

            /// Replaces a product via `PUT /products/{id}`.
            ///
            /// # Errors
            ///
            /// Returns an error if the HTTP request fails, the server returns a
            /// non-success status, or the body carries no product.
            #[inline]
            #[tracing::instrument(skip_all, fields(product = %id))]
            pub $($async_kw)? fn update_product(&self, id: &ProductId, draft: &ProductDraft) -> Result<Product> {
                let url = endpoint(&self.base_url, &[PRODUCTS_SEGMENT, id.as_str()], &[])?;
                let envelope: ProductEnvelope =
                    self.execute(self.http.put(url).json(draft)) $( .$await_ext )? ?;
                into_product(envelope)
            }

            /// Deletes a product via `DELETE /products/{id}`.
            ///
            /// # Errors
            ///
            /// Returns an error if the HTTP request fails, the server returns a
            /// non-success status, or the response cannot be deserialized.
            #[inline]
            #[tracing::instrument(skip_all, fields(product = %id))]
            pub $($async_kw)? fn delete_product(&self, id: &ProductId) -> Result<StatusResponse> {
                let url = endpoint(&self.base_url, &[PRODUCTS_SEGMENT, id.as_str()], &[])?;
                self.execute(self.http.delete(url)) $( .$await_ext )?
            }

            /// Lists the signed-in merchant's products via
            /// `GET /products/merchant/my-products`.
            ///
            /// # Errors
            ///
            /// Returns an error if the HTTP request fails, the server returns a
            /// non-success status, or the response cannot be deserialized.
            #[inline]
            #[tracing::instrument(skip_all, fields(page = filter.page))]
            pub $($async_kw)? fn merchant_products(&self, filter: &ProductFilter) -> Result<ProductPage> {
                let url = endpoint(&self.base_url, MERCHANT_PRODUCTS_PATH, &filter.query_pairs())?;
                self.execute(self.http.get(url)) $( .$await_ext )?
            }

            /// Checks backend liveness via `GET /health`.
            ///
            /// # Errors
            ///
            /// Returns an error if the HTTP request fails, the server returns a
            /// non-success status, or the response cannot be deserialized.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn health(&self) -> Result<StatusResponse> {
                let url = endpoint(&self.base_url, HEALTH_PATH, &[])?;
                self.execute(self.http.get(url)) $( .$await_ext )?
            }

            /// Attaches the bearer token, sends the request and
            /// deserializes the response.
            #[tracing::instrument(skip_all)]
            $($async_kw)? fn execute<Resp: serde::de::DeserializeOwned>(
                &self,
                request: $req_type,
            ) -> Result<Resp> {
                let request = match self.token.as_ref() {
                    Some(token) => request.bearer_auth(token.expose_secret()),
                    None => request,
                };
                let response: $resp_type = request.send() $( .$await_ext )? ?;

                let status = response.status();
                tracing::debug!(status = %status, url = %response.url(), "received response");
                if status.is_success() {
                    let body = response.text() $( .$await_ext )? ?;
                    tracing::trace!(body_len = body.len(), "parsing response body");
                    check_success_flag(status.as_u16(), &body)?;
                    serde_json::from_str(&body).map_err(StorefrontError::from)
                } else {
                    let body = response
                        .text()
                        $( .$await_ext )?
                        .unwrap_or_default();
                    let message = normalize_api_error(status.as_u16(), &body);
                    tracing::debug!(status = status.as_u16(), message = %message, "API error");
                    Err(StorefrontError::Api {
                        status: status.as_u16(),
                        message,
                    })
                }
            }
        }

        #[cfg(test)]
        mod tests {
            use super::*;

            #[test]
            fn builder_defaults() {
                let client = $client::builder().build().unwrap();
                assert_eq!(client.base_url().as_str(), DEFAULT_BASE_URL);
                assert!(!client.is_authenticated());
            }

            #[test]
            fn builder_with_token() {
                let client = $client::builder().token("test-token").build().unwrap();
                assert!(client.is_authenticated());
            }

            #[test]
            fn builder_custom_base_url() {
                let client = $client::builder()
                    .base_url("http://localhost:8080/api/")
                    .timeout(Duration::from_secs(1))
                    .build()
                    .unwrap();
                assert_eq!(client.base_url().as_str(), "http://localhost:8080/api");
            }

            #[test]
            fn builder_rejects_garbage_url() {
                let err = $client::builder().base_url("not a url").build().unwrap_err();
                assert!(matches!(err, StorefrontError::InvalidUrl(_)));
            }
        }
    };
}

#[cfg(feature = "async")]
mod async_client {
    //! Async HTTP client for the storefront API.

    use core::time::Duration;

    use secrecy::{ExposeSecret as _, SecretString};
    use url::Url;

    use super::{
        DEFAULT_BASE_URL, DEFAULT_TIMEOUT, HEALTH_PATH, LOGIN_PATH, MERCHANT_PRODUCTS_PATH,
        PRODUCTS_SEGMENT, PROFILE_PATH, REGISTER_PATH, check_success_flag, endpoint, into_product,
        normalize_api_error, parse_base_url,
    };
    use crate::error::{Result, StorefrontError};
    use crate::models::{
        AuthResponse, Credentials, Product, ProductDraft, ProductEnvelope, ProductFilter,
        ProductId, ProductPage, ProfileResponse, Registration, StatusResponse,
    };

    define_client! {
        client_name: StorefrontClient,
        builder_name: StorefrontClientBuilder,
        http_type: reqwest::Client,
        request_type: reqwest::RequestBuilder,
        response_type: reqwest::Response,
        client_doc: "Async client for the storefront API.\n\nUse [`StorefrontClient::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`StorefrontClient`].",
        async_kw: async,
        await_kw: await,
    }

}

#[cfg(feature = "blocking")]
mod blocking_client {
    //! Blocking (synchronous) HTTP client for the storefront API.

    use core::time::Duration;

    use secrecy::{ExposeSecret as _, SecretString};
    use url::Url;

    use super::{
        DEFAULT_BASE_URL, DEFAULT_TIMEOUT, HEALTH_PATH, LOGIN_PATH, MERCHANT_PRODUCTS_PATH,
        PRODUCTS_SEGMENT, PROFILE_PATH, REGISTER_PATH, check_success_flag, endpoint, into_product,
        normalize_api_error, parse_base_url,
    };
    use crate::error::{Result, StorefrontError};
    use crate::models::{
        AuthResponse, Credentials, Product, ProductDraft, ProductEnvelope, ProductFilter,
        ProductId, ProductPage, ProfileResponse, Registration, StatusResponse,
    };

    define_client! {
        client_name: StorefrontBlockingClient,
        builder_name: StorefrontBlockingClientBuilder,
        http_type: reqwest::blocking::Client,
        request_type: reqwest::blocking::RequestBuilder,
        response_type: reqwest::blocking::Response,
        client_doc: "Blocking (synchronous) client for the storefront API.\n\nUse [`StorefrontBlockingClient::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`StorefrontBlockingClient`].",
    }
}

#[cfg(feature = "async")]
pub use async_client::{StorefrontClient, StorefrontClientBuilder};
#[cfg(feature = "blocking")]
pub use blocking_client::{StorefrontBlockingClient, StorefrontBlockingClientBuilder};
