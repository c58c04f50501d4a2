//! Authentication state backed by durable storage.
//!
//! The store holds the current user and credential token. Its invariant is
//! that either both are present (authenticated) or neither is; every
//! operation that can fail halfway restores that before returning.

use secrecy::{ExposeSecret as _, SecretString};

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, StorefrontError};
use crate::messages;
use crate::models::{Role, ToastKind, User, UserUpdate};
use crate::storage::{KeyValueStorage, TOKEN_KEY, USER_KEY};
use crate::toast::Notify;
use crate::token::{self, TokenValidity};

/// Client session: current user, token, and the loading flag.
#[derive(Debug)]
pub struct SessionStore<S: KeyValueStorage, C: Clock = SystemClock> {
    /// Durable mirror of `user` and `token`.
    storage: S,
    /// Time source for token expiry checks.
    clock: C,
    /// Authenticated user, if any.
    user: Option<User>,
    /// Credential token, present exactly when `user` is.
    token: Option<SecretString>,
    /// `true` until [`SessionStore::initialize`] has run.
    loading: bool,
}

impl<S: KeyValueStorage> SessionStore<S> {
    /// Creates an uninitialized store on the system clock.
    #[inline]
    #[must_use]
    pub const fn new(storage: S) -> Self {
        Self::with_clock(storage, SystemClock)
    }
}

impl<S: KeyValueStorage, C: Clock> SessionStore<S, C> {
    /// Creates an uninitialized store on the given clock.
    #[inline]
    #[must_use]
    pub const fn with_clock(storage: S, clock: C) -> Self {
        Self {
            storage,
            clock,
            user: None,
            token: None,
            loading: true,
        }
    }

    /// Restores a persisted session.
    ///
    /// Runs once; later calls only report the current state. A missing,
    /// partial, or unreadable persisted session leaves the store logged out
    /// and removes whatever was persisted. Returns whether the store is
    /// authenticated afterwards.
    #[tracing::instrument(skip_all)]
    pub fn initialize(&mut self) -> bool {
        if !self.loading {
            tracing::debug!("session already initialized");
            return self.is_authenticated();
        }
        match self.read_persisted() {
            Ok(Some((user, token))) => {
                tracing::info!(user = %user.id, role = %user.role, "session restored");
                self.user = Some(user);
                self.token = Some(SecretString::from(token));
            }
            Ok(None) => tracing::debug!("no persisted session"),
            Err(err) => {
                tracing::warn!(error = %err, "discarding persisted session");
                self.discard_persisted();
            }
        }
        self.loading = false;
        self.is_authenticated()
    }

    /// Reads the persisted pair. `Ok(None)` means nothing was stored.
    fn read_persisted(&self) -> Result<Option<(User, String)>> {
        let token = self.storage.get(TOKEN_KEY)?;
        let user = self.storage.get(USER_KEY)?;
        match (token, user) {
            (None, None) => Ok(None),
            (Some(token), Some(user_json)) if !token.is_empty() => {
                let user: User = serde_json::from_str(&user_json)?;
                Ok(Some((user, token)))
            }
            _ => Err(StorefrontError::Storage(
                "persisted session is incomplete".into(),
            )),
        }
    }

    /// Records a successful login and emits the role-specific welcome.
    ///
    /// Returns `false` (and stays logged out, with an error toast) if the
    /// session cannot be persisted.
    #[inline]
    pub fn login<T: Into<String>, N: Notify>(
        &mut self,
        user: User,
        token: T,
        notices: &mut N,
    ) -> bool {
        let message = match user.role {
            Role::Merchant => messages::success::MERCHANT_LOGIN,
            Role::Customer => messages::success::LOGIN,
        };
        self.establish(user, token.into(), message, notices)
    }

    /// Records a successful registration; behaves like
    /// [`SessionStore::login`] with registration wording.
    #[inline]
    pub fn register<T: Into<String>, N: Notify>(
        &mut self,
        user: User,
        token: T,
        notices: &mut N,
    ) -> bool {
        let message = match user.role {
            Role::Merchant => messages::success::MERCHANT_REGISTER,
            Role::Customer => messages::success::REGISTER,
        };
        self.establish(user, token.into(), message, notices)
    }

    /// Persists then adopts `user` and `token`.
    #[tracing::instrument(skip_all, fields(user = %user.id))]
    fn establish<N: Notify>(
        &mut self,
        user: User,
        token: String,
        success: &str,
        notices: &mut N,
    ) -> bool {
        if token.is_empty() {
            tracing::warn!("refusing to establish a session without a token");
            let _toast = notices.notify(messages::error::SOMETHING_WENT_WRONG, ToastKind::Error);
            return false;
        }
        if let Err(err) = self.persist(&user, &token) {
            tracing::error!(error = %err, "failed to persist session");
            self.user = None;
            self.token = None;
            self.discard_persisted();
            let _toast = notices.notify(&err.user_message(), ToastKind::Error);
            return false;
        }
        tracing::info!(role = %user.role, "session established");
        self.user = Some(user);
        self.token = Some(SecretString::from(token));
        self.loading = false;
        let _toast = notices.notify(success, ToastKind::Success);
        true
    }

    /// Writes the token and user records.
    fn persist(&self, user: &User, token: &str) -> Result<()> {
        let user_json = serde_json::to_string(user)?;
        self.storage.set(TOKEN_KEY, token)?;
        self.storage.set(USER_KEY, &user_json)
    }

    /// Removes both persisted records, logging failures.
    fn discard_persisted(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.storage.remove(key) {
                tracing::warn!(key, error = %err, "failed to remove persisted session key");
            }
        }
    }

    /// Drops the in-memory and persisted session.
    fn clear(&mut self) {
        self.user = None;
        self.token = None;
        self.discard_persisted();
    }

    /// Logs out and emits a goodbye toast.
    #[tracing::instrument(skip_all)]
    pub fn logout<N: Notify>(&mut self, notices: &mut N) {
        self.clear();
        tracing::info!("logged out");
        let _toast = notices.notify(messages::success::LOGOUT, ToastKind::Success);
    }

    /// Merges `update` into the current user and persists the result.
    ///
    /// Returns `false` without changes when logged out. The in-memory user
    /// is updated even if persisting fails.
    #[tracing::instrument(skip_all)]
    pub fn update_user(&mut self, update: UserUpdate) -> bool {
        let Some(user) = self.user.as_mut() else {
            tracing::debug!("ignoring user update while logged out");
            return false;
        };
        update.apply_to(user);
        let written = serde_json::to_string(&*user)
            .map_err(StorefrontError::from)
            .and_then(|json| self.storage.set(USER_KEY, &json));
        if let Err(err) = written {
            tracing::warn!(error = %err, "failed to persist updated user");
        }
        true
    }

    /// Checks the held token's expiry against the clock.
    ///
    /// An expired or unreadable token logs the session out with a warning
    /// toast. Without a token nothing changes.
    #[tracing::instrument(skip_all)]
    pub fn check_token_validity<N: Notify>(&mut self, notices: &mut N) -> TokenValidity {
        let Some(secret) = self.token.as_ref() else {
            return TokenValidity::Missing;
        };
        let validity = token::check(secret.expose_secret(), self.clock.now());
        if !validity.is_valid() {
            tracing::info!(?validity, "dropping unusable token");
            self.clear();
            let _toast = notices.notify(messages::error::TOKEN_EXPIRED, ToastKind::Warning);
        }
        validity
    }

    /// Reacts to the backend rejecting the token: logs out and asks the
    /// user to sign in again.
    #[tracing::instrument(skip_all)]
    pub fn handle_unauthorized<N: Notify>(&mut self, notices: &mut N) {
        let was_authenticated = self.is_authenticated();
        self.clear();
        tracing::info!(was_authenticated, "session rejected by backend");
        let _toast = notices.notify(messages::error::LOGIN_REQUIRED, ToastKind::Warning);
    }

    /// Returns `true` when both user and token are held.
    #[inline]
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    /// Returns `true` for an authenticated merchant.
    #[inline]
    #[must_use]
    pub fn is_merchant(&self) -> bool {
        self.is_authenticated() && self.user.as_ref().is_some_and(User::is_merchant)
    }

    /// Returns `true` for an authenticated customer.
    #[inline]
    #[must_use]
    pub fn is_customer(&self) -> bool {
        self.is_authenticated() && !self.is_merchant()
    }

    /// Returns `true` until [`SessionStore::initialize`] has run.
    #[inline]
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Returns the current user.
    #[inline]
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Returns the current token.
    #[inline]
    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// Returns the token as a string slice for request headers.
    #[inline]
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_ref().map(|secret| secret.expose_secret())
    }

    /// Returns the storage backend.
    #[inline]
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }
}
