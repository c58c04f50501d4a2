//! Navigation targets and the access rules guarding them.

use core::fmt;

use crate::cart::CartStore;
use crate::clock::Clock;
use crate::session::SessionStore;
use crate::storage::KeyValueStorage;

/// A screen of the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// `/`, forwards to the product list.
    Home,
    /// `/products`.
    Products,
    /// `/login`.
    Login,
    /// `/register`.
    Register,
    /// `/dashboard`.
    Dashboard,
    /// `/merchant-dashboard`.
    MerchantDashboard,
    /// `/checkout`.
    Checkout,
}

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone.
    Open,
    /// Only visitors who are not signed in.
    PublicOnly,
    /// Any signed-in user.
    Protected,
    /// Signed-in merchants.
    MerchantOnly,
}

/// Outcome of guarding a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Render the requested route.
    Allow,
    /// Navigate elsewhere instead.
    Redirect(Route),
}

impl Route {
    /// Every route, in navigation-bar order.
    pub const ALL: [Self; 7] = [
        Self::Home,
        Self::Products,
        Self::Login,
        Self::Register,
        Self::Dashboard,
        Self::MerchantDashboard,
        Self::Checkout,
    ];

    /// Returns the URL path.
    #[inline]
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Products => "/products",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Dashboard => "/dashboard",
            Self::MerchantDashboard => "/merchant-dashboard",
            Self::Checkout => "/checkout",
        }
    }

    /// Looks a route up by path. A trailing slash is ignored.
    #[inline]
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = match path.strip_suffix('/') {
            Some("") | None => path,
            Some(rest) => rest,
        };
        Self::ALL.into_iter().find(|route| route.path() == trimmed)
    }

    /// Returns who may open this route.
    #[inline]
    #[must_use]
    pub const fn access(self) -> Access {
        match self {
            Self::Home | Self::Products => Access::Open,
            Self::Login | Self::Register => Access::PublicOnly,
            Self::Dashboard | Self::Checkout => Access::Protected,
            Self::MerchantDashboard => Access::MerchantOnly,
        }
    }
}

impl fmt::Display for Route {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Decides whether the session may open `route`.
#[inline]
#[must_use]
pub fn guard<S: KeyValueStorage, C: Clock>(
    route: Route,
    session: &SessionStore<S, C>,
) -> RouteDecision {
    if route == Route::Home {
        return RouteDecision::Redirect(Route::Products);
    }
    let signed_in = session.is_authenticated();
    match route.access() {
        Access::Open => RouteDecision::Allow,
        Access::PublicOnly if signed_in => RouteDecision::Redirect(Route::Dashboard),
        Access::Protected | Access::MerchantOnly if !signed_in => {
            RouteDecision::Redirect(Route::Login)
        }
        Access::MerchantOnly if !session.is_merchant() => {
            RouteDecision::Redirect(Route::Dashboard)
        }
        Access::PublicOnly | Access::Protected | Access::MerchantOnly => RouteDecision::Allow,
    }
}

/// Follows redirects from `route` to the screen that is finally shown.
#[inline]
#[must_use]
pub fn resolve<S: KeyValueStorage, C: Clock>(route: Route, session: &SessionStore<S, C>) -> Route {
    let mut current = route;
    for _ in 0..Route::ALL.len() {
        match guard(current, session) {
            RouteDecision::Allow => return current,
            RouteDecision::Redirect(next) => current = next,
        }
    }
    tracing::warn!(%route, "redirect loop while resolving route");
    current
}

/// Where to go after a successful login: straight to checkout when the
/// cart has something in it.
#[inline]
#[must_use]
pub fn post_login_destination<S: KeyValueStorage>(cart: &CartStore<S>) -> Route {
    if cart.is_empty() {
        Route::Dashboard
    } else {
        Route::Checkout
    }
}
