//! Client-side routing contract.
//!
//! Navigation carries no state beyond the path and its query string.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

/// Admin panel routes the session logic navigates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Sign-in / registration screen.
    Login,
    /// Admin dashboard.
    Admin,
    /// Payments and shipping settings.
    PaymentsShipping,
    /// Profile editor.
    Profile,
    /// Subscription management.
    Subscription,
}

impl Route {
    /// URL path for this route.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Admin => "/admin",
            Self::PaymentsShipping => "/admin/payments",
            Self::Profile => "/profile",
            Self::Subscription => "/subscription",
        }
    }

    /// Route for a URL path, ignoring any query string.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split_once('?').map_or(path, |(path, _)| path);
        match path.trim_end_matches('/') {
            "/login" => Some(Self::Login),
            "/admin" => Some(Self::Admin),
            "/admin/payments" => Some(Self::PaymentsShipping),
            "/profile" => Some(Self::Profile),
            "/subscription" => Some(Self::Subscription),
            _ => None,
        }
    }

    /// Whether the route is reachable without a signed-in user.
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Login)
    }
}

/// Options for [`Navigator::navigate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing a new one.
    pub replace: bool,
}

impl NavigateOptions {
    /// Options replacing the current history entry.
    #[must_use]
    pub const fn replace() -> Self {
        Self { replace: true }
    }
}

/// Imperative router.
pub trait Navigator: Send + Sync {
    /// Go to `path`.
    fn navigate(&self, path: &str, options: NavigateOptions);

    /// Set (or remove, for `None`) one query parameter of the current
    /// location without navigating away or reloading.
    fn replace_query(&self, key: &str, value: Option<&str>);
}

/// A path plus its decoded query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// URL path, always starting with `/`.
    pub path: String,
    /// Decoded query parameters.
    pub query: BTreeMap<String, String>,
}

impl Location {
    /// Parse `/path?key=value&...`.
    #[must_use]
    pub fn parse(target: &str) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let query = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Self { path, query }
    }

    /// Value of a query parameter.
    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// The route this location points at.
    #[must_use]
    pub fn route(&self) -> Option<Route> {
        Route::from_path(&self.path)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.query.iter())
                .finish();
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// In-process navigator with a history stack.
///
/// Backs the CLI and tests. `navigations()` counts full navigations only;
/// query replacements update the current entry in place.
#[derive(Debug)]
pub struct MemoryNavigator {
    inner: Mutex<MemoryHistory>,
}

#[derive(Debug)]
struct MemoryHistory {
    entries: Vec<Location>,
    navigations: usize,
}

impl MemoryNavigator {
    /// Start at `initial` (e.g. `/login?register=true`).
    #[must_use]
    pub fn new(initial: &str) -> Self {
        Self {
            inner: Mutex::new(MemoryHistory {
                entries: vec![Location::parse(initial)],
                navigations: 0,
            }),
        }
    }

    /// The current location.
    #[must_use]
    pub fn current(&self) -> Location {
        self.with_history(|history| history.entries.last().cloned().unwrap_or_default())
    }

    /// Number of history entries.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.with_history(|history| history.entries.len())
    }

    /// Number of `navigate` calls so far.
    #[must_use]
    pub fn navigations(&self) -> usize {
        self.with_history(|history| history.navigations)
    }

    fn with_history<T>(&self, f: impl FnOnce(&mut MemoryHistory) -> T) -> T {
        // A poisoned lock only means another thread panicked mid-update of a
        // plain Vec; the data is still usable.
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new(Route::Login.path())
    }
}

impl Navigator for MemoryNavigator {
    fn navigate(&self, path: &str, options: NavigateOptions) {
        tracing::debug!(path, replace = options.replace, "navigate");
        let location = Location::parse(path);
        self.with_history(|history| {
            history.navigations += 1;
            if options.replace
                && let Some(last) = history.entries.last_mut()
            {
                *last = location;
            } else {
                history.entries.push(location);
            }
        });
    }

    fn replace_query(&self, key: &str, value: Option<&str>) {
        self.with_history(|history| {
            if let Some(last) = history.entries.last_mut() {
                match value {
                    Some(value) => {
                        last.query.insert(key.to_string(), value.to_string());
                    }
                    None => {
                        last.query.remove(key);
                    }
                }
            }
        });
    }
}
