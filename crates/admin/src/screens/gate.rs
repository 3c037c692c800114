//! Route gating and auth-driven redirects.
//!
//! [`gate`] is a pure decision over one snapshot and never navigates.
//! Navigation caused by the session changing is done by
//! [`RedirectOnChange`], which watches the snapshot stream.

use std::sync::Arc;

use tokio::sync::watch;

use crate::models::SessionState;
use crate::services::{NavigateOptions, Navigator, Route};

/// What a screen should show for a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Bootstrap still running; show the loading screen.
    Loading,
    /// The route is not for this session; go elsewhere.
    Redirect(Route),
    /// Render the screen.
    Render,
}

/// Decide what `route` should show for `state`.
#[must_use]
pub fn gate(state: &SessionState, route: Route) -> GateDecision {
    if !state.is_initialized() {
        return GateDecision::Loading;
    }

    match (route.is_public(), state.is_authenticated()) {
        (true, true) => GateDecision::Redirect(Route::Admin),
        (false, false) => GateDecision::Redirect(Route::Login),
        _ => GateDecision::Render,
    }
}

/// Navigates when the authentication flag flips.
///
/// Sign-in lands on the dashboard and sign-out on the login screen, both
/// replacing the current history entry. Snapshots taken before the
/// bootstrap finished never trigger anything.
#[derive(Debug)]
pub struct RedirectOnChange {
    rx: watch::Receiver<Arc<SessionState>>,
    last_authenticated: Option<bool>,
}

impl RedirectOnChange {
    /// Watch the snapshots published to `rx`.
    #[must_use]
    pub const fn new(rx: watch::Receiver<Arc<SessionState>>) -> Self {
        Self {
            rx,
            last_authenticated: None,
        }
    }

    /// Record `state` and return where to go if the flag flipped since the
    /// previous observed snapshot.
    pub fn observe(&mut self, state: &SessionState) -> Option<Route> {
        if !state.is_initialized() {
            return None;
        }

        let authenticated = state.is_authenticated();
        let previous = self.last_authenticated.replace(authenticated);
        match previous {
            Some(was) if was != authenticated => Some(if authenticated {
                Route::Admin
            } else {
                Route::Login
            }),
            _ => None,
        }
    }

    /// Follow the snapshot stream until the context is dropped.
    pub async fn run(mut self, navigator: Arc<dyn Navigator>) {
        loop {
            let state = self.rx.borrow_and_update().clone();
            if let Some(route) = self.observe(&state) {
                tracing::debug!(path = route.path(), "Auth state changed, redirecting");
                navigator.navigate(route.path(), NavigateOptions::replace());
            }

            if self.rx.changed().await.is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use crate::models::AuthStatus;
    use crate::models::session::fixtures::user;
    use crate::services::MemoryNavigator;
    use crate::state::StoreContext;
    use tutaviendo_core::{Email, Password};

    #[test]
    fn test_uninitialized_always_loads() {
        let states = [
            SessionState::default(),
            SessionState::default().with_loading(true),
            SessionState::default().with_status(AuthStatus::Initializing),
        ];
        for state in &states {
            for route in [Route::Login, Route::Admin, Route::PaymentsShipping] {
                assert_eq!(gate(state, route), GateDecision::Loading);
            }
        }
    }

    #[test]
    fn test_login_route_redirects_signed_in_user() {
        let state = SessionState::signed_in(user("Ana"), Vec::new());
        assert_eq!(
            gate(&state, Route::Login),
            GateDecision::Redirect(Route::Admin)
        );
        assert_eq!(gate(&state, Route::Admin), GateDecision::Render);
    }

    #[test]
    fn test_protected_route_redirects_anonymous_user() {
        let state = SessionState::signed_out();
        assert_eq!(
            gate(&state, Route::PaymentsShipping),
            GateDecision::Redirect(Route::Login)
        );
        assert_eq!(gate(&state, Route::Login), GateDecision::Render);
    }

    #[test]
    fn test_observe_only_fires_on_flips() {
        let (_tx, rx) = watch::channel(Arc::new(SessionState::default()));
        let mut redirect = RedirectOnChange::new(rx);

        assert_eq!(redirect.observe(&SessionState::default()), None);
        assert_eq!(redirect.observe(&SessionState::signed_out()), None);
        assert_eq!(redirect.observe(&SessionState::signed_out()), None);

        let signed_in = SessionState::signed_in(user("Ana"), Vec::new());
        assert_eq!(redirect.observe(&signed_in), Some(Route::Admin));
        assert_eq!(redirect.observe(&signed_in.with_loading(true)), None);
        assert_eq!(redirect.observe(&SessionState::signed_out()), Some(Route::Login));
    }

    #[test]
    fn test_restored_session_does_not_redirect() {
        let (_tx, rx) = watch::channel(Arc::new(SessionState::default()));
        let mut redirect = RedirectOnChange::new(rx);

        let restored = SessionState::signed_in(user("Ana"), Vec::new());
        assert_eq!(redirect.observe(&restored), None);
    }

    #[tokio::test]
    async fn test_run_follows_context() {
        let backend = Arc::new(MemoryBackend::new());
        let email = Email::parse("ana@tienda.com").unwrap();
        backend.add_account(&email, "secreto1", "Ana");
        let context = StoreContext::with_backend(backend);
        let navigator = Arc::new(MemoryNavigator::new("/login"));

        context.initialize().await;
        let task = tokio::spawn(RedirectOnChange::new(context.subscribe()).run(navigator.clone()));
        tokio::task::yield_now().await;

        context
            .login(&email, &Password::parse("secreto1").unwrap())
            .await
            .unwrap();
        for _ in 0..10 {
            if navigator.current().path == "/admin" {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert_eq!(navigator.current().path, "/admin");
        assert_eq!(navigator.depth(), 1);
        task.abort();
    }
}
