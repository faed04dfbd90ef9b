//! Role-based navigation: which menu to show and where to send the user.
//!
//! The `RouteGuard` follows a `SessionProvider` through a watch channel and
//! renders nothing until the provider has finished restoring, so a stored
//! admin session never briefly shows the user menu (or vice versa).

use serde::Serialize;
use tokio::sync::watch;

use crate::auth::{AuthState, Role, SessionProvider};

/// Where signed-out visitors and just-logged-out users are sent
pub const LOGIN_PATH: &str = "/login";

const ADMIN_ROOT: &str = "/admin";
const DASHBOARD_ROOT: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NavItem {
    pub name: &'static str,
    pub href: &'static str,
}

const ADMIN_MENU: &[NavItem] = &[
    NavItem { name: "Chatbot", href: "/admin/chat" },
    NavItem { name: "Ingest Files", href: "/admin/ingest" },
    NavItem { name: "User Accounts", href: "/admin/users" },
    NavItem { name: "Settings", href: "/admin/settings" },
];

const USER_MENU: &[NavItem] = &[
    NavItem { name: "Chatbot", href: "/dashboard/chat" },
    NavItem { name: "Categories", href: "/dashboard/categories" },
    NavItem { name: "Settings", href: "/dashboard/settings" },
];

impl Role {
    pub fn menu(&self) -> &'static [NavItem] {
        match self {
            Role::Admin => ADMIN_MENU,
            Role::StandardUser => USER_MENU,
        }
    }

    /// Default page after sign-in, also the target of the logo link
    pub fn landing_path(&self) -> &'static str {
        match self {
            Role::Admin => ADMIN_ROOT,
            Role::StandardUser => DASHBOARD_ROOT,
        }
    }
}

/// True if `current` is `href` or somewhere beneath it.
pub fn is_active_path(current: &str, href: &str) -> bool {
    current == href
        || current
            .strip_prefix(href)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavView {
    /// Session not yet restored: show neither menu, redirect nowhere
    Pending,
    Anonymous {
        redirect: &'static str,
    },
    Authenticated {
        role: Role,
        menu: &'static [NavItem],
        landing: &'static str,
        display_label: String,
    },
}

impl NavView {
    pub fn from_state(state: &AuthState) -> Self {
        if state.initializing {
            return NavView::Pending;
        }
        match &state.session {
            None => NavView::Anonymous {
                redirect: LOGIN_PATH,
            },
            Some(session) => NavView::Authenticated {
                role: session.role,
                menu: session.role.menu(),
                landing: session.role.landing_path(),
                display_label: session.display_label().to_string(),
            },
        }
    }

    pub fn menu(&self) -> &'static [NavItem] {
        match self {
            NavView::Authenticated { menu, .. } => menu,
            _ => &[],
        }
    }
}

/// Outcome of asking whether the current session may open a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Redirect(&'static str),
    /// Still restoring; ask again once the guard reports a change
    Pending,
}

/// Follows a provider and maps its state to menus and redirects.
pub struct RouteGuard {
    rx: watch::Receiver<AuthState>,
}

impl RouteGuard {
    pub fn new(provider: &SessionProvider) -> Self {
        Self {
            rx: provider.subscribe(),
        }
    }

    pub fn view(&self) -> NavView {
        NavView::from_state(&self.rx.borrow())
    }

    /// Wait for the provider's next state change and return the new view.
    /// Returns `None` once every provider handle has been dropped.
    pub async fn changed(&mut self) -> Option<NavView> {
        self.rx.changed().await.ok()?;
        Some(NavView::from_state(&self.rx.borrow_and_update()))
    }

    /// Where to go right after a successful login or registration.
    pub fn post_auth_redirect(&self) -> Option<&'static str> {
        match self.view() {
            NavView::Authenticated { landing, .. } => Some(landing),
            _ => None,
        }
    }

    pub fn authorize(&self, path: &str) -> Access {
        let protected_role = if is_active_path(path, ADMIN_ROOT) {
            Some(Role::Admin)
        } else if is_active_path(path, DASHBOARD_ROOT) {
            Some(Role::StandardUser)
        } else {
            None
        };

        match (self.view(), protected_role) {
            (NavView::Pending, _) => Access::Pending,
            (_, None) => Access::Allowed,
            (NavView::Anonymous { redirect }, Some(_)) => Access::Redirect(redirect),
            (NavView::Authenticated { role, landing, .. }, Some(required)) => {
                if role == required {
                    Access::Allowed
                } else {
                    Access::Redirect(landing)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{DemoAuthenticator, MemoryCredentialStore};
    use std::sync::Arc;

    fn provider() -> SessionProvider {
        SessionProvider::new(
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(DemoAuthenticator::new()),
        )
    }

    #[test]
    fn test_menus_are_disjoint() {
        for admin in Role::Admin.menu() {
            assert!(Role::StandardUser.menu().iter().all(|u| u.href != admin.href));
        }
        assert_eq!(Role::Admin.menu().len(), 4);
        assert_eq!(Role::StandardUser.menu().len(), 3);
        assert!(Role::Admin.menu().iter().all(|i| i.href.starts_with("/admin/")));
        assert!(Role::StandardUser
            .menu()
            .iter()
            .all(|i| i.href.starts_with("/dashboard/")));
    }

    #[test]
    fn test_landing_paths() {
        assert_eq!(Role::Admin.landing_path(), "/admin");
        assert_eq!(Role::StandardUser.landing_path(), "/dashboard");
    }

    #[test]
    fn test_is_active_path() {
        assert!(is_active_path("/admin/chat", "/admin/chat"));
        assert!(is_active_path("/admin/chat/42", "/admin/chat"));
        assert!(!is_active_path("/admin/chatter", "/admin/chat"));
        assert!(!is_active_path("/admin", "/admin/chat"));
    }

    #[tokio::test]
    async fn test_pending_until_restored() {
        let provider = provider();
        let guard = RouteGuard::new(&provider);
        assert_eq!(guard.view(), NavView::Pending);
        assert!(guard.view().menu().is_empty());
        assert_eq!(guard.post_auth_redirect(), None);
        assert_eq!(guard.authorize("/admin/chat"), Access::Pending);
        assert_eq!(guard.authorize("/login"), Access::Pending);

        provider.restore().await;
        assert_eq!(guard.view(), NavView::Anonymous { redirect: LOGIN_PATH });
        assert_eq!(guard.authorize("/dashboard"), Access::Redirect(LOGIN_PATH));
        assert_eq!(guard.authorize("/login"), Access::Allowed);
    }

    #[tokio::test]
    async fn test_menu_follows_role() {
        let provider = provider();
        let mut guard = RouteGuard::new(&provider);
        provider.restore().await;
        guard.changed().await.unwrap();

        provider.login("admin@example.com", "x").await.unwrap();
        let view = guard.changed().await.unwrap();
        assert_eq!(view.menu(), Role::Admin.menu());
        assert_eq!(guard.post_auth_redirect(), Some("/admin"));
        assert_eq!(guard.authorize("/admin/users"), Access::Allowed);
        assert_eq!(guard.authorize("/dashboard/chat"), Access::Redirect("/admin"));

        provider.login("sarah@example.com", "x").await.unwrap();
        match guard.changed().await.unwrap() {
            NavView::Authenticated {
                role,
                landing,
                display_label,
                ..
            } => {
                assert_eq!(role, Role::StandardUser);
                assert_eq!(landing, "/dashboard");
                assert_eq!(display_label, "sarah");
            }
            other => panic!("unexpected view {:?}", other),
        }
        assert_eq!(guard.authorize("/admin"), Access::Redirect("/dashboard"));

        provider.logout().await.unwrap();
        assert_eq!(
            guard.changed().await.unwrap(),
            NavView::Anonymous { redirect: LOGIN_PATH }
        );
    }

    #[tokio::test]
    async fn test_changed_ends_when_provider_dropped() {
        let provider = provider();
        let mut guard = RouteGuard::new(&provider);
        drop(provider);
        assert_eq!(guard.changed().await, None);
    }
}
