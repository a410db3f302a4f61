//! Session-related types.
//!
//! Everything the browser would otherwise keep in local storage (wishlist,
//! saved articles, theme, the welcome popup flag) lives in the server session
//! alongside the signed-in user.

use serde::{Deserialize, Serialize};

use apothecary_core::{ProductId, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the signed-in user.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Identity provider subject id.
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    /// Admin flag at sign-in; `/admin` re-checks the profile on every request.
    #[serde(default)]
    pub is_admin: bool,
    /// Provider access token, used for sign-out.
    pub access_token: String,
}

impl std::fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("is_admin", &self.is_admin)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Session keys.
pub mod keys {
    /// Current signed-in user.
    pub const CURRENT_USER: &str = "current_user";
    /// Wishlisted product ids.
    pub const WISHLIST: &str = "wishlist";
    /// Saved article slugs.
    pub const SAVED_ARTICLES: &str = "saved_articles";
    /// Set once the welcome popup was dismissed.
    pub const WELCOME_SEEN: &str = "welcome_seen";
    /// Colour theme preference.
    pub const THEME: &str = "theme";
    /// Pending flash messages.
    pub const TOASTS: &str = "toasts";
    /// PKCE code verifier for an in-flight OAuth sign-in.
    pub const OAUTH_VERIFIER: &str = "oauth_verifier";
    /// CSRF state for an in-flight OAuth sign-in.
    pub const OAUTH_STATE: &str = "oauth_state";
}

/// Most entries a wishlist or saved-articles list keeps.
pub const MAX_SAVED_ENTRIES: usize = 100;

/// Insertion-ordered set capped at [`MAX_SAVED_ENTRIES`]; the oldest entry is
/// dropped when a new one would overflow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentSet<T>(Vec<T>);

impl<T> Default for RecentSet<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T: PartialEq + Clone> RecentSet<T> {
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.0.contains(item)
    }

    /// Add `item` if absent. Returns `true` when it was inserted.
    pub fn add(&mut self, item: T) -> bool {
        if self.contains(&item) {
            return false;
        }
        if self.0.len() >= MAX_SAVED_ENTRIES {
            let overflow = self.0.len() + 1 - MAX_SAVED_ENTRIES;
            self.0.drain(..overflow);
        }
        self.0.push(item);
        true
    }

    /// Remove `item`. Returns `true` when it was present.
    pub fn remove(&mut self, item: &T) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| existing != item);
        self.0.len() != before
    }

    /// Add if absent, remove if present. Returns whether `item` is now in the set.
    pub fn toggle(&mut self, item: T) -> bool {
        if self.remove(&item) {
            false
        } else {
            self.add(item)
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in the order they were added.
    #[must_use]
    pub fn oldest_first(&self) -> &[T] {
        &self.0
    }

    /// Entries, most recent first.
    #[must_use]
    pub fn newest_first(&self) -> Vec<T> {
        self.0.iter().rev().cloned().collect()
    }
}

/// Wishlisted products.
pub type Wishlist = RecentSet<ProductId>;

/// Saved article slugs.
pub type SavedArticles = RecentSet<String>;

/// Flash message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl ToastKind {
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "toast toast--success",
            Self::Error => "toast toast--error",
            Self::Info => "toast toast--info",
        }
    }
}

/// A flash message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Info,
            message: message.into(),
        }
    }
}
