use serde::{Deserialize, Serialize};

use crate::types::UserKey;

/// The signed-in user as reported by the authentication backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    /// Raw email address the account was registered with.
    pub email: String,
    /// Human-readable display name shown to counterparts.
    pub display_name: String,
}

impl Identity {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: display_name.into(),
        }
    }

    /// Storage key of this identity.
    pub fn user_key(&self) -> UserKey {
        UserKey::from_email(&self.email)
    }
}

/// Source of the current signed-in identity.
///
/// The store never signs users in or out itself; it only asks who the
/// caller currently is. `None` means nobody is signed in.
pub trait AuthProvider: Send + Sync {
    fn current_identity(&self) -> Option<Identity>;
}

/// An [`AuthProvider`] holding a settable identity.
///
/// Embedders that manage sign-in elsewhere hand the store one of these
/// and update it on auth-state changes; tests use it to act as either
/// participant.
#[derive(Debug, Default)]
pub struct StaticAuthProvider {
    identity: std::sync::Mutex<Option<Identity>>,
}

impl StaticAuthProvider {
    /// Provider with nobody signed in.
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Provider with a fixed signed-in identity.
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity: std::sync::Mutex::new(Some(identity)),
        }
    }

    /// Replace the current identity (`None` signs out).
    pub fn set(&self, identity: Option<Identity>) {
        *self.identity.lock().unwrap_or_else(|e| e.into_inner()) = identity;
    }
}

impl AuthProvider for StaticAuthProvider {
    fn current_identity(&self) -> Option<Identity> {
        self.identity
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
