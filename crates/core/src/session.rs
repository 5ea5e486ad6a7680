//! Logged-in user store.
//!
//! The user record is whatever the last successful API response returned:
//! login and registration responses, then periodic re-fetches of the
//! canonical client record merged on top. There is no validation, expiry or
//! token refresh.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::events::{Listeners, Subscription};
use crate::storage::{self, KeyValueStore, keys};
use crate::types::{ClientId, Email};

/// Opaque user record.
///
/// Typed accessors cover the fields the storefront reads; everything else is
/// kept verbatim so it survives a round trip through storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserSession(Map<String, Value>);

impl UserSession {
    /// Wrap a JSON object.
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build from any JSON value; non-objects yield `None`.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// Raw field access.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// The underlying JSON object.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Client id (`id`, `_id` or `clienteId`), as string or number.
    #[must_use]
    pub fn id(&self) -> Option<ClientId> {
        ["id", "_id", "clienteId"]
            .iter()
            .find_map(|key| match self.0.get(*key)? {
                Value::String(s) if !s.is_empty() => Some(ClientId::new(s.as_str())),
                Value::Number(n) => Some(ClientId::new(n.to_string())),
                _ => None,
            })
    }

    /// Email, if present and well-formed.
    #[must_use]
    pub fn email(&self) -> Option<Email> {
        self.0
            .get("email")
            .and_then(Value::as_str)
            .and_then(|s| Email::parse(s).ok())
    }

    /// Display name (`name` or `nome`).
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        ["name", "nome"]
            .iter()
            .find_map(|key| self.0.get(*key)?.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Whether the record grants back-office access
    /// (`isAdmin: true` or `role`/`tipo` of `admin`).
    #[must_use]
    pub fn is_admin(&self) -> bool {
        if self.0.get("isAdmin").and_then(Value::as_bool) == Some(true) {
            return true;
        }
        ["role", "tipo"].iter().any(|key| {
            self.0
                .get(*key)
                .and_then(Value::as_str)
                .is_some_and(|role| role.eq_ignore_ascii_case("admin"))
        })
    }

    /// Key used to tag per-user checkout data: the id, else the email.
    #[must_use]
    pub fn owner_tag(&self) -> Option<String> {
        self.id()
            .map(ClientId::into_inner)
            .or_else(|| self.email().map(Email::into_inner))
    }

    /// Shallow-merge `patch` on top of this record.
    pub fn merge(&mut self, patch: Self) {
        for (key, value) in patch.0 {
            self.0.insert(key, value);
        }
    }
}

/// User change notification.
#[derive(Debug, Clone, PartialEq)]
pub enum UserUpdate {
    LoggedIn(UserSession),
    Updated(UserSession),
    LoggedOut,
    /// Application-defined broadcast with no write.
    Custom(Value),
}

/// The logged-in user store.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    listeners: Listeners<UserUpdate>,
}

impl SessionStore {
    /// Create a session store over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            listeners: Listeners::new(),
        }
    }

    /// Register a change listener.
    #[must_use = "dropping the subscription unsubscribes the listener immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&UserUpdate) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// The stored user, or `None` if absent or corrupt.
    #[must_use]
    pub fn get_user(&self) -> Option<UserSession> {
        storage::read_json::<Value>(&*self.storage, keys::USER).and_then(UserSession::from_value)
    }

    /// Overwrite the stored user.
    pub fn set_user(&self, user: &UserSession) {
        storage::write_json(&*self.storage, keys::USER, user);
        self.broadcast_user_update(UserUpdate::LoggedIn(user.clone()));
    }

    /// Merge a fresh server record into the stored user and return the result.
    ///
    /// With no stored user the patch becomes the user.
    pub fn merge_user(&self, patch: UserSession) -> UserSession {
        let mut user = self.get_user().unwrap_or_default();
        user.merge(patch);
        storage::write_json(&*self.storage, keys::USER, &user);
        self.broadcast_user_update(UserUpdate::Updated(user.clone()));
        user
    }

    /// Forget the stored user.
    pub fn clear_user(&self) {
        storage::remove_key(&*self.storage, keys::USER);
        self.broadcast_user_update(UserUpdate::LoggedOut);
    }

    /// Notify listeners without writing.
    pub fn broadcast_user_update(&self, detail: UserUpdate) {
        self.listeners.emit(&detail);
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::storage::MemoryStorage;

    fn user(value: Value) -> UserSession {
        UserSession::from_value(value).unwrap()
    }

    #[test]
    fn test_set_get_clear() {
        let sessions = SessionStore::new(Arc::new(MemoryStorage::new()));
        assert!(sessions.get_user().is_none());

        sessions.set_user(&user(json!({"id": 7, "email": "Ana@Example.com", "nome": "Ana"})));
        let stored = sessions.get_user().unwrap();
        assert_eq!(stored.id(), Some(ClientId::new("7")));
        assert_eq!(stored.email().unwrap().as_str(), "ana@example.com");
        assert_eq!(stored.name(), Some("Ana"));

        sessions.clear_user();
        assert!(sessions.get_user().is_none());
    }

    #[test]
    fn test_merge_keeps_unrelated_fields() {
        let sessions = SessionStore::new(Arc::new(MemoryStorage::new()));
        sessions.set_user(&user(json!({"id": "c1", "token": "t", "nome": "Ana"})));

        let merged = sessions.merge_user(user(json!({"nome": "Ana Paula", "telefone": "11999"})));
        assert_eq!(merged.get("token"), Some(&json!("t")));
        assert_eq!(merged.name(), Some("Ana Paula"));
        assert_eq!(sessions.get_user().unwrap(), merged);
    }

    #[test]
    fn test_corrupt_user_reads_none() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::USER, "[1,2,3]").unwrap();
        assert!(SessionStore::new(storage.clone()).get_user().is_none());

        storage.set(keys::USER, "nope").unwrap();
        assert!(SessionStore::new(storage).get_user().is_none());
    }

    #[test]
    fn test_listeners_see_lifecycle() {
        let sessions = SessionStore::new(Arc::new(MemoryStorage::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _sub = {
            let seen = Arc::clone(&seen);
            sessions.subscribe(move |update| {
                let tag = match update {
                    UserUpdate::LoggedIn(_) => "in",
                    UserUpdate::Updated(_) => "updated",
                    UserUpdate::LoggedOut => "out",
                    UserUpdate::Custom(_) => "custom",
                };
                seen.lock().unwrap().push(tag);
            })
        };

        sessions.set_user(&user(json!({"id": 1})));
        sessions.merge_user(user(json!({"nome": "x"})));
        sessions.broadcast_user_update(UserUpdate::Custom(json!({"source": "checkout"})));
        sessions.clear_user();

        assert_eq!(*seen.lock().unwrap(), vec!["in", "updated", "custom", "out"]);
    }

    #[test]
    fn test_is_admin_and_owner_tag() {
        assert!(user(json!({"isAdmin": true})).is_admin());
        assert!(user(json!({"role": "ADMIN"})).is_admin());
        assert!(!user(json!({"tipo": "cliente"})).is_admin());

        assert_eq!(user(json!({"_id": "abc"})).owner_tag().as_deref(), Some("abc"));
        assert_eq!(
            user(json!({"email": "a@b.c"})).owner_tag().as_deref(),
            Some("a@b.c")
        );
        assert_eq!(user(json!({})).owner_tag(), None);
    }
}
