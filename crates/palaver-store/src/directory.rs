//! The flat contact directory at the `users` node.

use serde_json::{json, Value};
use tracing::info;

use palaver_shared::constants::USERS_NODE;
use palaver_shared::UserKey;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{DirectoryEntry, UserRecord};

impl Database {
    /// Store a new account: the user's own node plus a `{name, email}`
    /// entry in the shared directory (created if absent).
    ///
    /// No existence check is performed here: registering the same user
    /// twice appends a second directory entry. Callers are expected to
    /// check [`user_exists`](Database::user_exists) first.
    pub async fn register_user(&self, user: &UserRecord) -> Result<()> {
        let key = user.user_key();
        self.documents()
            .write_full(
                &key.node_path(),
                json!({
                    "first_name": user.first_name,
                    "last_name": user.last_name,
                }),
            )
            .await?;

        let entry = json!({
            "name": user.full_name(),
            "email": key.as_str(),
        });
        let directory = match self.documents().read_once(USERS_NODE).await {
            Ok(Value::Array(mut entries)) => {
                entries.push(entry);
                Value::Array(entries)
            }
            // Absent or unusable: start a fresh single-entry directory.
            Ok(_) | Err(StoreError::NotFound(_)) => json!([entry]),
            Err(error) => return Err(error),
        };
        self.documents().write_full(USERS_NODE, directory).await?;

        info!(user = %key, "registered user");
        Ok(())
    }

    /// Whether an account exists for `email`.
    pub async fn user_exists(&self, email: &str) -> Result<bool> {
        let key = UserKey::from_email(email);
        match self.documents().read_once(&key.node_path()).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// All directory entries. Fails with [`StoreError::FetchFailed`] when
    /// the node is absent or not a list; entries that do not decode are
    /// dropped.
    pub async fn list_users(&self) -> Result<Vec<DirectoryEntry>> {
        let value = self
            .documents()
            .read_once(USERS_NODE)
            .await
            .map_err(|_| StoreError::FetchFailed)?;
        let entries = value.as_array().ok_or(StoreError::FetchFailed)?;

        Ok(entries
            .iter()
            .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
            .collect())
    }

    /// Directory entries whose name starts with `term`
    /// (case-insensitive), excluding the signed-in user.
    pub async fn search_users(&self, term: &str) -> Result<Vec<DirectoryEntry>> {
        let self_key = self.current_identity().map(|identity| identity.user_key());
        let needle = term.to_lowercase();

        Ok(self
            .list_users()
            .await?
            .into_iter()
            .filter(|entry| {
                if self_key
                    .as_ref()
                    .is_some_and(|key| entry.email == key.as_str())
                {
                    return false;
                }
                entry.name.to_lowercase().starts_with(&needle)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use palaver_shared::{Identity, StaticAuthProvider};

    use crate::document::DocumentStore;
    use crate::memory::MemoryDocumentStore;

    fn database(identity: Option<Identity>) -> (Database, Arc<MemoryDocumentStore>) {
        let documents = Arc::new(MemoryDocumentStore::new());
        let auth = match identity {
            Some(identity) => StaticAuthProvider::signed_in(identity),
            None => StaticAuthProvider::signed_out(),
        };
        (
            Database::new(documents.clone(), Arc::new(auth)),
            documents,
        )
    }

    #[tokio::test]
    async fn register_then_exists_and_list() {
        let (db, _documents) = database(None);
        let alice = UserRecord::new("Alice", "Anders", "a@x.com");

        assert!(!db.user_exists("a@x.com").await.unwrap());
        db.register_user(&alice).await.unwrap();
        assert!(db.user_exists("a@x.com").await.unwrap());

        let users = db.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Alice Anders");
        assert_eq!(users[0].email, "a_x_com");
    }

    #[tokio::test]
    async fn registering_twice_appends_a_duplicate() {
        // Known gap: register performs no existence check.
        let (db, _documents) = database(None);
        let alice = UserRecord::new("Alice", "Anders", "a@x.com");

        db.register_user(&alice).await.unwrap();
        db.register_user(&alice).await.unwrap();

        let users = db.list_users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0], users[1]);
    }

    #[tokio::test]
    async fn list_fails_when_directory_absent() {
        let (db, _documents) = database(None);
        assert!(matches!(
            db.list_users().await,
            Err(StoreError::FetchFailed)
        ));
    }

    #[tokio::test]
    async fn list_fails_when_directory_malformed() {
        let (db, documents) = database(None);
        documents
            .write_full(USERS_NODE, json!("not-a-list"))
            .await
            .unwrap();
        assert!(matches!(
            db.list_users().await,
            Err(StoreError::FetchFailed)
        ));
    }

    #[tokio::test]
    async fn register_propagates_write_failure() {
        let (db, documents) = database(None);
        documents.fail_next_write_to("a_x_com");

        let result = db
            .register_user(&UserRecord::new("Alice", "Anders", "a@x.com"))
            .await;
        assert!(matches!(result, Err(StoreError::WriteFailed { .. })));
    }

    #[tokio::test]
    async fn search_matches_prefix_and_excludes_self() {
        let (db, _documents) = database(Some(Identity::new("a@x.com", "Alice Anders")));

        db.register_user(&UserRecord::new("Alice", "Anders", "a@x.com"))
            .await
            .unwrap();
        db.register_user(&UserRecord::new("Alina", "Berg", "al@x.com"))
            .await
            .unwrap();
        db.register_user(&UserRecord::new("Bob", "Breve", "b@x.com"))
            .await
            .unwrap();

        let hits = db.search_users("ali").await.unwrap();
        // Alice matches the prefix but is the signed-in user.
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Alina Berg");

        assert!(db.search_users("zzz").await.unwrap().is_empty());
    }
}
