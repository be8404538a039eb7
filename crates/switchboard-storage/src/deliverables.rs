// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the deliverable store.
//!
//! Each conversation owns at most one deliverable; every completed build
//! appends a new version under it, so earlier build outputs stay
//! addressable.

use async_trait::async_trait;
use rusqlite::{OptionalExtension, params};

use switchboard_core::{
    ConversationId, DeliverableRef, DeliverableStore, DeliverableVersion, SwitchboardError,
};

use crate::database::{map_tr_err, now_iso};

/// Deliverable store backed by the `deliverables` and `deliverable_versions`
/// tables.
pub struct SqliteDeliverableStore {
    conn: tokio_rusqlite::Connection,
}

impl SqliteDeliverableStore {
    pub fn new(conn: tokio_rusqlite::Connection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl DeliverableStore for SqliteDeliverableStore {
    async fn create(
        &self,
        conversation_id: &ConversationId,
        content: &str,
    ) -> Result<DeliverableRef, SwitchboardError> {
        let conversation_id = conversation_id.as_str().to_string();
        let version_id = uuid::Uuid::new_v4().to_string();
        let now = now_iso();

        let insert_version_id = version_id.clone();
        let insert_content = content.to_string();
        let deliverable_id = self
            .conn
            .call(move |conn| {
                let existing: Option<String> = conn
                    .query_row(
                        "SELECT id FROM deliverables WHERE conversation_id = ?1",
                        params![conversation_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                let deliverable_id = match existing {
                    Some(id) => id,
                    None => {
                        let id = uuid::Uuid::new_v4().to_string();
                        conn.execute(
                            "INSERT INTO deliverables (id, conversation_id, created_at) \
                             VALUES (?1, ?2, ?3)",
                            params![id, conversation_id, now],
                        )?;
                        id
                    }
                };
                conn.execute(
                    "INSERT INTO deliverable_versions (id, deliverable_id, content, created_at) \
                     VALUES (?1, ?2, ?3, ?4)",
                    params![insert_version_id, deliverable_id, insert_content, now],
                )?;
                Ok(deliverable_id)
            })
            .await
            .map_err(map_tr_err)?;

        Ok(DeliverableRef {
            id: deliverable_id,
            version: DeliverableVersion {
                id: version_id,
                content: content.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversations::SqliteConversationStore;
    use crate::database::Database;
    use switchboard_core::ConversationStore;

    async fn test_stores() -> (SqliteConversationStore, SqliteDeliverableStore) {
        let db = Database::open_in_memory().await.unwrap();
        (
            SqliteConversationStore::new(db.connection().clone()),
            SqliteDeliverableStore::new(db.connection().clone()),
        )
    }

    #[tokio::test]
    async fn first_build_creates_deliverable_and_version() {
        let (conversations, deliverables) = test_stores().await;
        let id = ConversationId::new();
        conversations.create(&id, "user", "alice").await.unwrap();

        let reference = deliverables
            .create(&id, "fn main() {}")
            .await
            .unwrap();
        assert!(!reference.id.is_empty());
        assert!(!reference.version.id.is_empty());
        assert_eq!(reference.version.content, "fn main() {}");
    }

    #[tokio::test]
    async fn rebuild_appends_a_version_to_the_same_deliverable() {
        let (conversations, deliverables) = test_stores().await;
        let id = ConversationId::new();
        conversations.create(&id, "user", "alice").await.unwrap();

        let first = deliverables.create(&id, "draft one").await.unwrap();
        let second = deliverables.create(&id, "draft two").await.unwrap();

        assert_eq!(first.id, second.id, "deliverable id is stable");
        assert_ne!(first.version.id, second.version.id);
        assert_eq!(second.version.content, "draft two");
    }

    #[tokio::test]
    async fn deliverables_are_separate_per_conversation() {
        let (conversations, deliverables) = test_stores().await;
        let a = ConversationId::new();
        let b = ConversationId::new();
        conversations.create(&a, "user", "alice").await.unwrap();
        conversations.create(&b, "user", "bob").await.unwrap();

        let ref_a = deliverables.create(&a, "for alice").await.unwrap();
        let ref_b = deliverables.create(&b, "for bob").await.unwrap();
        assert_ne!(ref_a.id, ref_b.id);
    }

    #[tokio::test]
    async fn unknown_conversation_is_rejected_by_foreign_key() {
        let (_conversations, deliverables) = test_stores().await;
        let orphan = ConversationId::new();
        assert!(deliverables.create(&orphan, "no parent").await.is_err());
    }
}
