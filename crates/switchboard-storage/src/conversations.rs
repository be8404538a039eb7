// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the conversation store.

use std::str::FromStr;

use async_trait::async_trait;
use rusqlite::{OptionalExtension, params};

use switchboard_core::{
    ConversationId, ConversationRecord, ConversationState, ConversationStore, Mode,
    SwitchboardError, Turn, TurnRole,
};

use crate::database::{map_tr_err, now_iso};

/// Conversation store backed by the `conversations` and `turns` tables.
pub struct SqliteConversationStore {
    conn: tokio_rusqlite::Connection,
}

impl SqliteConversationStore {
    pub fn new(conn: tokio_rusqlite::Connection) -> Self {
        Self { conn }
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConversationRecord> {
    let state_raw: String = row.get(3)?;
    let state = ConversationState::from_str(&state_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let mode_raw: Option<String> = row.get(4)?;
    let last_mode = match mode_raw {
        Some(raw) => Some(Mode::from_str(&raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };
    Ok(ConversationRecord {
        id: ConversationId(row.get(0)?),
        caller_type: row.get(1)?,
        caller_id: row.get(2)?,
        state,
        last_mode,
        pending_context: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn create(
        &self,
        id: &ConversationId,
        caller_type: &str,
        caller_id: &str,
    ) -> Result<ConversationRecord, SwitchboardError> {
        let now = now_iso();
        let record = ConversationRecord {
            id: id.clone(),
            caller_type: caller_type.to_string(),
            caller_id: caller_id.to_string(),
            state: ConversationState::Conversing,
            last_mode: None,
            pending_context: String::new(),
            created_at: now.clone(),
            updated_at: now,
        };

        let row = record.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO conversations \
                     (id, caller_type, caller_id, state, last_mode, pending_context, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        row.id.as_str(),
                        row.caller_type,
                        row.caller_id,
                        row.state.to_string(),
                        Option::<String>::None,
                        row.pending_context,
                        row.created_at,
                        row.updated_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(record)
    }

    async fn get(
        &self,
        id: &ConversationId,
    ) -> Result<Option<ConversationRecord>, SwitchboardError> {
        let id = id.as_str().to_string();
        self.conn
            .call(move |conn| {
                let record = conn
                    .query_row(
                        "SELECT id, caller_type, caller_id, state, last_mode, pending_context, \
                         created_at, updated_at FROM conversations WHERE id = ?1",
                        params![id],
                        row_to_record,
                    )
                    .optional()?;
                Ok(record)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn append_turn(
        &self,
        id: &ConversationId,
        role: TurnRole,
        content: &str,
    ) -> Result<(), SwitchboardError> {
        let id = id.as_str().to_string();
        let content = content.to_string();
        let created_at = now_iso();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO turns (conversation_id, role, content, created_at) \
                     VALUES (?1, ?2, ?3, ?4)",
                    params![id, role.to_string(), content, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn turns(&self, id: &ConversationId) -> Result<Vec<Turn>, SwitchboardError> {
        let id = id.as_str().to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT conversation_id, role, content, created_at \
                     FROM turns WHERE conversation_id = ?1 ORDER BY id",
                )?;
                let turns = stmt
                    .query_map(params![id], |row| {
                        let role_raw: String = row.get(1)?;
                        let role = TurnRole::from_str(&role_raw).map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(
                                1,
                                rusqlite::types::Type::Text,
                                Box::new(e),
                            )
                        })?;
                        Ok(Turn {
                            conversation_id: ConversationId(row.get(0)?),
                            role,
                            content: row.get(2)?,
                            created_at: row.get(3)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(turns)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn record_converse(
        &self,
        id: &ConversationId,
        snapshot: &str,
    ) -> Result<(), SwitchboardError> {
        let id = id.as_str().to_string();
        let snapshot = snapshot.to_string();
        let updated_at = now_iso();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE conversations SET pending_context = ?1, state = ?2, \
                     last_mode = ?3, updated_at = ?4 WHERE id = ?5",
                    params![
                        snapshot,
                        ConversationState::Conversing.to_string(),
                        Mode::Converse.to_string(),
                        updated_at,
                        id,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn set_state(
        &self,
        id: &ConversationId,
        state: ConversationState,
        last_mode: Mode,
    ) -> Result<(), SwitchboardError> {
        let id = id.as_str().to_string();
        let updated_at = now_iso();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE conversations SET state = ?1, last_mode = ?2, updated_at = ?3 \
                     WHERE id = ?4",
                    params![state.to_string(), last_mode.to_string(), updated_at, id],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}
