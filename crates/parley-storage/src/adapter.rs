// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the message store traits.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use parley_config::model::StorageConfig;
use parley_core::{
    AccountContext, AdapterType, AttachOutcome, ChatId, HealthStatus, MessageId, MessageRef,
    MessageSource, ParleyError, PluginAdapter, TranslationSink,
};

use crate::database::{Database, map_tr_err};
use crate::models::StoredMessage;
use crate::queries;

/// Capacity of the arrival notification channel.
const ARRIVAL_CHANNEL_CAPACITY: usize = 256;

/// SQLite-backed message store.
///
/// Messages whose sender is the configured account are the account's own
/// (outgoing) messages; everything else is incoming. Inserting incoming
/// messages publishes their ids to subscribers.
#[derive(Debug)]
pub struct SqliteMessageStore {
    db: Database,
    account: AccountContext,
    arrivals: broadcast::Sender<Vec<MessageId>>,
}

impl SqliteMessageStore {
    /// Open the store at the configured path.
    pub async fn open(config: &StorageConfig, account: AccountContext) -> Result<Self, ParleyError> {
        let db = Database::open_with(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, account = %account.account_id, "SQLite message store opened");
        Ok(Self::new(db, account))
    }

    pub fn new(db: Database, account: AccountContext) -> Self {
        let (arrivals, _) = broadcast::channel(ARRIVAL_CHANNEL_CAPACITY);
        Self {
            db,
            account,
            arrivals,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Insert one message. See [`SqliteMessageStore::insert_messages`].
    pub async fn insert_message(&self, message: StoredMessage) -> Result<MessageId, ParleyError> {
        let id = message.id();
        self.insert_messages(vec![message]).await?;
        Ok(id)
    }

    /// Insert messages and announce the incoming ones as a single arrival batch.
    pub async fn insert_messages(&self, messages: Vec<StoredMessage>) -> Result<(), ParleyError> {
        if messages.is_empty() {
            return Ok(());
        }
        queries::messages::insert_messages(&self.db, &messages).await?;

        let incoming: Vec<MessageId> = messages
            .iter()
            .filter(|m| m.sender_id != self.account.account_id)
            .map(StoredMessage::id)
            .collect();
        if !incoming.is_empty() {
            let count = incoming.len();
            // No subscriber yet is not an error.
            let receivers = self.arrivals.send(incoming).unwrap_or(0);
            debug!(count, receivers, "published message arrivals");
        }
        Ok(())
    }

    /// Remove a message. Returns whether it existed.
    pub async fn delete_message(&self, id: &MessageId) -> Result<bool, ParleyError> {
        queries::messages::delete_message(&self.db, id.chat_id.as_str(), id.seq).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteMessageStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::MessageStore
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        self.db.checkpoint().await
    }
}

#[async_trait]
impl MessageSource for SqliteMessageStore {
    async fn get_message(&self, id: &MessageId) -> Result<Option<MessageRef>, ParleyError> {
        let row = queries::messages::get_message(&self.db, id.chat_id.as_str(), id.seq).await?;
        Ok(row.map(|m| m.to_message_ref(&self.account.account_id)))
    }

    async fn scan_recent(
        &self,
        chat_id: &ChatId,
        limit: usize,
    ) -> Result<Vec<MessageRef>, ParleyError> {
        let rows = queries::messages::recent_messages(&self.db, chat_id.as_str(), limit).await?;
        Ok(rows
            .iter()
            .map(|m| m.to_message_ref(&self.account.account_id))
            .collect())
    }

    async fn scan_before(
        &self,
        id: &MessageId,
        limit: usize,
    ) -> Result<Vec<MessageRef>, ParleyError> {
        let rows =
            queries::messages::messages_before(&self.db, id.chat_id.as_str(), id.seq, limit)
                .await?;
        Ok(rows
            .iter()
            .map(|m| m.to_message_ref(&self.account.account_id))
            .collect())
    }

    fn subscribe(&self) -> broadcast::Receiver<Vec<MessageId>> {
        self.arrivals.subscribe()
    }
}

#[async_trait]
impl TranslationSink for SqliteMessageStore {
    async fn attach_translation(
        &self,
        id: &MessageId,
        text: &str,
    ) -> Result<AttachOutcome, ParleyError> {
        queries::messages::attach_translation(&self.db, id.chat_id.as_str(), id.seq, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn open_store(dir: &tempfile::TempDir) -> SqliteMessageStore {
        let config = StorageConfig {
            database_path: dir.path().join("store.db").display().to_string(),
            wal_mode: true,
        };
        SqliteMessageStore::open(&config, AccountContext::new("me")).await.unwrap()
    }

    #[tokio::test]
    async fn implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.adapter_type(), AdapterType::MessageStore);
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn only_incoming_messages_are_published() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        let mut arrivals = store.subscribe();

        store
            .insert_messages(vec![
                StoredMessage::new("c1", 1, "peer", "hola", 1),
                StoredMessage::new("c1", 2, "me", "hello back", 2),
                StoredMessage::new("c1", 3, "peer", "¿qué tal?", 3),
            ])
            .await
            .unwrap();
        store
            .insert_message(StoredMessage::new("c1", 4, "me", "fine", 4))
            .await
            .unwrap();

        let batch = arrivals.recv().await.unwrap();
        assert_eq!(batch, vec![MessageId::new("c1", 1), MessageId::new("c1", 3)]);
        assert!(arrivals.try_recv().is_err());
    }

    #[tokio::test]
    async fn insert_without_subscribers_succeeds() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        let id = store
            .insert_message(StoredMessage::new("c1", 1, "peer", "hola", 1))
            .await
            .unwrap();
        assert_eq!(id, MessageId::new("c1", 1));
    }

    #[tokio::test]
    async fn messages_are_viewed_from_the_account() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        store
            .insert_messages(vec![
                StoredMessage::new("c1", 1, "peer", "hola", 1),
                StoredMessage::new("c1", 2, "me", "hi", 2),
            ])
            .await
            .unwrap();

        let incoming = store.get_message(&MessageId::new("c1", 1)).await.unwrap().unwrap();
        assert!(!incoming.is_own_message);
        let own = store.get_message(&MessageId::new("c1", 2)).await.unwrap().unwrap();
        assert!(own.is_own_message);

        let recent = store.scan_recent(&ChatId::from("c1"), 10).await.unwrap();
        assert_eq!(recent[0].id.seq, 2);
        assert_eq!(recent[1].id.seq, 1);
    }

    #[tokio::test]
    async fn attach_then_delete() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        let id = store
            .insert_message(StoredMessage::new("c1", 1, "peer", "hola", 1))
            .await
            .unwrap();

        assert_eq!(
            store.attach_translation(&id, "hello").await.unwrap(),
            AttachOutcome::Attached
        );
        assert_eq!(
            store.get_message(&id).await.unwrap().unwrap().translation.as_deref(),
            Some("hello")
        );

        assert!(store.delete_message(&id).await.unwrap());
        assert_eq!(
            store.attach_translation(&id, "again").await.unwrap(),
            AttachOutcome::Missing
        );
    }
}
