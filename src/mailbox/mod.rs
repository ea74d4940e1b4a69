//! Per-team mailbox: direct and broadcast messages stored one JSON file per
//! message, with read/unread tracking.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::error::Result;
use crate::layout::ProjectLayout;
use crate::sync::TeamLocks;

/// Recipient of every broadcast message.
pub const BROADCAST_RECIPIENT: &str = "*";

/// A stored message. Immutable once written except for the `read` flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailboxMessage {
    pub id: String,
    pub from: String,
    /// Recipient role, or `"*"` for broadcasts.
    pub to: String,
    pub timestamp: DateTime<Utc>,
    pub body: String,
    #[serde(default)]
    pub read: bool,
}

pub struct Mailbox {
    layout: ProjectLayout,
    team_name: String,
    locks: Arc<TeamLocks>,
}

impl Mailbox {
    pub fn new(layout: ProjectLayout, team_name: impl Into<String>, locks: Arc<TeamLocks>) -> Self {
        Self {
            layout,
            team_name: team_name.into(),
            locks,
        }
    }

    fn messages_dir(&self) -> PathBuf {
        self.layout.mailbox_messages_dir(&self.team_name)
    }

    fn broadcasts_dir(&self) -> PathBuf {
        self.layout.mailbox_broadcasts_dir(&self.team_name)
    }

    /// Send a direct message to a role.
    pub async fn send(&self, from: &str, to: &str, body: &str) -> Result<MailboxMessage> {
        let _guard = self.locks.acquire(&self.team_name).await;
        self.store(self.messages_dir(), from, to, body).await
    }

    /// Send a message to every role on the team except the sender.
    pub async fn broadcast(&self, from: &str, body: &str) -> Result<MailboxMessage> {
        let _guard = self.locks.acquire(&self.team_name).await;
        self.store(self.broadcasts_dir(), from, BROADCAST_RECIPIENT, body)
            .await
    }

    async fn store(
        &self,
        dir: PathBuf,
        from: &str,
        to: &str,
        body: &str,
    ) -> Result<MailboxMessage> {
        fs::create_dir_all(&dir).await?;
        let message = MailboxMessage {
            id: uuid::Uuid::new_v4().to_string(),
            from: from.to_string(),
            to: to.to_string(),
            timestamp: Utc::now(),
            body: body.to_string(),
            read: false,
        };
        let path = dir.join(format!("{}.json", message.id));
        let content = serde_json::to_string_pretty(&message)?;
        fs::write(&path, content).await?;
        debug!(
            team = %self.team_name,
            message_id = %message.id,
            from,
            to,
            "Message stored"
        );
        Ok(message)
    }

    /// Unread messages for `role`: direct messages addressed to it (or to
    /// `"*"`) plus broadcasts from other senders, oldest first. Every
    /// returned message is marked read (at-least-once delivery).
    pub async fn read_unread(&self, role: &str) -> Result<Vec<MailboxMessage>> {
        let _guard = self.locks.acquire(&self.team_name).await;

        let mut matched: Vec<(PathBuf, MailboxMessage)> = Vec::new();
        for (path, message) in load_dir(&self.messages_dir()).await? {
            if !message.read && (message.to == role || message.to == BROADCAST_RECIPIENT) {
                matched.push((path, message));
            }
        }
        for (path, message) in load_dir(&self.broadcasts_dir()).await? {
            if !message.read && message.from != role {
                matched.push((path, message));
            }
        }
        matched.sort_by(|a, b| a.1.timestamp.cmp(&b.1.timestamp));

        let mut delivered = Vec::with_capacity(matched.len());
        for (path, mut message) in matched {
            message.read = true;
            let content = serde_json::to_string_pretty(&message)?;
            fs::write(&path, content).await?;
            delivered.push(message);
        }

        if !delivered.is_empty() {
            debug!(team = %self.team_name, role, count = delivered.len(), "Messages delivered");
        }
        Ok(delivered)
    }

    /// Newest messages across both stores, truncated to `limit`. Does not
    /// touch the read flag.
    pub async fn list_recent(&self, limit: usize) -> Result<Vec<MailboxMessage>> {
        let mut messages: Vec<MailboxMessage> = load_dir(&self.messages_dir())
            .await?
            .into_iter()
            .map(|(_, m)| m)
            .collect();
        messages.extend(
            load_dir(&self.broadcasts_dir())
                .await?
                .into_iter()
                .map(|(_, m)| m),
        );
        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        messages.truncate(limit);
        Ok(messages)
    }
}

async fn load_dir(dir: &Path) -> Result<Vec<(PathBuf, MailboxMessage)>> {
    let mut messages = Vec::new();
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(messages),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            let content = fs::read_to_string(&path).await?;
            let message: MailboxMessage = serde_json::from_str(&content)?;
            messages.push((path, message));
        }
    }
    Ok(messages)
}
