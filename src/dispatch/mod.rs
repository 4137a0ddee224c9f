//! Mutation dispatcher - performs single logical writes against the
//! backend and optimistically merges the returned rows into the store.
//!
//! Every successful write does two things: it merges the canonical row
//! into the Board State Store immediately (so the caller sees it without
//! waiting for the next refetch), and it independently produces a backend
//! change event that will trigger the Sync Channel's wholesale refetch.
//! Failed writes skip the merge and surface the error; there is no retry.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::backend::Backend;
use crate::models::{
    BROADCAST_RECIPIENT, Comment, Message, MessageKind, NewComment, NewMessage, NewTicket,
    Priority, Ticket, TicketPatch, TicketStatus,
};
use crate::store::{BoardStore, Row};
use crate::{Error, Result};

/// User-supplied fields for a new ticket.
#[derive(Debug, Clone)]
pub struct TicketDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub assignee: String,
    pub labels: Vec<String>,
}

impl TicketDraft {
    /// A draft with just a title and defaults for everything else.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority: Priority::default(),
            assignee: String::new(),
            labels: Vec::new(),
        }
    }
}

/// Performs writes on behalf of one operator session.
pub struct Dispatcher {
    backend: Arc<Mutex<Backend>>,
    store: Arc<Mutex<BoardStore>>,
    /// Ticket id prefix (e.g., "TASK")
    prefix: String,
    /// Name used as comment author and message sender
    operator: String,
}

impl Dispatcher {
    pub fn new(
        backend: Arc<Mutex<Backend>>,
        store: Arc<Mutex<BoardStore>>,
        prefix: impl Into<String>,
        operator: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            store,
            prefix: prefix.into(),
            operator: operator.into(),
        }
    }

    /// Create a ticket with a sequential `PREFIX-NNN` id and status `todo`.
    ///
    /// The id is derived from this session's in-memory ticket count, not a
    /// server-assigned sequence, so two sessions creating tickets
    /// concurrently can race and collide on the same id (the insert then
    /// fails on the primary key). This mirrors the upstream behavior and
    /// is deliberately left unfixed.
    pub async fn create_ticket(&self, draft: TicketDraft) -> Result<Ticket> {
        if draft.title.trim().is_empty() {
            return Err(Error::InvalidInput("ticket title is required".to_string()));
        }

        let id = {
            let store = self.store.lock().await;
            format!("{}-{:03}", self.prefix, store.ticket_count() + 1)
        };

        let new = NewTicket {
            id,
            title: draft.title,
            description: draft.description,
            status: TicketStatus::Todo,
            priority: draft.priority,
            assignee: draft.assignee,
            labels: draft.labels,
        };

        let ticket = {
            let backend = self.backend.lock().await;
            backend.insert_ticket(&new)?
        };

        self.store
            .lock()
            .await
            .apply_insert(Row::Ticket(ticket.clone()));
        Ok(ticket)
    }

    /// Move a ticket to a new column. Any column to any column; no
    /// transition validation. Stamps `updated_at` even when the status is
    /// unchanged.
    pub async fn change_status(&self, ticket_id: &str, status: TicketStatus) -> Result<Ticket> {
        let ticket = {
            let backend = self.backend.lock().await;
            backend.update_ticket(ticket_id, &TicketPatch::status(status))?
        };

        self.store.lock().await.apply_ticket(ticket.clone());
        Ok(ticket)
    }

    /// Merge a partial field set into a ticket.
    pub async fn update_ticket(&self, ticket_id: &str, patch: TicketPatch) -> Result<Ticket> {
        let ticket = {
            let backend = self.backend.lock().await;
            backend.update_ticket(ticket_id, &patch)?
        };

        self.store.lock().await.apply_ticket(ticket.clone());
        Ok(ticket)
    }

    /// Add a comment to a ticket and refresh the parent's `updated_at`.
    ///
    /// Two writes, not transactional: if the parent touch fails the
    /// comment still persists without bumping the ticket's recency.
    pub async fn add_comment(&self, ticket_id: &str, content: &str) -> Result<Comment> {
        if content.trim().is_empty() {
            return Err(Error::InvalidInput(
                "comment content is required".to_string(),
            ));
        }

        let (comment, touched) = {
            let backend = self.backend.lock().await;
            let comment = backend.insert_comment(&NewComment {
                ticket_id: ticket_id.to_string(),
                author: self.operator.clone(),
                content: content.to_string(),
            })?;
            let touched = backend.touch_ticket(ticket_id).ok();
            (comment, touched)
        };

        let mut store = self.store.lock().await;
        store.apply_insert(Row::Comment(comment.clone()));
        if let Some(ticket) = touched {
            store.apply_ticket(ticket);
        }
        Ok(comment)
    }

    /// Send a chat message to a named agent.
    pub async fn send_chat(&self, recipient: &str, content: &str) -> Result<Message> {
        self.send_message(recipient, content, MessageKind::Chat)
            .await
    }

    /// Send a broadcast to every agent.
    pub async fn send_broadcast(&self, content: &str) -> Result<Message> {
        self.send_message(BROADCAST_RECIPIENT, content, MessageKind::Broadcast)
            .await
    }

    /// Send a message. The recipient is not validated against the roster;
    /// a message to an unknown agent is accepted and simply never matched
    /// by any conversation view.
    pub async fn send_message(
        &self,
        recipient: &str,
        content: &str,
        kind: MessageKind,
    ) -> Result<Message> {
        if content.trim().is_empty() {
            return Err(Error::InvalidInput(
                "message content is required".to_string(),
            ));
        }

        let message = {
            let backend = self.backend.lock().await;
            backend.insert_message(&NewMessage {
                sender: self.operator.clone(),
                recipient: recipient.to_string(),
                content: content.to_string(),
                message_type: kind,
            })?
        };

        self.store
            .lock()
            .await
            .apply_insert(Row::Message(message.clone()));
        Ok(message)
    }

    /// Delete a ticket: its comments first, then the ticket itself. The
    /// two deletes are not transactional. The local snapshot is left
    /// alone; the next refetch reconciles it.
    pub async fn delete_ticket(&self, ticket_id: &str) -> Result<()> {
        let backend = self.backend.lock().await;
        backend.delete_comments_for(ticket_id)?;
        backend.delete_ticket(ticket_id)
    }
}
