//! Backend layer for Missionboard data.
//!
//! This is the local stand-in for the hosted relational-with-realtime
//! backend the board syncs against. It offers the minimum contract the
//! client model needs:
//!
//! - Row creation returning the persisted row
//! - Row update-by-id with partial field replacement
//! - Row deletion-by-id
//! - Ordered range queries by timestamp with an optional limit
//! - A collection-scoped change-notification broadcast fired after every
//!   successful insert/update/delete
//!
//! All rows live in SQLite (`board.db`); enum columns store their wire
//! string forms, labels store as a JSON array column.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{Comment, Message, NewComment, NewMessage, NewTicket, Ticket, TicketPatch};
use crate::{Error, Result};

/// Capacity of the change-notification channel.
const CHANGE_CHANNEL_CAPACITY: usize = 100;

/// The three record collections the board tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Tickets,
    Comments,
    Messages,
}

/// What happened to a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

/// A collection-scoped change notification.
///
/// Events are deliberately coarse: they carry no row data, only which
/// collection changed. Subscribers refetch rather than apply deltas.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub op: ChangeOp,
}

/// Sort direction for timestamp-ordered queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn sql(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// Backend handle for a single board database.
pub struct Backend {
    /// SQLite connection
    conn: Connection,
    /// Change-notification channel; sends with no subscribers are dropped
    changes: broadcast::Sender<ChangeEvent>,
}

impl Backend {
    /// Open or create the board database at the given path.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self { conn, changes })
    }

    /// Initialize the SQLite schema.
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'todo',
                priority TEXT NOT NULL DEFAULT 'medium',
                assignee TEXT NOT NULL DEFAULT '',
                labels TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
            CREATE INDEX IF NOT EXISTS idx_tickets_updated ON tickets(updated_at);

            CREATE TABLE IF NOT EXISTS comments (
                id TEXT PRIMARY KEY,
                ticket_id TEXT NOT NULL,
                author TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (ticket_id) REFERENCES tickets(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_comments_ticket ON comments(ticket_id);
            CREATE INDEX IF NOT EXISTS idx_comments_created ON comments(created_at);

            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                sender TEXT NOT NULL,
                recipient TEXT NOT NULL,
                content TEXT NOT NULL,
                message_type TEXT NOT NULL DEFAULT 'chat',
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_messages_created ON messages(created_at);
            "#,
        )?;
        Ok(())
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    /// Clone of the change-notification sender, for fan-out to other
    /// subscribers (e.g., WebSocket clients).
    pub fn change_sender(&self) -> broadcast::Sender<ChangeEvent> {
        self.changes.clone()
    }

    fn notify(&self, collection: Collection, op: ChangeOp) {
        // No subscribers is fine
        let _ = self.changes.send(ChangeEvent { collection, op });
    }

    // --- tickets ---

    /// Insert a ticket and return the persisted row.
    pub fn insert_ticket(&self, new: &NewTicket) -> Result<Ticket> {
        let now = Utc::now();
        let ticket = Ticket {
            id: new.id.clone(),
            title: new.title.clone(),
            description: new.description.clone(),
            status: new.status,
            priority: new.priority,
            assignee: new.assignee.clone(),
            labels: new.labels.clone(),
            created_at: now,
            updated_at: now,
        };

        self.conn.execute(
            r#"
            INSERT INTO tickets
            (id, title, description, status, priority, assignee, labels, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                ticket.id,
                ticket.title,
                ticket.description,
                ticket.status.as_str(),
                ticket.priority.as_str(),
                ticket.assignee,
                serde_json::to_string(&ticket.labels)?,
                ticket.created_at.to_rfc3339(),
                ticket.updated_at.to_rfc3339(),
            ],
        )?;

        self.notify(Collection::Tickets, ChangeOp::Insert);
        Ok(ticket)
    }

    /// Get a ticket by id.
    pub fn get_ticket(&self, id: &str) -> Result<Ticket> {
        self.conn
            .query_row(
                "SELECT id, title, description, status, priority, assignee, labels, created_at, updated_at
                 FROM tickets WHERE id = ?1",
                params![id],
                row_to_ticket,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Error::NotFound(id.to_string()),
                other => Error::Database(other),
            })
    }

    /// Merge a partial field set into a ticket, stamp `updated_at`, and
    /// return the updated row.
    pub fn update_ticket(&self, id: &str, patch: &TicketPatch) -> Result<Ticket> {
        let mut ticket = self.get_ticket(id)?;
        patch.apply_to(&mut ticket);
        ticket.updated_at = Utc::now();

        self.conn.execute(
            r#"
            UPDATE tickets
            SET title = ?2, description = ?3, status = ?4, priority = ?5,
                assignee = ?6, labels = ?7, updated_at = ?8
            WHERE id = ?1
            "#,
            params![
                ticket.id,
                ticket.title,
                ticket.description,
                ticket.status.as_str(),
                ticket.priority.as_str(),
                ticket.assignee,
                serde_json::to_string(&ticket.labels)?,
                ticket.updated_at.to_rfc3339(),
            ],
        )?;

        self.notify(Collection::Tickets, ChangeOp::Update);
        Ok(ticket)
    }

    /// Refresh a ticket's `updated_at` without changing any other field.
    ///
    /// Used as the second (non-transactional) write of a comment insert.
    pub fn touch_ticket(&self, id: &str) -> Result<Ticket> {
        let now = Utc::now();
        let affected = self.conn.execute(
            "UPDATE tickets SET updated_at = ?2 WHERE id = ?1",
            params![id, now.to_rfc3339()],
        )?;
        if affected == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        self.notify(Collection::Tickets, ChangeOp::Update);
        self.get_ticket(id)
    }

    /// Delete a ticket by id. Deleting a missing id is not an error.
    pub fn delete_ticket(&self, id: &str) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM tickets WHERE id = ?1", params![id])?;
        if affected > 0 {
            self.notify(Collection::Tickets, ChangeOp::Delete);
        }
        Ok(())
    }

    /// List all tickets ordered by `updated_at`.
    pub fn list_tickets(&self, order: Order) -> Result<Vec<Ticket>> {
        let sql = format!(
            "SELECT id, title, description, status, priority, assignee, labels, created_at, updated_at
             FROM tickets ORDER BY updated_at {}",
            order.sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_ticket)?;
        let mut tickets = Vec::new();
        for row in rows {
            tickets.push(row?);
        }
        Ok(tickets)
    }

    /// Number of tickets currently stored.
    pub fn ticket_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tickets", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // --- comments ---

    /// Insert a comment and return the persisted row.
    pub fn insert_comment(&self, new: &NewComment) -> Result<Comment> {
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            ticket_id: new.ticket_id.clone(),
            author: new.author.clone(),
            content: new.content.clone(),
            created_at: Utc::now(),
        };

        self.conn.execute(
            "INSERT INTO comments (id, ticket_id, author, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                comment.id,
                comment.ticket_id,
                comment.author,
                comment.content,
                comment.created_at.to_rfc3339(),
            ],
        )?;

        self.notify(Collection::Comments, ChangeOp::Insert);
        Ok(comment)
    }

    /// Delete all comments belonging to a ticket. Returns how many went.
    pub fn delete_comments_for(&self, ticket_id: &str) -> Result<usize> {
        let affected = self.conn.execute(
            "DELETE FROM comments WHERE ticket_id = ?1",
            params![ticket_id],
        )?;
        if affected > 0 {
            self.notify(Collection::Comments, ChangeOp::Delete);
        }
        Ok(affected)
    }

    /// List comments ordered by `created_at`, optionally limited.
    pub fn list_comments(&self, order: Order, limit: Option<usize>) -> Result<Vec<Comment>> {
        let mut sql = format!(
            "SELECT id, ticket_id, author, content, created_at
             FROM comments ORDER BY created_at {}",
            order.sql()
        );
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_comment)?;
        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    // --- messages ---

    /// Insert a message and return the persisted row.
    pub fn insert_message(&self, new: &NewMessage) -> Result<Message> {
        let message = Message {
            id: Uuid::new_v4().to_string(),
            sender: new.sender.clone(),
            recipient: new.recipient.clone(),
            content: new.content.clone(),
            message_type: new.message_type,
            created_at: Utc::now(),
        };

        self.conn.execute(
            "INSERT INTO messages (id, sender, recipient, content, message_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                message.id,
                message.sender,
                message.recipient,
                message.content,
                message.message_type.as_str(),
                message.created_at.to_rfc3339(),
            ],
        )?;

        self.notify(Collection::Messages, ChangeOp::Insert);
        Ok(message)
    }

    /// List messages ordered by `created_at`, optionally limited.
    pub fn list_messages(&self, order: Order, limit: Option<usize>) -> Result<Vec<Message>> {
        let mut sql = format!(
            "SELECT id, sender, recipient, content, message_type, created_at
             FROM messages ORDER BY created_at {}",
            order.sql()
        );
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_message)?;
        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_enum<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = Error>,
{
    raw.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_ticket(row: &rusqlite::Row<'_>) -> rusqlite::Result<Ticket> {
    let status: String = row.get(3)?;
    let priority: String = row.get(4)?;
    let labels: String = row.get(6)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;

    Ok(Ticket {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: parse_enum(3, &status)?,
        priority: parse_enum(4, &priority)?,
        assignee: row.get(5)?,
        labels: serde_json::from_str(&labels).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?,
        created_at: parse_timestamp(7, &created_at)?,
        updated_at: parse_timestamp(8, &updated_at)?,
    })
}

fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    let created_at: String = row.get(4)?;
    Ok(Comment {
        id: row.get(0)?,
        ticket_id: row.get(1)?,
        author: row.get(2)?,
        content: row.get(3)?,
        created_at: parse_timestamp(4, &created_at)?,
    })
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let message_type: String = row.get(4)?;
    let created_at: String = row.get(5)?;
    Ok(Message {
        id: row.get(0)?,
        sender: row.get(1)?,
        recipient: row.get(2)?,
        content: row.get(3)?,
        message_type: parse_enum(4, &message_type)?,
        created_at: parse_timestamp(5, &created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageKind, Priority, TicketStatus};
    use crate::test_utils::TestEnv;

    fn new_ticket(id: &str, title: &str) -> NewTicket {
        NewTicket {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            status: TicketStatus::Todo,
            priority: Priority::Medium,
            assignee: String::new(),
            labels: Vec::new(),
        }
    }

    #[test]
    fn test_insert_and_get_ticket() {
        let env = TestEnv::new();
        let backend = env.open_backend();

        let ticket = backend.insert_ticket(&new_ticket("TASK-001", "First")).unwrap();
        assert_eq!(ticket.status, TicketStatus::Todo);
        assert!(ticket.updated_at >= ticket.created_at);

        let fetched = backend.get_ticket("TASK-001").unwrap();
        assert_eq!(fetched.title, "First");
        assert_eq!(fetched.created_at, ticket.created_at);
    }

    #[test]
    fn test_get_missing_ticket_is_not_found() {
        let env = TestEnv::new();
        let backend = env.open_backend();

        let err = backend.get_ticket("TASK-404").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_duplicate_ticket_id_is_rejected() {
        let env = TestEnv::new();
        let backend = env.open_backend();

        backend.insert_ticket(&new_ticket("TASK-001", "First")).unwrap();
        let err = backend.insert_ticket(&new_ticket("TASK-001", "Dup")).unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn test_update_ticket_merges_and_stamps() {
        let env = TestEnv::new();
        let backend = env.open_backend();

        let created = backend.insert_ticket(&new_ticket("TASK-001", "First")).unwrap();
        let patch = TicketPatch::status(TicketStatus::Done);
        let updated = backend.update_ticket("TASK-001", &patch).unwrap();

        assert_eq!(updated.status, TicketStatus::Done);
        assert_eq!(updated.title, "First");
        assert!(updated.updated_at >= created.updated_at);
    }

    #[test]
    fn test_labels_round_trip() {
        let env = TestEnv::new();
        let backend = env.open_backend();

        let mut new = new_ticket("TASK-001", "Labeled");
        new.labels = vec!["infra".to_string(), "urgent".to_string()];
        backend.insert_ticket(&new).unwrap();

        let fetched = backend.get_ticket("TASK-001").unwrap();
        assert_eq!(fetched.labels, vec!["infra", "urgent"]);
    }

    #[test]
    fn test_list_tickets_ordered_by_updated_desc() {
        let env = TestEnv::new();
        let backend = env.open_backend();

        backend.insert_ticket(&new_ticket("TASK-001", "First")).unwrap();
        backend.insert_ticket(&new_ticket("TASK-002", "Second")).unwrap();
        // Touch the first so it becomes the most recently updated
        backend.touch_ticket("TASK-001").unwrap();

        let tickets = backend.list_tickets(Order::Desc).unwrap();
        assert_eq!(tickets[0].id, "TASK-001");
        assert_eq!(tickets[1].id, "TASK-002");
    }

    #[test]
    fn test_list_comments_limit() {
        let env = TestEnv::new();
        let backend = env.open_backend();

        backend.insert_ticket(&new_ticket("TASK-001", "First")).unwrap();
        for i in 0..5 {
            backend
                .insert_comment(&NewComment {
                    ticket_id: "TASK-001".to_string(),
                    author: "Bernardo".to_string(),
                    content: format!("note {}", i),
                })
                .unwrap();
        }

        let recent = backend.list_comments(Order::Desc, Some(2)).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "note 4");
    }

    #[test]
    fn test_delete_comments_then_ticket() {
        let env = TestEnv::new();
        let backend = env.open_backend();

        backend.insert_ticket(&new_ticket("TASK-001", "First")).unwrap();
        backend
            .insert_comment(&NewComment {
                ticket_id: "TASK-001".to_string(),
                author: "Bernardo".to_string(),
                content: "ping".to_string(),
            })
            .unwrap();

        assert_eq!(backend.delete_comments_for("TASK-001").unwrap(), 1);
        backend.delete_ticket("TASK-001").unwrap();

        assert!(backend.list_tickets(Order::Desc).unwrap().is_empty());
        assert!(backend.list_comments(Order::Asc, None).unwrap().is_empty());
    }

    #[test]
    fn test_messages_round_trip() {
        let env = TestEnv::new();
        let backend = env.open_backend();

        let sent = backend
            .insert_message(&NewMessage {
                sender: "Bernardo".to_string(),
                recipient: "all".to_string(),
                content: "standup at 3pm".to_string(),
                message_type: MessageKind::Broadcast,
            })
            .unwrap();

        let listed = backend.list_messages(Order::Asc, None).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, sent.id);
        assert_eq!(listed[0].message_type, MessageKind::Broadcast);
    }

    #[test]
    fn test_change_events_fire_per_collection() {
        let env = TestEnv::new();
        let backend = env.open_backend();
        let mut rx = backend.subscribe();

        backend.insert_ticket(&new_ticket("TASK-001", "First")).unwrap();
        let event = rx.try_recv().unwrap();
        assert_eq!(event.collection, Collection::Tickets);
        assert_eq!(event.op, ChangeOp::Insert);

        backend
            .insert_message(&NewMessage {
                sender: "Bernardo".to_string(),
                recipient: "Apollo".to_string(),
                content: "hi".to_string(),
                message_type: MessageKind::Chat,
            })
            .unwrap();
        let event = rx.try_recv().unwrap();
        assert_eq!(event.collection, Collection::Messages);
    }

    #[test]
    fn test_delete_missing_ticket_is_silent() {
        let env = TestEnv::new();
        let backend = env.open_backend();
        let mut rx = backend.subscribe();

        backend.delete_ticket("TASK-404").unwrap();
        assert!(rx.try_recv().is_err());
    }
}
