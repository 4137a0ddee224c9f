//! Board State Store - the in-memory mirror of board data.
//!
//! The store holds the latest known snapshot of tickets, comments, and
//! messages for a session. It is a disposable cache: the backend is the
//! sole source of truth and the snapshot is rebuilt wholesale on every
//! sync refetch. The store is a plain single-owner struct handed around
//! by handle; nothing here is process-global.

use serde::Serialize;

use crate::models::{Comment, Message, Ticket};

/// One atomic view of all three collections.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BoardSnapshot {
    pub tickets: Vec<Ticket>,
    pub comments: Vec<Comment>,
    pub messages: Vec<Message>,
}

/// A single row returned from a successful write.
#[derive(Debug, Clone)]
pub enum Row {
    Ticket(Ticket),
    Comment(Comment),
    Message(Message),
}

/// In-memory mirror of the board, replaced wholesale on every sync event.
#[derive(Debug, Default)]
pub struct BoardStore {
    snapshot: BoardSnapshot,
    version: u64,
}

impl BoardStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wholesale overwrite of all three collections. Last writer wins;
    /// no merge, no diff. Bumps the snapshot version.
    pub fn replace_all(
        &mut self,
        tickets: Vec<Ticket>,
        comments: Vec<Comment>,
        messages: Vec<Message>,
    ) {
        self.snapshot = BoardSnapshot {
            tickets,
            comments,
            messages,
        };
        self.version += 1;
    }

    /// Optimistic append of a row returned from a successful write.
    ///
    /// Best effort only: no dedup against a later `replace_all` that
    /// includes the same row - the replacement simply supersedes it.
    pub fn apply_insert(&mut self, row: Row) {
        match row {
            Row::Ticket(t) => self.snapshot.tickets.push(t),
            Row::Comment(c) => self.snapshot.comments.push(c),
            Row::Message(m) => self.snapshot.messages.push(m),
        }
        self.version += 1;
    }

    /// Optimistic in-place replacement of one ticket by id, used after a
    /// status change or field edit. Appends if the id is unknown.
    pub fn apply_ticket(&mut self, ticket: Ticket) {
        match self
            .snapshot
            .tickets
            .iter_mut()
            .find(|t| t.id == ticket.id)
        {
            Some(existing) => *existing = ticket,
            None => self.snapshot.tickets.push(ticket),
        }
        self.version += 1;
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> &BoardSnapshot {
        &self.snapshot
    }

    /// Monotonic snapshot version; bumps on every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of tickets currently mirrored. Used to derive the next
    /// sequential ticket id.
    pub fn ticket_count(&self) -> usize {
        self.snapshot.tickets.len()
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.snapshot.tickets
    }

    pub fn comments(&self) -> &[Comment] {
        &self.snapshot.comments
    }

    pub fn messages(&self) -> &[Message] {
        &self.snapshot.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageKind, TicketStatus};
    use chrono::Utc;

    fn ticket(id: &str) -> Ticket {
        Ticket::new(id.to_string(), format!("Ticket {}", id))
    }

    fn comment(id: &str, ticket_id: &str) -> Comment {
        Comment {
            id: id.to_string(),
            ticket_id: ticket_id.to_string(),
            author: "Bernardo".to_string(),
            content: "ping".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_replace_all_swaps_every_collection() {
        let mut store = BoardStore::new();
        store.apply_insert(Row::Ticket(ticket("TASK-001")));
        store.apply_insert(Row::Comment(comment("c1", "TASK-001")));

        store.replace_all(vec![ticket("TASK-002")], vec![], vec![]);

        assert_eq!(store.tickets().len(), 1);
        assert_eq!(store.tickets()[0].id, "TASK-002");
        assert!(store.comments().is_empty());
        assert!(store.messages().is_empty());
    }

    #[test]
    fn test_version_bumps_on_every_mutation() {
        let mut store = BoardStore::new();
        assert_eq!(store.version(), 0);

        store.apply_insert(Row::Ticket(ticket("TASK-001")));
        assert_eq!(store.version(), 1);

        store.replace_all(vec![], vec![], vec![]);
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn test_replace_all_supersedes_optimistic_insert() {
        let mut store = BoardStore::new();
        let t = ticket("TASK-001");

        // Optimistic append, then a refetch that includes the same row
        store.apply_insert(Row::Ticket(t.clone()));
        store.replace_all(vec![t], vec![], vec![]);

        // Replacement, not merge: no duplicate
        assert_eq!(store.tickets().len(), 1);
    }

    #[test]
    fn test_apply_ticket_replaces_by_id() {
        let mut store = BoardStore::new();
        store.apply_insert(Row::Ticket(ticket("TASK-001")));

        let mut moved = ticket("TASK-001");
        moved.status = TicketStatus::Done;
        store.apply_ticket(moved);

        assert_eq!(store.tickets().len(), 1);
        assert_eq!(store.tickets()[0].status, TicketStatus::Done);
    }

    #[test]
    fn test_apply_ticket_appends_unknown_id() {
        let mut store = BoardStore::new();
        store.apply_ticket(ticket("TASK-001"));
        assert_eq!(store.tickets().len(), 1);
    }

    #[test]
    fn test_apply_insert_message() {
        let mut store = BoardStore::new();
        store.apply_insert(Row::Message(Message {
            id: "m1".to_string(),
            sender: "Bernardo".to_string(),
            recipient: "all".to_string(),
            content: "hi".to_string(),
            message_type: MessageKind::Broadcast,
            created_at: Utc::now(),
        }));
        assert_eq!(store.messages().len(), 1);
    }
}
