//! Command implementations for the Missionboard CLI.
//!
//! Each command runs against a [`Session`]: an opened backend, a board
//! snapshot loaded through the sync refresh, and a dispatcher acting as
//! the configured operator. Commands return [`Output`] values; main
//! decides between JSON and human rendering.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::Mutex;

use crate::Result;
use crate::backend::Backend;
use crate::config::{self, BoardConfig};
use crate::dispatch::{Dispatcher, TicketDraft};
use crate::models::{BROADCAST_RECIPIENT, Comment, Message, Ticket, TicketStatus};
use crate::models::agents::AgentProfile;
use crate::store::BoardStore;
use crate::{sync, views};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json_string<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// One CLI invocation's board session.
pub struct Session {
    runtime: Runtime,
    dispatcher: Dispatcher,
    store: Arc<Mutex<BoardStore>>,
    pub config: BoardConfig,
}

impl Session {
    /// Open the board in the given data directory and load a snapshot.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let board_config = BoardConfig::load(data_dir)?;
        let backend = Backend::open(&data_dir.join(config::DB_FILE))?;
        let backend = Arc::new(Mutex::new(backend));
        let store = Arc::new(Mutex::new(BoardStore::new()));

        let runtime = Runtime::new()?;
        runtime.block_on(sync::refresh(&backend, &store));

        let dispatcher = Dispatcher::new(
            backend,
            store.clone(),
            board_config.ticket_prefix.clone(),
            board_config.operator.clone(),
        );
        Ok(Self {
            runtime,
            dispatcher,
            store,
            config: board_config,
        })
    }

    /// Create a ticket.
    pub fn ticket_add(&self, draft: TicketDraft) -> Result<TicketOutput> {
        let ticket = self.runtime.block_on(self.dispatcher.create_ticket(draft))?;
        Ok(TicketOutput { ticket })
    }

    /// Move a ticket to another column.
    pub fn ticket_move(&self, id: &str, status: TicketStatus) -> Result<TicketOutput> {
        let ticket = self
            .runtime
            .block_on(self.dispatcher.change_status(id, status))?;
        Ok(TicketOutput { ticket })
    }

    /// List tickets, optionally filtered to one column.
    pub fn ticket_list(&self, status: Option<TicketStatus>) -> Result<TicketListOutput> {
        let store = self.runtime.block_on(self.store.lock());
        let tickets = match status {
            Some(status) => views::tickets_by_status(store.tickets(), status)
                .into_iter()
                .cloned()
                .collect(),
            None => store.tickets().to_vec(),
        };
        Ok(TicketListOutput { tickets })
    }

    /// Delete a ticket and its comments.
    pub fn ticket_delete(&self, id: &str) -> Result<DeletedOutput> {
        self.runtime.block_on(self.dispatcher.delete_ticket(id))?;
        Ok(DeletedOutput::new(id.to_string()))
    }

    /// Add a comment to a ticket.
    pub fn comment(&self, ticket_id: &str, content: &str) -> Result<CommentOutput> {
        let comment = self
            .runtime
            .block_on(self.dispatcher.add_comment(ticket_id, content))?;
        Ok(CommentOutput { comment })
    }

    /// Send a chat message, or a broadcast when the recipient is "all".
    pub fn msg_send(&self, recipient: &str, content: &str) -> Result<MessageOutput> {
        let message = if recipient == BROADCAST_RECIPIENT {
            self.runtime.block_on(self.dispatcher.send_broadcast(content))?
        } else {
            self.runtime
                .block_on(self.dispatcher.send_chat(recipient, content))?
        };
        Ok(MessageOutput { message })
    }

    /// The conversation with a given agent.
    pub fn msg_list(&self, agent: &str) -> Result<ConversationOutput> {
        let store = self.runtime.block_on(self.store.lock());
        let messages = views::conversation_with(store.messages(), agent)
            .into_iter()
            .cloned()
            .collect();
        Ok(ConversationOutput {
            agent: agent.to_string(),
            messages,
        })
    }

    /// The configured agent roster.
    pub fn agents(&self) -> AgentsOutput {
        AgentsOutput {
            agents: self.config.agents.clone(),
        }
    }

    /// The full board grouped by column.
    pub fn board(&self) -> Result<BoardOutput> {
        let store = self.runtime.block_on(self.store.lock());
        let columns = TicketStatus::ALL
            .iter()
            .map(|status| BoardColumn {
                status: *status,
                title: status.column_title().to_string(),
                tickets: views::tickets_by_status(store.tickets(), *status)
                    .into_iter()
                    .cloned()
                    .collect(),
            })
            .collect();
        Ok(BoardOutput {
            version: store.version(),
            columns,
        })
    }
}

#[derive(Serialize)]
pub struct TicketOutput {
    pub ticket: Ticket,
}

impl Output for TicketOutput {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let t = &self.ticket;
        let mut line = format!("{} [{}] {}", t.id, t.status, t.title);
        if !t.assignee.is_empty() {
            line.push_str(&format!(" (assignee: {})", t.assignee));
        }
        line
    }
}

#[derive(Serialize)]
pub struct TicketListOutput {
    pub tickets: Vec<Ticket>,
}

impl Output for TicketListOutput {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if self.tickets.is_empty() {
            return "No tickets".to_string();
        }
        self.tickets
            .iter()
            .map(|t| {
                format!(
                    "{} [{}] ({}) {}",
                    t.id, t.status, t.priority, t.title
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Serialize)]
pub struct DeletedOutput {
    pub id: String,
    pub success: bool,
}

impl DeletedOutput {
    fn new(id: String) -> Self {
        Self { id, success: true }
    }
}

impl Output for DeletedOutput {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!("Deleted {}", self.id)
    }
}

#[derive(Serialize)]
pub struct CommentOutput {
    pub comment: Comment,
}

impl Output for CommentOutput {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Commented on {}: {}",
            self.comment.ticket_id, self.comment.content
        )
    }
}

#[derive(Serialize)]
pub struct MessageOutput {
    pub message: Message,
}

impl Output for MessageOutput {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!(
            "{} -> {}: {}",
            self.message.sender, self.message.recipient, self.message.content
        )
    }
}

#[derive(Serialize)]
pub struct ConversationOutput {
    pub agent: String,
    pub messages: Vec<Message>,
}

impl Output for ConversationOutput {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if self.messages.is_empty() {
            return format!("No messages with {}", self.agent);
        }
        self.messages
            .iter()
            .map(|m| {
                format!(
                    "[{}] {} -> {}: {}",
                    m.created_at.format("%Y-%m-%d %H:%M"),
                    m.sender,
                    m.recipient,
                    m.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Serialize)]
pub struct AgentsOutput {
    pub agents: Vec<AgentProfile>,
}

impl Output for AgentsOutput {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        self.agents
            .iter()
            .map(|a| format!("{} ({}) - {}", a.name, a.status, a.role))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Serialize)]
pub struct BoardColumn {
    pub status: TicketStatus,
    pub title: String,
    pub tickets: Vec<Ticket>,
}

#[derive(Serialize)]
pub struct BoardOutput {
    pub version: u64,
    pub columns: Vec<BoardColumn>,
}

impl Output for BoardOutput {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let mut out = String::new();
        for column in &self.columns {
            out.push_str(&format!("== {} ({}) ==\n", column.title, column.tickets.len()));
            for t in &column.tickets {
                out.push_str(&format!("  {} ({}) {}\n", t.id, t.priority, t.title));
            }
        }
        out.trim_end().to_string()
    }
}
