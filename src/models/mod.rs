//! Data models for Missionboard entities.
//!
//! This module defines the core data structures:
//! - `Ticket` - Units of work on the kanban board
//! - `Comment` - Discussion attached to a ticket
//! - `Message` - Direct or broadcast messages to agents
//! - `AgentProfile` - Named agents on the roster (see `agents`)

pub mod agents;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recipient sentinel meaning "every agent" - a broadcast.
pub const BROADCAST_RECIPIENT: &str = "all";

/// Ticket status, one per board column.
///
/// The declaration order is the fixed column order used for rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    Backlog,
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
}

impl TicketStatus {
    /// All statuses in fixed column order.
    pub const ALL: [TicketStatus; 5] = [
        TicketStatus::Backlog,
        TicketStatus::Todo,
        TicketStatus::InProgress,
        TicketStatus::Review,
        TicketStatus::Done,
    ];

    /// Wire/storage form of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Backlog => "backlog",
            TicketStatus::Todo => "todo",
            TicketStatus::InProgress => "in-progress",
            TicketStatus::Review => "review",
            TicketStatus::Done => "done",
        }
    }

    /// Column header shown on the board for this status.
    pub fn column_title(&self) -> &'static str {
        match self {
            TicketStatus::Backlog => "INBOX",
            TicketStatus::Todo => "ASSIGNED",
            TicketStatus::InProgress => "IN PROGRESS",
            TicketStatus::Review => "REVIEW",
            TicketStatus::Done => "DONE",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(TicketStatus::Backlog),
            "todo" => Ok(TicketStatus::Todo),
            "in-progress" => Ok(TicketStatus::InProgress),
            "review" => Ok(TicketStatus::Review),
            "done" => Ok(TicketStatus::Done),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown ticket status: {}",
                other
            ))),
        }
    }
}

/// Ticket priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Wire/storage form of the priority.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Priority::Critical),
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown priority: {}",
                other
            ))),
        }
    }
}

/// Whether a message targets one agent or the whole roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Chat,
    Broadcast,
}

impl MessageKind {
    /// Wire/storage form of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Chat => "chat",
            MessageKind::Broadcast => "broadcast",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(MessageKind::Chat),
            "broadcast" => Ok(MessageKind::Broadcast),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown message kind: {}",
                other
            ))),
        }
    }
}

/// A unit of work tracked on the board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// Human-assigned sequential identifier (e.g., "TASK-007")
    pub id: String,

    /// Ticket title
    pub title: String,

    /// Detailed description
    #[serde(default)]
    pub description: String,

    /// Current board column
    #[serde(default)]
    pub status: TicketStatus,

    /// Priority level
    #[serde(default)]
    pub priority: Priority,

    /// Assigned agent or person (free text)
    #[serde(default)]
    pub assignee: String,

    /// Labels for categorization, order-preserving
    #[serde(default)]
    pub labels: Vec<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp, refreshed on every mutating operation
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Create a new ticket with the given ID and title.
    pub fn new(id: String, title: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            description: String::new(),
            status: TicketStatus::default(),
            priority: Priority::default(),
            assignee: String::new(),
            labels: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A comment attached to a ticket. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier (UUID assigned by the backend)
    pub id: String,

    /// Parent ticket identifier
    pub ticket_id: String,

    /// Comment author (free text)
    pub author: String,

    /// Comment body
    pub content: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// A direct or broadcast message to agents. Immutable, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier (UUID assigned by the backend)
    pub id: String,

    /// Sender name
    pub sender: String,

    /// Recipient agent name, or `"all"` for a broadcast
    pub recipient: String,

    /// Message body
    pub content: String,

    /// Chat or broadcast
    #[serde(default)]
    pub message_type: MessageKind,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether this message is visible in a conversation with `agent`.
    ///
    /// Broadcasts appear in every per-agent conversation.
    pub fn concerns(&self, agent: &str) -> bool {
        self.recipient == agent || self.sender == agent || self.recipient == BROADCAST_RECIPIENT
    }
}

/// Fields for inserting a new ticket. The id is client-assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub assignee: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Fields for inserting a new comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub ticket_id: String,
    pub author: String,
    pub content: String,
}

/// Fields for inserting a new message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub sender: String,
    pub recipient: String,
    pub content: String,
    #[serde(default)]
    pub message_type: MessageKind,
}

/// Partial field set for updating a ticket. Absent fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl TicketPatch {
    /// A patch that only changes the board column.
    pub fn status(status: TicketStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Apply this patch to a ticket in place.
    pub fn apply_to(&self, ticket: &mut Ticket) {
        if let Some(title) = &self.title {
            ticket.title = title.clone();
        }
        if let Some(description) = &self.description {
            ticket.description = description.clone();
        }
        if let Some(status) = self.status {
            ticket.status = status;
        }
        if let Some(priority) = self.priority {
            ticket.priority = priority;
        }
        if let Some(assignee) = &self.assignee {
            ticket.assignee = assignee.clone();
        }
        if let Some(labels) = &self.labels {
            ticket.labels = labels.clone();
        }
    }
}
