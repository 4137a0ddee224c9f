//! CLI argument definitions for Missionboard.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::TicketStatus;

/// Missionboard - an agent mission-control board.
///
/// Tickets move across a kanban board, agents and the operator trade
/// messages, and `mb serve` exposes the whole thing over HTTP.
#[derive(Parser, Debug)]
#[command(name = "mb")]
#[command(author, version, about = "A ticket board and message log for agent squads", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Data directory holding the board database and config.
    /// Can also be set via MB_DATA_DIR environment variable.
    #[arg(short = 'd', long = "data-dir", global = true, env = "MB_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the board server (HTTP API + WebSocket push)
    Serve {
        /// Address to bind (overrides board.toml)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides board.toml)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ticket management commands
    Ticket {
        #[command(subcommand)]
        command: TicketCommands,
    },

    /// Add a comment to a ticket
    Comment {
        /// Ticket ID (e.g., TASK-007)
        ticket_id: String,

        /// Comment text
        content: String,
    },

    /// Message commands
    Msg {
        #[command(subcommand)]
        command: MsgCommands,
    },

    /// Show the agent roster
    Agents,

    /// Show the full board grouped by column
    Board,
}

/// Ticket subcommands
#[derive(Subcommand, Debug)]
pub enum TicketCommands {
    /// Create a new ticket (lands in the ASSIGNED column)
    Add {
        /// Ticket title
        title: String,

        /// Longer description
        #[arg(long, default_value = "")]
        description: String,

        /// Priority: critical, high, medium, or low
        #[arg(long, default_value = "medium")]
        priority: crate::models::Priority,

        /// Agent the ticket is assigned to
        #[arg(long, default_value = "")]
        assignee: String,

        /// Label (repeatable)
        #[arg(long = "label")]
        labels: Vec<String>,
    },

    /// Move a ticket to another column
    Move {
        /// Ticket ID
        id: String,

        /// Target column: backlog, todo, in-progress, review, or done
        status: TicketStatus,
    },

    /// List tickets, most recently updated first
    List {
        /// Only show tickets in this column
        #[arg(long)]
        status: Option<TicketStatus>,
    },

    /// Delete a ticket and its comments
    Delete {
        /// Ticket ID
        id: String,
    },
}

/// Message subcommands
#[derive(Subcommand, Debug)]
pub enum MsgCommands {
    /// Send a message to an agent, or to everyone
    Send {
        /// Recipient agent name, or "all" to broadcast to every agent
        recipient: String,

        /// Message text
        content: String,
    },

    /// Show the conversation with an agent (their messages, messages to
    /// them, and every broadcast)
    List {
        /// Agent name
        agent: String,
    },
}
