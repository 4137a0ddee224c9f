//! Missionboard CLI - a ticket board and message log for agent squads.

use clap::Parser;
use missionboard::cli::{Cli, Commands, MsgCommands, TicketCommands};
use missionboard::commands::{Output, Session};
use missionboard::config::{self, BoardConfig};
use missionboard::dispatch::TicketDraft;
use std::path::Path;
use std::process;

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    // Data directory: --data-dir flag > MB_DATA_DIR env > platform default
    let data_dir = match config::resolve_data_dir(cli.data_dir) {
        Ok(dir) => dir,
        Err(e) => fail(&e, human),
    };

    if let Err(e) = run_command(cli.command, &data_dir, human) {
        fail(&e, human);
    }
}

fn fail(e: &missionboard::Error, human: bool) -> ! {
    if human {
        eprintln!("Error: {}", e);
    } else {
        eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
    }
    process::exit(1);
}

fn run_command(command: Commands, data_dir: &Path, human: bool) -> Result<(), missionboard::Error> {
    match command {
        Commands::Serve { host, port } => return run_server(data_dir, host, port),

        Commands::Ticket { command } => {
            let session = Session::open(data_dir)?;
            match command {
                TicketCommands::Add {
                    title,
                    description,
                    priority,
                    assignee,
                    labels,
                } => {
                    let draft = TicketDraft {
                        title,
                        description,
                        priority,
                        assignee,
                        labels,
                    };
                    output(&session.ticket_add(draft)?, human);
                }
                TicketCommands::Move { id, status } => {
                    output(&session.ticket_move(&id, status)?, human);
                }
                TicketCommands::List { status } => {
                    output(&session.ticket_list(status)?, human);
                }
                TicketCommands::Delete { id } => {
                    output(&session.ticket_delete(&id)?, human);
                }
            }
        }

        Commands::Comment { ticket_id, content } => {
            let session = Session::open(data_dir)?;
            output(&session.comment(&ticket_id, &content)?, human);
        }

        Commands::Msg { command } => {
            let session = Session::open(data_dir)?;
            match command {
                MsgCommands::Send { recipient, content } => {
                    output(&session.msg_send(&recipient, &content)?, human);
                }
                MsgCommands::List { agent } => {
                    output(&session.msg_list(&agent)?, human);
                }
            }
        }

        Commands::Agents => {
            let session = Session::open(data_dir)?;
            output(&session.agents(), human);
        }

        Commands::Board => {
            let session = Session::open(data_dir)?;
            output(&session.board()?, human);
        }
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

/// Run the board server until interrupted.
fn run_server(
    data_dir: &Path,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), missionboard::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut board_config = BoardConfig::load(data_dir)?;
    if let Some(host) = host {
        board_config.host = host;
    }
    if let Some(port) = port {
        board_config.port = port;
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| missionboard::Error::Other(format!("Failed to create runtime: {}", e)))?
        .block_on(async {
            missionboard::server::start_server(board_config, data_dir)
                .await
                .map_err(|e| missionboard::Error::Other(format!("Server error: {}", e)))
        })
}
