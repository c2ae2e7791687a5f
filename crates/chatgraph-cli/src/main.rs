//! chatgraph command-line tool.
//!
//! Provides the `chatgraph` binary for working with a conversation graph
//! stored in a SQLite database: chat with it in the terminal, import a graph
//! from JSON, list nodes, print a session transcript, and audit the graph.
//!
//! Exit codes: 0 = success, 1 = usage or validation error, 2 = integrity
//! error (broken graph), 3 = I/O or storage error.

mod error;
mod import;
mod repl;

use std::io;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chatgraph_core::{Sender, SessionId, USER_LINE_PREFIX};
use chatgraph_engine::Admin;
use chatgraph_storage::{GraphStore, SqliteStore};

use crate::error::CliError;
use crate::import::ImportFile;

/// Conversation-graph chatbot tools.
#[derive(Parser)]
#[command(name = "chatgraph", about = "Conversation-graph chatbot tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Chat interactively. An empty line or end of input quits.
    Chat {
        /// Path to the graph database file.
        #[arg(short, long)]
        db: String,
    },

    /// List all nodes as JSON.
    Nodes {
        #[arg(short, long)]
        db: String,
    },

    /// Import nodes from a JSON file.
    Import {
        #[arg(short, long)]
        db: String,

        /// JSON file with a `nodes` array; nodes refer to each other by `ref`.
        #[arg(short, long)]
        file: String,

        /// Delete all existing nodes first.
        #[arg(long)]
        replace: bool,
    },

    /// Print the logged transcript of a session.
    Transcript {
        #[arg(short, long)]
        db: String,

        /// Session ID.
        #[arg(short, long)]
        session: i64,

        /// Print the raw transaction records as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check the graph for dangling responses, unreachable nodes and
    /// duplicated roles. Exits with 2 when problems are found.
    Audit {
        #[arg(short, long)]
        db: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Chat { db } => run_chat(&db),
        Commands::Nodes { db } => run_nodes(&db),
        Commands::Import { db, file, replace } => run_import(&db, &file, replace),
        Commands::Transcript { db, session, json } => run_transcript(&db, session, json),
        Commands::Audit { db } => run_audit(&db),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn open_store(db_path: &str) -> Result<SqliteStore, CliError> {
    SqliteStore::new(db_path).map_err(|e| {
        tracing::error!(path = %db_path, error = %e, "failed to open database");
        CliError::from(e)
    })
}

fn print_json(value: &impl serde::Serialize) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_chat(db_path: &str) -> Result<(), CliError> {
    let mut store = open_store(db_path)?;
    let stdin = io::stdin();
    let session = repl::run_chat(&mut store, stdin.lock(), io::stdout())?;
    eprintln!("session {}", session.id());
    Ok(())
}

fn run_nodes(db_path: &str) -> Result<(), CliError> {
    let mut store = open_store(db_path)?;
    let nodes = Admin::new(&mut store).list_nodes()?;
    print_json(&nodes)
}

fn run_import(db_path: &str, file_path: &str, replace: bool) -> Result<(), CliError> {
    let text = std::fs::read_to_string(file_path)?;
    let file = ImportFile::parse(&text)?;

    let mut store = open_store(db_path)?;
    if replace {
        Admin::new(&mut store).delete_all_nodes()?;
    }
    let ids = import::import_graph(&mut store, file)?;

    let mut refs: Vec<_> = ids.into_iter().collect();
    refs.sort_by_key(|(_, id)| *id);
    for (reference, id) in refs {
        println!("{}\t{}", id, reference);
    }
    Ok(())
}

fn run_transcript(db_path: &str, session: i64, json: bool) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let transactions = store.list_transactions(SessionId(session))?;
    if transactions.is_empty() {
        return Err(CliError::Validation(format!(
            "no transactions logged for session {}",
            session
        )));
    }
    if json {
        return print_json(&transactions);
    }
    for tx in &transactions {
        match tx.sender {
            Sender::User => println!("{}{}", USER_LINE_PREFIX, tx.message),
            Sender::Chatbot => println!("{}", tx.message),
        }
    }
    Ok(())
}

fn run_audit(db_path: &str) -> Result<(), CliError> {
    let mut store = open_store(db_path)?;
    let audit = Admin::new(&mut store).audit()?;
    print_json(&audit)?;
    if !audit.is_healthy() {
        return Err(CliError::Integrity(format!(
            "{} dangling response(s), {} duplicated role(s), first node {}",
            audit.dangling_edges.len(),
            audit.duplicate_roles.len(),
            if audit.first_node.is_some() { "present" } else { "missing" }
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAPH: &str = r#"{ "nodes": [
        { "ref": "hi", "message": "Hi", "responses": { "go": "bye" } },
        { "ref": "bye", "message": "Bye" }
    ] }"#;

    #[test]
    fn import_chat_and_transcript_share_a_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("graph.db");
        let db = db.to_str().unwrap();
        let file = dir.path().join("graph.json");
        std::fs::write(&file, GRAPH).unwrap();

        run_import(db, file.to_str().unwrap(), false).unwrap();
        run_import(db, file.to_str().unwrap(), true).unwrap();

        let mut store = open_store(db).unwrap();
        assert_eq!(store.list_nodes().unwrap().len(), 2);
        let session = repl::run_chat(&mut store, "go\n".as_bytes(), Vec::new()).unwrap();
        drop(store);

        let reopened = open_store(db).unwrap();
        let log = reopened.list_transactions(session.id()).unwrap();
        let messages: Vec<&str> = log.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, ["Hi", "go", "Bye", chatgraph_core::node::DEFAULT_END_MESSAGE]);

        run_transcript(db, session.id().0, false).unwrap();
        run_audit(db).unwrap();
        let err = run_transcript(db, session.id().0 + 1, true).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn second_import_without_replace_adds_normal_nodes() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("graph.db");
        let file = dir.path().join("graph.json");
        std::fs::write(&file, GRAPH).unwrap();
        let (db, file) = (db.to_str().unwrap(), file.to_str().unwrap());

        run_import(db, file, false).unwrap();
        // "hi" is untyped, so it only becomes First in the empty store.
        run_import(db, file, false).unwrap();
        let mut store = open_store(db).unwrap();
        let firsts = store.find_nodes_by_type(chatgraph_core::NodeType::First).unwrap();
        assert_eq!(firsts.len(), 1);
        assert_eq!(Admin::new(&mut store).list_nodes().unwrap().len(), 4);
    }
}
