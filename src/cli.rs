//! Command-line interface.

use crate::storage::{ContextStore, Record};
use crate::utils::error::{AppError, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

/// Encrypted context record store.
#[derive(Debug, Parser)]
#[command(name = "context-vault", version, about = "Encrypted, file-backed context record store")]
pub struct Cli {
    /// Configuration file (defaults to config/default and config/local)
    #[arg(short, long, env = "CONTEXT_VAULT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a record ({} when it does not exist)
    Get {
        /// Record id
        id: String,
    },

    /// Store a full record; the JSON must carry the identifying field
    Put {
        /// Record as a JSON object
        record: String,
    },

    /// Merge fields into a record, creating it if needed
    Update {
        /// Record id
        id: String,
        /// Fields to overwrite, as a JSON object
        fields: String,
    },

    /// Remove a record
    Delete {
        /// Record id
        id: String,
    },
}

/// Parse a command-line argument into a record.
pub fn parse_record(input: &str) -> Result<Record> {
    match serde_json::from_str::<Value>(input) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(other) => Err(AppError::Input(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(AppError::Input(format!("invalid JSON: {}", e))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Run one command against `store`. Returns the JSON to print, if any.
pub async fn execute(store: &dyn ContextStore, command: Command) -> Result<Option<Value>> {
    let output = match command {
        Command::Get { id } => Some(Value::Object(store.get(&id).await?)),
        Command::Put { record } => {
            let record = parse_record(&record)?;
            Some(Value::Object(store.put(record).await?))
        }
        Command::Update { id, fields } => {
            let fields = parse_record(&fields)?;
            Some(Value::Object(store.update(&id, fields).await?))
        }
        Command::Delete { id } => {
            store.delete(&id).await?;
            None
        }
    };

    Ok(output)
}
