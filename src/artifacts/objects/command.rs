//! Edit commands stored inside a delta
//!
//! The commands are a private wire format of the object store. Each command
//! is a single token and a script joins the tokens with `$`:
//!
//! ```text
//! d<row>            delete the line at <row> of the base content
//! i<dest>-<k>       insert the k-th stored data line at <dest>
//! ```
//!
//! e.g. `d1$i1-0` replaces the second line. A script without commands
//! serializes to the empty string, and there is never a trailing delimiter.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

const COMMAND_DELIMITER: char = '$';
const DELETE_TAG: char = 'd';
const INSERT_TAG: char = 'i';
const INSERT_SEPARATOR: char = '-';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("malformed edit command '{0}'")]
    Malformed(String),
    #[error("cannot delete row {row}: only {len} lines remain after {deleted} deletions")]
    DeleteOutOfRange {
        row: usize,
        deleted: usize,
        len: usize,
    },
    #[error("cannot insert at {dest}: content has {len} lines")]
    InsertOutOfRange { dest: usize, len: usize },
    #[error("insert refers to data line {data_index} but only {available} were stored")]
    MissingData { data_index: usize, available: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Remove the line at `row` of the base content
    Delete { row: usize },
    /// Insert `data[data_index]` at `dest` of the post-deletion content
    Insert { dest: usize, data_index: usize },
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Delete { row } => write!(f, "{DELETE_TAG}{row}"),
            Command::Insert { dest, data_index } => {
                write!(f, "{INSERT_TAG}{dest}{INSERT_SEPARATOR}{data_index}")
            }
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let malformed = || CommandError::Malformed(token.to_string());

        if let Some(row) = token.strip_prefix(DELETE_TAG) {
            let row = parse_index(row).ok_or_else(malformed)?;
            return Ok(Command::Delete { row });
        }

        if let Some(insert) = token.strip_prefix(INSERT_TAG) {
            let (dest, data_index) = insert.split_once(INSERT_SEPARATOR).ok_or_else(malformed)?;
            let dest = parse_index(dest).ok_or_else(malformed)?;
            let data_index = parse_index(data_index).ok_or_else(malformed)?;
            return Ok(Command::Insert { dest, data_index });
        }

        Err(malformed())
    }
}

// `usize::from_str` accepts a leading '+', which is not part of the format
fn parse_index(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok()
}

/// Ordered list of edit commands
///
/// Deletions must appear in ascending row order and insertions in ascending
/// destination order; `Delta::apply` relies on both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommandScript(Vec<Command>);

impl CommandScript {
    pub fn new(commands: Vec<Command>) -> Self {
        CommandScript(commands)
    }

    pub fn push(&mut self, command: Command) {
        self.0.push(command);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn deletions(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().filter_map(|command| match command {
            Command::Delete { row } => Some(*row),
            Command::Insert { .. } => None,
        })
    }

    pub fn insertions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.iter().filter_map(|command| match command {
            Command::Insert { dest, data_index } => Some((*dest, *data_index)),
            Command::Delete { .. } => None,
        })
    }
}

impl Display for CommandScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, command) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{COMMAND_DELIMITER}")?;
            }
            write!(f, "{command}")?;
        }

        Ok(())
    }
}

impl FromStr for CommandScript {
    type Err = CommandError;

    fn from_str(script: &str) -> Result<Self, Self::Err> {
        if script.is_empty() {
            return Ok(CommandScript::default());
        }

        script
            .split(COMMAND_DELIMITER)
            .map(Command::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map(CommandScript)
    }
}

impl TryFrom<String> for CommandScript {
    type Error = CommandError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CommandScript> for String {
    fn from(script: CommandScript) -> Self {
        script.to_string()
    }
}
