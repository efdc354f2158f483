//! Interactive command session.
//!
//! Reads one command per line and applies it to a router:
//!
//! ```text
//! append <key> <message...>
//! read <key> <start> <end>
//! reset <key>
//! reset-all
//! count <key>
//! capacity <key>
//! keys
//! help
//! quit
//! ```
//!
//! Failures are reported on the output and the session keeps going.

use partlog_core::{LogResult, Router};
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, info};

const USAGE: &str = "\
commands:
  append <key> <message...>   append a message
  read <key> <start> <end>    read messages start..=end
  reset <key>                 reset one partition
  reset-all                   reset every partition
  count <key>                 number of stored messages
  capacity <key>              partition capacity
  keys                        list partition keys
  help                        show this text
  quit                        exit";

/// A parsed session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Append a message to a partition.
    Append {
        /// Partition key.
        key: String,
        /// Message text (rest of the line).
        message: String,
    },
    /// Read an inclusive range of messages.
    Read {
        /// Partition key.
        key: String,
        /// First index.
        start: usize,
        /// Last index.
        end: usize,
    },
    /// Reset one partition.
    Reset {
        /// Partition key.
        key: String,
    },
    /// Reset every partition.
    ResetAll,
    /// Show the message count of a partition.
    Count {
        /// Partition key.
        key: String,
    },
    /// Show the capacity of a partition.
    Capacity {
        /// Partition key.
        key: String,
    },
    /// List partition keys.
    Keys,
    /// Show usage.
    Help,
    /// End the session.
    Quit,
}

/// Errors raised while parsing a command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Empty line.
    #[error("empty command")]
    Empty,
    /// Unknown command word.
    #[error("invalid command: {0}")]
    Unknown(String),
    /// A required argument is missing.
    #[error("missing argument <{argument}> for {command}")]
    MissingArgument {
        /// Command word.
        command: &'static str,
        /// Argument name.
        argument: &'static str,
    },
    /// An index argument is not a number.
    #[error("invalid index {0:?}")]
    InvalidIndex(String),
    /// Extra arguments after a complete command.
    #[error("unexpected argument {0:?}")]
    Unexpected(String),
}

/// Splits off the first whitespace-delimited word.
fn next_word(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    match input.find(char::is_whitespace) {
        Some(at) => Some((&input[..at], &input[at..])),
        None => Some((input, "")),
    }
}

fn required<'a>(
    rest: &mut &'a str,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, ParseError> {
    let (word, tail) = next_word(rest).ok_or(ParseError::MissingArgument { command, argument })?;
    *rest = tail;
    Ok(word)
}

fn index(word: &str) -> Result<usize, ParseError> {
    word.parse()
        .map_err(|_| ParseError::InvalidIndex(word.to_string()))
}

fn finish(rest: &str) -> Result<(), ParseError> {
    match next_word(rest) {
        Some((word, _)) => Err(ParseError::Unexpected(word.to_string())),
        None => Ok(()),
    }
}

impl Command {
    /// Parses one input line.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] describing why the line is not a command.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let (word, mut rest) = next_word(line).ok_or(ParseError::Empty)?;

        let command = match word {
            "append" => {
                let key = required(&mut rest, "append", "key")?.to_string();
                let message = rest.trim_start().trim_end_matches(['\r', '\n']);
                if message.is_empty() {
                    return Err(ParseError::MissingArgument {
                        command: "append",
                        argument: "message",
                    });
                }
                return Ok(Self::Append {
                    key,
                    message: message.to_string(),
                });
            }
            "read" => Self::Read {
                key: required(&mut rest, "read", "key")?.to_string(),
                start: index(required(&mut rest, "read", "start")?)?,
                end: index(required(&mut rest, "read", "end")?)?,
            },
            "reset" => Self::Reset {
                key: required(&mut rest, "reset", "key")?.to_string(),
            },
            "reset-all" => Self::ResetAll,
            "count" => Self::Count {
                key: required(&mut rest, "count", "key")?.to_string(),
            },
            "capacity" => Self::Capacity {
                key: required(&mut rest, "capacity", "key")?.to_string(),
            },
            "keys" => Self::Keys,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };

        finish(rest)?;
        Ok(command)
    }

    /// Applies the command to `router`, returning the lines to print.
    ///
    /// # Errors
    ///
    /// Returns the router's error unchanged.
    pub fn execute(&self, router: &Router<String>) -> LogResult<Vec<String>> {
        let ok = || vec!["ok".to_string()];
        match self {
            Self::Append { key, message } => router.append_message(key, message).map(|()| ok()),
            Self::Read { key, start, end } => router.read_messages(key, *start, *end),
            Self::Reset { key } => router.reset_one(key).map(|()| ok()),
            Self::ResetAll => router.reset_all().map(|()| ok()),
            Self::Count { key } => router.message_count(key).map(|n| vec![n.to_string()]),
            Self::Capacity { key } => router.capacity(key).map(|n| vec![n.to_string()]),
            Self::Keys => Ok(router.keys()),
            Self::Help => Ok(vec![USAGE.to_string()]),
            Self::Quit => Ok(Vec::new()),
        }
    }
}

/// Runs a session until `quit` or end of input.
///
/// # Errors
///
/// Returns an error only if reading input or writing output fails.
pub fn run(router: &Router<String>, input: impl BufRead, mut out: impl Write) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => {
                debug!(?command, "applying command");
                match command.execute(router) {
                    Ok(lines) => {
                        for line in lines {
                            writeln!(out, "{line}")?;
                        }
                    }
                    Err(err) => writeln!(out, "error: {err}")?,
                }
            }
            Err(err) => writeln!(out, "{err}")?,
        }
        out.flush()?;
    }

    info!("session ended");
    Ok(())
}

/// Closes every partition when a session ends, by `quit`, end of input or
/// an interrupt. Buffered lines of durable partitions are flushed.
///
/// # Errors
///
/// Returns the first partition close failure.
pub fn shutdown(router: &Router<String>, reason: &str) -> LogResult<()> {
    info!(reason, partitions = router.len(), "closing partitions");
    router.close()
}
