//! Chat command front-end.
//!
//! Parses `/calc`, `/new`, `/map` and `/help` messages and executes them
//! against the ledger source and the player directory. Transport lives in
//! [`telegram`]; everything here is plain text in, plain text out.

pub mod telegram;

use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::directory::Directory;
use crate::engine::report::{self, ReportFormat};
use crate::engine::settle_session;
use crate::ledger::LedgerSource;
use crate::types::SettleError;

const CALC_USAGE: &str = "Please specify url `/calc URL`";
const NEW_USAGE: &str = "some of the parameters are missing. Example of command: /new IN_GAME_NICKNAME LOGIN PAYMENT_INFO";
const MAP_USAGE: &str = "some of the parameters are missing. Example of command: /map IN_GAME_NICKNAME LOGIN";
const UNRESOLVED_HINT: &str = "Please use `/map` or `/new` commands and relaunch command `/calc`";

const HELP: &str = "\
/calc URL [DATE]: settle a PokerNow game, DATE defaults to today
/new IN_GAME_NICKNAME LOGIN PAYMENT_INFO: register a player
/map IN_GAME_NICKNAME LOGIN: add another nickname to a registered player
/help: show this message";

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Calc { url: String, date: Option<String> },
    New { nickname: String, login: String, payment_info: String },
    Map { nickname: String, login: String },
    Help,
}

impl Command {
    /// Parse a chat message.
    ///
    /// `None` for ordinary text and unknown commands; `Some(Err(usage))`
    /// when a known command lacks arguments.
    pub fn parse(text: &str) -> Option<Result<Self, &'static str>> {
        let mut parts = text.split_whitespace();
        let head = parts.next()?;
        if !head.starts_with('/') {
            return None;
        }
        // Group chats address commands as `/calc@botname`.
        let name = head.split('@').next().unwrap_or(head);
        let args: Vec<&str> = parts.collect();

        let parsed = match name {
            "/calc" => match args.as_slice() {
                [url, rest @ ..] => Ok(Command::Calc {
                    url: url.to_string(),
                    date: rest.first().map(|d| d.to_string()),
                }),
                [] => Err(CALC_USAGE),
            },
            "/new" => match args.as_slice() {
                [nickname, login, payment_info, ..] => Ok(Command::New {
                    nickname: nickname.to_string(),
                    login: login.to_string(),
                    payment_info: payment_info.to_string(),
                }),
                _ => Err(NEW_USAGE),
            },
            "/map" => match args.as_slice() {
                [nickname, login, ..] => Ok(Command::Map {
                    nickname: nickname.to_string(),
                    login: login.to_string(),
                }),
                _ => Err(MAP_USAGE),
            },
            "/help" | "/start" => Ok(Command::Help),
            other => {
                debug!(command = other, "Ignoring unknown command");
                return None;
            }
        };
        Some(parsed)
    }
}

/// Text to send back to the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Send with Markdown parse mode (error replies, as before).
    pub markdown: bool,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), markdown: false }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), markdown: true }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Executes commands. Each call reloads the directory from disk, so every
/// settlement starts from a fresh snapshot.
pub struct Dispatcher {
    ledger: Box<dyn LedgerSource>,
    directory_path: PathBuf,
    format: ReportFormat,
}

impl Dispatcher {
    pub fn new(ledger: Box<dyn LedgerSource>, directory_path: PathBuf, format: ReportFormat) -> Self {
        Self { ledger, directory_path, format }
    }

    /// Parse and run a chat message. `None` when there is nothing to answer.
    pub async fn handle_text(&self, text: &str) -> Option<Reply> {
        match Command::parse(text)? {
            Ok(command) => Some(self.handle(command).await),
            Err(usage) => Some(Reply::error(usage)),
        }
    }

    pub async fn handle(&self, command: Command) -> Reply {
        match self.execute(command).await {
            Ok(text) => Reply::plain(text),
            Err(e) => match e.downcast_ref::<SettleError>() {
                Some(SettleError::UnresolvedAliases(_)) => {
                    Reply::error(format!("{e}\n\n{UNRESOLVED_HINT}"))
                }
                _ => Reply::error(e.to_string()),
            },
        }
    }

    async fn execute(&self, command: Command) -> Result<String> {
        match command {
            Command::Calc { url, date } => {
                let records = self.ledger.fetch(&url).await?;
                let directory = Directory::load(&self.directory_path)?;
                let settlement = settle_session(&records, &directory)?;
                let date = date.unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string());
                Ok(report::render(&settlement, &date, &self.format))
            }
            Command::New { nickname, login, payment_info } => {
                let mut directory = Directory::load(&self.directory_path)?;
                directory.register(&nickname, &login, &payment_info)?;
                directory.save(&self.directory_path)?;
                Ok("Successfully created new user.".to_string())
            }
            Command::Map { nickname, login } => {
                let mut directory = Directory::load(&self.directory_path)?;
                let owner = directory.map_alias(&nickname, &login)?.login.clone();
                directory.save(&self.directory_path)?;
                info!(login = %owner, nickname = %nickname, "Nickname mapped");
                Ok(format!("Successfully mapped {nickname} to {owner}."))
            }
            Command::Help => Ok(HELP.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
