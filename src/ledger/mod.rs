//! Session ledger sources.
//!
//! Defines the `LedgerSource` trait and the CSV parser shared by the
//! implementations. A ledger is the per-player export of one poker session:
//! - PokerNow: HTTP download of `ledger_<game>.csv` next to the game URL

pub mod pokernow;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

use crate::types::{RawTransaction, SettleError};

/// Abstraction over places a session ledger can come from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Fetch and parse every ledger row for the game at `game_url`.
    async fn fetch(&self, game_url: &str) -> Result<Vec<RawTransaction>>;
}

// ---------------------------------------------------------------------------
// URL helpers
// ---------------------------------------------------------------------------

/// Game id: the last non-empty path segment of the game URL.
pub fn game_id(game_url: &str) -> Result<&str, SettleError> {
    let trimmed = game_url.trim().trim_end_matches('/');
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| SettleError::InvalidGameUrl(game_url.to_string()))?;

    match rest.rsplit_once('/') {
        Some((host, id)) if !host.is_empty() && !id.is_empty() => Ok(id),
        _ => Err(SettleError::InvalidGameUrl(game_url.to_string())),
    }
}

/// `https://host/games/<id>` → `https://host/games/<id>/ledger_<id>.csv`
pub fn ledger_url(game_url: &str) -> Result<String, SettleError> {
    let id = game_id(game_url)?;
    let base = game_url.trim().trim_end_matches('/');
    Ok(format!("{base}/ledger_{id}.csv"))
}

// ---------------------------------------------------------------------------
// CSV parsing
// ---------------------------------------------------------------------------

const COL_NICKNAME: &str = "player_nickname";
const COL_BUY_IN: &str = "buy_in";
const COL_BUY_OUT: &str = "buy_out";
const COL_STACK: &str = "stack";

/// Parse a ledger export. Columns are located by header name; columns other
/// than nickname, buy-in, buy-out and stack are ignored. Empty amounts are
/// zero. Nicknames are kept byte-exact; only headers and amounts are trimmed.
pub fn parse_ledger(text: &str) -> Result<Vec<RawTransaction>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader.headers().context("Failed to read ledger header")?.clone();
    let nickname = column(&headers, COL_NICKNAME)?;
    let buy_in = column(&headers, COL_BUY_IN)?;
    let buy_out = column(&headers, COL_BUY_OUT)?;
    let stack = column(&headers, COL_STACK)?;

    let mut transactions = Vec::new();
    for (row, result) in reader.records().enumerate() {
        // +2: 1-indexed plus the header row
        let line = row + 2;
        let record = result.with_context(|| format!("Failed to parse ledger line {line}"))?;

        let alias = record.get(nickname).unwrap_or("");
        if alias.is_empty() {
            bail!("Ledger line {line}: empty {COL_NICKNAME}");
        }

        transactions.push(RawTransaction {
            player_alias: alias.to_string(),
            buy_in: amount(&record, buy_in, COL_BUY_IN, line)?,
            buy_out: amount(&record, buy_out, COL_BUY_OUT, line)?,
            stack: amount(&record, stack, COL_STACK, line)?,
        });
    }

    debug!(rows = transactions.len(), "Ledger parsed");
    Ok(transactions)
}

fn column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .with_context(|| format!("Ledger is missing the {name} column"))
}

fn amount(record: &StringRecord, idx: usize, name: &str, line: usize) -> Result<Decimal> {
    match record.get(idx).unwrap_or("").trim() {
        "" => Ok(Decimal::ZERO),
        raw => Decimal::from_str(raw)
            .with_context(|| format!("Ledger line {line}: invalid {name} value {raw:?}")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
