//! PokerNow ledger download.
//!
//! Every PokerNow game exposes its ledger as a CSV next to the game page:
//! `https://www.pokernow.club/games/<id>/ledger_<id>.csv`.
//! Auth: none; the game URL itself is the capability.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::{ledger_url, parse_ledger, LedgerSource};
use crate::types::RawTransaction;

const DEFAULT_USER_AGENT: &str = "potsettle/0.1.0 (poker-settlement-bot)";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client for PokerNow ledger exports.
pub struct PokerNowClient {
    http: Client,
}

impl PokerNowClient {
    /// Create a client with the given request timeout and user agent.
    pub fn new(timeout_secs: Option<u64>, user_agent: Option<&str>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)))
            .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
            .build()
            .context("Failed to build HTTP client for PokerNow")?;

        Ok(Self { http })
    }
}

#[async_trait]
impl LedgerSource for PokerNowClient {
    async fn fetch(&self, game_url: &str) -> Result<Vec<RawTransaction>> {
        let url = ledger_url(game_url)?;
        debug!(url = %url, "Downloading PokerNow ledger");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("PokerNow ledger request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("PokerNow ledger error {status}: {body}");
        }

        let body = resp
            .text()
            .await
            .context("Failed to read PokerNow ledger body")?;

        let rows = parse_ledger(&body)
            .with_context(|| format!("Failed to parse ledger from {url}"))?;

        info!(url = %url, rows = rows.len(), "Ledger downloaded");
        Ok(rows)
    }
}
