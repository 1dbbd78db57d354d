//! Mock ledger source for integration testing.
//!
//! Serves fixed CSV exports per game URL and records every fetch, all
//! in-memory with no network access.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use potsettle::ledger::{parse_ledger, LedgerSource};
use potsettle::types::RawTransaction;

pub const FIXTURE_GAME: &str = "https://www.pokernow.club/games/UniQueID";

/// PokerNow-style export of the reference session.
pub const FIXTURE_CSV: &str = "\
player_nickname,player_id,session_start_at,session_end_at,buy_in,buy_out,stack,net
lucas,Ab12,2024-02-18T18:00:00.000Z,2024-02-18T19:00:00.000Z,1000,0,0,-1000
lucas,Ab12,2024-02-18T19:00:00.000Z,2024-02-18T20:00:00.000Z,2000,0,0,-2000
lucasfilm,Zz99,2024-02-18T20:00:00.000Z,2024-02-18T22:00:00.000Z,2000,0,0,-2000
scorsese,Cd34,2024-02-18T18:00:00.000Z,2024-02-18T23:00:00.000Z,1000,4100,0,3100
tarantino,Ef56,2024-02-18T18:00:00.000Z,,1000,,2900,1900
";

/// Ledger source backed by a map of game URL → CSV text.
#[derive(Clone, Default)]
pub struct MockLedger {
    exports: Arc<Mutex<HashMap<String, String>>>,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock serving the reference session at [`FIXTURE_GAME`].
    pub fn with_fixture() -> Self {
        let ledger = Self::new();
        ledger.serve(FIXTURE_GAME, FIXTURE_CSV);
        ledger
    }

    pub fn serve(&self, game_url: &str, csv: &str) {
        self.exports
            .lock()
            .unwrap()
            .insert(game_url.to_string(), csv.to_string());
    }

    /// Every URL fetched so far, in order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerSource for MockLedger {
    async fn fetch(&self, game_url: &str) -> Result<Vec<RawTransaction>> {
        self.fetched.lock().unwrap().push(game_url.to_string());
        let csv = self
            .exports
            .lock()
            .unwrap()
            .get(game_url)
            .cloned()
            .ok_or_else(|| anyhow!("PokerNow ledger error 404 Not Found: {game_url}"))?;
        parse_ledger(&csv)
    }
}
