//! End-to-end settlement flows: chat command → ledger → directory →
//! settlement → report, with the network replaced by [`MockLedger`].

mod mock_ledger;

use std::path::{Path, PathBuf};

use mock_ledger::{MockLedger, FIXTURE_CSV, FIXTURE_GAME};
use potsettle::bot::{Dispatcher, Reply};
use potsettle::directory::Directory;
use potsettle::engine::report::ReportFormat;
use potsettle::engine::settle_session;
use potsettle::ledger::parse_ledger;
use potsettle::types::{Identity, SettleError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const FIXTURE_REPORT: &str = "#table\nDate: 2024-02-18\n\n\
lucas -> scorsese 3100 руб на номер 789\n\
lucas -> tarantino 1900 руб на номер 456\n\
@lucas";

/// Temp file removed on drop.
struct TempDirectory(PathBuf);

impl TempDirectory {
    fn new() -> Self {
        let mut p = std::env::temp_dir();
        p.push(format!("potsettle_it_users_{}.json", uuid::Uuid::new_v4()));
        Self(p)
    }

    fn seeded() -> Self {
        let tmp = Self::new();
        Directory::new(vec![
            Identity::new("@lucas", &["lucas", "lucasfilm"], "123"),
            Identity::new("@tarantino", &["tarantino", "mr.feetlover"], "456"),
            Identity::new("@scorsese", &["scorsese"], "789"),
        ])
        .save(tmp.path())
        .unwrap();
        tmp
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempDirectory {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

fn dispatcher(ledger: &MockLedger, dir: &TempDirectory) -> Dispatcher {
    Dispatcher::new(
        Box::new(ledger.clone()),
        dir.path().to_path_buf(),
        ReportFormat::default(),
    )
}

#[tokio::test]
async fn test_calc_fixture_end_to_end() {
    let ledger = MockLedger::with_fixture();
    let dir = TempDirectory::seeded();

    let reply = dispatcher(&ledger, &dir)
        .handle_text(&format!("/calc {FIXTURE_GAME} 2024-02-18"))
        .await
        .unwrap();

    assert_eq!(reply, Reply::plain(FIXTURE_REPORT));
    assert_eq!(ledger.fetched(), vec![FIXTURE_GAME.to_string()]);
}

#[tokio::test]
async fn test_unknown_nickname_then_map_then_calc() {
    let ledger = MockLedger::with_fixture();
    let dir = TempDirectory::new();
    Directory::new(vec![
        Identity::new("@lucas", &["lucas"], "123"),
        Identity::new("@tarantino", &["tarantino"], "456"),
        Identity::new("@scorsese", &["scorsese"], "789"),
    ])
    .save(dir.path())
    .unwrap();
    let d = dispatcher(&ledger, &dir);
    let calc = format!("/calc {FIXTURE_GAME} 2024-02-18");

    let reply = d.handle_text(&calc).await.unwrap();
    assert!(reply.markdown);
    assert!(reply.text.starts_with("unknown users found: lucasfilm\n\n"));

    let reply = d.handle_text("/map lucasfilm lucas").await.unwrap();
    assert_eq!(reply, Reply::plain("Successfully mapped lucasfilm to @lucas."));

    let reply = d.handle_text(&calc).await.unwrap();
    assert_eq!(reply, Reply::plain(FIXTURE_REPORT));
}

#[tokio::test]
async fn test_register_players_from_empty_directory() {
    let ledger = MockLedger::new();
    ledger.serve(
        "https://www.pokernow.club/games/duel",
        "player_nickname,buy_in,buy_out,stack\nkubrick,500,0,0\nnolan,500,250,750\n",
    );
    let dir = TempDirectory::new();
    let d = dispatcher(&ledger, &dir);

    for cmd in ["/new kubrick stanley 111", "/new nolan chris 222"] {
        let reply = d.handle_text(cmd).await.unwrap();
        assert_eq!(reply, Reply::plain("Successfully created new user."));
    }

    let reply = d
        .handle_text("/calc https://www.pokernow.club/games/duel 2024-03-01")
        .await
        .unwrap();
    assert_eq!(
        reply.text,
        "#table\nDate: 2024-03-01\n\nkubrick -> nolan 500 руб на номер 222\n@stanley"
    );
}

#[tokio::test]
async fn test_missing_game_reports_download_error() {
    let ledger = MockLedger::new();
    let dir = TempDirectory::seeded();
    let reply = dispatcher(&ledger, &dir)
        .handle_text("/calc https://www.pokernow.club/games/nope")
        .await
        .unwrap();
    assert!(reply.markdown);
    assert!(reply.text.contains("404"));
}

#[tokio::test]
async fn test_out_of_range_ledger_is_reported_not_fatal() {
    let ledger = MockLedger::with_fixture();
    ledger.serve(
        "https://www.pokernow.club/games/whale",
        "player_nickname,buy_in,buy_out,stack\n\
         lucas,0,79228162514264337593543950335,79228162514264337593543950335\n",
    );
    let dir = TempDirectory::seeded();
    let d = dispatcher(&ledger, &dir);

    let reply = d
        .handle_text("/calc https://www.pokernow.club/games/whale")
        .await
        .unwrap();
    assert_eq!(reply, Reply::error("ledger amounts for lucas are out of range"));

    // The bot keeps answering afterwards.
    let reply = d
        .handle_text(&format!("/calc {FIXTURE_GAME} 2024-02-18"))
        .await
        .unwrap();
    assert_eq!(reply, Reply::plain(FIXTURE_REPORT));
}

#[tokio::test]
async fn test_new_rejects_nickname_matching_existing_login() {
    let ledger = MockLedger::new();
    let dir = TempDirectory::new();
    let d = dispatcher(&ledger, &dir);

    for cmd in ["/new kubrick nolan 111", "/new spielberg steven 333"] {
        let reply = d.handle_text(cmd).await.unwrap();
        assert_eq!(reply, Reply::plain("Successfully created new user."));
    }

    let reply = d.handle_text("/new nolan chris 222").await.unwrap();
    assert!(reply.text.contains("already occupied by @nolan"), "{}", reply.text);

    let reply = d.handle_text("/map nolan steven").await.unwrap();
    assert!(reply.text.contains("already mapped to @nolan"), "{}", reply.text);

    let saved = Directory::load(dir.path()).unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved.by_login("steven").unwrap().aliases, vec!["spielberg"]);
}

#[test]
fn test_settlement_properties_on_fixture() {
    let records = parse_ledger(FIXTURE_CSV).unwrap();
    let dir = Directory::load(TempDirectory::seeded().path()).unwrap();

    let s = settle_session(&records, &dir).unwrap();

    let nets_before: Decimal = s.balances.iter().map(|b| b.result()).sum();
    assert_eq!(nets_before, Decimal::ZERO);
    assert!(s.balances.iter().all(|b| b.net.is_zero()));
    assert_eq!(s.total_transferred(), dec!(5000));
    for p in &s.payments {
        assert!(p.amount > Decimal::ZERO);
        assert_ne!(s.payer(p).login, s.recipient(p).login);
        assert!(s.payer(p).result() < Decimal::ZERO);
        assert!(s.recipient(p).result() > Decimal::ZERO);
    }
}

#[test]
fn test_unresolved_alias_among_many_resolved() {
    let mut csv = FIXTURE_CSV.to_string();
    csv.push_str("kubrick,Gh78,2024-02-18T18:00:00.000Z,,100,0,0,-100\n");
    let records = parse_ledger(&csv).unwrap();
    let dir = Directory::load(TempDirectory::seeded().path()).unwrap();

    let err = settle_session(&records, &dir).unwrap_err();
    assert_eq!(err, SettleError::UnresolvedAliases(vec!["kubrick".to_string()]));
}
