//! Shared types for the settlement pipeline.
//!
//! These types form the data model used across all modules: raw ledger
//! records on the way in, per-player balances in the middle, and
//! index-addressed payments on the way out.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Marker prefixed to every canonical login (`@name`).
pub const LOGIN_MARKER: char = '@';

// ---------------------------------------------------------------------------
// Raw ledger record
// ---------------------------------------------------------------------------

/// One ledger row: a single player's money movement for one hand/session
/// segment, exactly as the export reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTransaction {
    /// Nickname as it appears in the session log (not necessarily a login).
    pub player_alias: String,
    pub buy_in: Decimal,
    pub buy_out: Decimal,
    /// Chips still held when the log ended.
    pub stack: Decimal,
}

impl RawTransaction {
    pub fn new(player_alias: &str, buy_in: Decimal, buy_out: Decimal, stack: Decimal) -> Self {
        Self {
            player_alias: player_alias.to_string(),
            buy_in,
            buy_out,
            stack,
        }
    }

    /// Cash-out including any chips still on the table. A player holding
    /// chips at the end is credited as if they had cashed out. `None` when
    /// the sum does not fit in a `Decimal`.
    pub fn effective_buy_out(&self) -> Option<Decimal> {
        self.buy_out.checked_add(self.stack)
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A registered player. Field names on disk match the legacy `users.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "Login")]
    pub login: String,
    #[serde(rename = "Nicknames", default)]
    pub aliases: Vec<String>,
    #[serde(rename = "PaymentInfo", default)]
    pub payment_destination: String,
}

impl Identity {
    pub fn new(login: &str, aliases: &[&str], payment_destination: &str) -> Self {
        Self {
            login: normalize_login(login),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            payment_destination: payment_destination.to_string(),
        }
    }

    /// Login without its leading marker(s).
    pub fn bare_login(&self) -> &str {
        self.login.trim_start_matches(LOGIN_MARKER)
    }

    /// Whether `alias` refers to this identity.
    pub fn matches(&self, alias: &str) -> bool {
        self.bare_login() == alias || self.aliases.iter().any(|a| a == alias)
    }
}

/// Prefix a login with `@` unless it already carries one.
pub fn normalize_login(login: &str) -> String {
    if login.starts_with(LOGIN_MARKER) {
        login.to_string()
    } else {
        format!("{LOGIN_MARKER}{login}")
    }
}

// ---------------------------------------------------------------------------
// Balances and payments
// ---------------------------------------------------------------------------

/// Aggregated result for one identity within a single settlement run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerBalance {
    /// First alias seen for this identity in the batch.
    pub display_name: String,
    pub login: String,
    pub payment_destination: String,
    pub total_buy_in: Decimal,
    pub total_buy_out: Decimal,
    /// Outstanding amount: positive is owed to the player, negative is owed
    /// by the player. Driven to zero by settlement.
    pub net: Decimal,
}

impl PlayerBalance {
    /// Start an empty balance for `identity`, displayed as `alias`.
    pub fn open(alias: &str, identity: &Identity) -> Self {
        Self {
            display_name: alias.to_string(),
            login: identity.login.clone(),
            payment_destination: identity.payment_destination.clone(),
            total_buy_in: Decimal::ZERO,
            total_buy_out: Decimal::ZERO,
            net: Decimal::ZERO,
        }
    }

    /// Fold one ledger row into the running totals. Leaves the balance
    /// untouched if any total would overflow.
    pub fn record(&mut self, tx: &RawTransaction) -> Result<(), SettleError> {
        let out_of_range = || SettleError::AmountOutOfRange {
            alias: tx.player_alias.clone(),
        };

        let buy_in = self
            .total_buy_in
            .checked_add(tx.buy_in)
            .ok_or_else(out_of_range)?;
        let buy_out = tx
            .effective_buy_out()
            .and_then(|out| self.total_buy_out.checked_add(out))
            .ok_or_else(out_of_range)?;
        let net = buy_out.checked_sub(buy_in).ok_or_else(out_of_range)?;

        self.total_buy_in = buy_in;
        self.total_buy_out = buy_out;
        self.net = net;
        Ok(())
    }

    /// Session result, unaffected by settlement.
    pub fn result(&self) -> Decimal {
        self.total_buy_out - self.total_buy_in
    }

    pub fn is_debtor(&self) -> bool {
        self.net < Decimal::ZERO
    }

    pub fn is_creditor(&self) -> bool {
        self.net > Decimal::ZERO
    }
}

/// A directed transfer between two balances of the same [`Settlement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payment {
    /// Index of the paying balance.
    pub payer: usize,
    /// Index of the receiving balance.
    pub recipient: usize,
    pub amount: Decimal,
}

/// Output of the settlement engine: the settled balances (sorted by their
/// initial net, ascending) and every payment in creation order.
#[derive(Debug, Clone, Default)]
pub struct Settlement {
    pub balances: Vec<PlayerBalance>,
    pub payments: Vec<Payment>,
}

impl Settlement {
    /// Payments made by the balance at `index`, in creation order.
    pub fn outgoing(&self, index: usize) -> impl Iterator<Item = &Payment> + '_ {
        self.payments.iter().filter(move |p| p.payer == index)
    }

    pub fn payer(&self, payment: &Payment) -> &PlayerBalance {
        &self.balances[payment.payer]
    }

    pub fn recipient(&self, payment: &Payment) -> &PlayerBalance {
        &self.balances[payment.recipient]
    }

    /// Sum of everything transferred.
    pub fn total_transferred(&self) -> Decimal {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// Sum of nets left after settlement; zero for a closed session.
    pub fn residual(&self) -> Decimal {
        self.balances.iter().map(|b| b.net).sum()
    }

    pub fn find(&self, login: &str) -> Option<&PlayerBalance> {
        self.balances.iter().find(|b| b.login == login)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain errors surfaced to the chat user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettleError {
    #[error("unknown users found: {}", .0.join(", "))]
    UnresolvedAliases(Vec<String>),

    #[error("{}", missing_message(.0))]
    MissingParameters(Vec<&'static str>),

    #[error("user with login {0} already exists")]
    LoginTaken(String),

    #[error("this IN_GAME_NICKNAME is already occupied by {login}. Use another nickname")]
    NicknameTaken { login: String },

    #[error("no user found with login: {0}, check the input or use `/new` command")]
    UnknownLogin(String),

    #[error("nickname {alias} is already mapped to {login}")]
    AliasOwned { alias: String, login: String },

    #[error("not a game URL: {0}")]
    InvalidGameUrl(String),

    #[error("ledger amounts for {alias} are out of range")]
    AmountOutOfRange { alias: String },
}

fn missing_message(names: &[&'static str]) -> String {
    names
        .iter()
        .map(|name| format!("no {name} provided"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
