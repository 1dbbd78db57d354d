//! Ledger aggregator.
//!
//! Folds raw ledger rows into one balance per registered identity. Every
//! alias in the batch must resolve through the directory; otherwise the
//! whole batch is rejected with the full list of unknown aliases.

use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::directory::IdentityLookup;
use crate::types::{PlayerBalance, RawTransaction, SettleError};

/// Aggregate `records` into per-identity balances, in first-seen order.
pub fn aggregate<L>(records: &[RawTransaction], lookup: &L) -> Result<Vec<PlayerBalance>, SettleError>
where
    L: IdentityLookup + ?Sized,
{
    let mut balances: Vec<PlayerBalance> = Vec::new();
    let mut index_by_login: HashMap<String, usize> = HashMap::new();
    let mut unresolved: Vec<String> = Vec::new();

    for tx in records {
        let Some(identity) = lookup.resolve(&tx.player_alias) else {
            if !unresolved.contains(&tx.player_alias) {
                unresolved.push(tx.player_alias.clone());
            }
            continue;
        };

        let idx = *index_by_login.entry(identity.login.clone()).or_insert_with(|| {
            balances.push(PlayerBalance::open(&tx.player_alias, identity));
            balances.len() - 1
        });
        balances[idx].record(tx)?;
    }

    if !unresolved.is_empty() {
        warn!(aliases = ?unresolved, "Unresolved aliases in ledger");
        return Err(SettleError::UnresolvedAliases(unresolved));
    }

    check_totals(&balances)?;

    for b in &balances {
        debug!(
            login = %b.login,
            buy_in = %b.total_buy_in,
            buy_out = %b.total_buy_out,
            net = %b.net,
            "Aggregated player"
        );
    }

    Ok(balances)
}

/// Credits and debts must each sum within `Decimal` range, so settlement
/// totals and residuals never overflow.
fn check_totals(balances: &[PlayerBalance]) -> Result<(), SettleError> {
    let mut credits = Decimal::ZERO;
    let mut debts = Decimal::ZERO;

    for b in balances {
        let total = if b.is_creditor() { &mut credits } else { &mut debts };
        *total = total.checked_add(b.net).ok_or_else(|| SettleError::AmountOutOfRange {
            alias: b.display_name.clone(),
        })?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
