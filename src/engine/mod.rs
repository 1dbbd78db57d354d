//! Core engine: ledger rows → balances → settlement plan → report.

pub mod aggregator;
pub mod settlement;
pub mod report;

use tracing::info;

use crate::directory::IdentityLookup;
use crate::types::{RawTransaction, SettleError, Settlement};

/// Aggregate and settle one session on a fresh set of balances.
pub fn settle_session<L>(records: &[RawTransaction], lookup: &L) -> Result<Settlement, SettleError>
where
    L: IdentityLookup + ?Sized,
{
    let balances = aggregator::aggregate(records, lookup)?;
    let settlement = settlement::settle(balances);

    info!(
        records = records.len(),
        players = settlement.balances.len(),
        payments = settlement.payments.len(),
        transferred = %settlement.total_transferred(),
        "Session settled"
    );

    Ok(settlement)
}
