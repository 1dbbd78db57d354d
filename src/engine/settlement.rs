//! Settlement engine: greedy two-pointer debt settlement.
//!
//! Balances are sorted ascending by net, so the biggest debtor sits at the
//! front and the biggest creditor at the back. Each debtor is swept against
//! the creditors from the back inward until the debt is cleared. The result
//! is deterministic and small, though not always the theoretical minimum
//! number of transfers.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::types::{Payment, PlayerBalance, Settlement};

/// Settle `balances` into a list of debtor → creditor payments.
///
/// Never fails. For a closed session (nets summing to zero) every balance
/// ends at exactly zero; otherwise the leftover stays on the balances.
pub fn settle(mut balances: Vec<PlayerBalance>) -> Settlement {
    // Stable: equal nets keep their aggregation order.
    balances.sort_by(|a, b| a.net.cmp(&b.net));

    let mut payments = Vec::new();
    let n = balances.len();

    for i in 0..n {
        if !balances[i].is_debtor() {
            break;
        }

        for j in (i + 1..n).rev() {
            let debt = balances[i].net;
            let claim = balances[j].net;

            if claim.is_zero() {
                continue;
            }
            if debt.is_zero() || claim < Decimal::ZERO {
                break;
            }

            let amount = if debt + claim >= Decimal::ZERO {
                // The creditor absorbs the whole remaining debt.
                balances[j].net = claim + debt;
                balances[i].net = Decimal::ZERO;
                debt.abs()
            } else {
                balances[i].net = debt + claim;
                balances[j].net = Decimal::ZERO;
                claim
            };

            debug!(
                payer = %balances[i].login,
                recipient = %balances[j].login,
                amount = %amount,
                "Payment scheduled"
            );
            payments.push(Payment { payer: i, recipient: j, amount });
        }
    }

    let settlement = Settlement { balances, payments };

    let residual = settlement.residual();
    if !residual.is_zero() {
        warn!(
            residual = %residual,
            "Ledger does not balance; leftover left unsettled"
        );
    }

    settlement
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
