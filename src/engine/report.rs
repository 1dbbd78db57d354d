//! Chat report rendering.
//!
//! Turns a [`Settlement`] into the text posted back to the chat. The layout
//! is consumed by people and by scripts that scrape the channel, so it must
//! stay byte-for-byte stable:
//!
//! ```text
//! #table
//! Date: 2024-02-18
//!
//! lucas -> scorsese 3100 руб на номер 789
//! lucas -> tarantino 1900 руб на номер 456
//! @lucas
//! ```

use serde::Deserialize;

use crate::types::Settlement;

const BLOCK_SEPARATOR: &str = "\n---------------\n";

/// Wording used in each payment line.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportFormat {
    /// Unit word printed after every amount.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Words printed before the recipient's payment destination.
    #[serde(default = "default_destination_label")]
    pub destination_label: String,
}

fn default_currency() -> String {
    "руб".to_string()
}

fn default_destination_label() -> String {
    "на номер".to_string()
}

impl Default for ReportFormat {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            destination_label: default_destination_label(),
        }
    }
}

/// Render the full report: header, then one block per paying player.
pub fn render(settlement: &Settlement, date: &str, format: &ReportFormat) -> String {
    let blocks: Vec<String> = (0..settlement.balances.len())
        .filter_map(|i| payer_block(settlement, i, format))
        .collect();

    format!("#table\nDate: {date}\n\n{}", blocks.join(BLOCK_SEPARATOR))
}

/// Lines for every payment made by balance `index`, closed by its login.
/// `None` when the player pays nobody.
fn payer_block(settlement: &Settlement, index: usize, format: &ReportFormat) -> Option<String> {
    let payer = &settlement.balances[index];
    let mut block = String::new();

    for payment in settlement.outgoing(index) {
        let recipient = settlement.recipient(payment);
        block.push_str(&format!(
            "{} -> {} {} {} {} {}\n",
            payer.display_name,
            recipient.display_name,
            payment.amount.normalize(),
            format.currency,
            format.destination_label,
            recipient.payment_destination,
        ));
    }

    if block.is_empty() {
        return None;
    }
    block.push_str(&payer.login);
    Some(block)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
