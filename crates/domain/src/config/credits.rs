use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Credits
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditsConfig {
    /// Requests are refused (402) below this balance.
    #[serde(default = "d_10")]
    pub min_balance: i64,
    /// Flat charge when the model call fails.
    #[serde(default = "d_1")]
    pub failure_charge: u64,
    /// Balance given to a user whose account is created on first lookup.
    #[serde(default)]
    pub initial_balance: i64,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            min_balance: 10,
            failure_charge: 1,
            initial_balance: 0,
        }
    }
}

fn d_10() -> i64 {
    10
}
fn d_1() -> u64 {
    1
}
