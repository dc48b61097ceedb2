use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Agent loop
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "d_model")]
    pub model: String,
    #[serde(default = "d_temperature")]
    pub temperature: f32,
    /// Hard cap on model round-trips per turn.
    #[serde(default = "d_6")]
    pub max_rounds: usize,
    /// Prior conversation messages sent with each turn.
    #[serde(default = "d_10")]
    pub history_window: usize,
    /// IANA timezone used for "today" in the prompt and for weekday matching.
    #[serde(default = "d_timezone")]
    pub timezone: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: d_model(),
            temperature: d_temperature(),
            max_rounds: 6,
            history_window: 10,
            timezone: d_timezone(),
        }
    }
}

impl AgentConfig {
    /// The configured timezone, or `None` if the name is not a known zone.
    pub fn tz(&self) -> Option<chrono_tz::Tz> {
        self.timezone.parse().ok()
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_model() -> String {
    "gpt-4o-mini".into()
}
fn d_temperature() -> f32 {
    0.2
}
fn d_6() -> usize {
    6
}
fn d_10() -> usize {
    10
}
fn d_timezone() -> String {
    "UTC".into()
}
