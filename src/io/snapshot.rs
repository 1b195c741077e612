use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Account;

/// Transportable form of the full account collection. Stable enough to
/// round-trip through export and import, nested transaction logs included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub accounts: Vec<Account>,
}

impl Snapshot {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            accounts,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }
}

/// Outcome of an import: how many accounts were adopted, how many skipped,
/// and the non-fatal warnings collected along the way.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub warnings: Vec<String>,
}
