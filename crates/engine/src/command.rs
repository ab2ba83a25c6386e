//! Messages from the popup UI and their acknowledgement.
//!
//! The wire shape is a JSON object tagged on `action`:
//!
//! ```json
//! { "action": "toggleAutoNumbering", "enabled": true }
//! { "action": "applyNumbering" }
//! { "action": "removeNumbering" }
//! ```
//!
//! Every command is acknowledged with `{ "status": "success" }` within the
//! same turn; outcomes of the triggered work are only logged.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    ToggleAutoNumbering { enabled: bool },
    ApplyNumbering,
    RemoveNumbering,
}

impl Command {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandStatus {
    #[default]
    Success,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub status: CommandStatus,
}

impl CommandResponse {
    pub fn success() -> Self {
        Self {
            status: CommandStatus::Success,
        }
    }
}
