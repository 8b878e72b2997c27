use serde::{Deserialize, Serialize};

/// Body of `/system/config` on the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub auto_save_drive: bool,
}
