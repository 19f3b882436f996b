use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawConfig {
    #[serde(default)]
    pub settings: RawSettings,
    #[serde(default)]
    pub services: BTreeMap<String, RawService>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawSettings {
    pub state_file: Option<String>,
    pub log_dir: Option<String>,
    pub start_grace_ms: Option<u64>,
    pub graceful_timeout_ms: Option<u64>,
    pub restart_pause_ms: Option<u64>,
    pub restart_all_pause_ms: Option<u64>,
    pub lock_timeout_ms: Option<u64>,
    pub graceful_signal: Option<String>,
    pub forceful_signal: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawService {
    pub path: String,
    pub interpreter: Option<String>,
    pub args: Option<Vec<String>>,
    pub cwd: Option<String>,
    pub env: Option<HashMap<String, String>>,
}
