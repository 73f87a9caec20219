// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Engine configuration, read from an optional JSON file.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8789;
pub const DEFAULT_MAX_SLOTS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PickerConfig {
    /// Host serving the picker pages.
    pub host: String,
    pub port: u16,
    /// Highest number of slots the executor reads.
    pub max_slots: usize,
    /// Pending picker requests older than this are dropped by `sweep_expired`. Unset keeps them
    /// until answered.
    pub pending_ttl_secs: Option<u64>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            max_slots: DEFAULT_MAX_SLOTS,
            pending_ttl_secs: None,
        }
    }
}

impl PickerConfig {
    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(ConfigError::Io { path: path.to_owned(), reason: err.to_string() });
            }
        };
        Self::from_json(&raw)
            .map_err(|reason| ConfigError::Invalid { path: path.to_owned(), reason })
    }

    pub fn from_json(raw: &str) -> Result<Self, String> {
        let config: Self = serde_json::from_str(raw).map_err(|err| err.to_string())?;
        if config.host.trim().is_empty() {
            return Err("host must not be empty".to_owned());
        }
        Ok(config)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host.trim(), self.port)
    }

    pub fn pending_ttl(&self) -> Option<Duration> {
        self.pending_ttl_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io { path: PathBuf, reason: String },
    Invalid { path: PathBuf, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, reason } => {
                write!(f, "failed to read config {}: {reason}", path.display())
            }
            Self::Invalid { path, reason } => {
                write!(f, "invalid config {}: {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}
