// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Merge policy for selections coming back from the picker.
//!
//! `replace` rebuilds the list from the incoming batch; `append` extends the current list with
//! keys it does not hold yet. Both collapse duplicates to their first occurrence and silently drop
//! keyless items.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{Item, SelectionList};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    #[default]
    Replace,
    Append,
}

impl MergeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Append => "append",
        }
    }

    /// `append` wins over `replace` when a request and its result disagree.
    pub fn combine(self, other: Option<MergeMode>) -> MergeMode {
        match (self, other) {
            (Self::Append, _) | (_, Some(Self::Append)) => Self::Append,
            _ => Self::Replace,
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMergeModeError {
    raw: String,
}

impl fmt::Display for ParseMergeModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown merge mode '{}' (expected replace|append)", self.raw)
    }
}

impl std::error::Error for ParseMergeModeError {}

impl FromStr for MergeMode {
    type Err = ParseMergeModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "append" => Ok(Self::Append),
            _ => Err(ParseMergeModeError { raw: s.to_owned() }),
        }
    }
}

/// Produces the list that results from committing `incoming` onto `current` under `mode`.
pub fn merge(current: &SelectionList, incoming: &[Item], mode: MergeMode) -> SelectionList {
    let mut merged = match mode {
        MergeMode::Replace => SelectionList::new(),
        MergeMode::Append => current.clone(),
    };

    let mut dropped = 0usize;
    let mut skipped = 0usize;
    for item in incoming {
        if item.is_placeholder() {
            dropped += 1;
            continue;
        }
        if merged.contains_key(item.key()) {
            skipped += 1;
            continue;
        }
        merged.upsert(item.clone());
    }

    if dropped > 0 || skipped > 0 {
        tracing::debug!(%mode, dropped, skipped, "merge ignored incoming items");
    }

    merged.ensure_placeholder();
    merged
}

#[cfg(test)]
mod tests;
