// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Messages the picker surface posts back to the host.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::format::WireValue;
use crate::model::{Item, DEFAULT_STRENGTH};
use crate::ops::MergeMode;

/// Which picker page to open and which payload shape to expect back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PickerKind {
    #[serde(alias = "checkpoints")]
    Checkpoint,
    #[serde(alias = "loras")]
    Lora,
}

impl PickerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checkpoint => "checkpoint",
            Self::Lora => "lora",
        }
    }
}

impl fmt::Display for PickerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PickerKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "checkpoint" | "checkpoints" => Ok(Self::Checkpoint),
            "lora" | "loras" => Ok(Self::Lora),
            other => Err(ProtocolError::UnknownKind { kind: other.to_owned() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Select {
        #[serde(rename = "requestId")]
        request_id: String,
        payload: SelectPayload,
    },
    Cancel {
        #[serde(rename = "requestId")]
        request_id: String,
    },
    /// Untargeted close of a browsing (non-selector) surface.
    Close,
}

impl InboundMessage {
    pub fn from_json(raw: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(raw)
            .map_err(|err| ProtocolError::Malformed { reason: err.to_string() })
    }

    /// The `requestId` of a message that failed to parse, so its request can still be retired.
    pub fn salvage_request_id(raw: &str) -> Option<String> {
        let serde_json::Value::Object(object) = serde_json::from_str(raw).ok()? else {
            return None;
        };
        let request_id = object.get("requestId")?.as_str()?.trim();
        (!request_id.is_empty()).then(|| request_id.to_owned())
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Select { request_id, .. } | Self::Cancel { request_id } => Some(request_id),
            Self::Close => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectPayload {
    #[serde(alias = "checkpoints")]
    Checkpoint {
        #[serde(default)]
        value: String,
        #[serde(default)]
        label: Option<String>,
    },
    #[serde(alias = "loras")]
    Lora {
        #[serde(default, deserialize_with = "lenient_items")]
        #[schemars(with = "Vec<PickedItem>")]
        items: Vec<PickedItem>,
        #[serde(default, deserialize_with = "lenient_mode")]
        #[schemars(with = "Option<MergeMode>")]
        mode: Option<MergeMode>,
    },
}

impl SelectPayload {
    pub fn kind(&self) -> PickerKind {
        match self {
            Self::Checkpoint { .. } => PickerKind::Checkpoint,
            Self::Lora { .. } => PickerKind::Lora,
        }
    }
}

/// Keeps the object entries of a picked batch; anything else is dropped on its own.
fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<PickedItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Array(entries)) => entries,
        _ => return Ok(Vec::new()),
    };
    let total = entries.len();
    let items: Vec<PickedItem> = entries
        .into_iter()
        .filter(serde_json::Value::is_object)
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect();
    if items.len() < total {
        tracing::debug!(dropped = total - items.len(), "dropped non-object picked entries");
    }
    Ok(items)
}

/// Unknown or non-string modes read as absent, which leaves the request's own mode in charge.
fn lenient_mode<'de, D>(deserializer: D) -> Result<Option<MergeMode>, D::Error>
where
    D: Deserializer<'de>,
{
    let mode = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(mode.as_ref().and_then(serde_json::Value::as_str).and_then(|raw| raw.parse().ok()))
}

/// One asset chosen in the multi-select picker. Every member is optional and read leniently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PickedItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sm: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sc: Option<serde_json::Value>,
}

impl PickedItem {
    pub fn new(value: &str, label: &str, sm: f64, sc: f64) -> Self {
        Self {
            value: Some(value.into()),
            label: Some(label.into()),
            sm: Some(sm.into()),
            sc: Some(sc.into()),
        }
    }

    /// The item this entry selects, keyed by `value` (falling back to `label`). `None` when
    /// neither yields a usable key.
    pub fn to_item(&self) -> Option<Item> {
        let value = scalar_text(self.value.as_ref());
        let label = scalar_text(self.label.as_ref());
        let raw_key = value.clone().or_else(|| label.clone())?;
        let item = Item::new(&raw_key, label.or(value).as_deref()).with_strengths(
            scalar_number(self.sm.as_ref()).unwrap_or(DEFAULT_STRENGTH),
            scalar_number(self.sc.as_ref()).unwrap_or(DEFAULT_STRENGTH),
        );
        (!item.is_placeholder()).then_some(item)
    }
}

fn scalar(value: Option<&serde_json::Value>) -> Option<WireValue> {
    serde_json::from_value::<WireValue>(value?.clone()).ok()
}

fn scalar_text(value: Option<&serde_json::Value>) -> Option<String> {
    let scalar = scalar(value)?;
    let text = scalar.as_text().map(Cow::into_owned)?;
    (!text.trim().is_empty()).then_some(text)
}

fn scalar_number(value: Option<&serde_json::Value>) -> Option<f64> {
    scalar(value)?.as_number()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    Malformed { reason: String },
    UnknownKind { kind: String },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { reason } => write!(f, "malformed picker message: {reason}"),
            Self::UnknownKind { kind } => write!(f, "unknown picker kind '{kind}'"),
        }
    }
}

impl std::error::Error for ProtocolError {}
