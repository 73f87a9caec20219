// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Flat, positional wire format consumed by the executor.
//!
//! A list of `n` active items becomes `lora_{i}`, `lora_{i}_on`, `lora_{i}_strength_model` and
//! `lora_{i}_strength_clip` for contiguous `i` in `0..n`. Placeholder rows never reach the wire.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{Item, SelectionList, DEFAULT_STRENGTH};

pub const FIELD_PREFIX: &str = "lora_";

/// Scalar carried by one wire field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum WireValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl WireValue {
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Text(text) => Some(Cow::Borrowed(text)),
            Self::Number(number) => Some(Cow::Owned(number.to_string())),
            Self::Null | Self::Bool(_) => None,
        }
    }

    /// Lenient boolean reading: numbers are truthy when non-zero, common spellings are accepted.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            Self::Number(number) => Some(*number != 0.0),
            Self::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Some(true),
                "false" | "0" | "off" | "no" | "" => Some(false),
                _ => None,
            },
            Self::Null => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) if number.is_finite() => Some(*number),
            Self::Text(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for WireValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for WireValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for WireValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

pub type WireFields = BTreeMap<String, WireValue>;

/// Which sub-field of a slot a wire field carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldRole {
    Key,
    On,
    StrengthModel,
    StrengthClip,
}

impl FieldRole {
    pub const ALL: [FieldRole; 4] =
        [FieldRole::Key, FieldRole::On, FieldRole::StrengthModel, FieldRole::StrengthClip];

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Key => "",
            Self::On => "_on",
            Self::StrengthModel => "_strength_model",
            Self::StrengthClip => "_strength_clip",
        }
    }

    fn from_suffix(suffix: Option<&str>) -> Option<Self> {
        match suffix {
            None => Some(Self::Key),
            Some("on") => Some(Self::On),
            Some("strength_model") => Some(Self::StrengthModel),
            Some("strength_clip") => Some(Self::StrengthClip),
            Some(_) => None,
        }
    }
}

fn field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^lora_(\d+)(?:_(on|strength_model|strength_clip))?$")
            .expect("wire field pattern is valid")
    })
}

pub fn field_name(index: usize, role: FieldRole) -> String {
    let mut buffer = itoa::Buffer::new();
    let digits = buffer.format(index);
    let suffix = role.suffix();
    let mut name = String::with_capacity(FIELD_PREFIX.len() + digits.len() + suffix.len());
    name.push_str(FIELD_PREFIX);
    name.push_str(digits);
    name.push_str(suffix);
    name
}

/// Splits `lora_{i}[_suffix]` into its slot index and role; anything else is `None`.
pub fn parse_field_name(name: &str) -> Option<(usize, FieldRole)> {
    let captures = field_pattern().captures(name)?;
    let index = captures.get(1)?.as_str().parse::<usize>().ok()?;
    let role = FieldRole::from_suffix(captures.get(2).map(|m| m.as_str()))?;
    Some((index, role))
}

/// Raw sub-fields collected for one slot index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldGroup {
    pub key: Option<WireValue>,
    pub on: Option<WireValue>,
    pub strength_model: Option<WireValue>,
    pub strength_clip: Option<WireValue>,
    pub label: Option<String>,
}

impl FieldGroup {
    pub fn set(&mut self, role: FieldRole, value: WireValue) {
        let slot = match role {
            FieldRole::Key => &mut self.key,
            FieldRole::On => &mut self.on,
            FieldRole::StrengthModel => &mut self.strength_model,
            FieldRole::StrengthClip => &mut self.strength_clip,
        };
        *slot = Some(value);
    }

    /// Builds the item for this slot, defaulting every missing or unreadable sub-field.
    ///
    /// A key holding a JSON object (`{"key", "label", "sm", "sc", "on"}`) is read as a legacy
    /// row value whose members override the flat sub-fields.
    pub fn to_item(&self) -> Item {
        let raw_key = self.key.as_ref().and_then(WireValue::as_text).unwrap_or_default();
        let mut strength_model = number_or_default(self.strength_model.as_ref());
        let mut strength_clip = number_or_default(self.strength_clip.as_ref());
        let mut enabled = self.on.as_ref().and_then(WireValue::as_flag).unwrap_or(true);
        let mut label = self.label.clone();
        let mut key = raw_key.into_owned();

        if let Some(row) = LegacyRow::parse(&key) {
            key = row.key.unwrap_or_default();
            label = row.label.or(label);
            strength_model = row.strength_model.unwrap_or(strength_model);
            strength_clip = row.strength_clip.unwrap_or(strength_clip);
            enabled = row.enabled.unwrap_or(enabled);
        }

        Item::new(&key, label.as_deref())
            .with_strengths(strength_model, strength_clip)
            .with_enabled(enabled)
    }
}

fn number_or_default(value: Option<&WireValue>) -> f64 {
    value.and_then(WireValue::as_number).unwrap_or(DEFAULT_STRENGTH)
}

/// Object-valued slot written by the older single-widget row.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct LegacyRow {
    pub key: Option<String>,
    pub label: Option<String>,
    pub strength_model: Option<f64>,
    pub strength_clip: Option<f64>,
    pub enabled: Option<bool>,
}

impl LegacyRow {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        if !raw.trim_start().starts_with('{') {
            return None;
        }
        let serde_json::Value::Object(object) = serde_json::from_str(raw).ok()? else {
            return None;
        };
        let member = |name: &str| {
            let value = object.get(name)?.clone();
            serde_json::from_value::<WireValue>(value).ok()
        };
        Some(Self {
            key: member("key").and_then(|v| v.as_text().map(Cow::into_owned)),
            label: member("label").and_then(|v| v.as_text().map(Cow::into_owned)),
            strength_model: member("sm").and_then(|v| v.as_number()),
            strength_clip: member("sc").and_then(|v| v.as_number()),
            enabled: member("on").and_then(|v| v.as_flag()),
        })
    }
}

/// Groups wire-shaped `(name, value)` pairs by slot index, ascending. Unrelated names are ignored.
pub fn group_fields<'a, I>(fields: I) -> BTreeMap<usize, FieldGroup>
where
    I: IntoIterator<Item = (&'a str, &'a WireValue)>,
{
    let mut groups = BTreeMap::<usize, FieldGroup>::new();
    for (name, value) in fields {
        let Some((index, role)) = parse_field_name(name) else {
            continue;
        };
        groups.entry(index).or_default().set(role, value.clone());
    }
    groups
}

/// The four wire fields for one active item at slot `index`.
pub fn item_fields(index: usize, item: &Item) -> [(String, WireValue); 4] {
    [
        (field_name(index, FieldRole::Key), WireValue::Text(item.key().as_str().to_owned())),
        (field_name(index, FieldRole::On), WireValue::Bool(item.enabled())),
        (field_name(index, FieldRole::StrengthModel), WireValue::Number(item.strength_model())),
        (field_name(index, FieldRole::StrengthClip), WireValue::Number(item.strength_clip())),
    ]
}

/// Serializes the active items of `list`, re-packing indices over skipped placeholders.
pub fn encode(list: &SelectionList) -> WireFields {
    let mut fields = WireFields::new();
    let active = list.items().iter().filter(|item| !item.is_placeholder());
    for (index, item) in active.enumerate() {
        fields.extend(item_fields(index, item));
    }
    fields
}

/// Parses wire fields back into a list. Never fails: incomplete groups take defaults, keyless
/// groups are dropped, and an empty result becomes the single placeholder row.
pub fn decode(fields: &WireFields) -> SelectionList {
    let groups = group_fields(fields.iter().map(|(name, value)| (name.as_str(), value)));
    let mut list = SelectionList::new();
    for group in groups.values() {
        let item = group.to_item();
        if item.is_placeholder() {
            continue;
        }
        list.upsert(item);
    }
    list.ensure_placeholder();
    list
}
