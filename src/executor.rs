// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The executor's reading of persisted wire fields: which LoRAs to apply, in which order, at
//! which strengths.

use std::borrow::Cow;

use crate::config::DEFAULT_MAX_SLOTS;
use crate::format::wire::LegacyRow;
use crate::format::{group_fields, FieldGroup, WireFields, WireValue};
use crate::model::DEFAULT_STRENGTH;

/// Slots the executor declares by default.
pub const MAX_SLOTS: usize = DEFAULT_MAX_SLOTS;
pub const BACKEND_STRENGTH_MIN: f64 = -100.0;
pub const BACKEND_STRENGTH_MAX: f64 = 100.0;

/// One LoRA the executor applies, in slot order.
#[derive(Debug, Clone, PartialEq)]
pub struct LoraApplication {
    pub index: usize,
    pub key: String,
    pub strength_model: f64,
    pub strength_clip: f64,
}

/// Plans the LoRA applications for slots `0..max_slots`, ascending.
///
/// A slot is skipped when its key is blank, `none` or `null`, when it is disabled, or when both
/// strengths are zero. Keys are passed through trimmed but otherwise verbatim.
pub fn plan_slots(fields: &WireFields, max_slots: usize) -> Vec<LoraApplication> {
    let groups = group_fields(fields.iter().map(|(name, value)| (name.as_str(), value)));
    groups
        .range(..max_slots)
        .filter_map(|(&index, group)| plan_slot(index, group))
        .collect()
}

fn plan_slot(index: usize, group: &FieldGroup) -> Option<LoraApplication> {
    let raw = group.key.as_ref().and_then(WireValue::as_text).unwrap_or(Cow::Borrowed(""));
    let mut key = raw.trim().to_owned();
    let mut strength_model = strength(group.strength_model.as_ref());
    let mut strength_clip = strength(group.strength_clip.as_ref());
    let mut enabled = group.on.as_ref().and_then(WireValue::as_flag).unwrap_or(true);

    if let Some(row) = LegacyRow::parse(&key) {
        key = row.key.map(|key| key.trim().to_owned()).unwrap_or_default();
        strength_model = row.strength_model.unwrap_or(strength_model);
        strength_clip = row.strength_clip.unwrap_or(strength_clip);
        enabled = row.enabled.unwrap_or(enabled);
    }

    if is_empty_key(&key) {
        return None;
    }
    if !enabled || (strength_model == 0.0 && strength_clip == 0.0) {
        tracing::debug!(index, key = %key, enabled, "skipping inactive slot");
        return None;
    }

    Some(LoraApplication {
        index,
        key,
        strength_model: clamp_backend(strength_model),
        strength_clip: clamp_backend(strength_clip),
    })
}

fn strength(value: Option<&WireValue>) -> f64 {
    value.and_then(WireValue::as_number).unwrap_or(DEFAULT_STRENGTH)
}

fn is_empty_key(key: &str) -> bool {
    key.is_empty() || key.eq_ignore_ascii_case("none") || key.eq_ignore_ascii_case("null")
}

fn clamp_backend(value: f64) -> f64 {
    value.clamp(BACKEND_STRENGTH_MIN, BACKEND_STRENGTH_MAX)
}
