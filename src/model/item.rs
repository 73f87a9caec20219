// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::key::ItemKey;

pub const DEFAULT_STRENGTH: f64 = 1.0;
pub const STRENGTH_MIN: f64 = -10.0;
pub const STRENGTH_MAX: f64 = 10.0;
pub const PLACEHOLDER_LABEL: &str = "None";

/// Clamps a UI strength into `[STRENGTH_MIN, STRENGTH_MAX]`; NaN/inf fall back to the default.
pub fn clamp_strength(value: f64) -> f64 {
    if !value.is_finite() {
        return DEFAULT_STRENGTH;
    }
    value.clamp(STRENGTH_MIN, STRENGTH_MAX)
}

/// One selected asset within a multi-select control.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    key: ItemKey,
    label: String,
    strength_model: f64,
    strength_clip: f64,
    enabled: bool,
}

impl Item {
    /// Builds an enabled item with default strengths. `label` falls back to the normalized key.
    pub fn new(raw_key: &str, label: Option<&str>) -> Self {
        let key = ItemKey::new(raw_key);
        let label = match label.map(str::trim).filter(|label| !label.is_empty()) {
            Some(label) => label.to_owned(),
            None => key.as_str().to_owned(),
        };
        Self {
            key,
            label,
            strength_model: DEFAULT_STRENGTH,
            strength_clip: DEFAULT_STRENGTH,
            enabled: true,
        }
    }

    /// The "no selection yet" row.
    pub fn placeholder() -> Self {
        Self {
            key: ItemKey::placeholder(),
            label: PLACEHOLDER_LABEL.to_owned(),
            strength_model: DEFAULT_STRENGTH,
            strength_clip: DEFAULT_STRENGTH,
            enabled: true,
        }
    }

    pub fn with_strengths(mut self, strength_model: f64, strength_clip: f64) -> Self {
        self.set_strengths(strength_model, strength_clip);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn key(&self) -> &ItemKey {
        &self.key
    }

    pub fn is_placeholder(&self) -> bool {
        self.key.is_placeholder()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn strength_model(&self) -> f64 {
        self.strength_model
    }

    pub fn strength_clip(&self) -> f64 {
        self.strength_clip
    }

    pub fn set_strengths(&mut self, strength_model: f64, strength_clip: f64) {
        self.strength_model = clamp_strength(strength_model);
        self.strength_clip = clamp_strength(strength_clip);
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Copies everything but the key from `other`.
    pub(crate) fn absorb(&mut self, other: &Item) {
        self.label = other.label.clone();
        self.strength_model = other.strength_model;
        self.strength_clip = other.strength_clip;
        self.enabled = other.enabled;
    }
}
