// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Launch parameters for the external picker surface.
//!
//! The current selection travels to the picker as a preselection hint so it can pre-mark chosen
//! assets (and keep their strengths when the picker is re-opened).

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::protocol::PickerKind;
use crate::config::PickerConfig;
use crate::model::{normalize_key, ItemKey, RequestId, SelectionList};

pub const REQUEST_ID_PARAM: &str = "requestId";
pub const SELECTED_PARAM: &str = "selected";
pub const SELECTED_DATA_PARAM: &str = "selectedData";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PreselectedItem {
    pub key: String,
    pub label: String,
    pub sm: f64,
    pub sc: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Preselection {
    #[default]
    Nothing,
    Keys(Vec<ItemKey>),
    Items(Vec<PreselectedItem>),
}

impl Preselection {
    /// Bare normalized keys of the active entries.
    pub fn keys(list: &SelectionList) -> Self {
        let keys = list.active_keys();
        if keys.is_empty() {
            return Self::Nothing;
        }
        Self::Keys(keys)
    }

    /// Active entries with label and strengths, so a re-opened picker keeps them.
    pub fn items(list: &SelectionList) -> Self {
        let items: Vec<_> = list
            .items()
            .iter()
            .filter(|item| !item.is_placeholder())
            .map(|item| PreselectedItem {
                key: item.key().as_str().to_owned(),
                label: item.label().to_owned(),
                sm: item.strength_model(),
                sc: item.strength_clip(),
            })
            .collect();
        if items.is_empty() {
            return Self::Nothing;
        }
        Self::Items(items)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Nothing => true,
            Self::Keys(keys) => keys.is_empty(),
            Self::Items(items) => items.is_empty(),
        }
    }

    /// Whether the asset with identity `raw` should show as already selected.
    pub fn matches(&self, raw: &str) -> bool {
        let wanted = normalize_key(raw);
        if wanted.is_empty() {
            return false;
        }
        match self {
            Self::Nothing => false,
            Self::Keys(keys) => keys.iter().any(|key| key.as_str() == wanted),
            Self::Items(items) => items.iter().any(|item| normalize_key(&item.key) == wanted),
        }
    }

    /// Query parameter carrying this hint: URL-safe base64 of its JSON form.
    pub fn query_param(&self) -> Option<(&'static str, String)> {
        let (name, json) = match self {
            Self::Nothing => return None,
            Self::Keys(keys) => {
                let keys: Vec<&str> = keys.iter().map(ItemKey::as_str).collect();
                (SELECTED_PARAM, serde_json::to_vec(&keys))
            }
            Self::Items(items) => (SELECTED_DATA_PARAM, serde_json::to_vec(items)),
        };
        match json {
            Ok(json) => Some((name, URL_SAFE_NO_PAD.encode(json))),
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode preselection hint");
                None
            }
        }
    }

    /// Inverse of [`Preselection::query_param`], as read by the picker page.
    pub fn from_query(name: &str, value: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(value.trim()).ok()?;
        match name {
            SELECTED_PARAM => {
                let keys: Vec<String> = serde_json::from_slice(&bytes).ok()?;
                let keys: Vec<ItemKey> = keys
                    .iter()
                    .map(|key| ItemKey::new(key))
                    .filter(|key| !key.is_placeholder())
                    .collect();
                Some(Self::Keys(keys))
            }
            SELECTED_DATA_PARAM => {
                let items: Vec<PreselectedItem> = serde_json::from_slice(&bytes).ok()?;
                Some(Self::Items(items))
            }
            _ => None,
        }
    }
}

/// Everything the picker needs to open for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchParams {
    pub request_id: RequestId,
    pub kind: PickerKind,
    pub preselection: Preselection,
}

impl LaunchParams {
    pub fn page(&self) -> &'static str {
        match self.kind {
            PickerKind::Lora => "selector-lora.html",
            PickerKind::Checkpoint => "selector-checkpoint.html",
        }
    }

    /// `{base}/web/{page}?requestId=..[&selected=..|&selectedData=..]`. Single-select pages get
    /// no preselection.
    pub fn to_url(&self, config: &PickerConfig) -> String {
        let mut url = format!(
            "{}/web/{}?{REQUEST_ID_PARAM}={}",
            config.base_url(),
            self.page(),
            self.request_id
        );
        if self.kind == PickerKind::Lora {
            if let Some((name, value)) = self.preselection.query_param() {
                url.push('&');
                url.push_str(name);
                url.push('=');
                url.push_str(&value);
            }
        }
        url
    }
}

/// The out-of-context picker, as seen by the correlator.
pub trait PickerSurface {
    fn open(&mut self, params: &LaunchParams) -> Result<(), LaunchError>;

    /// Closes the picker opened for `request_id`, if it is still showing.
    fn close(&mut self, request_id: &RequestId);

    /// Closes a plain browsing surface that is not tied to any request.
    fn close_browser(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    UnknownControl { control_id: String },
    Surface { reason: String },
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownControl { control_id } => write!(f, "no control with id {control_id}"),
            Self::Surface { reason } => write!(f, "picker surface failed to open: {reason}"),
        }
    }
}

impl std::error::Error for LaunchError {}
