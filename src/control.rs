// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Host controls: the node-side owners of a selection, wired to their proxies and wire fields.

use std::collections::BTreeMap;

use crate::format::{decode, encode, WireFields, WireValue};
use crate::host::{scan, sync, sync_proxy, Proxy, ProxyHost, SyncReport};
use crate::model::{ControlId, Item, SelectionList};
use crate::ops::{merge, MergeMode};
use crate::picker::{PickerKind, Preselection};

/// Wire field holding a single-select checkpoint.
pub const CHECKPOINT_FIELD: &str = "ckpt_name";

/// A multi-select LoRA control: the selection list plus the host proxies that display it.
pub struct LoraControl {
    list: SelectionList,
    host: Box<dyn ProxyHost>,
}

impl LoraControl {
    /// Adopts whatever the host already shows, falling back to the placeholder row.
    pub fn new(mut host: Box<dyn ProxyHost>) -> Self {
        let mut list = scan(host.as_ref());
        list.ensure_placeholder();
        sync(host.as_mut(), &mut list);
        Self { list, host }
    }

    pub fn list(&self) -> &SelectionList {
        &self.list
    }

    pub fn host(&self) -> &dyn ProxyHost {
        self.host.as_ref()
    }

    pub fn host_mut(&mut self) -> &mut dyn ProxyHost {
        self.host.as_mut()
    }

    pub fn on_serialize(&self) -> WireFields {
        encode(&self.list)
    }

    /// Loads persisted wire fields, replacing the current selection.
    pub fn on_configure(&mut self, fields: &WireFields) -> SyncReport {
        self.list = decode(fields);
        self.sync()
    }

    pub fn apply_merge(&mut self, incoming: &[Item], mode: MergeMode) -> SyncReport {
        self.list = merge(&self.list, incoming, mode);
        self.sync()
    }

    pub fn remove_at(&mut self, index: usize) -> SyncReport {
        self.list.remove_at(index);
        self.list.ensure_placeholder();
        self.sync()
    }

    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> SyncReport {
        self.list.set_enabled(index, enabled);
        self.sync()
    }

    pub fn set_strengths(
        &mut self,
        index: usize,
        strength_model: f64,
        strength_clip: f64,
    ) -> SyncReport {
        self.list.set_strengths(index, strength_model, strength_clip);
        self.sync()
    }

    /// Re-reads the list from the host's proxies, e.g. after the host edited them directly.
    pub fn refresh_from_host(&mut self) {
        self.list = scan(self.host.as_ref());
        self.list.ensure_placeholder();
    }

    pub fn sync(&mut self) -> SyncReport {
        sync(self.host.as_mut(), &mut self.list)
    }

    /// Hint for re-opening the picker with the current rows checked.
    pub fn preselection(&self) -> Preselection {
        Preselection::items(&self.list)
    }
}

/// A single-select checkpoint control.
pub struct CheckpointControl {
    value: String,
    label: Option<String>,
    host: Box<dyn ProxyHost>,
}

impl CheckpointControl {
    pub fn new(host: Box<dyn ProxyHost>) -> Self {
        let (value, label) = match host.proxy(CHECKPOINT_FIELD) {
            Ok(Some(proxy)) => (
                proxy.value.as_text().map(|text| text.into_owned()).unwrap_or_default(),
                proxy.label,
            ),
            Ok(None) => (String::new(), None),
            Err(err) => {
                tracing::warn!(error = %err, "reading checkpoint proxy failed");
                (String::new(), None)
            }
        };
        Self { value, label, host }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn host(&self) -> &dyn ProxyHost {
        self.host.as_ref()
    }

    /// Stores the identity verbatim; checkpoint names are not normalized.
    pub fn assign(&mut self, value: &str, label: Option<&str>) -> SyncReport {
        self.value = value.to_owned();
        self.label = label.filter(|label| !label.trim().is_empty()).map(str::to_owned);
        let proxy = match &self.label {
            Some(label) => Proxy::labeled(self.value.as_str(), label.as_str()),
            None => Proxy::new(self.value.as_str()),
        };
        sync_proxy(self.host.as_mut(), CHECKPOINT_FIELD, proxy)
    }

    pub fn on_serialize(&self) -> WireFields {
        WireFields::from([(CHECKPOINT_FIELD.to_owned(), WireValue::from(self.value.as_str()))])
    }

    pub fn on_configure(&mut self, fields: &WireFields) -> SyncReport {
        let value = fields
            .get(CHECKPOINT_FIELD)
            .and_then(WireValue::as_text)
            .map(|text| text.into_owned())
            .unwrap_or_default();
        self.assign(&value, None)
    }
}

pub enum Control {
    Lora(LoraControl),
    Checkpoint(CheckpointControl),
}

impl Control {
    pub fn kind(&self) -> PickerKind {
        match self {
            Self::Lora(_) => PickerKind::Lora,
            Self::Checkpoint(_) => PickerKind::Checkpoint,
        }
    }

    pub fn on_serialize(&self) -> WireFields {
        match self {
            Self::Lora(control) => control.on_serialize(),
            Self::Checkpoint(control) => control.on_serialize(),
        }
    }

    pub fn on_configure(&mut self, fields: &WireFields) -> SyncReport {
        match self {
            Self::Lora(control) => control.on_configure(fields),
            Self::Checkpoint(control) => control.on_configure(fields),
        }
    }

    pub fn as_lora(&self) -> Option<&LoraControl> {
        match self {
            Self::Lora(control) => Some(control),
            Self::Checkpoint(_) => None,
        }
    }

    pub fn as_checkpoint(&self) -> Option<&CheckpointControl> {
        match self {
            Self::Checkpoint(control) => Some(control),
            Self::Lora(_) => None,
        }
    }
}

/// The live controls of one document.
#[derive(Default)]
pub struct ControlBoard {
    controls: BTreeMap<ControlId, Control>,
}

impl ControlBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a control, returning the one it displaced.
    pub fn insert(&mut self, control_id: ControlId, control: Control) -> Option<Control> {
        self.controls.insert(control_id, control)
    }

    pub fn remove(&mut self, control_id: &ControlId) -> Option<Control> {
        self.controls.remove(control_id)
    }

    pub fn get(&self, control_id: &ControlId) -> Option<&Control> {
        self.controls.get(control_id)
    }

    pub fn get_mut(&mut self, control_id: &ControlId) -> Option<&mut Control> {
        self.controls.get_mut(control_id)
    }

    pub fn contains(&self, control_id: &ControlId) -> bool {
        self.controls.contains_key(control_id)
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ControlId> + '_ {
        self.controls.keys()
    }
}
