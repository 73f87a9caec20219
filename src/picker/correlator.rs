// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Correlates picker requests with their eventual result, cancellation or expiry.
//!
//! Each request id moves `open -> resolved | cancelled | expired` exactly once; messages for ids
//! that are no longer pending are ignored.

use std::collections::HashMap;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use rand::Rng as _;

use super::launch::{LaunchError, LaunchParams, PickerSurface, Preselection};
use super::protocol::{InboundMessage, PickedItem, PickerKind, ProtocolError, SelectPayload};
use crate::control::{Control, ControlBoard};
use crate::host::SyncReport;
use crate::model::{ControlId, Item, RequestId};
use crate::ops::MergeMode;

const REQUEST_ID_PREFIX: &str = "sel_";
const REQUEST_SUFFIX_LEN: usize = 6;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub control_id: ControlId,
    pub kind: PickerKind,
    pub mode: MergeMode,
    pub opened_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Already resolved, cancelled, expired, or never opened here.
    UnknownRequest,
    /// The target control was destroyed while the picker was open.
    ControlGone,
    /// The payload shape does not fit the target control.
    KindMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Applied { request_id: RequestId, control_id: ControlId, report: SyncReport },
    Cancelled { request_id: RequestId },
    BrowserClosed,
    Ignored { reason: IgnoreReason },
}

pub struct RequestCorrelator<S> {
    surface: S,
    pending: HashMap<RequestId, PendingRequest>,
    pending_ttl: Option<Duration>,
}

impl<S: PickerSurface> RequestCorrelator<S> {
    pub fn new(surface: S) -> Self {
        Self { surface, pending: HashMap::new(), pending_ttl: None }
    }

    pub fn with_pending_ttl(mut self, pending_ttl: Option<Duration>) -> Self {
        self.pending_ttl = pending_ttl;
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self, request_id: &str) -> Option<&PendingRequest> {
        self.pending.get(request_id)
    }

    /// Mints a request id, launches the picker with it and records the request.
    ///
    /// Nothing is recorded when the surface fails to open.
    pub fn open(
        &mut self,
        control_id: ControlId,
        kind: PickerKind,
        mode: MergeMode,
        preselection: Preselection,
    ) -> Result<RequestId, LaunchError> {
        let request_id = self.mint_request_id();
        let params = LaunchParams { request_id: request_id.clone(), kind, preselection };
        self.surface.open(&params)?;

        tracing::debug!(
            request_id = %request_id,
            control_id = %control_id,
            %kind,
            %mode,
            "picker opened"
        );
        self.pending.insert(
            request_id.clone(),
            PendingRequest { control_id, kind, mode, opened_at: Instant::now() },
        );
        Ok(request_id)
    }

    /// Opens a picker for a control on `board`, deriving kind and preselection from it.
    pub fn open_for(
        &mut self,
        board: &ControlBoard,
        control_id: &ControlId,
        mode: MergeMode,
    ) -> Result<RequestId, LaunchError> {
        let Some(control) = board.get(control_id) else {
            return Err(LaunchError::UnknownControl { control_id: control_id.to_string() });
        };
        let preselection = match control {
            Control::Lora(lora) => lora.preselection(),
            Control::Checkpoint(_) => Preselection::Nothing,
        };
        self.open(control_id.clone(), control.kind(), mode, preselection)
    }

    /// Routes one inbound picker message.
    pub fn dispatch(&mut self, message: InboundMessage, board: &mut ControlBoard) -> Resolution {
        match message {
            InboundMessage::Select { request_id, payload } => {
                self.resolve(&request_id, payload, board)
            }
            InboundMessage::Cancel { request_id } => self.cancel(&request_id),
            InboundMessage::Close => {
                self.surface.close_browser();
                Resolution::BrowserClosed
            }
        }
    }

    /// Parses and routes one raw picker message.
    ///
    /// A message that fails to parse still retires the request it names, so its picker is closed
    /// and no pending entry is left behind.
    pub fn dispatch_json(
        &mut self,
        raw: &str,
        board: &mut ControlBoard,
    ) -> Result<Resolution, ProtocolError> {
        match InboundMessage::from_json(raw) {
            Ok(message) => Ok(self.dispatch(message, board)),
            Err(err) => {
                if let Some(request_id) = InboundMessage::salvage_request_id(raw) {
                    if let Resolution::Cancelled { request_id } = self.cancel(&request_id) {
                        tracing::warn!(
                            request_id = %request_id,
                            error = %err,
                            "retired request after malformed message"
                        );
                    }
                }
                Err(err)
            }
        }
    }

    /// Applies a picker result to the control that asked for it, at most once per request id.
    pub fn resolve(
        &mut self,
        request_id: &str,
        payload: SelectPayload,
        board: &mut ControlBoard,
    ) -> Resolution {
        let Some((request_id, pending)) = self.pending.remove_entry(request_id) else {
            tracing::debug!(request_id, "ignoring result for unknown request");
            return Resolution::Ignored { reason: IgnoreReason::UnknownRequest };
        };

        let resolution = match board.get_mut(&pending.control_id) {
            None => {
                tracing::debug!(
                    request_id = %request_id,
                    control_id = %pending.control_id,
                    "target control is gone"
                );
                Resolution::Ignored { reason: IgnoreReason::ControlGone }
            }
            Some(control) => match apply_payload(control, &pending, payload) {
                Some(report) => Resolution::Applied {
                    request_id: request_id.clone(),
                    control_id: pending.control_id.clone(),
                    report,
                },
                None => {
                    tracing::warn!(
                        request_id = %request_id,
                        kind = %pending.kind,
                        "picker payload does not fit its control"
                    );
                    Resolution::Ignored { reason: IgnoreReason::KindMismatch }
                }
            },
        };

        self.surface.close(&request_id);
        resolution
    }

    /// Forgets the request and closes its picker; the control is left untouched.
    pub fn cancel(&mut self, request_id: &str) -> Resolution {
        let Some((request_id, _)) = self.pending.remove_entry(request_id) else {
            return Resolution::Ignored { reason: IgnoreReason::UnknownRequest };
        };
        self.surface.close(&request_id);
        Resolution::Cancelled { request_id }
    }

    /// Drops every request older than the configured TTL and closes its picker.
    pub fn sweep_expired(&mut self, now: Instant) -> Vec<RequestId> {
        let Some(ttl) = self.pending_ttl else {
            return Vec::new();
        };
        let mut expired: Vec<RequestId> = self
            .pending
            .iter()
            .filter(|(_, pending)| now.saturating_duration_since(pending.opened_at) > ttl)
            .map(|(request_id, _)| request_id.clone())
            .collect();
        expired.sort();

        for request_id in &expired {
            self.pending.remove(request_id);
            self.surface.close(request_id);
            tracing::debug!(request_id = %request_id, "pending picker request expired");
        }
        expired
    }

    /// Drops the pending requests of a destroyed control and closes their pickers.
    pub fn forget_control(&mut self, control_id: &ControlId) -> usize {
        let orphaned: Vec<RequestId> = self
            .pending
            .iter()
            .filter(|(_, pending)| &pending.control_id == control_id)
            .map(|(request_id, _)| request_id.clone())
            .collect();
        for request_id in &orphaned {
            self.pending.remove(request_id);
            self.surface.close(request_id);
        }
        orphaned.len()
    }

    fn mint_request_id(&self) -> RequestId {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default();
        let mut rng = rand::rng();
        loop {
            let mut raw = String::with_capacity(REQUEST_ID_PREFIX.len() + 16);
            raw.push_str(REQUEST_ID_PREFIX);
            push_base36(&mut raw, millis);
            for _ in 0..REQUEST_SUFFIX_LEN {
                raw.push(char::from(BASE36[rng.random_range(0..BASE36.len())]));
            }
            if self.pending.contains_key(raw.as_str()) {
                continue;
            }
            match RequestId::new(raw) {
                Ok(request_id) => return request_id,
                Err(err) => unreachable!("minted request id is valid: {err}"),
            }
        }
    }
}

fn push_base36(out: &mut String, mut value: u64) {
    let mut digits = [0u8; 13];
    let mut len = 0;
    loop {
        digits[len] = BASE36[(value % 36) as usize];
        len += 1;
        value /= 36;
        if value == 0 {
            break;
        }
    }
    out.extend(digits[..len].iter().rev().map(|&digit| char::from(digit)));
}

fn apply_payload(
    control: &mut Control,
    pending: &PendingRequest,
    payload: SelectPayload,
) -> Option<SyncReport> {
    match (control, payload) {
        (Control::Lora(lora), SelectPayload::Lora { items, mode }) => {
            let incoming: Vec<Item> = items.iter().filter_map(PickedItem::to_item).collect();
            let dropped = items.len() - incoming.len();
            if dropped > 0 {
                tracing::debug!(dropped, "dropped picked items without a usable key");
            }
            Some(lora.apply_merge(&incoming, pending.mode.combine(mode)))
        }
        (Control::Checkpoint(checkpoint), SelectPayload::Checkpoint { value, label }) => {
            Some(checkpoint.assign(&value, label.as_deref()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests;
