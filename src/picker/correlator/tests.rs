// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::{Duration, Instant};

use rstest::{fixture, rstest};

use super::{IgnoreReason, RequestCorrelator, Resolution};
use crate::control::{CheckpointControl, Control, ControlBoard, LoraControl};
use crate::host::MemoryHost;
use crate::model::{ControlId, Item, RequestId};
use crate::ops::MergeMode;
use crate::picker::{
    InboundMessage, LaunchError, LaunchParams, PickedItem, PickerKind, PickerSurface, Preselection,
    SelectPayload,
};

#[derive(Debug, Default)]
struct RecordingSurface {
    opened: Vec<LaunchParams>,
    closed: Vec<RequestId>,
    browser_closes: usize,
    refuse: bool,
}

impl PickerSurface for RecordingSurface {
    fn open(&mut self, params: &LaunchParams) -> Result<(), LaunchError> {
        if self.refuse {
            return Err(LaunchError::Surface { reason: "blocked".to_owned() });
        }
        self.opened.push(params.clone());
        Ok(())
    }

    fn close(&mut self, request_id: &RequestId) {
        self.closed.push(request_id.clone());
    }

    fn close_browser(&mut self) {
        self.browser_closes += 1;
    }
}

struct Fixture {
    correlator: RequestCorrelator<RecordingSurface>,
    board: ControlBoard,
    lora_id: ControlId,
    ckpt_id: ControlId,
}

impl Fixture {
    fn lora(&self) -> &LoraControl {
        self.board.get(&self.lora_id).and_then(Control::as_lora).expect("lora control")
    }

    fn keys(&self) -> Vec<String> {
        self.lora().list().active_keys().iter().map(|key| key.to_string()).collect()
    }
}

#[fixture]
fn world() -> Fixture {
    let mut board = ControlBoard::new();
    let lora_id = ControlId::new("node-7.loras").expect("id");
    let ckpt_id = ControlId::new("node-3.ckpt_name").expect("id");

    let mut lora = LoraControl::new(Box::new(MemoryHost::new()));
    lora.apply_merge(&[Item::new("a.safetensors", Some("A"))], MergeMode::Replace);
    board.insert(lora_id.clone(), Control::Lora(lora));
    board.insert(
        ckpt_id.clone(),
        Control::Checkpoint(CheckpointControl::new(Box::new(MemoryHost::new()))),
    );

    Fixture {
        correlator: RequestCorrelator::new(RecordingSurface::default()),
        board,
        lora_id,
        ckpt_id,
    }
}

fn lora_payload(values: &[&str], mode: Option<MergeMode>) -> SelectPayload {
    SelectPayload::Lora {
        items: values.iter().map(|value| PickedItem::new(value, value, 1.0, 1.0)).collect(),
        mode,
    }
}

#[rstest]
fn request_ids_are_distinct_and_prefixed(mut world: Fixture) {
    let first = world
        .correlator
        .open(world.lora_id.clone(), PickerKind::Lora, MergeMode::Replace, Preselection::Nothing)
        .expect("open");
    let second = world
        .correlator
        .open(world.lora_id.clone(), PickerKind::Lora, MergeMode::Append, Preselection::Nothing)
        .expect("open");

    assert_ne!(first, second);
    assert!(first.as_str().starts_with("sel_"));
    assert_eq!(world.correlator.pending_len(), 2);
    assert_eq!(world.correlator.surface().opened.len(), 2);
}

#[rstest]
fn open_for_carries_kind_and_preselection(mut world: Fixture) {
    let request_id = world
        .correlator
        .open_for(&world.board, &world.lora_id, MergeMode::Replace)
        .expect("open");
    let params = &world.correlator.surface().opened[0];
    assert_eq!(params.request_id, request_id);
    assert_eq!(params.kind, PickerKind::Lora);
    assert!(params.preselection.matches("A.safetensors"));

    let ckpt = ControlId::new("node-3.ckpt_name").expect("id");
    world.correlator.open_for(&world.board, &ckpt, MergeMode::Replace).expect("open");
    assert_eq!(world.correlator.surface().opened[1].kind, PickerKind::Checkpoint);
}

#[rstest]
fn open_for_unknown_control_fails(mut world: Fixture) {
    let missing = ControlId::new("node-99.loras").expect("id");
    let err = world
        .correlator
        .open_for(&world.board, &missing, MergeMode::Replace)
        .expect_err("unknown control");
    assert!(matches!(err, LaunchError::UnknownControl { .. }));
    assert_eq!(world.correlator.pending_len(), 0);
}

#[rstest]
fn failed_launch_records_nothing(mut world: Fixture) {
    world.correlator.surface_mut().refuse = true;
    let result = world.correlator.open(
        world.lora_id.clone(),
        PickerKind::Lora,
        MergeMode::Replace,
        Preselection::Nothing,
    );
    assert!(result.is_err());
    assert_eq!(world.correlator.pending_len(), 0);
}

#[rstest]
fn select_replaces_and_closes_picker(mut world: Fixture) {
    let request_id = world
        .correlator
        .open_for(&world.board, &world.lora_id, MergeMode::Replace)
        .expect("open");

    let resolution = world.correlator.resolve(
        request_id.as_str(),
        lora_payload(&["B\\x.safetensors", "c.safetensors"], None),
        &mut world.board,
    );

    assert!(matches!(resolution, Resolution::Applied { .. }));
    assert_eq!(world.keys(), vec!["b/x.safetensors", "c.safetensors"]);
    assert_eq!(world.correlator.surface().closed, vec![request_id]);
    assert_eq!(world.correlator.pending_len(), 0);
}

#[rstest]
fn second_result_for_same_request_is_ignored(mut world: Fixture) {
    let request_id = world
        .correlator
        .open_for(&world.board, &world.lora_id, MergeMode::Append)
        .expect("open");

    world.correlator.resolve(
        request_id.as_str(),
        lora_payload(&["b.safetensors"], None),
        &mut world.board,
    );
    let again = world.correlator.resolve(
        request_id.as_str(),
        lora_payload(&["c.safetensors"], None),
        &mut world.board,
    );

    assert_eq!(again, Resolution::Ignored { reason: IgnoreReason::UnknownRequest });
    assert_eq!(world.keys(), vec!["a.safetensors", "b.safetensors"]);
}

#[rstest]
fn payload_append_upgrades_stored_replace(mut world: Fixture) {
    let request_id = world
        .correlator
        .open_for(&world.board, &world.lora_id, MergeMode::Replace)
        .expect("open");

    world.correlator.resolve(
        request_id.as_str(),
        lora_payload(&["b.safetensors"], Some(MergeMode::Append)),
        &mut world.board,
    );
    assert_eq!(world.keys(), vec!["a.safetensors", "b.safetensors"]);
}

#[rstest]
fn cancel_leaves_selection_untouched(mut world: Fixture) {
    let request_id = world
        .correlator
        .open_for(&world.board, &world.lora_id, MergeMode::Replace)
        .expect("open");

    let resolution = world.correlator.dispatch(
        InboundMessage::Cancel { request_id: request_id.to_string() },
        &mut world.board,
    );
    assert_eq!(resolution, Resolution::Cancelled { request_id: request_id.clone() });
    assert_eq!(world.keys(), vec!["a.safetensors"]);

    let late = world.correlator.dispatch(
        InboundMessage::Select {
            request_id: request_id.to_string(),
            payload: lora_payload(&["z.safetensors"], None),
        },
        &mut world.board,
    );
    assert_eq!(late, Resolution::Ignored { reason: IgnoreReason::UnknownRequest });
    assert_eq!(world.keys(), vec!["a.safetensors"]);
}

#[rstest]
fn unknown_request_is_ignored(mut world: Fixture) {
    let resolution = world.correlator.dispatch(
        InboundMessage::Select {
            request_id: "sel_never".to_owned(),
            payload: lora_payload(&["z.safetensors"], None),
        },
        &mut world.board,
    );
    assert_eq!(resolution, Resolution::Ignored { reason: IgnoreReason::UnknownRequest });
    assert!(world.correlator.surface().closed.is_empty());
}

#[rstest]
fn close_message_closes_browser_only(mut world: Fixture) {
    world
        .correlator
        .open_for(&world.board, &world.lora_id, MergeMode::Replace)
        .expect("open");
    let resolution = world.correlator.dispatch(InboundMessage::Close, &mut world.board);
    assert_eq!(resolution, Resolution::BrowserClosed);
    assert_eq!(world.correlator.surface().browser_closes, 1);
    assert_eq!(world.correlator.pending_len(), 1);
}

#[rstest]
fn checkpoint_select_assigns_value(mut world: Fixture) {
    let ckpt_id = world.ckpt_id.clone();
    let request_id =
        world.correlator.open_for(&world.board, &ckpt_id, MergeMode::Replace).expect("open");

    let resolution = world.correlator.resolve(
        request_id.as_str(),
        SelectPayload::Checkpoint {
            value: "sdxl/base.safetensors".to_owned(),
            label: Some("Base".to_owned()),
        },
        &mut world.board,
    );

    assert!(matches!(resolution, Resolution::Applied { .. }));
    let checkpoint = world.board.get(&ckpt_id).and_then(Control::as_checkpoint).expect("ckpt");
    assert_eq!(checkpoint.value(), "sdxl/base.safetensors");
}

#[rstest]
fn mismatched_payload_is_ignored(mut world: Fixture) {
    let request_id = world
        .correlator
        .open_for(&world.board, &world.lora_id, MergeMode::Replace)
        .expect("open");
    let resolution = world.correlator.resolve(
        request_id.as_str(),
        SelectPayload::Checkpoint { value: "x".to_owned(), label: None },
        &mut world.board,
    );
    assert_eq!(resolution, Resolution::Ignored { reason: IgnoreReason::KindMismatch });
    assert_eq!(world.keys(), vec!["a.safetensors"]);
    assert_eq!(world.correlator.pending_len(), 0);
}

#[rstest]
fn destroyed_control_drops_result(mut world: Fixture) {
    let request_id = world
        .correlator
        .open_for(&world.board, &world.lora_id, MergeMode::Replace)
        .expect("open");
    world.board.remove(&world.lora_id);

    let resolution = world.correlator.resolve(
        request_id.as_str(),
        lora_payload(&["b.safetensors"], None),
        &mut world.board,
    );
    assert_eq!(resolution, Resolution::Ignored { reason: IgnoreReason::ControlGone });
    assert_eq!(world.correlator.pending_len(), 0);
}

#[rstest]
fn forget_control_drops_its_requests(mut world: Fixture) {
    let ckpt_id = world.ckpt_id.clone();
    world
        .correlator
        .open_for(&world.board, &world.lora_id, MergeMode::Replace)
        .expect("open");
    world.correlator.open_for(&world.board, &ckpt_id, MergeMode::Replace).expect("open");

    assert_eq!(world.correlator.forget_control(&world.lora_id), 1);
    assert_eq!(world.correlator.pending_len(), 1);
    assert_eq!(world.correlator.surface().closed.len(), 1);
}

#[rstest]
fn sweep_without_ttl_keeps_everything(mut world: Fixture) {
    world
        .correlator
        .open_for(&world.board, &world.lora_id, MergeMode::Replace)
        .expect("open");
    let later = Instant::now() + Duration::from_secs(24 * 60 * 60);
    assert!(world.correlator.sweep_expired(later).is_empty());
    assert_eq!(world.correlator.pending_len(), 1);
}

#[test]
fn sweep_drops_expired_requests() {
    let mut board = ControlBoard::new();
    let lora_id = ControlId::new("node-1.loras").expect("id");
    board.insert(lora_id.clone(), Control::Lora(LoraControl::new(Box::new(MemoryHost::new()))));
    let mut correlator = RequestCorrelator::new(RecordingSurface::default())
        .with_pending_ttl(Some(Duration::from_secs(60)));

    let request_id = correlator.open_for(&board, &lora_id, MergeMode::Replace).expect("open");
    assert!(correlator.sweep_expired(Instant::now()).is_empty());

    let expired = correlator.sweep_expired(Instant::now() + Duration::from_secs(61));
    assert_eq!(expired, vec![request_id.clone()]);
    assert_eq!(correlator.surface().closed, vec![request_id.clone()]);

    let late = correlator.resolve(request_id.as_str(), lora_payload(&["x"], None), &mut board);
    assert_eq!(late, Resolution::Ignored { reason: IgnoreReason::UnknownRequest });
}

#[rstest]
fn malformed_entries_are_dropped_and_request_retired(mut world: Fixture) {
    let request_id = world
        .correlator
        .open_for(&world.board, &world.lora_id, MergeMode::Replace)
        .expect("open");
    let raw = format!(
        r#"{{"type":"select","requestId":"{request_id}","payload":{{"kind":"lora","mode":"merge",
            "items":[{{"value":"a"}},null,"b",{{"value":"c"}}]}}}}"#
    );

    let resolution = world.correlator.dispatch_json(&raw, &mut world.board).expect("parse");

    assert!(matches!(resolution, Resolution::Applied { .. }));
    assert_eq!(world.keys(), vec!["a", "c"]);
    assert_eq!(world.correlator.pending_len(), 0);
    assert_eq!(world.correlator.surface().closed, vec![request_id]);
}

#[rstest]
fn unparseable_message_still_retires_its_request(mut world: Fixture) {
    let request_id = world
        .correlator
        .open_for(&world.board, &world.lora_id, MergeMode::Replace)
        .expect("open");
    let raw = format!(
        r#"{{"type":"select","requestId":"{request_id}","payload":{{"kind":"vae"}}}}"#
    );

    assert!(world.correlator.dispatch_json(&raw, &mut world.board).is_err());
    assert_eq!(world.correlator.pending_len(), 0);
    assert_eq!(world.correlator.surface().closed, vec![request_id]);
    assert_eq!(world.keys(), vec!["a.safetensors"]);
}

#[rstest]
fn concurrent_requests_for_different_controls_resolve_independently(mut world: Fixture) {
    let ckpt_id = world.ckpt_id.clone();
    let lora_request = world
        .correlator
        .open_for(&world.board, &world.lora_id, MergeMode::Append)
        .expect("open lora");
    let ckpt_request =
        world.correlator.open_for(&world.board, &ckpt_id, MergeMode::Replace).expect("open ckpt");
    assert_ne!(lora_request, ckpt_request);

    let resolution = world.correlator.resolve(
        lora_request.as_str(),
        lora_payload(&["b.safetensors"], None),
        &mut world.board,
    );
    assert!(matches!(resolution, Resolution::Applied { .. }));
    assert!(world.correlator.pending(lora_request.as_str()).is_none());
    let still_open = world.correlator.pending(ckpt_request.as_str()).expect("ckpt still pending");
    assert_eq!(still_open.control_id, ckpt_id);
    assert_eq!(still_open.kind, PickerKind::Checkpoint);

    let resolution = world.correlator.resolve(
        ckpt_request.as_str(),
        SelectPayload::Checkpoint { value: "xl/refiner.safetensors".to_owned(), label: None },
        &mut world.board,
    );
    assert!(matches!(resolution, Resolution::Applied { .. }));
    assert_eq!(world.correlator.pending_len(), 0);

    assert_eq!(world.keys(), vec!["a.safetensors", "b.safetensors"]);
    let checkpoint = world.board.get(&ckpt_id).and_then(Control::as_checkpoint).expect("ckpt");
    assert_eq!(checkpoint.value(), "xl/refiner.safetensors");
    assert_eq!(world.correlator.surface().closed, vec![lora_request, ckpt_request]);
}
