// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Modelpick CLI bridge.
//!
//! Loads one control from a node's persisted wire fields, opens a picker request for it (the
//! launch URL is printed as a JSON event), then reads picker messages as JSON lines from stdin and
//! prints the control's wire fields after every applied message.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Instant;

use modelpick::config::PickerConfig;
use modelpick::control::{CheckpointControl, Control, ControlBoard, LoraControl};
use modelpick::format::WireFields;
use modelpick::host::MemoryHost;
use modelpick::model::{ControlId, RequestId};
use modelpick::ops::MergeMode;
use modelpick::picker::{
    LaunchError, LaunchParams, PickerKind, PickerSurface, RequestCorrelator, Resolution,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "data/config.json";
const CONTROL_ID: &str = "cli";

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--config <file>] [--fields <file>] [--kind lora|checkpoint] [--append]\n\n--config defaults to `{DEFAULT_CONFIG_PATH}`; a missing file uses built-in defaults.\n--fields loads the node's persisted wire fields (a JSON object) into the control.\n--kind selects the picker (default lora); --append merges picker results into the current rows.\n\nPicker messages are read from stdin, one JSON object per line. Set RUST_LOG to adjust logging."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    config: Option<PathBuf>,
    fields: Option<PathBuf>,
    kind: Option<PickerKind>,
    append: bool,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                if options.config.is_some() {
                    return Err(());
                }
                options.config = Some(PathBuf::from(args.next().ok_or(())?));
            }
            "--fields" => {
                if options.fields.is_some() {
                    return Err(());
                }
                options.fields = Some(PathBuf::from(args.next().ok_or(())?));
            }
            "--kind" => {
                if options.kind.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                options.kind = Some(raw.parse().map_err(|_| ())?);
            }
            "--append" => {
                if options.append {
                    return Err(());
                }
                options.append = true;
            }
            _ => return Err(()),
        }
    }

    Ok(options)
}

/// Announces picker launches and closes as JSON events on stdout.
struct StdoutSurface {
    config: PickerConfig,
}

impl PickerSurface for StdoutSurface {
    fn open(&mut self, params: &LaunchParams) -> Result<(), LaunchError> {
        let event = serde_json::json!({
            "event": "open",
            "requestId": params.request_id.as_str(),
            "url": params.to_url(&self.config),
        });
        println!("{event}");
        Ok(())
    }

    fn close(&mut self, request_id: &RequestId) {
        println!("{}", serde_json::json!({ "event": "close", "requestId": request_id.as_str() }));
    }

    fn close_browser(&mut self) {
        println!("{}", serde_json::json!({ "event": "close_browser" }));
    }
}

fn load_fields(path: &Path) -> Result<WireFields, Box<dyn Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    let fields = serde_json::from_str(&raw)
        .map_err(|err| format!("invalid wire fields in {}: {err}", path.display()))?;
    Ok(fields)
}

fn print_fields(control: &Control) {
    let event = serde_json::json!({ "event": "fields", "fields": control.on_serialize() });
    println!("{event}");
}

async fn run(options: CliOptions) -> Result<(), Box<dyn Error>> {
    let config_path = options.config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = PickerConfig::load(&config_path)?;
    let kind = options.kind.unwrap_or(PickerKind::Lora);
    let mode = if options.append { MergeMode::Append } else { MergeMode::Replace };

    let mut control = match kind {
        PickerKind::Lora => Control::Lora(LoraControl::new(Box::new(MemoryHost::new()))),
        PickerKind::Checkpoint => {
            Control::Checkpoint(CheckpointControl::new(Box::new(MemoryHost::new())))
        }
    };
    if let Some(path) = &options.fields {
        let fields = load_fields(path)?;
        let report = control.on_configure(&fields);
        tracing::info!(path = %path.display(), ?report, "loaded wire fields");
    }

    let control_id = ControlId::new(CONTROL_ID)?;
    let mut board = ControlBoard::new();
    board.insert(control_id.clone(), control);

    let surface = StdoutSurface { config: config.clone() };
    let mut correlator = RequestCorrelator::new(surface).with_pending_ttl(config.pending_ttl());
    let request_id = correlator.open_for(&board, &control_id, mode)?;
    tracing::info!(request_id = %request_id, %kind, %mode, "waiting for picker messages");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        correlator.sweep_expired(Instant::now());

        let resolution = match correlator.dispatch_json(line, &mut board) {
            Ok(resolution) => resolution,
            Err(err) => {
                tracing::warn!(error = %err, "dropping picker message");
                continue;
            }
        };
        match resolution {
            Resolution::Applied { request_id, report, .. } => {
                tracing::info!(request_id = %request_id, ?report, "picker result applied");
                if let Some(control) = board.get(&control_id) {
                    print_fields(control);
                }
            }
            Resolution::Cancelled { request_id } => {
                tracing::info!(request_id = %request_id, "picker cancelled");
            }
            Resolution::BrowserClosed => tracing::debug!("browser surface closed"),
            Resolution::Ignored { reason } => tracing::debug!(?reason, "picker message ignored"),
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "modelpick".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        runtime.block_on(run(options))
    })();

    if let Err(err) = result {
        eprintln!("modelpick: {err}");
        std::process::exit(1);
    }
}
