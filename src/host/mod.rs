// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Host-side UI proxies and their materialization from a `SelectionList`.
//!
//! The host node exposes named proxies (`lora_{i}`, `lora_{i}_on`, ...) through [`ProxyHost`].
//! [`sync`] projects a list onto them by position and [`scan`] rebuilds a list from whatever the
//! host currently shows.

mod materialize;
mod memory;

use std::fmt;

use crate::format::WireValue;

pub use materialize::{scan, sync, sync_proxy, SyncReport};
pub use memory::{HostOp, MemoryHost};

/// One host UI proxy: the value it edits plus the text it displays, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Proxy {
    pub value: WireValue,
    pub label: Option<String>,
}

impl Proxy {
    pub fn new(value: impl Into<WireValue>) -> Self {
        Self { value: value.into(), label: None }
    }

    pub fn labeled(value: impl Into<WireValue>, label: impl Into<String>) -> Self {
        Self { value: value.into(), label: Some(label.into()) }
    }
}

/// The narrow proxy API a host control offers.
///
/// Every call may fail; materialization treats failures as "not reflected yet" and retries on the
/// next sync.
pub trait ProxyHost {
    /// Names of all proxies on the control, in host order.
    fn proxy_names(&self) -> Result<Vec<String>, HostError>;

    fn proxy(&self, name: &str) -> Result<Option<Proxy>, HostError>;

    fn create_proxy(&mut self, name: &str, proxy: Proxy) -> Result<(), HostError>;

    fn update_proxy(&mut self, name: &str, proxy: Proxy) -> Result<(), HostError>;

    /// Renames a live proxy, keeping whatever interaction state the host attached to it.
    fn rename_proxy(&mut self, from: &str, to: &str) -> Result<(), HostError>;

    fn remove_proxy(&mut self, name: &str) -> Result<(), HostError>;

    /// Asks the host to redraw the control.
    fn mark_dirty(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    Unavailable { operation: &'static str },
    MissingProxy { name: String },
    NameTaken { name: String },
    Rejected { name: String, reason: String },
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { operation } => {
                write!(f, "host proxy API unavailable ({operation})")
            }
            Self::MissingProxy { name } => write!(f, "proxy not found: {name}"),
            Self::NameTaken { name } => write!(f, "proxy name already in use: {name}"),
            Self::Rejected { name, reason } => write!(f, "host rejected proxy {name}: {reason}"),
        }
    }
}

impl std::error::Error for HostError {}
