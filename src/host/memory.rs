// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::cell::RefCell;

use super::{HostError, Proxy, ProxyHost};
use crate::format::WireValue;

/// Host operation selector for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOp {
    List,
    Read,
    Create,
    Update,
    Rename,
    Remove,
}

impl HostOp {
    fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Rename => "rename",
            Self::Remove => "remove",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    name: String,
    proxy: Proxy,
    serial: u64,
}

/// In-process proxy host.
///
/// Proxies keep their insertion order and a serial number assigned at creation; renames keep the
/// serial, so callers can tell an updated proxy from a recreated one.
#[derive(Debug, Default)]
pub struct MemoryHost {
    slots: Vec<Slot>,
    next_serial: u64,
    dirty: bool,
    failures: RefCell<Vec<(HostOp, usize)>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host pre-populated as if generic deserialization had restored these proxies.
    pub fn with_proxies<'a>(proxies: impl IntoIterator<Item = (&'a str, Proxy)>) -> Self {
        let mut host = Self::new();
        for (name, proxy) in proxies {
            host.push(name, proxy);
        }
        host
    }

    /// Makes the next `times` calls of `op` fail.
    pub fn fail_next(&self, op: HostOp, times: usize) {
        self.failures.borrow_mut().push((op, times));
    }

    pub fn names(&self) -> Vec<&str> {
        self.slots.iter().map(|slot| slot.name.as_str()).collect()
    }

    pub fn value(&self, name: &str) -> Option<&WireValue> {
        self.find(name).map(|slot| &slot.proxy.value)
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.find(name).and_then(|slot| slot.proxy.label.as_deref())
    }

    pub fn serial(&self, name: &str) -> Option<u64> {
        self.find(name).map(|slot| slot.serial)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns and clears the redraw flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn find(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.name == name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.name == name)
    }

    fn push(&mut self, name: &str, proxy: Proxy) {
        self.slots.push(Slot { name: name.to_owned(), proxy, serial: self.next_serial });
        self.next_serial += 1;
    }

    fn check(&self, op: HostOp) -> Result<(), HostError> {
        let mut failures = self.failures.borrow_mut();
        let Some(entry) = failures.iter_mut().find(|(failing, left)| *failing == op && *left > 0)
        else {
            return Ok(());
        };
        entry.1 -= 1;
        failures.retain(|(_, left)| *left > 0);
        Err(HostError::Unavailable { operation: op.as_str() })
    }
}

impl ProxyHost for MemoryHost {
    fn proxy_names(&self) -> Result<Vec<String>, HostError> {
        self.check(HostOp::List)?;
        Ok(self.slots.iter().map(|slot| slot.name.clone()).collect())
    }

    fn proxy(&self, name: &str) -> Result<Option<Proxy>, HostError> {
        self.check(HostOp::Read)?;
        Ok(self.find(name).map(|slot| slot.proxy.clone()))
    }

    fn create_proxy(&mut self, name: &str, proxy: Proxy) -> Result<(), HostError> {
        self.check(HostOp::Create)?;
        if self.find(name).is_some() {
            return Err(HostError::NameTaken { name: name.to_owned() });
        }
        self.push(name, proxy);
        Ok(())
    }

    fn update_proxy(&mut self, name: &str, proxy: Proxy) -> Result<(), HostError> {
        self.check(HostOp::Update)?;
        let Some(index) = self.position(name) else {
            return Err(HostError::MissingProxy { name: name.to_owned() });
        };
        self.slots[index].proxy = proxy;
        Ok(())
    }

    fn rename_proxy(&mut self, from: &str, to: &str) -> Result<(), HostError> {
        self.check(HostOp::Rename)?;
        if self.find(to).is_some() {
            return Err(HostError::NameTaken { name: to.to_owned() });
        }
        let Some(index) = self.position(from) else {
            return Err(HostError::MissingProxy { name: from.to_owned() });
        };
        self.slots[index].name = to.to_owned();
        Ok(())
    }

    fn remove_proxy(&mut self, name: &str) -> Result<(), HostError> {
        self.check(HostOp::Remove)?;
        let Some(index) = self.position(name) else {
            return Err(HostError::MissingProxy { name: name.to_owned() });
        };
        self.slots.remove(index);
        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
