// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use smallvec::SmallVec;

use super::{Proxy, ProxyHost};
use crate::format::{field_name, parse_field_name, FieldGroup, FieldRole, WireValue};
use crate::model::{Item, SelectionList};

/// What one `sync` pass did to the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub renamed: usize,
    pub removed: usize,
    pub failures: usize,
}

impl SyncReport {
    pub fn changed(&self) -> bool {
        self.created + self.updated + self.renamed + self.removed > 0
    }
}

type ProxyGroups = BTreeMap<usize, SmallVec<[FieldRole; 4]>>;

/// Makes the host's proxy groups mirror `list` by index.
///
/// Journaled removals are replayed first as group removal plus a downward rename of every later
/// group; then each row is created or updated in place and groups past the end are dropped. Host
/// failures are logged and counted, never raised. Running it twice on the same list is a no-op.
pub fn sync(host: &mut dyn ProxyHost, list: &mut SelectionList) -> SyncReport {
    let mut report = SyncReport::default();

    for removed_index in list.take_removals() {
        let groups = proxy_groups(host, &mut report);
        close_gap(host, &groups, removed_index, &mut report);
    }

    for (index, item) in list.items().iter().enumerate() {
        for (name, desired) in item_proxies(index, item) {
            reconcile_proxy(host, &name, desired, &mut report);
        }
    }

    let groups = proxy_groups(host, &mut report);
    for (&index, roles) in groups.range(list.len()..) {
        for &role in roles {
            remove_proxy(host, &field_name(index, role), &mut report);
        }
    }

    if report.changed() {
        host.mark_dirty();
    }
    report
}

/// Makes a single named proxy hold `desired`, creating it when absent.
pub fn sync_proxy(host: &mut dyn ProxyHost, name: &str, desired: Proxy) -> SyncReport {
    let mut report = SyncReport::default();
    reconcile_proxy(host, name, desired, &mut report);
    if report.changed() {
        host.mark_dirty();
    }
    report
}

/// Rebuilds a list from the proxies present on the host, grouped by shared index in ascending
/// order. Missing sub-fields take their defaults.
pub fn scan(host: &dyn ProxyHost) -> SelectionList {
    let names = match host.proxy_names() {
        Ok(names) => names,
        Err(err) => {
            tracing::warn!(error = %err, "proxy scan failed; treating control as empty");
            return SelectionList::new();
        }
    };

    let mut groups = BTreeMap::<usize, FieldGroup>::new();
    for name in names {
        let Some((index, role)) = parse_field_name(&name) else {
            continue;
        };
        let proxy = match host.proxy(&name) {
            Ok(Some(proxy)) => proxy,
            Ok(None) => continue,
            Err(err) => {
                tracing::warn!(proxy = %name, error = %err, "proxy read failed during scan");
                continue;
            }
        };
        let group = groups.entry(index).or_default();
        if role == FieldRole::Key {
            group.label = proxy.label.clone();
        }
        group.set(role, proxy.value);
    }

    SelectionList::from_items(groups.values().map(FieldGroup::to_item))
}

fn item_proxies(index: usize, item: &Item) -> [(String, Proxy); 4] {
    [
        (
            field_name(index, FieldRole::Key),
            Proxy::labeled(WireValue::Text(item.key().as_str().to_owned()), item.label()),
        ),
        (field_name(index, FieldRole::On), Proxy::new(item.enabled())),
        (field_name(index, FieldRole::StrengthModel), Proxy::new(item.strength_model())),
        (field_name(index, FieldRole::StrengthClip), Proxy::new(item.strength_clip())),
    ]
}

fn proxy_groups(host: &dyn ProxyHost, report: &mut SyncReport) -> ProxyGroups {
    let mut groups = ProxyGroups::new();
    let names = match host.proxy_names() {
        Ok(names) => names,
        Err(err) => {
            tracing::warn!(error = %err, "listing proxies failed");
            report.failures += 1;
            return groups;
        }
    };
    for name in names {
        if let Some((index, role)) = parse_field_name(&name) {
            let roles = groups.entry(index).or_default();
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
    }
    groups
}

fn close_gap(
    host: &mut dyn ProxyHost,
    groups: &ProxyGroups,
    removed_index: usize,
    report: &mut SyncReport,
) {
    if let Some(roles) = groups.get(&removed_index) {
        for &role in roles {
            remove_proxy(host, &field_name(removed_index, role), report);
        }
    }

    // Ascending, so every target name was vacated by the previous step.
    for (&index, roles) in groups.range(removed_index + 1..) {
        for &role in roles {
            let from = field_name(index, role);
            let to = field_name(index - 1, role);
            match host.rename_proxy(&from, &to) {
                Ok(()) => report.renamed += 1,
                Err(err) => {
                    tracing::warn!(from = %from, to = %to, error = %err, "proxy rename failed");
                    report.failures += 1;
                }
            }
        }
    }
}

fn reconcile_proxy(host: &mut dyn ProxyHost, name: &str, desired: Proxy, report: &mut SyncReport) {
    let outcome = match host.proxy(name) {
        Ok(Some(existing)) if existing == desired => return,
        Ok(Some(_)) => host.update_proxy(name, desired).map(|()| report.updated += 1),
        Ok(None) => host.create_proxy(name, desired).map(|()| report.created += 1),
        Err(err) => Err(err),
    };
    if let Err(err) = outcome {
        tracing::warn!(proxy = %name, error = %err, "proxy materialization failed");
        report.failures += 1;
    }
}

fn remove_proxy(host: &mut dyn ProxyHost, name: &str, report: &mut SyncReport) {
    match host.remove_proxy(name) {
        Ok(()) => report.removed += 1,
        Err(err) => {
            tracing::warn!(proxy = %name, error = %err, "proxy removal failed");
            report.failures += 1;
        }
    }
}
