// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use proptest::prelude::*;
use rstest::rstest;

use super::{merge, MergeMode};
use crate::model::{Item, ItemKey, SelectionList};

fn keys(list: &SelectionList) -> Vec<String> {
    list.active_keys().into_iter().map(ItemKey::into_string).collect()
}

#[test]
fn replace_into_empty_list_yields_incoming() {
    let incoming = [Item::new("a/b.safetensors", Some("B")).with_strengths(1.0, 1.0)];
    let merged = merge(&SelectionList::placeholder(), &incoming, MergeMode::Replace);

    assert_eq!(merged.len(), 1);
    let item = merged.get(0).expect("item");
    assert_eq!(item.key().as_str(), "a/b.safetensors");
    assert_eq!(item.label(), "B");
}

#[test]
fn replace_with_nothing_yields_placeholder() {
    let current = SelectionList::from_items([Item::new("a", None), Item::new("b", None)]);
    assert_eq!(merge(&current, &[], MergeMode::Replace), SelectionList::placeholder());
}

#[test]
fn replace_keeps_first_occurrence_of_duplicates() {
    let incoming = [
        Item::new("A", Some("first")).with_strengths(0.5, 0.5),
        Item::new("b", None),
        Item::new("a", Some("second")),
    ];
    let merged = merge(&SelectionList::new(), &incoming, MergeMode::Replace);

    assert_eq!(keys(&merged), vec!["a", "b"]);
    let first = merged.get(0).expect("a");
    assert_eq!(first.label(), "first");
    assert_eq!(first.strength_model(), 0.5);
}

#[test]
fn append_skips_keys_already_selected_even_when_disabled() {
    let current = SelectionList::from_items([
        Item::new("a", None).with_enabled(false),
        Item::new("b", None),
    ]);
    let incoming = [Item::new("A", None), Item::new("c", None), Item::new("C", None)];
    let merged = merge(&current, &incoming, MergeMode::Append);

    assert_eq!(keys(&merged), vec!["a", "b", "c"]);
    assert!(!merged.get(0).expect("a").enabled());
}

#[test]
fn append_replaces_the_placeholder_row() {
    let merged = merge(&SelectionList::placeholder(), &[Item::new("a", None)], MergeMode::Append);
    assert_eq!(merged.len(), 1);
    assert_eq!(keys(&merged), vec!["a"]);

    let untouched = merge(&SelectionList::placeholder(), &[], MergeMode::Append);
    assert_eq!(untouched, SelectionList::placeholder());
}

#[rstest]
#[case(MergeMode::Replace)]
#[case(MergeMode::Append)]
fn keyless_items_never_land_mid_list(#[case] mode: MergeMode) {
    let incoming = [Item::new("a", None), Item::new("   ", None), Item::new("b", None)];
    let merged = merge(&SelectionList::new(), &incoming, mode);
    assert_eq!(keys(&merged), vec!["a", "b"]);
    assert!(merged.items().iter().all(|item| !item.is_placeholder()));
}

#[test]
fn mode_parses_and_combines() {
    assert_eq!("Append".parse::<MergeMode>(), Ok(MergeMode::Append));
    assert!("merge".parse::<MergeMode>().is_err());
    assert_eq!(MergeMode::Replace.combine(Some(MergeMode::Append)), MergeMode::Append);
    assert_eq!(MergeMode::Append.combine(None), MergeMode::Append);
    assert_eq!(MergeMode::Replace.combine(Some(MergeMode::Replace)), MergeMode::Replace);
}

fn raw_key() -> impl Strategy<Value = String> {
    prop_oneof!["[a-cA-C]{1,2}(\\\\|/)[a-c]{1,2}", Just(String::new()), Just(" ".to_owned())]
}

proptest! {
    #[test]
    fn append_never_shrinks_and_never_duplicates(
        current in prop::collection::vec(raw_key(), 0..8),
        incoming in prop::collection::vec(raw_key(), 0..8),
    ) {
        let current = SelectionList::from_items(current.iter().map(|k| Item::new(k, None)));
        let incoming: Vec<Item> = incoming.iter().map(|k| Item::new(k, None)).collect();
        let merged = merge(&current, &incoming, MergeMode::Append);

        prop_assert!(merged.active_keys().len() >= current.active_keys().len());
        let mut seen = std::collections::HashSet::new();
        for key in merged.active_keys() {
            prop_assert!(seen.insert(key));
        }
        let prefix = current.active_keys();
        prop_assert_eq!(&merged.active_keys()[..prefix.len()], &prefix[..]);
    }
}
