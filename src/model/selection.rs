// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::item::Item;
use super::key::ItemKey;

/// Ordered selection owned by one multi-select control.
///
/// Non-placeholder keys are unique. Removals are journaled until the next materialization so the
/// host proxies can be renamed rather than rewritten.
#[derive(Debug, Clone, Default)]
pub struct SelectionList {
    items: Vec<Item>,
    removals: Vec<usize>,
}

impl PartialEq for SelectionList {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl SelectionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// A list holding only the placeholder row.
    pub fn placeholder() -> Self {
        Self { items: vec![Item::placeholder()], removals: Vec::new() }
    }

    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut list = Self::new();
        for item in items {
            list.upsert(item);
        }
        list
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    /// Number of rows, placeholders included.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True iff there is no non-placeholder entry.
    pub fn is_empty(&self) -> bool {
        self.items.iter().all(Item::is_placeholder)
    }

    pub fn contains_key(&self, key: &ItemKey) -> bool {
        !key.is_placeholder() && self.items.iter().any(|item| item.key() == key)
    }

    /// Normalized keys of every non-placeholder entry, disabled ones included, in list order.
    pub fn active_keys(&self) -> Vec<ItemKey> {
        self.items
            .iter()
            .filter(|item| !item.is_placeholder())
            .map(|item| item.key().clone())
            .collect()
    }

    /// Updates the entry sharing `item`'s key in place, or appends `item`.
    ///
    /// A real item displaces placeholder rows; a placeholder is only kept when the list has no
    /// rows at all.
    pub fn upsert(&mut self, item: Item) {
        if item.is_placeholder() {
            if self.items.is_empty() {
                self.items.push(item);
            }
            return;
        }

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|existing| !existing.is_placeholder() && existing.key() == item.key())
        {
            existing.absorb(&item);
            return;
        }

        self.items.retain(|existing| !existing.is_placeholder());
        self.items.push(item);
    }

    /// Removes the entry at `index`; later entries shift down. Out of range is a no-op.
    pub fn remove_at(&mut self, index: usize) {
        if index >= self.items.len() {
            return;
        }
        self.items.remove(index);
        self.removals.push(index);
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.removals.clear();
    }

    pub fn set_enabled(&mut self, index: usize, enabled: bool) {
        if let Some(item) = self.items.get_mut(index) {
            item.set_enabled(enabled);
        }
    }

    pub fn set_strengths(&mut self, index: usize, strength_model: f64, strength_clip: f64) {
        if let Some(item) = self.items.get_mut(index) {
            item.set_strengths(strength_model, strength_clip);
        }
    }

    /// Appends the placeholder row if the list has no rows.
    pub fn ensure_placeholder(&mut self) {
        if self.items.is_empty() {
            self.items.push(Item::placeholder());
        }
    }

    /// Drains the removal journal in the order the removals happened.
    pub(crate) fn take_removals(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.removals)
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::SelectionList;
    use crate::model::{Item, ItemKey};

    fn keys(list: &SelectionList) -> Vec<String> {
        list.active_keys().into_iter().map(ItemKey::into_string).collect()
    }

    #[test]
    fn upsert_updates_in_place_and_keeps_position() {
        let mut list = SelectionList::new();
        list.upsert(Item::new("a", None));
        list.upsert(Item::new("b", None));
        list.upsert(Item::new("A", Some("Alpha")).with_strengths(0.5, 0.25).with_enabled(false));

        assert_eq!(keys(&list), vec!["a", "b"]);
        let first = list.get(0).expect("first");
        assert_eq!(first.label(), "Alpha");
        assert_eq!(first.strength_model(), 0.5);
        assert_eq!(first.strength_clip(), 0.25);
        assert!(!first.enabled());
    }

    #[test]
    fn upsert_displaces_placeholder() {
        let mut list = SelectionList::placeholder();
        assert!(list.is_empty());
        assert_eq!(list.len(), 1);

        list.upsert(Item::new("a", None));
        assert_eq!(list.len(), 1);
        assert_eq!(keys(&list), vec!["a"]);

        list.upsert(Item::placeholder());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn remove_at_shifts_and_ignores_out_of_range() {
        let mut list = SelectionList::from_items([
            Item::new("a", None),
            Item::new("b", None),
            Item::new("c", None),
        ]);
        list.remove_at(7);
        assert_eq!(list.len(), 3);

        list.remove_at(1);
        assert_eq!(keys(&list), vec!["a", "c"]);
        assert_eq!(list.take_removals(), vec![1]);
        assert!(list.take_removals().is_empty());
    }

    #[test]
    fn disabled_entries_still_occupy_their_key() {
        let mut list = SelectionList::from_items([Item::new("a", None).with_enabled(false)]);
        assert_eq!(keys(&list), vec!["a"]);
        assert!(list.contains_key(&ItemKey::new("A")));

        list.set_enabled(0, true);
        list.set_strengths(0, 2.0, 3.0);
        list.set_strengths(9, 2.0, 3.0);
        assert!(list.get(0).expect("item").enabled());
        assert_eq!(list.get(0).expect("item").strength_clip(), 3.0);
    }

    #[test]
    fn equality_ignores_the_removal_journal() {
        let mut left = SelectionList::from_items([Item::new("a", None), Item::new("b", None)]);
        left.remove_at(0);
        let right = SelectionList::from_items([Item::new("b", None)]);
        assert_eq!(left, right);

        left.clear();
        assert!(left.is_empty());
        assert_eq!(left.len(), 0);
    }
}
