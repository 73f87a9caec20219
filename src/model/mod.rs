// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model: normalized asset keys, selected items and the ordered selection list.
//!
//! A `SelectionList` belongs to exactly one control; controls and picker requests are addressed by
//! the typed ids in `ids`.

pub mod ids;
pub mod item;
pub mod key;
pub mod selection;

pub use ids::{ControlId, Id, IdError, RequestId};
pub use item::{
    clamp_strength, Item, DEFAULT_STRENGTH, PLACEHOLDER_LABEL, STRENGTH_MAX, STRENGTH_MIN,
};
pub use key::{normalize_key, ItemKey};
pub use selection::SelectionList;
