// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Wire encodings shared by the host node and the executor.

pub mod wire;

pub use wire::{
    decode, encode, field_name, group_fields, item_fields, parse_field_name, FieldGroup,
    FieldRole, WireFields, WireValue, FIELD_PREFIX,
};
