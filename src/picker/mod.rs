// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The boundary to the external picker surface: launch parameters going out, protocol messages
//! coming back, and the correlator that pairs them.

pub mod correlator;
pub mod launch;
pub mod protocol;

pub use correlator::{IgnoreReason, PendingRequest, RequestCorrelator, Resolution};
pub use launch::{
    LaunchError, LaunchParams, PickerSurface, PreselectedItem, Preselection, REQUEST_ID_PARAM,
    SELECTED_DATA_PARAM, SELECTED_PARAM,
};
pub use protocol::{InboundMessage, PickedItem, PickerKind, ProtocolError, SelectPayload};
