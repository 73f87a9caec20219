// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Modelpick: reconciles model-asset selections made in an external picker with the node
//! controls that asked for them.
//!
//! The engine keeps a normalized selection list per control, mirrors it onto host proxies
//! (`host`), persists it as flat indexed wire fields (`format`), merges picker results into it
//! (`ops`), and pairs each picker launch with its eventual answer (`picker`).

pub mod config;
pub mod control;
pub mod executor;
pub mod format;
pub mod host;
pub mod model;
pub mod ops;
pub mod picker;
