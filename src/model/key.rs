// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Modelpick and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::borrow::Borrow;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;

/// Canonical form of an asset identity: backslashes become `/`, surrounding whitespace is
/// trimmed and the result is lower-cased.
///
/// Idempotent, total, and never fails. Empty input yields an empty string.
pub fn normalize_key(raw: &str) -> String {
    let slashed: Cow<'_, str> = match memchr::memchr(b'\\', raw.as_bytes()) {
        Some(_) => Cow::Owned(raw.replace('\\', "/")),
        None => Cow::Borrowed(raw),
    };
    slashed.trim().to_lowercase()
}

/// Normalized identity of one selected asset.
///
/// The empty key is legal and marks a placeholder row ("no selection yet").
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    value: SmolStr,
}

impl ItemKey {
    pub fn new(raw: &str) -> Self {
        Self { value: SmolStr::new(normalize_key(raw)) }
    }

    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn is_placeholder(&self) -> bool {
        self.value.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value.into()
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl AsRef<str> for ItemKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for ItemKey {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for ItemKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for ItemKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ItemKey {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}
