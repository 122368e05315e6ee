// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of stored message bytes into transmittable text.

use std::borrow::Cow;

/// Converts raw message bytes to a string.
///
/// Valid UTF-8 is borrowed as-is. Anything else is represented explicitly,
/// one code point per byte (ISO-8859-1), so no byte is dropped or replaced.
pub fn stringify(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}
