// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the message and batch tables.

pub mod batches;
pub mod messages;

use std::str::FromStr;

use rusqlite::types::Type;

/// Largest id list bound into a single statement.
pub(crate) const MAX_BOUND_IDS: usize = 500;

/// Builds `?,?,...` with `n` placeholders.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

/// Parses a status code column, reporting failures as conversion errors.
pub(crate) fn parse_code<T>(idx: usize, code: &str) -> Result<T, rusqlite::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    T::from_str(code)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
