// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loading and checking of `courier.toml`.
//!
//! Files are layered system, user, local, then `COURIER_*` environment
//! variables. Every stage reports problems as [`ConfigError`]s, which
//! [`render_errors`] prints with source spans where they are known.

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    BackendConfig, CourierConfig, DeliveryTarget, DispatchConfig, NotifyConfig, StoreConfig,
    SupportedBackendConfig,
};

/// Loads the layered configuration and validates it.
pub fn load_and_validate() -> Result<CourierConfig, Vec<ConfigError>> {
    checked(loader::load_config(), layered_sources)
}

/// Loads configuration from TOML text, without environment overrides.
pub fn load_and_validate_str(toml_content: &str) -> Result<CourierConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Loads `path` plus environment overrides. A missing file is an error
/// here, unlike the layered lookup where every file is optional.
pub fn load_and_validate_path(path: &Path) -> Result<CourierConfig, Vec<ConfigError>> {
    if !path.is_file() {
        return Err(vec![ConfigError::Other(format!(
            "config file {} does not exist",
            path.display()
        ))]);
    }
    checked(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Validates a loaded config, or converts the figment error. `sources` is
/// only read when there is an error to place.
fn checked(
    loaded: Result<CourierConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<CourierConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::figment_to_config_errors(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

fn read_source(path: &Path) -> Option<(String, String)> {
    let content = std::fs::read_to_string(path).ok()?;
    Some((path.display().to_string(), content))
}

/// Every layered config file that exists, for span lookup.
fn layered_sources() -> Vec<(String, String)> {
    let local = std::env::current_dir()
        .map(|dir| dir.join(loader::LOCAL_CONFIG_FILE))
        .unwrap_or_else(|_| loader::LOCAL_CONFIG_FILE.into());
    [
        Some(local),
        loader::user_config_path(),
        Some(Path::new(loader::SYSTEM_CONFIG_PATH).to_path_buf()),
    ]
    .into_iter()
    .flatten()
    .filter_map(|path| read_source(&path))
    .collect()
}
