// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment providers for `courier.toml`.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CourierConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/courier/courier.toml";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "courier.toml";

/// Returns the per-user configuration file path, if a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("courier").join(LOCAL_CONFIG_FILE))
}

/// Compiled defaults, then the system, user and local files, then
/// `COURIER_*` variables. Missing files are skipped.
pub fn load_config() -> Result<CourierConfig, figment::Error> {
    let mut figment = base();
    for file in [Some(PathBuf::from(SYSTEM_CONFIG_PATH)), user_config_path()]
        .into_iter()
        .flatten()
    {
        figment = figment.merge(Toml::file(file));
    }
    figment
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
        .extract()
}

/// TOML text over the defaults. The environment is not consulted.
pub fn load_config_from_str(toml_content: &str) -> Result<CourierConfig, figment::Error> {
    base().merge(Toml::string(toml_content)).extract()
}

/// One explicit file over the defaults, then `COURIER_*` variables.
pub fn load_config_from_path(path: &Path) -> Result<CourierConfig, figment::Error> {
    base()
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

fn base() -> Figment {
    Figment::from(Serialized::defaults(CourierConfig::default()))
}

/// `COURIER_DISPATCH_CHUNK_SIZE` becomes `dispatch.chunk_size`: only the
/// first underscore after a known section is a separator.
fn env_provider() -> Env {
    Env::prefixed("COURIER_").map(|key| {
        let key = key.as_str().to_ascii_lowercase();
        let mapped = ENV_SECTIONS
            .iter()
            .find_map(|section| {
                key.strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or(key);
        mapped.into()
    })
}

/// Sections whose keys may be overridden from the environment.
const ENV_SECTIONS: [&str; 3] = ["log", "dispatch", "notify"];
