//! Repository-wide tunables, loaded from an optional `braid.toml` next
//! to the repository root: a small `serde`-derived struct deserialized
//! with `toml`, covering the two knobs that control knit promotion and
//! rename detection.

use serde::{Deserialize, Serialize};

use std::{fs, path::Path};

use crate::{err_at, Error, Result};

/// Default delta-chain length before a knit record is promoted to
/// fulltext.
pub const DEFAULT_DELTA_THRESHOLD: usize = 25;

/// Default hash modulus for rename-detection line-pair hashing,
/// `10 * 2^20`.
pub const DEFAULT_RENAME_HASH_MODULUS: u64 = 10 * (1 << 20);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub knit_delta_threshold: usize,
    pub rename_hash_modulus: u64,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            knit_delta_threshold: DEFAULT_DELTA_THRESHOLD,
            rename_hash_modulus: DEFAULT_RENAME_HASH_MODULUS,
        }
    }
}

impl Config {
    /// Load `braid.toml` from `dir` if present, else return defaults.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Config> {
        let path = dir.as_ref().join("braid.toml");
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = err_at!(IoError, fs::read_to_string(&path))?;
        err_at!(MalformedFormat, toml::from_str(&text))
    }
}
