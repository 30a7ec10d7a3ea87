//! Client configuration resolved from the environment.

use std::path::PathBuf;

use anyhow::Context;

use larder_infra::DEFAULT_STORAGE_KEY;
use larder_inventory::ExpiryPolicy;

/// SQLite URL of the on-device store.
pub const DB_URL_ENV: &str = "LARDER_DB_URL";
/// Byte store key holding the item collection.
pub const STORAGE_KEY_ENV: &str = "LARDER_STORAGE_KEY";
/// Path to a JSON expiry table (`{"offsets": {...}, "fallbackDays": 7}`).
pub const EXPIRY_TABLE_ENV: &str = "LARDER_EXPIRY_TABLE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub db_url: String,
    pub storage_key: String,
    pub expiry_table_path: Option<PathBuf>,
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through `lookup` (blank values count as unset).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_url = match get(DB_URL_ENV) {
            Some(url) => url,
            None => default_db_url()?,
        };

        Ok(Self {
            db_url,
            storage_key: get(STORAGE_KEY_ENV).unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string()),
            expiry_table_path: get(EXPIRY_TABLE_ENV).map(PathBuf::from),
        })
    }

    /// Load the configured expiry table, or the built-in fallback-only policy
    /// when none is configured.
    pub fn load_expiry_policy(&self) -> anyhow::Result<ExpiryPolicy> {
        let Some(path) = &self.expiry_table_path else {
            return Ok(ExpiryPolicy::default());
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read expiry table at {:?}", path))?;
        ExpiryPolicy::from_json_str(&raw)
            .with_context(|| format!("failed to parse expiry table at {:?}", path))
    }
}

fn default_db_url() -> anyhow::Result<String> {
    let path = data_db_path()?;
    Ok(format!("sqlite://{}", path.to_string_lossy()))
}

/// Resolve the path to the SQLite database:
/// `{app_data_dir}/larder/larder.db`.
fn data_db_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    let mut dir = base;
    dir.push("larder");

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create data directory at {:?}", dir))?;

    dir.push("larder.db");

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn explicit_values_win() {
        let config = ClientConfig::from_lookup(lookup(&[
            (DB_URL_ENV, "sqlite::memory:"),
            (STORAGE_KEY_ENV, "items_v2"),
            (EXPIRY_TABLE_ENV, "/etc/larder/expiry.json"),
        ]))
        .unwrap();

        assert_eq!(config.db_url, "sqlite::memory:");
        assert_eq!(config.storage_key, "items_v2");
        assert_eq!(config.expiry_table_path, Some(PathBuf::from("/etc/larder/expiry.json")));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            (DB_URL_ENV, "sqlite::memory:"),
            (STORAGE_KEY_ENV, "  "),
        ]))
        .unwrap();

        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.expiry_table_path, None);
        assert_eq!(config.load_expiry_policy().unwrap(), ExpiryPolicy::default());
    }

    #[test]
    fn expiry_table_is_read_from_disk() {
        let path = std::env::temp_dir().join(format!("larder-expiry-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"offsets": {"dairy": 5}}"#).unwrap();

        let config = ClientConfig {
            db_url: "sqlite::memory:".to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            expiry_table_path: Some(path.clone()),
        };
        let policy = config.load_expiry_policy().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(policy.offset_days("dairy"), 5);
        assert_eq!(policy.offset_days("other"), 7);
    }

    #[test]
    fn missing_expiry_table_is_an_error() {
        let config = ClientConfig {
            db_url: "sqlite::memory:".to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            expiry_table_path: Some(PathBuf::from("/definitely/not/here.json")),
        };
        assert!(config.load_expiry_policy().is_err());
    }
}
