use std::path::{Path, PathBuf};

use aegis_core::RuntimeConfig;
use anyhow::{Context, Result};
use toml::{Table, Value};

/// Layered configuration: user config, then project config on top
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<RuntimeConfig> {
        Self::load_layers(&[Self::user_config_path(), Self::project_config_path()])
    }

    /// Merge the given files in order; later files override earlier ones
    ///
    /// Missing files are skipped. The merged result is validated.
    pub fn load_layers(paths: &[PathBuf]) -> Result<RuntimeConfig> {
        let mut merged = Table::new();
        for path in paths {
            if let Some(layer) = Self::read_layer(path)? {
                merged = Self::merge_tables(merged, layer);
            }
        }
        Self::finalize(merged)
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> PathBuf {
        aegis_paths::config_file()
    }

    /// Get project config path
    /// Can be overridden with AEGIS_PROJECT_CONFIG_DIR env var
    pub fn project_config_path() -> PathBuf {
        match std::env::var("AEGIS_PROJECT_CONFIG_DIR") {
            Ok(dir) => PathBuf::from(dir).join(aegis_paths::CONFIG_FILE),
            Err(_) => PathBuf::from(".aegis").join(aegis_paths::CONFIG_FILE),
        }
    }

    /// Write a config to `path`, creating parent directories
    pub fn save_to_path(config: &RuntimeConfig, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let toml = toml::to_string_pretty(config)?;
        std::fs::write(path, toml).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    fn read_layer(path: &Path) -> Result<Option<Table>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let table: Table =
            toml::from_str(&contents).with_context(|| format!("Invalid TOML in {}", path.display()))?;
        Ok(Some(table))
    }

    /// Merge two tables (overlay keys override base; nested tables merge)
    fn merge_tables(mut base: Table, overlay: Table) -> Table {
        for (key, value) in overlay {
            let merged = match (base.remove(&key), value) {
                (Some(Value::Table(base_inner)), Value::Table(overlay_inner)) => {
                    Value::Table(Self::merge_tables(base_inner, overlay_inner))
                }
                (_, value) => value,
            };
            base.insert(key, merged);
        }
        base
    }

    /// Apply defaults and validate
    fn finalize(table: Table) -> Result<RuntimeConfig> {
        let contents = toml::to_string(&table)?;
        Ok(RuntimeConfig::from_toml(&contents)?)
    }
}
