//! File-based settings source.

use super::SourceLoader;
use super::source_loader::select_key;
use crate::core::{Settings, SettingsMap, SourceTag};
use crate::error::{ConfigError, Result};
use config::File;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Supported file formats, detected from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Toml,
    Json,
}

/// File-based settings source.
///
/// Loads settings from YAML, TOML, or JSON files with automatic format detection
/// based on file extension. Files are also writable: [`SourceLoader::write`] merges
/// new values into the file and rewrites it in the same format.
///
/// # Examples
///
/// ```rust,no_run
/// use lazy_settings::sources::FileSource;
///
/// let source = FileSource::new("config/default.yaml");
/// let local = FileSource::new("config/local.toml").optional(true);
/// ```
pub struct FileSource {
    path: PathBuf,
    priority: i32,
    optional: bool,
}

impl FileSource {
    /// Create a new file source with automatic format detection.
    ///
    /// The format is detected from the file extension:
    /// - `.yaml`, `.yml` -> YAML
    /// - `.toml` -> TOML
    /// - `.json` -> JSON
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            priority: 100,
            optional: false,
        }
    }

    /// Set the priority for this source.
    ///
    /// Higher priority sources override lower priority ones.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Treat a missing file as empty instead of failing.
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// The path this source reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate that the file extension is supported.
    fn format(&self) -> Result<Format> {
        let extension = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                ConfigError::LoadError(format!(
                    "Unable to determine file format for: {}",
                    self.path.display()
                ))
            })?;

        match extension {
            "yaml" | "yml" => Ok(Format::Yaml),
            "toml" => Ok(Format::Toml),
            "json" => Ok(Format::Json),
            _ => Err(ConfigError::LoadError(format!(
                "Unsupported file extension: {}. Supported: .yaml, .yml, .toml, .json",
                extension
            ))),
        }
    }

    /// Read the raw file contents as a map, keys as written in the file.
    fn read(&self) -> Result<Option<SettingsMap>> {
        self.format()?;

        if !self.path.exists() {
            if self.optional {
                tracing::debug!(path = %self.path.display(), "optional settings file not found");
                return Ok(None);
            }
            return Err(ConfigError::LoadError(format!(
                "Configuration file not found: {}",
                self.path.display()
            )));
        }

        // The config crate auto-detects the format from the extension
        let config = config::Config::builder()
            .add_source(File::from(self.path.clone()).required(true))
            .build()
            .map_err(|e| ConfigError::LoadError(format!("Failed to load file: {}", e)))?;

        let map = config.try_deserialize::<SettingsMap>().map_err(|e| {
            ConfigError::DeserializationError(format!("Failed to parse file: {}", e))
        })?;

        Ok(Some(map))
    }

    fn serialize(&self, format: Format, map: &SettingsMap) -> Result<String> {
        match format {
            Format::Json => serde_json::to_string_pretty(map)
                .map_err(|e| ConfigError::SerializationError(e.to_string())),
            #[cfg(feature = "yaml")]
            Format::Yaml => serde_yaml::to_string(map)
                .map_err(|e| ConfigError::SerializationError(e.to_string())),
            #[cfg(feature = "toml")]
            Format::Toml => toml::to_string_pretty(map)
                .map_err(|e| ConfigError::SerializationError(e.to_string())),
            #[allow(unreachable_patterns)]
            _ => Err(ConfigError::unsupported(self.name(), "write")),
        }
    }
}

impl SourceLoader for FileSource {
    fn load(&self, settings: &mut Settings, key: Option<&str>) -> Result<Option<Value>> {
        let Some(values) = self.read()? else {
            return Ok(None);
        };
        let tag = SourceTag::new(self.name());

        match key {
            Some(key) => Ok(select_key(values, key).map(|(name, value)| {
                settings.set(&name, value.clone(), &tag);
                value
            })),
            None => {
                tracing::debug!(source = %self.name(), count = values.len(), "loaded file");
                settings.update(values, &tag);
                Ok(None)
            }
        }
    }

    fn write(&self, _settings: &Settings, data: Option<&SettingsMap>) -> Result<()> {
        let data = match data {
            Some(data) if !data.is_empty() => data,
            _ => return Err(ConfigError::MissingArgument("Data must be provided")),
        };
        let format = self.format()?;

        let mut merged = if self.path.exists() {
            self.read()?.unwrap_or_default()
        } else {
            SettingsMap::new()
        };
        for (key, value) in data {
            merged.retain(|existing, _| !existing.eq_ignore_ascii_case(key));
            merged.insert(key.clone(), value.clone());
        }

        let contents = self.serialize(format, &merged)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, contents)?;

        tracing::debug!(path = %self.path.display(), count = data.len(), "wrote settings file");
        Ok(())
    }

    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_format_yaml() {
        assert_eq!(FileSource::new("config.yaml").format().unwrap(), Format::Yaml);
        assert_eq!(FileSource::new("config.yml").format().unwrap(), Format::Yaml);
    }

    #[test]
    fn test_format_toml_and_json() {
        assert_eq!(FileSource::new("config.toml").format().unwrap(), Format::Toml);
        assert_eq!(FileSource::new("config.json").format().unwrap(), Format::Json);
    }

    #[test]
    fn test_format_unknown() {
        assert!(FileSource::new("config.txt").format().is_err());
        assert!(FileSource::new("config").format().is_err());
    }

    #[test]
    fn test_load_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        fs::write(
            &config_path,
            r#"
server:
  port: 8080
  host: localhost
debug: true
"#,
        )
        .unwrap();

        let source = FileSource::new(&config_path);
        let mut settings = Settings::default();
        source.load(&mut settings, None).unwrap();

        assert_eq!(settings.get("server.port"), Some(&json!(8080)));
        assert_eq!(settings.get("DEBUG"), Some(&json!(true)));
    }

    #[test]
    fn test_load_single_key() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        fs::write(&config_path, r#"{"name": "svc", "port": 1}"#).unwrap();

        let source = FileSource::new(&config_path);
        let mut settings = Settings::default();
        let value = source.load(&mut settings, Some("NAME")).unwrap();

        assert_eq!(value, Some(json!("svc")));
        assert!(!settings.contains("PORT"));
        assert_eq!(source.load(&mut settings, Some("missing")).unwrap(), None);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let source = FileSource::new("/nonexistent/config.yaml");
        let mut settings = Settings::default();
        assert!(source.load(&mut settings, None).is_err());

        let optional = FileSource::new("/nonexistent/config.yaml").optional(true);
        assert_eq!(optional.load(&mut settings, None).unwrap(), None);
        assert!(settings.is_empty());
    }

    #[test]
    fn test_write_merges_into_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("settings.json");
        let source = FileSource::new(&config_path);
        let settings = Settings::default();

        let first = SettingsMap::from([("name".to_string(), json!("svc"))]);
        source.write(&settings, Some(&first)).unwrap();

        let second = SettingsMap::from([
            ("NAME".to_string(), json!("renamed")),
            ("port".to_string(), json!(80)),
        ]);
        source.write(&settings, Some(&second)).unwrap();

        let mut loaded = Settings::default();
        source.load(&mut loaded, None).unwrap();
        assert_eq!(loaded.get("NAME"), Some(&json!("renamed")));
        assert_eq!(loaded.get("PORT"), Some(&json!(80)));
        assert_eq!(loaded.len(), 2);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_write_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.yaml");
        let source = FileSource::new(&config_path);

        let data = SettingsMap::from([("database".to_string(), json!({"url": "postgres://db"}))]);
        source.write(&Settings::default(), Some(&data)).unwrap();

        let mut loaded = Settings::default();
        source.load(&mut loaded, None).unwrap();
        assert_eq!(loaded.get("database.url"), Some(&json!("postgres://db")));
    }

    #[test]
    fn test_write_without_data() {
        let source = FileSource::new("settings.json");
        let err = source.write(&Settings::default(), None).unwrap_err();
        assert!(err.to_string().contains("Data must be provided"));
    }

    #[test]
    fn test_delete_is_unsupported() {
        let source = FileSource::new("settings.json");
        assert!(matches!(
            source.delete(&Settings::default(), None),
            Err(ConfigError::Unsupported { operation: "delete", .. })
        ));
    }

    #[test]
    fn test_with_priority() {
        let source = FileSource::new("config.yaml").with_priority(200);
        assert_eq!(source.priority(), 200);
    }

    #[test]
    fn test_name() {
        let source = FileSource::new("config.yaml");
        assert!(source.name().contains("config.yaml"));
    }
}
