//! Config-center document loading from disk.
//!
//! A TOML document is flattened into dotted keys, so
//!
//! ```toml
//! [transport]
//! minServerPoolSize = 80
//!
//! [transport.threadFactory]
//! bossThreadPrefix = "Acceptor"
//! ```
//!
//! answers `transport.minServerPoolSize` and
//! `transport.threadFactory.bossThreadPrefix`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::error::{ConfigError, ConfigResult, SourceUnavailable};
use crate::config::source::ConfigProvider;

/// Config center backed by a TOML file read once at startup.
#[derive(Debug, Clone)]
pub struct FileConfigCenter {
    path: PathBuf,
    state: CenterState,
}

#[derive(Debug, Clone)]
enum CenterState {
    Loaded(HashMap<String, String>),
    Unreachable(String),
}

impl FileConfigCenter {
    /// Open the document at `path`.
    ///
    /// A missing or unreadable file yields a center whose lookups report
    /// `SourceUnavailable`; a file that exists but is not valid TOML is fatal.
    pub fn open(path: &Path) -> ConfigResult<Self> {
        let state = match fs::read_to_string(path) {
            Ok(content) => CenterState::Loaded(parse_document(path, &content)?),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Config center document unreadable, falling back to lower-precedence sources"
                );
                CenterState::Unreachable(e.to_string())
            }
        };

        if let CenterState::Loaded(values) = &state {
            tracing::debug!(path = %path.display(), keys = values.len(), "Config center document loaded");
        }

        Ok(Self {
            path: path.to_path_buf(),
            state,
        })
    }

    /// Build a center from document text without touching the filesystem.
    pub fn from_document(path: &Path, content: &str) -> ConfigResult<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            state: CenterState::Loaded(parse_document(path, content)?),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self.state, CenterState::Loaded(_))
    }
}

impl ConfigProvider for FileConfigCenter {
    fn name(&self) -> &str {
        "file-config-center"
    }

    fn get_raw(&self, key: &str) -> Result<Option<String>, SourceUnavailable> {
        match &self.state {
            CenterState::Loaded(values) => Ok(values.get(key).cloned()),
            CenterState::Unreachable(reason) => Err(SourceUnavailable::new(
                format!("{} ({})", self.name(), self.path.display()),
                reason.clone(),
            )),
        }
    }
}

fn parse_document(path: &Path, content: &str) -> ConfigResult<HashMap<String, String>> {
    let table: toml::Table = toml::from_str(content).map_err(|source| ConfigError::Document {
        path: path.to_path_buf(),
        source,
    })?;

    let mut values = HashMap::new();
    flatten("", &table, &mut values);
    Ok(values)
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut HashMap<String, String>) {
    for (name, value) in table {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };

        match value {
            toml::Value::Table(inner) => flatten(&key, inner, out),
            toml::Value::String(s) => {
                out.insert(key, s.clone());
            }
            other => {
                out.insert(key, other.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOC: &str = r#"
[transport]
minServerPoolSize = 80
enableTcServerBatchSendResponse = true
server = "NATIVE"

[transport.threadFactory]
bossThreadPrefix = "Acceptor"
"#;

    #[test]
    fn flattens_nested_tables() {
        let center = FileConfigCenter::from_document(Path::new("inline.toml"), DOC).unwrap();
        assert_eq!(center.get_int("transport.minServerPoolSize", 50).unwrap(), 80);
        assert!(center
            .get_boolean("transport.enableTcServerBatchSendResponse", false)
            .unwrap());
        assert_eq!(
            center
                .get_raw("transport.threadFactory.bossThreadPrefix")
                .unwrap()
                .as_deref(),
            Some("Acceptor")
        );
        assert_eq!(center.get_raw("transport.server").unwrap().as_deref(), Some("NATIVE"));
    }

    #[test]
    fn missing_file_is_unreachable_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let center = FileConfigCenter::open(&dir.path().join("absent.toml")).unwrap();
        assert!(!center.is_reachable());
        assert!(center.get_raw("transport.server").is_err());
    }

    #[test]
    fn malformed_document_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[transport\nminServerPoolSize = ").unwrap();
        let err = FileConfigCenter::open(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Document { .. }));
    }

    #[test]
    fn reads_document_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOC.as_bytes()).unwrap();
        let center = FileConfigCenter::open(file.path()).unwrap();
        assert!(center.is_reachable());
        assert_eq!(center.path(), file.path());
        assert_eq!(center.get_int("transport.minServerPoolSize", 50).unwrap(), 80);
    }
}
