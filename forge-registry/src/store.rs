//! Durable tool store writing one JSON record file per tool name.

use std::path::{Path, PathBuf};

use forge_primitives::ToolDefinition;
use tokio::fs;
use tracing::debug;

use crate::{RegistryError, RegistryResult};

const RECORD_EXTENSION: &str = "json";

/// File-backed store of approved tool definitions.
///
/// Each definition is independently addressable as `<name>.json` under the
/// store directory. Writes to the same name are last-write-wins; writes to
/// different names are independent.
pub struct ToolStore {
    dir: PathBuf,
}

impl ToolStore {
    /// Opens (or creates) a store rooted at the provided directory.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors encountered while creating the directory.
    pub async fn open(dir: impl Into<PathBuf>) -> RegistryResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// Returns the backing directory of the store.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes or overwrites the record for the definition's name.
    ///
    /// Re-saving identical content is idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidName`] for names that do not map to a
    /// safe file name, and propagates serialization and I/O failures.
    pub async fn save(&self, tool: &ToolDefinition) -> RegistryResult<()> {
        let path = self.record_path(tool.name())?;
        let body = serde_json::to_vec_pretty(tool)?;
        fs::write(&path, body).await?;
        debug!(tool = tool.name(), path = %path.display(), "tool record saved");
        Ok(())
    }

    /// Returns the persisted record for `name`, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Corrupt`] when the record exists but cannot
    /// be parsed. Absence is never an error.
    pub async fn load(&self, name: &str) -> RegistryResult<Option<ToolDefinition>> {
        let path = self.record_path(name)?;
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let tool = serde_json::from_slice(&data).map_err(|source| RegistryError::Corrupt {
            name: name.to_owned(),
            source,
        })?;
        Ok(Some(tool))
    }

    /// Returns every persisted record.
    ///
    /// A missing backing directory yields an empty vector.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Corrupt`] if any record fails to parse; the
    /// call fails rather than silently dropping the entry.
    pub async fn load_all(&self) -> RegistryResult<Vec<ToolDefinition>> {
        let mut tools = Vec::new();
        for name in self.list().await? {
            let data = fs::read(self.record_path(&name)?).await?;
            let tool =
                serde_json::from_slice(&data).map_err(|source| RegistryError::Corrupt {
                    name: name.clone(),
                    source,
                })?;
            tools.push(tool);
        }
        Ok(tools)
    }

    /// Deletes the record for `name`, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Propagates I/O failures other than the record being absent.
    pub async fn remove(&self, name: &str) -> RegistryResult<bool> {
        let path = self.record_path(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(tool = name, "tool record removed");
                Ok(true)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Lists persisted tool names without parsing record bodies.
    ///
    /// # Errors
    ///
    /// Propagates I/O failures other than the directory being absent.
    pub async fn list(&self) -> RegistryResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_owned());
            }
        }
        Ok(names)
    }

    /// Maps a tool name to its record path.
    ///
    /// Names are used verbatim as file stems, so anything that could escape
    /// the store directory is rejected before touching the filesystem.
    fn record_path(&self, name: &str) -> RegistryResult<PathBuf> {
        if name.is_empty() {
            return Err(RegistryError::InvalidName {
                name: name.to_owned(),
                reason: "name cannot be empty",
            });
        }
        let safe = name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
        if !safe || name.starts_with('.') {
            return Err(RegistryError::InvalidName {
                name: name.to_owned(),
                reason: "name must contain only alphanumerics, `_`, `-`, or `.`",
            });
        }
        Ok(self.dir.join(format!("{name}.{RECORD_EXTENSION}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("toolforge-store-{}", Uuid::new_v4()));
        path
    }

    fn tool(name: &str) -> ToolDefinition {
        ToolDefinition::new(
            name,
            "test tool",
            json!({ "type": "object", "properties": {} }),
            "params",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_load_roundtrip() {
        let dir = temp_dir();
        let store = ToolStore::open(&dir).await.unwrap();

        let original = tool("echo");
        store.save(&original).await.unwrap();

        let loaded = store.load("echo").await.unwrap().expect("record exists");
        assert_eq!(loaded, original);

        // Re-save is idempotent.
        store.save(&original).await.unwrap();
        assert_eq!(store.load("echo").await.unwrap().unwrap(), original);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn load_missing_is_none() {
        let dir = temp_dir();
        let store = ToolStore::open(&dir).await.unwrap();
        assert!(store.load("ghost").await.unwrap().is_none());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn remove_reports_existence() {
        let dir = temp_dir();
        let store = ToolStore::open(&dir).await.unwrap();

        store.save(&tool("gone")).await.unwrap();
        assert!(store.remove("gone").await.unwrap());
        assert!(store.load("gone").await.unwrap().is_none());
        assert!(!store.remove("gone").await.unwrap());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn list_and_load_all() {
        let dir = temp_dir();
        let store = ToolStore::open(&dir).await.unwrap();

        store.save(&tool("alpha")).await.unwrap();
        store.save(&tool("beta")).await.unwrap();

        let mut names = store.list().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["alpha", "beta"]);

        let all = store.load_all().await.unwrap();
        assert_eq!(all.len(), 2);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn load_all_on_missing_dir_is_empty() {
        let dir = temp_dir();
        let store = ToolStore::open(&dir).await.unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert!(store.load_all().await.unwrap().is_empty());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_record_is_a_hard_failure() {
        let dir = temp_dir();
        let store = ToolStore::open(&dir).await.unwrap();

        std::fs::write(dir.join("broken.json"), b"{ not json").unwrap();

        let err = store.load("broken").await.expect_err("corrupt record");
        assert!(matches!(err, RegistryError::Corrupt { name, .. } if name == "broken"));

        let err = store.load_all().await.expect_err("corrupt record");
        assert!(matches!(err, RegistryError::Corrupt { .. }));

        // Listing does not parse bodies, so the corrupt entry is still named.
        assert_eq!(store.list().await.unwrap(), vec!["broken"]);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn rejects_path_escaping_names() {
        let dir = temp_dir();
        let store = ToolStore::open(&dir).await.unwrap();

        let err = store.load("../escape").await.expect_err("unsafe name");
        assert!(matches!(err, RegistryError::InvalidName { .. }));

        let err = store.load("a/b").await.expect_err("unsafe name");
        assert!(matches!(err, RegistryError::InvalidName { .. }));

        let _ = std::fs::remove_dir_all(dir);
    }
}
