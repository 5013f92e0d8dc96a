//! File-based storage implementation for native platforms.

use super::{BoxFuture, ProjectStore, StorageError, StorageResult};
use crate::project::Project;
use std::fs;
use std::path::{Path, PathBuf};

/// File-based project store.
///
/// Stores each project as one JSON file in a directory.
#[derive(Debug)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Get the file path for a project ID.
    fn project_path(&self, id: &str) -> PathBuf {
        // Sanitize ID to be safe for filenames
        let safe_id: String = id
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

fn read_project(path: &Path) -> StorageResult<Project> {
    let json = fs::read_to_string(path)
        .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&json).map_err(|e| {
        StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
    })
}

impl ProjectStore for FileStorage {
    fn save_project(&self, project: &Project) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.project_path(&project.id);
        let json = match serde_json::to_string_pretty(project) {
            Ok(j) => j,
            Err(e) => {
                return Box::pin(async move { Err(StorageError::Serialization(e.to_string())) });
            }
        };

        Box::pin(async move {
            fs::write(&path, json).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", path.display(), e))
            })
        })
    }

    fn load_project(&self, id: &str) -> BoxFuture<'_, StorageResult<Project>> {
        let path = self.project_path(id);
        let id_owned = id.to_string();

        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(id_owned));
            }
            read_project(&path)
        })
    }

    fn delete_project(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.project_path(id);

        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn all_projects(&self) -> BoxFuture<'_, StorageResult<Vec<Project>>> {
        let base = self.base_path.clone();

        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }

            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut projects = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_none_or(|e| e != "json") {
                    continue;
                }
                match read_project(&path) {
                    Ok(project) => projects.push(project),
                    Err(e) => log::warn!("Skipping unreadable project file: {}", e),
                }
            }
            Ok(projects)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.project_path(id);
        Box::pin(async move { Ok(path.exists()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{PageUpdate, block_on};
    use tempfile::tempdir;

    #[test]
    fn test_file_storage_save_load() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let project = block_on(storage.create_project("Test Project", None, 300.0, 200.0)).unwrap();
        let loaded = block_on(storage.load_project(&project.id)).unwrap();

        assert_eq!(loaded.name, "Test Project");
        assert_eq!(loaded.pages, project.pages);
    }

    #[test]
    fn test_file_storage_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let result = block_on(storage.load_project("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_file_storage_lists_and_skips_garbage() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.create_project("one", None, 10.0, 10.0)).unwrap();
        block_on(storage.create_project("two", None, 10.0, 10.0)).unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let listing = block_on(storage.list_projects(1, 10)).unwrap();
        assert_eq!(listing.total, 2);
    }

    #[test]
    fn test_file_storage_update_persists() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let project = block_on(storage.create_project("p", None, 10.0, 10.0)).unwrap();
        let page_id = project.pages[0].id.clone();
        block_on(storage.update_page(&project.id, &page_id, PageUpdate::content("{}"))).unwrap();

        let reopened = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let pages = block_on(reopened.get_pages(&project.id)).unwrap();
        assert_eq!(pages[0].content, "{}");
    }

    #[test]
    fn test_file_storage_delete() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let project = block_on(storage.create_project("p", None, 10.0, 10.0)).unwrap();
        assert!(block_on(storage.exists(&project.id)).unwrap());

        block_on(storage.delete_project(&project.id)).unwrap();
        assert!(!block_on(storage.exists(&project.id)).unwrap());
    }

    #[test]
    fn test_file_storage_sanitizes_id() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let mut project = Project::new("odd", 10.0, 10.0);
        project.id = "test/doc:with*special".to_string();
        block_on(storage.save_project(&project)).unwrap();

        assert!(dir.path().join("test_doc_with_special.json").exists());
        let loaded = block_on(storage.load_project("test/doc:with*special")).unwrap();
        assert_eq!(loaded.id, project.id);
    }
}
