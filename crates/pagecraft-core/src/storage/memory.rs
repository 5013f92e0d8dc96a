//! In-memory storage implementation.

use super::{BoxFuture, ProjectStore, StorageError, StorageResult};
use crate::project::Project;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory project store for testing and ephemeral use.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    projects: RwLock<HashMap<String, Project>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectStore for MemoryStorage {
    fn save_project(&self, project: &Project) -> BoxFuture<'_, StorageResult<()>> {
        let project = project.clone();
        Box::pin(async move {
            let mut projects = self
                .projects
                .write()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            projects.insert(project.id.clone(), project);
            Ok(())
        })
    }

    fn load_project(&self, id: &str) -> BoxFuture<'_, StorageResult<Project>> {
        let id = id.to_string();
        Box::pin(async move {
            let projects = self
                .projects
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            projects
                .get(&id)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(id))
        })
    }

    fn delete_project(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut projects = self
                .projects
                .write()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            projects.remove(&id);
            Ok(())
        })
    }

    fn all_projects(&self) -> BoxFuture<'_, StorageResult<Vec<Project>>> {
        Box::pin(async move {
            let projects = self
                .projects
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            Ok(projects.values().cloned().collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            let projects = self
                .projects
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            Ok(projects.contains_key(&id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{PageUpdate, block_on};

    #[test]
    fn test_create_and_get_pages() {
        let storage = MemoryStorage::new();
        let project = block_on(storage.create_project(
            "Flyer",
            Some(r##"{"objects":[],"background":"#000000"}"##.into()),
            500.0,
            700.0,
        ))
        .unwrap();

        let pages = block_on(storage.get_pages(&project.id)).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].content.contains("#000000"));
        assert_eq!(pages[0].width, 500.0);
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = block_on(storage.load_project("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_exists_and_delete() {
        let storage = MemoryStorage::new();
        let project = block_on(storage.create_project("A", None, 10.0, 10.0)).unwrap();
        assert!(block_on(storage.exists(&project.id)).unwrap());

        block_on(storage.delete_project(&project.id)).unwrap();
        assert!(!block_on(storage.exists(&project.id)).unwrap());
        block_on(storage.delete_project(&project.id)).unwrap();
    }

    #[test]
    fn test_update_page() {
        let storage = MemoryStorage::new();
        let project = block_on(storage.create_project("A", None, 10.0, 10.0)).unwrap();
        let page_id = project.pages[0].id.clone();

        let page = block_on(storage.update_page(
            &project.id,
            &page_id,
            PageUpdate::content(r#"{"objects":[]}"#),
        ))
        .unwrap();
        assert_eq!(page.content, r#"{"objects":[]}"#);

        let missing = block_on(storage.update_page(&project.id, "nope", PageUpdate::default()));
        assert!(matches!(missing, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_add_and_delete_pages() {
        let storage = MemoryStorage::new();
        let project = block_on(storage.create_project("Deck", None, 10.0, 10.0)).unwrap();
        let added = block_on(storage.add_page(&project.id)).unwrap();
        assert_eq!(added.page_number, 2);

        let first = project.pages[0].id.clone();
        block_on(storage.delete_page(&project.id, &first)).unwrap();
        let pages = block_on(storage.get_pages(&project.id)).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].id, added.id);
        assert_eq!(pages[0].page_number, 1);

        let last = block_on(storage.delete_page(&project.id, &added.id));
        assert!(matches!(last, Err(StorageError::Invalid(_))));
    }

    #[test]
    fn test_replace_pages() {
        let storage = MemoryStorage::new();
        let project = block_on(storage.create_project("Deck", None, 10.0, 10.0)).unwrap();
        let mut pages = project.pages.clone();
        pages.push(pages[0].duplicate());
        block_on(storage.replace_pages(&project.id, pages)).unwrap();
        assert_eq!(block_on(storage.get_pages(&project.id)).unwrap().len(), 2);

        let empty = block_on(storage.replace_pages(&project.id, Vec::new()));
        assert!(matches!(empty, Err(StorageError::Invalid(_))));
    }

    #[test]
    fn test_duplicate_project() {
        let storage = MemoryStorage::new();
        let project = block_on(storage.create_project("Deck", None, 10.0, 10.0)).unwrap();
        block_on(storage.add_page(&project.id)).unwrap();

        let copy = block_on(storage.duplicate_project(&project.id)).unwrap();
        assert_ne!(copy.id, project.id);
        assert_eq!(copy.name, "Deck (copy)");
        assert_eq!(copy.pages.len(), 2);
        assert_ne!(copy.pages[0].id, project.pages[0].id);
    }

    #[test]
    fn test_list_projects_paginates() {
        let storage = MemoryStorage::new();
        for name in ["a", "b", "c"] {
            block_on(storage.create_project(name, None, 10.0, 10.0)).unwrap();
        }

        let first = block_on(storage.list_projects(1, 2)).unwrap();
        assert_eq!(first.total, 3);
        assert_eq!(first.projects.len(), 2);
        assert!(
            first
                .projects
                .is_sorted_by(|a, b| a.updated_at >= b.updated_at)
        );

        let second = block_on(storage.list_projects(2, 2)).unwrap();
        assert_eq!(second.projects.len(), 1);
        let beyond = block_on(storage.list_projects(5, 2)).unwrap();
        assert!(beyond.projects.is_empty());
    }
}
