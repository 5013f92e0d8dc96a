//! Project persistence collaborator.
//!
//! Backends implement the five primitive operations; the page-level operations
//! the editor consumes are provided on top of them.

mod autosave;
mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use autosave::{AutoSaveManager, DEFAULT_AUTOSAVE_INTERVAL_SECS};
pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use crate::animation::AnimationState;
use crate::project::{Page, Project};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Invalid operation: {0}")]
    Invalid(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Listing entry for a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub page_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            page_count: project.pages.len(),
            updated_at: project.updated_at,
        }
    }
}

/// One page of a paginated project listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListing {
    pub projects: Vec<ProjectSummary>,
    /// 1-based page index.
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
}

/// Partial update for one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageUpdate {
    pub content: Option<String>,
    pub animations: Option<AnimationState>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl PageUpdate {
    pub fn content(json: impl Into<String>) -> Self {
        Self {
            content: Some(json.into()),
            ..Default::default()
        }
    }

    fn apply(self, page: &mut Page) {
        if let Some(content) = self.content {
            page.set_content(content);
        }
        if self.animations.is_some() {
            page.animations = self.animations;
        }
        if let Some(width) = self.width {
            page.width = width;
        }
        if let Some(height) = self.height {
            page.height = height;
        }
        page.updated_at = Utc::now();
    }
}

/// Project storage backend.
///
/// Implementations can store projects in memory or on the filesystem.
pub trait ProjectStore: Send + Sync {
    /// Save a whole project, replacing any stored version.
    fn save_project(&self, project: &Project) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a project.
    fn load_project(&self, id: &str) -> BoxFuture<'_, StorageResult<Project>>;

    /// Delete a project. Deleting a missing project is not an error.
    fn delete_project(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Every stored project.
    fn all_projects(&self) -> BoxFuture<'_, StorageResult<Vec<Project>>>;

    /// Check if a project exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;

    /// Create a project whose first page holds `content`.
    fn create_project(
        &self,
        name: &str,
        content: Option<String>,
        width: f64,
        height: f64,
    ) -> BoxFuture<'_, StorageResult<Project>> {
        let mut project = Project::new(name, width, height);
        if let (Some(content), Some(page)) = (content, project.pages.first_mut()) {
            page.set_content(content);
        }
        Box::pin(async move {
            self.save_project(&project).await?;
            log::debug!("Created project {}", project.id);
            Ok(project)
        })
    }

    /// Projects ordered by most recent update, `per_page` at a time.
    fn list_projects(&self, page: usize, per_page: usize) -> BoxFuture<'_, StorageResult<ProjectListing>> {
        Box::pin(async move {
            let mut projects = self.all_projects().await?;
            projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            let page = page.max(1);
            let per_page = per_page.max(1);
            let total = projects.len();
            let projects = projects
                .iter()
                .skip((page - 1) * per_page)
                .take(per_page)
                .map(ProjectSummary::from)
                .collect();
            Ok(ProjectListing {
                projects,
                page,
                per_page,
                total,
            })
        })
    }

    fn get_pages(&self, project_id: &str) -> BoxFuture<'_, StorageResult<Vec<Page>>> {
        let id = project_id.to_string();
        Box::pin(async move { Ok(self.load_project(&id).await?.pages) })
    }

    fn update_page(
        &self,
        project_id: &str,
        page_id: &str,
        update: PageUpdate,
    ) -> BoxFuture<'_, StorageResult<Page>> {
        let project_id = project_id.to_string();
        let page_id = page_id.to_string();
        Box::pin(async move {
            let mut project = self.load_project(&project_id).await?;
            let page = project
                .pages
                .iter_mut()
                .find(|p| p.id == page_id)
                .ok_or_else(|| StorageError::NotFound(format!("page {}", page_id)))?;
            update.apply(page);
            let page = page.clone();
            project.updated_at = Utc::now();
            self.save_project(&project).await?;
            Ok(page)
        })
    }

    /// Replace every page of a project (bulk save).
    fn replace_pages(&self, project_id: &str, pages: Vec<Page>) -> BoxFuture<'_, StorageResult<()>> {
        let project_id = project_id.to_string();
        Box::pin(async move {
            if pages.is_empty() {
                return Err(StorageError::Invalid("a project needs at least one page".into()));
            }
            let mut project = self.load_project(&project_id).await?;
            project.pages = pages;
            project.live = project.live.min(project.pages.len() - 1);
            project.updated_at = Utc::now();
            self.save_project(&project).await
        })
    }

    fn add_page(&self, project_id: &str) -> BoxFuture<'_, StorageResult<Page>> {
        let project_id = project_id.to_string();
        Box::pin(async move {
            let mut project = self.load_project(&project_id).await?;
            let index = project.add_page();
            let page = project.pages[index].clone();
            self.save_project(&project).await?;
            Ok(page)
        })
    }

    fn delete_page(&self, project_id: &str, page_id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let project_id = project_id.to_string();
        let page_id = page_id.to_string();
        Box::pin(async move {
            let mut project = self.load_project(&project_id).await?;
            let index = project
                .pages
                .iter()
                .position(|p| p.id == page_id)
                .ok_or_else(|| StorageError::NotFound(format!("page {}", page_id)))?;
            project
                .delete_page(index)
                .ok_or_else(|| StorageError::Invalid("cannot delete the last page".into()))?;
            self.save_project(&project).await
        })
    }

    /// Copy a project and all its pages under new ids.
    fn duplicate_project(&self, project_id: &str) -> BoxFuture<'_, StorageResult<Project>> {
        let project_id = project_id.to_string();
        Box::pin(async move {
            let source = self.load_project(&project_id).await?;
            let mut copy = Project::new(format!("{} (copy)", source.name), 0.0, 0.0);
            copy.pages = source.pages.iter().map(Page::duplicate).collect();
            self.save_project(&copy).await?;
            Ok(copy)
        })
    }
}

/// Minimal executor for driving storage futures in tests.
#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}
