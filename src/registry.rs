use crate::{
    error::{Result, StudioError},
    models::{extension_for_mime, GenerationResult, Project, ProjectStatus},
};
use base64::Engine;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use uuid::Uuid;

const TITLE_LIMIT: usize = 30;

/// Dashboard title: the first 30 characters of the prompt, "..." when cut.
pub fn project_title(prompt: &str) -> String {
    let mut title: String = prompt.chars().take(TITLE_LIMIT).collect();
    if prompt.chars().count() > TITLE_LIMIT {
        title.push_str("...");
    }
    title
}

/// Generated artifacts, newest first. The pipeline hands results here; it never stores them.
#[derive(Debug, Default)]
pub struct AssetRegistry {
    projects: RwLock<Vec<Project>>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, prompt: &str, result: GenerationResult) -> Result<Project> {
        let project = Project {
            id: Uuid::now_v7().to_string(),
            title: project_title(prompt),
            image_url: result.to_data_url(),
            mime_type: result.mime_type,
            status: ProjectStatus::Completed,
            created_at: Utc::now(),
        };

        let mut projects = self
            .projects
            .write()
            .map_err(|_| StudioError::StorageError("asset registry lock poisoned".into()))?;
        projects.insert(0, project.clone());
        log::info!("Registered asset {} ({})", project.id, project.title);
        Ok(project)
    }

    pub fn projects(&self) -> Vec<Project> {
        self.projects
            .read()
            .map(|projects| projects.clone())
            .unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<Project> {
        self.projects
            .read()
            .ok()?
            .iter()
            .find(|project| project.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.projects.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decodes a project's data URL back into bytes and writes it into `dir`.
pub fn save_project(project: &Project, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let payload = project
        .image_url
        .split_once(";base64,")
        .map(|(_, data)| data)
        .ok_or_else(|| StudioError::StorageError("project image is not a base64 data URL".into()))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| StudioError::SerializationError(e.to_string()))?;

    let path = dir.as_ref().join(format!(
        "{}.{}",
        project.id,
        extension_for_mime(&project.mime_type)
    ));
    std::fs::write(&path, bytes)?;
    Ok(path)
}
