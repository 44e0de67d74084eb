//! The active project's paths, produced by the startup wizard.

use std::path::{Path, PathBuf};

pub const DEFAULT_PROJECT_NAME: &str = "ClickShot_Project";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No save folder was chosen")]
    MissingFolder,

    #[error("Failed to create project directory {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Immutable record of one project. Switching projects builds a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub base_folder: PathBuf,
    pub project_name: String,
    pub template_path: Option<PathBuf>,
    pub project_dir: PathBuf,
    /// Slide deck (.pptx)
    pub deck_path: PathBuf,
    /// Paginated document (.docx)
    pub document_path: PathBuf,
}

impl Session {
    /// Lay out the project under `base_folder`, creating its directory.
    ///
    /// Both artifacts are named after the project directory itself.
    pub fn create(
        base_folder: &Path,
        project_name: &str,
        template_path: Option<PathBuf>,
    ) -> Result<Self, SessionError> {
        if base_folder.as_os_str().is_empty() {
            return Err(SessionError::MissingFolder);
        }

        let project_name = match project_name.trim() {
            "" => DEFAULT_PROJECT_NAME.to_string(),
            name => name.to_string(),
        };
        let dir_name = project_name.replace(' ', "_");
        let project_dir = base_folder.join(&dir_name);

        std::fs::create_dir_all(&project_dir).map_err(|source| SessionError::Io {
            path: project_dir.clone(),
            source,
        })?;

        Ok(Self {
            base_folder: base_folder.to_path_buf(),
            project_name,
            template_path,
            deck_path: project_dir.join(format!("{dir_name}.pptx")),
            document_path: project_dir.join(format!("{dir_name}.docx")),
            project_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_layout() {
        let base = tempfile::tempdir().unwrap();
        let session = Session::create(base.path(), "Release Notes", None).unwrap();

        assert_eq!(session.project_name, "Release Notes");
        assert_eq!(session.project_dir, base.path().join("Release_Notes"));
        assert!(session.project_dir.is_dir());
        assert_eq!(
            session.deck_path,
            base.path().join("Release_Notes").join("Release_Notes.pptx")
        );
        assert_eq!(
            session.document_path,
            base.path().join("Release_Notes").join("Release_Notes.docx")
        );
    }

    #[test]
    fn test_blank_project_name_uses_default() {
        let base = tempfile::tempdir().unwrap();
        let session = Session::create(base.path(), "   ", None).unwrap();
        assert_eq!(session.project_name, DEFAULT_PROJECT_NAME);
        assert!(session.project_dir.ends_with(DEFAULT_PROJECT_NAME));
    }

    #[test]
    fn test_missing_folder_is_rejected() {
        let result = Session::create(Path::new(""), "x", None);
        assert!(matches!(result, Err(SessionError::MissingFolder)));
    }
}
