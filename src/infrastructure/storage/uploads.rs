use std::fs;
use std::path::{Path, PathBuf};

use crate::{application::services::ImageStore, domain::DomainError};

/// Uploaded images stored as plain files, later served under `/uploads/`.
pub struct UploadDirectory {
    root: PathBuf,
}

impl UploadDirectory {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, DomainError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|err| {
            DomainError::storage(format!("failed to create uploads directory {:?}: {err}", root))
        })?;
        Ok(Self { root })
    }
}

/// Reduces a client-supplied file name to its final path component.
pub fn sanitize_file_name(file_name: &str) -> Result<String, DomainError> {
    let candidate = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if candidate.is_empty() || candidate == "." || candidate == ".." {
        return Err(DomainError::validation(format!(
            "invalid file name `{file_name}`"
        )));
    }
    if candidate.chars().any(char::is_control) {
        return Err(DomainError::validation("file name contains control characters"));
    }
    Ok(candidate.to_string())
}

impl ImageStore for UploadDirectory {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, DomainError> {
        let stored_name = sanitize_file_name(file_name)?;
        let target = self.root.join(&stored_name);

        fs::write(&target, bytes).map_err(|err| {
            DomainError::storage(format!("file upload failed for {:?}: {err}", target))
        })?;

        Ok(stored_name)
    }

    fn root(&self) -> &Path {
        &self.root
    }
}
