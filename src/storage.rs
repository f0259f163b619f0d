use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{AppError, Result};

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Resume,
    CoverLetter,
}

impl DocumentKind {
    pub fn code(self) -> &'static str {
        match self {
            DocumentKind::Resume => "curriculo",
            DocumentKind::CoverLetter => "carta",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub kind: DocumentKind,
    pub file_name: String,
    pub data: Vec<u8>,
}

fn extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase()
}

pub fn mime_type(file_name: &str) -> &'static str {
    match extension(file_name).as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Rejects empty, oversized and non PDF/DOC/DOCX documents.
pub fn validate_upload(upload: &Upload) -> Result<()> {
    if upload.data.is_empty() {
        return Err(AppError::Validation(format!(
            "{} file is empty",
            upload.kind.code()
        )));
    }
    if upload.data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(
            "file too large, maximum size is 5MB".into(),
        ));
    }
    if !ALLOWED_EXTENSIONS.contains(&extension(&upload.file_name).as_str()) {
        return Err(AppError::Validation(
            "invalid file type, only PDF, DOC and DOCX files are allowed".into(),
        ));
    }
    Ok(())
}

/// Keeps ASCII letters, digits, dots and dashes; everything else becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `candidatos/<millis>_<8 hex>_<kind>_<safe name>`. The random segment keeps
/// same-millisecond uploads of equally named files apart.
pub fn object_path(upload: &Upload, now: DateTime<Utc>) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    format!(
        "candidatos/{}_{}_{}_{}",
        now.timestamp_millis(),
        &nonce[..8],
        upload.kind.code(),
        sanitize_file_name(&upload.file_name)
    )
}

#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn put(&self, path: &str, data: &[u8], content_type: &str) -> Result<()>;
    async fn delete(&self, path: &str) -> Result<()>;
}

/// Stores documents under a local directory.
pub struct FsBlobStorage {
    root: PathBuf,
}

impl FsBlobStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsBlobStorage { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(AppError::Validation(format!("invalid object path `{path}`")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStorage for FsBlobStorage {
    async fn put(&self, path: &str, data: &[u8], content_type: &str) -> Result<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::upstream("storage", e))?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .map_err(|e| AppError::upstream("storage", e))?;
        file.write_all(data)
            .await
            .map_err(|e| AppError::upstream("storage", e))?;
        file.flush().await.map_err(|e| AppError::upstream("storage", e))?;
        tracing::debug!(path, content_type, bytes = data.len(), "stored document");
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::upstream("storage", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn upload(name: &str, size: usize) -> Upload {
        Upload {
            kind: DocumentKind::Resume,
            file_name: name.into(),
            data: vec![1; size],
        }
    }

    #[test]
    fn accepts_office_documents_up_to_five_megabytes() {
        assert!(validate_upload(&upload("cv.PDF", 10)).is_ok());
        assert!(validate_upload(&upload("cv.docx", MAX_UPLOAD_BYTES)).is_ok());
        assert!(validate_upload(&upload("cv.pdf", MAX_UPLOAD_BYTES + 1)).is_err());
        assert!(validate_upload(&upload("cv.exe", 10)).is_err());
        assert!(validate_upload(&upload("cv.pdf", 0)).is_err());
    }

    #[test]
    fn object_paths_are_sanitized_and_timestamped() {
        let now = Utc.timestamp_millis_opt(1_760_000_000_000).unwrap();
        let file = upload("Currículo João (final).pdf", 1);
        let path = object_path(&file, now);
        let rest = path.strip_prefix("candidatos/1760000000000_").unwrap();
        let (nonce, name) = rest.split_once('_').unwrap();
        assert_eq!(nonce.len(), 8);
        assert!(nonce.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(name, "curriculo_Curr_culo_Jo_o__final_.pdf");
        assert_ne!(object_path(&file, now), path);
        assert_eq!(mime_type("a.doc"), "application/msword");
    }

    #[tokio::test]
    async fn filesystem_storage_refuses_escaping_paths() {
        let root = std::env::temp_dir().join(format!("blobs-{}", uuid::Uuid::new_v4()));
        let storage = FsBlobStorage::new(&root);
        assert!(storage.put("../outside.pdf", b"x", "application/pdf").await.is_err());

        storage
            .put("candidatos/1_curriculo_cv.pdf", b"pdf", "application/pdf")
            .await
            .unwrap();
        assert!(root.join("candidatos/1_curriculo_cv.pdf").exists());
        storage.delete("candidatos/1_curriculo_cv.pdf").await.unwrap();
        assert!(!root.join("candidatos/1_curriculo_cv.pdf").exists());
        let _ = std::fs::remove_dir_all(root);
    }
}
