use crate::config::logging::secure_log;
use crate::config::parameter;
use crate::error::api_error::ApiError;
use crate::error::media_error::MediaError;
use crate::error::request_error::RequestError;
use async_trait::async_trait;
use axum::extract::Multipart;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of a successful upload to object storage
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedMedia {
    pub url: String,
}

/// Object storage collaborator. A `None` result means the upload produced
/// no usable URL; callers decide what that means for their flow.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    async fn upload(&self, local_path: &Path) -> Option<UploadedMedia>;
}

/// A request file written to the staging directory. The file is removed
/// when the guard drops, whether or not it was uploaded.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    size: u64,
}

impl StagedFile {
    /// Take ownership of a file already on disk
    pub fn from_path(path: PathBuf) -> std::io::Result<Self> {
        let size = std::fs::metadata(&path)?.len();
        Ok(Self { path, size })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!("Failed to remove staged file {:?}: {}", self.path, e);
        }
    }
}

/// Text fields and staged files of one multipart request
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    files: HashMap<String, StagedFile>,
}

impl MultipartForm {
    /// Drain a multipart body. Parts named in `file_fields` are streamed to
    /// `staging_dir`; only the first non-empty file per name is kept.
    pub async fn read(
        mut multipart: Multipart,
        staging_dir: &Path,
        file_fields: &[&str],
    ) -> Result<Self, ApiError> {
        let mut form = MultipartForm::default();
        ensure_staging_dir(staging_dir).await.map_err(MediaError::from)?;

        while let Some(mut field) = multipart.next_field().await.map_err(RequestError::from)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if !file_fields.contains(&name.as_str()) {
                let value = field.text().await.map_err(RequestError::from)?;
                form.fields.insert(name, value);
                continue;
            }

            if form.files.contains_key(&name) {
                continue;
            }

            let extension = field
                .file_name()
                .and_then(|file_name| Path::new(file_name).extension())
                .and_then(|ext| ext.to_str())
                .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
                .map(|ext| format!(".{}", ext.to_lowercase()))
                .unwrap_or_default();

            let path = staging_dir.join(format!("{}{}", Uuid::new_v4(), extension));
            let mut staged = StagedFile { path, size: 0 };
            let mut file = tokio::fs::File::create(&staged.path).await.map_err(MediaError::from)?;

            while let Some(chunk) = field.chunk().await.map_err(RequestError::from)? {
                file.write_all(&chunk).await.map_err(MediaError::from)?;
                staged.size += chunk.len() as u64;
            }
            file.flush().await.map_err(MediaError::from)?;

            // browsers send an empty part when no file was chosen
            if staged.size > 0 {
                form.files.insert(name, staged);
            }
        }

        Ok(form)
    }

    pub fn take_file(&mut self, name: &str) -> Option<StagedFile> {
        self.files.remove(name)
    }
}

pub async fn ensure_staging_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await
}

#[derive(Deserialize)]
struct CloudinaryUploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
}

/// Signed uploads to Cloudinary with `resource_type=auto`
pub struct CloudinaryStorage {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: Option<String>,
}

impl CloudinaryStorage {
    pub fn new(cloud_name: String, api_key: String, api_secret: String, folder: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name,
            api_key,
            api_secret,
            folder,
        }
    }

    /// Built only when all three credentials are configured
    pub fn from_parameters() -> Option<Self> {
        Some(Self::new(
            parameter::get_optional("CLOUDINARY_CLOUD_NAME")?,
            parameter::get_optional("CLOUDINARY_API_KEY")?,
            parameter::get_optional("CLOUDINARY_API_SECRET")?,
            parameter::get_optional("CLOUDINARY_FOLDER"),
        ))
    }

    fn endpoint(&self) -> String {
        format!("https://api.cloudinary.com/v1_1/{}/auto/upload", self.cloud_name)
    }

    /// Signature over the alphabetically sorted signed parameters
    fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by_key(|(key, _)| *key);
        let joined = sorted
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(joined.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    async fn try_upload(&self, local_path: &Path) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        let bytes = tokio::fs::read(local_path).await?;
        let file_name = local_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();

        let mut signed = vec![("timestamp", chrono::Utc::now().timestamp().to_string())];
        if let Some(folder) = &self.folder {
            signed.push(("folder", folder.clone()));
        }
        let signature = self.sign(&signed);

        let mut form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name))
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in signed {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json::<CloudinaryUploadResponse>()
            .await?;

        Ok(response.secure_url.or(response.url))
    }
}

#[async_trait]
impl MediaStorage for CloudinaryStorage {
    async fn upload(&self, local_path: &Path) -> Option<UploadedMedia> {
        match self.try_upload(local_path).await {
            Ok(Some(url)) => {
                info!("Media uploaded to Cloudinary");
                Some(UploadedMedia { url })
            }
            Ok(None) => {
                warn!("Cloudinary upload response carried no URL");
                None
            }
            Err(e) => {
                secure_log::secure_error!("Cloudinary upload failed", e);
                None
            }
        }
    }
}

/// Keeps media on local disk and serves it under `public_base`.
/// Used when no object storage is configured.
pub struct LocalDiskStorage {
    root: PathBuf,
    public_base: String,
}

impl LocalDiskStorage {
    pub fn new(root: PathBuf, public_base: impl Into<String>) -> Self {
        Self {
            root,
            public_base: public_base.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl MediaStorage for LocalDiskStorage {
    async fn upload(&self, local_path: &Path) -> Option<UploadedMedia> {
        let file_name = local_path.file_name()?.to_str()?.to_string();
        if let Err(e) = tokio::fs::create_dir_all(&self.root).await {
            secure_log::secure_error!("Failed to create media directory", e);
            return None;
        }
        match tokio::fs::copy(local_path, self.root.join(&file_name)).await {
            Ok(_) => Some(UploadedMedia {
                url: format!("{}/{}", self.public_base.trim_end_matches('/'), file_name),
            }),
            Err(e) => {
                secure_log::secure_error!("Failed to store media on disk", e);
                None
            }
        }
    }
}

/// Local directory exposed over HTTP when media is kept on disk
#[derive(Clone, Debug)]
pub struct MediaMount {
    pub route: String,
    pub dir: PathBuf,
}

/// Cloudinary when credentials are present, local disk otherwise
pub fn storage_from_parameters() -> (Arc<dyn MediaStorage>, Option<MediaMount>) {
    if let Some(cloudinary) = CloudinaryStorage::from_parameters() {
        info!("Media storage: Cloudinary");
        return (Arc::new(cloudinary), None);
    }

    let dir = PathBuf::from(parameter::get("MEDIA_DIR"));
    let route = parameter::get("MEDIA_BASE_URL");
    info!("Media storage: local disk at {:?}", dir);

    // only a path on this server can be mounted
    let mount = (route.starts_with('/') && route.len() > 1).then(|| MediaMount {
        route: route.trim_end_matches('/').to_string(),
        dir: dir.clone(),
    });
    (Arc::new(LocalDiskStorage::new(dir, route)), mount)
}
