//! Model management for ONNX Runtime
//!
//! Handles locating, downloading, and loading the PaddleOCR models.

use anyhow::{Context, Result};
use futures_util::StreamExt;
use ort::session::{builder::GraphOptimizationLevel, Session};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

/// Set to forbid network access when models are missing
pub const OFFLINE_ENV: &str = "BOAT_PLATE_OFFLINE";

/// Model identifier for PaddleOCR components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    /// Text detection model (DBNet)
    Detection,
    /// Text recognition model (CRNN)
    Recognition,
    /// Character dictionary for recognition
    Dictionary,
}

impl ModelType {
    pub const ALL: [ModelType; 3] = [ModelType::Detection, ModelType::Recognition, ModelType::Dictionary];

    /// Get the filename for this model type
    pub fn filename(&self) -> &'static str {
        match self {
            ModelType::Detection => "det.onnx",
            ModelType::Recognition => "rec.onnx",
            ModelType::Dictionary => "dict.txt",
        }
    }

    /// Download URL (PaddleOCR ONNX exports on Hugging Face).
    /// Hull plates carry Chinese port names, so the Chinese recognizer is used.
    pub fn download_url(&self) -> &'static str {
        match self {
            ModelType::Detection => {
                "https://huggingface.co/monkt/paddleocr-onnx/resolve/main/detection/v3/det.onnx"
            }
            ModelType::Recognition => {
                "https://huggingface.co/monkt/paddleocr-onnx/resolve/main/languages/chinese/rec.onnx"
            }
            ModelType::Dictionary => {
                "https://huggingface.co/monkt/paddleocr-onnx/resolve/main/languages/chinese/dict.txt"
            }
        }
    }

    /// Plausible file size range in bytes, used to reject truncated files
    pub fn expected_size_range(&self) -> (u64, u64) {
        match self {
            ModelType::Detection => (1_000_000, 50_000_000),
            ModelType::Recognition => (1_000_000, 50_000_000),
            ModelType::Dictionary => (100, 1_000_000),
        }
    }

    /// Display name for progress reporting
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelType::Detection => "Text Detection",
            ModelType::Recognition => "Text Recognition",
            ModelType::Dictionary => "Character Dictionary",
        }
    }
}

/// Model manifest tracking downloaded models
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelManifest {
    pub version: String,
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub filename: String,
    pub size_bytes: u64,
    pub sha256: String,
    /// Unix seconds
    pub downloaded_at: u64,
}

impl Default for ModelManifest {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            models: Vec::new(),
        }
    }
}

/// Resolves model files in a directory, downloading missing ones on request
pub struct ModelManager {
    models_dir: PathBuf,
}

impl ModelManager {
    /// Model manager rooted at `<data_dir>/models`
    pub fn new() -> Result<Self> {
        let data_dir = crate::storage::get_data_dir()?;
        Self::with_dir(data_dir.join("models"))
    }

    /// Create model manager with custom directory
    pub fn with_dir(models_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&models_dir)
            .with_context(|| format!("Failed to create model directory {:?}", models_dir))?;
        Ok(Self { models_dir })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Get the path to a specific model file
    pub fn model_path(&self, model_type: ModelType) -> PathBuf {
        self.models_dir.join(model_type.filename())
    }

    /// Check if a model is present with a plausible size
    pub fn is_model_available(&self, model_type: ModelType) -> bool {
        match std::fs::metadata(self.model_path(model_type)) {
            Ok(metadata) => {
                let (min, max) = model_type.expected_size_range();
                (min..=max).contains(&metadata.len())
            }
            Err(_) => false,
        }
    }

    /// Check if all required models are available
    pub fn are_models_ready(&self) -> bool {
        ModelType::ALL.iter().all(|&m| self.is_model_available(m))
    }

    /// Availability and on-disk size of every model
    pub fn get_model_status(&self) -> Vec<(ModelType, bool, Option<u64>)> {
        ModelType::ALL
            .iter()
            .map(|&model_type| {
                let size = std::fs::metadata(self.model_path(model_type)).ok().map(|m| m.len());
                (model_type, self.is_model_available(model_type), size)
            })
            .collect()
    }

    /// Return the model path, downloading the file first if allowed and missing
    pub fn ensure_model(&self, model_type: ModelType, allow_download: bool) -> Result<PathBuf> {
        let path = self.model_path(model_type);

        if self.is_model_available(model_type) {
            debug!("Model {:?} available at {:?}", model_type, path);
            return Ok(path);
        }

        if !allow_download {
            anyhow::bail!(
                "{} model missing at {:?} and automatic download is disabled",
                model_type.display_name(),
                path
            );
        }

        self.download_model(model_type)?;
        Ok(path)
    }

    /// Download a specific model (blocking)
    fn download_model(&self, model_type: ModelType) -> Result<()> {
        let url = model_type.download_url();
        let path = self.model_path(model_type);

        if std::env::var_os(OFFLINE_ENV).is_some() {
            anyhow::bail!(
                "Offline mode: cannot download models. Please download manually from {} and place at {:?}",
                url,
                path
            );
        }

        info!("Downloading {} model from {}", model_type.display_name(), url);

        let rt = Runtime::new().context("Failed to create tokio runtime")?;
        let (size, hash) = rt.block_on(download_file(url, &path))?;

        if !self.is_model_available(model_type) {
            anyhow::bail!("Download completed but model verification failed");
        }

        self.record_download(model_type, size, hash)?;

        info!("Successfully downloaded {} model ({} bytes)", model_type.display_name(), size);
        Ok(())
    }

    fn record_download(&self, model_type: ModelType, size_bytes: u64, sha256: String) -> Result<()> {
        let mut manifest = self.load_manifest().unwrap_or_else(|e| {
            warn!("Ignoring unreadable model manifest: {}", e);
            ModelManifest::default()
        });

        let model_info = ModelInfo {
            model_type: format!("{:?}", model_type),
            filename: model_type.filename().to_string(),
            size_bytes,
            sha256,
            downloaded_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        };

        if let Some(existing) = manifest.models.iter_mut().find(|m| m.filename == model_info.filename) {
            *existing = model_info;
        } else {
            manifest.models.push(model_info);
        }

        self.save_manifest(&manifest)
    }

    /// Load the model manifest
    pub fn load_manifest(&self) -> Result<ModelManifest> {
        let manifest_path = self.models_dir.join("manifest.json");
        if manifest_path.exists() {
            let content = std::fs::read_to_string(&manifest_path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(ModelManifest::default())
        }
    }

    /// Save the model manifest
    pub fn save_manifest(&self, manifest: &ModelManifest) -> Result<()> {
        let manifest_path = self.models_dir.join("manifest.json");
        let content = serde_json::to_string_pretty(manifest)?;
        std::fs::write(manifest_path, content)?;
        Ok(())
    }
}

/// Stream `url` into `path` via a temp file; returns (bytes, sha256 hex)
async fn download_file(url: &str, path: &Path) -> Result<(u64, String)> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .context("Failed to send download request")?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let total_size = response.content_length();
    debug!("Download size: {:?} bytes", total_size);

    let temp_path = path.with_extension("tmp");
    let mut file = std::fs::File::create(&temp_path).context("Failed to create temp file")?;

    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Error reading download stream")?;
        file.write_all(&chunk).context("Failed to write to temp file")?;
        hasher.update(&chunk);
        downloaded += chunk.len() as u64;
    }

    file.flush().context("Failed to flush temp file")?;
    drop(file);

    std::fs::rename(&temp_path, path).context("Failed to move downloaded file to final location")?;

    Ok((downloaded, format!("{:x}", hasher.finalize())))
}

/// Build an ONNX Runtime session, trying the GPU provider first when asked
pub fn load_session(model_path: &Path, use_gpu: bool) -> Result<Session> {
    info!("Loading ONNX model from {:?}", model_path);

    let builder = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(4)?;

    let builder = if use_gpu {
        use ort::execution_providers::CUDAExecutionProvider;
        match builder.with_execution_providers([CUDAExecutionProvider::default().build()]) {
            Ok(builder) => {
                info!("GPU execution provider registered");
                builder
            }
            Err(e) => {
                warn!("GPU not available, using CPU: {}", e);
                Session::builder()?
                    .with_optimization_level(GraphOptimizationLevel::Level3)?
                    .with_intra_threads(4)?
            }
        }
    } else {
        builder
    };

    let session = builder
        .commit_from_file(model_path)
        .with_context(|| format!("Failed to load ONNX model {:?}", model_path))?;

    let input_names: Vec<&str> = session.inputs.iter().map(|i| i.name.as_str()).collect();
    let output_names: Vec<&str> = session.outputs.iter().map(|o| o.name.as_str()).collect();
    info!("Model loaded. Inputs: {:?}, Outputs: {:?}", input_names, output_names);

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_model_type_filenames() {
        assert_eq!(ModelType::Detection.filename(), "det.onnx");
        assert_eq!(ModelType::Recognition.filename(), "rec.onnx");
        assert_eq!(ModelType::Dictionary.filename(), "dict.txt");
    }

    #[test]
    fn test_empty_dir_has_no_models() {
        let dir = tempdir().unwrap();
        let manager = ModelManager::with_dir(dir.path().join("models")).unwrap();

        assert!(!manager.are_models_ready());
        let status = manager.get_model_status();
        assert_eq!(status.len(), 3);
        assert!(status.iter().all(|(_, available, size)| !available && size.is_none()));
    }

    #[test]
    fn test_truncated_file_is_not_available() {
        let dir = tempdir().unwrap();
        let manager = ModelManager::with_dir(dir.path().to_path_buf()).unwrap();
        std::fs::write(manager.model_path(ModelType::Detection), b"tiny").unwrap();
        std::fs::write(manager.model_path(ModelType::Dictionary), "A\n".repeat(100)).unwrap();

        assert!(!manager.is_model_available(ModelType::Detection));
        assert!(manager.is_model_available(ModelType::Dictionary));
    }

    #[test]
    fn test_missing_model_without_download_fails() {
        let dir = tempdir().unwrap();
        let manager = ModelManager::with_dir(dir.path().to_path_buf()).unwrap();

        let result = manager.ensure_model(ModelType::Recognition, false);
        assert!(result.is_err());
    }

    #[test]
    fn test_manifest_roundtrip() {
        let dir = tempdir().unwrap();
        let manager = ModelManager::with_dir(dir.path().to_path_buf()).unwrap();

        manager.record_download(ModelType::Detection, 42, "abc".to_string()).unwrap();
        manager.record_download(ModelType::Detection, 43, "def".to_string()).unwrap();

        let manifest = manager.load_manifest().unwrap();
        assert_eq!(manifest.models.len(), 1);
        assert_eq!(manifest.models[0].size_bytes, 43);
        assert_eq!(manifest.models[0].sha256, "def");
    }
}
