//! Durable storage of the latest fitted model.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::task::spawn_blocking;

use crate::prelude::*;
use crate::regression::FittedModel;
use crate::tracing::format_elapsed;

#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Overwrites the stored record, if any.
    async fn save(&self, model: &FittedModel) -> StdResult<(), ModelError>;

    /// Fails with [`ModelError::NotFound`] or [`ModelError::CorruptRecord`].
    async fn load(&self) -> StdResult<FittedModel, ModelError>;

    /// Tells whether a record is present, without validating it.
    async fn exists(&self) -> bool;
}

const FORMAT_VERSION: u32 = 1;

/// On-disk representation of [`FittedModel`].
#[derive(Serialize, Deserialize)]
struct ModelRecord {
    format_version: u32,
    slope: f64,
    intercept: f64,
    r_squared: f64,
    mean_squared_error: f64,
    n_samples: usize,
    trained_at: DateTime<Utc>,
}

impl From<&FittedModel> for ModelRecord {
    fn from(model: &FittedModel) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            slope: model.slope,
            intercept: model.intercept,
            r_squared: model.r_squared,
            mean_squared_error: model.mean_squared_error,
            n_samples: model.n_samples,
            trained_at: model.trained_at,
        }
    }
}

impl ModelRecord {
    /// JSON has no representation for NaN and infinities.
    fn non_finite_field(&self) -> Option<&'static str> {
        [
            ("slope", self.slope),
            ("intercept", self.intercept),
            ("r_squared", self.r_squared),
            ("mean_squared_error", self.mean_squared_error),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(name, _)| name)
    }
}

impl TryFrom<ModelRecord> for FittedModel {
    type Error = ModelError;

    fn try_from(record: ModelRecord) -> StdResult<Self, Self::Error> {
        if record.format_version != FORMAT_VERSION {
            return Err(ModelError::corrupt(format!(
                "unsupported format version {}",
                record.format_version
            )));
        }
        if let Some(name) = record.non_finite_field() {
            return Err(ModelError::corrupt(format!("`{}` is not finite", name)));
        }
        Ok(Self {
            slope: record.slope,
            intercept: record.intercept,
            r_squared: record.r_squared,
            mean_squared_error: record.mean_squared_error,
            n_samples: record.n_samples,
            trained_at: record.trained_at,
        })
    }
}

/// Keeps the record in a single JSON file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ModelStore for FileStore {
    #[instrument(level = "info", skip_all, fields(path = ?self.path))]
    async fn save(&self, model: &FittedModel) -> StdResult<(), ModelError> {
        let start_instant = Instant::now();
        let record = ModelRecord::from(model);
        if let Some(name) = record.non_finite_field() {
            return Err(ModelError::StorageError(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("`{}` is not finite and cannot be stored", name),
            )));
        }
        let path = self.path.clone();
        spawn_blocking(move || write_atomically(&path, &record))
            .await
            .map_err(|error| io::Error::new(io::ErrorKind::Other, error))
            .and_then(|result| result)
            .map_err(ModelError::StorageError)?;
        debug!(elapsed = format_elapsed(start_instant).as_str(), "saved");
        Ok(())
    }

    #[instrument(level = "info", skip_all, fields(path = ?self.path))]
    async fn load(&self) -> StdResult<FittedModel, ModelError> {
        let blob = match tokio::fs::read(&self.path).await {
            Ok(blob) => blob,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(ModelError::NotFound);
            }
            Err(error) => {
                return Err(ModelError::corrupt(format!("failed to read the record: {}", error)));
            }
        };
        let record: ModelRecord =
            serde_json::from_slice(&blob).map_err(|error| ModelError::corrupt(error.to_string()))?;
        FittedModel::try_from(record)
    }

    async fn exists(&self) -> bool {
        tokio::fs::metadata(&self.path)
            .await
            .map(|metadata| metadata.is_file())
            .unwrap_or(false)
    }
}

/// Writes into a temporary file next to the target and renames it over the target,
/// so that readers never see a partially written record.
fn write_atomically(path: &Path, record: &ModelRecord) -> io::Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(directory)?;
    let mut file = NamedTempFile::new_in(directory)?;
    serde_json::to_writer_pretty(&mut file, record)?;
    file.write_all(b"\n")?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    Ok(())
}
