//! The single shared model slot.

use serde::Serialize;
use tokio::sync::RwLock;

use crate::persistence::ModelStore;
use crate::prelude::*;
use crate::regression::FittedModel;

/// Where the currently held model comes from.
#[derive(Debug, Clone)]
enum ModelSlot {
    Empty,
    LoadedFromDisk(Arc<FittedModel>),
    TrainedInMemory(Arc<FittedModel>),
}

impl ModelSlot {
    fn model(&self) -> Option<&Arc<FittedModel>> {
        match self {
            Self::Empty => None,
            Self::LoadedFromDisk(model) | Self::TrainedInMemory(model) => Some(model),
        }
    }

    const fn source(&self) -> ModelSource {
        match self {
            Self::Empty => ModelSource::Empty,
            Self::LoadedFromDisk(_) => ModelSource::LoadedFromDisk,
            Self::TrainedInMemory(_) => ModelSource::TrainedInMemory,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    Empty,
    LoadedFromDisk,
    TrainedInMemory,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ModelStatus {
    pub trained: bool,
    pub persisted_exists: bool,
    pub source: ModelSource,
}

/// Holds at most one fitted model and mirrors it to the store.
///
/// Installing and loading are exclusive, predictions share the read lock.
pub struct ModelState {
    slot: RwLock<ModelSlot>,
    store: Arc<dyn ModelStore>,
}

impl ModelState {
    pub fn new(store: Arc<dyn ModelStore>) -> Self {
        Self {
            slot: RwLock::new(ModelSlot::Empty),
            store,
        }
    }

    /// Replaces the held model wholesale, without saving it.
    #[cfg(test)]
    pub async fn install(&self, model: FittedModel) -> Arc<FittedModel> {
        Self::install_into(&mut *self.slot.write().await, model)
    }

    fn install_into(slot: &mut ModelSlot, model: FittedModel) -> Arc<FittedModel> {
        let model = Arc::new(model);
        *slot = ModelSlot::TrainedInMemory(model.clone());
        model
    }

    /// Installs the model and saves it while still holding the slot,
    /// so that the memory and the store agree on the last writer.
    ///
    /// A failed save keeps the new model installed.
    #[instrument(level = "info", skip_all)]
    pub async fn install_and_save(
        &self,
        model: FittedModel,
    ) -> StdResult<Arc<FittedModel>, ModelError> {
        let mut slot = self.slot.write().await;
        let model = Self::install_into(&mut slot, model);
        if let Err(error) = self.store.save(&model).await {
            error!(?error, "the model is installed but not saved");
            return Err(error);
        }
        Ok(model)
    }

    /// Returns the held model, loading it from the store when the slot is empty.
    #[instrument(level = "debug", skip_all)]
    pub async fn get_or_load(&self) -> StdResult<Arc<FittedModel>, ModelError> {
        if let Some(model) = self.slot.read().await.model() {
            return Ok(model.clone());
        }

        let mut slot = self.slot.write().await;
        if let Some(model) = slot.model() {
            // Somebody has installed or loaded it while we were waiting.
            return Ok(model.clone());
        }
        match self.store.load().await {
            Ok(model) => {
                info!(slope = model.slope, intercept = model.intercept, "loaded the stored model");
                let model = Arc::new(model);
                *slot = ModelSlot::LoadedFromDisk(model.clone());
                Ok(model)
            }
            Err(ModelError::NotFound) => Err(ModelError::NotTrained),
            Err(error) => {
                warn!("unable to load the stored model: {}", error);
                Err(ModelError::NotTrained)
            }
        }
    }

    pub async fn status(&self) -> ModelStatus {
        let source = self.slot.read().await.source();
        ModelStatus {
            trained: source != ModelSource::Empty,
            persisted_exists: self.store.exists().await,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use async_trait::async_trait;
    use tempfile::{tempdir, TempDir};

    use super::*;
    use crate::persistence::FileStore;
    use crate::regression::{fit, predict};

    fn new_state(directory: &TempDir) -> ModelState {
        ModelState::new(Arc::new(FileStore::new(directory.path().join("model.json"))))
    }

    /// Accepts nothing and remembers whatever has been there before.
    struct ReadOnlyStore(FileStore);

    #[async_trait]
    impl ModelStore for ReadOnlyStore {
        async fn save(&self, _model: &FittedModel) -> StdResult<(), ModelError> {
            Err(ModelError::StorageError(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }

        async fn load(&self) -> StdResult<FittedModel, ModelError> {
            self.0.load().await
        }

        async fn exists(&self) -> bool {
            self.0.exists().await
        }
    }

    #[tokio::test]
    async fn initial_status_ok() -> Result {
        let directory = tempdir()?;
        let status = new_state(&directory).status().await;
        assert!(!status.trained);
        assert!(!status.persisted_exists);
        assert_eq!(status.source, ModelSource::Empty);
        Ok(())
    }

    #[tokio::test]
    async fn not_trained_error() -> Result {
        let directory = tempdir()?;
        let state = new_state(&directory);
        assert!(matches!(state.get_or_load().await, Err(ModelError::NotTrained)));
        assert!(!state.status().await.trained);
        Ok(())
    }

    #[tokio::test]
    async fn install_and_save_ok() -> Result {
        let directory = tempdir()?;
        let state = new_state(&directory);
        let model = state.install_and_save(fit(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0])?).await?;

        let status = state.status().await;
        assert!(status.trained);
        assert!(status.persisted_exists);
        assert_eq!(status.source, ModelSource::TrainedInMemory);
        assert!(Arc::ptr_eq(&state.get_or_load().await?, &model));
        Ok(())
    }

    #[tokio::test]
    async fn install_without_store_ok() -> Result {
        let directory = tempdir()?;
        let state = new_state(&directory);
        state.install(fit(&[1.0, 2.0], &[2.0, 4.0])?).await;

        let status = state.status().await;
        assert!(status.trained);
        assert!(!status.persisted_exists);
        Ok(())
    }

    #[tokio::test]
    async fn loads_after_restart_ok() -> Result {
        let directory = tempdir()?;
        let trained = new_state(&directory)
            .install_and_save(fit(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0])?)
            .await?;

        let restarted = new_state(&directory);
        let status = restarted.status().await;
        assert!(!status.trained);
        assert!(status.persisted_exists);

        let loaded = restarted.get_or_load().await?;
        assert_eq!(*loaded, *trained);
        assert_eq!(predict(&loaded, &[10.0])?, vec![20.0]);
        assert_eq!(restarted.status().await.source, ModelSource::LoadedFromDisk);
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_record_is_not_trained_error() -> Result {
        let directory = tempdir()?;
        std::fs::write(directory.path().join("model.json"), "{\"slope\": ")?;
        let state = new_state(&directory);
        assert!(matches!(state.get_or_load().await, Err(ModelError::NotTrained)));

        let status = state.status().await;
        assert!(!status.trained);
        assert!(status.persisted_exists);
        Ok(())
    }

    #[tokio::test]
    async fn failed_save_keeps_previous_record_ok() -> Result {
        let directory = tempdir()?;
        let path = directory.path().join("model.json");
        let previous = fit(&[1.0, 2.0], &[1.0, 2.0])?;
        FileStore::new(&path).save(&previous).await?;

        let state = ModelState::new(Arc::new(ReadOnlyStore(FileStore::new(&path))));
        let result = state.install_and_save(fit(&[1.0, 2.0], &[7.0, 3.0])?).await;
        assert!(matches!(result, Err(ModelError::StorageError(_))));

        let status = state.status().await;
        assert!(status.trained, "the new model must stay usable");
        assert!(status.persisted_exists);
        assert!((state.get_or_load().await?.slope + 4.0).abs() < 1e-12);
        assert_eq!(FileStore::new(&path).load().await?, previous);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_training_ok() -> Result {
        let directory = tempdir()?;
        let state = Arc::new(new_state(&directory));
        let first = fit(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0])?;
        let second = fit(&[1.0, 2.0, 3.0], &[-1.0, -4.0, -7.0])?;

        let handles = [first.clone(), second.clone()].map(|model| {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.install_and_save(model).await })
        });
        for handle in handles {
            handle.await??;
        }

        let held = state.get_or_load().await?;
        assert!(*held == first || *held == second);
        assert_eq!(FileStore::new(directory.path().join("model.json")).load().await?, *held);
        assert!(state.status().await.trained);
        Ok(())
    }

    #[tokio::test]
    async fn overflowing_fit_leaves_slot_empty_ok() -> Result {
        let directory = tempdir()?;
        let state = new_state(&directory);
        let result = fit(&[0.0, 1.0, 2.0], &[1e200, -1e200, 1e200]);
        assert!(matches!(result, Err(ModelError::DegenerateInput(_))));

        let status = state.status().await;
        assert!(!status.trained);
        assert!(!status.persisted_exists);
        Ok(())
    }

    #[tokio::test]
    async fn large_values_survive_restart_ok() -> Result {
        let directory = tempdir()?;
        let trained = new_state(&directory)
            .install_and_save(fit(&[0.0, 1.0, 2.0], &[1e150, -1e150, 1e150])?)
            .await?;
        let loaded = new_state(&directory).get_or_load().await?;
        assert_eq!(*loaded, *trained);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn loading_races_training_ok() -> Result {
        for _ in 0..16 {
            let directory = tempdir()?;
            let stored = fit(&[0.0, 1.0], &[1.0, 3.0])?;
            FileStore::new(directory.path().join("model.json")).save(&stored).await?;
            let trained = fit(&[0.0, 1.0], &[5.0, -1.0])?;

            let state = Arc::new(new_state(&directory));
            let loading = {
                let state = Arc::clone(&state);
                tokio::spawn(async move { state.get_or_load().await })
            };
            let training = {
                let state = Arc::clone(&state);
                let trained = trained.clone();
                tokio::spawn(async move { state.install_and_save(trained).await })
            };
            let loaded = loading.await??;
            training.await??;

            assert!(*loaded == stored || *loaded == trained);
            let held = state.get_or_load().await?;
            assert_eq!(*held, trained, "training always ends up installed");
            assert_eq!(state.status().await.source, ModelSource::TrainedInMemory);
            assert_eq!(FileStore::new(directory.path().join("model.json")).load().await?, *held);
        }
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_loading_ok() -> Result {
        let directory = tempdir()?;
        let model = fit(&[0.0, 1.0], &[1.0, 3.0])?;
        FileStore::new(directory.path().join("model.json")).save(&model).await?;

        let state = Arc::new(new_state(&directory));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = Arc::clone(&state);
                tokio::spawn(async move { state.get_or_load().await })
            })
            .collect();
        let mut loaded = Vec::new();
        for handle in handles {
            loaded.push(handle.await??);
        }
        assert!(loaded.iter().all(|held| Arc::ptr_eq(held, &loaded[0])));
        assert_eq!(*loaded[0], model);
        Ok(())
    }
}
