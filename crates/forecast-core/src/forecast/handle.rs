//! Process-wide lazily loaded model

use super::device::{Device, DevicePreference};
use super::model::{SequenceModel, TransAm};
use super::weights::ModelWeights;
use crate::error::{ForecastError, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{error, info};

type Loader = Box<dyn Fn() -> Result<Arc<dyn SequenceModel>> + Send + Sync>;
type Loaded = std::result::Result<Arc<dyn SequenceModel>, String>;

/// Shared read-only model, loaded on first use
///
/// Concurrent first callers serialise on an init lock so the loader runs
/// at most once. The outcome is kept either way: after a failed load every
/// call returns the same [`ForecastError::ModelLoadFailure`].
pub struct ModelHandle {
    cell: OnceLock<Loaded>,
    init: Mutex<()>,
    loader: Loader,
    description: String,
}

impl ModelHandle {
    /// Handle that runs `loader` on first use
    pub fn new<F>(description: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn SequenceModel>> + Send + Sync + 'static,
    {
        Self {
            cell: OnceLock::new(),
            init: Mutex::new(()),
            loader: Box::new(loader),
            description: description.into(),
        }
    }

    /// Handle that binds a [`TransAm`] from a weights file on first use
    pub fn from_weights_path(path: impl Into<PathBuf>, preference: DevicePreference) -> Self {
        let path = path.into();
        let description = format!("transam:{}", path.display());
        Self::new(description, move || {
            let device = Device::detect(preference);
            let weights = ModelWeights::from_path(&path)?;
            let model = TransAm::from_weights(&weights, device)?;
            info!(path = %path.display(), device = %device, "Model ready");
            Ok(Arc::new(model) as Arc<dyn SequenceModel>)
        })
    }

    /// Handle around an already constructed model
    pub fn ready(model: Arc<dyn SequenceModel>) -> Self {
        let description = model.name().to_string();
        let cell = OnceLock::new();
        let _ = cell.set(Ok(Arc::clone(&model)));
        Self {
            cell,
            init: Mutex::new(()),
            loader: Box::new(move || Ok(Arc::clone(&model))),
            description,
        }
    }

    /// The model, loading it if this is the first call
    pub fn get(&self) -> Result<Arc<dyn SequenceModel>> {
        if let Some(loaded) = self.cell.get() {
            return Self::unpack(loaded);
        }

        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(loaded) = self.cell.get() {
            return Self::unpack(loaded);
        }

        info!(model = %self.description, "Loading model");
        let loaded = (self.loader)().map_err(|e| match e {
            ForecastError::ModelLoadFailure(msg) => msg,
            other => other.to_string(),
        });
        if let Err(msg) = &loaded {
            error!(model = %self.description, error = %msg, "Model load failed");
        }
        Self::unpack(self.cell.get_or_init(|| loaded))
    }

    fn unpack(loaded: &Loaded) -> Result<Arc<dyn SequenceModel>> {
        match loaded {
            Ok(model) => Ok(Arc::clone(model)),
            Err(msg) => Err(ForecastError::ModelLoadFailure(msg.clone())),
        }
    }

    /// True once a load has succeeded
    pub fn is_loaded(&self) -> bool {
        matches!(self.cell.get(), Some(Ok(_)))
    }

    /// True once a load has failed
    pub fn is_failed(&self) -> bool {
        matches!(self.cell.get(), Some(Err(_)))
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("description", &self.description)
            .field("loaded", &self.is_loaded())
            .field("failed", &self.is_failed())
            .finish_non_exhaustive()
    }
}
