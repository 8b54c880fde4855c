//! Shared server state.
//!
//! The predictor sits behind a `parking_lot::RwLock`: predictions take the
//! read lock and run concurrently, loading a bundle takes the write lock.

use loan_predictor::LoanPredictor;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// State handed to every request handler.
#[derive(Clone, Default)]
pub struct AppState {
    predictor: Arc<RwLock<Option<LoanPredictor>>>,
}

impl AppState {
    /// State with no model loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// State serving an already fitted predictor.
    pub fn with_predictor(predictor: LoanPredictor) -> Self {
        Self {
            predictor: Arc::new(RwLock::new(Some(predictor))),
        }
    }

    /// Loads the bundle at `path` and swaps it in.
    ///
    /// The bundle is read before the lock is taken; on failure the previous
    /// predictor, if any, keeps serving.
    pub fn load_model(&self, path: impl AsRef<Path>) -> loan_predictor::Result<()> {
        let predictor = LoanPredictor::from_file(path.as_ref())?;
        let name = predictor.best_model_name().unwrap_or_default().to_string();
        *self.predictor.write() = Some(predictor);
        info!("Model loaded successfully ({})", name);
        Ok(())
    }

    pub fn is_model_loaded(&self) -> bool {
        self.predictor
            .read()
            .as_ref()
            .is_some_and(LoanPredictor::is_trained)
    }

    /// Handle to the shared predictor, for use off the async runtime.
    pub(crate) fn predictor(&self) -> Arc<RwLock<Option<LoanPredictor>>> {
        Arc::clone(&self.predictor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_state() {
        let state = AppState::new();
        assert!(!state.is_model_loaded());
    }

    #[test]
    fn test_untrained_predictor_is_not_loaded() {
        let state = AppState::with_predictor(LoanPredictor::default());
        assert!(!state.is_model_loaded());
    }

    #[test]
    fn test_failed_load_keeps_state() {
        let state = AppState::new();
        let dir = tempfile::tempdir().unwrap();
        assert!(state.load_model(dir.path().join("absent.json")).is_err());
        assert!(!state.is_model_loaded());
    }
}
