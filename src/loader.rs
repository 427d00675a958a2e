use std::future::Future;

use log::{error, info};

use crate::error::{Result, ViewerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// One-shot initializer for the backend module.
///
/// The only way to obtain a [`LoadedModule`] is through
/// [`ModuleLoader::initialize`], so nothing can call into a backend before its
/// initialization future has resolved.
#[derive(Debug)]
pub struct ModuleLoader {
    state: LoaderState,
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleLoader {
    pub fn new() -> Self {
        Self {
            state: LoaderState::Idle,
        }
    }

    pub fn state(&self) -> LoaderState {
        self.state
    }

    /// Awaits `init` once. Failure is terminal; there is no retry.
    pub async fn initialize<B, Fut>(&mut self, init: Fut) -> Result<LoadedModule<B>>
    where
        Fut: Future<Output = Result<B>>,
    {
        if self.state != LoaderState::Idle {
            return Err(ViewerError::AlreadyInitialized);
        }
        self.state = LoaderState::Loading;
        match init.await {
            Ok(backend) => {
                self.state = LoaderState::Ready;
                info!("backend module initialized");
                Ok(LoadedModule { backend })
            }
            Err(err) => {
                self.state = LoaderState::Failed;
                error!("backend module failed to initialize: {err}");
                Err(match err {
                    ViewerError::Initialization(_) => err,
                    other => ViewerError::Initialization(other.to_string()),
                })
            }
        }
    }
}

/// A backend whose initialization has completed.
#[derive(Debug)]
pub struct LoadedModule<B> {
    backend: B,
}

impl<B> LoadedModule<B> {
    pub fn into_backend(self) -> B {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use pollster::block_on;

    #[test]
    fn initializes_exactly_once() {
        let mut loader = ModuleLoader::new();
        let module = block_on(loader.initialize(async { Ok(RecordingBackend::default()) }));
        assert!(module.is_ok());
        assert_eq!(loader.state(), LoaderState::Ready);

        let again = block_on(loader.initialize(async { Ok(RecordingBackend::default()) }));
        assert!(matches!(again, Err(ViewerError::AlreadyInitialized)));
    }

    #[test]
    fn failure_propagates_and_is_terminal() {
        let mut loader = ModuleLoader::new();
        let result = block_on(loader.initialize::<RecordingBackend, _>(async {
            Err(ViewerError::Backend {
                entry: "default",
                message: "fetch failed".into(),
            })
        }));
        let err = result.unwrap_err();
        assert!(matches!(err, ViewerError::Initialization(_)));
        assert!(err.to_string().contains("fetch failed"));
        assert_eq!(loader.state(), LoaderState::Failed);

        let retry = block_on(loader.initialize(async { Ok(RecordingBackend::default()) }));
        assert!(matches!(retry, Err(ViewerError::AlreadyInitialized)));
    }
}
