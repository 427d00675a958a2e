use thiserror::Error;

/// Errors raised by the viewer core.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("backend module is already initialized")]
    AlreadyInitialized,
    #[error("backend initialization failed: {0}")]
    Initialization(String),
    #[error("unknown entry point `{0}`")]
    UnknownEntryPoint(String),
    #[error("`{entry}` does not accept {argument}")]
    ArgumentMismatch {
        entry: &'static str,
        argument: &'static str,
    },
    #[error("no control binding for `{0}`")]
    UnboundControl(String),
    #[error("control element `{0}` not found")]
    MissingControl(String),
    #[error("unknown page `{0}`")]
    UnknownPage(String),
    #[error("invalid page configuration: {0}")]
    Config(String),
    #[error("invalid page XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("an animation frame is already pending")]
    FramePending,
    #[error("light index {index} is out of range ({count} lights)")]
    LightIndex { index: usize, count: usize },
    #[error("`{0}` is not a light index")]
    InvalidLightSelection(String),
    #[error("invalid colour `{0}`")]
    InvalidColor(String),
    #[error("backend call `{entry}` failed: {message}")]
    Backend {
        entry: &'static str,
        message: String,
    },
}

pub type Result<T, E = ViewerError> = std::result::Result<T, E>;
