use thiserror::Error;

/// Errors raised while preparing or running a frame.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to start render threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Node {node} is out of range for a {nodes}-node cluster")]
    InvalidNode { node: usize, nodes: usize },

    #[error("Row exchange failed: {0}")]
    Exchange(String),

    #[error(transparent)]
    Scene(#[from] ember_core::SceneError),
}

/// Result type for rendering.
pub type RenderResult<T> = Result<T, RenderError>;
