use thiserror::Error;

/// Failures that the orchestrator reports differently from the generic
/// unexpected-error path.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no internet connection available")]
    Offline,
}
