use std::time::Duration;

use ridewise_nlu::NluError;
use thiserror::Error;

/// Request-scoped failures inside the router.
///
/// None of these reach the transport layer as errors: the router converts
/// every variant into a structured reply. They exist so the internal turn
/// logic can use `?` and still log precise causes.
#[derive(Debug, Error)]
pub enum DialogueError {
    #[error("upstream service failed: {0}")]
    Upstream(anyhow::Error),

    #[error("upstream call exceeded {0:?}")]
    Timeout(Duration),

    #[error("matching failed: {0}")]
    Nlu(#[from] NluError),
}
