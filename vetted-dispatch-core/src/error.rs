//! Error type shared by the crate

use thiserror::Error;
use tokio::task::JoinError;

/// Errors raised while building creators or awaiting a pending dispatch.
///
/// Validation failures are never reported here: they become failure
/// actions and travel through the store like any other action.
#[derive(Debug, Error)]
pub enum Error {
    #[error("validatable kind `{kind}` must differ from its failure kind")]
    KindCollision { kind: &'static str },

    #[error("validation of `{kind}` was aborted before it resolved")]
    Aborted {
        kind: &'static str,
        #[source]
        source: JoinError,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
