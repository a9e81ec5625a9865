//! Error types shared by the reactive core, the headless document and the
//! renderers.

use thiserror::Error;

use crate::dom::DomError;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while tracking, propagating or rendering.
#[derive(Debug, Error)]
pub enum Error {
    /// A state object was accessed with a key it was not built with.
    #[error("cannot find `{0}` in state")]
    UndeclaredKey(String),

    /// An effect or derived-value body failed.
    #[error("computation failed: {0}")]
    Computation(String),

    /// A suspended subtree failed while resolving.
    #[error("async rendering rejected: {0}")]
    AsyncRejection(Box<Error>),

    /// A list was rendered without an item callback.
    #[error("cannot find callback")]
    MissingCallback,

    /// Raised on purpose by the `throw_error` component.
    #[error("{0}")]
    Thrown(String),

    /// An async component reached a synchronous renderer.
    #[error("async components must be rendered inside suspense")]
    UnresolvedAsync,

    /// Client-side suspense ran on a thread without a tokio runtime.
    #[error("suspense needs a tokio runtime with a LocalSet on this thread")]
    NoAsyncRuntime,

    /// A document was installed after this thread already rendered in
    /// server mode.
    #[error("render environment is already fixed to server mode")]
    EnvironmentSealed,

    /// A structural DOM operation failed.
    #[error(transparent)]
    Dom(#[from] DomError),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a computation failure with a message.
    pub fn computation(message: impl Into<String>) -> Self {
        Self::Computation(message.into())
    }
}
