//! Error types for layout, rendering and view-model operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the tree view-model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewModelError {
    /// A node id held by the visible rows no longer resolves in the arena.
    #[error("stale tree node at visible row {row}")]
    StaleNode { row: usize },

    /// The cursor points past the visible rows.
    #[error("cursor row {row} is outside the {len} visible rows")]
    CursorOutOfRange { row: usize, len: usize },
}

/// Error returned by a registered listener.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Crate-level error.
///
/// Display text names only this layer; causes hang off `source()`, so print
/// with an error reporter such as anyhow's `{:#}` to see the whole chain.
#[derive(Error, Debug)]
pub enum Error {
    /// First-time initialisation of a pane failed.
    #[error("unable to setup {pane}")]
    Setup {
        pane: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// A child of a layout element failed while being laid out.
    #[error("unable to layout {element:?}")]
    Layout {
        element: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// A listener in a notification chain failed.
    #[error("notify listeners")]
    Notify(#[source] ListenerError),

    #[error(transparent)]
    ViewModel(#[from] ViewModelError),

    /// The surface has no region registered under this name.
    #[error("unknown region {0:?}")]
    UnknownRegion(String),

    /// A configured key could not be parsed.
    #[error("invalid key binding {binding:?}: {reason}")]
    KeyBinding { binding: String, reason: String },

    #[error("invalid filter pattern")]
    Filter(#[from] regex::Error),

    #[error("unable to read config {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse config {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn setup(pane: &'static str, source: Error) -> Self {
        Error::Setup {
            pane,
            source: Box::new(source),
        }
    }

    pub fn layout(element: &'static str, source: Error) -> Self {
        Error::Layout {
            element,
            source: Box::new(source),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
