//! Publish/subscribe registry for cross-pane notifications.
//!
//! Subscribers are invoked synchronously in registration order. The first
//! failing subscriber stops the chain and its error is returned.

use std::path::PathBuf;

use crate::error::{Error, ListenerError, Result};

/// A display option changed in a way that sibling panes must redraw for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptionChanged;

/// The user asked to extract the selected node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRequested {
    pub path: PathBuf,
}

type Callback<E> = Box<dyn FnMut(&E) -> Result<(), ListenerError>>;

/// Ordered list of callbacks for one event kind.
pub struct Subscribers<E> {
    callbacks: Vec<Callback<E>>,
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }
}

impl<E> Subscribers<E> {
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&E) -> Result<(), ListenerError> + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    pub fn publish(&mut self, event: &E) -> Result<()> {
        for callback in &mut self.callbacks {
            callback(event).map_err(Error::Notify)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

/// Registry of every event kind a pane publishes.
#[derive(Default)]
pub struct Listeners {
    pub view_option: Subscribers<ViewOptionChanged>,
    pub extract: Subscribers<ExtractRequested>,
}
