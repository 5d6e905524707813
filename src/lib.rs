//! Pane layout and rendering core for a terminal file tree browser.

pub mod collapse_state;
pub mod config;
pub mod crawler;
pub mod error;
pub mod format;
pub mod geometry;
pub mod keys;
pub mod layout;
pub mod listeners;
pub mod pane;
pub mod surface;
pub mod tree;
pub mod viewmodel;

pub use error::{Error, Result};
