//! TOML configuration.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. [`Config::resolve`] validates values that have a legal
//! range and substitutes defaults with a warning instead of failing.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};

pub const DEFAULT_PANE_WIDTH: f64 = 0.5;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub filetree: FileTreeConfig,
    pub keybindings: KeyBindings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FileTreeConfig {
    /// Start with every directory collapsed.
    pub collapse_dir: bool,
    /// Share of the flexible width given to the file tree, `0 < value < 1`.
    pub pane_width: f64,
    pub show_attributes: bool,
}

impl Default for FileTreeConfig {
    fn default() -> Self {
        Self {
            collapse_dir: false,
            pane_width: DEFAULT_PANE_WIDTH,
            show_attributes: true,
        }
    }
}

/// Key specs are comma separated alternatives such as `"ctrl+a"` or `"up,k"`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct KeyBindings {
    pub global: GlobalKeys,
    pub navigation: NavigationKeys,
    pub filetree: FileTreeKeys,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GlobalKeys {
    pub quit: String,
    pub toggle_view: String,
    pub filter_files: String,
}

impl Default for GlobalKeys {
    fn default() -> Self {
        Self {
            quit: "ctrl+c,q".into(),
            toggle_view: "tab".into(),
            filter_files: "ctrl+f,/".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NavigationKeys {
    pub up: String,
    pub down: String,
    pub left: String,
    pub right: String,
    pub page_up: String,
    pub page_down: String,
}

impl Default for NavigationKeys {
    fn default() -> Self {
        Self {
            up: "up,k".into(),
            down: "down,j".into(),
            left: "left,h".into(),
            right: "right,l".into(),
            page_up: "pgup".into(),
            page_down: "pgdn".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FileTreeKeys {
    pub toggle_collapse_dir: String,
    pub toggle_collapse_all_dir: String,
    pub toggle_added_files: String,
    pub toggle_removed_files: String,
    pub toggle_modified_files: String,
    pub toggle_unmodified_files: String,
    pub toggle_tree_attributes: String,
    pub toggle_wrap_tree: String,
    pub toggle_sort_order: String,
    pub extract_file: String,
}

impl Default for FileTreeKeys {
    fn default() -> Self {
        Self {
            toggle_collapse_dir: "space".into(),
            toggle_collapse_all_dir: "ctrl+space".into(),
            toggle_added_files: "ctrl+a".into(),
            toggle_removed_files: "ctrl+r".into(),
            toggle_modified_files: "ctrl+n".into(),
            toggle_unmodified_files: "ctrl+u".into(),
            toggle_tree_attributes: "ctrl+b".into(),
            toggle_wrap_tree: "ctrl+p".into(),
            toggle_sort_order: "ctrl+o".into(),
            extract_file: "ctrl+e".into(),
        }
    }
}

/// Validated configuration handed to components at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub collapse_dir: bool,
    pub pane_width: f64,
    pub show_attributes: bool,
    pub keybindings: KeyBindings,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Config::default().resolve()
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn resolve(&self) -> ResolvedConfig {
        let mut pane_width = self.filetree.pane_width;
        if !(pane_width > 0.0 && pane_width < 1.0) {
            warn!(
                "invalid config value: 'filetree.pane-width' should be 0 < value < 1, given '{}'",
                pane_width
            );
            pane_width = DEFAULT_PANE_WIDTH;
        }

        ResolvedConfig {
            collapse_dir: self.filetree.collapse_dir,
            pane_width,
            show_attributes: self.filetree.show_attributes,
            keybindings: self.keybindings.clone(),
        }
    }
}
