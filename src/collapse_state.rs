use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Tracks which directories are collapsed.
#[derive(Debug, Default, Clone)]
pub struct CollapseState {
    collapsed: HashSet<PathBuf>,
    all: bool,
}

impl CollapseState {
    pub fn collapse(&mut self, path: &Path) {
        self.collapsed.insert(path.to_path_buf());
    }

    pub fn expand(&mut self, path: &Path) {
        self.collapsed.remove(path);
    }

    /// Flip a single directory. Returns the new collapsed state.
    pub fn toggle(&mut self, path: &Path) -> bool {
        if self.collapsed.remove(path) {
            false
        } else {
            self.collapsed.insert(path.to_path_buf());
            true
        }
    }

    pub fn is_collapsed(&self, path: &Path) -> bool {
        self.collapsed.contains(path)
    }

    /// Collapse every directory in `dirs`, or expand everything.
    pub fn set_all<I>(&mut self, collapsed: bool, dirs: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.all = collapsed;
        self.collapsed.clear();
        if collapsed {
            self.collapsed.extend(dirs);
        }
    }

    /// Whether the last global toggle collapsed everything.
    pub fn is_all_collapsed(&self) -> bool {
        self.all
    }
}
