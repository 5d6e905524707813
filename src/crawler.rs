use jwalk::WalkDir;
use std::fs::Metadata;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::Result;
use crate::tree::{FileAttributes, FileTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub total_files: u64,
    pub total_dirs: u64,
    pub total_size: u64,
    pub skipped: u64,
    pub duration_ms: u128,
}

/// Parallel directory walker producing a [`FileTree`].
#[derive(Debug, Clone, Default)]
pub struct FileCrawler {
    skip_hidden: bool,
}

impl FileCrawler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave out dot files and dot directories.
    pub fn skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Walk `root` and build its tree. Entries that cannot be read are
    /// skipped and counted.
    pub fn scan<P: AsRef<Path>>(&self, root: P) -> Result<(FileTree, ScanStats)> {
        let root = root.as_ref();
        let start = Instant::now();
        // fail early on a missing or unreadable root
        let root_meta = std::fs::metadata(root)?;

        let mut tree = FileTree::new(root);
        let root_id = tree.get_root();
        if let Some(node) = tree.node_mut(root_id) {
            node.attributes = attributes(&root_meta);
        }

        let mut stats = ScanStats {
            total_files: 0,
            total_dirs: 0,
            total_size: 0,
            skipped: 0,
            duration_ms: 0,
        };

        let walker = WalkDir::new(root)
            .skip_hidden(self.skip_hidden)
            .follow_links(false)
            .sort(true);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    stats.skipped += 1;
                    continue;
                }
            };
            if entry.depth == 0 {
                continue;
            }
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    warn!(path = %entry.path().display(), error = %err, "no metadata");
                    stats.skipped += 1;
                    continue;
                }
            };

            let is_dir = metadata.is_dir();
            let size = if is_dir { 0 } else { metadata.len() };
            if is_dir {
                stats.total_dirs += 1;
            } else {
                stats.total_files += 1;
                stats.total_size += size;
            }

            let id = tree.add_node(entry.path(), size, is_dir);
            if let Some(node) = tree.node_mut(id) {
                node.attributes = attributes(&metadata);
            }
        }

        tree.calculate_sizes();
        stats.duration_ms = start.elapsed().as_millis();
        debug!(
            root = %root.display(),
            files = stats.total_files,
            dirs = stats.total_dirs,
            ms = stats.duration_ms,
            "scan finished"
        );
        Ok((tree, stats))
    }
}

#[cfg(unix)]
fn attributes(metadata: &Metadata) -> FileAttributes {
    use std::os::unix::fs::MetadataExt;
    FileAttributes {
        mode: metadata.mode(),
        uid: metadata.uid(),
        gid: metadata.gid(),
    }
}

#[cfg(not(unix))]
fn attributes(metadata: &Metadata) -> FileAttributes {
    let mode = if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    };
    FileAttributes {
        mode,
        ..FileAttributes::default()
    }
}
