use indextree::{Arena, NodeId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Diff classification of a node against the layer below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum DiffType {
    #[default]
    Unmodified,
    Modified,
    Added,
    Removed,
}

impl DiffType {
    pub const ALL: [DiffType; 4] = [
        DiffType::Added,
        DiffType::Removed,
        DiffType::Modified,
        DiffType::Unmodified,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DiffType::Added => "Added",
            DiffType::Removed => "Removed",
            DiffType::Modified => "Modified",
            DiffType::Unmodified => "Unmodified",
        }
    }
}

/// Unix permission bits and ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileAttributes {
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
}

/// Ordering applied to siblings when the tree is flattened for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    ByName,
    BySizeDesc,
}

impl SortOrder {
    pub fn next(self) -> Self {
        match self {
            SortOrder::ByName => SortOrder::BySizeDesc,
            SortOrder::BySizeDesc => SortOrder::ByName,
        }
    }
}

/// Represents a node in the directory tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
    pub diff: DiffType,
    pub attributes: FileAttributes,
    /// Cumulative size including all children
    pub cumulative_size: u64,
}

/// Hierarchical tree structure using an arena allocator.
///
/// The root node is never displayed; its children are the top-level rows.
#[derive(Debug)]
pub struct FileTree {
    arena: Arena<TreeNode>,
    root: NodeId,
    path_to_node: HashMap<PathBuf, NodeId>,
}

impl FileTree {
    /// Create a new tree with a root node
    pub fn new<P: AsRef<Path>>(root_path: P) -> Self {
        let mut arena = Arena::new();
        let root_path_buf = root_path.as_ref().to_path_buf();
        let root_name = root_path_buf
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("/")
            .to_string();

        let root_node = TreeNode {
            path: root_path_buf.clone(),
            name: root_name,
            size: 0,
            is_dir: true,
            diff: DiffType::Unmodified,
            attributes: FileAttributes::default(),
            cumulative_size: 0,
        };

        let root = arena.new_node(root_node);
        let mut path_to_node = HashMap::new();
        path_to_node.insert(root_path_buf, root);

        Self {
            arena,
            root,
            path_to_node,
        }
    }

    /// Add a node to the tree, creating missing parent directories.
    ///
    /// Adding a path that already exists updates its size and kind.
    pub fn add_node(&mut self, path: PathBuf, size: u64, is_dir: bool) -> NodeId {
        if let Some(&existing) = self.path_to_node.get(&path) {
            if let Some(node) = self.arena.get_mut(existing) {
                let data = node.get_mut();
                data.size = size;
                data.is_dir = is_dir;
                data.cumulative_size = size;
            }
            return existing;
        }

        let parent_id = match path.parent() {
            Some(parent_path) if parent_path.starts_with(self.root_path()) => {
                self.add_node(parent_path.to_path_buf(), 0, true)
            }
            _ => self.root,
        };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();

        let node = TreeNode {
            path: path.clone(),
            name,
            size,
            is_dir,
            diff: DiffType::Unmodified,
            attributes: FileAttributes::default(),
            cumulative_size: size,
        };

        let node_id = self.arena.new_node(node);
        parent_id.append(node_id, &mut self.arena);
        self.path_to_node.insert(path, node_id);
        node_id
    }

    /// Calculate cumulative sizes for all directories (bottom-up)
    pub fn calculate_sizes(&mut self) {
        self.calculate_sizes_recursive(self.root);
    }

    fn calculate_sizes_recursive(&mut self, node_id: NodeId) -> u64 {
        let mut total = 0u64;

        // Collect children first (to avoid borrow issues)
        let children: Vec<NodeId> = node_id.children(&self.arena).collect();

        for child in children {
            total += self.calculate_sizes_recursive(child);
        }

        if let Some(node) = self.arena.get_mut(node_id) {
            let node_data = node.get_mut();
            if node_data.is_dir {
                node_data.cumulative_size = total;
            } else {
                total += node_data.size;
                node_data.cumulative_size = node_data.size;
            }
        }

        total
    }

    pub fn get_root(&self) -> NodeId {
        self.root
    }

    pub fn root_path(&self) -> &Path {
        self.arena
            .get(self.root)
            .map(|n| n.get().path.as_path())
            .unwrap_or_else(|| Path::new("/"))
    }

    pub fn get_arena(&self) -> &Arena<TreeNode> {
        &self.arena
    }

    pub fn get_node(&self, path: &Path) -> Option<NodeId> {
        self.path_to_node.get(path).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.arena.get(id).map(|n| n.get())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.arena.get_mut(id).map(|n| n.get_mut())
    }

    /// Parent of `id`, or `None` when `id` is a top-level node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena
            .get(id)
            .and_then(|n| n.parent())
            .filter(|&parent| parent != self.root)
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        id.children(&self.arena).next().is_some()
    }

    /// Children of `id` in display order.
    pub fn sorted_children(&self, id: NodeId, order: SortOrder) -> Vec<NodeId> {
        let mut children: Vec<NodeId> = id.children(&self.arena).collect();
        children.sort_by(|&a, &b| {
            let (Some(a), Some(b)) = (self.node(a), self.node(b)) else {
                return std::cmp::Ordering::Equal;
            };
            match order {
                SortOrder::ByName => a.name.cmp(&b.name),
                SortOrder::BySizeDesc => b
                    .cumulative_size
                    .cmp(&a.cumulative_size)
                    .then_with(|| a.name.cmp(&b.name)),
            }
        });
        children
    }

    /// Paths of every directory below the root.
    pub fn directory_paths(&self) -> Vec<PathBuf> {
        self.root
            .descendants(&self.arena)
            .skip(1)
            .filter_map(|id| self.node(id))
            .filter(|node| node.is_dir)
            .map(|node| node.path.clone())
            .collect()
    }

    /// Get total size of the tree
    pub fn total_size(&self) -> u64 {
        self.arena
            .get(self.root)
            .map(|n| n.get().cumulative_size)
            .unwrap_or(0)
    }

    /// Number of nodes below the root, `(files, directories)`.
    pub fn counts(&self) -> (usize, usize) {
        self.root
            .descendants(&self.arena)
            .skip(1)
            .filter_map(|id| self.node(id))
            .fold((0, 0), |(files, dirs), node| {
                if node.is_dir {
                    (files, dirs + 1)
                } else {
                    (files + 1, dirs)
                }
            })
    }

    /// Number of nodes below `id` (inclusive) classified as `diff`.
    pub fn diff_count(&self, id: NodeId, diff: DiffType) -> usize {
        id.descendants(&self.arena)
            .filter(|&d| d != self.root)
            .filter_map(|d| self.node(d))
            .filter(|node| node.diff == diff)
            .count()
    }

    /// Classify every node against `base`, an earlier version of the tree.
    ///
    /// Paths only here are `Added`, paths whose kind, size or mode differ are
    /// `Modified`, and paths only in `base` are grafted in as `Removed`.
    /// Directories holding any change are `Modified` themselves.
    pub fn compare(&mut self, base: &FileTree) {
        let root_path = self.root_path().to_path_buf();
        let ids: Vec<NodeId> = self.root.descendants(&self.arena).skip(1).collect();
        for id in ids {
            let Some(node) = self.node(id) else { continue };
            let Ok(rel) = node.path.strip_prefix(&root_path) else {
                continue;
            };
            let diff = match base.get_node(&base.root_path().join(rel)).and_then(|b| base.node(b)) {
                None => DiffType::Added,
                Some(old) if old.is_dir != node.is_dir => DiffType::Modified,
                Some(old) if !node.is_dir && old.size != node.size => DiffType::Modified,
                Some(old) if old.attributes.mode != node.attributes.mode => DiffType::Modified,
                Some(_) => DiffType::Unmodified,
            };
            if let Some(node) = self.node_mut(id) {
                node.diff = diff;
            }
        }

        let base_root = base.root_path().to_path_buf();
        for old_id in base.root.descendants(&base.arena).skip(1) {
            let Some(old) = base.node(old_id) else { continue };
            let Ok(rel) = old.path.strip_prefix(&base_root) else {
                continue;
            };
            let path = root_path.join(rel);
            if self.path_to_node.contains_key(&path) {
                continue;
            }
            let id = self.add_node(path, old.size, old.is_dir);
            if let Some(node) = self.node_mut(id) {
                node.diff = DiffType::Removed;
                node.attributes = old.attributes;
            }
        }

        self.calculate_sizes();
        self.mark_changed_dirs(self.root);
    }

    fn mark_changed_dirs(&mut self, id: NodeId) -> bool {
        let children: Vec<NodeId> = id.children(&self.arena).collect();
        let mut changed = false;
        for child in children {
            changed |= self.mark_changed_dirs(child);
        }

        let is_root = id == self.root;
        let Some(node) = self.node_mut(id) else {
            return changed;
        };
        if node.diff != DiffType::Unmodified {
            return true;
        }
        if changed && node.is_dir && !is_root {
            node.diff = DiffType::Modified;
        }
        changed
    }
}
