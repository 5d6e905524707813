//! State behind the file tree pane.
//!
//! The view-model flattens the [`FileTree`] into the rows that are currently
//! visible (respecting collapse state, hidden diff categories, the filter and
//! the sort order) and keeps a window of `height` rows over them. Rendering
//! materializes only that window, so cost is bounded by the screen size and
//! not by the size of the tree.

use std::collections::HashSet;
use std::fmt;

use indextree::NodeId;
use regex::Regex;

use crate::collapse_state::CollapseState;
use crate::config::ResolvedConfig;
use crate::error::ViewModelError;
use crate::format;
use crate::tree::{DiffType, FileTree, SortOrder, TreeNode};

/// A row of the flattened, visible tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRow {
    pub node: NodeId,
    pub depth: usize,
    /// Branch glyphs drawn before the name.
    pub prefix: String,
}

/// A single materialized line of the render buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderLine {
    pub text: String,
    pub diff: DiffType,
    pub selected: bool,
}

/// The fully materialized visible window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderBuffer {
    pub lines: Vec<RenderLine>,
}

impl fmt::Display for RenderBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line.text)?;
        }
        Ok(())
    }
}

pub struct FileTreeViewModel {
    tree: FileTree,
    collapse: CollapseState,
    sort_order: SortOrder,
    hidden_diff_types: HashSet<DiffType>,
    show_attributes: bool,
    unconstrained_show_attributes: bool,
    constrained: bool,
    filter: Option<Regex>,

    rows: Vec<VisibleRow>,
    cursor: usize,
    top: usize,
    height: usize,
    width: usize,
}

impl FileTreeViewModel {
    pub fn new(tree: FileTree, config: &ResolvedConfig) -> Result<Self, ViewModelError> {
        let mut collapse = CollapseState::default();
        if config.collapse_dir {
            collapse.set_all(true, tree.directory_paths());
        }

        let mut vm = Self {
            tree,
            collapse,
            sort_order: SortOrder::default(),
            hidden_diff_types: HashSet::new(),
            show_attributes: config.show_attributes,
            unconstrained_show_attributes: config.show_attributes,
            constrained: false,
            filter: None,
            rows: Vec::new(),
            cursor: 0,
            top: 0,
            height: 0,
            width: 0,
        };
        vm.refresh()?;
        Ok(vm)
    }

    /// Initialize the visible window.
    pub fn setup(&mut self, top: usize, height: usize) {
        self.top = top;
        self.height = height;
        self.clamp();
    }

    /// Replace the model tree, keeping display options.
    pub fn set_tree(&mut self, tree: FileTree) -> Result<(), ViewModelError> {
        if self.collapse.is_all_collapsed() {
            self.collapse.set_all(true, tree.directory_paths());
        }
        self.tree = tree;
        self.reset_cursor();
        self.refresh()
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// `(top, height)` of the visible window.
    pub fn window(&self) -> (usize, usize) {
        (self.top, self.height)
    }

    pub fn visible_rows(&self) -> &[VisibleRow] {
        &self.rows
    }

    pub fn show_attributes(&self) -> bool {
        self.show_attributes
    }

    pub fn is_constrained(&self) -> bool {
        self.constrained
    }

    pub fn collapse_all(&self) -> bool {
        self.collapse.is_all_collapsed()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn is_diff_type_hidden(&self, diff: DiffType) -> bool {
        self.hidden_diff_types.contains(&diff)
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
        self.top = 0;
    }

    /// Recompute the visible rows against new dimensions and filter.
    pub fn update(
        &mut self,
        filter: Option<&Regex>,
        width: usize,
        height: usize,
    ) -> Result<(), ViewModelError> {
        self.filter = filter.cloned();
        self.width = width;
        self.height = height;
        self.refresh()
    }

    /// Materialize the visible window.
    pub fn render(&self) -> Result<RenderBuffer, ViewModelError> {
        let end = (self.top + self.page_height()).min(self.rows.len());
        let mut lines = Vec::with_capacity(end.saturating_sub(self.top));

        for index in self.top..end {
            let row = &self.rows[index];
            let node = self.node_at(index)?;

            let mut text = String::new();
            if self.show_attributes {
                text.push_str(&format::attribute_columns(node));
            }
            text.push_str(&row.prefix);
            if node.is_dir && self.tree.has_children(row.node) {
                let marker = if self.collapse.is_collapsed(&node.path) {
                    format::COLLAPSED_DIR
                } else {
                    format::EXPANDED_DIR
                };
                text.push_str(marker);
            }
            text.push_str(&node.name);

            let selected = index == self.cursor;
            if selected {
                let used = text.chars().count();
                text.push_str(&" ".repeat(self.width.saturating_sub(used)));
            }

            lines.push(RenderLine {
                text,
                diff: node.diff,
                selected,
            });
        }

        Ok(RenderBuffer { lines })
    }

    /// Move the cursor one row down. Returns whether it moved.
    pub fn cursor_down(&mut self) -> bool {
        if self.cursor + 1 >= self.rows.len() {
            return false;
        }
        self.cursor += 1;
        let height = self.page_height();
        if self.cursor >= self.top + height {
            self.top = self.cursor + 1 - height;
        }
        true
    }

    /// Move the cursor one row up. Returns whether it moved.
    pub fn cursor_up(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        if self.cursor < self.top {
            self.top = self.cursor;
        }
        true
    }

    /// Move to the parent of the selected node, or the top at a root.
    pub fn cursor_left(&mut self) -> Result<(), ViewModelError> {
        if self.rows.is_empty() {
            return Ok(());
        }
        let current = self.row(self.cursor)?.node;
        let target = self
            .tree
            .parent(current)
            .and_then(|parent| self.rows.iter().position(|row| row.node == parent))
            .unwrap_or(0);

        self.cursor = target;
        if self.cursor < self.top {
            self.top = self.cursor;
        }
        Ok(())
    }

    /// Descend into the selected directory, expanding it if collapsed.
    pub fn cursor_right(&mut self) -> Result<(), ViewModelError> {
        if self.rows.is_empty() {
            return Ok(());
        }
        let row = self.row(self.cursor)?;
        let (id, depth) = (row.node, row.depth);
        let node = self.node_at(self.cursor)?;
        if !node.is_dir || !self.tree.has_children(id) {
            return Ok(());
        }

        if self.collapse.is_collapsed(&node.path) {
            let path = node.path.clone();
            self.collapse.expand(&path);
            self.refresh()?;
        }

        let descends = self
            .rows
            .get(self.cursor + 1)
            .is_some_and(|next| next.depth > depth);
        if descends {
            self.cursor_down();
        }
        Ok(())
    }

    /// Move the window one page down with the cursor on its first row.
    pub fn page_down(&mut self) -> Result<(), ViewModelError> {
        if self.rows.is_empty() {
            return Ok(());
        }
        let height = self.page_height();
        let max_top = self.rows.len().saturating_sub(height);
        let next_top = (self.top + height).min(max_top);

        if next_top > self.top {
            self.top = next_top;
            self.cursor = next_top;
        } else {
            self.cursor = self.rows.len() - 1;
        }
        self.check_cursor()
    }

    /// Move the window one page up with the cursor on its first row.
    pub fn page_up(&mut self) -> Result<(), ViewModelError> {
        if self.rows.is_empty() {
            return Ok(());
        }
        self.top = self.top.saturating_sub(self.page_height());
        self.cursor = self.top;
        self.check_cursor()
    }

    /// Collapse or expand the selected directory.
    pub fn toggle_collapse(&mut self) -> Result<(), ViewModelError> {
        if self.rows.is_empty() {
            return Ok(());
        }
        let node = self.node_at(self.cursor)?;
        if node.is_dir {
            let path = node.path.clone();
            self.collapse.toggle(&path);
            self.refresh()?;
        }
        Ok(())
    }

    /// Collapse or expand every directory.
    pub fn toggle_collapse_all(&mut self) -> Result<(), ViewModelError> {
        let collapse = !self.collapse.is_all_collapsed();
        self.collapse.set_all(collapse, self.tree.directory_paths());
        self.refresh()
    }

    pub fn toggle_sort_order(&mut self) -> Result<(), ViewModelError> {
        self.sort_order = self.sort_order.next();
        self.refresh()
    }

    /// Show or hide the attribute columns. Ignored while constrained.
    pub fn toggle_attributes(&mut self) {
        if self.constrained {
            return;
        }
        self.show_attributes = !self.show_attributes;
    }

    pub fn toggle_show_diff_type(&mut self, diff: DiffType) -> Result<(), ViewModelError> {
        if !self.hidden_diff_types.remove(&diff) {
            self.hidden_diff_types.insert(diff);
        }
        self.refresh()
    }

    /// Hide auxiliary columns to make room for the tree.
    pub fn constrain_layout(&mut self) {
        if !self.constrained {
            self.unconstrained_show_attributes = self.show_attributes;
            self.show_attributes = false;
            self.constrained = true;
        }
    }

    /// Restore the columns hidden by [`Self::constrain_layout`].
    pub fn expand_layout(&mut self) {
        if self.constrained {
            self.show_attributes = self.unconstrained_show_attributes;
            self.constrained = false;
        }
    }

    /// The node under the cursor, if any row is visible.
    pub fn current_node(&self) -> Result<Option<&TreeNode>, ViewModelError> {
        if self.rows.is_empty() {
            return Ok(None);
        }
        self.node_at(self.cursor).map(Some)
    }

    fn page_height(&self) -> usize {
        self.height.max(1)
    }

    fn row(&self, index: usize) -> Result<&VisibleRow, ViewModelError> {
        self.rows.get(index).ok_or(ViewModelError::CursorOutOfRange {
            row: index,
            len: self.rows.len(),
        })
    }

    fn node_at(&self, index: usize) -> Result<&TreeNode, ViewModelError> {
        let row = self.row(index)?;
        self.tree
            .node(row.node)
            .ok_or(ViewModelError::StaleNode { row: index })
    }

    fn check_cursor(&self) -> Result<(), ViewModelError> {
        self.row(self.cursor).map(|_| ())
    }

    /// Rebuild the visible rows and re-clamp the cursor into the window.
    fn refresh(&mut self) -> Result<(), ViewModelError> {
        let mut hidden = HashSet::new();
        self.mark_hidden(self.tree.get_root(), &mut hidden)?;

        let mut rows = Vec::new();
        self.flatten(self.tree.get_root(), 0, "", &hidden, &mut rows)?;
        self.rows = rows;
        self.clamp();
        Ok(())
    }

    /// Child-first visibility pass. Returns whether `id` is visible.
    ///
    /// A node is hidden when its diff category is hidden or the filter does
    /// not match its path, unless one of its descendants is visible.
    fn mark_hidden(
        &self,
        id: NodeId,
        hidden: &mut HashSet<NodeId>,
    ) -> Result<bool, ViewModelError> {
        let mut any_child_visible = false;
        for child in id.children(self.tree.get_arena()) {
            if self.mark_hidden(child, hidden)? {
                any_child_visible = true;
            }
        }

        if id == self.tree.get_root() {
            return Ok(true);
        }

        let node = self
            .tree
            .node(id)
            .ok_or(ViewModelError::StaleNode { row: self.rows.len() })?;
        let own_hidden = self.hidden_diff_types.contains(&node.diff)
            || self
                .filter
                .as_ref()
                .is_some_and(|re| !re.is_match(&node.path.to_string_lossy()));

        let visible = any_child_visible || !own_hidden;
        if !visible {
            hidden.insert(id);
        }
        Ok(visible)
    }

    fn flatten(
        &self,
        id: NodeId,
        depth: usize,
        indent: &str,
        hidden: &HashSet<NodeId>,
        rows: &mut Vec<VisibleRow>,
    ) -> Result<(), ViewModelError> {
        let children: Vec<NodeId> = self
            .tree
            .sorted_children(id, self.sort_order)
            .into_iter()
            .filter(|child| !hidden.contains(child))
            .collect();

        let last = children.len().saturating_sub(1);
        for (i, child) in children.into_iter().enumerate() {
            let is_last = i == last;
            let branch = if is_last {
                format::BRANCH_LAST
            } else {
                format::BRANCH_MIDDLE
            };
            rows.push(VisibleRow {
                node: child,
                depth,
                prefix: format!("{indent}{branch}"),
            });

            let node = self
                .tree
                .node(child)
                .ok_or(ViewModelError::StaleNode { row: rows.len() - 1 })?;
            if node.is_dir && !self.collapse.is_collapsed(&node.path) {
                let continuation = if is_last {
                    format::INDENT_EMPTY
                } else {
                    format::INDENT_CONTINUE
                };
                let nested = format!("{indent}{continuation}");
                self.flatten(child, depth + 1, &nested, hidden, rows)?;
            }
        }
        Ok(())
    }

    fn clamp(&mut self) {
        if self.rows.is_empty() {
            self.cursor = 0;
            self.top = 0;
            return;
        }
        let height = self.page_height();
        self.cursor = self.cursor.min(self.rows.len() - 1);

        let max_top = self.rows.len().saturating_sub(height);
        if self.top > max_top {
            self.top = max_top;
        }
        if self.cursor < self.top {
            self.top = self.cursor;
        }
        if self.cursor >= self.top + height {
            self.top = self.cursor + 1 - height;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    /// /img
    /// ├── bin/        (sh, ls)
    /// ├── etc/        (hosts [modified], passwd [added])
    /// ├── readme.md   [removed]
    /// └── var/        (log/ (a.log, b.log))
    pub(crate) fn sample_tree() -> FileTree {
        let mut tree = FileTree::new("/img");
        for (path, size, is_dir) in [
            ("/img/bin", 0, true),
            ("/img/bin/sh", 120, false),
            ("/img/bin/ls", 80, false),
            ("/img/etc", 0, true),
            ("/img/etc/hosts", 10, false),
            ("/img/etc/passwd", 20, false),
            ("/img/readme.md", 5, false),
            ("/img/var", 0, true),
            ("/img/var/log", 0, true),
            ("/img/var/log/a.log", 300, false),
            ("/img/var/log/b.log", 400, false),
        ] {
            tree.add_node(PathBuf::from(path), size, is_dir);
        }
        tree.calculate_sizes();

        for (path, diff) in [
            ("/img/etc/hosts", DiffType::Modified),
            ("/img/etc/passwd", DiffType::Added),
            ("/img/readme.md", DiffType::Removed),
        ] {
            let id = tree.get_node(&PathBuf::from(path)).unwrap();
            tree.node_mut(id).unwrap().diff = diff;
        }
        tree
    }

    pub(crate) fn sample_vm(height: usize) -> FileTreeViewModel {
        let config = ResolvedConfig {
            show_attributes: false,
            ..ResolvedConfig::default()
        };
        let mut vm = FileTreeViewModel::new(sample_tree(), &config).unwrap();
        vm.setup(0, height);
        vm.update(None, 80, height).unwrap();
        vm
    }

    fn names(vm: &FileTreeViewModel) -> Vec<String> {
        vm.visible_rows()
            .iter()
            .map(|row| vm.tree().node(row.node).unwrap().name.clone())
            .collect()
    }

    fn current_name(vm: &FileTreeViewModel) -> String {
        vm.current_node().unwrap().unwrap().name.clone()
    }

    #[test]
    fn test_flatten_order_and_glyphs() {
        let vm = sample_vm(20);
        assert_eq!(
            names(&vm),
            vec![
                "bin", "ls", "sh", "etc", "hosts", "passwd", "readme.md", "var", "log", "a.log",
                "b.log"
            ]
        );

        let buffer = vm.render().unwrap().to_string();
        let lines: Vec<&str> = buffer.lines().collect();
        assert!(lines[0].starts_with("├── ⊖ bin"));
        assert!(lines[1].starts_with("│   ├── ls"));
        assert!(lines[2].starts_with("│   └── sh"));
        assert!(lines[7].starts_with("└── ⊖ var"));
        assert!(lines[9].starts_with("        ├── a.log"));
    }

    #[test]
    fn test_cursor_down_stops_at_bottom() {
        let mut vm = sample_vm(4);
        for _ in 0..10 {
            vm.cursor_down();
        }
        assert_eq!(vm.cursor(), 10);
        assert!(!vm.cursor_down());
        assert_eq!(vm.cursor(), 10);
        let (top, height) = vm.window();
        assert!(top <= vm.cursor() && vm.cursor() < top + height);
    }

    #[test]
    fn test_cursor_up_stops_at_top() {
        let mut vm = sample_vm(4);
        assert!(!vm.cursor_up());
        assert!(vm.cursor_down());
        assert!(vm.cursor_up());
        assert!(!vm.cursor_up());
        assert_eq!(vm.cursor(), 0);
    }

    #[test]
    fn test_window_follows_cursor() {
        let mut vm = sample_vm(3);
        for _ in 0..5 {
            vm.cursor_down();
        }
        assert_eq!(vm.window(), (3, 3));
        for _ in 0..4 {
            vm.cursor_up();
        }
        assert_eq!(vm.cursor(), 1);
        assert_eq!(vm.window(), (1, 3));
    }

    #[test]
    fn test_render_marks_only_cursor_row() {
        let mut vm = sample_vm(5);
        vm.cursor_down();
        let buffer = vm.render().unwrap();
        assert_eq!(buffer.lines.len(), 5);
        let selected: Vec<usize> = buffer
            .lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.selected)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(selected, vec![1]);
        assert_eq!(buffer.lines[1].text.chars().count(), 80);
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut vm = sample_vm(6);
        vm.cursor_down();
        vm.cursor_down();
        let filter = Regex::new("log").unwrap();

        vm.update(Some(&filter), 60, 6).unwrap();
        let first = vm.render().unwrap();
        vm.update(Some(&filter), 60, 6).unwrap();
        let second = vm.render().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_filter_keeps_ancestors_of_matches() {
        let mut vm = sample_vm(20);
        let filter = Regex::new(r"\.log$").unwrap();
        vm.update(Some(&filter), 80, 20).unwrap();
        assert_eq!(names(&vm), vec!["var", "log", "a.log", "b.log"]);
    }

    #[test]
    fn test_filter_reclamps_cursor() {
        let mut vm = sample_vm(20);
        for _ in 0..10 {
            vm.cursor_down();
        }
        let filter = Regex::new("passwd").unwrap();
        vm.update(Some(&filter), 80, 20).unwrap();
        assert_eq!(names(&vm), vec!["etc", "passwd"]);
        assert_eq!(vm.cursor(), 1);
        assert_eq!(vm.window().0, 0);
    }

    #[test]
    fn test_hidden_diff_types() {
        let mut vm = sample_vm(20);
        vm.toggle_show_diff_type(DiffType::Unmodified).unwrap();
        assert!(vm.is_diff_type_hidden(DiffType::Unmodified));
        assert_eq!(names(&vm), vec!["etc", "hosts", "passwd", "readme.md"]);

        vm.toggle_show_diff_type(DiffType::Added).unwrap();
        assert_eq!(names(&vm), vec!["etc", "hosts", "readme.md"]);

        vm.toggle_show_diff_type(DiffType::Unmodified).unwrap();
        assert!(!names(&vm).contains(&"passwd".to_string()));
        assert!(names(&vm).contains(&"sh".to_string()));
    }

    #[test]
    fn test_toggle_collapse_hides_children() {
        let mut vm = sample_vm(20);
        vm.toggle_collapse().unwrap();
        assert_eq!(names(&vm)[..3], ["bin", "etc", "hosts"]);
        assert!(vm.render().unwrap().lines[0].text.starts_with("├── ⊕ bin"));

        vm.toggle_collapse().unwrap();
        assert_eq!(names(&vm)[1], "ls");
    }

    #[test]
    fn test_toggle_collapse_on_file_is_noop() {
        let mut vm = sample_vm(20);
        vm.cursor_down();
        let before = names(&vm);
        vm.toggle_collapse().unwrap();
        assert_eq!(names(&vm), before);
    }

    #[test]
    fn test_toggle_collapse_all() {
        let mut vm = sample_vm(20);
        vm.toggle_collapse_all().unwrap();
        assert!(vm.collapse_all());
        assert_eq!(names(&vm), vec!["bin", "etc", "readme.md", "var"]);

        vm.toggle_collapse_all().unwrap();
        assert!(!vm.collapse_all());
        assert_eq!(names(&vm).len(), 11);
    }

    #[test]
    fn test_toggle_sort_order() {
        let mut vm = sample_vm(20);
        vm.toggle_sort_order().unwrap();
        assert_eq!(vm.sort_order(), SortOrder::BySizeDesc);
        assert_eq!(names(&vm)[0], "var");
    }

    #[test]
    fn test_cursor_left_moves_to_parent() {
        let mut vm = sample_vm(20);
        for _ in 0..10 {
            vm.cursor_down();
        }
        assert_eq!(current_name(&vm), "b.log");
        vm.cursor_left().unwrap();
        assert_eq!(current_name(&vm), "log");
        vm.cursor_left().unwrap();
        assert_eq!(current_name(&vm), "var");
        vm.cursor_left().unwrap();
        assert_eq!(vm.cursor(), 0);
    }

    #[test]
    fn test_cursor_right_expands_and_descends() {
        let mut vm = sample_vm(20);
        vm.toggle_collapse_all().unwrap();
        vm.reset_cursor();
        vm.cursor_right().unwrap();
        assert_eq!(current_name(&vm), "ls");

        // a file does not descend
        vm.cursor_right().unwrap();
        assert_eq!(current_name(&vm), "ls");
    }

    #[test]
    fn test_page_down_and_up() {
        let mut vm = sample_vm(4);
        vm.page_down().unwrap();
        assert_eq!(vm.window(), (4, 4));
        assert_eq!(vm.cursor(), 4);

        vm.page_down().unwrap();
        assert_eq!(vm.window(), (7, 4));
        assert_eq!(vm.cursor(), 7);

        // last page: the cursor moves to the final row
        vm.page_down().unwrap();
        assert_eq!(vm.window(), (7, 4));
        assert_eq!(vm.cursor(), 10);

        vm.page_up().unwrap();
        assert_eq!(vm.window(), (3, 4));
        assert_eq!(vm.cursor(), 3);

        vm.page_up().unwrap();
        assert_eq!(vm.window(), (0, 4));
        assert_eq!(vm.cursor(), 0);
    }

    #[test]
    fn test_constrain_hides_attributes_until_expanded() {
        let mut vm = sample_vm(10);
        vm.toggle_attributes();
        assert!(vm.show_attributes());
        vm.constrain_layout();
        assert!(!vm.show_attributes());

        vm.toggle_attributes();
        assert!(!vm.show_attributes(), "toggle is ignored while constrained");

        vm.expand_layout();
        assert!(vm.show_attributes());
    }

    #[test]
    fn test_empty_tree() {
        let mut vm =
            FileTreeViewModel::new(FileTree::new("/empty"), &ResolvedConfig::default()).unwrap();
        vm.update(None, 40, 10).unwrap();
        assert!(!vm.cursor_down());
        vm.cursor_left().unwrap();
        vm.cursor_right().unwrap();
        vm.page_down().unwrap();
        assert!(vm.current_node().unwrap().is_none());
        assert!(vm.render().unwrap().lines.is_empty());
    }
}
