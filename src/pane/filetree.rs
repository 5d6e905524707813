//! The file tree pane.

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Text};
use regex::Regex;
use tracing::{debug, trace, Span};

use super::{configure_regions, header_line, header_region, hide, is_focused, place, selected_style};
use super::{Pane, PaneState};
use crate::config::{KeyBindings, ResolvedConfig};
use crate::error::Result;
use crate::format;
use crate::geometry::Rect;
use crate::keys::{generate_bindings, Action, Binding, BindingInfo};
use crate::layout::Layout;
use crate::listeners::{ExtractRequested, Listeners, ViewOptionChanged};
use crate::surface::{RegionOptions, RegionUpdate, Surface};
use crate::tree::{DiffType, FileTree};
use crate::viewmodel::{FileTreeViewModel, RenderLine};

pub const NAME: &str = "filetree";

/// Below this many columns the attribute columns are hidden.
const CONSTRAIN_WIDTH: u16 = 60;

pub struct FileTreePane {
    title: String,
    vm: FileTreeViewModel,
    listeners: Listeners,
    keybindings: KeyBindings,
    filter: Option<Regex>,
    help: Vec<Binding>,
    wrap: bool,
    state: PaneState,
    body: Option<Rect>,
    header: Option<Rect>,
    span: Span,
}

impl FileTreePane {
    pub fn new(tree: FileTree, config: &ResolvedConfig, span: Span) -> Result<Self> {
        let vm = FileTreeViewModel::new(tree, config)?;
        Ok(Self {
            title: "Filetree".to_string(),
            vm,
            listeners: Listeners::default(),
            keybindings: config.keybindings.clone(),
            filter: None,
            help: Vec::new(),
            wrap: false,
            state: PaneState::Uninitialized,
            body: None,
            header: None,
            span,
        })
    }

    pub fn listeners_mut(&mut self) -> &mut Listeners {
        &mut self.listeners
    }

    pub fn view_model(&self) -> &FileTreeViewModel {
        &self.vm
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Takes effect on the next update.
    pub fn set_filter(&mut self, filter: Option<Regex>) {
        self.filter = filter;
    }

    /// Swap in a new tree and redraw from the top.
    pub fn set_tree(&mut self, surface: &mut dyn Surface, tree: FileTree) -> Result<()> {
        self.vm.set_tree(tree)?;
        if self.state == PaneState::Ready {
            self.refresh(surface)?;
        }
        Ok(())
    }

    fn header_rows(&self) -> u16 {
        1 + u16::from(self.vm.show_attributes())
    }

    fn binding_infos(&self) -> Vec<BindingInfo<'_>> {
        let nav = &self.keybindings.navigation;
        let tree = &self.keybindings.filetree;
        let shown = BindingInfo::shown;
        let hidden = BindingInfo::hidden;

        vec![
            shown(&tree.toggle_collapse_dir, Action::ToggleCollapseDir, "Collapse dir"),
            shown(&tree.toggle_collapse_all_dir, Action::ToggleCollapseAllDir, "Collapse all dir"),
            shown(&tree.toggle_sort_order, Action::ToggleSortOrder, "Toggle sort order"),
            shown(&tree.extract_file, Action::ExtractFile, "Extract File"),
            shown(&tree.toggle_added_files, Action::ToggleDiffType(DiffType::Added), "Added"),
            shown(&tree.toggle_removed_files, Action::ToggleDiffType(DiffType::Removed), "Removed"),
            shown(&tree.toggle_modified_files, Action::ToggleDiffType(DiffType::Modified), "Modified"),
            shown(
                &tree.toggle_unmodified_files,
                Action::ToggleDiffType(DiffType::Unmodified),
                "Unmodified",
            ),
            shown(&tree.toggle_tree_attributes, Action::ToggleAttributes, "Attributes"),
            shown(&tree.toggle_wrap_tree, Action::ToggleWrapTree, "Wrap"),
            hidden(&nav.page_up, Action::PageUp),
            hidden(&nav.page_down, Action::PageDown),
            hidden(&nav.down, Action::CursorDown),
            hidden(&nav.up, Action::CursorUp),
            hidden(&nav.left, Action::CursorLeft),
            hidden(&nav.right, Action::CursorRight),
        ]
    }

    /// Checkbox state shown next to toggles in the key help.
    fn is_selected(&self, action: Action) -> Option<bool> {
        match action {
            Action::ToggleDiffType(diff) => Some(!self.vm.is_diff_type_hidden(diff)),
            Action::ToggleAttributes => Some(self.vm.show_attributes()),
            Action::ToggleWrapTree => Some(self.wrap),
            _ => None,
        }
    }

    fn refresh(&mut self, surface: &mut dyn Surface) -> Result<()> {
        self.update()?;
        self.render(surface)
    }

    fn notify_view_option_change(&mut self) -> Result<()> {
        self.listeners.view_option.publish(&ViewOptionChanged)
    }

    fn extract_file(&mut self) -> Result<()> {
        let Some(node) = self.vm.current_node()? else {
            return Ok(());
        };
        let event = ExtractRequested {
            path: node.path.clone(),
        };
        debug!(parent: &self.span, path = %event.path.display(), "extract requested");
        self.listeners.extract.publish(&event)
    }

    fn toggle_wrap_tree(&mut self, surface: &mut dyn Surface) -> Result<()> {
        self.wrap = !self.wrap;
        if self.body.is_some() {
            self.configure(surface)?;
        }
        self.refresh(surface)?;
        self.notify_view_option_change()
    }
}

fn styled_line(line: &RenderLine) -> Line<'static> {
    let style = match line.diff {
        DiffType::Added => Style::default().fg(Color::Green),
        DiffType::Removed => Style::default().fg(Color::Red),
        DiffType::Modified => Style::default().fg(Color::Yellow),
        DiffType::Unmodified => Style::default(),
    };
    let style = if line.selected {
        style.patch(selected_style())
    } else {
        style
    };
    Line::styled(line.text.clone(), style)
}

impl Pane for FileTreePane {
    fn name(&self) -> &'static str {
        NAME
    }

    fn state(&self) -> PaneState {
        self.state
    }

    fn setup(&mut self, surface: &mut dyn Surface, body: Rect, header: Rect) -> Result<()> {
        trace!(parent: &self.span, ?body, ?header, "setup");
        self.configure(surface)?;

        let infos = self.binding_infos();
        let help = generate_bindings(surface, Some(NAME), &infos)?;
        self.help = help;

        self.resize(body, header);
        self.vm.setup(0, usize::from(body.height()));
        self.state = PaneState::Ready;
        self.refresh(surface)
    }

    fn resize(&mut self, body: Rect, header: Rect) -> bool {
        let changed = self.body != Some(body) || self.header != Some(header);
        self.body = Some(body);
        self.header = Some(header);
        changed
    }

    fn configure(&self, surface: &mut dyn Surface) -> Result<()> {
        configure_regions(surface, NAME)?;
        surface.configure_region(
            NAME,
            RegionOptions {
                wrap: self.wrap,
                editable: false,
            },
        )
    }

    fn detach(&mut self) {
        self.body = None;
        self.header = None;
    }

    fn update(&mut self) -> Result<()> {
        let (width, height) = self
            .body
            .map(|body| (body.width(), body.height()))
            .unwrap_or_default();
        self.vm
            .update(self.filter.as_ref(), usize::from(width), usize::from(height))?;
        Ok(())
    }

    fn render(&self, surface: &mut dyn Surface) -> Result<()> {
        let Some(width) = self.header.map(|h| h.width()) else {
            return Ok(());
        };
        trace!(parent: &self.span, "render");
        let selected = is_focused(surface, NAME);

        let mut header = vec![header_line(&self.title, width, selected)];
        if self.vm.show_attributes() {
            header.push(Line::raw(format::attribute_legend()));
        }
        let buffer = self.vm.render()?;
        let body: Vec<Line<'static>> = buffer.lines.iter().map(styled_line).collect();

        surface.schedule(RegionUpdate {
            region: header_region(NAME),
            text: Text::from(header),
        });
        surface.schedule(RegionUpdate {
            region: NAME.to_string(),
            text: Text::from(body),
        });
        Ok(())
    }

    fn handle(&mut self, surface: &mut dyn Surface, action: Action) -> Result<()> {
        match action {
            Action::CursorDown => {
                if self.vm.cursor_down() {
                    self.render(surface)?;
                }
            }
            Action::CursorUp => {
                if self.vm.cursor_up() {
                    self.render(surface)?;
                }
            }
            Action::CursorLeft => {
                self.vm.cursor_left()?;
                self.refresh(surface)?;
            }
            Action::CursorRight => {
                self.vm.cursor_right()?;
                self.refresh(surface)?;
            }
            Action::PageDown => {
                self.vm.page_down()?;
                self.refresh(surface)?;
            }
            Action::PageUp => {
                self.vm.page_up()?;
                self.refresh(surface)?;
            }
            Action::ToggleCollapseDir => {
                self.vm.toggle_collapse()?;
                self.refresh(surface)?;
            }
            Action::ToggleCollapseAllDir => {
                self.vm.toggle_collapse_all()?;
                if self.vm.collapse_all() {
                    self.vm.reset_cursor();
                }
                self.refresh(surface)?;
            }
            Action::ToggleSortOrder => {
                self.vm.toggle_sort_order()?;
                self.vm.reset_cursor();
                self.refresh(surface)?;
            }
            Action::ExtractFile => self.extract_file()?,
            Action::ToggleDiffType(diff) => {
                self.vm.toggle_show_diff_type(diff)?;
                self.refresh(surface)?;
                self.notify_view_option_change()?;
            }
            Action::ToggleAttributes => {
                self.vm.toggle_attributes();
                self.refresh(surface)?;
                self.notify_view_option_change()?;
            }
            Action::ToggleWrapTree => self.toggle_wrap_tree(surface)?,
            _ => {}
        }
        Ok(())
    }

    fn key_help(&self) -> String {
        self.help
            .iter()
            .map(|binding| binding.render_key_help(self.is_selected(binding.action)))
            .collect()
    }
}

impl Layout for FileTreePane {
    fn name(&self) -> &'static str {
        NAME
    }

    fn on_layout_change(&mut self, surface: &mut dyn Surface) -> Result<()> {
        Pane::on_layout_change(self, surface)
    }

    fn layout(&mut self, surface: &mut dyn Surface, area: Rect) -> Result<bool> {
        trace!(parent: &self.span, ?area, "layout");
        if area.width() < CONSTRAIN_WIDTH {
            self.vm.constrain_layout();
        } else {
            self.vm.expand_layout();
        }
        let header_rows = self.header_rows();
        place(surface, self, area, header_rows)
    }

    fn hide(&mut self, surface: &mut dyn Surface) {
        hide(surface, self);
    }

    fn is_visible(&self) -> bool {
        true
    }
}
