//! Plain text panes used in the compound column.
//!
//! An info pane shows rows of `label  detail`. A selectable pane keeps a
//! cursor and binds the navigation keys; a constrained pane drops the detail
//! column to fit a narrow column.

use ratatui::style::Style;
use ratatui::text::{Line, Text};
use tracing::{trace, Span};

use super::{header_line, header_region, is_focused, selected_style};
use super::{Pane, PaneState};
use crate::config::{NavigationKeys, ResolvedConfig};
use crate::error::Result;
use crate::format;
use crate::geometry::Rect;
use crate::keys::{generate_bindings, Action, Binding, BindingInfo};
use crate::layout::LayoutMode;
use crate::surface::{RegionUpdate, Surface};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoRow {
    pub label: String,
    pub detail: String,
}

impl InfoRow {
    pub fn new(label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            detail: detail.into(),
        }
    }
}

pub struct InfoPane {
    name: &'static str,
    title: String,
    rows: Vec<InfoRow>,
    selectable: bool,
    cursor: usize,
    top: usize,
    constrained: bool,
    navigation: NavigationKeys,
    help: Vec<Binding>,
    state: PaneState,
    body: Option<Rect>,
    header: Option<Rect>,
    span: Span,
}

impl InfoPane {
    pub fn new(
        name: &'static str,
        title: impl Into<String>,
        config: &ResolvedConfig,
        span: Span,
    ) -> Self {
        Self {
            name,
            title: title.into(),
            rows: Vec::new(),
            selectable: false,
            cursor: 0,
            top: 0,
            constrained: false,
            navigation: config.keybindings.navigation.clone(),
            help: Vec::new(),
            state: PaneState::Uninitialized,
            body: None,
            header: None,
            span,
        }
    }

    /// Give the pane a cursor driven by the navigation keys.
    pub fn selectable(mut self) -> Self {
        self.selectable = true;
        self
    }

    pub fn rows(&self) -> &[InfoRow] {
        &self.rows
    }

    /// Replace the content; rendered on the next `render`.
    pub fn set_rows(&mut self, rows: Vec<InfoRow>) {
        self.rows = rows;
        self.clamp();
    }

    /// Index of the selected row.
    pub fn cursor(&self) -> Option<usize> {
        (self.selectable && !self.rows.is_empty()).then_some(self.cursor)
    }

    pub fn is_constrained(&self) -> bool {
        self.constrained
    }

    fn height(&self) -> usize {
        self.body
            .map(|body| usize::from(body.height()))
            .unwrap_or(0)
            .max(1)
    }

    fn clamp(&mut self) {
        self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
        let height = self.height();
        self.top = self.top.min(self.rows.len().saturating_sub(height));
        if self.cursor < self.top {
            self.top = self.cursor;
        } else if self.cursor >= self.top + height {
            self.top = self.cursor + 1 - height;
        }
    }

    fn move_cursor(&mut self, down: bool) -> bool {
        if !self.selectable {
            return false;
        }
        let next = if down {
            self.cursor + 1
        } else {
            match self.cursor.checked_sub(1) {
                Some(next) => next,
                None => return false,
            }
        };
        if next >= self.rows.len() {
            return false;
        }
        self.cursor = next;
        self.clamp();
        true
    }

    fn line(&self, index: usize, label_width: usize, width: usize) -> Line<'static> {
        let row = &self.rows[index];
        let text = if self.constrained || row.detail.is_empty() {
            row.label.clone()
        } else {
            format!("{:<label_width$}  {}", row.label, row.detail)
        };
        let text = format::truncate(&text, width);
        let style = if self.selectable && index == self.cursor {
            selected_style()
        } else {
            Style::default()
        };
        Line::styled(text, style)
    }
}

impl Pane for InfoPane {
    fn name(&self) -> &'static str {
        self.name
    }

    fn state(&self) -> PaneState {
        self.state
    }

    fn setup(&mut self, surface: &mut dyn Surface, body: Rect, header: Rect) -> Result<()> {
        trace!(parent: &self.span, pane = self.name, ?body, "setup");
        self.configure(surface)?;

        if self.selectable {
            let infos = [
                BindingInfo::shown(&self.navigation.up, Action::CursorUp, "Previous"),
                BindingInfo::shown(&self.navigation.down, Action::CursorDown, "Next"),
            ];
            self.help = generate_bindings(surface, Some(self.name), &infos)?;
        }

        self.resize(body, header);
        self.state = PaneState::Ready;
        self.update()?;
        self.render(surface)
    }

    fn resize(&mut self, body: Rect, header: Rect) -> bool {
        let changed = self.body != Some(body) || self.header != Some(header);
        self.body = Some(body);
        self.header = Some(header);
        changed
    }

    fn detach(&mut self) {
        self.body = None;
        self.header = None;
    }

    fn update(&mut self) -> Result<()> {
        self.clamp();
        Ok(())
    }

    fn render(&self, surface: &mut dyn Surface) -> Result<()> {
        let (Some(header), Some(body)) = (self.header, self.body) else {
            return Ok(());
        };
        let header = header_line(&self.title, header.width(), is_focused(surface, self.name));
        let width = usize::from(body.width());

        let label_width = self
            .rows
            .iter()
            .map(|row| row.label.chars().count())
            .max()
            .unwrap_or(0);
        let end = (self.top + self.height()).min(self.rows.len());
        let body: Vec<Line<'static>> = (self.top..end)
            .map(|index| self.line(index, label_width, width))
            .collect();

        surface.schedule(RegionUpdate {
            region: header_region(self.name),
            text: Text::from(header),
        });
        surface.schedule(RegionUpdate {
            region: self.name.to_string(),
            text: Text::from(body),
        });
        Ok(())
    }

    fn handle(&mut self, surface: &mut dyn Surface, action: Action) -> Result<()> {
        let moved = match action {
            Action::CursorDown => self.move_cursor(true),
            Action::CursorUp => self.move_cursor(false),
            _ => false,
        };
        if moved {
            self.render(surface)?;
        }
        Ok(())
    }

    fn key_help(&self) -> String {
        self.help
            .iter()
            .map(|binding| binding.render_key_help(None))
            .collect()
    }

    fn apply_layout_mode(&mut self, mode: LayoutMode) {
        self.constrained = mode == LayoutMode::Constrained;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pane::place;
    use crate::surface::Screen;

    fn rows(n: usize) -> Vec<InfoRow> {
        (0..n)
            .map(|i| InfoRow::new(format!("layer {i}"), format!("{} KB", i * 10)))
            .collect()
    }

    fn ready(selectable: bool, height: u16) -> (InfoPane, Screen) {
        let mut screen = Screen::new(40, height);
        let mut pane = InfoPane::new("layers", "Layers", &ResolvedConfig::default(), Span::none());
        if selectable {
            pane = pane.selectable();
        }
        pane.set_rows(rows(6));
        place(&mut screen, &mut pane, Rect::from_size(40, height).unwrap(), 2).unwrap();
        screen.flush().unwrap();
        (pane, screen)
    }

    fn body(screen: &Screen) -> Vec<String> {
        screen
            .region("layers")
            .unwrap()
            .text()
            .lines
            .iter()
            .map(|line| line.to_string())
            .collect()
    }

    #[test]
    fn test_detail_column_hidden_when_constrained() {
        let (mut pane, mut screen) = ready(false, 10);
        assert_eq!(body(&screen)[1], "layer 1  10 KB");

        pane.apply_layout_mode(LayoutMode::Constrained);
        pane.render(&mut screen).unwrap();
        screen.flush().unwrap();
        assert_eq!(body(&screen)[1], "layer 1");
    }

    #[test]
    fn test_long_rows_are_cut_to_the_body_width() {
        let mut screen = Screen::new(12, 10);
        let mut pane = InfoPane::new("image", "Image", &ResolvedConfig::default(), Span::none());
        pane.set_rows(vec![InfoRow::new("Root", "/var/lib/containers/base")]);
        place(&mut screen, &mut pane, Rect::from_size(12, 10).unwrap(), 2).unwrap();
        screen.flush().unwrap();

        assert_eq!(screen.region("image").unwrap().text().lines[0].to_string(), "Root  /var/…");
    }

    #[test]
    fn test_unplaced_pane_does_not_render() {
        let mut screen = Screen::new(40, 10);
        let (mut pane, _) = ready(true, 10);
        pane.detach();
        pane.render(&mut screen).unwrap();
        assert_eq!(screen.pending_updates(), 0);
    }

    #[test]
    fn test_cursor_only_when_selectable() {
        let (mut plain, mut screen) = ready(false, 10);
        plain.handle(&mut screen, Action::CursorDown).unwrap();
        assert_eq!(plain.cursor(), None);
        assert_eq!(screen.pending_updates(), 0);

        let (mut layers, mut screen) = ready(true, 10);
        layers.handle(&mut screen, Action::CursorDown).unwrap();
        assert_eq!(layers.cursor(), Some(1));
        assert_eq!(screen.pending_updates(), 2);
        assert_eq!(layers.key_help(), "↑ Previous ↓ Next ");
        assert_eq!(plain.key_help(), "");
    }

    #[test]
    fn test_cursor_stops_at_edges_and_scrolls() {
        // body of 4 rows
        let (mut pane, mut screen) = ready(true, 6);
        pane.handle(&mut screen, Action::CursorUp).unwrap();
        assert_eq!(screen.pending_updates(), 0);

        for _ in 0..10 {
            pane.handle(&mut screen, Action::CursorDown).unwrap();
        }
        screen.flush().unwrap();
        assert_eq!(pane.cursor(), Some(5));
        let lines = body(&screen);
        assert_eq!(lines.len(), 4);
        assert!(lines[3].starts_with("layer 5"));
    }

    #[test]
    fn test_set_rows_clamps_cursor() {
        let (mut pane, mut screen) = ready(true, 10);
        for _ in 0..5 {
            pane.handle(&mut screen, Action::CursorDown).unwrap();
        }
        pane.set_rows(rows(2));
        assert_eq!(pane.cursor(), Some(1));
        pane.set_rows(Vec::new());
        assert_eq!(pane.cursor(), None);
    }
}
