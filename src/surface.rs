//! Terminal surface boundary.
//!
//! Panes never touch the terminal directly. They allocate named regions,
//! write whole text blocks into them and register key bindings through the
//! [`Surface`] trait. [`Screen`] is the ratatui-backed implementation used by
//! the binary and by tests.

use std::collections::{HashMap, VecDeque};

use ratatui::text::Text;
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;
use tracing::trace;

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::keys::{Action, KeyPress};

/// Whether [`Surface::set_region`] allocated a new region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionStatus {
    Created,
    Reused,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionOptions {
    pub wrap: bool,
    pub editable: bool,
}

#[derive(Debug, Clone)]
pub struct Region {
    name: String,
    area: Rect,
    options: RegionOptions,
    text: Text<'static>,
}

impl Region {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    /// `(width, height)` in cells.
    pub fn size(&self) -> (u16, u16) {
        (self.area.width(), self.area.height())
    }

    pub fn options(&self) -> RegionOptions {
        self.options
    }

    pub fn text(&self) -> &Text<'static> {
        &self.text
    }
}

/// A wholesale region write queued until the next [`Surface::flush`].
#[derive(Debug, Clone)]
pub struct RegionUpdate {
    pub region: String,
    pub text: Text<'static>,
}

pub trait Surface {
    /// Total `(width, height)` of the surface.
    fn size(&self) -> (u16, u16);

    /// Create or move the named region.
    fn set_region(&mut self, name: &str, area: Rect) -> RegionStatus;

    fn region(&self, name: &str) -> Option<&Region>;

    /// Drop the named region. Returns whether it existed.
    fn remove_region(&mut self, name: &str) -> bool;

    fn configure_region(&mut self, name: &str, options: RegionOptions) -> Result<()>;

    fn current_focus(&self) -> Option<&str>;

    fn set_focus(&mut self, name: &str) -> Result<()>;

    fn clear(&mut self, name: &str) -> Result<()>;

    /// Replace the region's text.
    fn write(&mut self, name: &str, text: Text<'static>) -> Result<()>;

    /// Queue a write to be applied on the next flush.
    fn schedule(&mut self, update: RegionUpdate);

    /// Apply queued writes in the order they were scheduled.
    fn flush(&mut self) -> Result<()>;

    /// Bind `key` to `action` for a region, or globally when `region` is `None`.
    fn bind(&mut self, region: Option<&str>, key: KeyPress, action: Action) -> Result<()>;

    /// Resolve a key for the focused region, falling back to global bindings.
    fn binding_for(&self, key: KeyPress) -> Option<Action>;
}

/// In-memory region table drawn through ratatui.
#[derive(Debug, Default)]
pub struct Screen {
    width: u16,
    height: u16,
    regions: Vec<Region>,
    focus: Option<String>,
    pending: VecDeque<RegionUpdate>,
    bindings: HashMap<(Option<String>, KeyPress), Action>,
}

impl Screen {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    pub fn pending_updates(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    pub(crate) fn regions(&self) -> &[Region] {
        &self.regions
    }

    fn region_mut(&mut self, name: &str) -> Result<&mut Region> {
        self.regions
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::UnknownRegion(name.to_string()))
    }

    /// Draw every region in creation order.
    pub fn draw(&self, frame: &mut Frame) {
        let bounds = frame.area();
        for region in &self.regions {
            let area = region.area.to_ui().intersection(bounds);
            if area.width == 0 || area.height == 0 {
                continue;
            }
            let mut paragraph = Paragraph::new(region.text.clone());
            if region.options.wrap {
                paragraph = paragraph.wrap(Wrap { trim: false });
            }
            frame.render_widget(paragraph, area);
        }
    }
}

impl Surface for Screen {
    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn set_region(&mut self, name: &str, area: Rect) -> RegionStatus {
        if let Some(region) = self.regions.iter_mut().find(|r| r.name == name) {
            region.area = area;
            return RegionStatus::Reused;
        }
        trace!(region = name, ?area, "region created");
        self.regions.push(Region {
            name: name.to_string(),
            area,
            options: RegionOptions::default(),
            text: Text::default(),
        });
        RegionStatus::Created
    }

    fn region(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    fn remove_region(&mut self, name: &str) -> bool {
        let before = self.regions.len();
        self.regions.retain(|r| r.name != name);
        self.pending.retain(|u| u.region != name);
        if self.focus.as_deref() == Some(name) {
            self.focus = None;
        }
        self.regions.len() != before
    }

    fn configure_region(&mut self, name: &str, options: RegionOptions) -> Result<()> {
        self.region_mut(name)?.options = options;
        Ok(())
    }

    fn current_focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    fn set_focus(&mut self, name: &str) -> Result<()> {
        if self.region(name).is_none() {
            return Err(Error::UnknownRegion(name.to_string()));
        }
        self.focus = Some(name.to_string());
        Ok(())
    }

    fn clear(&mut self, name: &str) -> Result<()> {
        self.region_mut(name)?.text = Text::default();
        Ok(())
    }

    fn write(&mut self, name: &str, text: Text<'static>) -> Result<()> {
        self.region_mut(name)?.text = text;
        Ok(())
    }

    fn schedule(&mut self, update: RegionUpdate) {
        self.pending.push_back(update);
    }

    fn flush(&mut self) -> Result<()> {
        while let Some(update) = self.pending.pop_front() {
            self.clear(&update.region)?;
            self.write(&update.region, update.text)?;
        }
        Ok(())
    }

    fn bind(&mut self, region: Option<&str>, key: KeyPress, action: Action) -> Result<()> {
        if let Some(name) = region {
            if self.region(name).is_none() {
                return Err(Error::UnknownRegion(name.to_string()));
            }
        }
        self.bindings
            .insert((region.map(str::to_string), key), action);
        Ok(())
    }

    fn binding_for(&self, key: KeyPress) -> Option<Action> {
        self.focus
            .as_ref()
            .and_then(|focus| self.bindings.get(&(Some(focus.clone()), key)))
            .or_else(|| self.bindings.get(&(None, key)))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn rect(min_x: u16, min_y: u16, max_x: u16, max_y: u16) -> Rect {
        Rect::new(min_x, min_y, max_x, max_y).unwrap()
    }

    #[test]
    fn test_set_region_reports_creation_once() {
        let mut screen = Screen::new(80, 24);
        assert_eq!(screen.set_region("tree", rect(0, 0, 40, 10)), RegionStatus::Created);
        assert_eq!(screen.set_region("tree", rect(0, 0, 50, 12)), RegionStatus::Reused);
        assert_eq!(screen.region("tree").unwrap().size(), (50, 12));
    }

    #[test]
    fn test_remove_region_drops_focus_and_pending() {
        let mut screen = Screen::new(80, 24);
        screen.set_region("filter", rect(0, 23, 80, 24));
        screen.set_focus("filter").unwrap();
        screen.schedule(RegionUpdate {
            region: "filter".into(),
            text: Text::raw("Path Filter: "),
        });

        assert!(screen.remove_region("filter"));
        assert!(!screen.remove_region("filter"));
        assert_eq!(screen.current_focus(), None);
        assert_eq!(screen.pending_updates(), 0);
        screen.flush().unwrap();
    }

    #[test]
    fn test_focus_requires_known_region() {
        let mut screen = Screen::new(80, 24);
        assert!(matches!(
            screen.set_focus("missing"),
            Err(Error::UnknownRegion(_))
        ));
        screen.set_region("tree", rect(0, 0, 10, 10));
        screen.set_focus("tree").unwrap();
        assert_eq!(screen.current_focus(), Some("tree"));
    }

    #[test]
    fn test_scheduled_writes_apply_on_flush() {
        let mut screen = Screen::new(80, 24);
        screen.set_region("tree", rect(0, 0, 10, 10));
        screen.schedule(RegionUpdate {
            region: "tree".into(),
            text: Text::raw("first"),
        });
        screen.schedule(RegionUpdate {
            region: "tree".into(),
            text: Text::raw("second"),
        });
        assert_eq!(screen.region("tree").unwrap().text().lines.len(), 0);

        screen.flush().unwrap();
        assert_eq!(screen.pending_updates(), 0);
        assert_eq!(screen.region("tree").unwrap().text(), &Text::raw("second"));
    }

    #[test]
    fn test_focused_binding_wins_over_global() {
        let mut screen = Screen::new(80, 24);
        screen.set_region("tree", rect(0, 0, 10, 10));
        let key = KeyPress::new(KeyCode::Char('q'), KeyModifiers::NONE);
        screen.bind(None, key, Action::Quit).unwrap();
        screen.bind(Some("tree"), key, Action::ToggleSortOrder).unwrap();

        assert_eq!(screen.binding_for(key), Some(Action::Quit));
        screen.set_focus("tree").unwrap();
        assert_eq!(screen.binding_for(key), Some(Action::ToggleSortOrder));
    }

    #[test]
    fn test_draw_clips_regions_to_frame() {
        let mut screen = Screen::new(20, 4);
        screen.set_region("header", rect(0, 0, 20, 2));
        screen.set_region("body", rect(0, 1, 20, 10));
        screen.write("header", Text::raw("title")).unwrap();
        screen.write("body", Text::raw("one\ntwo\nthree\nfour\nfive")).unwrap();

        let mut terminal = Terminal::new(TestBackend::new(20, 4)).unwrap();
        terminal.draw(|frame| screen.draw(frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let row = |y: u16| -> String {
            (0..20).map(|x| buffer[(x, y)].symbol()).collect::<String>()
        };
        assert!(row(0).starts_with("title"));
        assert!(row(1).starts_with("one"));
        assert!(row(3).starts_with("three"));
    }
}
