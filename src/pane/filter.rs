//! Footer for editing the path filter.
//!
//! Visible while editing or while a pattern is set. The pattern is a regex
//! matched against full node paths.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span as TextSpan, Text};
use regex::Regex;
use tracing::{debug, Span};

use crate::error::Result;
use crate::geometry::Rect;
use crate::layout::Layout;
use crate::surface::{RegionOptions, RegionStatus, RegionUpdate, Surface};

pub const NAME: &str = "filter";
const PROMPT: &str = "Path Filter: ";

pub struct FilterPane {
    query: String,
    editing: bool,
    area: Option<Rect>,
    span: Span,
}

impl FilterPane {
    pub fn new(span: Span) -> Self {
        Self {
            query: String::new(),
            editing: false,
            area: None,
            span,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn begin_edit(&mut self) {
        self.editing = true;
    }

    pub fn push(&mut self, ch: char) {
        self.query.push(ch);
    }

    pub fn pop(&mut self) {
        self.query.pop();
    }

    /// Stop editing. An empty filter also removes the footer.
    pub fn end_edit(&mut self, surface: &mut dyn Surface) -> Result<()> {
        self.editing = false;
        if self.query.is_empty() {
            self.hide(surface);
            return Ok(());
        }
        self.render(surface)
    }

    /// Compile the current query; `None` when it is empty.
    pub fn pattern(&self) -> Result<Option<Regex>> {
        if self.query.is_empty() {
            return Ok(None);
        }
        let regex = Regex::new(&self.query)?;
        debug!(parent: &self.span, pattern = %self.query, "filter compiled");
        Ok(Some(regex))
    }

    pub fn render(&self, surface: &mut dyn Surface) -> Result<()> {
        if self.area.is_none() {
            return Ok(());
        }
        let mut spans = vec![
            TextSpan::styled(PROMPT, Style::default().fg(Color::Cyan)),
            TextSpan::raw(self.query.clone()),
        ];
        if self.editing {
            spans.push(TextSpan::styled(
                " ",
                Style::default().add_modifier(Modifier::REVERSED),
            ));
        }
        surface.schedule(RegionUpdate {
            region: NAME.to_string(),
            text: Text::from(Line::from(spans)),
        });
        Ok(())
    }
}

impl Layout for FilterPane {
    fn name(&self) -> &'static str {
        NAME
    }

    fn on_layout_change(&mut self, surface: &mut dyn Surface) -> Result<()> {
        self.render(surface)
    }

    fn layout(&mut self, surface: &mut dyn Surface, area: Rect) -> Result<bool> {
        if surface.set_region(NAME, area) == RegionStatus::Created {
            surface.configure_region(
                NAME,
                RegionOptions {
                    wrap: false,
                    editable: true,
                },
            )?;
        } else if self.area == Some(area) {
            return Ok(true);
        }
        self.area = Some(area);
        self.render(surface)?;
        Ok(true)
    }

    /// Drops the region only; the query and editing state survive.
    fn hide(&mut self, surface: &mut dyn Surface) {
        surface.remove_region(NAME);
        self.area = None;
    }

    fn is_visible(&self) -> bool {
        self.editing || !self.query.is_empty()
    }
}
