//! One-line footer with key help or the last error.

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Text};
use tracing::{trace, Span};

use crate::error::Result;
use crate::geometry::Rect;
use crate::layout::Layout;
use crate::surface::{RegionOptions, RegionStatus, RegionUpdate, Surface};

pub const NAME: &str = "status";

pub struct StatusPane {
    help: String,
    message: Option<String>,
    area: Option<Rect>,
    span: Span,
}

impl StatusPane {
    pub fn new(span: Span) -> Self {
        Self {
            help: String::new(),
            message: None,
            area: None,
            span,
        }
    }

    pub fn set_help(&mut self, help: impl Into<String>) {
        self.help = help.into();
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Show `message` instead of the key help until cleared.
    pub fn set_message(&mut self, message: Option<String>) {
        self.message = message;
    }

    pub fn render(&self, surface: &mut dyn Surface) -> Result<()> {
        if self.area.is_none() {
            return Ok(());
        }
        trace!(parent: &self.span, "render");
        let line = match &self.message {
            Some(message) => Line::styled(message.clone(), Style::default().fg(Color::Red)),
            None => Line::styled(self.help.clone(), Style::default().fg(Color::Gray)),
        };
        surface.schedule(RegionUpdate {
            region: NAME.to_string(),
            text: Text::from(line),
        });
        Ok(())
    }
}

impl Layout for StatusPane {
    fn name(&self) -> &'static str {
        NAME
    }

    fn on_layout_change(&mut self, surface: &mut dyn Surface) -> Result<()> {
        self.render(surface)
    }

    fn layout(&mut self, surface: &mut dyn Surface, area: Rect) -> Result<bool> {
        if surface.set_region(NAME, area) == RegionStatus::Created {
            surface.configure_region(NAME, RegionOptions::default())?;
        } else if self.area == Some(area) {
            return Ok(true);
        }
        self.area = Some(area);
        self.render(surface)?;
        Ok(true)
    }

    fn hide(&mut self, surface: &mut dyn Surface) {
        surface.remove_region(NAME);
        self.area = None;
    }
}
