//! Panes: named body regions with a header region above them.

pub mod filetree;
pub mod filter;
pub mod info;
pub mod status;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::format;
use crate::geometry::Rect;
use crate::keys::Action;
use crate::layout::LayoutMode;
use crate::surface::{RegionOptions, RegionStatus, Surface};

pub use filetree::FileTreePane;
pub use filter::FilterPane;
pub use info::{InfoPane, InfoRow};
pub use status::StatusPane;

/// First-layout gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaneState {
    #[default]
    Uninitialized,
    Ready,
}

/// Region name of a pane's header.
pub fn header_region(name: &str) -> String {
    format!("{name}Header")
}

pub trait Pane {
    fn name(&self) -> &'static str;

    fn state(&self) -> PaneState;

    /// Bind keys and draw for the first time. Moves the pane to `Ready`.
    fn setup(&mut self, surface: &mut dyn Surface, body: Rect, header: Rect) -> Result<()>;

    /// Record new geometry; returns whether it changed.
    fn resize(&mut self, body: Rect, header: Rect) -> bool;

    fn on_layout_change(&mut self, surface: &mut dyn Surface) -> Result<()> {
        if self.state() == PaneState::Ready {
            self.update()?;
            self.render(surface)?;
        }
        Ok(())
    }

    /// Refresh state ahead of rendering.
    fn update(&mut self) -> Result<()>;

    /// Queue the header and body text on the surface.
    fn render(&self, surface: &mut dyn Surface) -> Result<()>;

    /// Run a bound action. Actions the pane does not own are ignored.
    fn handle(&mut self, surface: &mut dyn Surface, action: Action) -> Result<()>;

    fn key_help(&self) -> String;

    fn apply_layout_mode(&mut self, _mode: LayoutMode) {}

    /// Set region options; runs at setup and whenever the regions are recreated.
    fn configure(&self, surface: &mut dyn Surface) -> Result<()> {
        configure_regions(surface, self.name())
    }

    /// Forget the placed geometry after the regions were removed. Rendering
    /// is a no-op until the next placement.
    fn detach(&mut self);
}

/// Carve `area` into header and body regions for `pane`.
///
/// Runs setup while the pane is uninitialized, otherwise redraws it when its
/// geometry changed or its regions had to be recreated. A pane that does not
/// fit loses both regions and `false` is returned.
pub fn place(
    surface: &mut dyn Surface,
    pane: &mut dyn Pane,
    area: Rect,
    header_rows: u16,
) -> Result<bool> {
    let name = pane.name();
    let Some((header, body)) = area.split_header(header_rows) else {
        warn!(pane = name, ?area, header_rows, "not enough room for pane");
        hide(surface, pane);
        return Ok(false);
    };
    let header_status = surface.set_region(&header_region(name), header);
    let body_status = surface.set_region(name, body);
    let recreated = header_status == RegionStatus::Created || body_status == RegionStatus::Created;

    match pane.state() {
        PaneState::Uninitialized => pane
            .setup(surface, body, header)
            .map_err(|e| Error::setup(name, e))?,
        PaneState::Ready => {
            if recreated {
                pane.configure(surface)?;
            }
            if pane.resize(body, header) || recreated {
                pane.update()?;
                pane.render(surface)?;
            }
        }
    }
    Ok(true)
}

/// Drop both regions of `pane` and forget its geometry.
pub fn hide(surface: &mut dyn Surface, pane: &mut dyn Pane) {
    let name = pane.name();
    let body = surface.remove_region(name);
    let header = surface.remove_region(&header_region(name));
    if body || header {
        debug!(pane = name, "regions removed");
    }
    pane.detach();
}

/// Make the header and body regions read-only and unwrapped.
pub(crate) fn configure_regions(surface: &mut dyn Surface, name: &str) -> Result<()> {
    let options = RegionOptions::default();
    surface.configure_region(name, options)?;
    surface.configure_region(&header_region(name), options)
}

pub(crate) fn is_focused(surface: &dyn Surface, name: &str) -> bool {
    surface.current_focus() == Some(name)
}

pub(crate) fn header_line(title: &str, width: u16, selected: bool) -> Line<'static> {
    let style = if selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    Line::styled(format::render_header(title, width, selected), style)
}

pub(crate) fn selected_style() -> Style {
    Style::default().add_modifier(Modifier::REVERSED)
}
