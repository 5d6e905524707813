//! A column of panes stacked in equal-height bands.

use tracing::{debug, trace, Span};

use super::{Layout, LayoutMode};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::pane::{hide, place, Pane};
use crate::surface::Surface;

/// Text rows in each band's header.
const HEADER_ROWS: u16 = 2;
/// Below this screen width the primary pane is constrained.
const CONSTRAIN_WIDTH: u16 = 90;
/// Width requested while constrained.
const CONSTRAINED_SIZE: u16 = 8;

/// Stacks panes top to bottom. The first pane is the primary one: it takes
/// the default focus and stands in for the whole column during negotiation.
pub struct CompoundLayout<P> {
    name: &'static str,
    panes: Vec<P>,
    constrained: bool,
    span: Span,
}

impl<P: Pane> CompoundLayout<P> {
    pub fn new(name: &'static str, panes: Vec<P>, span: Span) -> Self {
        Self {
            name,
            panes,
            constrained: false,
            span,
        }
    }

    pub fn panes(&self) -> &[P] {
        &self.panes
    }

    pub fn pane(&self, name: &str) -> Option<&P> {
        self.panes.iter().find(|p| p.name() == name)
    }

    pub fn pane_mut(&mut self, name: &str) -> Option<&mut P> {
        self.panes.iter_mut().find(|p| p.name() == name)
    }

    pub fn is_constrained(&self) -> bool {
        self.constrained
    }
}

impl<P: Pane> Layout for CompoundLayout<P> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn on_layout_change(&mut self, surface: &mut dyn Surface) -> Result<()> {
        for pane in &mut self.panes {
            pane.on_layout_change(surface)
                .map_err(|e| Error::layout(pane.name(), e))?;
        }
        Ok(())
    }

    fn layout_mode(&self, available: u16) -> LayoutMode {
        LayoutMode::for_available(available, CONSTRAIN_WIDTH)
    }

    fn apply_layout_mode(&mut self, mode: LayoutMode) {
        let constrained = mode == LayoutMode::Constrained;
        if constrained != self.constrained {
            debug!(parent: &self.span, ?mode, "layout mode changed");
        }
        self.constrained = constrained;
        if let Some(primary) = self.panes.first_mut() {
            primary.apply_layout_mode(mode);
        }
    }

    fn requested_size(&self, mode: LayoutMode) -> Option<u16> {
        match mode {
            LayoutMode::Constrained => Some(CONSTRAINED_SIZE),
            LayoutMode::Expanded => None,
        }
    }

    fn layout(&mut self, surface: &mut dyn Surface, area: Rect) -> Result<bool> {
        trace!(parent: &self.span, ?area, "layout");
        let count = u16::try_from(self.panes.len()).unwrap_or(u16::MAX);
        let bands = area.split_rows(count);
        let mut fits = bands.len() == self.panes.len();

        if fits {
            for (pane, band) in self.panes.iter_mut().zip(bands) {
                let name = pane.name();
                fits &= place(surface, pane, band, HEADER_ROWS)
                    .map_err(|e| Error::layout(name, e))?;
            }
        }
        // the column is shown whole or not at all
        if !fits {
            debug!(parent: &self.span, ?area, "column too short for its panes");
            self.hide(surface);
            return Ok(false);
        }

        if surface.current_focus().is_none() {
            if let Some(primary) = self.panes.first() {
                if surface.region(primary.name()).is_some() {
                    surface.set_focus(primary.name())?;
                    primary.render(surface)?;
                }
            }
        }
        Ok(true)
    }

    fn hide(&mut self, surface: &mut dyn Surface) {
        for pane in &mut self.panes {
            hide(surface, pane);
        }
    }
}
