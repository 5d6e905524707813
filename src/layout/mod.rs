//! Screen partitioning.
//!
//! The [`LayoutEngine`] owns no panes. Each pass it reads the surface size,
//! lets every element pick a [`LayoutMode`] for the width it is offered,
//! collects the sizes they request and hands each one its rectangle.

pub mod compound;

use tracing::{debug, trace, warn, Span};

use crate::config::ResolvedConfig;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::surface::Surface;

pub use compound::CompoundLayout;

/// Presentation mode an element picks for the space it is offered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayoutMode {
    #[default]
    Expanded,
    Constrained,
}

impl LayoutMode {
    /// `Constrained` when `available` falls below `threshold`.
    pub fn for_available(available: u16, threshold: u16) -> Self {
        if available < threshold {
            LayoutMode::Constrained
        } else {
            LayoutMode::Expanded
        }
    }
}

/// A top-level element placed by the [`LayoutEngine`].
pub trait Layout {
    fn name(&self) -> &'static str;

    /// Called before a pass whose screen size differs from the previous one.
    fn on_layout_change(&mut self, surface: &mut dyn Surface) -> Result<()>;

    /// Pure: the mode this element would use with `available` cells.
    fn layout_mode(&self, _available: u16) -> LayoutMode {
        LayoutMode::Expanded
    }

    fn apply_layout_mode(&mut self, _mode: LayoutMode) {}

    /// Cells requested along the engine's split axis; `None` takes a
    /// proportional share.
    fn requested_size(&self, _mode: LayoutMode) -> Option<u16> {
        None
    }

    /// Place the element in `area`. Returns `false` when it did not fit; its
    /// regions are gone in that case.
    fn layout(&mut self, surface: &mut dyn Surface, area: Rect) -> Result<bool>;

    /// Drop every region the element owns.
    fn hide(&mut self, surface: &mut dyn Surface);

    fn is_visible(&self) -> bool {
        true
    }
}

/// Negotiate a mode for `available` cells, commit it and return the request.
pub fn negotiate(element: &mut dyn Layout, available: u16) -> Option<u16> {
    let mode = element.layout_mode(available);
    element.apply_layout_mode(mode);
    element.requested_size(mode)
}

pub struct LayoutEngine {
    pane_width: f64,
    last_size: Option<(u16, u16)>,
    span: Span,
}

impl LayoutEngine {
    pub fn new(config: &ResolvedConfig, span: Span) -> Self {
        Self {
            pane_width: config.pane_width,
            last_size: None,
            span,
        }
    }

    /// Run one layout pass.
    ///
    /// Footers stack up from the bottom edge, one row each unless they ask for
    /// more. Columns share the rest left to right. Elements that are hidden or
    /// get no room lose their regions. Returns every placed element with its
    /// rectangle, in placement order.
    pub fn layout<'a>(
        &mut self,
        surface: &mut dyn Surface,
        columns: &mut [&'a mut dyn Layout],
        footers: &mut [&'a mut dyn Layout],
    ) -> Result<Vec<(&'static str, Rect)>> {
        let _enter = self.span.enter();
        let (width, height) = surface.size();

        if self.last_size != Some((width, height)) {
            debug!(width, height, "screen size changed");
            for element in columns.iter_mut().chain(footers.iter_mut()) {
                element
                    .on_layout_change(surface)
                    .map_err(|e| Error::layout(element.name(), e))?;
            }
            self.last_size = Some((width, height));
        }

        let mut placed = Vec::new();
        let Some(mut remaining) = Rect::from_size(width, height) else {
            warn!(width, height, "screen too small to lay out");
            for element in columns.iter_mut().chain(footers.iter_mut()) {
                element.hide(surface);
            }
            return Ok(placed);
        };

        for footer in footers.iter_mut() {
            if !footer.is_visible() {
                footer.hide(surface);
                continue;
            }
            let rows = negotiate(&mut **footer, width).unwrap_or(1);
            match remaining.split_bottom(rows) {
                (Some(rest), Some(area)) => {
                    let fits = footer
                        .layout(surface, area)
                        .map_err(|e| Error::layout(footer.name(), e))?;
                    if fits {
                        placed.push((footer.name(), area));
                        remaining = rest;
                    }
                }
                _ => {
                    warn!(element = footer.name(), rows, "no room for footer");
                    footer.hide(surface);
                }
            }
        }

        let mut visible = Vec::new();
        for (i, column) in columns.iter_mut().enumerate() {
            if column.is_visible() {
                visible.push(i);
            } else {
                column.hide(surface);
            }
        }
        let widths = self.column_widths(columns, &visible, remaining.width());

        let mut x = remaining.min_x;
        for (&index, width) in visible.iter().zip(widths) {
            let element = &mut columns[index];
            let Some(area) = Rect::new(x, remaining.min_y, x + width, remaining.max_y) else {
                warn!(element = element.name(), width, "skipping degenerate column");
                element.hide(surface);
                continue;
            };
            trace!(element = element.name(), ?area, "placing column");
            let fits = element
                .layout(surface, area)
                .map_err(|e| Error::layout(element.name(), e))?;
            if fits {
                placed.push((element.name(), area));
            } else {
                debug!(element = element.name(), ?area, "column did not fit");
            }
            x += width;
        }

        Ok(placed)
    }

    fn column_widths(
        &self,
        columns: &mut [&mut dyn Layout],
        visible: &[usize],
        available: u16,
    ) -> Vec<u16> {
        let mut left = available;
        let requests: Vec<Option<u16>> = visible
            .iter()
            .map(|&i| {
                // every column is offered the whole width
                let request = negotiate(&mut *columns[i], available).map(|r| r.min(left));
                if let Some(r) = request {
                    left -= r;
                }
                request
            })
            .collect();

        let flexible = requests.iter().filter(|r| r.is_none()).count() as u16;
        let mut shares = Vec::new();
        if flexible == 1 {
            shares.push(left);
        } else if flexible > 1 {
            let last = (f64::from(left) * self.pane_width).round() as u16;
            let each = (left - last.min(left)) / (flexible - 1);
            shares.extend(std::iter::repeat(each).take(usize::from(flexible - 1)));
            shares.push(left - each * (flexible - 1));
        }

        let mut shares = shares.into_iter();
        requests
            .into_iter()
            .map(|request| request.unwrap_or_else(|| shares.next().unwrap_or(0)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pane::{FileTreePane, InfoPane, StatusPane};
    use crate::surface::{RegionStatus, Screen};
    use crate::viewmodel::tests::sample_tree;

    /// Requests a fixed width below its threshold.
    struct Threshold {
        name: &'static str,
        threshold: u16,
        mode: LayoutMode,
        changes: usize,
        area: Option<Rect>,
    }

    impl Threshold {
        fn new(name: &'static str, threshold: u16) -> Self {
            Self {
                name,
                threshold,
                mode: LayoutMode::Expanded,
                changes: 0,
                area: None,
            }
        }
    }

    impl Layout for Threshold {
        fn name(&self) -> &'static str {
            self.name
        }

        fn on_layout_change(&mut self, _surface: &mut dyn Surface) -> Result<()> {
            self.changes += 1;
            Ok(())
        }

        fn layout_mode(&self, available: u16) -> LayoutMode {
            LayoutMode::for_available(available, self.threshold)
        }

        fn apply_layout_mode(&mut self, mode: LayoutMode) {
            self.mode = mode;
        }

        fn requested_size(&self, mode: LayoutMode) -> Option<u16> {
            match mode {
                LayoutMode::Constrained => Some(8),
                LayoutMode::Expanded => None,
            }
        }

        fn layout(&mut self, surface: &mut dyn Surface, area: Rect) -> Result<bool> {
            if surface.set_region(self.name, area) == RegionStatus::Created {
                surface.set_focus(self.name)?;
            }
            self.area = Some(area);
            Ok(true)
        }

        fn hide(&mut self, surface: &mut dyn Surface) {
            surface.remove_region(self.name);
            self.area = None;
        }
    }

    fn overlaps(a: Rect, b: Rect) -> bool {
        a.min_x < b.max_x && b.min_x < a.max_x && a.min_y < b.max_y && b.min_y < a.max_y
    }

    /// Regions stay inside the surface and only a pane's own header and body
    /// share a row.
    fn assert_consistent(screen: &Screen) {
        let (width, height) = screen.size();
        let owner = |name: &str| name.strip_suffix("Header").unwrap_or(name).to_string();
        let regions = screen.regions();
        for (i, a) in regions.iter().enumerate() {
            assert!(
                a.area().max_x <= width && a.area().max_y <= height,
                "{} at {:?} is outside {width}x{height}",
                a.name(),
                a.area()
            );
            for b in &regions[i + 1..] {
                if owner(a.name()) == owner(b.name()) {
                    continue;
                }
                assert!(
                    !overlaps(a.area(), b.area()),
                    "{} {:?} overlaps {} {:?}",
                    a.name(),
                    a.area(),
                    b.name(),
                    b.area()
                );
            }
        }
    }

    fn engine(pane_width: f64) -> LayoutEngine {
        let config = ResolvedConfig {
            pane_width,
            ..ResolvedConfig::default()
        };
        LayoutEngine::new(&config, Span::none())
    }

    #[test]
    fn test_mode_is_pure_function_of_latest_width() {
        let mut element = Threshold::new("layers", 90);
        let modes: Vec<LayoutMode> = [50, 200, 50]
            .into_iter()
            .map(|available| {
                negotiate(&mut element, available);
                element.mode
            })
            .collect();
        assert_eq!(
            modes,
            vec![
                LayoutMode::Constrained,
                LayoutMode::Expanded,
                LayoutMode::Constrained
            ]
        );
    }

    #[test]
    fn test_requested_size_at_threshold_60() {
        let mut element = Threshold::new("tree", 60);
        assert_eq!(negotiate(&mut element, 80), None);
        assert_eq!(element.mode, LayoutMode::Expanded);
        assert_eq!(negotiate(&mut element, 40), Some(8));
        assert_eq!(element.mode, LayoutMode::Constrained);
        // asking twice with the same width changes nothing
        assert_eq!(negotiate(&mut element, 40), Some(8));
        assert_eq!(element.mode, LayoutMode::Constrained);
    }

    #[test]
    fn test_columns_split_by_pane_width() {
        let mut screen = Screen::new(100, 30);
        let mut left = Threshold::new("left", 0);
        let mut right = Threshold::new("right", 0);
        let mut status = Threshold::new("status", 0);

        let placed = engine(0.7)
            .layout(&mut screen, &mut [&mut left, &mut right], &mut [&mut status])
            .unwrap();

        assert_eq!(placed.len(), 3);
        assert_eq!(status.area, Rect::new(0, 29, 100, 30));
        assert_eq!(left.area, Rect::new(0, 0, 30, 29));
        assert_eq!(right.area, Rect::new(30, 0, 100, 29));
    }

    #[test]
    fn test_requested_width_is_honoured() {
        let mut screen = Screen::new(80, 24);
        let mut layers = Threshold::new("layers", 90);
        let mut tree = Threshold::new("tree", 0);

        engine(0.5)
            .layout(&mut screen, &mut [&mut layers, &mut tree], &mut [])
            .unwrap();

        assert_eq!(layers.area, Rect::new(0, 0, 8, 24));
        assert_eq!(tree.area, Rect::new(8, 0, 80, 24));
    }

    #[test]
    fn test_layout_change_only_on_resize() {
        let mut screen = Screen::new(120, 40);
        let mut tree = Threshold::new("tree", 0);
        let mut engine = engine(0.5);

        engine.layout(&mut screen, &mut [&mut tree], &mut []).unwrap();
        engine.layout(&mut screen, &mut [&mut tree], &mut []).unwrap();
        assert_eq!(tree.changes, 1);

        screen.resize(100, 40);
        engine.layout(&mut screen, &mut [&mut tree], &mut []).unwrap();
        assert_eq!(tree.changes, 2);
        assert_eq!(tree.area, Rect::new(0, 0, 100, 40));
    }

    #[test]
    fn test_degenerate_column_is_skipped() {
        let mut screen = Screen::new(8, 10);
        let mut layers = Threshold::new("layers", 90);
        let mut tree = Threshold::new("tree", 0);

        let placed = engine(0.5)
            .layout(&mut screen, &mut [&mut layers, &mut tree], &mut [])
            .unwrap();

        assert_eq!(placed, vec![("layers", Rect::new(0, 0, 8, 10).unwrap())]);
        assert!(tree.area.is_none());
        assert!(screen.region("tree").is_none());
    }

    #[test]
    fn test_shrinking_removes_panes_without_room() {
        let config = ResolvedConfig::default();
        let mut screen = Screen::new(120, 30);
        let mut engine = LayoutEngine::new(&config, Span::none());
        let panes = vec![
            InfoPane::new("layers", "Layers", &config, Span::none()).selectable(),
            InfoPane::new("details", "Layer Details", &config, Span::none()),
            InfoPane::new("image", "Image Details", &config, Span::none()),
        ];
        let mut column = CompoundLayout::new("column", panes, Span::none());
        let mut tree = FileTreePane::new(sample_tree(), &config, Span::none()).unwrap();
        let mut status = StatusPane::new(Span::none());

        engine
            .layout(&mut screen, &mut [&mut column, &mut tree], &mut [&mut status])
            .unwrap();
        screen.flush().unwrap();
        assert!(screen.region("image").is_some());
        assert_consistent(&screen);

        screen.resize(120, 4);
        let placed = engine
            .layout(&mut screen, &mut [&mut column, &mut tree], &mut [&mut status])
            .unwrap();
        screen.flush().unwrap();
        let names: Vec<&str> = placed.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["status", "filetree"]);
        for region in ["layers", "layersHeader", "details", "image", "imageHeader"] {
            assert!(screen.region(region).is_none(), "{region} left behind");
        }
        assert_eq!(screen.current_focus(), None);
        assert_consistent(&screen);

        // growing back recreates the column and focuses its primary pane
        screen.resize(120, 30);
        engine
            .layout(&mut screen, &mut [&mut column, &mut tree], &mut [&mut status])
            .unwrap();
        screen.flush().unwrap();
        assert!(screen.region("image").is_some());
        assert_eq!(screen.current_focus(), Some("layers"));
        assert!(!screen.region("layersHeader").unwrap().text().lines.is_empty());
        assert_consistent(&screen);
    }
}
