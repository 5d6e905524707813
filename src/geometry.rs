/// Rectangle in terminal cell coordinates, half-open on the max edges.
///
/// A `Rect` is never degenerate: `min_x < max_x` and `min_y < max_y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub min_x: u16,
    pub min_y: u16,
    pub max_x: u16,
    pub max_y: u16,
}

impl Rect {
    pub fn new(min_x: u16, min_y: u16, max_x: u16, max_y: u16) -> Option<Self> {
        if min_x < max_x && min_y < max_y {
            Some(Self {
                min_x,
                min_y,
                max_x,
                max_y,
            })
        } else {
            None
        }
    }

    /// Rectangle anchored at the origin.
    pub fn from_size(width: u16, height: u16) -> Option<Self> {
        Self::new(0, 0, width, height)
    }

    pub fn width(&self) -> u16 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> u16 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }

    /// Split into `count` stacked bands of `height / count` rows each.
    ///
    /// The last band absorbs the integer-division remainder. Returns an empty
    /// list when the rectangle is too short to give every band one row.
    pub fn split_rows(&self, count: u16) -> Vec<Rect> {
        if count == 0 {
            return Vec::new();
        }
        let band = self.height() / count;
        if band == 0 {
            return Vec::new();
        }

        (0..count)
            .filter_map(|i| {
                let min_y = self.min_y + i * band;
                let max_y = if i + 1 == count {
                    self.max_y
                } else {
                    min_y + band
                };
                Rect::new(self.min_x, min_y, self.max_x, max_y)
            })
            .collect()
    }

    /// Carve a header band of `header_rows` text rows and a body below it.
    ///
    /// The header also spans its (invisible) bottom border row; the body
    /// starts on that same row so the border is shared, not duplicated.
    /// Returns `None` when the body would have no rows.
    pub fn split_header(&self, header_rows: u16) -> Option<(Rect, Rect)> {
        let border = self.min_y.checked_add(header_rows)?;
        let header = Rect::new(self.min_x, self.min_y, self.max_x, border.checked_add(1)?)?;
        if header.max_y > self.max_y {
            return None;
        }
        let body = Rect::new(self.min_x, border, self.max_x, self.max_y)?;
        Some((header, body))
    }

    /// Remove `rows` from the bottom, returning `(rest, bottom)`.
    pub fn split_bottom(&self, rows: u16) -> (Option<Rect>, Option<Rect>) {
        let rows = rows.min(self.height());
        let edge = self.max_y - rows;
        (
            Rect::new(self.min_x, self.min_y, self.max_x, edge),
            Rect::new(self.min_x, edge, self.max_x, self.max_y),
        )
    }

    pub fn to_ui(self) -> ratatui::layout::Rect {
        ratatui::layout::Rect::new(self.min_x, self.min_y, self.width(), self.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_rect_is_refused() {
        assert!(Rect::new(0, 0, 0, 10).is_none());
        assert!(Rect::new(5, 3, 6, 3).is_none());
        assert!(Rect::from_size(1, 1).is_some());
    }

    #[test]
    fn test_split_rows_even() {
        let rect = Rect::from_size(40, 90).unwrap();
        let bands = rect.split_rows(3);
        let heights: Vec<u16> = bands.iter().map(Rect::height).collect();
        assert_eq!(heights, vec![30, 30, 30]);
    }

    #[test]
    fn test_split_rows_last_band_absorbs_remainder() {
        let rect = Rect::from_size(40, 91).unwrap();
        let bands = rect.split_rows(3);
        let heights: Vec<u16> = bands.iter().map(Rect::height).collect();
        assert_eq!(heights, vec![30, 30, 31]);

        for pair in bands.windows(2) {
            assert_eq!(pair[0].max_y, pair[1].min_y, "bands must be contiguous");
        }
        assert_eq!(bands[0].min_y, 0);
        assert_eq!(bands[2].max_y, 91);
    }

    #[test]
    fn test_split_rows_boundary_totals() {
        for total in 3..=40u16 {
            let rect = Rect::new(2, 5, 30, 5 + total).unwrap();
            let bands = rect.split_rows(3);
            assert_eq!(bands.len(), 3, "total {total}");
            assert!(bands.iter().all(|b| b.height() > 0));
            let sum: u16 = bands.iter().map(Rect::height).sum();
            assert_eq!(sum, total);
            assert_eq!(bands[2].height(), total / 3 + total % 3);
        }
    }

    #[test]
    fn test_split_rows_too_short() {
        let rect = Rect::from_size(10, 2).unwrap();
        assert!(rect.split_rows(3).is_empty());
    }

    #[test]
    fn test_split_header_shares_one_border_row() {
        for header_rows in 1..=3u16 {
            for height in (header_rows + 1)..30 {
                let rect = Rect::new(0, 4, 20, 4 + height).unwrap();
                let (header, body) = rect.split_header(header_rows).unwrap();

                assert_eq!(header.min_y, rect.min_y);
                assert_eq!(body.max_y, rect.max_y);
                assert_eq!(header.width(), rect.width());
                assert_eq!(body.width(), rect.width());
                // exactly one shared row
                assert_eq!(header.max_y - body.min_y, 1);
                assert_eq!(body.min_y, rect.min_y + header_rows);
            }
        }
    }

    #[test]
    fn test_split_header_needs_a_body_row() {
        let rect = Rect::from_size(20, 2).unwrap();
        assert!(rect.split_header(2).is_none());
        assert!(rect.split_header(1).is_some());
    }

    #[test]
    fn test_split_bottom() {
        let rect = Rect::from_size(20, 10).unwrap();
        let (rest, bottom) = rect.split_bottom(2);
        assert_eq!(rest.unwrap().height(), 8);
        assert_eq!(bottom.unwrap().min_y, 8);

        let (rest, bottom) = rect.split_bottom(12);
        assert!(rest.is_none());
        assert_eq!(bottom.unwrap(), rect);
    }
}
