//! Pure paging arithmetic for the list and reader views.
//!
//! Nothing here knows about terminals or documents: every function maps
//! counts and offsets to ranges, so the UI can be tested without a frame.

use std::ops::Range;

/// Rows taken by chrome around the document list (header, category bar,
/// spacing, footer and borders).
const LIST_CHROME: u16 = 8;
const LIST_MIN: usize = 5;

/// Rows taken by chrome around the reader body.
const READER_CHROME: u16 = 6;
const READER_MIN: usize = 10;

/// Number of document rows shown for a terminal `height`.
pub fn list_capacity(height: u16) -> usize {
    usize::from(height.saturating_sub(LIST_CHROME)).max(LIST_MIN)
}

/// Number of content lines shown for a terminal `height`.
pub fn reader_capacity(height: u16) -> usize {
    usize::from(height.saturating_sub(READER_CHROME)).max(READER_MIN)
}

/// Visible slice of a list of `total` rows that keeps `index` on screen,
/// centered when there is room on both sides.
///
/// ```
/// use reader_tui::util::viewport::window;
///
/// assert_eq!(window(100, 50, 10), 45..55);
/// assert_eq!(window(100, 2, 10), 0..10);
/// assert_eq!(window(100, 99, 10), 90..100);
/// assert_eq!(window(3, 1, 10), 0..3);
/// ```
pub fn window(total: usize, index: usize, capacity: usize) -> Range<usize> {
    if capacity == 0 {
        return 0..0;
    }
    if total <= capacity {
        return 0..total;
    }
    let start = index.saturating_sub(capacity / 2).min(total - capacity);
    start..start + capacity
}

/// Largest valid scroll offset for `total_lines` of content.
pub fn max_scroll(total_lines: usize, capacity: usize) -> usize {
    total_lines.saturating_sub(capacity)
}

/// Visible slice of scrolled content. `offset` is clamped first.
pub fn scroll_window(total_lines: usize, offset: usize, capacity: usize) -> Range<usize> {
    let start = offset.min(max_scroll(total_lines, capacity));
    start..(start + capacity).min(total_lines)
}

/// Distance moved by page-up and page-down.
pub fn half_page(capacity: usize) -> usize {
    (capacity / 2).max(1)
}

/// How far through the content the reader is, 0 to 100.
pub fn scroll_percent(offset: usize, total_lines: usize, capacity: usize) -> u16 {
    let scrollable = max_scroll(total_lines, capacity);
    if scrollable == 0 {
        return 0;
    }
    let pct = offset.min(scrollable) * 100 / scrollable;
    // bounded by 100 above
    pct as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_capacity_floors() {
        assert_eq!(list_capacity(40), 32);
        assert_eq!(list_capacity(10), 5);
        assert_eq!(list_capacity(0), 5);
        assert_eq!(reader_capacity(40), 34);
        assert_eq!(reader_capacity(12), 10);
        assert_eq!(reader_capacity(3), 10);
    }

    #[test]
    fn test_window_zero_capacity_is_empty() {
        assert_eq!(window(10, 3, 0), 0..0);
    }

    #[test]
    fn test_window_empty_list() {
        assert_eq!(window(0, 0, 5), 0..0);
    }

    #[test]
    fn test_scroll_window_clamps_offset() {
        assert_eq!(scroll_window(30, 0, 10), 0..10);
        assert_eq!(scroll_window(30, 25, 10), 20..30);
        assert_eq!(scroll_window(4, 3, 10), 0..4);
    }

    #[test]
    fn test_half_page_minimum() {
        assert_eq!(half_page(0), 1);
        assert_eq!(half_page(1), 1);
        assert_eq!(half_page(24), 12);
    }

    #[test]
    fn test_scroll_percent() {
        assert_eq!(scroll_percent(0, 5, 10), 0);
        assert_eq!(scroll_percent(0, 30, 10), 0);
        assert_eq!(scroll_percent(10, 30, 10), 50);
        assert_eq!(scroll_percent(20, 30, 10), 100);
        assert_eq!(scroll_percent(99, 30, 10), 100);
    }

    proptest! {
        #[test]
        fn prop_window_contains_index(
            total in 1usize..500,
            capacity in 1usize..80,
            seed in 0usize..500,
        ) {
            let index = seed % total;
            let range = window(total, index, capacity);
            prop_assert!(range.contains(&index));
            prop_assert_eq!(range.len(), total.min(capacity));
            prop_assert!(range.start <= range.end);
            prop_assert!(range.end <= total);
        }

        #[test]
        fn prop_scroll_window_in_bounds(
            total in 0usize..500,
            offset in 0usize..1000,
            capacity in 1usize..80,
        ) {
            let range = scroll_window(total, offset, capacity);
            prop_assert!(range.start <= range.end);
            prop_assert!(range.end <= total);
            prop_assert!(range.start <= max_scroll(total, capacity));
            prop_assert!(scroll_percent(offset, total, capacity) <= 100);
        }
    }
}
