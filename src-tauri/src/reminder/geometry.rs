//! Placement arithmetic for the floating reminder window.
//!
//! Coordinates are logical pixels with the origin at the top-left of the
//! desktop and y growing downwards, which is what Tauri reports.
//!
//! The reminder window is larger than what the user sees: the visible toast
//! is inset by `ring_padding` on every side so the pulse rings have room to
//! expand. All screen-edge rules apply to the visible toast, not the window.

use serde::{Deserialize, Serialize};

/// Room around the visible toast for the ring animation
pub const RING_PADDING: f64 = 120.0;
/// Minimum distance between the visible toast and any screen edge
pub const EDGE_MARGIN: f64 = 20.0;
/// Origin used when no display information is available
pub const FALLBACK_ORIGIN: Point = Point { x: 100.0, y: 100.0 };

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReminderLayout {
    pub ring_padding: f64,
    pub edge_margin: f64,
}

impl Default for ReminderLayout {
    fn default() -> Self {
        Self {
            ring_padding: RING_PADDING,
            edge_margin: EDGE_MARGIN,
        }
    }
}

impl ReminderLayout {
    /// Window size needed to show `content` with ring room on every side
    pub fn window_size(&self, content: Size) -> Size {
        Size::new(
            content.width + 2.0 * self.ring_padding,
            content.height + 2.0 * self.ring_padding,
        )
    }

    /// Top-right corner of the work area, toast inset by the edge margin
    pub fn initial_origin(&self, window: Size, work_area: Option<Rect>) -> Point {
        match work_area {
            Some(area) => Point::new(
                area.max_x() - window.width + self.ring_padding - self.edge_margin,
                area.min_y() - self.ring_padding + self.edge_margin,
            ),
            None => FALLBACK_ORIGIN,
        }
    }

    /// Where to put a freshly created window: the saved origin if there is
    /// one (re-clamped to the current screen), else the initial corner.
    pub fn placement(&self, saved: Option<Point>, window: Size, work_area: Option<Rect>) -> Point {
        match (saved, work_area) {
            (Some(origin), Some(area)) => {
                let frame = Rect {
                    origin,
                    size: window,
                };
                self.constrain(frame, area).unwrap_or(origin)
            }
            (Some(origin), None) => origin,
            (None, area) => self.initial_origin(window, area),
        }
    }

    /// Corrected origin if the visible toast crosses the margin on any edge,
    /// `None` if the frame is already acceptable.
    pub fn constrain(&self, frame: Rect, area: Rect) -> Option<Point> {
        let pad = self.ring_padding;
        let margin = self.edge_margin;
        let mut origin = frame.origin;
        let mut adjusted = false;

        if frame.min_x() + pad < area.min_x() + margin {
            origin.x = area.min_x() + margin - pad;
            adjusted = true;
        }
        if frame.max_x() - pad > area.max_x() - margin {
            origin.x = area.max_x() - margin - (frame.size.width - pad);
            adjusted = true;
        }
        if frame.min_y() + pad < area.min_y() + margin {
            origin.y = area.min_y() + margin - pad;
            adjusted = true;
        }
        if frame.max_y() - pad > area.max_y() - margin {
            origin.y = area.max_y() - margin - (frame.size.height - pad);
            adjusted = true;
        }

        adjusted.then_some(origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Rect = Rect::new(0.0, 25.0, 1440.0, 875.0);
    const WINDOW: Size = Size::new(700.0, 340.0);

    fn layout() -> ReminderLayout {
        ReminderLayout::default()
    }

    fn visible(origin: Point) -> Rect {
        Rect::new(
            origin.x + RING_PADDING,
            origin.y + RING_PADDING,
            WINDOW.width - 2.0 * RING_PADDING,
            WINDOW.height - 2.0 * RING_PADDING,
        )
    }

    #[test]
    fn window_size_adds_ring_room() {
        let size = layout().window_size(Size::new(460.0, 100.0));
        assert_eq!(size, WINDOW);
    }

    #[test]
    fn frame_inside_screen_is_left_alone() {
        let frame = Rect {
            origin: Point::new(300.0, 200.0),
            size: WINDOW,
        };
        assert_eq!(layout().constrain(frame, SCREEN), None);
    }

    #[test]
    fn ring_padding_may_hang_off_screen() {
        // Toast is exactly at the margin while the transparent ring area is off screen
        let frame = Rect {
            origin: Point::new(EDGE_MARGIN - RING_PADDING, 200.0),
            size: WINDOW,
        };
        assert_eq!(layout().constrain(frame, SCREEN), None);
    }

    #[test]
    fn dragging_past_left_edge_snaps_toast_to_margin() {
        let frame = Rect {
            origin: Point::new(-400.0, 200.0),
            size: WINDOW,
        };
        let fixed = layout().constrain(frame, SCREEN).unwrap();
        assert_eq!(visible(fixed).min_x(), SCREEN.min_x() + EDGE_MARGIN);
        assert_eq!(fixed.y, 200.0);
    }

    #[test]
    fn dragging_past_right_edge_snaps_toast_to_margin() {
        let frame = Rect {
            origin: Point::new(1300.0, 200.0),
            size: WINDOW,
        };
        let fixed = layout().constrain(frame, SCREEN).unwrap();
        assert_eq!(visible(fixed).max_x(), SCREEN.max_x() - EDGE_MARGIN);
    }

    #[test]
    fn dragging_past_top_and_bottom_snaps_toast_to_margin() {
        let up = Rect {
            origin: Point::new(300.0, -500.0),
            size: WINDOW,
        };
        let fixed = layout().constrain(up, SCREEN).unwrap();
        assert_eq!(visible(fixed).min_y(), SCREEN.min_y() + EDGE_MARGIN);

        let down = Rect {
            origin: Point::new(300.0, 2000.0),
            size: WINDOW,
        };
        let fixed = layout().constrain(down, SCREEN).unwrap();
        assert_eq!(visible(fixed).max_y(), SCREEN.max_y() - EDGE_MARGIN);
    }

    #[test]
    fn corner_drag_fixes_both_axes() {
        let frame = Rect {
            origin: Point::new(5000.0, -5000.0),
            size: WINDOW,
        };
        let fixed = layout().constrain(frame, SCREEN).unwrap();
        assert_eq!(visible(fixed).max_x(), SCREEN.max_x() - EDGE_MARGIN);
        assert_eq!(visible(fixed).min_y(), SCREEN.min_y() + EDGE_MARGIN);
    }

    #[test]
    fn constrained_origin_is_stable() {
        let frame = Rect {
            origin: Point::new(-400.0, 2000.0),
            size: WINDOW,
        };
        let fixed = layout().constrain(frame, SCREEN).unwrap();
        let again = Rect {
            origin: fixed,
            size: WINDOW,
        };
        assert_eq!(layout().constrain(again, SCREEN), None);
    }

    #[test]
    fn initial_origin_is_top_right() {
        let origin = layout().initial_origin(WINDOW, Some(SCREEN));
        assert_eq!(visible(origin).max_x(), SCREEN.max_x() - EDGE_MARGIN);
        assert_eq!(visible(origin).min_y(), SCREEN.min_y() + EDGE_MARGIN);
    }

    #[test]
    fn initial_origin_without_display_uses_fallback() {
        assert_eq!(layout().initial_origin(WINDOW, None), FALLBACK_ORIGIN);
    }

    #[test]
    fn placement_prefers_saved_origin() {
        let saved = Point::new(400.0, 300.0);
        assert_eq!(layout().placement(Some(saved), WINDOW, Some(SCREEN)), saved);
    }

    #[test]
    fn placement_reclamps_origin_from_detached_display() {
        let saved = Point::new(3000.0, 300.0);
        let origin = layout().placement(Some(saved), WINDOW, Some(SCREEN));
        assert_eq!(visible(origin).max_x(), SCREEN.max_x() - EDGE_MARGIN);
        assert_eq!(origin.y, 300.0);
    }

    #[test]
    fn placement_without_saved_origin_uses_corner() {
        assert_eq!(
            layout().placement(None, WINDOW, Some(SCREEN)),
            layout().initial_origin(WINDOW, Some(SCREEN))
        );
    }
}
