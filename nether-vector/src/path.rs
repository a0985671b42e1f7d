//! Segment planning
//!
//! Turns an unordered bag of line segments into a vertex list the renderer
//! can trace in one pass.

use hashbrown::HashSet;

use crate::vertex::{BRIGHT_ON, Point, Vertex};

/// A straight line between two beam positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

impl Segment {
    pub const fn new(from: Point, to: Point) -> Self {
        Self { from, to }
    }

    /// Build from signed coordinates, clamping both ends into the display
    pub fn clamped(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            from: Point::clamped(x0, y0),
            to: Point::clamped(x1, y1),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.from == self.to
    }

    /// Same segment regardless of direction
    fn key(&self) -> (Point, Point) {
        if (self.from.x, self.from.y) <= (self.to.x, self.to.y) {
            (self.from, self.to)
        } else {
            (self.to, self.from)
        }
    }
}

/// How [`plan_segments`] treats its input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanOptions {
    /// Keep segments that repeat an earlier one (in either direction)
    pub allow_duplicates: bool,
    /// Brightness of the draw vertices
    pub bright: u8,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            allow_duplicates: false,
            bright: BRIGHT_ON,
        }
    }
}

/// Convert segments into moves and draws
///
/// Zero-length segments are skipped. A blanked move is inserted whenever a
/// segment does not start where the previous one ended, including before the
/// first segment.
pub fn plan_segments(segments: &[Segment], options: &PlanOptions) -> Vec<Vertex> {
    let bright = options.bright.max(1);
    let mut seen = HashSet::with_capacity(segments.len());
    let mut vertices = Vec::with_capacity(segments.len() * 2);
    let mut beam: Option<Point> = None;

    for segment in segments {
        if segment.is_degenerate() {
            continue;
        }
        if !options.allow_duplicates && !seen.insert(segment.key()) {
            continue;
        }

        if beam != Some(segment.from) {
            vertices.push(Vertex::move_to(segment.from.x, segment.from.y));
        }
        vertices.push(Vertex::new(segment.to.x, segment.to.y, bright));
        beam = Some(segment.to);
    }

    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(x0: u16, y0: u16, x1: u16, y1: u16) -> Segment {
        Segment::new(Point::new(x0, y0), Point::new(x1, y1))
    }

    #[test]
    fn test_connected_path_has_single_move() {
        let plan = plan_segments(
            &[seg(0, 0, 10, 0), seg(10, 0, 10, 10), seg(10, 10, 0, 0)],
            &PlanOptions::default(),
        );
        assert_eq!(
            plan,
            vec![
                Vertex::move_to(0, 0),
                Vertex::line_to(10, 0),
                Vertex::line_to(10, 10),
                Vertex::line_to(0, 0),
            ]
        );
    }

    #[test]
    fn test_disjoint_segments_get_transit_moves() {
        let plan = plan_segments(&[seg(0, 0, 5, 0), seg(7, 7, 9, 9)], &PlanOptions::default());
        assert_eq!(
            plan,
            vec![
                Vertex::move_to(0, 0),
                Vertex::line_to(5, 0),
                Vertex::move_to(7, 7),
                Vertex::line_to(9, 9),
            ]
        );
    }

    #[test]
    fn test_zero_length_segments_skipped() {
        let plan = plan_segments(&[seg(3, 3, 3, 3)], &PlanOptions::default());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_duplicates_removed_in_either_direction() {
        let segments = [seg(0, 0, 5, 5), seg(5, 5, 0, 0), seg(0, 0, 5, 5)];
        let plan = plan_segments(&segments, &PlanOptions::default());
        assert_eq!(plan, vec![Vertex::move_to(0, 0), Vertex::line_to(5, 5)]);

        let options = PlanOptions {
            allow_duplicates: true,
            ..Default::default()
        };
        assert_eq!(plan_segments(&segments, &options).len(), 4);
    }

    #[test]
    fn test_bright_option_never_produces_moves() {
        let options = PlanOptions {
            bright: 0,
            ..Default::default()
        };
        let plan = plan_segments(&[seg(0, 0, 1, 1)], &options);
        assert!(plan[1].is_draw());
    }

    #[test]
    fn test_clamped_segment() {
        let segment = Segment::clamped(-20, 100, 5000, 4095);
        assert_eq!(segment.from, Point::new(0, 100));
        assert_eq!(segment.to, Point::new(4095, 4095));
    }
}
