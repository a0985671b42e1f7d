//! Bresenham line rasterizer
//!
//! Turns a pair of endpoints into the sequence of beam positions the DAC
//! must visit. Pure integer arithmetic, so long segments never drift.

use std::iter::FusedIterator;

use crate::vertex::Point;

/// Rasterize a segment from `from` to `to`
///
/// With `draw == false` the beam jumps: the iterator yields only `to`.
/// With `draw == true` it yields `from`, every intermediate step, and
/// finally `to`. The beam dwells on the start point for one sample, which
/// keeps corners sharp on a real tube.
pub fn rasterize(from: Point, to: Point, draw: bool) -> LineIter {
    let start = if draw { from } else { to };
    LineIter::new(start, to)
}

/// Iterator over the positions of one rasterized segment
///
/// Both error terms are tested every step, so a single step may move
/// diagonally. Every step moves at most one unit on each axis.
#[derive(Debug, Clone)]
pub struct LineIter {
    x: i32,
    y: i32,
    x1: i32,
    y1: i32,
    dx: i32,
    dy: i32,
    sx: i32,
    sy: i32,
    err: i32,
    started: bool,
    finished: bool,
}

impl LineIter {
    fn new(start: Point, end: Point) -> Self {
        let (x0, y0) = (start.x as i32, start.y as i32);
        let (x1, y1) = (end.x as i32, end.y as i32);
        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();

        Self {
            x: x0,
            y: y0,
            x1,
            y1,
            dx,
            dy,
            sx: if x0 <= x1 { 1 } else { -1 },
            sy: if y0 <= y1 { 1 } else { -1 },
            err: dx - dy,
            started: false,
            finished: false,
        }
    }

    fn at_end(&self) -> bool {
        self.x == self.x1 && self.y == self.y1
    }

    fn current(&self) -> Point {
        Point {
            x: self.x as u16,
            y: self.y as u16,
        }
    }

    fn remaining(&self) -> usize {
        if self.finished {
            return 0;
        }
        let steps = (self.x1 - self.x).abs().max((self.y1 - self.y).abs()) as usize;
        if self.started { steps } else { steps + 1 }
    }
}

impl Iterator for LineIter {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.finished {
            return None;
        }

        if !self.started {
            self.started = true;
            self.finished = self.at_end();
            return Some(self.current());
        }

        let e2 = 2 * self.err;
        if e2 > -self.dy {
            self.err -= self.dy;
            self.x += self.sx;
        }
        if e2 < self.dx {
            self.err += self.dx;
            self.y += self.sy;
        }

        self.finished = self.at_end();
        Some(self.current())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for LineIter {}

impl FusedIterator for LineIter {}
