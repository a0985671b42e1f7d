//! Vertex and beam position types
//!
//! Coordinates live in a 12-bit domain (0..=4095) on both axes, matching the
//! resolution of the DAC. Values outside that range are masked, the same way
//! a 12-bit register would truncate them.

/// Largest coordinate on either axis
pub const COORD_MAX: u16 = 0x0FFF;

/// Brightness used by `line_to` shorthands
pub const BRIGHT_ON: u8 = 255;

/// A beam position on the display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: u16,
    pub y: u16,
}

impl Point {
    /// Origin (bottom-left on most scopes)
    pub const ORIGIN: Point = Point { x: 0, y: 0 };

    /// Create a point, masking both coordinates to 12 bits
    pub const fn new(x: u16, y: u16) -> Self {
        Self {
            x: x & COORD_MAX,
            y: y & COORD_MAX,
        }
    }

    /// Create a point from signed coordinates, clamping into the display area
    pub fn clamped(x: i32, y: i32) -> Self {
        Self {
            x: x.clamp(0, COORD_MAX as i32) as u16,
            y: y.clamp(0, COORD_MAX as i32) as u16,
        }
    }
}

/// One entry in a vertex list
///
/// `bright == 0` moves the beam without drawing (blanked jump).
/// Any other value draws a visible line from the previous beam position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Vertex {
    pub x: u16,
    pub y: u16,
    pub bright: u8,
}

impl Vertex {
    /// Create a vertex, masking both coordinates to 12 bits
    pub const fn new(x: u16, y: u16, bright: u8) -> Self {
        Self {
            x: x & COORD_MAX,
            y: y & COORD_MAX,
            bright,
        }
    }

    /// Blanked move to `(x, y)`
    pub const fn move_to(x: u16, y: u16) -> Self {
        Self::new(x, y, 0)
    }

    /// Visible line to `(x, y)`
    pub const fn line_to(x: u16, y: u16) -> Self {
        Self::new(x, y, BRIGHT_ON)
    }

    /// Whether the beam draws on its way to this vertex
    pub const fn is_draw(&self) -> bool {
        self.bright != 0
    }

    /// Destination of this vertex
    pub const fn position(&self) -> Point {
        Point {
            x: self.x,
            y: self.y,
        }
    }
}

impl From<Vertex> for Point {
    fn from(v: Vertex) -> Self {
        v.position()
    }
}
