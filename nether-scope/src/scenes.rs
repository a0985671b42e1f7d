//! Built-in demo scenes
//!
//! Each scene produces line segments for a point in time, which are then
//! planned into a vertex list.

use std::f32::consts::TAU;

use clap::ValueEnum;
use glam::{Mat3, Vec2, Vec3};
use nether_vector::{COORD_MAX, PlanOptions, Segment, Vertex, plan_segments};

/// Middle of the 12-bit display
const CENTER: f32 = (COORD_MAX as f32 + 1.0) / 2.0;

/// Perspective projection: focal length in display units, camera distance in model units
const FOV: f32 = 2048.0;
const VIEWER_DISTANCE: f32 = 4.0;

const CUBE_CORNERS: [Vec3; 8] = [
    Vec3::new(-1.0, 1.0, -1.0),
    Vec3::new(1.0, 1.0, -1.0),
    Vec3::new(1.0, -1.0, -1.0),
    Vec3::new(-1.0, -1.0, -1.0),
    Vec3::new(-1.0, 1.0, 1.0),
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(-1.0, -1.0, 1.0),
];

/// Corner indices of each face
const CUBE_FACES: [[usize; 4]; 6] = [
    [0, 1, 2, 3],
    [1, 5, 6, 2],
    [5, 4, 7, 6],
    [4, 0, 3, 7],
    [0, 4, 5, 1],
    [3, 2, 6, 7],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scene {
    /// Rotating wireframe cube
    Cube,
    /// Static square
    Square,
    /// Spinning five-pointed star
    Star,
}

impl Scene {
    /// Segments making up the scene `t` seconds in
    pub fn segments(self, t: f32) -> Vec<Segment> {
        match self {
            Scene::Cube => cube(t),
            Scene::Square => square(),
            Scene::Star => star(t),
        }
    }

    /// Vertex list for the scene `t` seconds in
    pub fn vertices(self, t: f32, options: &PlanOptions) -> Vec<Vertex> {
        plan_segments(&self.segments(t), options)
    }
}

fn segment(a: Vec2, b: Vec2) -> Segment {
    Segment::clamped(
        a.x.round() as i32,
        a.y.round() as i32,
        b.x.round() as i32,
        b.y.round() as i32,
    )
}

/// Perspective-project a model-space point onto the display
fn project(p: Vec3) -> Vec2 {
    let factor = FOV / (VIEWER_DISTANCE + p.z);
    Vec2::new(p.x * factor + CENTER, p.y * factor + CENTER)
}

fn cube(t: f32) -> Vec<Segment> {
    // One degree per axis per frame at 60 fps
    let angle = (t * 60.0).to_radians();
    let rotation =
        Mat3::from_rotation_z(angle) * Mat3::from_rotation_y(angle) * Mat3::from_rotation_x(angle);
    let projected = CUBE_CORNERS.map(|corner| project(rotation * corner));

    // Shared edges come out twice, plan_segments drops the repeats
    CUBE_FACES
        .iter()
        .flat_map(|face| (0..4).map(move |i| (face[i], face[(i + 1) % 4])))
        .map(|(a, b)| segment(projected[a], projected[b]))
        .collect()
}

fn square() -> Vec<Segment> {
    let corners = [
        Vec2::new(1024.0, 1024.0),
        Vec2::new(3072.0, 1024.0),
        Vec2::new(3072.0, 3072.0),
        Vec2::new(1024.0, 3072.0),
    ];
    (0..4).map(|i| segment(corners[i], corners[(i + 1) % 4])).collect()
}

fn star(t: f32) -> Vec<Segment> {
    const RADIUS: f32 = 1600.0;
    let spin = t * TAU / 8.0;
    // Visit every second point of a pentagon
    let tips: Vec<Vec2> = (0..5)
        .map(|i| {
            let angle = spin + (i * 2) as f32 * TAU / 5.0;
            Vec2::new(CENTER, CENTER) + Vec2::from_angle(angle) * RADIUS
        })
        .collect();
    (0..5).map(|i| segment(tips[i], tips[(i + 1) % 5])).collect()
}
