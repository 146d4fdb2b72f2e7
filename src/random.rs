use rand::Rng;

use crate::dna::{Color, Point};

/// draw a single vertex with x in [0, max_x) and y in [0, max_y)
#[inline]
pub fn random_point<R: Rng>(rng: &mut R, max_x: u32, max_y: u32) -> Point {
    Point {
        x: rng.random_range(0..max_x),
        y: rng.random_range(0..max_y),
    }
}

/// draw `count` vertices in generation order. no sorting into convex position:
/// self-intersecting polygons are allowed and expected.
pub fn random_points<R: Rng>(rng: &mut R, count: usize, max_x: u32, max_y: u32) -> Vec<Point> {
    (0..count).map(|_| random_point(rng, max_x, max_y)).collect()
}

/// draw a fill color with every channel (alpha included) uniform over 0..=255
pub fn random_color<R: Rng>(rng: &mut R) -> Color {
    Color {
        r: rng.random(),
        g: rng.random(),
        b: rng.random(),
        a: rng.random(),
    }
}
