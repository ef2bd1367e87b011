//! Target placement regions
//!
//! A region is a rectangle, circle or ellipse in wall space, optionally with
//! an inner exclusion area of the same shape, shifted by an offset from the
//! wall centre. Lengths are absolute wall units or fractions of the wall.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::room::Wall;
use crate::polar_to_cartesian;

/// Attempts at re-rolling a point outside an inner ellipse
const ELLIPSE_RING_ATTEMPTS: u32 = 64;

/// A length in wall units or as a fraction of a wall dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Length {
    Units(f32),
    /// Fraction (0..=1) of the wall width for x-axis lengths, height for y
    Percent(f32),
}

impl Default for Length {
    fn default() -> Self {
        Length::Units(0.0)
    }
}

impl Length {
    #[inline]
    pub fn resolve(&self, wall_dimension: f32) -> f32 {
        match *self {
            Length::Units(v) => v,
            Length::Percent(p) => p * wall_dimension,
        }
    }
}

/// Region outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum RegionShape {
    Rectangle {
        x_length: Length,
        y_length: Length,
        #[serde(default)]
        inner_x_length: Option<Length>,
        #[serde(default)]
        inner_y_length: Option<Length>,
    },
    Circle {
        /// Resolved against wall width when given as a percent
        diameter: Length,
        #[serde(default)]
        inner_diameter: Option<Length>,
    },
    Ellipse {
        x_diameter: Length,
        y_diameter: Length,
        #[serde(default)]
        inner_x_diameter: Option<Length>,
        #[serde(default)]
        inner_y_diameter: Option<Length>,
    },
}

fn default_chance() -> f32 {
    1.0
}

/// A weighted placement area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRegion {
    #[serde(flatten)]
    pub shape: RegionShape,
    #[serde(default)]
    pub x_offset: Length,
    #[serde(default)]
    pub y_offset: Length,
    /// Chance (0..=1) this region wins its roll during selection
    #[serde(default = "default_chance")]
    pub percent_chance: f32,
}

impl TargetRegion {
    /// Rectangle covering the whole wall
    pub fn full_wall() -> Self {
        Self {
            shape: RegionShape::Rectangle {
                x_length: Length::Percent(1.0),
                y_length: Length::Percent(1.0),
                inner_x_length: None,
                inner_y_length: None,
            },
            x_offset: Length::Units(0.0),
            y_offset: Length::Units(0.0),
            percent_chance: 1.0,
        }
    }

    /// Offset of the region centre from the wall centre
    pub fn offset(&self, wall: &Wall) -> Vec2 {
        Vec2::new(self.x_offset.resolve(wall.width), self.y_offset.resolve(wall.height))
    }

    /// Sample a uniformly distributed point inside the region (inner area excluded)
    pub fn sample<R: Rng>(&self, wall: &Wall, rng: &mut R) -> Vec2 {
        let local = match &self.shape {
            RegionShape::Rectangle {
                x_length,
                y_length,
                inner_x_length,
                inner_y_length,
            } => {
                let size = Vec2::new(x_length.resolve(wall.width), y_length.resolve(wall.height));
                let inner = match (inner_x_length, inner_y_length) {
                    (Some(ix), Some(iy)) => {
                        Some(Vec2::new(ix.resolve(wall.width), iy.resolve(wall.height)))
                    }
                    _ => None,
                };
                sample_rectangle(size, inner, rng)
            }
            RegionShape::Circle {
                diameter,
                inner_diameter,
            } => {
                let radius = diameter.resolve(wall.width) / 2.0;
                let inner = inner_diameter.map(|d| d.resolve(wall.width) / 2.0);
                sample_circle(radius, inner, rng)
            }
            RegionShape::Ellipse {
                x_diameter,
                y_diameter,
                inner_x_diameter,
                inner_y_diameter,
            } => {
                let radii = Vec2::new(
                    x_diameter.resolve(wall.width) / 2.0,
                    y_diameter.resolve(wall.height) / 2.0,
                );
                let inner = match (inner_x_diameter, inner_y_diameter) {
                    (Some(ix), Some(iy)) => Some(Vec2::new(
                        ix.resolve(wall.width) / 2.0,
                        iy.resolve(wall.height) / 2.0,
                    )),
                    _ => None,
                };
                sample_ellipse(radii, inner, rng)
            }
        };
        local + self.offset(wall)
    }

    /// Whether `point` (wall space) lies inside the region, inner area excluded
    pub fn contains(&self, wall: &Wall, point: Vec2) -> bool {
        let p = point - self.offset(wall);
        match &self.shape {
            RegionShape::Rectangle {
                x_length,
                y_length,
                inner_x_length,
                inner_y_length,
            } => {
                let half = Vec2::new(x_length.resolve(wall.width), y_length.resolve(wall.height)) / 2.0;
                let outside_inner = match (inner_x_length, inner_y_length) {
                    (Some(ix), Some(iy)) => {
                        p.x.abs() >= ix.resolve(wall.width) / 2.0
                            || p.y.abs() >= iy.resolve(wall.height) / 2.0
                    }
                    _ => true,
                };
                p.x.abs() <= half.x && p.y.abs() <= half.y && outside_inner
            }
            RegionShape::Circle {
                diameter,
                inner_diameter,
            } => {
                let r = p.length();
                let inner = inner_diameter.map_or(0.0, |d| d.resolve(wall.width) / 2.0);
                r <= diameter.resolve(wall.width) / 2.0 && r >= inner
            }
            RegionShape::Ellipse {
                x_diameter,
                y_diameter,
                inner_x_diameter,
                inner_y_diameter,
            } => {
                let radii = Vec2::new(
                    x_diameter.resolve(wall.width) / 2.0,
                    y_diameter.resolve(wall.height) / 2.0,
                );
                let outside_inner = match (inner_x_diameter, inner_y_diameter) {
                    (Some(ix), Some(iy)) => {
                        let inner = Vec2::new(
                            ix.resolve(wall.width) / 2.0,
                            iy.resolve(wall.height) / 2.0,
                        );
                        ellipse_norm(p, inner) >= 1.0
                    }
                    _ => true,
                };
                ellipse_norm(p, radii) <= 1.0 && outside_inner
            }
        }
    }
}

#[inline]
fn uniform<R: Rng>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    lo + (hi - lo) * rng.random::<f32>()
}

#[inline]
fn ellipse_norm(p: Vec2, radii: Vec2) -> f32 {
    if radii.x <= 0.0 || radii.y <= 0.0 {
        return f32::INFINITY;
    }
    (p / radii).length_squared()
}

/// Uniform point in a rectangle of `size`, outside a centred `inner` rectangle.
///
/// The ring is split into top/bottom strips spanning the full width and
/// left/right strips spanning the inner height; a strip is chosen in
/// proportion to its area so the result stays uniform over the ring.
fn sample_rectangle<R: Rng>(size: Vec2, inner: Option<Vec2>, rng: &mut R) -> Vec2 {
    let half = size / 2.0;
    let Some(inner) = inner.map(|i| i.min(size)) else {
        return Vec2::new(uniform(rng, -half.x, half.x), uniform(rng, -half.y, half.y));
    };
    let inner_half = inner / 2.0;

    let horizontal_area = size.x * (size.y - inner.y) / 2.0;
    let vertical_area = (size.x - inner.x) / 2.0 * inner.y;
    let total = 2.0 * (horizontal_area + vertical_area);
    if total <= 0.0 {
        return Vec2::new(uniform(rng, -half.x, half.x), uniform(rng, -half.y, half.y));
    }

    let roll = rng.random::<f32>() * total;
    if roll < 2.0 * horizontal_area {
        // Top or bottom strip
        let y = uniform(rng, inner_half.y, half.y);
        let y = if roll < horizontal_area { y } else { -y };
        Vec2::new(uniform(rng, -half.x, half.x), y)
    } else {
        // Left or right strip
        let x = uniform(rng, inner_half.x, half.x);
        let x = if roll < 2.0 * horizontal_area + vertical_area { x } else { -x };
        Vec2::new(x, uniform(rng, -inner_half.y, inner_half.y))
    }
}

/// Uniform point in a disc, or in the annulus outside `inner`
fn sample_circle<R: Rng>(radius: f32, inner: Option<f32>, rng: &mut R) -> Vec2 {
    let theta = uniform(rng, 0.0, std::f32::consts::TAU);
    let min_u = match inner {
        Some(ri) if radius > 0.0 => (ri / radius).clamp(0.0, 1.0).powi(2),
        _ => 0.0,
    };
    let r = radius * uniform(rng, min_u, 1.0).sqrt();
    polar_to_cartesian(r, theta)
}

/// Uniform point in an ellipse, re-rolled while it falls in the inner ellipse
fn sample_ellipse<R: Rng>(radii: Vec2, inner: Option<Vec2>, rng: &mut R) -> Vec2 {
    let mut point = sample_circle(1.0, None, rng) * radii;
    if let Some(inner) = inner {
        for _ in 0..ELLIPSE_RING_ATTEMPTS {
            if ellipse_norm(point, inner) >= 1.0 {
                break;
            }
            point = sample_circle(1.0, None, rng) * radii;
        }
    }
    point
}
