//! Room geometry and the flat "wall" coordinate space
//!
//! Targets are placed, moved and spaced in a 2D wall space centred on the
//! origin: x in [-width/2, width/2], y in [-height/2, height/2]. Only the final
//! world position depends on how the room is shaped:
//! - box: the wall is the front face at z = 0
//! - cylinder: wall x wraps around the inside of the cylinder
//! - barrel: the wall is the floor disc, seen from above

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::CYLINDER_TARGET_INSET;

fn default_perimeter_percent() -> f32 {
    0.5
}

/// Physical shape of a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomShape {
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    Cylinder {
        radius: f32,
        height: f32,
        /// Literal wall width; overrides `width_perimeter_percent` when set
        #[serde(default)]
        width: Option<f32>,
        /// Fraction of the circumference used as wall width
        #[serde(default = "default_perimeter_percent")]
        width_perimeter_percent: f32,
    },
    Barrel {
        radius: f32,
    },
}

/// A room plus the camera pose the run starts from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDef {
    pub shape: RoomShape,
    /// Camera position; derived from the shape when omitted
    #[serde(default)]
    pub camera_position: Option<Vec3>,
    #[serde(default)]
    pub start_pitch: f32,
    #[serde(default)]
    pub start_yaw: f32,
}

impl RoomDef {
    pub fn new(shape: RoomShape) -> Self {
        Self {
            shape,
            camera_position: None,
            start_pitch: 0.0,
            start_yaw: 0.0,
        }
    }

    /// Camera position, either explicit or the shape's natural vantage point
    pub fn camera(&self) -> Vec3 {
        if let Some(pos) = self.camera_position {
            return pos;
        }
        match self.shape {
            RoomShape::Box { height, depth, .. } => Vec3::new(0.0, height / 2.0, depth),
            RoomShape::Cylinder { height, .. } => Vec3::new(0.0, height / 2.0, 0.0),
            RoomShape::Barrel { radius } => Vec3::new(0.0, radius * 1.5, 0.0),
        }
    }
}

/// Resolved flat placement space for a room
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub width: f32,
    pub height: f32,
    /// True when the usable area is the inscribed disc (barrel floors)
    #[serde(default)]
    pub circular: bool,
}

impl Wall {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            circular: false,
        }
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Whether a circle of `radius` at `pos` lies fully inside the wall
    pub fn contains(&self, pos: Vec2, radius: f32) -> bool {
        if self.circular {
            pos.length() + radius <= self.width / 2.0
        } else {
            let half = self.half_extents() - Vec2::splat(radius);
            pos.x.abs() <= half.x && pos.y.abs() <= half.y
        }
    }

    /// Pull `pos` back inside the wall, keeping `radius` clearance
    pub fn clamp(&self, pos: Vec2, radius: f32) -> Vec2 {
        if self.circular {
            let max = (self.width / 2.0 - radius).max(0.0);
            if pos.length() > max {
                pos.normalize_or_zero() * max
            } else {
                pos
            }
        } else {
            let half = (self.half_extents() - Vec2::splat(radius)).max(Vec2::ZERO);
            pos.clamp(-half, half)
        }
    }
}

/// Resolve the wall dimensions of a room
pub fn resolve_wall(room: &RoomDef) -> Wall {
    match room.shape {
        RoomShape::Box { width, height, .. } => Wall::new(width, height),
        RoomShape::Cylinder {
            radius,
            height,
            width,
            width_perimeter_percent,
        } => {
            let width = match width {
                Some(w) if w > 0.0 => w,
                _ => width_perimeter_percent * std::f32::consts::TAU * radius,
            };
            Wall::new(width, height)
        }
        RoomShape::Barrel { radius } => Wall {
            width: 2.0 * radius,
            height: 2.0 * radius,
            circular: true,
        },
    }
}

/// Map a wall-space position to a world position for a target of `target_radius`
pub fn wall_to_world(wall_pos: Vec2, target_radius: f32, room: &RoomDef) -> Vec3 {
    match room.shape {
        RoomShape::Box { height, .. } => {
            Vec3::new(wall_pos.x, wall_pos.y + height / 2.0, target_radius)
        }
        RoomShape::Cylinder { radius, height, .. } => {
            let radians_per_x = 1.0 / radius;
            let depth = radius - CYLINDER_TARGET_INSET * target_radius;
            // Rotating (0, depth) by +angle swings it to -x, so mirror x back
            let rotated = Vec2::from_angle(wall_pos.x * radians_per_x).rotate(Vec2::new(0.0, depth));
            Vec3::new(-rotated.x, wall_pos.y + height / 2.0, -rotated.y)
        }
        RoomShape::Barrel { .. } => Vec3::new(wall_pos.x, target_radius, -wall_pos.y),
    }
}
