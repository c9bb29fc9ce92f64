//! Holocard core types shared across crates.
//!
//! Provides coordinate conversion between nalgebra (physics) and glam (render),
//! hex color parsing, GPU vertex layouts, and shared constants.

use nalgebra as na;

// Re-export key types so downstream crates don't repeat use-declarations
pub use na::{Isometry3, Point3, UnitQuaternion, Vector3};

/// Gravitational acceleration (units/s²), Y-up. Deliberately strong so the
/// band snaps back quickly after a drag.
pub const GRAVITY: Vector3<f64> = Vector3::new(0.0, -40.0, 0.0);

/// Fixed physics timestep (s).
pub const PHYSICS_DT: f64 = 1.0 / 60.0;

/// Maximum frame time fed into the physics accumulator (s).
pub const MAX_FRAME_TIME: f64 = 0.1;

/// Convert nalgebra Isometry3<f64> → glam Mat4 (for GPU upload).
pub fn isometry_to_glam(iso: &Isometry3<f64>) -> glam::Mat4 {
    let m = iso.to_homogeneous();
    let mut cols = [0.0f32; 16];
    for c in 0..4 {
        for r in 0..4 {
            cols[c * 4 + r] = m[(r, c)] as f32;
        }
    }
    glam::Mat4::from_cols_array(&cols)
}

/// Convert nalgebra Vector3<f64> → glam Vec3.
pub fn vec3_to_glam(v: &Vector3<f64>) -> glam::Vec3 {
    glam::Vec3::new(v.x as f32, v.y as f32, v.z as f32)
}

/// Convert glam Vec3 → nalgebra Vector3<f64>.
pub fn glam_to_vec3(v: glam::Vec3) -> Vector3<f64> {
    Vector3::new(v.x as f64, v.y as f64, v.z as f64)
}

/// Parse a CSS-style hex color (`#RRGGBB`, `RRGGBB` or `#RGB`) into 0..1 components.
pub fn parse_hex_color(hex: &str) -> Option<[f32; 3]> {
    let digits = hex.trim().trim_start_matches('#');
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
    match digits.len() {
        6 => Some([
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        ]),
        3 => {
            // #RGB expands each nibble: F → FF
            let mut out = [0.0; 3];
            for (i, c) in digits.chars().enumerate() {
                let pair: String = [c, c].iter().collect();
                out[i] = channel(&pair)?;
            }
            Some(out)
        }
        _ => None,
    }
}

/// sRGB-encoded components → linear, for uniforms written to an sRGB target.
pub fn srgb_to_linear(c: [f32; 3]) -> [f32; 3] {
    c.map(|v| {
        if v <= 0.04045 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    })
}

/// GPU-uploadable vertex for the screen-space band ribbon.
///
/// Each polyline point is emitted twice (`side` = ±1); the vertex shader
/// pushes the pair apart perpendicular to the projected tangent.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RibbonVertex {
    pub position: [f32; 3],
    pub side: f32,
    pub previous: [f32; 3],
    /// Normalized distance along the band (0 at the first point, 1 at the last).
    pub counter: f32,
    pub next: [f32; 3],
    pub _pad: f32,
}

/// GPU-uploadable vertex for the card quad.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CardVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}
