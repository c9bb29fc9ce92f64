//! Holographic card material: uniforms, clock and glow palette.

use std::time::Instant;

use glam::Mat4;
use holocard_core::{parse_hex_color, srgb_to_linear};
use holocard_input::PointerPosition;

/// Weight of the holo layer over the card art.
pub const HOLO_MIX: f32 = 0.8;

/// `2 · |(x, y) − (0.5, 0.5)|`: 0 at the center, 1 at an edge midpoint, √2 at a corner.
pub fn pointer_from_center(x: f32, y: f32) -> f32 {
    PointerPosition::new(x, y).from_center()
}

/// Holographic shader uniforms. Layout matches `HoloUniforms` in holo.wgsl.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct HoloUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// Linear RGB.
    pub glow: [f32; 3],
    pub time: f32,
    pub pointer_x: f32,
    pub pointer_y: f32,
    pub pointer_from_center: f32,
    pub holo_mix: f32,
    /// Non-zero forces alpha to 1.
    pub opaque: u32,
    pub _pad: [u32; 3],
}

impl HoloUniforms {
    /// `glow` is sRGB, as parsed from a hex color.
    pub fn new(glow: [f32; 3], opaque: bool) -> Self {
        let center = PointerPosition::CENTER;
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
            glow: srgb_to_linear(glow),
            time: 0.0,
            pointer_x: center.x,
            pointer_y: center.y,
            pointer_from_center: center.from_center(),
            holo_mix: HOLO_MIX,
            opaque: opaque as u32,
            _pad: [0; 3],
        }
    }

    /// Per-frame values: elapsed time and the latest pointer.
    pub fn update_frame(&mut self, time: f32, pointer: PointerPosition) {
        self.time = time;
        self.pointer_x = pointer.x;
        self.pointer_y = pointer.y;
        self.pointer_from_center = pointer.from_center();
    }

    pub fn set_transforms(&mut self, view_proj: Mat4, model: Mat4) {
        self.view_proj = view_proj.to_cols_array_2d();
        self.model = model.to_cols_array_2d();
    }
}

/// Monotonic seconds since the first reading.
#[derive(Debug, Default, Clone, Copy)]
pub struct HoloClock {
    start: Option<Instant>,
}

impl HoloClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed(&mut self) -> f32 {
        self.elapsed_at(Instant::now())
    }

    pub fn elapsed_at(&mut self, now: Instant) -> f32 {
        let start = *self.start.get_or_insert(now);
        now.saturating_duration_since(start).as_secs_f32()
    }
}

/// Card types and their glow colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlowType {
    #[default]
    Water,
    Fire,
    Grass,
    Lightning,
    Psychic,
    Fighting,
    Darkness,
    Metal,
    Colorless,
    Dragon,
}

impl GlowType {
    pub const ALL: [GlowType; 10] = [
        GlowType::Water,
        GlowType::Fire,
        GlowType::Grass,
        GlowType::Lightning,
        GlowType::Psychic,
        GlowType::Fighting,
        GlowType::Darkness,
        GlowType::Metal,
        GlowType::Colorless,
        GlowType::Dragon,
    ];

    /// Case-insensitive, whitespace-trimmed lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    pub fn name(&self) -> &'static str {
        match self {
            GlowType::Water => "water",
            GlowType::Fire => "fire",
            GlowType::Grass => "grass",
            GlowType::Lightning => "lightning",
            GlowType::Psychic => "psychic",
            GlowType::Fighting => "fighting",
            GlowType::Darkness => "darkness",
            GlowType::Metal => "metal",
            GlowType::Colorless => "colorless",
            GlowType::Dragon => "dragon",
        }
    }

    pub fn hex(&self) -> &'static str {
        match self {
            GlowType::Water => "#5DC9E2",
            GlowType::Fire => "#F24333",
            GlowType::Grass => "#9BDF4A",
            GlowType::Lightning => "#FBD100",
            GlowType::Psychic => "#D33FE6",
            GlowType::Fighting => "#915A27",
            GlowType::Darkness => "#054863",
            GlowType::Metal => "#8A8D90",
            GlowType::Colorless => "#E3D6D1",
            GlowType::Dragon => "#796BBE",
        }
    }

    /// sRGB components in [0, 1].
    pub fn color(&self) -> [f32; 3] {
        parse_hex_color(self.hex()).unwrap_or([1.0; 3])
    }
}

/// Glow hex for a card type name; unknown names get the water glow.
pub fn glow_hex(name: &str) -> &'static str {
    GlowType::from_name(name).unwrap_or_default().hex()
}

/// Glow color (sRGB) for a card type name; unknown names get the water glow.
pub fn glow_color(name: &str) -> [f32; 3] {
    GlowType::from_name(name).unwrap_or_default().color()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_uniform_layout() {
        // Must match the WGSL struct: two mat4, vec3 + f32, 4 × f32, u32 + padding
        assert_eq!(std::mem::size_of::<HoloUniforms>(), 176);
        assert_eq!(std::mem::size_of::<HoloUniforms>() % 16, 0);
    }

    #[test]
    fn test_pointer_from_center() {
        assert_eq!(pointer_from_center(0.5, 0.5), 0.0);
        assert!((pointer_from_center(0.0, 0.0) - 2f32.sqrt()).abs() < 1e-6);
        assert!((pointer_from_center(1.0, 1.0) - 2f32.sqrt()).abs() < 1e-6);
        assert!((pointer_from_center(1.0, 0.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_update_frame() {
        let mut u = HoloUniforms::new(GlowType::Water.color(), false);
        assert_eq!(u.pointer_from_center, 0.0);
        assert_eq!(u.holo_mix, HOLO_MIX);

        u.update_frame(3.5, PointerPosition::new(1.0, 0.5));
        assert_eq!(u.time, 3.5);
        assert_eq!((u.pointer_x, u.pointer_y), (1.0, 0.5));
        assert!((u.pointer_from_center - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_opaque_flag() {
        assert_eq!(HoloUniforms::new([1.0; 3], true).opaque, 1);
        assert_eq!(HoloUniforms::new([1.0; 3], false).opaque, 0);
    }

    #[test]
    fn test_clock_is_monotonic_from_first_reading() {
        let mut clock = HoloClock::new();
        let t0 = Instant::now();
        assert_eq!(clock.elapsed_at(t0), 0.0);
        let t1 = clock.elapsed_at(t0 + Duration::from_millis(1500));
        assert!((t1 - 1.5).abs() < 1e-6);
        // An earlier instant never runs the clock backwards past zero
        assert_eq!(clock.elapsed_at(t0), 0.0);
    }

    #[test]
    fn test_glow_lookup() {
        assert_eq!(glow_hex("fire"), "#F24333");
        assert_eq!(glow_hex("  FIRE "), "#F24333");
        assert_eq!(glow_hex("Dragon"), "#796BBE");
        assert_eq!(glow_hex("plasma"), "#5DC9E2");
        assert_eq!(glow_hex(""), "#5DC9E2");
        assert_eq!(glow_color("plasma"), glow_color("water"));
    }

    #[test]
    fn test_glow_table_parses() {
        for t in GlowType::ALL {
            assert!(parse_hex_color(t.hex()).is_some(), "{:?}", t);
            assert_eq!(GlowType::from_name(t.name()), Some(t));
        }
        let fire = glow_color("fire");
        assert!((fire[0] - 242.0 / 255.0).abs() < 1e-6);
    }
}
