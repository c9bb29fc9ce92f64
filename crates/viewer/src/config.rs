//! Simple TOML-subset config loader for the holocard viewer.
//! Supports [sections] with key = value pairs (strings, floats, ints, bools).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use holocard_band::{CurveType, DEFAULT_SAMPLES};
use holocard_core::{parse_hex_color, GRAVITY, PHYSICS_DT};
use holocard_physics::world::DEFAULT_SUBSTEPS;
use holocard_render::pipelines::band::DEFAULT_WIDTH_PX;

/// Parsed configuration values, keyed by "section.key".
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    /// Load config from a file. Returns an empty config if it can't be read.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                log::info!("no config at {} ({}), using defaults", path.display(), e);
                return Self { values: HashMap::new() };
            }
        };
        log::info!("loaded config from {}", path.display());
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        let mut section = String::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                section = line[1..line.len() - 1].trim().to_string();
                continue;
            }
            let Some(eq_pos) = line.find('=') else {
                log::warn!("ignoring config line without '=': {}", line);
                continue;
            };
            let key = line[..eq_pos].trim();
            let val = line[eq_pos + 1..].trim();
            // Quoted values may contain '#' (hex colors); bare ones end at a comment
            let val = match val.strip_prefix('"') {
                Some(rest) => match rest.find('"') {
                    Some(end) => &rest[..end],
                    None => rest,
                },
                None => match val.find('#') {
                    Some(hash) => val[..hash].trim(),
                    None => val,
                },
            };
            let full_key = if section.is_empty() {
                key.to_string()
            } else {
                format!("{}.{}", section, key)
            };
            values.insert(full_key, val.to_string());
        }

        Self { values }
    }

    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.values
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    pub fn get_u32(&self, key: &str, default: u32) -> u32 {
        self.values
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key).map(|v| v.to_ascii_lowercase()) {
            Some(v) if v == "true" || v == "1" => true,
            Some(v) if v == "false" || v == "0" => false,
            _ => default,
        }
    }

    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.values.get(key).map(|s| s.as_str()).unwrap_or(default)
    }

    /// A non-empty path value, if present.
    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.values
            .get(key)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    }
}

/// All configurable viewer parameters with defaults.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    // Physics
    pub gravity_y: f64,
    pub timestep: f64,
    pub substeps: u32,
    pub interpolate: bool,
    // Band
    /// sRGB.
    pub band_color: [f32; 3],
    pub band_width_px: f32,
    pub samples: usize,
    pub curve_type: CurveType,
    // Card
    pub card_type: String,
    pub card_texture: Option<PathBuf>,
    pub holo_texture: Option<PathBuf>,
    pub grain_texture: Option<PathBuf>,
    pub noise_texture: Option<PathBuf>,
    pub normal_texture: Option<PathBuf>,
    pub opaque: bool,
    pub spin_settle: f64,
}

const DEFAULT_BAND_COLOR: &str = "#222222";

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::from_config(&Config {
            values: HashMap::new(),
        })
    }
}

impl ViewerConfig {
    pub fn from_file(path: &Path) -> Self {
        Self::from_config(&Config::load(path))
    }

    pub fn from_config(cfg: &Config) -> Self {
        let timestep = cfg.get_f64("physics.timestep", PHYSICS_DT);
        let timestep = if timestep > 0.0 {
            timestep
        } else {
            log::warn!("physics.timestep must be positive, using {}", PHYSICS_DT);
            PHYSICS_DT
        };

        let color = cfg.get_str("band.color", DEFAULT_BAND_COLOR);
        let band_color = parse_hex_color(color).unwrap_or_else(|| {
            log::warn!("invalid band.color {:?}, using {}", color, DEFAULT_BAND_COLOR);
            [34.0 / 255.0; 3]
        });

        let curve_name = cfg.get_str("band.curve_type", "centripetal");
        let curve_type = CurveType::from_name(curve_name).unwrap_or_else(|| {
            log::warn!("unknown band.curve_type {:?}, using centripetal", curve_name);
            CurveType::Centripetal
        });

        Self {
            gravity_y: cfg.get_f64("physics.gravity_y", GRAVITY.y),
            timestep,
            substeps: cfg.get_u32("physics.substeps", DEFAULT_SUBSTEPS).max(1),
            interpolate: cfg.get_bool("physics.interpolate", true),
            band_color,
            band_width_px: cfg.get_f64("band.width_px", DEFAULT_WIDTH_PX as f64).max(0.0) as f32,
            samples: cfg.get_u32("band.samples", DEFAULT_SAMPLES as u32).max(2) as usize,
            curve_type,
            card_type: cfg.get_str("card.type", "water").to_string(),
            card_texture: cfg.get_path("card.texture"),
            holo_texture: cfg.get_path("card.holo"),
            grain_texture: cfg.get_path("card.grain"),
            noise_texture: cfg.get_path("card.noise"),
            normal_texture: cfg.get_path("card.normal"),
            opaque: cfg.get_bool("card.opaque", false),
            spin_settle: cfg.get_f64("card.spin_settle", 0.25),
        }
    }
}
