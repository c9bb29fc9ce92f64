pub mod band;
pub mod holo;
