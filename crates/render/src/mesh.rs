//! Card quad geometry.

use holocard_core::CardVertex;

/// Flat `width × height` quad centered on the origin, facing +Z.
///
/// UVs are laid out a quarter turn from the image axes; the holo shader
/// rotates its card lookup back so the art shows upright.
pub fn card_quad(width: f32, height: f32) -> (Vec<CardVertex>, Vec<u16>) {
    let (hw, hh) = (width * 0.5, height * 0.5);
    let vertices = vec![
        // top-left
        CardVertex {
            position: [-hw, hh, 0.0],
            uv: [0.0, 1.0],
        },
        // bottom-left
        CardVertex {
            position: [-hw, -hh, 0.0],
            uv: [1.0, 1.0],
        },
        // bottom-right
        CardVertex {
            position: [hw, -hh, 0.0],
            uv: [1.0, 0.0],
        },
        // top-right
        CardVertex {
            position: [hw, hh, 0.0],
            uv: [0.0, 0.0],
        },
    ];
    let indices = vec![0, 1, 2, 0, 2, 3];
    (vertices, indices)
}
