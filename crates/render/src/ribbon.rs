//! CPU side of the band ribbon: polyline → screen-space strip.

use glam::Vec3;
use holocard_core::RibbonVertex;

/// Triangle strip for a polyline, laid out for the band vertex shader.
///
/// Every point becomes two vertices (`side` = -1, +1) that carry the
/// neighbouring points, so the shader can offset them along the projected
/// normal and keep a constant pixel width.
#[derive(Debug, Default, Clone)]
pub struct RibbonGeometry {
    vertices: Vec<RibbonVertex>,
    indices: Vec<u32>,
}

impl RibbonGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from `points`, reusing the existing allocations.
    /// Fewer than two points clears the geometry.
    pub fn set_points(&mut self, points: &[Vec3]) {
        self.vertices.clear();
        self.indices.clear();
        let n = points.len();
        if n < 2 {
            return;
        }

        let last = n - 1;
        for (i, &p) in points.iter().enumerate() {
            // Ends mirror their neighbour so the tangent stays defined
            let previous = if i == 0 { 2.0 * p - points[1] } else { points[i - 1] };
            let next = if i == last { 2.0 * p - points[last - 1] } else { points[i + 1] };
            let counter = i as f32 / last as f32;
            for side in [-1.0, 1.0] {
                self.vertices.push(RibbonVertex {
                    position: p.to_array(),
                    side,
                    previous: previous.to_array(),
                    counter,
                    next: next.to_array(),
                    _pad: 0.0,
                });
            }
        }

        for i in 0..last as u32 {
            let base = i * 2;
            self.indices
                .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 1, base + 3]);
        }
    }

    pub fn vertices(&self) -> &[RibbonVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arc(n: usize) -> Vec<Vec3> {
        (0..n)
            .map(|i| {
                let a = i as f32 / (n - 1) as f32 * std::f32::consts::PI;
                Vec3::new(a.cos(), a.sin(), 0.0)
            })
            .collect()
    }

    #[test]
    fn test_counts_for_band_polyline() {
        let mut ribbon = RibbonGeometry::new();
        ribbon.set_points(&arc(32));
        assert_eq!(ribbon.vertices().len(), 64);
        assert_eq!(ribbon.indices().len(), 31 * 6);
        assert!(ribbon.indices().iter().all(|&i| i < 64));
    }

    #[test]
    fn test_vertex_attributes() {
        let pts = arc(5);
        let mut ribbon = RibbonGeometry::new();
        ribbon.set_points(&pts);
        let v = ribbon.vertices();

        assert_eq!(v[0].side, -1.0);
        assert_eq!(v[1].side, 1.0);
        assert_eq!(v[0].position, v[1].position);
        assert_eq!(v[0].counter, 0.0);
        assert_eq!(v[9].counter, 1.0);

        // Interior points reference their neighbours
        assert_eq!(v[4].previous, pts[1].to_array());
        assert_eq!(v[4].next, pts[3].to_array());

        // Ends are mirrored
        let mirrored = 2.0 * pts[0] - pts[1];
        assert_eq!(v[0].previous, mirrored.to_array());
        let mirrored = 2.0 * pts[4] - pts[3];
        assert_eq!(v[9].next, mirrored.to_array());
    }

    #[test]
    fn test_too_few_points_clears() {
        let mut ribbon = RibbonGeometry::new();
        ribbon.set_points(&arc(4));
        assert!(!ribbon.is_empty());
        ribbon.set_points(&[Vec3::ZERO]);
        assert!(ribbon.is_empty());
        assert!(ribbon.vertices().is_empty());
        ribbon.set_points(&[]);
        assert!(ribbon.is_empty());
    }

    #[test]
    fn test_reuses_allocation() {
        let mut ribbon = RibbonGeometry::new();
        ribbon.set_points(&arc(32));
        let (vcap, icap) = (ribbon.vertices.capacity(), ribbon.indices.capacity());
        for _ in 0..10 {
            ribbon.set_points(&arc(32));
        }
        assert_eq!(ribbon.vertices.capacity(), vcap);
        assert_eq!(ribbon.indices.capacity(), icap);
    }
}
