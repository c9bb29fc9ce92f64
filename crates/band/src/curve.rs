//! Catmull-Rom spline through the band's four control points.

use nalgebra::Vector3;

/// Number of control points the band curve always carries.
pub const CONTROL_POINTS: usize = 4;

/// Knot parametrization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveType {
    /// Knot spacing ∝ distance^0.5. No cusps or self-intersections.
    Centripetal,
    /// Knot spacing ∝ distance. Tighter around widely spaced points.
    Chordal,
    /// Even knots; tangents scaled by `tension`.
    Uniform { tension: f64 },
}

impl CurveType {
    /// Parse a config name. Unknown names return `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "centripetal" => Some(CurveType::Centripetal),
            "chordal" => Some(CurveType::Chordal),
            "catmullrom" | "uniform" => Some(CurveType::Uniform { tension: 0.5 }),
            _ => None,
        }
    }

    /// Exponent applied to squared distances between control points.
    fn knot_power(&self) -> Option<f64> {
        match self {
            CurveType::Centripetal => Some(0.25),
            CurveType::Chordal => Some(0.5),
            CurveType::Uniform { .. } => None,
        }
    }
}

/// Cubic `c0 + c1 t + c2 t² + c3 t³` for one coordinate of one segment.
struct Cubic {
    c0: f64,
    c1: f64,
    c2: f64,
    c3: f64,
}

impl Cubic {
    /// Hermite form from endpoints and endpoint tangents.
    fn hermite(x0: f64, x1: f64, t0: f64, t1: f64) -> Self {
        Self {
            c0: x0,
            c1: t0,
            c2: -3.0 * x0 + 3.0 * x1 - 2.0 * t0 - t1,
            c3: 2.0 * x0 - 2.0 * x1 + t0 + t1,
        }
    }

    fn uniform(x0: f64, x1: f64, x2: f64, x3: f64, tension: f64) -> Self {
        Self::hermite(x1, x2, tension * (x2 - x0), tension * (x3 - x1))
    }

    /// Non-uniform Catmull-Rom with knot intervals `dt0, dt1, dt2`, rescaled to [0, 1].
    fn nonuniform(x0: f64, x1: f64, x2: f64, x3: f64, dt0: f64, dt1: f64, dt2: f64) -> Self {
        let mut t1 = (x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1;
        let mut t2 = (x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2;
        t1 *= dt1;
        t2 *= dt1;
        Self::hermite(x1, x2, t1, t2)
    }

    fn eval(&self, t: f64) -> f64 {
        let t2 = t * t;
        self.c0 + self.c1 * t + self.c2 * t2 + self.c3 * t2 * t
    }
}

/// Open Catmull-Rom curve over exactly [`CONTROL_POINTS`] points.
///
/// End tangents come from phantom points mirrored through the end points.
#[derive(Debug, Clone)]
pub struct CatmullRomCurve {
    pub points: [Vector3<f64>; CONTROL_POINTS],
    pub curve_type: CurveType,
}

impl CatmullRomCurve {
    pub fn new(curve_type: CurveType) -> Self {
        Self {
            points: [Vector3::zeros(); CONTROL_POINTS],
            curve_type,
        }
    }

    /// Point at global parameter `t` in [0, 1], split evenly across segments.
    pub fn point_at(&self, t: f64) -> Vector3<f64> {
        let pts = &self.points;
        let l = pts.len();
        let p = (l - 1) as f64 * t.clamp(0.0, 1.0);
        let mut seg = p.floor() as usize;
        let mut weight = p - seg as f64;
        if seg >= l - 1 {
            seg = l - 2;
            weight = 1.0;
        }

        let p0 = if seg > 0 {
            pts[seg - 1]
        } else {
            pts[0] * 2.0 - pts[1]
        };
        let p1 = pts[seg];
        let p2 = pts[seg + 1];
        let p3 = if seg + 2 < l {
            pts[seg + 2]
        } else {
            pts[l - 1] * 2.0 - pts[l - 2]
        };

        let cubics: [Cubic; 3] = match self.curve_type.knot_power() {
            Some(pow) => {
                let mut dt0 = (p1 - p0).norm_squared().powf(pow);
                let mut dt1 = (p2 - p1).norm_squared().powf(pow);
                let mut dt2 = (p3 - p2).norm_squared().powf(pow);
                // Guard against coincident points
                if dt1 < 1e-4 {
                    dt1 = 1.0;
                }
                if dt0 < 1e-4 {
                    dt0 = dt1;
                }
                if dt2 < 1e-4 {
                    dt2 = dt1;
                }
                std::array::from_fn(|i| {
                    Cubic::nonuniform(p0[i], p1[i], p2[i], p3[i], dt0, dt1, dt2)
                })
            }
            None => {
                let tension = match self.curve_type {
                    CurveType::Uniform { tension } => tension,
                    _ => 0.5,
                };
                std::array::from_fn(|i| Cubic::uniform(p0[i], p1[i], p2[i], p3[i], tension))
            }
        };

        Vector3::new(
            cubics[0].eval(weight),
            cubics[1].eval(weight),
            cubics[2].eval(weight),
        )
    }

    /// Fill `out` with `count` points at evenly spaced parameters, both ends included.
    pub fn sample_into<T, F>(&self, out: &mut Vec<T>, count: usize, mut convert: F)
    where
        F: FnMut(Vector3<f64>) -> T,
    {
        out.clear();
        match count {
            0 => {}
            1 => out.push(convert(self.point_at(0.0))),
            n => {
                for i in 0..n {
                    let t = i as f64 / (n - 1) as f64;
                    out.push(convert(self.point_at(t)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(curve_type: CurveType) -> CatmullRomCurve {
        let mut c = CatmullRomCurve::new(curve_type);
        c.points = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 2.0, 0.0),
            Vector3::new(3.0, 2.5, 0.0),
            Vector3::new(3.2, 0.0, 1.0),
        ];
        c
    }

    #[test]
    fn test_interpolates_control_points() {
        for ty in [
            CurveType::Centripetal,
            CurveType::Chordal,
            CurveType::Uniform { tension: 0.5 },
        ] {
            let c = curve(ty);
            for (i, p) in c.points.iter().enumerate() {
                let t = i as f64 / 3.0;
                let q = c.point_at(t);
                assert!((q - p).norm() < 1e-9, "{:?} t={} got {:?}", ty, t, q);
            }
        }
    }

    #[test]
    fn test_collinear_points_stay_on_line() {
        let mut c = CatmullRomCurve::new(CurveType::Centripetal);
        c.points = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.2, 0.0, 0.0),
            Vector3::new(1.5, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
        ];
        for i in 0..=20 {
            let p = c.point_at(i as f64 / 20.0);
            assert!(p.y.abs() < 1e-12 && p.z.abs() < 1e-12);
        }
    }

    #[test]
    fn test_coincident_points_are_finite() {
        let mut c = CatmullRomCurve::new(CurveType::Chordal);
        c.points = [Vector3::new(1.0, 1.0, 1.0); CONTROL_POINTS];
        for i in 0..=10 {
            let p = c.point_at(i as f64 / 10.0);
            assert!(p.iter().all(|v| v.is_finite()));
            assert!((p - Vector3::new(1.0, 1.0, 1.0)).norm() < 1e-12);
        }
    }

    #[test]
    fn test_sample_into_counts_and_endpoints() {
        let c = curve(CurveType::Chordal);
        let mut out = Vec::new();
        c.sample_into(&mut out, 32, |v| v);
        assert_eq!(out.len(), 32);
        assert!((out[0] - c.points[0]).norm() < 1e-9);
        assert!((out[31] - c.points[3]).norm() < 1e-9);

        c.sample_into(&mut out, 1, |v| v);
        assert_eq!(out.len(), 1);
        c.sample_into(&mut out, 0, |v| v);
        assert!(out.is_empty());
    }

    #[test]
    fn test_parametrizations_differ_on_uneven_spacing() {
        let centripetal = curve(CurveType::Centripetal);
        let uniform = curve(CurveType::Uniform { tension: 0.5 });
        // Both pass through the control points but bend differently in between
        let t = 1.0 / 3.0;
        assert!((centripetal.point_at(t) - uniform.point_at(t)).norm() < 1e-9);
        assert!((centripetal.point_at(0.5) - uniform.point_at(0.5)).norm() > 1e-6);
    }

    #[test]
    fn test_curve_type_names() {
        assert_eq!(CurveType::from_name("Chordal"), Some(CurveType::Chordal));
        assert_eq!(CurveType::from_name(" centripetal "), Some(CurveType::Centripetal));
        assert_eq!(
            CurveType::from_name("catmullrom"),
            Some(CurveType::Uniform { tension: 0.5 })
        );
        assert_eq!(CurveType::from_name("bezier"), None);
    }
}
