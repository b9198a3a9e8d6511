use crate::types::PhotometricType;

/// Maps interior texel indices onto the tangent plane at unit distance from
/// the light. The outer ring of texels has no plane coordinate.
#[derive(Debug, Clone, Copy)]
pub struct PlaneGrid {
    resolution: usize,
    limit_uv: f32,
    step_uv: f32,
}

impl PlaneGrid {
    /// `cone_angle` in degrees, `resolution >= 3` (checked by the caller).
    pub fn new(cone_angle: f32, resolution: usize) -> Self {
        let limit_uv = (cone_angle.to_radians() * 0.5).tan();
        // A 3x3 cookie has a single interior texel, which sits on the axis
        let step_uv = if resolution > 3 {
            2.0 * limit_uv / (resolution - 3) as f32
        } else {
            0.0
        };
        Self {
            resolution,
            limit_uv,
            step_uv,
        }
    }

    pub fn limit_uv(&self) -> f32 {
        self.limit_uv
    }

    /// Plane coordinate of texel row/column `index`, `None` on the border.
    pub fn coordinate(&self, index: usize) -> Option<f32> {
        if index == 0 || index + 1 >= self.resolution {
            return None;
        }
        if self.resolution == 3 {
            return Some(0.0);
        }
        Some((index - 1) as f32 * self.step_uv - self.limit_uv)
    }
}

/// Direction of a cookie texel in the luminaire's angular space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedAngles {
    /// Horizontal angle (Type C) or longitude (Types A/B), degrees.
    pub horizontal: f32,
    /// Vertical angle (Type C) or latitude (Types A/B), degrees.
    pub vertical: f32,
    /// Squared ray length to the plane point, or 1 when not applied.
    pub attenuation: f32,
}

impl PhotometricType {
    /// Gnomonic projection of plane point `(u, v)` for this photometric type.
    pub fn project(self, u: f32, v: f32, apply_attenuation: bool) -> ProjectedAngles {
        match self {
            PhotometricType::TypeC => project_type_c(u, v, apply_attenuation),
            PhotometricType::TypeA => project_type_a(u, v, apply_attenuation),
            // B is A turned 90 degrees about the optical axis
            PhotometricType::TypeB => project_type_a(v, u, apply_attenuation),
        }
    }
}

fn project_type_c(u: f32, v: f32, apply_attenuation: bool) -> ProjectedAngles {
    let uv_len_sq = u * u + v * v;
    let uv_len = uv_len_sq.sqrt();
    let horizontal = (v.atan2(u).to_degrees() - 90.0 + 360.0).rem_euclid(360.0);
    let vertical = uv_len.atan().to_degrees();
    ProjectedAngles {
        horizontal,
        vertical,
        attenuation: if apply_attenuation { uv_len_sq + 1.0 } else { 1.0 },
    }
}

fn project_type_a(u: f32, v: f32, apply_attenuation: bool) -> ProjectedAngles {
    let ray_len_sq = u * u + v * v + 1.0;
    let longitude = u.atan().to_degrees();
    let latitude = (v / ray_len_sq.sqrt()).asin().to_degrees();
    ProjectedAngles {
        horizontal: longitude,
        vertical: latitude,
        attenuation: if apply_attenuation { ray_len_sq } else { 1.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_plane_grid_spans_limit() {
        let grid = PlaneGrid::new(90.0, 5);
        assert_abs_diff_eq!(grid.limit_uv(), 1.0, epsilon = 1e-6);
        assert_eq!(grid.coordinate(0), None);
        assert_eq!(grid.coordinate(4), None);
        assert_abs_diff_eq!(grid.coordinate(1).unwrap(), -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(grid.coordinate(2).unwrap(), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(grid.coordinate(3).unwrap(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_plane_grid_single_interior_texel() {
        let grid = PlaneGrid::new(60.0, 3);
        assert_eq!(grid.coordinate(1), Some(0.0));
        assert_eq!(grid.coordinate(2), None);
    }

    #[test]
    fn test_type_c_axis_and_edges() {
        let nadir = PhotometricType::TypeC.project(0.0, 0.0, true);
        assert_eq!(nadir.vertical, 0.0);
        assert_eq!(nadir.attenuation, 1.0);

        let p = PhotometricType::TypeC.project(1.0, 0.0, true);
        assert_abs_diff_eq!(p.vertical, 45.0, epsilon = 1e-4);
        assert_abs_diff_eq!(p.horizontal, 270.0, epsilon = 1e-4);
        assert_abs_diff_eq!(p.attenuation, 2.0, epsilon = 1e-6);

        let p = PhotometricType::TypeC.project(0.0, -1.0, false);
        assert_abs_diff_eq!(p.horizontal, 180.0, epsilon = 1e-4);
        assert_eq!(p.attenuation, 1.0);

        let corner = PhotometricType::TypeC.project(1.0, 1.0, false);
        assert_abs_diff_eq!(corner.vertical, 2.0_f32.sqrt().atan().to_degrees(), epsilon = 1e-4);
    }

    #[test]
    fn test_type_a_longitude_latitude() {
        let p = PhotometricType::TypeA.project(1.0, 0.0, true);
        assert_abs_diff_eq!(p.horizontal, 45.0, epsilon = 1e-4);
        assert_abs_diff_eq!(p.vertical, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(p.attenuation, 2.0, epsilon = 1e-6);

        let p = PhotometricType::TypeA.project(0.0, -1.0, false);
        assert_abs_diff_eq!(p.horizontal, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(p.vertical, -45.0, epsilon = 1e-4);
    }

    #[test]
    fn test_type_b_swaps_u_and_v() {
        let (u, v) = (0.3, -0.7);
        let a = PhotometricType::TypeA.project(v, u, true);
        let b = PhotometricType::TypeB.project(u, v, true);
        assert_eq!(a, b);
    }
}
