use crate::math::wrap_degrees;
use crate::types::{HorizontalSymmetry, PhotometricTable};

/// Two neighbouring grid indices and the blend weight between them.
/// `weight` is 0 at `lower` and 1 at `upper`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub lower: usize,
    pub upper: usize,
    pub weight: f32,
}

impl Bracket {
    pub fn exact(index: usize) -> Self {
        Self {
            lower: index,
            upper: index,
            weight: 0.0,
        }
    }

    /// Splits a fractional index into a bracket over `len` entries.
    /// Positions at or past the last index clamp to it.
    pub fn from_fractional(position: f32, len: usize) -> Self {
        let last = len.saturating_sub(1);
        if position.is_nan() || position <= 0.0 {
            return Self::exact(0);
        }
        let lower = position.floor() as usize;
        if lower >= last {
            return Self::exact(last);
        }
        Self {
            lower,
            upper: lower + 1,
            weight: position - lower as f32,
        }
    }

    pub fn fractional(&self) -> f32 {
        self.lower as f32 + self.weight
    }
}

/// Finds the bracket of `angle` in a strictly increasing array, clamping at
/// both ends. Spacing may be non-uniform.
pub fn locate(angles: &[f32], angle: f32) -> Bracket {
    let last = angles.len().saturating_sub(1);
    if angles.is_empty() || angle.is_nan() || angle <= angles[0] {
        return Bracket::exact(0);
    }
    if angle >= angles[last] {
        return Bracket::exact(last);
    }

    let upper = angles.partition_point(|&a| a <= angle);
    let lower = upper - 1;
    let span = angles[upper] - angles[lower];
    Bracket {
        lower,
        upper,
        weight: (angle - angles[lower]) / span,
    }
}

impl HorizontalSymmetry {
    /// Maps a query angle onto the stored horizontal range using the
    /// luminaire's symmetry.
    pub fn fold(self, angle: f32, stored: &[f32]) -> f32 {
        match self {
            HorizontalSymmetry::Rotational => stored.first().copied().unwrap_or(0.0),
            HorizontalSymmetry::Full => {
                if stored.first().is_some_and(|first| *first < 0.0) {
                    angle
                } else {
                    wrap_degrees(angle)
                }
            }
            HorizontalSymmetry::Bilateral => {
                let a = wrap_degrees(angle);
                if a > 180.0 { 360.0 - a } else { a }
            }
            HorizontalSymmetry::Quadrant => {
                let mut a = wrap_degrees(angle);
                if a > 180.0 {
                    a = 360.0 - a;
                }
                if a > 90.0 {
                    a = 180.0 - a;
                }
                a
            }
            HorizontalSymmetry::Irregular => wrap_degrees(angle),
        }
    }
}

/// Resolves a horizontal (longitude-like) angle against the table,
/// applying symmetry folding.
pub fn resolve_horizontal(table: &PhotometricTable, angle: f32) -> Bracket {
    let stored = table.horizontal_angles();
    locate(stored, table.symmetry().fold(angle, stored))
}

/// Resolves a vertical (latitude-like) angle. Out-of-range queries clamp to
/// the boundary row.
pub fn resolve_vertical(table: &PhotometricTable, angle: f32) -> Bracket {
    locate(table.vertical_angles(), angle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IesHeader, PhotometricType};
    use approx::assert_abs_diff_eq;

    fn quadrant_table() -> PhotometricTable {
        PhotometricTable::new(
            PhotometricType::TypeC,
            vec![0.0, 30.0, 90.0],
            vec![0.0, 10.0, 45.0, 90.0],
            vec![vec![1.0; 3], vec![2.0; 3], vec![3.0; 3], vec![4.0; 3]],
            IesHeader::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_locate_non_uniform() {
        let angles = [0.0, 10.0, 45.0, 90.0];
        let b = locate(&angles, 27.5);
        assert_eq!((b.lower, b.upper), (1, 2));
        assert_abs_diff_eq!(b.weight, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_locate_exact_node_has_zero_weight() {
        let angles = [0.0, 10.0, 45.0, 90.0];
        let b = locate(&angles, 45.0);
        assert_eq!(b.lower, 2);
        assert_eq!(b.weight, 0.0);
        assert_eq!(locate(&angles, 90.0), Bracket::exact(3));
    }

    #[test]
    fn test_quadrant_folding() {
        let t = quadrant_table();
        assert_eq!(resolve_horizontal(&t, 95.0), resolve_horizontal(&t, 85.0));
        assert_eq!(resolve_horizontal(&t, 270.0), resolve_horizontal(&t, 90.0));
        assert_eq!(resolve_horizontal(&t, -30.0), resolve_horizontal(&t, 30.0));
        assert_eq!(resolve_horizontal(&t, 190.0), resolve_horizontal(&t, 10.0));
    }

    #[test]
    fn test_bilateral_folding() {
        let stored = [0.0, 90.0, 180.0];
        let sym = HorizontalSymmetry::Bilateral;
        assert_abs_diff_eq!(sym.fold(200.0, &stored), 160.0, epsilon = 1e-4);
        assert_abs_diff_eq!(sym.fold(-20.0, &stored), 20.0, epsilon = 1e-4);
        assert_abs_diff_eq!(sym.fold(120.0, &stored), 120.0, epsilon = 1e-4);
    }

    #[test]
    fn test_full_range_wraps_but_signed_range_clamps() {
        assert_abs_diff_eq!(
            HorizontalSymmetry::Full.fold(-90.0, &[0.0, 180.0, 360.0]),
            270.0,
            epsilon = 1e-4
        );
        assert_eq!(HorizontalSymmetry::Full.fold(-45.0, &[-90.0, 0.0, 90.0]), -45.0);
    }

    #[test]
    fn test_rotational_always_index_zero() {
        let t = PhotometricTable::new(
            PhotometricType::TypeC,
            vec![0.0, 90.0],
            vec![0.0],
            vec![vec![5.0, 1.0]],
            IesHeader::default(),
        )
        .unwrap();
        for angle in [0.0, 33.0, 180.0, 359.0, -10.0] {
            assert_eq!(resolve_horizontal(&t, angle), Bracket::exact(0));
        }
    }

    #[test]
    fn test_vertical_clamps() {
        let t = quadrant_table();
        assert_eq!(resolve_vertical(&t, -15.0), Bracket::exact(0));
        assert_eq!(resolve_vertical(&t, 135.0), Bracket::exact(2));
    }

    #[test]
    fn test_from_fractional_clamps_to_last() {
        assert_eq!(Bracket::from_fractional(3.0, 4), Bracket::exact(3));
        assert_eq!(Bracket::from_fractional(7.2, 4), Bracket::exact(3));
        assert_eq!(Bracket::from_fractional(-1.0, 4), Bracket::exact(0));
        let b = Bracket::from_fractional(1.25, 4);
        assert_eq!((b.lower, b.upper), (1, 2));
        assert_abs_diff_eq!(b.fractional(), 1.25, epsilon = 1e-6);
    }
}
