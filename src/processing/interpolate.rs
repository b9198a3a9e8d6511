use crate::math::lerp;
use crate::processing::angles::{resolve_horizontal, resolve_vertical, Bracket};
use crate::types::PhotometricTable;

/// Bilinear candela lookup: blend horizontally on both bracketing vertical
/// rows, then blend those two results vertically.
pub fn interpolate(table: &PhotometricTable, horizontal: Bracket, vertical: Bracket) -> f32 {
    let row = |v: usize| {
        lerp(
            table.candela(v, horizontal.lower),
            table.candela(v, horizontal.upper),
            horizontal.weight,
        )
    };
    lerp(row(vertical.lower), row(vertical.upper), vertical.weight).max(0.0)
}

/// Same as [`interpolate`], taking fractional grid indices.
pub fn interpolate_fractional(table: &PhotometricTable, horizontal: f32, vertical: f32) -> f32 {
    interpolate(
        table,
        Bracket::from_fractional(horizontal, table.horizontal_angles().len()),
        Bracket::from_fractional(vertical, table.vertical_angles().len()),
    )
}

/// Candela in a given direction, in degrees.
pub fn sample(table: &PhotometricTable, horizontal_angle: f32, vertical_angle: f32) -> f32 {
    interpolate(
        table,
        resolve_horizontal(table, horizontal_angle),
        resolve_vertical(table, vertical_angle),
    )
}
