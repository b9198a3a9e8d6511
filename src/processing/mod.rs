use crate::error::{IesError, Result};
use crate::math::clamp_to_byte;
use crate::types::{
    CookieSettings, CookieTexture, Normalization, PhotometricTable, PhotometricType, Tilt,
    ANGLE_EPSILON,
};
use log::{debug, info, warn};
use projection::PlaneGrid;
use rayon::prelude::*;

pub mod angles;
pub mod interpolate;
pub mod projection;

/// Largest cookie a VTF header can describe.
pub const MAX_RESOLUTION: usize = u16::MAX as usize;

/// Projects the table's intensity distribution onto an N x N grayscale cookie.
///
/// Returns the non-fatal warnings raised along the way together with the
/// texture. Parameters are validated before anything is allocated.
pub fn generate_cookie(
    table: &PhotometricTable,
    settings: &CookieSettings,
) -> Result<(Vec<String>, CookieTexture)> {
    validate_settings(settings)?;

    let n = settings.resolution;
    let grid = PlaneGrid::new(settings.cone_angle, n);
    let mut warnings = Vec::new();

    info!(
        "Generating {}x{} cookie ({}, cone {}°, attenuation: {})",
        n,
        n,
        settings.projection.label(),
        settings.cone_angle,
        settings.apply_attenuation
    );

    if settings.projection != table.photometric_type() {
        warnings.push(format!(
            "Projecting a {} table as {}",
            table.photometric_type().label(),
            settings.projection.label()
        ));
    }
    if let Tilt::Include(tilt) = &table.header().tilt {
        warnings.push(format!(
            "Ignoring embedded tilt data ({} angles)",
            tilt.angles.len()
        ));
    }
    if let Some(w) = coverage_warning(table, settings.projection, &grid) {
        warnings.push(w);
    }

    let reference = reference_intensity(table, settings.normalization, &mut warnings);
    debug!("Reference intensity: {}", reference);

    let mut cookie = CookieTexture::zeroed(n);
    if reference > 0.0 {
        let row_len = n * CookieTexture::CHANNELS;
        let saturated: usize = cookie
            .pixels_mut()
            .par_chunks_mut(row_len)
            .enumerate()
            .map(|(y, row)| rasterize_row(table, settings, &grid, reference, y, row))
            .sum();

        if saturated > 0 {
            warnings.push(format!(
                "{} pixel(s) exceeded full brightness and were clamped",
                saturated
            ));
        }
    } else {
        warnings.push("Reference intensity is zero, cookie is black".to_string());
    }

    for w in &warnings {
        warn!("{}", w);
    }

    Ok((warnings, cookie))
}

fn validate_settings(settings: &CookieSettings) -> Result<()> {
    let cone = settings.cone_angle;
    if !cone.is_finite() || cone <= 0.0 || cone >= 180.0 {
        return Err(IesError::InvalidParameter(format!(
            "cone angle must be in (0, 180) degrees, got {}",
            settings.cone_angle
        )));
    }
    if settings.resolution < 3 || settings.resolution > MAX_RESOLUTION {
        return Err(IesError::InvalidParameter(format!(
            "resolution must be in 3..={}, got {}",
            MAX_RESOLUTION, settings.resolution
        )));
    }
    let buffer_len = settings
        .resolution
        .checked_mul(settings.resolution)
        .and_then(|p| p.checked_mul(CookieTexture::CHANNELS));
    if buffer_len.is_none() {
        return Err(IesError::InvalidParameter(format!(
            "resolution {} overflows the texture buffer size",
            settings.resolution
        )));
    }
    Ok(())
}

fn reference_intensity(
    table: &PhotometricTable,
    normalization: Normalization,
    warnings: &mut Vec<String>,
) -> f32 {
    match normalization {
        Normalization::MaxCandela => table.max_candela(),
        Normalization::TotalLumens if table.is_absolute() => {
            warnings.push(
                "Absolute photometry has no lumen rating, normalizing against maximum candela"
                    .to_string(),
            );
            table.max_candela()
        }
        Normalization::TotalLumens => table.total_lumens(),
    }
}

/// Warns when the cone reaches directions outside the measured vertical range.
fn coverage_warning(
    table: &PhotometricTable,
    projection: PhotometricType,
    grid: &PlaneGrid,
) -> Option<String> {
    let (needed_min, needed_max) = match projection {
        PhotometricType::TypeC => {
            let corner = grid.limit_uv() * std::f32::consts::SQRT_2;
            (0.0, corner.atan().to_degrees())
        }
        PhotometricType::TypeA | PhotometricType::TypeB => {
            let half = grid.limit_uv().atan().to_degrees();
            (-half, half)
        }
    };
    let stored = table.vertical_angles();
    let (first, last) = (stored[0], stored[stored.len() - 1]);

    if first > needed_min + ANGLE_EPSILON || last < needed_max - ANGLE_EPSILON {
        Some(format!(
            "Cone covers vertical angles {:.1}..{:.1} but the file only measures \
             {:.1}..{:.1}; edge values are clamped",
            needed_min, needed_max, first, last
        ))
    } else {
        None
    }
}

/// Fills one texel row. Returns the number of clamped texels.
fn rasterize_row(
    table: &PhotometricTable,
    settings: &CookieSettings,
    grid: &PlaneGrid,
    reference: f32,
    y: usize,
    row: &mut [u8],
) -> usize {
    let Some(v) = grid.coordinate(y) else {
        return 0;
    };

    let mut saturated = 0;
    for (x, texel) in row.chunks_exact_mut(CookieTexture::CHANNELS).enumerate() {
        let Some(u) = grid.coordinate(x) else {
            continue;
        };

        let dir = settings.projection.project(u, v, settings.apply_attenuation);
        let horizontal = angles::resolve_horizontal(table, dir.horizontal);
        let vertical = angles::resolve_vertical(table, dir.vertical);
        let candela = interpolate::interpolate(table, horizontal, vertical);

        let value = 255.0 * candela / (reference * dir.attenuation);
        if value.round() > 255.0 {
            saturated += 1;
        }
        texel.fill(clamp_to_byte(value));
    }
    saturated
}
