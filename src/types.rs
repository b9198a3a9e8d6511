use crate::error::{IesError, Result};
use crate::math::approx_eq;
use derive_more::Deref;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Angles closer than this (degrees) are considered equal when classifying symmetry.
pub(crate) const ANGLE_EPSILON: f32 = 1e-3;

/// Photometric type, i.e. the angular convention of the file and the
/// orientation the luminaire was measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PhotometricType {
    /// Floodlight-style fixtures, polar axis horizontal.
    TypeA,
    /// Type A rotated 90 degrees about the optical axis.
    TypeB,
    /// Vertical polar axis: downlights, street lights, most interior fixtures.
    #[default]
    TypeC,
}

impl PhotometricType {
    /// LM-63 code: 1 = C, 2 = B, 3 = A.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(PhotometricType::TypeC),
            2 => Some(PhotometricType::TypeB),
            3 => Some(PhotometricType::TypeA),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PhotometricType::TypeA => "Type A",
            PhotometricType::TypeB => "Type B",
            PhotometricType::TypeC => "Type C",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Units {
    Feet,
    #[default]
    Meters,
}

impl Units {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Units::Feet),
            2 => Some(Units::Meters),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TiltData {
    pub lamp_geometry: i32,
    pub angles: Vec<f32>,
    pub factors: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum Tilt {
    #[default]
    None,
    /// Tilt table embedded after the `TILT=INCLUDE` line.
    Include(TiltData),
    /// Tilt table stored in a separate file. Never read.
    File(String),
}

/// Symmetry class implied by the stored horizontal angle range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HorizontalSymmetry {
    /// Single horizontal angle, intensity independent of it.
    Rotational,
    /// 0..90, symmetric in each quadrant.
    Quadrant,
    /// 0..180, symmetric about the 0-180 plane.
    Bilateral,
    /// 0..360, or a signed -90..90 range for types A/B.
    Full,
    Irregular,
}

impl HorizontalSymmetry {
    pub fn classify(horizontal_angles: &[f32]) -> Self {
        match horizontal_angles {
            [] | [_] => HorizontalSymmetry::Rotational,
            [first, .., last] => {
                if *first < -ANGLE_EPSILON {
                    HorizontalSymmetry::Full
                } else if approx_eq(*last, 90.0, ANGLE_EPSILON) {
                    HorizontalSymmetry::Quadrant
                } else if approx_eq(*last, 180.0, ANGLE_EPSILON) {
                    HorizontalSymmetry::Bilateral
                } else if approx_eq(*last, 360.0, ANGLE_EPSILON) {
                    HorizontalSymmetry::Full
                } else {
                    HorizontalSymmetry::Irregular
                }
            }
        }
    }
}

/// Everything in an IES file besides the angle grid itself.
#[derive(Debug, Clone, Serialize)]
pub struct IesHeader {
    /// `IESNA:LM-63-2002` and friends. `None` for 1986-style files.
    pub version: Option<String>,
    /// Upper-cased keyword name -> text. `[MORE]` lines are already merged.
    pub keywords: BTreeMap<String, String>,
    /// Header lines that are not `[KEYWORD]` lines.
    pub header_lines: Vec<String>,
    pub tilt: Tilt,
    pub lamp_count: i32,
    /// -1 for absolute photometry.
    pub lumens_per_lamp: f32,
    pub candela_multiplier: f32,
    pub units: Units,
    /// Luminous opening: width, length, height.
    pub dimensions: [f32; 3],
    pub ballast_factor: f32,
    pub ballast_lamp_factor: f32,
    pub input_watts: f32,
}

impl Default for IesHeader {
    fn default() -> Self {
        Self {
            version: None,
            keywords: BTreeMap::new(),
            header_lines: Vec::new(),
            tilt: Tilt::None,
            lamp_count: 1,
            lumens_per_lamp: -1.0,
            candela_multiplier: 1.0,
            units: Units::Meters,
            dimensions: [0.0; 3],
            ballast_factor: 1.0,
            ballast_lamp_factor: 1.0,
            input_watts: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensityUnit {
    Lumens,
    Candelas,
}

impl IntensityUnit {
    pub fn label(&self) -> &'static str {
        match self {
            IntensityUnit::Lumens => "Lumens",
            IntensityUnit::Candelas => "Candelas",
        }
    }
}

/// Parsed photometric web. Immutable once built, so it can be shared between
/// any number of concurrent cookie generations.
#[derive(Debug, Clone, Serialize)]
pub struct PhotometricTable {
    photometric_type: PhotometricType,
    vertical_angles: Vec<f32>,
    horizontal_angles: Vec<f32>,
    /// One row per horizontal angle, `vertical_angles.len()` values each.
    candela: Vec<f32>,
    symmetry: HorizontalSymmetry,
    total_lumens: f32,
    max_candela: f32,
    header: IesHeader,
}

impl PhotometricTable {
    /// Builds a table from `candela_rows[horizontal][vertical]` (file order).
    /// Candela values must already be scaled by the multiplier.
    pub fn new(
        photometric_type: PhotometricType,
        vertical_angles: Vec<f32>,
        horizontal_angles: Vec<f32>,
        candela_rows: Vec<Vec<f32>>,
        header: IesHeader,
    ) -> Result<Self> {
        let (vertical_range, horizontal_range) = match photometric_type {
            PhotometricType::TypeC => ((0.0, 180.0), (0.0, 360.0)),
            PhotometricType::TypeA | PhotometricType::TypeB => ((-90.0, 90.0), (-90.0, 90.0)),
        };
        validate_angles("vertical", &vertical_angles, vertical_range)?;
        validate_angles("horizontal", &horizontal_angles, horizontal_range)?;

        let starts_at_zero = horizontal_angles[0].abs() <= ANGLE_EPSILON;
        if photometric_type == PhotometricType::TypeC && !starts_at_zero {
            return Err(IesError::Format(format!(
                "Type C horizontal angles must start at 0, found {}",
                horizontal_angles[0]
            )));
        }

        if candela_rows.len() != horizontal_angles.len() {
            return Err(IesError::Format(format!(
                "Expected {} candela rows, got {}",
                horizontal_angles.len(),
                candela_rows.len()
            )));
        }

        let mut candela = Vec::with_capacity(horizontal_angles.len() * vertical_angles.len());
        for (h, row) in candela_rows.into_iter().enumerate() {
            if row.len() != vertical_angles.len() {
                return Err(IesError::Format(format!(
                    "Candela row {} has {} values, expected {}",
                    h,
                    row.len(),
                    vertical_angles.len()
                )));
            }
            if let Some(bad) = row.iter().find(|c| !c.is_finite() || **c < 0.0) {
                return Err(IesError::Format(format!("Invalid candela value {} in row {}", bad, h)));
            }
            candela.extend(row);
        }

        let max_candela = candela.iter().copied().fold(0.0_f32, f32::max);
        let lumens = header.lamp_count as f32 * header.lumens_per_lamp;
        let total_lumens = if lumens > 0.0 { lumens } else { -1.0 };
        let symmetry = HorizontalSymmetry::classify(&horizontal_angles);

        Ok(Self {
            photometric_type,
            vertical_angles,
            horizontal_angles,
            candela,
            symmetry,
            total_lumens,
            max_candela,
            header,
        })
    }

    pub fn photometric_type(&self) -> PhotometricType {
        self.photometric_type
    }

    pub fn vertical_angles(&self) -> &[f32] {
        &self.vertical_angles
    }

    pub fn horizontal_angles(&self) -> &[f32] {
        &self.horizontal_angles
    }

    pub fn symmetry(&self) -> HorizontalSymmetry {
        self.symmetry
    }

    /// Candela at a grid node.
    pub fn candela(&self, vertical_index: usize, horizontal_index: usize) -> f32 {
        self.candela[horizontal_index * self.vertical_angles.len() + vertical_index]
    }

    /// Total lamp lumens, or -1 for absolute photometry.
    pub fn total_lumens(&self) -> f32 {
        self.total_lumens
    }

    pub fn max_candela(&self) -> f32 {
        self.max_candela
    }

    pub fn is_absolute(&self) -> bool {
        self.total_lumens <= 0.0
    }

    pub fn header(&self) -> &IesHeader {
        &self.header
    }

    /// Keyword text (`MANUFAC`, `LUMCAT`, ...) or an empty string.
    pub fn keyword(&self, name: &str) -> &str {
        self.header
            .keywords
            .get(&name.to_ascii_uppercase())
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    pub fn manufacturer(&self) -> &str {
        self.keyword("MANUFAC")
    }

    pub fn luminaire_catalog(&self) -> &str {
        self.keyword("LUMCAT")
    }

    pub fn luminaire(&self) -> &str {
        self.keyword("LUMINAIRE")
    }

    pub fn lamp_catalog(&self) -> &str {
        self.keyword("LAMPCAT")
    }

    pub fn lamp(&self) -> &str {
        self.keyword("LAMP")
    }

    /// Lumens for relative photometry, peak candela for absolute photometry.
    pub fn max_intensity(&self) -> (f32, IntensityUnit) {
        if self.is_absolute() {
            (self.max_candela, IntensityUnit::Candelas)
        } else {
            (self.total_lumens, IntensityUnit::Lumens)
        }
    }
}

fn validate_angles(kind: &str, angles: &[f32], (min, max): (f32, f32)) -> Result<()> {
    if angles.is_empty() {
        return Err(IesError::Format(format!("No {} angles", kind)));
    }
    for (i, angle) in angles.iter().enumerate() {
        if !angle.is_finite() || *angle < min - ANGLE_EPSILON || *angle > max + ANGLE_EPSILON {
            return Err(IesError::Format(format!(
                "{} angle {} out of range [{}, {}]",
                kind, angle, min, max
            )));
        }
        if i > 0 && *angle <= angles[i - 1] {
            return Err(IesError::Format(format!(
                "{} angles are not strictly increasing ({} after {})",
                kind,
                angle,
                angles[i - 1]
            )));
        }
    }
    Ok(())
}

/// Which intensity a cookie pixel value of 255 corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Normalization {
    TotalLumens,
    MaxCandela,
}

/// Parameters of a single cookie generation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CookieSettings {
    /// Projection variant. Normally the table's own type.
    pub projection: PhotometricType,
    /// Cone angle in degrees, exclusive range (0, 180).
    pub cone_angle: f32,
    /// Texture is `resolution` x `resolution`, at least 3.
    pub resolution: usize,
    /// Divide by the squared ray length (inverse-square correction).
    pub apply_attenuation: bool,
    pub normalization: Normalization,
}

impl CookieSettings {
    pub const DEFAULT_CONE_ANGLE: f32 = 90.0;
    pub const DEFAULT_RESOLUTION: usize = 256;

    pub fn for_table(table: &PhotometricTable) -> Self {
        let normalization = match table.max_intensity().1 {
            IntensityUnit::Lumens => Normalization::TotalLumens,
            IntensityUnit::Candelas => Normalization::MaxCandela,
        };
        Self {
            projection: table.photometric_type(),
            cone_angle: Self::DEFAULT_CONE_ANGLE,
            resolution: Self::DEFAULT_RESOLUTION,
            apply_attenuation: false,
            normalization,
        }
    }
}

/// `--settings` JSON file. Missing fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CookieSettingsFile {
    pub projection: Option<PhotometricType>,
    pub cone_angle: Option<f32>,
    pub resolution: Option<usize>,
    pub apply_attenuation: Option<bool>,
    pub normalization: Option<Normalization>,
}

impl CookieSettingsFile {
    pub fn apply_to(&self, settings: &mut CookieSettings) {
        if let Some(projection) = self.projection {
            settings.projection = projection;
        }
        if let Some(cone_angle) = self.cone_angle {
            settings.cone_angle = cone_angle;
        }
        if let Some(resolution) = self.resolution {
            settings.resolution = resolution;
        }
        if let Some(apply_attenuation) = self.apply_attenuation {
            settings.apply_attenuation = apply_attenuation;
        }
        if let Some(normalization) = self.normalization {
            settings.normalization = normalization;
        }
    }
}

/// Square RGBA8 grayscale cookie. Derefs to the raw pixel bytes.
#[derive(Debug, Clone, PartialEq, Eq, Deref)]
pub struct CookieTexture {
    size: usize,
    #[deref]
    pixels: Vec<u8>,
}

impl CookieTexture {
    pub const CHANNELS: usize = 4;

    pub(crate) fn zeroed(size: usize) -> Self {
        Self {
            size,
            pixels: vec![0; size * size * Self::CHANNELS],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let idx = (y * self.size + x) * Self::CHANNELS;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Grayscale value; all four channels hold the same byte.
    pub fn luminance(&self, x: usize, y: usize) -> u8 {
        self.pixels[(y * self.size + x) * Self::CHANNELS]
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }
}
