use crate::error::{IesError, Result};
use crate::types::{IesHeader, PhotometricTable, PhotometricType, Tilt, TiltData, Units};
use log::{debug, warn};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static TILT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*TILT\s*=\s*(.*?)\s*$").expect("Invalid Regex")
});

static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\[([^\]]+)\]\s*(.*?)\s*$").expect("Invalid Regex")
});

/// Loads and parses an `.ies` file.
pub fn parse_file(path: &Path) -> Result<PhotometricTable> {
    if !path.exists() {
        return Err(IesError::FileNotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    debug!("Read {} bytes from {:?}", bytes.len(), path);
    parse_bytes(&bytes)
}

/// Legacy files are frequently Latin-1, so bytes are decoded lossily.
pub fn parse_bytes(bytes: &[u8]) -> Result<PhotometricTable> {
    parse_str(&String::from_utf8_lossy(bytes))
}

pub fn parse_str(text: &str) -> Result<PhotometricTable> {
    let mut lines = text.lines();
    let mut header = IesHeader::default();
    let mut last_keyword: Option<String> = None;
    let mut tilt_value = None;

    // == PHASE 1: HEADER (up to and including TILT=)
    for (line_no, line) in lines.by_ref().enumerate() {
        let line = line.trim_start_matches('\u{feff}');
        if let Some(caps) = TILT_RE.captures(line) {
            tilt_value = Some(caps[1].to_string());
            break;
        }

        if line_no == 0 && line.trim().to_ascii_uppercase().starts_with("IES") {
            header.version = Some(line.trim().to_string());
            continue;
        }

        if let Some(caps) = KEYWORD_RE.captures(line) {
            let name = caps[1].trim().to_ascii_uppercase();
            let value = caps[2].to_string();

            if name == "MORE" {
                if let Some(prev) = last_keyword.as_ref().and_then(|k| header.keywords.get_mut(k)) {
                    prev.push(' ');
                    prev.push_str(&value);
                    continue;
                }
            } else {
                header
                    .keywords
                    .entry(name.clone())
                    .and_modify(|existing| {
                        existing.push('\n');
                        existing.push_str(&value);
                    })
                    .or_insert(value);
                last_keyword = Some(name);
                continue;
            }
        }

        if !line.trim().is_empty() {
            header.header_lines.push(line.trim().to_string());
        }
    }

    let tilt_value = tilt_value.ok_or_else(|| IesError::Format("missing TILT= line".to_string()))?;
    debug!(
        "Header: version {:?}, {} keyword(s), TILT={}",
        header.version,
        header.keywords.len(),
        tilt_value
    );

    // == PHASE 2: NUMERIC BLOCK
    let mut tokens = Tokens::new(lines.flat_map(str::split_whitespace).collect());

    header.tilt = match tilt_value.to_ascii_uppercase().as_str() {
        "" => return Err(IesError::Format("empty TILT= value".to_string())),
        "NONE" => Tilt::None,
        "INCLUDE" => {
            let lamp_geometry = tokens.next_int("lamp-to-luminaire geometry")?;
            let count = tokens.next_count("number of tilt angles")?;
            Tilt::Include(TiltData {
                lamp_geometry,
                angles: tokens.take_f32s(count, "tilt angle")?,
                factors: tokens.take_f32s(count, "tilt multiplying factor")?,
            })
        }
        _ => Tilt::File(tilt_value.clone()),
    };

    header.lamp_count = tokens.next_int("number of lamps")?;
    header.lumens_per_lamp = tokens.next_f32("lumens per lamp")?;
    header.candela_multiplier = tokens.next_f32("candela multiplier")?;
    let vertical_count = tokens.next_count("number of vertical angles")?;
    let horizontal_count = tokens.next_count("number of horizontal angles")?;

    let type_code = tokens.next_int("photometric type")?;
    let photometric_type = PhotometricType::from_code(type_code).unwrap_or_else(|| {
        warn!("Unknown photometric type code {}, assuming Type C", type_code);
        PhotometricType::TypeC
    });

    let units_code = tokens.next_int("units type")?;
    header.units = Units::from_code(units_code)
        .ok_or_else(|| IesError::Format(format!("unknown units type {}", units_code)))?;
    header.dimensions = [
        tokens.next_f32("luminous width")?,
        tokens.next_f32("luminous length")?,
        tokens.next_f32("luminous height")?,
    ];

    header.ballast_factor = tokens.next_f32("ballast factor")?;
    header.ballast_lamp_factor = tokens.next_f32("ballast-lamp photometric factor")?;
    header.input_watts = tokens.next_f32("input watts")?;

    // == PHASE 3: ANGLES & CANDELA GRID
    let vertical_angles = tokens.take_f32s(vertical_count, "vertical angle")?;
    let horizontal_angles = tokens.take_f32s(horizontal_count, "horizontal angle")?;

    let multiplier = header.candela_multiplier;
    let mut rows = Vec::with_capacity(horizontal_count);
    for _ in 0..horizontal_count {
        let row = tokens.take_f32s(vertical_count, "candela value")?;
        rows.push(row.into_iter().map(|c| c * multiplier).collect());
    }
    tokens.finish()?;

    let table =
        PhotometricTable::new(photometric_type, vertical_angles, horizontal_angles, rows, header)?;
    debug!(
        "Parsed {} table: {}x{} grid, {:?} symmetry, max {:.1} cd",
        table.photometric_type().label(),
        vertical_count,
        horizontal_count,
        table.symmetry(),
        table.max_candela()
    );
    Ok(table)
}

/// Whitespace-separated numeric tokens following the TILT line.
struct Tokens<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(tokens: Vec<&'a str>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn next_f32(&mut self, what: &str) -> Result<f32> {
        let token = self.tokens.get(self.pos).ok_or_else(|| {
            IesError::Format(format!("unexpected end of data while reading {}", what))
        })?;
        self.pos += 1;

        match token.parse::<f32>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(IesError::Format(format!(
                "expected a number for {} at token {}, found {:?}",
                what, self.pos, token
            ))),
        }
    }

    fn next_int(&mut self, what: &str) -> Result<i32> {
        let value = self.next_f32(what)?;
        if value.fract() != 0.0 || value.abs() > i32::MAX as f32 {
            return Err(IesError::Format(format!(
                "expected an integer for {}, found {}",
                what, value
            )));
        }
        Ok(value as i32)
    }

    fn next_count(&mut self, what: &str) -> Result<usize> {
        let value = self.next_int(what)?;
        if value < 1 {
            return Err(IesError::Format(format!("{} must be at least 1, found {}", what, value)));
        }
        Ok(value as usize)
    }

    fn take_f32s(&mut self, count: usize, what: &str) -> Result<Vec<f32>> {
        (0..count).map(|_| self.next_f32(what)).collect()
    }

    /// Fails if anything is left over after the candela grid.
    fn finish(self) -> Result<()> {
        let extra = self.tokens.len() - self.pos;
        if extra > 0 {
            return Err(IesError::Format(format!(
                "{} unexpected token(s) after candela data, starting with {:?}",
                extra, self.tokens[self.pos]
            )));
        }
        Ok(())
    }
}
