use crate::types::CookieTexture;
use anyhow::Context;
use log::debug;
use std::path::Path;

/// Writes the cookie as an uncompressed RGBA8888 VTF next to `output_path`.
pub fn generate_vtf(cookie: &CookieTexture, output_path: &Path) -> anyhow::Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let size = u16::try_from(cookie.size())
        .with_context(|| format!("Cookie size {} does not fit a VTF texture", cookie.size()))?;

    let vtf_path = output_path.with_extension("vtf");
    let params = crate::vtf_writer::VtfParams {
        width: size,
        height: size,
    };
    debug!("Writing {}x{} VTF to {:?}", size, size, vtf_path);

    crate::vtf_writer::write_rgba8888_vtf(&vtf_path, params, cookie)
}

/// Writes the cookie as a float RGBA OpenEXR image, each channel in 0..1.
pub fn generate_exr(cookie: &CookieTexture, output_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let size = cookie.size();
    debug!("Writing {}x{} EXR to {:?}", size, size, output_path);

    exr::prelude::write_rgba_file(output_path, size, size, |x, y| {
        let [r, g, b, a] = cookie.pixel(x, y);
        (
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    })
    .with_context(|| format!("Failed to write EXR file {:?}", output_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::generate_cookie;
    use crate::types::{CookieSettings, IesHeader, PhotometricTable, PhotometricType};
    use crate::vtf_writer::IMAGE_DATA_OFFSET;

    fn small_cookie() -> CookieTexture {
        let table = PhotometricTable::new(
            PhotometricType::TypeC,
            vec![0.0, 90.0],
            vec![0.0],
            vec![vec![100.0, 0.0]],
            IesHeader::default(),
        )
        .unwrap();
        let mut settings = CookieSettings::for_table(&table);
        settings.resolution = 8;
        generate_cookie(&table, &settings).unwrap().1
    }

    #[test]
    fn test_generate_vtf_forces_extension() {
        let cookie = small_cookie();

        let dir = std::env::temp_dir().join(format!("ies_cookie_gen_vtf_{}", std::process::id()));
        generate_vtf(&cookie, &dir.join("cookie.png")).unwrap();

        let bytes = std::fs::read(dir.join("cookie.vtf")).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
        assert_eq!(bytes.len(), IMAGE_DATA_OFFSET + 8 * 8 * 4);
        assert_eq!(&bytes[IMAGE_DATA_OFFSET..], &cookie[..]);
    }

    #[test]
    fn test_generate_exr_writes_file() {
        let cookie = small_cookie();

        let dir = std::env::temp_dir().join(format!("ies_cookie_gen_exr_{}", std::process::id()));
        let path = dir.join("nested").join("cookie.exr");
        generate_exr(&cookie, &path).unwrap();

        let len = std::fs::metadata(&path).map(|m| m.len());
        std::fs::remove_dir_all(&dir).unwrap();
        assert!(len.unwrap() > 0);
    }
}
