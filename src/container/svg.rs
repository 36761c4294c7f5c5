//! SVG rasterization
//!
//! Vector input is rendered to a PNG in memory and then decoded like any
//! other raster, so SVG paths flow through the same metadata scan and
//! report pipeline. The intrinsic size is probed from the markup (viewBox
//! first, else explicit width/height attributes); a caller-requested fit
//! scale multiplies it and is applied as a render transform. `.svgz` input
//! is gunzipped first.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use flate2::read::GzDecoder;
use once_cell::sync::Lazy;
use regex::Regex;
use resvg::tiny_skia;
use resvg::usvg::{self, fontdb};

use crate::container::{decode_bytes, LoadOptions, LoadedImage};
use crate::error::{InfoError, InfoResult};

static VIEWBOX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)viewbox\s*=\s*"([, 0-9.]+)""#).expect("valid regex"));
static WIDTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<svg [^>]*?width\s*=\s*"([0-9.]+)"[^>]*>"#).expect("valid regex"));
static HEIGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<svg [^>]*?height\s*=\s*"([0-9.]+)"[^>]*>"#).expect("valid regex"));

pub(crate) fn load(path: &Path, name: &str, options: &LoadOptions) -> InfoResult<LoadedImage> {
    let raw = std::fs::read(path)?;
    let data = if name.ends_with(".svgz") {
        let mut out = Vec::new();
        GzDecoder::new(raw.as_slice())
            .read_to_end(&mut out)
            .map_err(|err| InfoError::decode(path, format!("gunzip: {err}")))?;
        out
    } else {
        raw
    };

    let tree = usvg::Tree::from_data(&data, &tree_options())
        .map_err(|err| InfoError::decode(path, err.to_string()))?;
    let tree_size = tree.size();
    let text = String::from_utf8_lossy(&data);
    let (base_width, base_height) =
        intrinsic_size(&text).unwrap_or((tree_size.width(), tree_size.height()));
    let ratio = options.svg_scale.unwrap_or(1.0);
    let width = ((base_width * ratio).round() as u32).max(1);
    let height = ((base_height * ratio).round() as u32).max(1);

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| InfoError::decode(path, "cannot allocate raster surface"))?;
    let transform = tiny_skia::Transform::from_scale(
        width as f32 / tree_size.width(),
        height as f32 / tree_size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    let png = pixmap
        .encode_png()
        .map_err(|err| InfoError::decode(path, err.to_string()))?;

    let mut loaded = decode_bytes(&png, path)?;
    loaded.image.format = "SVG".to_string();
    loaded.image.mime = Some("image/svg+xml".to_string());
    Ok(loaded)
}

/// Probe the markup for an intrinsic size.
///
/// The last two viewBox values win when the attribute is present and sane;
/// explicit width/height attributes on the root tag are the fallback.
fn intrinsic_size(text: &str) -> Option<(f32, f32)> {
    if let Some(captures) = VIEWBOX.captures(text) {
        let numbers: Vec<f32> = captures[1]
            .split([',', ' '])
            .filter(|v| !v.is_empty())
            .filter_map(|v| v.parse().ok())
            .collect();
        if let [_, _, w, h] = numbers[..] {
            return Some((w.round(), h.round()));
        }
    }
    let width: f32 = WIDTH.captures(text)?[1].parse().ok()?;
    let height: f32 = HEIGHT.captures(text)?[1].parse().ok()?;
    Some((width.round(), height.round()))
}

fn tree_options() -> usvg::Options<'static> {
    static FONTS: Lazy<Arc<fontdb::Database>> = Lazy::new(|| {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        Arc::new(db)
    });
    usvg::Options {
        fontdb: FONTS.clone(),
        ..usvg::Options::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use pretty_assertions::assert_eq;

    const RED_RECT: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="3" height="2"><rect width="3" height="2" fill="#ff0000"/></svg>"##;

    #[test]
    fn viewbox_supplies_the_size() {
        assert_eq!(
            intrinsic_size(r#"<svg viewBox="0 0 300 150">"#),
            Some((300.0, 150.0))
        );
        assert_eq!(
            intrinsic_size(r#"<svg VIEWBOX="0,0,24,24">"#),
            Some((24.0, 24.0))
        );
        assert_eq!(
            intrinsic_size(r#"<svg viewBox="0 0 36.6 24.2">"#),
            Some((37.0, 24.0))
        );
    }

    #[test]
    fn width_and_height_attributes_are_the_fallback() {
        assert_eq!(
            intrinsic_size(r#"<svg width="64" height="32" xmlns="x">"#),
            Some((64.0, 32.0))
        );
        // A garbled viewBox falls through to the attributes.
        assert_eq!(
            intrinsic_size(r#"<svg viewBox="0 0 10" width="64" height="32">"#),
            Some((64.0, 32.0))
        );
    }

    #[test]
    fn viewbox_wins_over_attributes() {
        assert_eq!(
            intrinsic_size(r#"<svg viewBox="0 0 10 20" width="64" height="32">"#),
            Some((10.0, 20.0))
        );
    }

    #[test]
    fn sizeless_markup_probes_nothing() {
        assert_eq!(intrinsic_size(r#"<svg xmlns="x"><rect/></svg>"#), None);
        assert_eq!(intrinsic_size(r#"<svg width="64" xmlns="x">"#), None);
    }

    #[test]
    fn svg_rasterizes_at_intrinsic_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rect.svg");
        std::fs::write(&path, RED_RECT).unwrap();

        let loaded = load(&path, "rect.svg", &LoadOptions::default()).unwrap();
        assert_eq!(loaded.image.format, "SVG");
        assert_eq!(loaded.image.mime.as_deref(), Some("image/svg+xml"));
        assert_eq!(loaded.image.width, 3);
        assert_eq!(loaded.image.height, 2);
        assert_eq!(loaded.image.frame_count, 1);
    }

    #[test]
    fn fit_scale_multiplies_the_canvas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rect.svg");
        std::fs::write(&path, RED_RECT).unwrap();

        let loaded = load(&path, "rect.svg", &LoadOptions::default().fit_scale(2.0)).unwrap();
        assert_eq!(loaded.image.width, 6);
        assert_eq!(loaded.image.height, 4);
    }

    #[test]
    fn svgz_gunzips_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rect.svgz");
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(RED_RECT.as_bytes()).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let loaded = load(&path, "rect.svgz", &LoadOptions::default()).unwrap();
        assert_eq!(loaded.image.format, "SVG");
        assert_eq!(loaded.image.width, 3);
    }

    #[test]
    fn unparsable_markup_is_a_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.svg");
        std::fs::write(&path, "this is not svg markup").unwrap();

        let err = load(&path, "broken.svg", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, InfoError::DecodeFailure { .. }));
    }
}
