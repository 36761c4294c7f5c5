//! Integration tests for the metadata report
//!
//! Files are encoded with the `image` crate, written to a temp directory,
//! loaded through the public API and rendered to text. Assertions are
//! substring-based where external tooling (exiftool on PATH) could append
//! extra sections.

use std::path::Path;

use imagemeta::{build_report, load, LoadOptions, ReportRequest};

fn report_for(path: &Path) -> String {
    let loaded = load(path, &LoadOptions::default()).unwrap();
    build_report(&ReportRequest {
        image: Some(&loaded.image),
        meta: &loaded.meta,
        path,
    })
}

#[test]
fn plain_png_report() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flat.png");
    let img = image::RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3]));
    image::DynamicImage::ImageRgb8(img)
        .save_with_format(&path, image::ImageFormat::Png)
        .unwrap();

    let report = report_for(&path);
    assert!(report.starts_with("\nSize: "), "report was: {report}");
    assert!(report.contains("\nModified: "));
    assert!(report.contains("\nFrames: 1"));
    assert!(report.contains(
        "\nFormat: PNG\nMIME type: image/png\nBit Depth: 8\nColor Type: RGB\nColors: 1\nPixels: 4"
    ));
    // Nothing embedded, so no extractor sections.
    assert!(!report.contains("\n\nEXIF:"));
    assert!(!report.contains("\n\nICC Profile:"));
    assert!(!report.contains("\n\nIPTC:"));
    assert!(!report.contains("\n\nXMP:"));
    assert!(!report.contains("\n\nPhotoshop:"));
}

#[test]
fn animated_gif_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("anim.gif");
    let mut out = Vec::new();
    {
        let mut encoder = image::codecs::gif::GifEncoder::new(&mut out);
        encoder
            .set_repeat(image::codecs::gif::Repeat::Infinite)
            .unwrap();
        let frames = (0..2).map(|i| {
            image::Frame::from_parts(
                image::RgbaImage::from_pixel(1, 1, image::Rgba([i * 99, 50, 0, 255])),
                0,
                0,
                image::Delay::from_numer_denom_ms(100, 1),
            )
        });
        encoder.encode_frames(frames).unwrap();
    }
    std::fs::write(&path, out).unwrap();

    let report = report_for(&path);
    assert!(report.contains("\nFrames: 2"));
    assert!(report.contains("\nversion: b\"GIF89a\""));
    assert!(report.contains("\nloop: infinite"));
    assert!(report.contains("\nduration: 200"));
    assert!(report.contains("\nFormat: GIF\nMIME type: image/gif"));
}

#[test]
fn jpeg_report_basics() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shot.jpg");
    let img = image::RgbImage::from_pixel(3, 2, image::Rgb([200, 180, 160]));
    image::DynamicImage::ImageRgb8(img)
        .save_with_format(&path, image::ImageFormat::Jpeg)
        .unwrap();

    let report = report_for(&path);
    assert!(report.starts_with("\nSize: "));
    assert!(report.contains("\nFormat: JPEG\nMIME type: image/jpeg\nBit Depth: 8"));
    assert!(report.contains("\nPixels: 6"));
    // Plain JPEG tracks no frame count.
    assert!(!report.contains("\nFrames:"));
}

#[test]
fn zip_member_report_carries_container_stats() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("one.zip");
    let mut png = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image::RgbImage::new(1, 1))
        .write_to(&mut png, image::ImageFormat::Png)
        .unwrap();

    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer
        .start_file("inner.png", zip::write::SimpleFileOptions::default())
        .unwrap();
    std::io::Write::write_all(&mut writer, &png.into_inner()).unwrap();
    std::fs::write(&path, writer.finish().unwrap().into_inner()).unwrap();

    let report = report_for(&path);
    let zip_len = std::fs::metadata(&path).unwrap().len();
    assert!(report.starts_with(&format!("\nSize: {zip_len} B")));
    assert!(report.contains("\nFormat: PNG"));
}
