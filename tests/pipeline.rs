//! End-to-end tests: real `RustBackend`, synthetic images, results on disk.
//!
//! Run with: cargo test --test pipeline

use focal_crop::archive::{resolve_download, write_results};
use focal_crop::config::Settings;
use focal_crop::imaging::RustBackend;
use focal_crop::request::{RequestError, RequestOutcome, RequestParams, Upload, process_request};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use tempfile::TempDir;

const OUTPUTS: &str = r#"{
    "outputs": [
        {"width": 768, "height": 432, "format": "jpg", "quality": 70},
        {"width": 200, "height": 200, "format": "webp"},
        {
            "breakpoint": 120,
            "format": "png",
            "densities": {
                "1x": {"width": 120, "height": 160},
                "2x": {"width": 240, "height": 320}
            }
        }
    ]
}"#;

/// Grey canvas with a red block in the top-left corner.
fn marked_source(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if x < width / 5 && y < height / 5 {
            Rgb([255, 0, 0])
        } else {
            Rgb([128, 128, 128])
        }
    })
}

fn encode(img: RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

fn upload(name: &str, bytes: Vec<u8>) -> Upload {
    Upload {
        filename: name.to_string(),
        bytes,
    }
}

fn run(upload: &Upload, params: &RequestParams) -> Result<RequestOutcome, RequestError> {
    process_request(&RustBackend::new(), upload, params, &Settings::default(), None)
}

fn decoded(outcome: &RequestOutcome, path: &str) -> DynamicImage {
    let entry = outcome
        .entries
        .iter()
        .find(|e| e.relative_path == path)
        .unwrap_or_else(|| panic!("missing entry {path}"));
    image::load_from_memory(&entry.bytes).unwrap()
}

#[test]
fn every_artifact_has_exact_dimensions_and_format() {
    let upload = upload("hero.png", encode(marked_source(1000, 700), ImageFormat::Png));
    let outcome = run(&upload, &RequestParams::new(OUTPUTS)).unwrap();

    let expected = [
        ("hero_768x432.jpg", 768, 432, ImageFormat::Jpeg),
        ("hero_200x200.webp", 200, 200, ImageFormat::WebP),
        ("hero_120x160.png", 120, 160, ImageFormat::Png),
        ("hero_240x320.png", 240, 320, ImageFormat::Png),
    ];
    for (path, width, height, format) in expected {
        let entry = outcome.entries.iter().find(|e| e.relative_path == path).unwrap();
        assert_eq!(image::guess_format(&entry.bytes).unwrap(), format, "{path}");
        let img = decoded(&outcome, path);
        assert_eq!((img.width(), img.height()), (width, height), "{path}");
    }
    assert_eq!(outcome.entries.last().unwrap().relative_path, "hero.png");
    assert_eq!(outcome.entries.last().unwrap().bytes, upload.bytes);
}

#[test]
fn markup_references_generated_files() {
    let upload = upload("hero.png", encode(marked_source(1000, 700), ImageFormat::Png));
    let params = RequestParams {
        base_path: Some("/assets/".to_string()),
        ..RequestParams::new(OUTPUTS)
    };
    let outcome = run(&upload, &params).unwrap();
    let prefix = format!("/assets/{}", outcome.folder_name);

    let html = &outcome.html;
    let first = html.find("(min-width: 768px)").unwrap();
    let second = html.find("(min-width: 200px)").unwrap();
    let third = html.find("(min-width: 120px)").unwrap();
    assert!(first < second && second < third);
    assert!(html.contains(r#"type="image/jpeg""#));
    assert!(html.contains(&format!("{prefix}/hero_120x160.png 1x,\n")));
    assert!(html.contains(&format!(
        r#"<img src="{prefix}/hero_120x160.png" alt="hero" width="120" height="160" loading="lazy" decoding="async">"#
    )));
}

#[test]
fn focal_point_steers_the_crop() {
    let upload = upload("corner.png", encode(marked_source(800, 800), ImageFormat::Png));
    let outputs = r#"{"outputs": [{"width": 400, "height": 200, "format": "png"}]}"#;

    let top_left = RequestParams {
        focal_x: "0%".to_string(),
        focal_y: "0%".to_string(),
        ..RequestParams::new(outputs)
    };
    let img = decoded(&run(&upload, &top_left).unwrap(), "corner_400x200.png").to_rgb8();
    assert_eq!(img.get_pixel(10, 10).0, [255, 0, 0]);

    let bottom_right = RequestParams {
        focal_x: "100%".to_string(),
        focal_y: "100%".to_string(),
        ..RequestParams::new(outputs)
    };
    let img = decoded(&run(&upload, &bottom_right).unwrap(), "corner_400x200.png").to_rgb8();
    assert_eq!(img.get_pixel(10, 10).0, [128, 128, 128]);
}

#[test]
fn rerunning_a_request_is_deterministic() {
    let upload = upload("same.jpg", encode(marked_source(640, 480), ImageFormat::Jpeg));
    let a = run(&upload, &RequestParams::new(OUTPUTS)).unwrap();
    let b = run(&upload, &RequestParams::new(OUTPUTS)).unwrap();

    assert_eq!(a.folder_name, b.folder_name);
    assert_eq!(a.html, b.html);
    assert_eq!(a.entries, b.entries);
}

#[test]
fn avif_output_is_encoded() {
    let upload = upload("small.png", encode(marked_source(96, 64), ImageFormat::Png));
    let outputs = r#"{"outputs": [{"width": 48, "height": 48, "format": "avif", "quality": 60}]}"#;
    let outcome = run(&upload, &RequestParams::new(outputs)).unwrap();

    let entry = &outcome.entries[0];
    assert_eq!(entry.relative_path, "small_48x48.avif");
    assert_eq!(&entry.bytes[4..8], b"ftyp");
    assert!(outcome.html.contains(r#"type="image/avif""#));
}

#[test]
fn avif_upload_is_processed() {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(marked_source(320, 240))
        .write_with_encoder(image::codecs::avif::AvifEncoder::new_with_speed_quality(
            &mut bytes, 10, 90,
        ))
        .unwrap();
    let outcome = run(&upload("photo.avif", bytes.clone()), &RequestParams::new(OUTPUTS)).unwrap();

    assert_eq!(outcome.source.dimensions.width, 320);
    assert_eq!(outcome.source.dimensions.height, 240);
    assert_eq!(outcome.generated_count(), 4);
    let img = decoded(&outcome, "photo_768x432.jpg");
    assert_eq!((img.width(), img.height()), (768, 432));
    assert_eq!(outcome.entries.last().unwrap().relative_path, "photo.avif");
    assert_eq!(outcome.entries.last().unwrap().bytes, bytes);
}

#[test]
fn dotted_upload_names_survive_to_disk() {
    let tmp = TempDir::new().unwrap();
    let outputs = r#"{"outputs": [{"width": 20, "height": 20}]}"#;
    for name in ["summer..2024.png", ".hero.png"] {
        let upload = upload(name, encode(marked_source(40, 40), ImageFormat::Png));
        let outcome = run(&upload, &RequestParams::new(outputs)).unwrap();

        let folder = write_results(tmp.path(), &outcome).unwrap();

        let stem = name.trim_end_matches(".png");
        assert!(folder.join(format!("{stem}_20x20.jpg")).is_file(), "{name}");
        assert!(folder.join(name).is_file(), "{name}");
    }
}

#[test]
fn garbage_upload_is_rejected() {
    let result = run(&upload("notes.txt", b"plain text".to_vec()), &RequestParams::new(OUTPUTS));
    assert!(matches!(result, Err(RequestError::UnsupportedMime(_))));
}

#[test]
fn truncated_upload_fails_to_decode() {
    let bytes = encode(marked_source(300, 300), ImageFormat::Png);
    let truncated = bytes[..bytes.len() / 2].to_vec();
    let result = run(&upload("half.png", truncated), &RequestParams::new(OUTPUTS));
    assert!(matches!(result, Err(RequestError::DecodeFailure(_))));
}

#[test]
fn source_over_dimension_limit_is_rejected() {
    let mut settings = Settings::default();
    settings.limits.max_dimension = 256;
    let upload = upload("wide.png", encode(marked_source(300, 100), ImageFormat::Png));

    let params = RequestParams::new(OUTPUTS);
    let result = process_request(&RustBackend::new(), &upload, &params, &settings, None);
    assert!(matches!(
        result,
        Err(RequestError::OversizeSource {
            width: 300,
            height: 100,
            max: 256
        })
    ));
}

#[test]
fn results_folder_is_written_and_downloadable() {
    let tmp = TempDir::new().unwrap();
    let upload = upload("hero.jpg", encode(marked_source(500, 500), ImageFormat::Jpeg));
    let outcome = run(&upload, &RequestParams::new(OUTPUTS)).unwrap();

    let folder = write_results(tmp.path(), &outcome).unwrap();

    let mut written: Vec<String> = std::fs::read_dir(&folder)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    written.sort();
    assert_eq!(
        written,
        vec![
            "hero.jpg",
            "hero_120x160.png",
            "hero_200x200.webp",
            "hero_240x320.png",
            "hero_768x432.jpg",
        ]
    );
    assert_eq!(resolve_download(tmp.path(), &outcome.folder_name).unwrap(), folder);
}
