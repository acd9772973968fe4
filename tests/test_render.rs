use std::path::PathBuf;

use haikumug::constants::{COLUMN_HEIGHT, COLUMN_WIDTH};
use haikumug::error::HaikuError;
use haikumug::render::{MugRenderer, RenderRequest, SerifFont};
use image::{Rgba, RgbaImage};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn serif() -> SerifFont {
    SerifFont::from_path(&fixture("DejaVuSerif.ttf")).expect("load fixture font")
}

/// Rows and columns with any coverage, as (min_x, max_x, rows).
fn inked(column: &RgbaImage) -> (u32, u32, Vec<u32>) {
    let mut min_x = u32::MAX;
    let mut max_x = 0;
    let mut rows = Vec::new();
    for (x, y, pixel) in column.enumerate_pixels() {
        if pixel.0[3] > 0 {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            if rows.last() != Some(&y) {
                rows.push(y);
            }
        }
    }
    (min_x, max_x, rows)
}

#[test]
fn serif_glyphs_stack_on_fixed_baselines() {
    let renderer = MugRenderer::new(serif());
    let column = renderer.draw_column("HHH");
    assert_eq!(column.dimensions(), (COLUMN_WIDTH, COLUMN_HEIGHT));

    let (min_x, max_x, rows) = inked(&column);
    assert!(!rows.is_empty(), "nothing was drawn");
    // centered around x = 25
    let middle = (min_x + max_x) as f32 / 2.0;
    assert!((middle - 25.0).abs() <= 2.0, "glyphs span {min_x}..={max_x}");

    // each capital H sits on its baseline: 30, 56 and 82
    for baseline in [30, 56, 82] {
        assert!(
            rows.iter().any(|row| (baseline - 12..baseline).contains(row)),
            "no ink just above baseline {baseline}"
        );
    }
    assert!(rows.iter().all(|row| *row < 84), "ink below the third row");
    // the glyphs are white
    assert!(
        column
            .pixels()
            .filter(|pixel| pixel.0[3] == 255)
            .all(|pixel| pixel.0[..3] == [255, 255, 255])
    );
}

#[test]
fn serif_rendering_is_deterministic() {
    let renderer = MugRenderer::new(serif());
    let lines = ["Old".to_string(), "pond".to_string(), "frog".to_string()];
    let background = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
    let request = RenderRequest {
        lines: &lines,
        background: &background,
    };

    let mut first = RgbaImage::new(500, 500);
    renderer.render(&mut first, &request);
    let mut second = RgbaImage::new(500, 500);
    renderer.render(&mut second, &request);

    assert_eq!(first, second);
    assert!(first.pixels().any(|pixel| pixel.0[0] > 128));
}

#[test]
fn unusable_fonts_are_configuration_errors() {
    let err = SerifFont::from_bytes(b"not a font".to_vec())
        .err()
        .expect("garbage should not parse");
    assert!(matches!(err, HaikuError::Configuration(_)));

    let err = SerifFont::from_path(&fixture("missing.ttf"))
        .err()
        .expect("missing file");
    assert!(matches!(err, HaikuError::Configuration(_)));
}
