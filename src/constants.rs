//! Shared constants for generation limits and mug layout.
//!

use std::sync::LazyLock;

/// Longest input text, in characters, passed on to the generator.
pub const MAX_INPUT_CHARS: usize = 200;

/// Upper bound on upstream calls for a single haiku.
pub const MAX_ATTEMPTS: usize = 3;

/// Required character count of each Japanese line.
pub const HAIKU_LINE_LENGTHS: [usize; 3] = [5, 7, 5];

/// Model used when `OPENAI_MODEL` isn't set.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Base URL of the OpenAI REST API.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Sampling temperature for haiku requests.
pub const TEMPERATURE: f32 = 0.8;

/// Output token cap for haiku requests.
pub const MAX_OUTPUT_TOKENS: u32 = 300;

/// Output token cap for the connectivity probe.
pub const PROBE_MAX_OUTPUT_TOKENS: u32 = 8;

/// Timeout (in seconds) for a single upstream request.
pub const UPSTREAM_TIMEOUT_SECONDS: u64 = 60;

/// Width of the mug canvas.
pub const CANVAS_WIDTH: u32 = 500;

/// Height of the mug canvas.
pub const CANVAS_HEIGHT: u32 = 500;

/// Width of the offscreen buffer holding one column of characters.
pub const COLUMN_WIDTH: u32 = 50;

/// Height of the offscreen buffer holding one column of characters.
pub const COLUMN_HEIGHT: u32 = 200;

/// Glyph size, in pixels.
pub const FONT_SIZE_PX: f32 = 24.0;

/// Baseline of the first character in a column.
pub const FIRST_BASELINE: f32 = 30.0;

/// Distance between consecutive baselines in a column.
pub const ROW_STEP: f32 = 26.0;

/// Column anchors, relative to the horizontal center of the canvas.
pub const COLUMN_OFFSETS: [f32; 3] = [-5.0, 35.0, 75.0];

/// Horizontal scale applied to each column when compositing.
pub const COLUMN_SCALES: [f32; 3] = [0.95, 1.0, 0.95];

/// Request body cap for the HTTP surface.
pub const MAX_REQUEST_BYTES: usize = 16 * 1024;

/// Max age (in seconds) for the background image.
pub const BACKGROUND_CACHE_MAX_AGE_SECONDS: u64 = 60 * 60;

/// Stale-while-revalidate window (in seconds) for the background image.
pub const BACKGROUND_CACHE_STALE_WHILE_REVALIDATE_SECONDS: u64 = 60 * 60 * 24;

/// Cache-Control value for the background image.
pub static BACKGROUND_CACHE_CONTROL: LazyLock<String> = LazyLock::new(|| {
    format!(
        "public, max-age={}, stale-while-revalidate={}",
        BACKGROUND_CACHE_MAX_AGE_SECONDS, BACKGROUND_CACHE_STALE_WHILE_REVALIDATE_SECONDS
    )
});
