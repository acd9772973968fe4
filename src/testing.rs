//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use crate::error::HaikuError;
use crate::openai::{ProbeReply, TextModel};
use crate::render::GlyphFace;

pub(crate) fn valid_payload() -> String {
    json!({
        "ja": ["ふるいけや", "かわずとびこむ", "みずのおと"],
        "en": ["An old pond", "a frog jumps in", "the sound of water"]
    })
    .to_string()
}

pub(crate) fn invalid_payload() -> String {
    json!({
        "ja": ["朝の霜", "とても冷たい風吹く", "春が来る"],
        "en": ["Morning frost", "a very cold wind blows", "spring arrives"]
    })
    .to_string()
}

/// Replays canned upstream results in order and counts the calls made.
pub(crate) struct ScriptedModel {
    script: Mutex<VecDeque<Result<String, HaikuError>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    credential: bool,
}

impl ScriptedModel {
    pub(crate) fn new(script: Vec<Result<String, HaikuError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            credential: true,
        }
    }

    pub(crate) fn without_credential() -> Self {
        Self {
            credential: false,
            ..Self::new(Vec::new())
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Texts the generator asked about, in call order.
    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    fn next(&self, text: &str) -> Result<String, HaikuError> {
        if !self.credential {
            return Err(HaikuError::Configuration("Missing OpenAI API key".to_string()));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(text.to_string());
        }
        self.script
            .lock()
            .map_err(|err| HaikuError::InternalServerError(err.to_string()))?
            .pop_front()
            .unwrap_or_else(|| Err(HaikuError::Transport("script exhausted".to_string())))
    }
}

impl TextModel for ScriptedModel {
    async fn request_haiku(&self, text: &str) -> Result<String, HaikuError> {
        self.next(text)
    }

    async fn probe(&self) -> Result<ProbeReply, HaikuError> {
        if !self.credential {
            return Err(HaikuError::Configuration("Missing OpenAI API key".to_string()));
        }
        Ok(ProbeReply {
            status: 200,
            body: r#"{"output_text":"pong"}"#.to_string(),
        })
    }

    fn has_credential(&self) -> bool {
        self.credential
    }
}

/// Draws every character as a solid 10x12 block sitting on the baseline.
pub(crate) struct BlockFace;

pub(crate) const BLOCK_WIDTH: i32 = 10;
pub(crate) const BLOCK_HEIGHT: i32 = 12;

impl GlyphFace for BlockFace {
    fn advance(&self, _ch: char, _px: f32) -> f32 {
        BLOCK_WIDTH as f32
    }

    fn rasterize(
        &self,
        _ch: char,
        _px: f32,
        x: f32,
        baseline: f32,
        plot: &mut dyn FnMut(i32, i32, f32),
    ) {
        let left = x.round() as i32;
        let bottom = baseline.round() as i32;
        for py in (bottom - BLOCK_HEIGHT)..bottom {
            for px in left..(left + BLOCK_WIDTH) {
                plot(px, py, 1.0);
            }
        }
    }
}
