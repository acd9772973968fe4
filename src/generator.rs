//! Retrying haiku generator.

use tracing::{debug, info, instrument, warn};

use crate::constants::MAX_ATTEMPTS;
use crate::error::HaikuError;
use crate::haiku::{HaikuResult, RawHaiku, ShapeViolation};
use crate::openai::TextModel;

/// Why an attempt was thrown away.
enum Rejected {
    Malformed(String),
    Shape(ShapeViolation),
}

/// Turns text into a validated haiku, asking the model again when it miscounts.
#[derive(Debug)]
pub struct HaikuGenerator<M> {
    model: M,
}

impl<M: TextModel> HaikuGenerator<M> {
    /// Wraps a configured model.
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// The backend this generator calls.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Generates a 5-7-5 haiku about `text`.
    ///
    /// At most [`MAX_ATTEMPTS`] upstream calls are made. Malformed or miscounted
    /// output is retried straight away; configuration, transport and upstream
    /// status errors end the attempt loop immediately.
    #[instrument(level = "debug", skip(self))]
    pub async fn generate(&self, text: &str) -> Result<HaikuResult, HaikuError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(HaikuError::BadRequest("Text is required".to_string()));
        }

        let mut last = None;
        for attempt in 1..=MAX_ATTEMPTS {
            debug!("Haiku attempt {}/{}", attempt, MAX_ATTEMPTS);
            let rejected = match self.model.request_haiku(text).await {
                Ok(payload) => match RawHaiku::from_payload(&payload) {
                    Ok(raw) => match raw.validate() {
                        Ok(haiku) => {
                            info!("Generated haiku on attempt {}", attempt);
                            return Ok(haiku);
                        }
                        Err(violation) => Rejected::Shape(violation),
                    },
                    Err(err) => Rejected::Malformed(format!("Invalid JSON in model output: {err}")),
                },
                Err(HaikuError::MalformedResponse(message)) => Rejected::Malformed(message),
                Err(err) => return Err(err),
            };
            match &rejected {
                Rejected::Shape(violation) => {
                    warn!("Attempt {} broke the 5-7-5 pattern: {}", attempt, violation)
                }
                Rejected::Malformed(message) => {
                    warn!("Attempt {} returned unusable output: {}", attempt, message)
                }
            }
            last = Some(rejected);
        }

        Err(match last {
            Some(Rejected::Malformed(message)) => HaikuError::MalformedResponse(message),
            _ => HaikuError::ValidationExhausted {
                attempts: MAX_ATTEMPTS,
            },
        })
    }
}
