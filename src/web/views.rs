use askama::Template;
use askama_web::WebTemplate;
use axum::extract::Form;
use base64::Engine;
use base64::engine::general_purpose;

use super::prelude::*;
use crate::haiku::HaikuResult;

#[derive(Deserialize)]
pub(crate) struct GenerateForm {
    #[serde(default)]
    text: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub(crate) struct IndexTemplate {
    pub(crate) text: String,
    pub(crate) max_chars: usize,
    pub(crate) haiku: Option<HaikuResult>,
    pub(crate) mug_data_url: Option<String>,
    pub(crate) error: Option<String>,
}

impl IndexTemplate {
    fn new(text: String) -> Self {
        Self {
            text,
            max_chars: MAX_INPUT_CHARS,
            haiku: None,
            mug_data_url: None,
            error: None,
        }
    }
}

/// handles the / GET
pub(crate) async fn index_handler() -> IndexTemplate {
    IndexTemplate::new(String::new())
}

/// handles the / POST, generating and rendering in one go
pub(crate) async fn generate_form_handler<M: TextModel + 'static>(
    State(state): State<AppState<M>>,
    Form(form): Form<GenerateForm>,
) -> Response {
    let text = truncate_chars(form.text.trim(), MAX_INPUT_CHARS).to_string();
    let mut page = IndexTemplate::new(text);

    let outcome = state.haiku_mug(&page.text).await;
    match outcome {
        Ok((haiku, png)) => {
            page.mug_data_url = Some(format!(
                "data:image/png;base64,{}",
                general_purpose::STANDARD.encode(png)
            ));
            page.haiku = Some(haiku);
            page.into_response()
        }
        Err(err) => {
            let status = err.status_code();
            debug!("Form generation failed with {}: {}", status, err);
            page.error = Some(err.public_message());
            (status, page).into_response()
        }
    }
}
