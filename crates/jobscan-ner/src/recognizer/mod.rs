//! Recognizer implementations.

pub mod pattern;

use std::sync::Arc;

use tracing::debug;

use crate::{EntitySpan, NerError, Result};
use pattern::PatternRecognizer;

/// Trait for named-entity recognizers.
///
/// This trait abstracts over statistical models, remote services and
/// rule-based stand-ins, so the extraction pipeline can run the same
/// merge and scoring logic regardless of where spans come from.
pub trait EntityRecognizer: Send + Sync {
    /// Name of the model or service backing this recognizer.
    fn name(&self) -> &str;

    /// Label spans in `text`.
    ///
    /// Offsets are byte offsets into `text`. Errors other than
    /// [`NerError::Unavailable`] are treated as failures on this input only.
    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>>;
}

/// Model names served by the built-in pattern recognizer.
const PATTERN_MODELS: &[&str] = &[
    "pattern",
    "patterns",
    "en_core_web_sm",
    "en_core_web_md",
    "en_core_web_lg",
];

/// Resolve a configured model name to a recognizer.
///
/// Statistical model names fall back to the pattern recognizer since no
/// model weights ship with this crate. `custom_entities` toggles the
/// job-specific skill-context capture. `"none"`, `"disabled"` and unknown
/// names are reported as [`NerError::Unavailable`].
pub fn create_recognizer(
    model_name: &str,
    custom_entities: bool,
) -> Result<Arc<dyn EntityRecognizer>> {
    let name = model_name.trim().to_lowercase();

    match name.as_str() {
        "" | "none" | "disabled" => Err(NerError::Unavailable(
            "recognition disabled by configuration".to_string(),
        )),
        n if PATTERN_MODELS.contains(&n) => {
            debug!("Resolved NER model '{}' to the token pattern recognizer", model_name);
            Ok(Arc::new(
                PatternRecognizer::new()
                    .with_name(n)
                    .with_contextual_skills(custom_entities),
            ))
        }
        _ => Err(NerError::Unavailable(format!("unknown model: {}", model_name))),
    }
}
