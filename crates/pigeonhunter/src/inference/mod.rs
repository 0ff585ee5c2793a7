//! Inference collaborators: translation decisions, deadline extraction and
//! calendar encoding, backed by an OpenAI-compatible chat API.

pub mod calendar;
pub mod deadlines;
pub mod error;
pub mod openai;
pub mod translator;
pub mod types;

pub use calendar::{encode_event, EncodeError};
pub use deadlines::{DeadlineExtractor, OpenAiDeadlineExtractor};
pub use error::InferenceError;
pub use openai::{ChatClient, ChatRequest};
pub use translator::{OpenAiTranslator, TranslationDecider};
pub use types::{Decision, EventCandidate};
