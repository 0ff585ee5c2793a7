use thiserror::Error;

/// Failure while handling one message. Never escapes the message boundary.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Mail transport failed: {0}")]
    Transport(#[from] crate::email::EmailError),

    #[error("Inference failed: {0}")]
    Inference(#[from] crate::inference::InferenceError),
}
