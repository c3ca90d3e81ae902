/// Core error type for the resurface framework.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("malformed procedure `{proc}`: {message}")]
    MalformedProc { proc: String, message: String },

    #[error("pass `{pass}` failed: {source}")]
    Pass {
        pass: String,
        #[source]
        source: Box<CoreError>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
