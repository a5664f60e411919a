mod client;
mod parse;
mod prompt;
mod retry;
mod transport;

pub use client::{GenerationClient, ImageInput, FALLBACK_TOPICS};
pub use parse::{clean_json_text, parse_questions, parse_topics};
pub use prompt::{question_schema, SYSTEM_INSTRUCTION};
pub use retry::{with_retry, CallState, RetryPolicy, Sleeper, ThreadSleeper};
pub use transport::{GenerateRequest, HttpTransport, Part, Transport, API_KEY_VAR};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("GEMINI_API_KEY is missing, set it in the environment or in .env")]
    MissingApiKey,

    #[error("no image selected, pick an image before generating")]
    MissingImage,

    #[error("failed to read image {path}: {source}")]
    ImageRead {
        path: String,
        source: std::io::Error,
    },

    #[error("unsupported image '{0}', only JPEG images are accepted")]
    UnsupportedImage(String),

    #[error("Hệ thống AI đang quá tải (429). Vui lòng đợi khoảng 1 phút rồi thử lại.")]
    Overloaded,

    #[error("Gemini returned an error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("No data returned from AI")]
    EmptyResponse,

    #[error("Lỗi định dạng dữ liệu từ AI: {0}")]
    MalformedData(#[from] serde_json::Error),
}

impl GenerationError {
    fn status(&self) -> Option<u16> {
        match self {
            GenerationError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn message(&self) -> &str {
        match self {
            GenerationError::Api { message, .. } | GenerationError::Transport(message) => message,
            _ => "",
        }
    }

    /// Rate limit or temporary unavailability; worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self.status(), Some(429) | Some(503)) || self.message().contains("429")
    }

    /// Failures reported to the user as an overload once retries run out.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429) || self.message().contains("429") || self.message().contains("quota")
    }
}
