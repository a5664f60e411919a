use super::parse::{parse_questions, parse_topics};
use super::prompt::{
    image_prompt, question_schema, questions_prompt, theory_prompt, topics_prompt,
    topics_schema, SYSTEM_INSTRUCTION,
};
use super::retry::{with_retry, CallState, RetryPolicy, Sleeper, ThreadSleeper};
use super::transport::{GenerateRequest, HttpTransport, Part, Transport};
use super::GenerationError;
use crate::model::{AppConfig, Question, DEFAULT_MODEL};
use log::{debug, error, info};
use std::fs;
use std::path::Path;

pub const FALLBACK_TOPICS: [&str; 3] = ["Lý thuyết chung", "Bài tập tính toán", "Bài tập vận dụng"];
const THEORY_PLACEHOLDER: &str = "Không thể tạo tóm tắt lý thuyết.";
const JPEG_MIME: &str = "image/jpeg";

const QUESTIONS_TEMPERATURE: f32 = 0.7;
const IMAGE_TEMPERATURE: f32 = 0.6;
const SUMMARY_TEMPERATURE: f32 = 0.5;

/// A source image for remix generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImageInput {
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self {
            mime_type: JPEG_MIME.to_string(),
            data,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, GenerationError> {
        let is_jpeg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
        if !is_jpeg {
            return Err(GenerationError::UnsupportedImage(path.display().to_string()));
        }
        let data = fs::read(path).map_err(|source| GenerationError::ImageRead {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::jpeg(data))
    }
}

fn log_state(state: &CallState) {
    debug!("generation call: {:?}", state);
}

pub struct GenerationClient<T: Transport = HttpTransport> {
    transport: T,
    retry: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
    observer: Box<dyn Fn(&CallState)>,
}

impl GenerationClient<HttpTransport> {
    pub fn from_env() -> Self {
        Self::new(HttpTransport::new())
    }
}

impl<T: Transport> GenerationClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
            sleeper: Box::new(ThreadSleeper),
            observer: Box::new(log_state),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// Called on every state change of a generation call.
    pub fn on_state(mut self, observer: impl Fn(&CallState) + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    fn send(&self, request: &GenerateRequest) -> Result<String, GenerationError> {
        with_retry(&self.retry, self.sleeper.as_ref(), self.observer.as_ref(), || {
            self.transport.generate(request)
        })
    }

    fn questions_request(&self, request: GenerateRequest) -> Result<Vec<Question>, GenerationError> {
        let text = self.send(&request)?;
        let questions = parse_questions(&text, &mut rand::thread_rng())?;
        info!("generated {} questions with {}", questions.len(), request.model);
        Ok(questions)
    }

    /// Generates a question set for a curriculum configuration.
    pub fn generate_questions(&self, config: &AppConfig) -> Result<Vec<Question>, GenerationError> {
        self.questions_request(GenerateRequest {
            model: config.model.clone(),
            parts: vec![Part::Text(questions_prompt(config))],
            system_instruction: Some(SYSTEM_INSTRUCTION.to_string()),
            response_schema: Some(question_schema()),
            temperature: QUESTIONS_TEMPERATURE,
        })
    }

    /// Generates problems analogous to the ones in `image`, with different numbers.
    pub fn generate_questions_from_image(
        &self,
        image: &ImageInput,
        quantity: u32,
    ) -> Result<Vec<Question>, GenerationError> {
        if image.data.is_empty() {
            return Err(GenerationError::MissingImage);
        }
        self.questions_request(GenerateRequest {
            model: DEFAULT_MODEL.to_string(),
            parts: vec![
                Part::InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                },
                Part::Text(image_prompt(quantity)),
            ],
            system_instruction: Some(SYSTEM_INSTRUCTION.to_string()),
            response_schema: Some(question_schema()),
            temperature: IMAGE_TEMPERATURE,
        })
    }

    /// Theory summary for a lesson, as markup with `<math>` formulas.
    pub fn theory_summary(&self, grade: &str, lesson: &str) -> Result<String, GenerationError> {
        let request = GenerateRequest::text(DEFAULT_MODEL, theory_prompt(grade, lesson), SUMMARY_TEMPERATURE);
        let text = self.send(&request)?;
        if text.trim().is_empty() {
            return Ok(THEORY_PLACEHOLDER.to_string());
        }
        Ok(text)
    }

    /// Key topics of a lesson. Only a missing key is an error; other failures fall
    /// back to a generic topic list.
    pub fn lesson_topics(&self, grade: &str, lesson: &str) -> Result<Vec<String>, GenerationError> {
        let mut request =
            GenerateRequest::text(DEFAULT_MODEL, topics_prompt(grade, lesson), SUMMARY_TEMPERATURE);
        request.response_schema = Some(topics_schema());

        match self.send(&request) {
            Ok(text) if text.trim().is_empty() => Ok(Vec::new()),
            Ok(text) => Ok(parse_topics(&text)),
            Err(GenerationError::MissingApiKey) => Err(GenerationError::MissingApiKey),
            Err(e) => {
                error!("error fetching topics: {}", e);
                Ok(FALLBACK_TOPICS.iter().map(|t| t.to_string()).collect())
            }
        }
    }
}
