//! Application session state and the transitions that change it.

use crate::model::{AppConfig, Question, SavedExam};
use crate::presentation::PresentationSession;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Home,
    Presentation,
    Export,
    Simulation,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InputMethod {
    #[default]
    Manual,
    Image,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AppState {
    pub mode: AppMode,
    pub input: InputMethod,
    pub config: AppConfig,
    pub questions: Vec<Question>,
    pub presentation: PresentationSession,
    pub available_topics: Vec<String>,
    /// ticket of the newest topic analysis; older responses are dropped
    pub topics_request: u64,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetConfig(AppConfig),
    SetInput(InputMethod),
    SetMode(AppMode),
    /// a new topic analysis was started for the current grade and lesson
    TopicsRequested,
    TopicsLoaded { request: u64, topics: Vec<String> },
    GenerationStarted,
    GenerationSucceeded(Vec<Question>),
    GenerationFailed(String),
    LoadExam(SavedExam),
    SelectOption(String),
    SubmitAnswer,
    NextSlide,
    PreviousSlide,
    Reset,
}

/// Applies one action, returning the next state.
pub fn reduce(mut state: AppState, action: Action) -> AppState {
    match action {
        Action::SetConfig(config) => state.config = config,
        Action::SetInput(input) => state.input = input,
        Action::SetMode(mode) => state.mode = mode,
        Action::TopicsRequested => {
            state.topics_request += 1;
            state.available_topics.clear();
            state.config.topics.clear();
        }
        Action::TopicsLoaded { request, topics } => {
            if request == state.topics_request {
                state.config.topics = topics.clone();
                state.available_topics = topics;
            }
        }
        Action::GenerationStarted => {
            state.loading = true;
            state.error = None;
        }
        Action::GenerationSucceeded(questions) => {
            state.loading = false;
            state.questions = questions;
            state.presentation = PresentationSession::new();
            state.mode = AppMode::Presentation;
        }
        Action::GenerationFailed(message) => {
            state.loading = false;
            state.error = Some(message);
        }
        Action::LoadExam(exam) => {
            state.questions = exam.questions;
            state.config = exam.config;
            state.presentation = PresentationSession::new();
            state.mode = AppMode::Presentation;
        }
        Action::SelectOption(option_id) => state.presentation.select(&state.questions, &option_id),
        Action::SubmitAnswer => {
            state.presentation.submit(&state.questions);
        }
        Action::NextSlide => state.presentation.next(&state.questions),
        Action::PreviousSlide => state.presentation.previous(&state.questions),
        Action::Reset => return AppState::default(),
    }
    state
}
