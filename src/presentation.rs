use crate::model::Question;
use std::collections::HashSet;

/// Slideshow practice over a question set: one answer per question, running score.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PresentationSession {
    pub current: usize,
    pub selected: Option<String>,
    pub show_explanation: bool,
    pub score: u32,
    answered: HashSet<String>,
}

impl PresentationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_question<'a>(&self, questions: &'a [Question]) -> Option<&'a Question> {
        questions.get(self.current)
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.answered.contains(question_id)
    }

    pub fn select(&mut self, questions: &[Question], option_id: &str) {
        let Some(question) = self.current_question(questions) else {
            return;
        };
        if !self.is_answered(&question.id) {
            self.selected = Some(option_id.to_string());
        }
    }

    /// Locks in the selected option. Returns whether it was correct, or `None` when
    /// nothing was submitted.
    pub fn submit(&mut self, questions: &[Question]) -> Option<bool> {
        let question = self.current_question(questions)?;
        if self.is_answered(&question.id) {
            return None;
        }
        let selected = self.selected.as_deref()?;

        let correct = question.correct_option_id.as_deref() == Some(selected);
        if correct {
            self.score += 1;
        }
        self.answered.insert(question.id.clone());
        self.show_explanation = true;
        Some(correct)
    }

    pub fn next(&mut self, questions: &[Question]) {
        if self.current + 1 < questions.len() {
            self.current += 1;
            self.selected = None;
            self.show_explanation = false;
        }
    }

    /// Going back shows the explanation again for questions already answered.
    pub fn previous(&mut self, questions: &[Question]) {
        if self.current > 0 {
            self.current -= 1;
            self.selected = None;
            self.show_explanation = questions
                .get(self.current)
                .is_some_and(|q| self.answered.contains(&q.id));
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
