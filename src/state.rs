use std::sync::Arc;

use crate::quiz::{GradingMode, QuizGenerator};
use crate::scoring::Scorer;
use crate::storage::QuizRepository;

pub struct AppState {
    pub repo: Arc<dyn QuizRepository>,
    pub scorer: Arc<dyn Scorer>,
    pub generator: QuizGenerator,
    pub grading_mode: GradingMode,
}
