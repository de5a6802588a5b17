use std::collections::HashSet;

use thiserror::Error;

use super::model::NewQuestion;

pub const MIN_ANSWER_COUNT: usize = 2;
pub const MAX_ANSWER_COUNT: usize = 6;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuestionRuleError {
    #[error("Question content must not be empty")]
    EmptyContent,

    #[error("There must be only one true answer")]
    TrueAnswerCount,

    #[error("There must be at least two answers")]
    TooFewAnswers,

    #[error("There must be at most six answers")]
    TooManyAnswers,

    #[error("Answers must be unique")]
    DuplicateAnswer,
}

/// Answer-set rule for new questions. Checks run in a fixed order and the first
/// violation wins.
pub fn check_question(q: &NewQuestion) -> Result<(), QuestionRuleError> {
    if q.question_content.trim().is_empty() {
        return Err(QuestionRuleError::EmptyContent);
    }
    if q.answers.iter().filter(|a| a.is_true).count() != 1 {
        return Err(QuestionRuleError::TrueAnswerCount);
    }
    if q.answers.len() < MIN_ANSWER_COUNT {
        return Err(QuestionRuleError::TooFewAnswers);
    }
    if q.answers.len() > MAX_ANSWER_COUNT {
        return Err(QuestionRuleError::TooManyAnswers);
    }
    let mut seen = HashSet::new();
    if !q.answers.iter().all(|a| seen.insert(a.answer.as_str())) {
        return Err(QuestionRuleError::DuplicateAnswer);
    }
    Ok(())
}
