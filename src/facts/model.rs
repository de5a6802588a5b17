use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: u64,
    /// Sent as `answer_text`; either name is accepted on input.
    #[serde(rename(serialize = "answer_text"), alias = "answer_text")]
    pub answer: String,
    pub is_true: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u64,
    pub question_content: String,
    /// Author, taken from the authenticated request.
    pub user_id: Uuid,
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAnswer {
    #[serde(alias = "answer_text")]
    pub answer: String,
    #[serde(default)]
    pub is_true: bool,
}

/// Request body for creating a question.
#[derive(Debug, Clone, Deserialize)]
pub struct NewQuestion {
    pub question_content: String,
    #[serde(default)]
    pub answers: Vec<NewAnswer>,
}
