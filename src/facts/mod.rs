//! Quiz facts: questions with a fixed set of answers, exactly one of them true.

mod model;
mod rules;
mod store;

pub use model::{Answer, NewAnswer, NewQuestion, Question};
pub use rules::{check_question, QuestionRuleError, MAX_ANSWER_COUNT, MIN_ANSWER_COUNT};
pub use store::{FactStore, FactStoreError, MemoryFactStore};
