use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use uuid::Uuid;

use super::model::{Answer, NewQuestion, Question};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FactStoreError {
    #[error("question not found")]
    NotFound,

    #[error("fact store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait FactStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Question>, FactStoreError>;
    async fn get(&self, id: u64) -> Result<Question, FactStoreError>;
    async fn create(&self, author: Uuid, new: NewQuestion) -> Result<Question, FactStoreError>;
    /// Remove a question together with its answers, returning what was removed.
    async fn delete(&self, id: u64) -> Result<Question, FactStoreError>;
}

#[derive(Default)]
struct Inner {
    questions: BTreeMap<u64, Question>,
    next_question: u64,
    next_answer: u64,
}

/// Questions keyed by sequential id, listed in creation order.
#[derive(Clone, Default)]
pub struct MemoryFactStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryFactStore {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.inner.read().questions.len() }

    pub fn is_empty(&self) -> bool { self.inner.read().questions.is_empty() }
}

#[async_trait]
impl FactStore for MemoryFactStore {
    async fn list(&self) -> Result<Vec<Question>, FactStoreError> {
        Ok(self.inner.read().questions.values().cloned().collect())
    }

    async fn get(&self, id: u64) -> Result<Question, FactStoreError> {
        self.inner.read().questions.get(&id).cloned().ok_or(FactStoreError::NotFound)
    }

    async fn create(&self, author: Uuid, new: NewQuestion) -> Result<Question, FactStoreError> {
        let mut w = self.inner.write();
        w.next_question += 1;
        let id = w.next_question;
        let mut answers = Vec::with_capacity(new.answers.len());
        for a in new.answers {
            w.next_answer += 1;
            answers.push(Answer { id: w.next_answer, answer: a.answer, is_true: a.is_true });
        }
        let q = Question { id, question_content: new.question_content, user_id: author, answers };
        w.questions.insert(id, q.clone());
        Ok(q)
    }

    async fn delete(&self, id: u64) -> Result<Question, FactStoreError> {
        self.inner.write().questions.remove(&id).ok_or(FactStoreError::NotFound)
    }
}
