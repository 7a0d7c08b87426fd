//! Lifecycle shared between the input loop and the expiry timer.
//!
//! Both sides go through one async mutex, so a submission and a timeout
//! racing for the same question are serialized. Whichever runs first
//! resolves it; the other finds the slot empty and gets `None`.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use super::engine::{QuestionLifecycle, Resolution};
use crate::error::Result;
use crate::question::{Difficulty, Question};

#[derive(Clone)]
pub struct SharedLifecycle {
    inner: Arc<Mutex<QuestionLifecycle>>,
}

impl SharedLifecycle {
    pub fn new(lifecycle: QuestionLifecycle) -> Self {
        Self {
            inner: Arc::new(Mutex::new(lifecycle)),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, QuestionLifecycle> {
        self.inner.lock().await
    }

    pub async fn request_question(&self, category: &str, difficulty: Difficulty) -> Result<Question> {
        self.inner.lock().await.request_question(category, difficulty).await
    }

    pub async fn submit_answer(&self, answer: &str) -> Option<Resolution> {
        self.inner.lock().await.submit_answer(answer)
    }

    pub async fn expire(&self) -> Option<Resolution> {
        self.inner.lock().await.expire()
    }

    pub async fn time_remaining(&self) -> Option<Duration> {
        self.inner.lock().await.time_remaining()
    }

    /// Watch one question instance and expire it at its deadline.
    ///
    /// Re-sleeps when a freeze moved the deadline. Exits with `None` as soon
    /// as a different question (or none) is active.
    pub fn spawn_expiry_timer(&self, question_id: Uuid) -> JoinHandle<Option<Resolution>> {
        let shared = self.clone();
        tokio::spawn(async move {
            loop {
                let wait = {
                    let mut lifecycle = shared.inner.lock().await;
                    if lifecycle.current_question_id() != Some(question_id) {
                        debug!(%question_id, "expiry timer stopped; question already resolved");
                        return None;
                    }
                    match lifecycle.time_remaining() {
                        Some(remaining) if remaining.is_zero() => {
                            return lifecycle.expire_question(question_id)
                        }
                        Some(remaining) => remaining,
                        None => return None,
                    }
                };
                tokio::time::sleep(wait).await;
            }
        })
    }

    /// Unwrap the lifecycle once no timer holds a clone.
    pub fn try_into_inner(self) -> std::result::Result<QuestionLifecycle, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}
