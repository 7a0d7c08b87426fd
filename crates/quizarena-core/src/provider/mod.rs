//! Question providers.
//!
//! Every provider validates its payload into a [`Question`](crate::Question)
//! before returning it; nothing structurally invalid reaches the lifecycle.

mod bank;
pub mod groq;
mod traits;

pub use bank::QuestionBank;
pub use groq::GroqProvider;
pub use traits::QuestionProvider;
