mod clock;
mod engine;
mod shared;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{
    ActiveQuestion, LifecycleConfig, LifecycleState, QuestionLifecycle, Resolution,
    DEFAULT_FREEZE_EXTENSION, DEFAULT_TIME_LIMIT,
};
pub use shared::SharedLifecycle;
