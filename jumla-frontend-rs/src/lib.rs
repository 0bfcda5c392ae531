pub mod config;
pub mod navigation;
pub mod progress;
pub mod schedule;
pub mod session;
pub mod speech;
pub mod storage;
pub mod trainer;
pub mod utils;
pub mod views;
pub mod writing;

#[cfg(target_arch = "wasm32")]
mod app;

#[cfg(target_arch = "wasm32")]
pub use app::App;
pub use config::TrainerConfig;
pub use lesson_utils::{Catalog, Sentence, StageTable};
pub use navigation::{CountdownTimer, ManualTimer, Navigator, Screen};
pub use progress::{LessonProgress, ProgressError, ProgressStore, RepetitionOutcome};
pub use schedule::{LessonStatus, StatusChange, StatusKind, StatusPoller, lesson_status};
pub use session::{PracticeItem, PracticeQueue, PracticeSession, QueueStep, SessionMode};
pub use speech::{RecordingSpeaker, Speaker, SpeechRequest};
pub use storage::{KeyValueStore, MemoryStore, StorageError};
pub use trainer::{Trainer, TrainerError};
pub use views::{
    Countdown, LessonOverview, LevelView, PracticeCard, PracticeStep, ReviewCenter,
    ReviewLesson, ReviewSection,
};
pub use writing::{WritingExercise, WritingFeedback};
