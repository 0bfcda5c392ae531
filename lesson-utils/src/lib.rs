pub mod catalog;
pub mod stages;
pub mod text_cleanup;

pub use catalog::{Catalog, CatalogError, Lesson, LessonLibrary, LessonRef, Level, Sentence};
pub use stages::{Interval, SRS_STAGES, Stage, StageTable};

/// The lesson library compiled into the crate, in the catalog document format.
pub const BUILTIN_LIBRARY_JSON: &str = include_str!("../data/library.json");
