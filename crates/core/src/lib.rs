#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod grading;
pub mod model;
pub mod time;

pub use engine::{
    CourseOverview, EngineError, FinalizeOutcome, ModuleState, ModuleView, ProgressEngine,
    SubmissionOutcome,
};
pub use error::Error;
pub use grading::{FnGrader, GradeOutcome, Grader};
pub use time::Clock;
