pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod index;
pub mod progress;
pub mod report;
pub mod scanner;

pub use config::AppConfig;
pub use engine::{ClassificationRun, ClassifyEngine};
pub use error::Error;
pub use index::{FileDescriptor, RepoIndex};
pub use progress::{ProgressReporter, SilentReporter};
pub use report::ClassificationReport;
