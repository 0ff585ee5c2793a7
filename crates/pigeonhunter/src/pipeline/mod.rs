pub mod config;
pub mod error;
pub mod healer;
pub mod report;
pub mod runner;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use healer::FolderHealer;
pub use report::PassReport;
pub use runner::Pipeline;
