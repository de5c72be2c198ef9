pub mod orchestrator;
pub mod summary;

pub use orchestrator::{AnalysisRequest, run_analysis};
