pub mod client;

pub use client::WorkspaceClient;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AppError;
use crate::formatter::Block;

/// Value of the intake page's status select property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageStatus {
    Analyzing,
    Complete,
    Error,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageStatus::Analyzing => "Analyzing",
            PageStatus::Complete => "Complete",
            PageStatus::Error => "Error",
        }
    }
}

/// Project fields read from the intake page.
#[derive(Debug, Clone, Default)]
pub struct ProjectFields {
    pub name: String,
    pub description: String,
    pub selected_analysis_types: Vec<String>,
}

/// The document-workspace collaborator. A trait seam so the orchestrator can
/// run against an in-memory fake in tests.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_project_fields(&self, page_id: &str) -> Result<ProjectFields, AppError>;

    /// Creates a child page carrying the block tree; returns the new page id.
    async fn create_report(
        &self,
        parent_page_id: &str,
        title: &str,
        blocks: &[Block],
    ) -> Result<String, AppError>;

    async fn update_status(&self, page_id: &str, status: PageStatus) -> Result<(), AppError>;

    /// Writes the executive recommendation, priority score, and analysis date
    /// back onto the intake page.
    async fn update_completion(
        &self,
        page_id: &str,
        recommendation: &str,
        priority_score: i64,
    ) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_names_match_workspace_options() {
        assert_eq!(PageStatus::Analyzing.as_str(), "Analyzing");
        assert_eq!(PageStatus::Complete.as_str(), "Complete");
        assert_eq!(PageStatus::Error.as_str(), "Error");
    }
}
