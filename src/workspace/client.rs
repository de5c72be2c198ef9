use async_trait::async_trait;
use chrono::Utc;
use opentelemetry::KeyValue;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};

use crate::error::AppError;
use crate::formatter::Block;
use crate::telemetry::metrics::{WORKSPACE_ERROR_COUNT, WORKSPACE_REQUESTS_TOTAL};

use super::{DocumentStore, PageStatus, ProjectFields};

/// Child blocks allowed per page-create or block-append call.
const MAX_CHILDREN_PER_REQUEST: usize = 100;
/// Rich-text content limit per property write.
const MAX_RICH_TEXT_CHARS: usize = 2000;

/// HTTP client for the document-workspace API.
pub struct WorkspaceClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
    api_version: String,
}

impl WorkspaceClient {
    pub fn new(token: &str, base_url: &str, api_version: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
        }
    }

    fn headers(&self) -> Result<HeaderMap, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token))
                .map_err(|e| AppError::Workspace(format!("invalid token header: {e}")))?,
        );
        headers.insert(
            "Notion-Version",
            HeaderValue::from_str(&self.api_version)
                .map_err(|e| AppError::Workspace(format!("invalid version header: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, AppError> {
        let url = format!("{}/{}", self.base_url, path);

        WORKSPACE_REQUESTS_TOTAL.add(1, &[KeyValue::new("workspace.path", path.to_string())]);

        let mut req = self
            .http
            .request(method.clone(), &url)
            .headers(self.headers()?);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req.send().await.map_err(|e| {
            WORKSPACE_ERROR_COUNT.add(1, &[]);
            AppError::Workspace(format!("{method} {url}: {e}"))
        })?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::Workspace(format!("{method} {url}: invalid body: {e}")))?;

        if !status.is_success() {
            WORKSPACE_ERROR_COUNT.add(1, &[]);
            let message = payload["message"].as_str().unwrap_or("unknown error");
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(AppError::NotFound(format!("workspace page: {message}")));
            }
            return Err(AppError::Workspace(format!(
                "{method} {url} failed ({status}): {message}"
            )));
        }

        Ok(payload)
    }
}

#[async_trait]
impl DocumentStore for WorkspaceClient {
    #[tracing::instrument(name = "workspace get_project_fields", skip(self))]
    async fn get_project_fields(&self, page_id: &str) -> Result<ProjectFields, AppError> {
        let page = self
            .request(reqwest::Method::GET, &format!("pages/{page_id}"), None)
            .await?;

        Ok(parse_project_fields(&page))
    }

    #[tracing::instrument(
        name = "workspace create_report",
        skip(self, blocks),
        fields(report.blocks = blocks.len())
    )]
    async fn create_report(
        &self,
        parent_page_id: &str,
        title: &str,
        blocks: &[Block],
    ) -> Result<String, AppError> {
        let children: Vec<Value> = blocks.iter().map(block_json).collect();
        let mut chunks = children.chunks(MAX_CHILDREN_PER_REQUEST);

        let body = json!({
            "parent": { "page_id": parent_page_id },
            "properties": {
                "title": { "title": rich_text(title) },
            },
            "children": chunks.next().unwrap_or_default(),
        });

        let page = self.request(reqwest::Method::POST, "pages", Some(body)).await?;
        let page_id = page["id"]
            .as_str()
            .ok_or_else(|| AppError::Workspace("create response missing page id".to_string()))?
            .to_string();

        // Remaining blocks are appended in further batches.
        for chunk in chunks {
            self.request(
                reqwest::Method::PATCH,
                &format!("blocks/{page_id}/children"),
                Some(json!({ "children": chunk })),
            )
            .await?;
        }

        tracing::info!(page_id = %page_id, title = %title, "Report page created");
        Ok(page_id)
    }

    #[tracing::instrument(name = "workspace update_status", skip(self))]
    async fn update_status(&self, page_id: &str, status: PageStatus) -> Result<(), AppError> {
        let body = json!({
            "properties": {
                "Status": { "select": { "name": status.as_str() } },
            }
        });
        self.request(
            reqwest::Method::PATCH,
            &format!("pages/{page_id}"),
            Some(body),
        )
        .await?;
        tracing::info!(status = status.as_str(), "Page status updated");
        Ok(())
    }

    #[tracing::instrument(name = "workspace update_completion", skip(self, recommendation))]
    async fn update_completion(
        &self,
        page_id: &str,
        recommendation: &str,
        priority_score: i64,
    ) -> Result<(), AppError> {
        let body = json!({
            "properties": {
                "AI Recommendation": { "rich_text": rich_text(recommendation) },
                "Priority Score": { "number": priority_score },
                "Analysis Date": { "date": { "start": Utc::now().format("%Y-%m-%d").to_string() } },
            }
        });
        self.request(
            reqwest::Method::PATCH,
            &format!("pages/{page_id}"),
            Some(body),
        )
        .await?;
        Ok(())
    }
}

fn parse_project_fields(page: &Value) -> ProjectFields {
    let properties = &page["properties"];

    let name = properties["Project Name"]["title"]
        .as_array()
        .and_then(|parts| parts.first())
        .and_then(|part| part["plain_text"].as_str())
        .unwrap_or("Unknown Project")
        .to_string();

    let description = properties["Description"]["rich_text"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["plain_text"].as_str())
                .collect::<String>()
        })
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| "No description available".to_string());

    let selected_analysis_types = properties["Analysis Types"]["multi_select"]
        .as_array()
        .map(|options| {
            options
                .iter()
                .filter_map(|opt| opt["name"].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    ProjectFields {
        name,
        description,
        selected_analysis_types,
    }
}

fn rich_text(text: &str) -> Value {
    let content: String = text.chars().take(MAX_RICH_TEXT_CHARS).collect();
    json!([{ "type": "text", "text": { "content": content } }])
}

/// Serializes one block into the workspace API's block object shape.
pub(crate) fn block_json(block: &Block) -> Value {
    match block {
        Block::Heading { level, text } => {
            let kind = match level {
                1 => "heading_1",
                2 => "heading_2",
                _ => "heading_3",
            };
            let mut obj = serde_json::Map::new();
            obj.insert("object".to_string(), json!("block"));
            obj.insert("type".to_string(), json!(kind));
            obj.insert(kind.to_string(), json!({ "rich_text": rich_text(text) }));
            Value::Object(obj)
        }
        Block::Paragraph { text } => json!({
            "object": "block",
            "type": "paragraph",
            "paragraph": { "rich_text": rich_text(text) },
        }),
        Block::BulletItem { text } => json!({
            "object": "block",
            "type": "bulleted_list_item",
            "bulleted_list_item": { "rich_text": rich_text(text) },
        }),
        Block::Callout { text, icon } => json!({
            "object": "block",
            "type": "callout",
            "callout": {
                "rich_text": rich_text(text),
                "icon": { "type": "emoji", "emoji": icon },
            },
        }),
        Block::Table { rows } => {
            let width = rows.first().map(Vec::len).unwrap_or(0);
            let children: Vec<Value> = rows
                .iter()
                .map(|cells| {
                    json!({
                        "object": "block",
                        "type": "table_row",
                        "table_row": {
                            "cells": cells.iter().map(|c| rich_text(c)).collect::<Vec<_>>(),
                        },
                    })
                })
                .collect();
            json!({
                "object": "block",
                "type": "table",
                "table": {
                    "table_width": width,
                    "has_column_header": true,
                    "children": children,
                },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_project_fields_full_page() {
        let page = json!({
            "properties": {
                "Project Name": { "title": [ { "plain_text": "Loyalty App" } ] },
                "Description": { "rich_text": [
                    { "plain_text": "A mobile " },
                    { "plain_text": "loyalty program" }
                ] },
                "Analysis Types": { "multi_select": [
                    { "name": "Market Analysis" },
                    { "name": "Risk Assessment" }
                ] },
            }
        });
        let fields = parse_project_fields(&page);
        assert_eq!(fields.name, "Loyalty App");
        assert_eq!(fields.description, "A mobile loyalty program");
        assert_eq!(
            fields.selected_analysis_types,
            vec!["Market Analysis", "Risk Assessment"]
        );
    }

    #[test]
    fn test_parse_project_fields_missing_properties() {
        let fields = parse_project_fields(&json!({ "properties": {} }));
        assert_eq!(fields.name, "Unknown Project");
        assert_eq!(fields.description, "No description available");
        assert!(fields.selected_analysis_types.is_empty());
    }

    #[test]
    fn test_rich_text_truncates_to_property_limit() {
        let long = "x".repeat(MAX_RICH_TEXT_CHARS + 500);
        let value = rich_text(&long);
        let content = value[0]["text"]["content"].as_str().unwrap();
        assert_eq!(content.chars().count(), MAX_RICH_TEXT_CHARS);
    }

    #[test]
    fn test_block_json_heading_levels() {
        let h1 = block_json(&Block::Heading {
            level: 1,
            text: "Title".to_string(),
        });
        assert_eq!(h1["type"], "heading_1");
        assert_eq!(h1["heading_1"]["rich_text"][0]["text"]["content"], "Title");

        let h3 = block_json(&Block::Heading {
            level: 3,
            text: "Sub".to_string(),
        });
        assert_eq!(h3["type"], "heading_3");
    }

    #[test]
    fn test_block_json_callout_carries_icon() {
        let value = block_json(&Block::Callout {
            text: "Key insight".to_string(),
            icon: "📌".to_string(),
        });
        assert_eq!(value["type"], "callout");
        assert_eq!(value["callout"]["icon"]["emoji"], "📌");
    }

    #[test]
    fn test_block_json_table_shape() {
        let value = block_json(&Block::Table {
            rows: vec![
                vec!["A".to_string(), "B".to_string()],
                vec!["1".to_string(), "2".to_string()],
            ],
        });
        assert_eq!(value["type"], "table");
        assert_eq!(value["table"]["table_width"], 2);
        assert_eq!(value["table"]["children"].as_array().unwrap().len(), 2);
        assert_eq!(
            value["table"]["children"][1]["table_row"]["cells"][0][0]["text"]["content"],
            "1"
        );
    }

    #[test]
    fn test_children_batching_respects_per_request_limit() {
        let children: Vec<Value> = (0..205)
            .map(|i| {
                block_json(&Block::Paragraph {
                    text: format!("line {i}"),
                })
            })
            .collect();
        let batches: Vec<usize> = children
            .chunks(MAX_CHILDREN_PER_REQUEST)
            .map(<[Value]>::len)
            .collect();
        assert_eq!(batches, vec![100, 100, 5]);
    }

    #[test]
    fn test_block_json_bullet() {
        let value = block_json(&Block::BulletItem {
            text: "point".to_string(),
        });
        assert_eq!(value["type"], "bulleted_list_item");
    }
}
