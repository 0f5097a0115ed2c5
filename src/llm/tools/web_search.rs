//! 网络检索工具 - 供法律研究员查找公开的案例与法规资料

use std::time::Duration;

use rig::completion::ToolDefinition;
use rig::tool::Tool;
use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;

/// 基于DuckDuckGo即时答案接口的检索工具
#[derive(Debug, Clone)]
pub struct WebSearchTool {
    http: reqwest::Client,
    endpoint: String,
    max_results: usize,
}

/// 检索参数
#[derive(Debug, Deserialize)]
pub struct WebSearchArgs {
    pub query: String,
}

/// 单条检索结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub text: String,
    pub url: String,
}

/// 检索结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebSearchResult {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub related: Vec<SearchHit>,
}

/// 检索工具错误
#[derive(Debug, thiserror::Error)]
pub enum WebSearchError {
    #[error("search request failed: {0}")]
    Request(String),
    #[error("invalid search response: {0}")]
    Response(String),
}

#[derive(Debug, Default, Deserialize)]
struct InstantAnswer {
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Default, Deserialize)]
struct RelatedTopic {
    #[serde(rename = "Text", default)]
    text: String,
    #[serde(rename = "FirstURL", default)]
    first_url: String,
    /// 分组条目会把子条目放在Topics中
    #[serde(rename = "Topics", default)]
    topics: Vec<RelatedTopic>,
}

impl WebSearchTool {
    pub fn new(config: &SearchConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("legal-agent-team/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            max_results: config.max_results,
        })
    }

    async fn search(&self, query: &str) -> Result<WebSearchResult, WebSearchError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| WebSearchError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| WebSearchError::Request(e.to_string()))?;

        let answer: InstantAnswer = response
            .json()
            .await
            .map_err(|e| WebSearchError::Response(e.to_string()))?;

        Ok(summarize_answer(query, answer, self.max_results))
    }
}

fn summarize_answer(query: &str, answer: InstantAnswer, max_results: usize) -> WebSearchResult {
    let mut related = Vec::new();
    let mut pending: Vec<RelatedTopic> = answer.related_topics.into_iter().rev().collect();

    while let Some(topic) = pending.pop() {
        if related.len() >= max_results {
            break;
        }
        if !topic.topics.is_empty() {
            pending.extend(topic.topics.into_iter().rev());
            continue;
        }
        if !topic.text.is_empty() {
            related.push(SearchHit {
                text: topic.text,
                url: topic.first_url,
            });
        }
    }

    WebSearchResult {
        query: query.to_string(),
        summary: Some(answer.abstract_text).filter(|s| !s.is_empty()),
        source_url: Some(answer.abstract_url).filter(|s| !s.is_empty()),
        related,
    }
}

impl Tool for WebSearchTool {
    const NAME: &'static str = "web_search";

    type Error = WebSearchError;
    type Args = WebSearchArgs;
    type Output = WebSearchResult;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "在互联网上检索与问题相关的法律案例、判例、法规与公开资料，返回摘要与来源链接。"
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "检索关键词，例如案例名称、法规条文或法律概念"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        tracing::debug!(query = %args.query, "🔧 tool called...web_search");
        self.search(&args.query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> InstantAnswer {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_summarize_flattens_grouped_topics() {
        let answer = parse(
            r#"{
                "AbstractText": "Indemnity is a contractual obligation.",
                "AbstractURL": "https://en.wikipedia.org/wiki/Indemnity",
                "RelatedTopics": [
                    {"Text": "Hold harmless clause", "FirstURL": "https://example.org/a"},
                    {"Name": "Cases", "Topics": [
                        {"Text": "Case one", "FirstURL": "https://example.org/b"},
                        {"Text": "Case two", "FirstURL": "https://example.org/c"}
                    ]},
                    {"Text": "Warranty", "FirstURL": "https://example.org/d"}
                ]
            }"#,
        );

        let result = summarize_answer("indemnity", answer, 3);

        assert_eq!(result.summary.as_deref(), Some("Indemnity is a contractual obligation."));
        assert_eq!(
            result.related.iter().map(|h| h.text.as_str()).collect::<Vec<_>>(),
            vec!["Hold harmless clause", "Case one", "Case two"]
        );
    }

    #[test]
    fn test_summarize_empty_answer() {
        let answer = parse(r#"{"AbstractText": "", "RelatedTopics": []}"#);
        let result = summarize_answer("nothing", answer, 5);

        assert!(result.summary.is_none());
        assert!(result.source_url.is_none());
        assert!(result.related.is_empty());
    }

    #[test]
    fn test_new_from_config() {
        let tool = WebSearchTool::new(&SearchConfig::default()).unwrap();
        assert_eq!(tool.max_results, 5);
        assert!(tool.endpoint.starts_with("https://"));
    }
}
