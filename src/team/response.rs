use serde::{Deserialize, Serialize};

use crate::knowledge::Passage;

/// 消息作者
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// 对话中的一条消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    /// 产生该消息的智能体
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            name: None,
            content: Some(content.into()),
        }
    }

    /// 空白内容记为None
    pub fn assistant(name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            role: Role::Assistant,
            name: Some(name.into()),
            content: Some(content).filter(|c| !c.trim().is_empty()),
        }
    }
}

/// 智能体或团队的一次回答
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub content: Option<String>,
    pub messages: Vec<Message>,
    /// 回答时检索到的文档片段
    #[serde(default)]
    pub citations: Vec<Passage>,
}

impl Response {
    pub fn from_text(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            content: Some(content).filter(|c| !c.trim().is_empty()),
            ..Default::default()
        }
    }

    /// 规范化后的文本输出
    pub fn text(&self) -> String {
        extract_text(self)
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }
}

/// 取回答的规范文本：优先content，缺失时回退到最后一条有内容的助手消息，都没有时为空串
pub fn extract_text(response: &Response) -> String {
    if let Some(content) = response.content.as_deref()
        && !content.trim().is_empty()
    {
        return content.to_string();
    }

    response
        .messages
        .iter()
        .rev()
        .filter(|m| m.role == Role::Assistant)
        .find_map(|m| m.content.as_deref().filter(|c| !c.trim().is_empty()))
        .map(str::to_string)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_prefers_content() {
        let response = Response {
            content: Some("final".to_string()),
            messages: vec![Message::assistant("a", "member")],
            citations: vec![],
        };
        assert_eq!(extract_text(&response), "final");
    }

    #[test]
    fn test_extract_falls_back_to_last_assistant_message() {
        let response = Response {
            content: None,
            messages: vec![
                Message::user("question"),
                Message::assistant("legal_researcher", "first"),
                Message::assistant("contract_analyst", "second"),
                Message::assistant("legal_team_lead", "   "),
                Message::user("follow-up"),
            ],
            citations: vec![],
        };
        assert_eq!(extract_text(&response), "second");
    }

    #[test]
    fn test_extract_ignores_blank_content() {
        let response = Response {
            content: Some("  \n".to_string()),
            messages: vec![Message::assistant("a", "fallback")],
            citations: vec![],
        };
        assert_eq!(response.text(), "fallback");
    }

    #[test]
    fn test_empty_response_is_empty_text() {
        let response = Response {
            content: None,
            messages: vec![Message::user("question")],
            citations: vec![],
        };
        assert_eq!(extract_text(&response), "");
        assert!(response.is_empty());
    }

    #[test]
    fn test_assistant_blank_content_is_none() {
        assert!(Message::assistant("a", "").content.is_none());
        assert!(Response::from_text(" ").content.is_none());
    }
}
