//! 语言模型边界 - 智能体只通过 [`LanguageModel`] 与模型后端交互

use async_trait::async_trait;

use crate::error::GenerationError;

pub mod client;
pub mod tools;

pub use client::LLMClient;

/// 允许模型在回答时调用的工具
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// 外部网络检索
    WebSearch,
}

/// 一次补全请求
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// 系统指令（角色设定与行为约束）
    pub instructions: String,
    /// 用户提示词
    pub prompt: String,
    /// 开放给模型的工具
    pub tools: Vec<ToolKind>,
}

impl CompletionRequest {
    pub fn new(instructions: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            prompt: prompt.into(),
            tools: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolKind>) -> Self {
        self.tools = tools;
        self
    }

    pub fn has_tool(&self, tool: ToolKind) -> bool {
        self.tools.contains(&tool)
    }
}

/// 执行提示词并返回文本的模型后端
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError>;
}
