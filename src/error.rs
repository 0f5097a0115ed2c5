//! 错误类型 - 校验、文档索引与模型生成三类错误

use std::fmt;

use crate::analysis::Stage;

/// 输入校验错误，发生在任何模型调用之前
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("自定义查询的内容不能为空")]
    EmptyCustomQuery,

    #[error("未知的分析类型: {0}")]
    UnknownCategory(String),

    #[error("智能体 {agent} 配置无效: {reason}")]
    InvalidAgentSpec { agent: String, reason: String },

    #[error("团队中不存在智能体: {0}")]
    UnknownAgent(String),
}

impl ValidationError {
    pub fn invalid_spec(agent: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self::InvalidAgentSpec {
            agent: agent.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// 文档无法建立索引
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("不支持的文档格式: {0}")]
    UnsupportedFormat(String),

    #[error("读取文档失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("解析PDF文档失败: {0}")]
    Pdf(String),

    #[error("文档 {0} 中没有可索引的文本内容")]
    EmptyDocument(String),

    #[error("文档切分配置无效: {0}")]
    Chunking(String),
}

/// 模型调用失败，携带出错的阶段与智能体
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub struct GenerationError {
    pub message: String,
    pub agent: Option<String>,
    pub stage: Option<Stage>,
}

impl GenerationError {
    pub fn new(message: impl fmt::Display) -> Self {
        Self {
            message: message.to_string(),
            agent: None,
            stage: None,
        }
    }

    /// 标记出错的智能体（只记录最内层的那个）
    pub fn by_agent(mut self, agent: impl fmt::Display) -> Self {
        if self.agent.is_none() {
            self.agent = Some(agent.to_string());
        }
        self
    }

    pub fn at_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(stage) = &self.stage {
            write!(f, "[{}] ", stage)?;
        }
        if let Some(agent) = &self.agent {
            write!(f, "{}: ", agent)?;
        }
        write!(f, "模型调用失败: {}", self.message)
    }
}

/// 一次分析会话可能出现的全部错误
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_error_display_names_stage_and_agent() {
        let err = GenerationError::new("quota exceeded")
            .by_agent("contract_analyst")
            .at_stage(Stage::KeyPoints);

        let text = err.to_string();
        assert!(text.contains("key_points"));
        assert!(text.contains("contract_analyst"));
        assert!(text.contains("quota exceeded"));
    }

    #[test]
    fn test_generation_error_keeps_innermost_agent() {
        let err = GenerationError::new("timeout")
            .by_agent("legal_researcher")
            .by_agent("legal_team_lead");
        assert_eq!(err.agent.as_deref(), Some("legal_researcher"));
    }

    #[test]
    fn test_analysis_error_from_validation() {
        let err: AnalysisError = ValidationError::EmptyCustomQuery.into();
        assert!(matches!(
            err,
            AnalysisError::Validation(ValidationError::EmptyCustomQuery)
        ));
    }
}
