use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::team::AgentId;

/// 分析类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisCategory {
    ContractReview,
    LegalResearch,
    RiskAssessment,
    ComplianceCheck,
    CustomQuery,
}

impl AnalysisCategory {
    pub const ALL: [AnalysisCategory; 5] = [
        AnalysisCategory::ContractReview,
        AnalysisCategory::LegalResearch,
        AnalysisCategory::RiskAssessment,
        AnalysisCategory::ComplianceCheck,
        AnalysisCategory::CustomQuery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisCategory::ContractReview => "contract-review",
            AnalysisCategory::LegalResearch => "legal-research",
            AnalysisCategory::RiskAssessment => "risk-assessment",
            AnalysisCategory::ComplianceCheck => "compliance-check",
            AnalysisCategory::CustomQuery => "custom-query",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            AnalysisCategory::ContractReview => "📑",
            AnalysisCategory::LegalResearch => "🔍",
            AnalysisCategory::RiskAssessment => "⚠️",
            AnalysisCategory::ComplianceCheck => "✅",
            AnalysisCategory::CustomQuery => "💭",
        }
    }
}

impl fmt::Display for AnalysisCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "contract-review" | "合同审查" => Ok(AnalysisCategory::ContractReview),
            "legal-research" | "法律研究" => Ok(AnalysisCategory::LegalResearch),
            "risk-assessment" | "风险评估" => Ok(AnalysisCategory::RiskAssessment),
            "compliance-check" | "合规检查" => Ok(AnalysisCategory::ComplianceCheck),
            "custom-query" | "custom" | "自定义查询" => Ok(AnalysisCategory::CustomQuery),
            _ => Err(ValidationError::UnknownCategory(s.to_string())),
        }
    }
}

/// 分析类型对应的固定配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// 自定义查询没有模板，由调用方提供问题
    pub query_template: Option<&'static str>,
    /// 参与分析的智能体，按展示顺序排列
    pub participating_agent_ids: &'static [AgentId],
    pub description: &'static str,
}

const ALL_MEMBERS: &[AgentId] = &[
    AgentId::LegalResearcher,
    AgentId::ContractAnalyst,
    AgentId::LegalStrategist,
];

/// 查找分析类型的配置
pub fn resolve(category: AnalysisCategory) -> AnalysisConfig {
    match category {
        AnalysisCategory::ContractReview => AnalysisConfig {
            query_template: Some("请审查本合同并识别关键条款、义务和潜在问题。"),
            participating_agent_ids: &[AgentId::ContractAnalyst],
            description: "详细的合同分析，重点关注条款和义务",
        },
        AnalysisCategory::LegalResearch => AnalysisConfig {
            query_template: Some("研究与本文档相关的案例和判例。"),
            participating_agent_ids: &[AgentId::LegalResearcher],
            description: "相关法律案例和判例研究",
        },
        AnalysisCategory::RiskAssessment => AnalysisConfig {
            query_template: Some("分析本文档中的潜在法律风险和责任。"),
            participating_agent_ids: &[AgentId::ContractAnalyst, AgentId::LegalStrategist],
            description: "综合风险分析和战略评估",
        },
        AnalysisCategory::ComplianceCheck => AnalysisConfig {
            query_template: Some("检查本文档的监管合规性问题。"),
            participating_agent_ids: ALL_MEMBERS,
            description: "全面的合规性分析",
        },
        AnalysisCategory::CustomQuery => AnalysisConfig {
            query_template: None,
            participating_agent_ids: ALL_MEMBERS,
            description: "使用所有可用的智能体进行自定义分析",
        },
    }
}

/// 经过校验的分析请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    category: AnalysisCategory,
    custom_text: Option<String>,
}

impl AnalysisRequest {
    /// 自定义查询必须提供非空内容并原样保留，其他类型忽略传入的文本
    pub fn new(
        category: AnalysisCategory,
        custom_text: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let custom_text = match category {
            AnalysisCategory::CustomQuery => {
                let text = custom_text
                    .filter(|t| !t.trim().is_empty())
                    .ok_or(ValidationError::EmptyCustomQuery)?;
                Some(text.to_string())
            }
            _ => None,
        };
        Ok(Self {
            category,
            custom_text,
        })
    }

    pub fn category(&self) -> AnalysisCategory {
        self.category
    }

    pub fn custom_text(&self) -> Option<&str> {
        self.custom_text.as_deref()
    }

    pub fn config(&self) -> AnalysisConfig {
        resolve(self.category)
    }
}
