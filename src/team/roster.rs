//! 默认的法律团队阵容

use std::sync::Arc;

use super::agent::{Agent, AgentId, AgentSpec};
use super::team::Team;
use crate::error::ValidationError;
use crate::knowledge::KnowledgeHandle;
use crate::llm::LanguageModel;

fn spec(
    id: AgentId,
    role: &str,
    instructions: &[&str],
    has_search_tool: bool,
) -> AgentSpec {
    AgentSpec {
        id,
        role: role.to_string(),
        instructions: instructions.iter().map(|i| i.to_string()).collect(),
        has_search_tool,
        has_knowledge: true,
    }
}

/// 团队成员：法律研究员、合同分析师、法律策略师
pub fn member_specs() -> Vec<AgentSpec> {
    vec![
        spec(
            AgentId::LegalResearcher,
            "Legal Research Expert",
            &[
                "查找并引用相关法律案例和判例",
                "提供详细的研究总结和来源",
                "引用上传文档中的具体章节",
                "始终搜索知识库以获取相关信息",
            ],
            true,
        ),
        spec(
            AgentId::ContractAnalyst,
            "Contract Analysis Expert",
            &[
                "全面审查合同内容",
                "识别关键条款和潜在问题",
                "引用文档中的具体条款",
            ],
            false,
        ),
        spec(
            AgentId::LegalStrategist,
            "Legal Strategy Expert",
            &["制定全面的法律策略", "提供可行的建议", "考虑风险和机遇"],
            false,
        ),
    ]
}

/// 团队负责人
pub fn coordinator_spec() -> AgentSpec {
    spec(
        AgentId::TeamLead,
        "Legal Team Coordinator",
        &[
            "协调团队成员之间的分析工作",
            "提供全面的响应",
            "确保所有建议都有适当的来源",
            "引用文档的具体部分",
            "在分配任务前始终搜索知识库",
        ],
        false,
    )
}

/// 在给定文档索引上组建完整团队
pub fn assemble(
    model: Arc<dyn LanguageModel>,
    knowledge: Arc<dyn KnowledgeHandle>,
    retrieval_limit: usize,
    max_parallels: usize,
) -> Result<Team, ValidationError> {
    let build = |spec: AgentSpec| {
        Agent::new(spec, model.clone(), Some(knowledge.clone()))
            .map(|agent| agent.with_retrieval_limit(retrieval_limit))
    };

    let coordinator = build(coordinator_spec())?;
    let members = member_specs()
        .into_iter()
        .map(build)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Team::new(coordinator, members)?.with_max_parallels(max_parallels))
}
