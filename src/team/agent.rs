use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::response::{Message, Response};
use crate::error::{GenerationError, ValidationError};
use crate::knowledge::{KnowledgeHandle, Passage};
use crate::llm::{CompletionRequest, LanguageModel, ToolKind};

/// 默认每次检索的片段数
pub const DEFAULT_RETRIEVAL_LIMIT: usize = 5;

/// 智能体标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    LegalResearcher,
    ContractAnalyst,
    LegalStrategist,
    TeamLead,
}

impl AgentId {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::LegalResearcher => "legal_researcher",
            AgentId::ContractAnalyst => "contract_analyst",
            AgentId::LegalStrategist => "legal_strategist",
            AgentId::TeamLead => "legal_team_lead",
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legal_researcher" => Ok(AgentId::LegalResearcher),
            "contract_analyst" => Ok(AgentId::ContractAnalyst),
            "legal_strategist" => Ok(AgentId::LegalStrategist),
            "legal_team_lead" => Ok(AgentId::TeamLead),
            _ => Err(ValidationError::UnknownAgent(s.to_string())),
        }
    }
}

/// 智能体的声明式配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id: AgentId,
    pub role: String,
    pub instructions: Vec<String>,
    pub has_search_tool: bool,
    pub has_knowledge: bool,
}

/// 智能体被授予的能力
#[derive(Debug, Clone)]
pub enum Capability {
    /// 检索当前文档索引
    Knowledge(Arc<dyn KnowledgeHandle>),
    /// 网络检索
    WebSearch,
}

/// 回答前检索到的文档依据
#[derive(Debug, Clone, PartialEq)]
pub enum Grounding {
    /// 与查询相关的片段，按相关度排序
    Matched(Vec<Passage>),
    /// 没有相关片段时退回到文档开头的片段
    Overview(Vec<Passage>),
}

impl Grounding {
    pub fn passages(&self) -> &[Passage] {
        match self {
            Grounding::Matched(p) | Grounding::Overview(p) => p,
        }
    }

    pub fn into_passages(self) -> Vec<Passage> {
        match self {
            Grounding::Matched(p) | Grounding::Overview(p) => p,
        }
    }
}

/// 可以回答查询的单元：单个智能体或整个团队
#[async_trait]
pub trait Responder: Send + Sync {
    fn name(&self) -> &str;

    /// query是完整的提示词，focus是检索文档时使用的任务内容
    async fn answer(&self, query: &str, focus: &str) -> Result<Response, GenerationError>;

    async fn run(&self, query: &str) -> Result<Response, GenerationError> {
        self.answer(query, query).await
    }
}

/// 绑定角色与能力的单个智能体
pub struct Agent {
    id: AgentId,
    role: String,
    instructions: Vec<String>,
    capabilities: Vec<Capability>,
    model: Arc<dyn LanguageModel>,
    retrieval_limit: usize,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

impl Agent {
    /// 按配置创建智能体，声明了知识库能力却没有提供索引时报错
    pub fn new(
        spec: AgentSpec,
        model: Arc<dyn LanguageModel>,
        knowledge: Option<Arc<dyn KnowledgeHandle>>,
    ) -> Result<Self, ValidationError> {
        if spec.role.trim().is_empty() {
            return Err(ValidationError::invalid_spec(spec.id, "角色描述不能为空"));
        }
        if spec.instructions.iter().all(|i| i.trim().is_empty()) {
            return Err(ValidationError::invalid_spec(spec.id, "至少需要一条行为指令"));
        }

        let mut capabilities = Vec::new();
        if spec.has_knowledge {
            let handle = knowledge.ok_or_else(|| {
                ValidationError::invalid_spec(spec.id, "声明了知识库能力但未提供文档索引")
            })?;
            capabilities.push(Capability::Knowledge(handle));
        }
        if spec.has_search_tool {
            capabilities.push(Capability::WebSearch);
        }

        Ok(Self {
            id: spec.id,
            role: spec.role,
            instructions: spec
                .instructions
                .into_iter()
                .filter(|i| !i.trim().is_empty())
                .collect(),
            capabilities,
            model,
            retrieval_limit: DEFAULT_RETRIEVAL_LIMIT,
        })
    }

    pub fn with_retrieval_limit(mut self, limit: usize) -> Self {
        self.retrieval_limit = limit.max(1);
        self
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn knowledge(&self) -> Option<&Arc<dyn KnowledgeHandle>> {
        self.capabilities.iter().find_map(|c| match c {
            Capability::Knowledge(handle) => Some(handle),
            Capability::WebSearch => None,
        })
    }

    fn tools(&self) -> Vec<ToolKind> {
        self.capabilities
            .iter()
            .filter_map(|c| match c {
                Capability::WebSearch => Some(ToolKind::WebSearch),
                Capability::Knowledge(_) => None,
            })
            .collect()
    }

    /// 从文档索引检索与查询相关的片段，没有知识库能力时为None
    pub fn retrieve(&self, query: &str) -> Option<Grounding> {
        let handle = self.knowledge()?;
        let matched = handle.search(query, self.retrieval_limit);
        if matched.is_empty() {
            Some(Grounding::Overview(handle.leading(self.retrieval_limit)))
        } else {
            Some(Grounding::Matched(matched))
        }
    }

    /// 系统指令：角色设定、行为要求与能力说明
    pub fn system_instructions(&self) -> String {
        let mut text = format!("你是{}（{}）。\n\n请遵循以下要求：\n", self.role, self.id);
        for (i, instruction) in self.instructions.iter().enumerate() {
            text.push_str(&format!("{}. {}\n", i + 1, instruction));
        }
        if self.knowledge().is_some() {
            text.push_str(
                "\n回答必须以提供的文档参考片段为依据，引用时请标注片段标签（例如 [contract.pdf#3]）。\
                 如果片段中没有相关内容，请明确说明，不要编造文档内容。\n",
            );
        }
        if self.tools().contains(&ToolKind::WebSearch) {
            text.push_str("\n需要外部资料时，可以使用 web_search 工具检索公开的法律案例、判例与法规，并注明来源。\n");
        }
        text.push_str("\n请使用Markdown格式作答。");
        text
    }

    /// 回答查询；按focus检索文档，briefing为团队成员提供的补充材料
    pub async fn respond(
        &self,
        query: &str,
        focus: &str,
        briefing: Option<&str>,
    ) -> Result<Response, GenerationError> {
        let grounding = self.retrieve(focus);
        if let Some(found) = &grounding {
            tracing::debug!(
                agent = %self.id,
                passages = found.passages().len(),
                matched = matches!(found, Grounding::Matched(_)),
                "检索文档片段"
            );
        }

        let prompt = compose_prompt(query, briefing, grounding.as_ref());
        let request =
            CompletionRequest::new(self.system_instructions(), prompt).with_tools(self.tools());

        let text = self
            .model
            .complete(&request)
            .await
            .map_err(|e| e.by_agent(self.id))?;

        let assistant = Message::assistant(self.id.as_str(), text);
        Ok(Response {
            content: assistant.content.clone(),
            messages: vec![Message::user(query), assistant],
            citations: grounding.map(Grounding::into_passages).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl Responder for Agent {
    fn name(&self) -> &str {
        self.id.as_str()
    }

    async fn answer(&self, query: &str, focus: &str) -> Result<Response, GenerationError> {
        self.respond(query, focus, None).await
    }
}

/// 拼接用户提示词：查询、团队材料与文档片段
fn compose_prompt(query: &str, briefing: Option<&str>, grounding: Option<&Grounding>) -> String {
    let mut prompt = String::from(query.trim());
    prompt.push_str("\n\n");

    if let Some(briefing) = briefing {
        prompt.push_str("## 团队成员的分析\n");
        prompt.push_str(briefing.trim());
        prompt.push_str("\n\n");
    }

    if let Some(grounding) = grounding {
        prompt.push_str("## 文档参考片段\n");
        match grounding {
            Grounding::Matched(_) => {}
            Grounding::Overview(passages) if passages.is_empty() => {
                prompt.push_str("未在上传的文档中检索到与该问题相关的片段。\n");
            }
            Grounding::Overview(_) => {
                prompt.push_str("未检索到与问题直接相关的片段，以下是文档开头的内容：\n\n");
            }
        }
        for passage in grounding.passages() {
            prompt.push_str(&format!("{}\n{}\n\n", passage.label(), passage.text.trim()));
        }
    }

    prompt.trim_end().to_string()
}
