use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};

use super::agent::{Agent, AgentId, Responder};
use super::response::{Message, Response};
use crate::error::{GenerationError, ValidationError};
use crate::knowledge::Passage;

/// 默认同时咨询的成员数
const DEFAULT_MAX_PARALLELS: usize = 3;

/// 由负责人协调多名成员的复合智能体
#[derive(Debug, Clone)]
pub struct Team {
    coordinator: Arc<Agent>,
    members: Vec<Arc<Agent>>,
    max_parallels: usize,
}

impl Team {
    /// 成员不能为空、不能重复，负责人也不能同时作为成员
    pub fn new(coordinator: Agent, members: Vec<Agent>) -> Result<Self, ValidationError> {
        Self::from_shared(
            Arc::new(coordinator),
            members.into_iter().map(Arc::new).collect(),
            DEFAULT_MAX_PARALLELS,
        )
    }

    fn from_shared(
        coordinator: Arc<Agent>,
        members: Vec<Arc<Agent>>,
        max_parallels: usize,
    ) -> Result<Self, ValidationError> {
        if members.is_empty() {
            return Err(ValidationError::invalid_spec(
                coordinator.id(),
                "团队至少需要一名成员",
            ));
        }

        let mut seen = HashSet::new();
        for member in &members {
            if member.id() == coordinator.id() {
                return Err(ValidationError::invalid_spec(
                    member.id(),
                    "团队负责人不能同时作为成员",
                ));
            }
            if !seen.insert(member.id()) {
                return Err(ValidationError::invalid_spec(member.id(), "成员重复"));
            }
        }

        Ok(Self {
            coordinator,
            members,
            max_parallels: max_parallels.max(1),
        })
    }

    pub fn with_max_parallels(mut self, max_parallels: usize) -> Self {
        self.max_parallels = max_parallels.max(1);
        self
    }

    pub fn coordinator(&self) -> &Agent {
        &self.coordinator
    }

    pub fn member_ids(&self) -> Vec<AgentId> {
        self.members.iter().map(|m| m.id()).collect()
    }

    pub fn member(&self, id: AgentId) -> Option<&Arc<Agent>> {
        self.members.iter().find(|m| m.id() == id)
    }

    /// 只保留指定成员的子团队，成员与原团队共享，顺序沿用原团队
    pub fn scoped(&self, ids: &[AgentId]) -> Result<Team, ValidationError> {
        if let Some(unknown) = ids.iter().find(|id| self.member(**id).is_none()) {
            return Err(ValidationError::UnknownAgent(unknown.to_string()));
        }

        let members = self
            .members
            .iter()
            .filter(|m| ids.contains(&m.id()))
            .cloned()
            .collect();

        Self::from_shared(self.coordinator.clone(), members, self.max_parallels)
    }

    /// 按成员顺序整理各成员的发言，供负责人汇总
    fn briefing(&self, answers: &[(Arc<Agent>, Response)]) -> String {
        answers
            .iter()
            .map(|(member, response)| {
                let text = response.text();
                let body = if text.is_empty() {
                    "（未给出有效回答）".to_string()
                } else {
                    text
                };
                format!("### {}（{}）\n{}", member.role(), member.id(), body)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[async_trait]
impl Responder for Team {
    fn name(&self) -> &str {
        self.coordinator.id().as_str()
    }

    async fn answer(&self, query: &str, focus: &str) -> Result<Response, GenerationError> {
        tracing::debug!(
            members = ?self.member_ids(),
            max_parallels = self.max_parallels,
            "团队开始分析"
        );

        // buffered保持成员顺序，任一成员失败即整体失败
        let answers: Vec<(Arc<Agent>, Response)> = stream::iter(self.members.iter().cloned())
            .map(|member| async move {
                let response = member.answer(query, focus).await?;
                Ok::<_, GenerationError>((member, response))
            })
            .buffered(self.max_parallels)
            .try_collect()
            .await?;

        let briefing = self.briefing(&answers);
        let summary = self
            .coordinator
            .respond(query, focus, Some(&briefing))
            .await?;

        let mut messages = vec![Message::user(query)];
        let mut citations: Vec<Passage> = Vec::new();
        let mut cited = HashSet::new();

        for (_, response) in &answers {
            messages.extend(
                response
                    .messages
                    .iter()
                    .filter(|m| m.name.is_some())
                    .cloned(),
            );
        }
        messages.extend(summary.messages.iter().filter(|m| m.name.is_some()).cloned());

        for passage in summary
            .citations
            .iter()
            .chain(answers.iter().flat_map(|(_, r)| r.citations.iter()))
        {
            if cited.insert((passage.document.clone(), passage.chunk_id)) {
                citations.push(passage.clone());
            }
        }

        Ok(Response {
            content: summary.content,
            messages,
            citations,
        })
    }
}
