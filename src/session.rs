//! 分析会话 - 一份文档对应的知识库与团队

use std::sync::Arc;

use uuid::Uuid;

use crate::analysis::{AnalysisCategory, AnalysisRequest, Pipeline, PipelineOutcome};
use crate::config::{Config, PipelineConfig};
use crate::error::{AnalysisError, ValidationError};
use crate::i18n::TargetLanguage;
use crate::knowledge::{Document, KnowledgeHandle, KnowledgeStore};
use crate::llm::LanguageModel;
use crate::team::{Team, roster};

/// 会话建立后不再修改，处理新文档时整体替换为新的会话
pub struct AnalysisSession {
    id: Uuid,
    knowledge: Arc<dyn KnowledgeHandle>,
    team: Team,
    language: TargetLanguage,
    pipeline: PipelineConfig,
}

impl AnalysisSession {
    /// 为文档建立新索引并组建团队
    pub async fn open(
        config: &Config,
        model: Arc<dyn LanguageModel>,
        store: &dyn KnowledgeStore,
        document: Document,
    ) -> Result<Self, AnalysisError> {
        let knowledge = store.ingest(document).await?;
        Ok(Self::with_knowledge(config, model, knowledge)?)
    }

    pub fn with_knowledge(
        config: &Config,
        model: Arc<dyn LanguageModel>,
        knowledge: Arc<dyn KnowledgeHandle>,
    ) -> Result<Self, ValidationError> {
        let team = roster::assemble(
            model,
            knowledge.clone(),
            config.knowledge.top_k,
            config.llm.max_parallels,
        )?;

        let session = Self {
            id: Uuid::new_v4(),
            knowledge,
            team,
            language: config.target_language,
            pipeline: config.pipeline.clone(),
        };
        tracing::info!(
            session = %session.id,
            document = session.knowledge.document_name(),
            chunks = session.knowledge.chunk_count(),
            "分析会话已建立"
        );
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn knowledge(&self) -> &Arc<dyn KnowledgeHandle> {
        &self.knowledge
    }

    pub fn team(&self) -> &Team {
        &self.team
    }

    pub fn language(&self) -> TargetLanguage {
        self.language
    }

    /// 按分析类型执行流水线，只由该类型的参与成员组成团队
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<PipelineOutcome, AnalysisError> {
        let team = self
            .team
            .scoped(request.config().participating_agent_ids)?;
        let pipeline = Pipeline::new(&team, self.language, self.pipeline.clone());
        Ok(pipeline.run(request).await)
    }

    pub async fn execute(
        &self,
        category: AnalysisCategory,
        custom_text: Option<&str>,
    ) -> Result<PipelineOutcome, AnalysisError> {
        let request = AnalysisRequest::new(category, custom_text)?;
        self.analyze(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Stage;
    use crate::error::{GenerationError, IngestionError};
    use crate::knowledge::InMemoryKnowledgeStore;
    use crate::llm::CompletionRequest;
    use crate::team::{AgentId, Responder};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingModel {
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl RecordingModel {
        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok("结论：条款有效。".to_string())
        }
    }

    async fn open(model: Arc<RecordingModel>, filename: &str, text: &str) -> AnalysisSession {
        AnalysisSession::open(
            &Config::default(),
            model,
            &InMemoryKnowledgeStore::default(),
            Document::new(filename, text.as_bytes()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_new_document_does_not_see_previous_index() {
        let model = Arc::new(RecordingModel::default());
        let first = open(
            model.clone(),
            "lease-a.txt",
            "The lessee must maintain flood insurance on the premises.",
        )
        .await;
        let second = open(
            model.clone(),
            "invoice-b.txt",
            "Payment is due within thirty days of the invoice date.",
        )
        .await;

        assert_ne!(first.id(), second.id());
        assert!(!first.knowledge().search("flood insurance", 5).is_empty());
        assert!(second.knowledge().search("flood insurance", 5).is_empty());

        let outcome = second
            .execute(
                AnalysisCategory::CustomQuery,
                Some("Does the lessee need flood insurance?"),
            )
            .await
            .unwrap();
        assert!(outcome.is_complete());

        let requests = model.requests.lock().unwrap();
        assert!(!requests.is_empty());
        assert!(requests.iter().all(|r| !r.prompt.contains("lease-a.txt")));
    }

    #[tokio::test]
    async fn test_analysis_uses_category_members_only() {
        let model = Arc::new(RecordingModel::default());
        let session = open(
            model.clone(),
            "msa.txt",
            "Either party may terminate this agreement with ninety days notice.",
        )
        .await;

        let outcome = session
            .execute(AnalysisCategory::RiskAssessment, None)
            .await
            .unwrap();
        assert_eq!(outcome.text(Stage::Analysis).as_deref(), Some("结论：条款有效。"));

        // 每个阶段：两名成员加负责人
        assert_eq!(model.calls(), 9);
        let requests = model.requests.lock().unwrap();
        assert!(
            requests
                .iter()
                .all(|r| !r.instructions.contains("Legal Research Expert"))
        );
    }

    #[tokio::test]
    async fn test_blank_custom_query_makes_no_model_calls() {
        let model = Arc::new(RecordingModel::default());
        let session = open(model.clone(), "msa.txt", "Fees are payable annually.").await;

        let err = session
            .execute(AnalysisCategory::CustomQuery, Some(""))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Validation(ValidationError::EmptyCustomQuery)
        ));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_team_run_is_idempotent() {
        let model = Arc::new(RecordingModel::default());
        let session = open(model, "msa.txt", "Fees are payable annually in advance.").await;

        let team = session.team().scoped(&[AgentId::ContractAnalyst]).unwrap();
        let first = team.run("When are fees payable?").await.unwrap();
        let second = team.run("When are fees payable?").await.unwrap();
        assert_eq!(first.content, second.content);
        assert_eq!(first.citations, second.citations);
    }

    #[tokio::test]
    async fn test_unsupported_document_is_ingestion_error() {
        let result = AnalysisSession::open(
            &Config::default(),
            Arc::new(RecordingModel::default()),
            &InMemoryKnowledgeStore::default(),
            Document::new("contract.docx", b"PK".to_vec()),
        )
        .await;
        assert!(matches!(
            result,
            Err(AnalysisError::Ingestion(IngestionError::UnsupportedFormat(_)))
        ));
    }
}
