use async_trait::async_trait;
use legal_agent_team::config::Config;
use legal_agent_team::knowledge::{Document, InMemoryKnowledgeStore, KnowledgeStore};
use legal_agent_team::llm::{CompletionRequest, LanguageModel};
use legal_agent_team::workflow;
use legal_agent_team::{
    AnalysisCategory, AnalysisError, AnalysisRequest, AnalysisSession, GenerationError, Stage,
    ValidationError,
};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const LEASE: &str = "# Commercial Lease Agreement

## 1. Term
The lease term is five years commencing on 1 March 2025.

## 2. Rent
The tenant shall pay monthly rent of 12,000 USD on the first business day of each month.
Late payment accrues interest at 1.5% per month.

## 3. Termination
The landlord may terminate this lease with thirty days written notice if rent is unpaid for two consecutive months.

## 4. Insurance
The tenant must maintain public liability insurance of at least 2,000,000 USD.
";

/// 按阶段提示词返回固定文本的后端，负责人之外的成员回答各自的角色名
#[derive(Default)]
struct StageScriptedModel {
    requests: Mutex<Vec<CompletionRequest>>,
}

impl StageScriptedModel {
    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for StageScriptedModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());

        if !request.instructions.contains("legal_team_lead") {
            return Ok("member notes".to_string());
        }
        let reply = if request.prompt.contains("请用要点列表总结关键内容") {
            "K1"
        } else if request.prompt.contains("最佳行动方案") {
            "Rec1"
        } else {
            "R1"
        };
        Ok(reply.to_string())
    }
}

fn write_lease(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("lease.md");
    fs::write(&path, LEASE).unwrap();
    path
}

async fn open_session(model: Arc<StageScriptedModel>, filename: &str, text: &str) -> AnalysisSession {
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
async fn test_risk_assessment_end_to_end() {
    let model = Arc::new(StageScriptedModel::default());
    let session = open_session(model.clone(), "lease.md", LEASE).await;

    let outcome = session
        .execute(AnalysisCategory::RiskAssessment, None)
        .await
        .unwrap();

    assert_eq!(outcome.text(Stage::Analysis).as_deref(), Some("R1"));
    assert_eq!(outcome.text(Stage::KeyPoints).as_deref(), Some("K1"));
    assert_eq!(outcome.text(Stage::Recommendations).as_deref(), Some("Rec1"));

    let requests = model.requests();
    // 三个阶段，每阶段合同分析师、法律策略师和负责人各一次
    assert_eq!(requests.len(), 9);
    assert!(
        requests
            .iter()
            .all(|r| !r.instructions.contains("legal_researcher"))
    );

    // 后续阶段的提示词中带有第一阶段的结论和文档片段
    let follow_ups: Vec<_> = requests
        .iter()
        .filter(|r| r.prompt.contains("基于之前的分析"))
        .collect();
    assert_eq!(follow_ups.len(), 6);
    assert!(follow_ups.iter().all(|r| r.prompt.contains("R1")));
    assert!(requests.iter().any(|r| r.prompt.contains("[lease.md#")));
}

#[tokio::test]
async fn test_agents_retrieve_before_answering() {
    let model = Arc::new(StageScriptedModel::default());
    let session = open_session(model.clone(), "lease.md", LEASE).await;

    session
        .execute(
            AnalysisCategory::CustomQuery,
            Some("How much public liability insurance must the tenant maintain?"),
        )
        .await
        .unwrap();

    let first_stage: Vec<_> = model
        .requests()
        .into_iter()
        .filter(|r| r.prompt.contains("public liability insurance must the tenant"))
        .collect();
    assert_eq!(first_stage.len(), 4);
    assert!(
        first_stage
            .iter()
            .all(|r| r.prompt.contains("2,000,000 USD"))
    );
}

#[tokio::test]
async fn test_reuploading_replaces_index() {
    let model = Arc::new(StageScriptedModel::default());
    let lease = open_session(model.clone(), "lease.md", LEASE).await;
    let nda = open_session(
        model.clone(),
        "nda.txt",
        "The recipient shall not disclose confidential information to any third party.",
    )
    .await;

    assert!(!lease.knowledge().search("liability insurance", 3).is_empty());
    assert!(nda.knowledge().search("liability insurance", 3).is_empty());
    assert_eq!(nda.knowledge().document_name(), "nda.txt");
    assert_eq!(
        nda.team().coordinator().knowledge().unwrap().document_name(),
        "nda.txt"
    );
}

#[tokio::test]
async fn test_blank_custom_query_never_reaches_backend() {
    let model = Arc::new(StageScriptedModel::default());
    let session = open_session(model.clone(), "lease.md", LEASE).await;

    let err = session
        .execute(AnalysisCategory::CustomQuery, Some("   "))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::Validation(ValidationError::EmptyCustomQuery)
    ));
    assert!(model.requests().is_empty());
}

#[tokio::test]
async fn test_store_rejects_empty_document() {
    let store = InMemoryKnowledgeStore::default();
    let result = store.ingest(Document::new("empty.txt", "  \n\n ")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_workflow_saves_markdown_report() {
    let temp_dir = TempDir::new().unwrap();
    let document = write_lease(temp_dir.path());
    let report_path = temp_dir.path().join("reports").join("lease-review.md");

    let mut config = Config::default();
    config.output_path = Some(report_path.clone());

    let request = AnalysisRequest::new(AnalysisCategory::ComplianceCheck, None).unwrap();
    let outcome = workflow::execute(
        &config,
        Arc::new(StageScriptedModel::default()),
        &InMemoryKnowledgeStore::new(config.knowledge.clone()),
        &document,
        &request,
    )
    .await
    .unwrap();
    assert!(outcome.is_complete());

    let report = fs::read_to_string(&report_path).unwrap();
    assert!(report.contains("## 详细分析\n\nR1"));
    assert!(report.contains("## 关键要点\n\nK1"));
    assert!(report.contains("## 建议\n\nRec1"));
    assert!(report.contains("法律研究员, 合同分析师, 法律策略师"));
}
