use anyhow::{Context, Result, anyhow};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::analysis::{AnalysisRequest, PipelineOutcome};
use crate::config::Config;
use crate::knowledge::{Document, InMemoryKnowledgeStore, KnowledgeHandle, KnowledgeStore};
use crate::llm::{LLMClient, LanguageModel};
use crate::outlet::{AnalysisReport, ConsoleOutlet, DiskOutlet, Outlet};
use crate::session::AnalysisSession;

/// 时间跟踪作用域
pub struct TimingScope {
    start_time: Instant,
    phase_start_times: HashMap<&'static str, Instant>,
    phase_durations: Vec<(&'static str, Duration)>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_start_times: HashMap::new(),
            phase_durations: Vec::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, phase_name: &'static str) {
        self.phase_start_times.insert(phase_name, Instant::now());
    }

    /// 结束一个阶段的计时
    pub fn end_phase(&mut self, phase_name: &'static str) -> Option<Duration> {
        let duration = self.phase_start_times.remove(phase_name)?.elapsed();
        self.phase_durations.push((phase_name, duration));
        Some(duration)
    }

    pub fn phase_durations(&self) -> &[(&'static str, Duration)] {
        &self.phase_durations
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "总执行时间: {:.2}秒\n",
            self.start_time.elapsed().as_secs_f64()
        );
        if !self.phase_durations.is_empty() {
            report.push_str("\n各阶段执行时间:\n");
            for (phase, duration) in &self.phase_durations {
                report.push_str(&format!("- {}: {:.3}秒\n", phase, duration.as_secs_f64()));
            }
        }
        report
    }
}

/// 时间跟踪常量
pub struct TimingKeys;

impl TimingKeys {
    pub const INGEST: &'static str = "ingest";
    pub const ANALYSIS: &'static str = "analysis";
    pub const OUTPUT: &'static str = "output";
}

/// 启动文档分析工作流，任一阶段失败时在输出报告后返回错误
pub async fn launch(config: &Config, document: &Path, request: &AnalysisRequest) -> Result<()> {
    let mut timing = TimingScope::new();
    let store = InMemoryKnowledgeStore::new(config.knowledge.clone());
    let knowledge = ingest(&store, document, &mut timing).await?;

    let client = LLMClient::new(config)?;
    // 文档可用后再检查模型连接
    client.check_connection().await?;

    let outcome = analyze(config, Arc::new(client), knowledge, request, timing).await?;

    match outcome.first_error() {
        Some(e) => Err(anyhow!(e.clone())).context("分析未能全部完成，已输出已完成阶段的结果"),
        None => Ok(()),
    }
}

/// 在给定模型与知识库上执行：索引文档、运行流水线、输出报告
pub async fn execute(
    config: &Config,
    model: Arc<dyn LanguageModel>,
    store: &dyn KnowledgeStore,
    document: &Path,
    request: &AnalysisRequest,
) -> Result<PipelineOutcome> {
    let mut timing = TimingScope::new();
    let knowledge = ingest(store, document, &mut timing).await?;
    analyze(config, model, knowledge, request, timing).await
}

async fn ingest(
    store: &dyn KnowledgeStore,
    path: &Path,
    timing: &mut TimingScope,
) -> Result<Arc<dyn KnowledgeHandle>> {
    timing.start_phase(TimingKeys::INGEST);
    println!("📄 正在处理文档 {} ...", path.display());
    let document = Document::from_path(path)
        .await
        .with_context(|| format!("无法读取文档 {}", path.display()))?;
    let knowledge = store.ingest(document).await.context("文档处理错误")?;
    println!("✅ 文档处理完成（{}个片段）", knowledge.chunk_count());
    timing.end_phase(TimingKeys::INGEST);
    Ok(knowledge)
}

async fn analyze(
    config: &Config,
    model: Arc<dyn LanguageModel>,
    knowledge: Arc<dyn KnowledgeHandle>,
    request: &AnalysisRequest,
    mut timing: TimingScope,
) -> Result<PipelineOutcome> {
    let document_name = knowledge.document_name().to_string();
    let session =
        AnalysisSession::with_knowledge(config, model, knowledge).context("团队初始化失败")?;
    println!("✅ 团队已初始化！");

    let category = request.category();
    let analysis_config = request.config();
    let experts = analysis_config
        .participating_agent_ids
        .iter()
        .map(|id| config.target_language.agent_display_name(*id))
        .collect::<Vec<_>>()
        .join(", ");
    println!("\n{} {}", category.icon(), category);
    println!("📋 {}", analysis_config.description);
    println!("🤖 当前活动的法律AI专家: {}", experts);

    timing.start_phase(TimingKeys::ANALYSIS);
    println!("⏳ 正在分析文档...");
    let outcome = session.analyze(request).await?;
    timing.end_phase(TimingKeys::ANALYSIS);

    timing.start_phase(TimingKeys::OUTPUT);
    let report = AnalysisReport::new(document_name, config.target_language, outcome);
    ConsoleOutlet.save(&report).await?;
    if let Some(path) = &config.output_path {
        DiskOutlet::new(path).save(&report).await?;
    }
    timing.end_phase(TimingKeys::OUTPUT);

    match report.outcome.first_error() {
        Some(e) => eprintln!("❌ 分析过程中出错: {}", e),
        None => println!("🎉 分析完成"),
    }
    if config.verbose {
        println!("\n{}", timing.generate_timing_report());
    }

    Ok(report.outcome)
}
