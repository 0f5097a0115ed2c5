use serde::Serialize;

use super::Stage;
use super::router::{AnalysisCategory, AnalysisRequest};
use crate::config::PipelineConfig;
use crate::error::{GenerationError, ValidationError};
use crate::i18n::TargetLanguage;
use crate::team::{AgentId, Responder, Response};

/// 单个阶段的结果
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Completed(Response),
    Failed(GenerationError),
    /// 前序阶段失败，未执行
    Skipped,
}

impl StageOutcome {
    fn from_result(result: Result<Response, GenerationError>) -> Self {
        match result {
            Ok(response) => StageOutcome::Completed(response),
            Err(e) => StageOutcome::Failed(e),
        }
    }

    /// 完成时返回规范化文本
    pub fn text(&self) -> Option<String> {
        match self {
            StageOutcome::Completed(response) => Some(response.text()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&GenerationError> {
        match self {
            StageOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, StageOutcome::Completed(_))
    }
}

/// 一次流水线执行的三个阶段结果
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub category: AnalysisCategory,
    pub analysis: StageOutcome,
    pub key_points: StageOutcome,
    pub recommendations: StageOutcome,
}

/// 便于导出的文本摘要
#[derive(Debug, Clone, Serialize)]
pub struct PipelineTexts {
    pub analysis: Option<String>,
    pub key_points: Option<String>,
    pub recommendations: Option<String>,
}

impl PipelineOutcome {
    pub fn stage(&self, stage: Stage) -> &StageOutcome {
        match stage {
            Stage::Analysis => &self.analysis,
            Stage::KeyPoints => &self.key_points,
            Stage::Recommendations => &self.recommendations,
        }
    }

    pub fn text(&self, stage: Stage) -> Option<String> {
        self.stage(stage).text()
    }

    pub fn texts(&self) -> PipelineTexts {
        PipelineTexts {
            analysis: self.analysis.text(),
            key_points: self.key_points.text(),
            recommendations: self.recommendations.text(),
        }
    }

    /// 按阶段顺序的第一个错误
    pub fn first_error(&self) -> Option<&GenerationError> {
        Stage::ALL.iter().find_map(|s| self.stage(*s).error())
    }

    pub fn is_complete(&self) -> bool {
        Stage::ALL.iter().all(|s| self.stage(*s).is_completed())
    }
}

/// 三阶段分析流水线：详细分析 → 关键要点 → 建议
pub struct Pipeline<'a> {
    responder: &'a dyn Responder,
    language: TargetLanguage,
    config: PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(responder: &'a dyn Responder, language: TargetLanguage, config: PipelineConfig) -> Self {
        Self {
            responder,
            language,
            config,
        }
    }

    /// 校验输入后执行流水线，校验失败时不会调用模型
    pub async fn execute(
        &self,
        category: AnalysisCategory,
        custom_text: Option<&str>,
    ) -> Result<PipelineOutcome, ValidationError> {
        let request = AnalysisRequest::new(category, custom_text)?;
        Ok(self.run(&request).await)
    }

    pub async fn run(&self, request: &AnalysisRequest) -> PipelineOutcome {
        let category = request.category();
        let agents = request.config().participating_agent_ids;

        let analysis = match self
            .invoke(
                Stage::Analysis,
                &analysis_query(request, self.language),
                analysis_focus(request),
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return PipelineOutcome {
                    category,
                    analysis: StageOutcome::Failed(e),
                    key_points: StageOutcome::Skipped,
                    recommendations: StageOutcome::Skipped,
                };
            }
        };

        let analysis_text = analysis.text();
        if analysis_text.is_empty() {
            tracing::warn!(stage = %Stage::Analysis, "分析阶段没有返回内容");
        }
        if analysis_text.len() > self.config.follow_up_warn_chars {
            tracing::warn!(
                chars = analysis_text.len(),
                limit = self.config.follow_up_warn_chars,
                "分析结果较长，后续阶段的提示词可能超出模型的输入限制"
            );
        }

        let key_points_prompt = key_points_query(&analysis_text, agents, self.language);
        let recommendations_prompt = recommendations_query(&analysis_text, agents, self.language);

        let (key_points, recommendations) = if self.config.concurrent_follow_ups {
            let (key_points, recommendations) = tokio::join!(
                self.invoke(Stage::KeyPoints, &key_points_prompt, &analysis_text),
                self.invoke(
                    Stage::Recommendations,
                    &recommendations_prompt,
                    &analysis_text
                )
            );
            (
                StageOutcome::from_result(key_points),
                StageOutcome::from_result(recommendations),
            )
        } else {
            match self
                .invoke(Stage::KeyPoints, &key_points_prompt, &analysis_text)
                .await
            {
                Ok(key_points) => (
                    StageOutcome::Completed(key_points),
                    StageOutcome::from_result(
                        self.invoke(
                            Stage::Recommendations,
                            &recommendations_prompt,
                            &analysis_text,
                        )
                        .await,
                    ),
                ),
                Err(e) => (StageOutcome::Failed(e), StageOutcome::Skipped),
            }
        };

        PipelineOutcome {
            category,
            analysis: StageOutcome::Completed(analysis),
            key_points,
            recommendations,
        }
    }

    /// 以focus检索文档，以query作为提示词
    async fn invoke(
        &self,
        stage: Stage,
        query: &str,
        focus: &str,
    ) -> Result<Response, GenerationError> {
        tracing::info!(stage = %stage, responder = self.responder.name(), "开始执行阶段");
        let result = self
            .responder
            .answer(query, focus)
            .await
            .map_err(|e| e.at_stage(stage));
        match &result {
            Ok(_) => tracing::info!(stage = %stage, "阶段完成"),
            Err(e) => tracing::error!(stage = %stage, error = %e, "阶段失败"),
        }
        result
    }
}

fn agent_ids(agents: &[AgentId]) -> String {
    agents
        .iter()
        .map(AgentId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn agent_names(agents: &[AgentId], language: TargetLanguage) -> String {
    agents
        .iter()
        .map(|id| language.agent_display_name(*id))
        .collect::<Vec<_>>()
        .join(", ")
}

/// 第一阶段检索文档所用的任务内容：分析模板或自定义问题
pub fn analysis_focus(request: &AnalysisRequest) -> &str {
    request
        .config()
        .query_template
        .or(request.custom_text())
        .unwrap_or_default()
}

/// 第一阶段：模板任务或自定义问题，要求以文档为依据
pub fn analysis_query(request: &AnalysisRequest, language: TargetLanguage) -> String {
    let config = request.config();
    let focus = agent_ids(config.participating_agent_ids);
    let instruction = language.response_instruction();

    match (config.query_template, request.custom_text()) {
        (Some(template), _) => format!(
            "使用上传的文档作为参考：\n\n\
             主要分析任务：{template}\n\
             关注领域：{focus}\n\n\
             请搜索知识库并提供文档中的具体参考内容。{instruction}"
        ),
        (None, custom) => format!(
            "使用上传的文档作为参考：\n\n\
             {}\n\n\
             请搜索知识库并提供文档中的具体参考内容。\n\
             关注领域：{focus}\n\
             {instruction}",
            custom.unwrap_or_default()
        ),
    }
}

/// 第二阶段：把分析结果整理为要点列表
pub fn key_points_query(analysis: &str, agents: &[AgentId], language: TargetLanguage) -> String {
    format!(
        "基于之前的分析：\n{}\n\n\
         请用要点列表总结关键内容。\n\
         重点关注来自以下专家的见解：{}\n\
         {}",
        analysis,
        agent_names(agents, language),
        language.response_instruction()
    )
}

/// 第三阶段：基于分析结果给出行动建议
pub fn recommendations_query(
    analysis: &str,
    agents: &[AgentId],
    language: TargetLanguage,
) -> String {
    format!(
        "基于之前的分析：\n{}\n\n\
         根据分析结果，您的主要建议和最佳行动方案是什么？\n\
         请提供来自以下专家的具体建议：{}\n\
         {}",
        analysis,
        agent_names(agents, language),
        language.response_instruction()
    )
}
