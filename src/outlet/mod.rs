//! 分析报告的渲染与输出

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::PathBuf;

use crate::analysis::{AnalysisCategory, PipelineOutcome, Stage, StageOutcome, router};
use crate::i18n::{ReportLabel, TargetLanguage};

/// 一次分析的完整报告
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub document: String,
    pub language: TargetLanguage,
    pub generated_at: DateTime<Local>,
    pub outcome: PipelineOutcome,
}

impl AnalysisReport {
    pub fn new(document: impl Into<String>, language: TargetLanguage, outcome: PipelineOutcome) -> Self {
        Self {
            document: document.into(),
            language,
            generated_at: Local::now(),
            outcome,
        }
    }

    pub fn category(&self) -> AnalysisCategory {
        self.outcome.category
    }

    /// 渲染为Markdown，三个阶段各占一节，失败和跳过的阶段会明确标注
    pub fn render(&self) -> String {
        let lang = self.language;
        let category = self.category();
        let config = router::resolve(category);
        let experts = config
            .participating_agent_ids
            .iter()
            .map(|id| lang.agent_display_name(*id))
            .collect::<Vec<_>>()
            .join(", ");

        let mut markdown = format!("# {} {}\n\n", category.icon(), config.description);
        markdown.push_str(&format!(
            "- **{}**: {}\n- **{}**: {}\n- **{}**: {}\n",
            lang.report_label(ReportLabel::Document),
            self.document,
            lang.report_label(ReportLabel::Experts),
            experts,
            lang.report_label(ReportLabel::GeneratedAt),
            self.generated_at.format("%Y-%m-%d %H:%M:%S"),
        ));

        for stage in Stage::ALL {
            markdown.push_str(&format!("\n## {}\n\n", lang.stage_title(stage)));
            markdown.push_str(&self.render_stage(self.outcome.stage(stage)));
            markdown.push('\n');
        }

        markdown
    }

    fn render_stage(&self, outcome: &StageOutcome) -> String {
        let lang = self.language;
        match outcome {
            StageOutcome::Completed(response) => {
                let text = response.text();
                if text.trim().is_empty() {
                    format!("_{}_\n", lang.report_label(ReportLabel::Empty))
                } else {
                    format!("{}\n", text.trim_end())
                }
            }
            StageOutcome::Failed(e) => format!(
                "> ❌ {}: {}\n",
                lang.report_label(ReportLabel::Failed),
                e
            ),
            StageOutcome::Skipped => {
                format!("> ⏭️ {}\n", lang.report_label(ReportLabel::Skipped))
            }
        }
    }
}

/// 报告输出目标
pub trait Outlet {
    async fn save(&self, report: &AnalysisReport) -> Result<()>;
}

/// 输出到终端
pub struct ConsoleOutlet;

impl Outlet for ConsoleOutlet {
    async fn save(&self, report: &AnalysisReport) -> Result<()> {
        println!("\n{}", report.render());
        Ok(())
    }
}

/// 保存为Markdown文件
pub struct DiskOutlet {
    path: PathBuf,
}

impl DiskOutlet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Outlet for DiskOutlet {
    async fn save(&self, report: &AnalysisReport) -> Result<()> {
        println!("\n🖊️ 报告存储中...");
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("无法创建目录 {}", parent.display()))?;
        }
        tokio::fs::write(&self.path, report.render())
            .await
            .with_context(|| format!("无法写入报告 {}", self.path.display()))?;
        println!("💾 报告已保存到 {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::team::Response;
    use tempfile::TempDir;

    fn partial_outcome() -> PipelineOutcome {
        PipelineOutcome {
            category: AnalysisCategory::RiskAssessment,
            analysis: StageOutcome::Completed(Response::from_text("R1")),
            key_points: StageOutcome::Failed(
                GenerationError::new("quota exceeded").at_stage(Stage::KeyPoints),
            ),
            recommendations: StageOutcome::Skipped,
        }
    }

    #[test]
    fn test_render_labels_sections_and_flags_failures() {
        let report = AnalysisReport::new("lease.pdf", TargetLanguage::Chinese, partial_outcome());
        let markdown = report.render();

        assert!(markdown.starts_with("# ⚠️ 综合风险分析和战略评估"));
        assert!(markdown.contains("lease.pdf"));
        assert!(markdown.contains("合同分析师, 法律策略师"));
        assert!(markdown.contains("## 详细分析\n\nR1\n"));
        assert!(markdown.contains("## 关键要点"));
        assert!(markdown.contains("quota exceeded"));
        assert!(markdown.contains("因前序阶段失败而跳过"));

        let analysis = markdown.find("## 详细分析").unwrap();
        let key_points = markdown.find("## 关键要点").unwrap();
        let recommendations = markdown.find("## 建议").unwrap();
        assert!(analysis < key_points && key_points < recommendations);
    }

    #[test]
    fn test_render_marks_empty_stage() {
        let outcome = PipelineOutcome {
            category: AnalysisCategory::ContractReview,
            analysis: StageOutcome::Completed(Response::default()),
            key_points: StageOutcome::Completed(Response::from_text("K1")),
            recommendations: StageOutcome::Completed(Response::from_text("Rec1")),
        };
        let markdown = AnalysisReport::new("msa.txt", TargetLanguage::English, outcome).render();
        assert!(markdown.contains("## Detailed Analysis\n\n_(no content returned)_"));
        assert!(markdown.contains("## Recommendations\n\nRec1"));
    }

    #[tokio::test]
    async fn test_disk_outlet_writes_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports").join("lease.md");
        let report = AnalysisReport::new("lease.pdf", TargetLanguage::Chinese, partial_outcome());

        DiskOutlet::new(&path).save(&report).await.unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert_eq!(saved, report.render());
    }
}
