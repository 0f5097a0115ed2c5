//! 分析流程 - 分析类型路由与三阶段流水线

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod pipeline;
pub mod router;

pub use pipeline::{Pipeline, PipelineOutcome, StageOutcome};
pub use router::{AnalysisCategory, AnalysisConfig, AnalysisRequest};

/// 流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// 详细分析
    Analysis,
    /// 关键要点
    KeyPoints,
    /// 建议
    Recommendations,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Analysis, Stage::KeyPoints, Stage::Recommendations];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Analysis => "analysis",
            Stage::KeyPoints => "key_points",
            Stage::Recommendations => "recommendations",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
