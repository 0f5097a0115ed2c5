use serde::{Deserialize, Serialize};

use crate::analysis::Stage;
use crate::team::AgentId;

/// 目标语言类型
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetLanguage {
    #[serde(rename = "zh")]
    #[default]
    Chinese,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "ru")]
    Russian,
}

impl std::fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetLanguage::Chinese => write!(f, "zh"),
            TargetLanguage::English => write!(f, "en"),
            TargetLanguage::Japanese => write!(f, "ja"),
            TargetLanguage::Korean => write!(f, "ko"),
            TargetLanguage::German => write!(f, "de"),
            TargetLanguage::French => write!(f, "fr"),
            TargetLanguage::Russian => write!(f, "ru"),
        }
    }
}

impl std::str::FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zh" | "chinese" | "中文" => Ok(TargetLanguage::Chinese),
            "en" | "english" | "英文" => Ok(TargetLanguage::English),
            "ja" | "japanese" | "日本語" | "日文" => Ok(TargetLanguage::Japanese),
            "ko" | "korean" | "한국어" | "韩文" => Ok(TargetLanguage::Korean),
            "de" | "german" | "deutsch" | "德文" => Ok(TargetLanguage::German),
            "fr" | "french" | "français" | "法文" => Ok(TargetLanguage::French),
            "ru" | "russian" | "русский" | "俄文" => Ok(TargetLanguage::Russian),
            _ => Err(format!("Unknown target language: {}", s)),
        }
    }
}

impl TargetLanguage {
    /// 获取语言的描述性名称
    pub fn display_name(&self) -> &'static str {
        match self {
            TargetLanguage::Chinese => "中文",
            TargetLanguage::English => "English",
            TargetLanguage::Japanese => "日本語",
            TargetLanguage::Korean => "한국어",
            TargetLanguage::German => "Deutsch",
            TargetLanguage::French => "Français",
            TargetLanguage::Russian => "Русский",
        }
    }

    /// 要求模型使用目标语言作答的指令
    pub fn response_instruction(&self) -> &'static str {
        match self {
            TargetLanguage::Chinese => "请用中文回复。",
            TargetLanguage::English => "Please respond in English.",
            TargetLanguage::Japanese => "日本語で回答してください。",
            TargetLanguage::Korean => "한국어로 답변해 주세요.",
            TargetLanguage::German => "Bitte antworten Sie auf Deutsch.",
            TargetLanguage::French => "Veuillez répondre en français.",
            TargetLanguage::Russian => "Пожалуйста, отвечайте на русском языке.",
        }
    }

    /// 智能体角色的展示名称
    pub fn agent_display_name(&self, agent: AgentId) -> &'static str {
        match (self, agent) {
            (TargetLanguage::Chinese, AgentId::LegalResearcher) => "法律研究员",
            (TargetLanguage::Chinese, AgentId::ContractAnalyst) => "合同分析师",
            (TargetLanguage::Chinese, AgentId::LegalStrategist) => "法律策略师",
            (TargetLanguage::Chinese, AgentId::TeamLead) => "法律团队负责人",
            (TargetLanguage::Japanese, AgentId::LegalResearcher) => "法律リサーチャー",
            (TargetLanguage::Japanese, AgentId::ContractAnalyst) => "契約アナリスト",
            (TargetLanguage::Japanese, AgentId::LegalStrategist) => "法務ストラテジスト",
            (TargetLanguage::Japanese, AgentId::TeamLead) => "法務チームリーダー",
            (TargetLanguage::Korean, AgentId::LegalResearcher) => "법률 연구원",
            (TargetLanguage::Korean, AgentId::ContractAnalyst) => "계약 분석가",
            (TargetLanguage::Korean, AgentId::LegalStrategist) => "법률 전략가",
            (TargetLanguage::Korean, AgentId::TeamLead) => "법률팀 리더",
            (TargetLanguage::German, AgentId::LegalResearcher) => "Rechtsrechercheur",
            (TargetLanguage::German, AgentId::ContractAnalyst) => "Vertragsanalyst",
            (TargetLanguage::German, AgentId::LegalStrategist) => "Rechtsstratege",
            (TargetLanguage::German, AgentId::TeamLead) => "Teamleiter Recht",
            (TargetLanguage::French, AgentId::LegalResearcher) => "Chercheur juridique",
            (TargetLanguage::French, AgentId::ContractAnalyst) => "Analyste de contrats",
            (TargetLanguage::French, AgentId::LegalStrategist) => "Stratège juridique",
            (TargetLanguage::French, AgentId::TeamLead) => "Chef d'équipe juridique",
            (TargetLanguage::Russian, AgentId::LegalResearcher) => "Юрист-исследователь",
            (TargetLanguage::Russian, AgentId::ContractAnalyst) => "Аналитик договоров",
            (TargetLanguage::Russian, AgentId::LegalStrategist) => "Юридический стратег",
            (TargetLanguage::Russian, AgentId::TeamLead) => "Руководитель юридической команды",
            (TargetLanguage::English, AgentId::LegalResearcher) => "Legal Researcher",
            (TargetLanguage::English, AgentId::ContractAnalyst) => "Contract Analyst",
            (TargetLanguage::English, AgentId::LegalStrategist) => "Legal Strategist",
            (TargetLanguage::English, AgentId::TeamLead) => "Legal Team Lead",
        }
    }

    /// 报告中各阶段的小节标题
    pub fn stage_title(&self, stage: Stage) -> &'static str {
        match (self, stage) {
            (TargetLanguage::Chinese, Stage::Analysis) => "详细分析",
            (TargetLanguage::Chinese, Stage::KeyPoints) => "关键要点",
            (TargetLanguage::Chinese, Stage::Recommendations) => "建议",
            (TargetLanguage::Japanese, Stage::Analysis) => "詳細分析",
            (TargetLanguage::Japanese, Stage::KeyPoints) => "重要ポイント",
            (TargetLanguage::Japanese, Stage::Recommendations) => "推奨事項",
            (TargetLanguage::Korean, Stage::Analysis) => "상세 분석",
            (TargetLanguage::Korean, Stage::KeyPoints) => "핵심 요점",
            (TargetLanguage::Korean, Stage::Recommendations) => "권고 사항",
            (TargetLanguage::German, Stage::Analysis) => "Detaillierte Analyse",
            (TargetLanguage::German, Stage::KeyPoints) => "Kernpunkte",
            (TargetLanguage::German, Stage::Recommendations) => "Empfehlungen",
            (TargetLanguage::French, Stage::Analysis) => "Analyse détaillée",
            (TargetLanguage::French, Stage::KeyPoints) => "Points clés",
            (TargetLanguage::French, Stage::Recommendations) => "Recommandations",
            (TargetLanguage::Russian, Stage::Analysis) => "Подробный анализ",
            (TargetLanguage::Russian, Stage::KeyPoints) => "Ключевые моменты",
            (TargetLanguage::Russian, Stage::Recommendations) => "Рекомендации",
            (TargetLanguage::English, Stage::Analysis) => "Detailed Analysis",
            (TargetLanguage::English, Stage::KeyPoints) => "Key Points",
            (TargetLanguage::English, Stage::Recommendations) => "Recommendations",
        }
    }
}

/// 报告中的固定文案
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLabel {
    Document,
    Experts,
    GeneratedAt,
    Empty,
    Failed,
    Skipped,
}

impl TargetLanguage {
    pub fn report_label(&self, label: ReportLabel) -> &'static str {
        let labels: [&'static str; 6] = match self {
            TargetLanguage::Chinese => [
                "文档",
                "参与专家",
                "生成时间",
                "（未返回内容）",
                "该阶段执行失败",
                "因前序阶段失败而跳过",
            ],
            TargetLanguage::English => [
                "Document",
                "Experts",
                "Generated at",
                "(no content returned)",
                "This stage failed",
                "Skipped because an earlier stage failed",
            ],
            TargetLanguage::Japanese => [
                "文書",
                "参加エキスパート",
                "生成日時",
                "（内容が返されませんでした）",
                "この段階は失敗しました",
                "前の段階が失敗したためスキップされました",
            ],
            TargetLanguage::Korean => [
                "문서",
                "참여 전문가",
                "생성 시간",
                "(반환된 내용 없음)",
                "이 단계는 실패했습니다",
                "이전 단계 실패로 건너뛰었습니다",
            ],
            TargetLanguage::German => [
                "Dokument",
                "Beteiligte Experten",
                "Erstellt am",
                "(kein Inhalt zurückgegeben)",
                "Dieser Schritt ist fehlgeschlagen",
                "Übersprungen, da ein vorheriger Schritt fehlgeschlagen ist",
            ],
            TargetLanguage::French => [
                "Document",
                "Experts participants",
                "Généré le",
                "(aucun contenu renvoyé)",
                "Cette étape a échoué",
                "Ignorée car une étape précédente a échoué",
            ],
            TargetLanguage::Russian => [
                "Документ",
                "Участвующие эксперты",
                "Дата создания",
                "(содержимое не получено)",
                "Этот этап завершился ошибкой",
                "Пропущено из-за ошибки на предыдущем этапе",
            ],
        };
        labels[label as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_language_roundtrip() {
        for lang in [
            TargetLanguage::Chinese,
            TargetLanguage::English,
            TargetLanguage::Japanese,
            TargetLanguage::Korean,
            TargetLanguage::German,
            TargetLanguage::French,
            TargetLanguage::Russian,
        ] {
            assert_eq!(lang.to_string().parse::<TargetLanguage>().unwrap(), lang);
        }
    }

    #[test]
    fn test_target_language_aliases() {
        assert_eq!("中文".parse::<TargetLanguage>().unwrap(), TargetLanguage::Chinese);
        assert_eq!("English".parse::<TargetLanguage>().unwrap(), TargetLanguage::English);
        assert!("klingon".parse::<TargetLanguage>().is_err());
    }

    #[test]
    fn test_agent_display_names() {
        assert_eq!(
            TargetLanguage::Chinese.agent_display_name(AgentId::ContractAnalyst),
            "合同分析师"
        );
        assert_eq!(
            TargetLanguage::English.agent_display_name(AgentId::LegalStrategist),
            "Legal Strategist"
        );
    }

    #[test]
    fn test_report_labels() {
        assert_eq!(TargetLanguage::Chinese.report_label(ReportLabel::Document), "文档");
        assert_eq!(
            TargetLanguage::English.report_label(ReportLabel::Skipped),
            "Skipped because an earlier stage failed"
        );
    }

    #[test]
    fn test_stage_titles() {
        assert_eq!(TargetLanguage::Chinese.stage_title(Stage::KeyPoints), "关键要点");
        assert_eq!(
            TargetLanguage::English.stage_title(Stage::Recommendations),
            "Recommendations"
        );
    }
}
