use crate::analysis::{AnalysisCategory, AnalysisRequest};
use crate::config::{Config, LLMProvider};
use crate::error::ValidationError;
use crate::i18n::TargetLanguage;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Legal Agent Team - 基于多智能体协作的法律文档分析工具
#[derive(Parser, Debug)]
#[command(name = "legal-agent-team")]
#[command(
    about = "Upload a legal document and let a team of AI legal experts (researcher, contract analyst, strategist) analyse it: detailed analysis, key points and recommendations."
)]
#[command(version)]
pub struct Args {
    /// 待分析的法律文档（pdf、txt、md）
    #[arg(short, long)]
    pub document: PathBuf,

    /// 分析类型 (contract-review, legal-research, risk-assessment, compliance-check, custom-query)
    #[arg(short = 't', long, default_value = "contract-review")]
    pub category: AnalysisCategory,

    /// 自定义查询的问题，仅在custom-query时使用
    #[arg(short, long)]
    pub query: Option<String>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 报告保存路径
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// 高能效模型，用于常规篇幅的分析请求
    #[arg(long)]
    pub model_efficient: Option<String>,

    /// 高质量模型，用于长篇幅请求，以及作为efficient失效情况下的兜底
    #[arg(long)]
    pub model_powerful: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 团队成员并发咨询的上限
    #[arg(long)]
    pub max_parallels: Option<usize>,

    /// LLM Provider (openai, deepseek, openrouter, anthropic, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// 目标语言 (zh, en, ja, ko, de, fr, ru)
    #[arg(long)]
    pub target_language: Option<String>,

    /// 每次检索的文档片段数
    #[arg(long)]
    pub top_k: Option<usize>,

    /// 禁用网络检索工具
    #[arg(long)]
    pub disable_search: bool,

    /// 关键要点与建议两个阶段并发执行
    #[arg(long)]
    pub concurrent_follow_ups: bool,

    /// 是否禁用缓存
    #[arg(long)]
    pub no_cache: bool,
}

impl Args {
    /// 校验分析请求，自定义查询缺少问题时直接拒绝
    pub fn analysis_request(&self) -> Result<AnalysisRequest, ValidationError> {
        AnalysisRequest::new(self.category, self.query.as_deref())
    }

    /// 将CLI参数转换为配置，命令行参数覆盖配置文件
    pub fn into_config(self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(output) = self.output {
            config.output_path = Some(output);
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            if let Ok(provider) = provider_str.parse::<LLMProvider>() {
                config.llm.provider = provider;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的provider: {}，使用provider {}",
                    provider_str, config.llm.provider
                );
            }
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model_efficient) = self.model_efficient {
            config.llm.model_efficient = model_efficient;
        }
        if let Some(model_powerful) = self.model_powerful {
            config.llm.model_powerful = model_powerful;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
        if let Some(max_parallels) = self.max_parallels {
            config.llm.max_parallels = max_parallels;
        }

        // 目标语言配置
        if let Some(target_language_str) = self.target_language {
            if let Ok(target_language) = target_language_str.parse::<TargetLanguage>() {
                config.target_language = target_language;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的目标语言: {}，使用语言 {}",
                    target_language_str,
                    config.target_language.display_name()
                );
            }
        }

        if let Some(top_k) = self.top_k {
            config.knowledge.top_k = top_k;
        }
        if self.disable_search {
            config.search.enabled = false;
        }
        if self.concurrent_follow_ups {
            config.pipeline.concurrent_follow_ups = true;
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
        if self.verbose {
            config.verbose = true;
        }

        Ok(config)
    }
}
