//! LLM客户端 - 基于rig的 [`LanguageModel`] 实现

use anyhow::Result;
use async_trait::async_trait;
use rig::completion::PromptError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::CacheManager;
use crate::config::{Config, LLMConfig};
use crate::error::GenerationError;
use crate::llm::tools::WebSearchTool;
use crate::llm::{CompletionRequest, LanguageModel, ToolKind};

mod providers;
pub mod utils;

use providers::{ProviderAgent, ProviderClient};
use utils::{evaluate_befitting_model, last_assistant_text};

const CACHE_CATEGORY: &str = "completions";

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
    web_search: Option<WebSearchTool>,
    cache: Arc<CacheManager>,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: &Config) -> Result<Self> {
        let client = ProviderClient::new(&config.llm)?;
        let web_search = if config.search.enabled {
            Some(WebSearchTool::new(&config.search)?)
        } else {
            None
        };

        Ok(Self {
            config: config.llm.clone(),
            client,
            web_search,
            cache: Arc::new(CacheManager::new(config.cache.clone())),
        })
    }

    /// 检查模型连接和功能是否正常
    pub async fn check_connection(&self) -> Result<()> {
        println!("🔄 正在检查模型连接...");
        let agent = self.client.create_agent(
            &self.config.model_efficient,
            "You are a helpful assistant.",
            &self.config,
            None,
        );
        match agent.prompt("Hello").await {
            Ok(_) => {
                println!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                eprintln!("❌ 模型连接失败: {}", e);
                Err(e.into())
            }
        }
    }

    /// 通用重试逻辑，用于处理异步操作的重试机制
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T, GenerationError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, GenerationError>>,
    {
        let max_retries = self.config.retry_attempts.max(1);
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    tracing::warn!(
                        attempt = retries,
                        max_attempts = max_retries,
                        error = %err.message,
                        "❌ 调用模型服务出错"
                    );
                    if retries >= max_retries {
                        return Err(err);
                    }
                    tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                }
            }
        }
    }

    /// 单次调用，带超时
    async fn invoke(
        &self,
        agent: &ProviderAgent,
        request: &CompletionRequest,
        with_tools: bool,
    ) -> Result<String, GenerationError> {
        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let call = async {
            if with_tools {
                agent
                    .multi_turn(&request.prompt, self.config.max_tool_iterations)
                    .await
            } else {
                agent.prompt(&request.prompt).await
            }
        };

        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(PromptError::MaxDepthError {
                max_depth,
                chat_history,
                ..
            })) => {
                // 工具调用轮数耗尽时，保留模型最后给出的文本
                tracing::warn!(max_depth, "⚠️ 达到最大工具调用轮数，使用最后一次回复");
                last_assistant_text(&chat_history).ok_or_else(|| {
                    GenerationError::new(format!("达到最大工具调用轮数({})且没有可用的回复", max_depth))
                })
            }
            Ok(Err(e)) => Err(GenerationError::new(e)),
            Err(_) => Err(GenerationError::new(format!(
                "调用超时({}秒)",
                self.config.timeout_seconds
            ))),
        }
    }

    async fn complete_with_model(
        &self,
        request: &CompletionRequest,
        model: &str,
    ) -> Result<String, GenerationError> {
        let web_search = if request.has_tool(ToolKind::WebSearch) {
            if self.web_search.is_none() {
                tracing::debug!("网络检索已禁用，忽略工具请求");
            }
            self.web_search.as_ref()
        } else {
            None
        };

        let agent =
            self.client
                .create_agent(model, &request.instructions, &self.config, web_search);

        self.retry_with_backoff(|| self.invoke(&agent, request, web_search.is_some()))
            .await
    }

    fn cache_key(request: &CompletionRequest, model: &str) -> String {
        format!(
            "{}\n{:?}\n{}\n{}",
            model, request.tools, request.instructions, request.prompt
        )
    }
}

#[async_trait]
impl LanguageModel for LLMClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
        let (befitting_model, fallover_model) =
            evaluate_befitting_model(&self.config, &request.instructions, &request.prompt);

        let cache_key = Self::cache_key(request, &befitting_model);
        match self.cache.get::<String>(CACHE_CATEGORY, &cache_key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "读取缓存失败"),
        }

        let result = match self.complete_with_model(request, &befitting_model).await {
            Ok(text) => Ok(text),
            Err(e) => match fallover_model {
                Some(model) => {
                    tracing::warn!(
                        model = %model,
                        error = %e.message,
                        "❌ 首选模型调用失败，尝试使用备选模型"
                    );
                    self.complete_with_model(request, &model).await
                }
                None => Err(e),
            },
        }?;

        if let Err(e) = self
            .cache
            .set(CACHE_CATEGORY, &cache_key, result.clone(), Some(befitting_model))
            .await
        {
            tracing::warn!(error = %e, "写入缓存失败");
        }

        Ok(result)
    }
}
