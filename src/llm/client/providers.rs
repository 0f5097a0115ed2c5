//! LLM Provider支持模块

use anyhow::Result;
use rig::{
    agent::Agent,
    client::CompletionClient,
    completion::{Prompt, PromptError},
};

use crate::{
    config::{LLMConfig, LLMProvider},
    llm::tools::WebSearchTool,
};

/// 统一的Provider客户端枚举
#[derive(Clone)]
pub enum ProviderClient {
    OpenAI(rig::providers::openai::Client),
    DeepSeek(rig::providers::deepseek::Client),
    OpenRouter(rig::providers::openrouter::Client),
    Anthropic(rig::providers::anthropic::Client),
    Ollama(rig::providers::ollama::Client),
}

/// 按需挂载检索工具后构建Agent
macro_rules! build_with_tool {
    ($builder:expr, $web_search:expr) => {{
        let builder = $builder;
        match $web_search {
            Some(tool) => builder.tool(tool.clone()).build(),
            None => builder.build(),
        }
    }};
}

impl ProviderClient {
    /// 根据配置创建相应的provider客户端
    pub fn new(config: &LLMConfig) -> Result<Self> {
        match config.provider {
            LLMProvider::OpenAI => {
                let client = rig::providers::openai::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::OpenAI(client))
            }
            LLMProvider::DeepSeek => {
                let client = rig::providers::deepseek::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::DeepSeek(client))
            }
            LLMProvider::OpenRouter => {
                let client = rig::providers::openrouter::Client::builder(&config.api_key).build();
                Ok(ProviderClient::OpenRouter(client))
            }
            LLMProvider::Anthropic => {
                let client =
                    rig::providers::anthropic::ClientBuilder::new(&config.api_key).build()?;
                Ok(ProviderClient::Anthropic(client))
            }
            LLMProvider::Ollama => {
                let client = rig::providers::ollama::Client::builder().build();
                Ok(ProviderClient::Ollama(client))
            }
        }
    }

    /// 创建Agent，web_search为Some时向模型开放网络检索工具
    pub fn create_agent(
        &self,
        model: &str,
        instructions: &str,
        config: &LLMConfig,
        web_search: Option<&WebSearchTool>,
    ) -> ProviderAgent {
        match self {
            ProviderClient::OpenAI(client) => {
                let agent = build_with_tool!(
                    client
                        .completion_model(model)
                        .completions_api()
                        .into_agent_builder()
                        .preamble(instructions)
                        .max_tokens(config.max_tokens.into())
                        .temperature(config.temperature),
                    web_search
                );
                ProviderAgent::OpenAI(agent)
            }
            ProviderClient::DeepSeek(client) => {
                let agent = build_with_tool!(
                    client
                        .agent(model)
                        .preamble(instructions)
                        .max_tokens(config.max_tokens.into())
                        .temperature(config.temperature),
                    web_search
                );
                ProviderAgent::DeepSeek(agent)
            }
            ProviderClient::OpenRouter(client) => {
                let agent = build_with_tool!(
                    client
                        .agent(model)
                        .preamble(instructions)
                        .temperature(config.temperature),
                    web_search
                );
                ProviderAgent::OpenRouter(agent)
            }
            ProviderClient::Anthropic(client) => {
                let agent = build_with_tool!(
                    client
                        .agent(model)
                        .preamble(instructions)
                        .max_tokens(config.max_tokens.into())
                        .temperature(config.temperature),
                    web_search
                );
                ProviderAgent::Anthropic(agent)
            }
            ProviderClient::Ollama(client) => {
                let agent = build_with_tool!(
                    client
                        .agent(model)
                        .preamble(instructions)
                        .max_tokens(config.max_tokens.into())
                        .temperature(config.temperature),
                    web_search
                );
                ProviderAgent::Ollama(agent)
            }
        }
    }
}

/// 统一的Agent枚举
pub enum ProviderAgent {
    OpenAI(Agent<rig::providers::openai::CompletionModel>),
    DeepSeek(Agent<rig::providers::deepseek::CompletionModel>),
    OpenRouter(Agent<rig::providers::openrouter::CompletionModel>),
    Anthropic(Agent<rig::providers::anthropic::completion::CompletionModel>),
    Ollama(Agent<rig::providers::ollama::CompletionModel<reqwest::Client>>),
}

macro_rules! dispatch {
    ($self:expr, $agent:ident => $body:expr) => {
        match $self {
            ProviderAgent::OpenAI($agent) => $body,
            ProviderAgent::DeepSeek($agent) => $body,
            ProviderAgent::OpenRouter($agent) => $body,
            ProviderAgent::Anthropic($agent) => $body,
            ProviderAgent::Ollama($agent) => $body,
        }
    };
}

impl ProviderAgent {
    /// 单轮对话
    pub async fn prompt(&self, prompt: &str) -> Result<String, PromptError> {
        dispatch!(self, agent => agent.prompt(prompt).await)
    }

    /// 多轮对话，模型可在轮次内调用工具
    pub async fn multi_turn(
        &self,
        prompt: &str,
        max_iterations: usize,
    ) -> Result<String, PromptError> {
        dispatch!(self, agent => agent.prompt(prompt).multi_turn(max_iterations).await)
    }
}
