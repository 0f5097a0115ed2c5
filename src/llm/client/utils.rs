use rig::completion::{AssistantContent, Message};

use crate::config::LLMConfig;

/// 超过该长度的请求直接使用高质量模型
const EFFICIENT_MODEL_PROMPT_LIMIT: usize = 32 * 1024;

/// 根据请求长度选择模型，返回（首选模型，备选模型）
pub fn evaluate_befitting_model(
    llm_config: &LLMConfig,
    instructions: &str,
    prompt: &str,
) -> (String, Option<String>) {
    if instructions.len() + prompt.len() <= EFFICIENT_MODEL_PROMPT_LIMIT
        && llm_config.model_efficient != llm_config.model_powerful
    {
        return (
            llm_config.model_efficient.clone(),
            Some(llm_config.model_powerful.clone()),
        );
    }
    (llm_config.model_powerful.clone(), None)
}

/// 从对话历史中取出最后一条有文本内容的助手回复
pub fn last_assistant_text(chat_history: &[Message]) -> Option<String> {
    chat_history.iter().rev().find_map(|msg| {
        if let Message::Assistant { content, .. } = msg {
            let text = content
                .iter()
                .filter_map(|c| {
                    if let AssistantContent::Text(text) = c {
                        Some(text.text.clone())
                    } else {
                        None
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");

            if !text.trim().is_empty() {
                return Some(text);
            }
        }
        None
    })
}
