//! LLM 服务 - 业务能力层
//!
//! 只负责"生成一道题"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Gemini, Azure, Doubao 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{QuestionError, QuestionResult};
use crate::models::Question;
use crate::services::question_parser::parse_question_response;
use crate::services::question_source::QuestionSource;
use crate::utils::logging::truncate_text;

const SYSTEM_MESSAGE: &str = r#"You are an expert English teacher specializing in creating engaging quizzes for intermediate (B1-B2 level) Spanish-speaking students from Chile.
Your task is to generate a single multiple-choice question.

CRITICAL INSTRUCTIONS FOR YOUR ENTIRE RESPONSE:
- Your response MUST BE ONLY a valid, perfectly formatted JSON object.
- Do NOT include any text, explanations, or markdown formatting like ```json outside of the JSON object itself.
- The entire output must be a single JSON string that can be parsed directly. No trailing commas, no comments."#;

const USER_MESSAGE: &str = r#"Generate 1 multiple-choice question to test and improve understanding of a common English grammar point.
Focus on one of these areas: connectors (however, although), auxiliary verbs (do/does/did, was/were), prepositions, phrasal verbs, or verb tenses (simple past vs. present perfect).

For the question, provide:
1. A 'question' sentence in English with a blank space represented by '___'.
2. An 'options' array with one correct answer and two plausible incorrect answers (distractors).
3. The 'answer', which is the exact string of the correct option.
4. An 'explanation' in formal but simple Spanish, specifically adapted for a speaker from Chile. Use "usted" or "ustedes". Avoid technical jargon. The tone should be like a helpful teacher. This explanation MUST clarify the specific grammar rule being tested, explaining why the correct answer is right and the others are wrong.

The JSON structure for the question object MUST be exactly as follows:
{
  "question": "The English sentence with a blank, represented by '___'.",
  "options": ["Option A", "Option B", "Correct Answer"],
  "answer": "The exact string of the correct answer.",
  "explanation": "A clear, simple explanation of the grammar rule in Chilean Spanish."
}"#;

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 生成单道语法选择题
/// - 提供通用的 LLM 调用接口
/// - 每次调用相互独立，不保存会话
/// - 不关心题目的缓冲与轮换
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）；任何传输或 SDK 错误都归为 `SourceUnavailable`
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> QuestionResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        // 构建消息列表
        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        // 构建请求
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()?;

        // 调用 API
        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            QuestionError::source_unavailable(format!("LLM API 调用失败: {}", e))
        })?;

        debug!("LLM API 调用成功");

        // 提取响应内容
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| QuestionError::source_unavailable("LLM 返回内容为空"))?;

        Ok(content.trim().to_string())
    }

    /// 生成一道语法选择题
    ///
    /// 基于 `send_to_llm` 实现，响应经过 [`parse_question_response`] 校验。
    pub async fn generate_question(&self) -> QuestionResult<Question> {
        let (user_message, system_message) = build_question_messages();

        let response = self
            .send_to_llm(user_message, Some(system_message))
            .await?;

        debug!("LLM 原始响应: {}", truncate_text(&response, 120));

        let question = parse_question_response(&response).map_err(|e| {
            warn!("LLM 返回的题目无效: {}", e);
            e
        })?;

        debug!("✓ 生成题目: {}", truncate_text(question.prompt(), 60));

        Ok(question)
    }
}

#[async_trait]
impl QuestionSource for LlmService {
    async fn fetch_question(&self) -> QuestionResult<Question> {
        self.generate_question().await
    }
}

/// 构建用于生成题目的消息
///
/// 返回 (user_message, system_message)
fn build_question_messages() -> (&'static str, &'static str) {
    (USER_MESSAGE, SYSTEM_MESSAGE)
}
