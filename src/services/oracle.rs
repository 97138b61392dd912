//! 评分服务 - 业务能力层
//!
//! 只负责"单题评分"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如本地 Ollama、Azure 等）

use std::time::Duration;

use anyhow::Result;
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
use crate::error::OracleError;
use crate::models::grade::{MAX_SCORE, MIN_SCORE};

/// 单题评分结论
#[derive(Debug, Clone)]
pub struct Verdict {
    /// 得分，已压入 [0, 2]
    pub score: i64,
    /// 评分方的原始回复
    pub rationale: String,
}

/// 评分服务接口
///
/// 流程层只依赖此 trait，测试时用假实现替换真实 LLM。
/// 实现方返回的任何错误都会被流程层吸收为 0 分记录，
/// 单题评分失败从不中断整行。
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// 对一道题评分
    async fn score(
        &self,
        question: &str,
        reference_answer: &str,
        submitted_answer: &str,
    ) -> Result<Verdict, OracleError>;
}

/// LLM 评分服务
///
/// 职责：
/// - 调用 LLM API 对单个答案评分
/// - 只处理单个题目
/// - 不出现 Vec<GradeRecord>
/// - 不出现 identifier / question_index
/// - 不关心流程顺序
pub struct LlmOracle {
    client: Client<OpenAIConfig>,
    model_name: String,
    timeout_secs: u64,
}

impl LlmOracle {
    /// 创建新的 LLM 评分服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            timeout_secs: config.oracle_timeout_secs,
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// 这是最基础的 LLM 调用接口，评分功能基于此函数实现。
    async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: &str,
    ) -> Result<String, OracleError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_message)
            .build()
            .map_err(|e| OracleError::ApiCallFailed {
                model: self.model_name.clone(),
                message: e.to_string(),
            })?;

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| OracleError::ApiCallFailed {
                model: self.model_name.clone(),
                message: e.to_string(),
            })?;

        let messages = vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(256u32)
            .build()
            .map_err(|e| OracleError::ApiCallFailed {
                model: self.model_name.clone(),
                message: e.to_string(),
            })?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            OracleError::ApiCallFailed {
                model: self.model_name.clone(),
                message: e.to_string(),
            }
        })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| OracleError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }

    /// 构建评分用的消息
    ///
    /// 返回 (user_message, system_message)
    fn build_score_messages(
        &self,
        question: &str,
        reference_answer: &str,
        submitted_answer: &str,
    ) -> (String, String) {
        let system_message = "你是一位阅卷教师，负责判断学生答案与参考答案在语义上的一致程度。\
                              评分不必过于严格，不要求逐字一致，意思对即可。"
            .to_string();

        let user_message = format!(
            r#"请判断学生答案与参考答案的符合程度。

题目：{}
参考答案：{}
学生答案：{}

评分标准：
- 0：答非所问
- 1：部分正确
- 2：基本完全正确（允许小瑕疵）

只回答一个数字：0、1 或 2。"#,
            question, reference_answer, submitted_answer
        );

        (user_message, system_message)
    }
}

#[async_trait]
impl ScoringOracle for LlmOracle {
    async fn score(
        &self,
        question: &str,
        reference_answer: &str,
        submitted_answer: &str,
    ) -> Result<Verdict, OracleError> {
        let (user_message, system_message) =
            self.build_score_messages(question, reference_answer, submitted_answer);

        // 超时按单题失败处理，不允许一道题拖死整行
        let reply = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            self.send_to_llm(&user_message, &system_message),
        )
        .await
        .map_err(|_| OracleError::Timeout {
            timeout_secs: self.timeout_secs,
        })??;

        let score = parse_score_response(&reply)?;
        debug!("LLM 评分: {} (回复: {})", score, reply);

        Ok(Verdict {
            score,
            rationale: reply,
        })
    }
}

/// 解析 LLM 的评分回复
///
/// 取回复中第一个纯数字的空白分隔词元，压入 [0, 2]。
/// 没有数字词元时报错，由上层按 0 分吸收。
pub fn parse_score_response(response: &str) -> Result<i64, OracleError> {
    response
        .split_whitespace()
        .find(|token| !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()))
        .and_then(|token| token.parse::<i64>().ok())
        .map(|score| score.clamp(MIN_SCORE, MAX_SCORE))
        .ok_or_else(|| OracleError::NoNumericToken {
            response: response.to_string(),
        })
}
