use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// 默认配置文件
const DEFAULT_CONFIG_FILE: &str = "quiz.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 生成温度，略高以增加题目多样性
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    // --- 答题流程 ---
    /// 答对后自动进入下一题前的展示时间（毫秒）
    pub correct_advance_delay_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-2.5-flash".to_string(),
            llm_temperature: 0.8,
            llm_max_tokens: 1024,
            correct_advance_delay_ms: 2500,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置：配置文件（可选）→ 环境变量覆盖 → 校验
    pub fn load() -> Result<Self> {
        let base = match std::env::var("QUIZ_CONFIG") {
            Ok(path) => Self::from_toml_file(&path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_toml_file(DEFAULT_CONFIG_FILE)?
            }
            Err(_) => Self::default(),
        };

        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件读取配置，缺省字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 用环境变量覆盖已有配置
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            llm_api_key: lookup("LLM_API_KEY")
                .or_else(|| lookup("API_KEY"))
                .unwrap_or(self.llm_api_key),
            llm_api_base_url: lookup("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: lookup("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
            llm_temperature: parse_var(&lookup, "LLM_TEMPERATURE").unwrap_or(self.llm_temperature),
            llm_max_tokens: parse_var(&lookup, "LLM_MAX_TOKENS").unwrap_or(self.llm_max_tokens),
            correct_advance_delay_ms: parse_var(&lookup, "CORRECT_ADVANCE_DELAY_MS")
                .unwrap_or(self.correct_advance_delay_ms),
            verbose_logging: parse_var(&lookup, "VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
        }
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.llm_api_key.trim().is_empty() {
            anyhow::bail!("未设置 LLM_API_KEY（或 API_KEY）环境变量");
        }
        if !(0.0..=2.0).contains(&self.llm_temperature) {
            anyhow::bail!(
                "llm_temperature 必须在 [0.0, 2.0] 范围内，当前值: {}",
                self.llm_temperature
            );
        }
        Ok(())
    }

    pub fn correct_advance_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.correct_advance_delay_ms)
    }
}

/// 读取并解析单个变量，解析失败视为未设置
fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|v| v.parse().ok())
}
