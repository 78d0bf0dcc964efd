//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `BEETRACE__*` 覆盖
//! （双下划线表示嵌套，如 `BEETRACE__EXECUTOR__TIMEOUT_SECS=30`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub executor: ExecutorSection,
    #[serde(default)]
    pub schemas: SchemasSection,
}

/// [llm] 段：OpenAI 兼容端点与模型
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: None,
        }
    }
}

/// [engine] 段：重试上界与成功后解释开关
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// 一次运行的最大尝试次数
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// 成功后是否请求提案者解释输出
    #[serde(default = "default_explain_on_success")]
    pub explain_on_success: bool,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_explain_on_success() -> bool {
    true
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            explain_on_success: default_explain_on_success(),
        }
    }
}

/// [executor] 段：默认超时、提权 token 与确认门开关
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutorSection {
    /// 提案未给 timeout 时的默认运行秒数
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 每个命令向量的提权前缀 token
    #[serde(default = "default_elevation")]
    pub elevation: String,
    /// 启动子进程前是否要求操作员确认
    #[serde(default = "default_require_confirmation")]
    pub require_confirmation: bool,
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_elevation() -> String {
    "sudo".to_string()
}

fn default_require_confirmation() -> bool {
    true
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            elevation: default_elevation(),
            require_confirmation: default_require_confirmation(),
        }
    }
}

/// [schemas] 段：函数表文件路径（缺省用内嵌表）
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SchemasSection {
    pub funcs_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmSection::default(),
            engine: EngineSection::default(),
            executor: ExecutorSection::default(),
            schemas: SchemasSection::default(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 BEETRACE__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 BEETRACE__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("BEETRACE")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
