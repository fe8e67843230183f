use serde::{Deserialize, Serialize};

use crate::errors::{ExporterError, Result};

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Environment variable prefix for file-style overrides.
///
/// 示例：FOXESS__API__TOKEN=xxx, FOXESS__SERVER__LISTEN_ADDRESS=:9561
pub const ENV_PREFIX: &str = "FOXESS";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: 监听地址、指标路径、worker 数量
/// - api: FoxESS Cloud 访问凭据、逆变器列表、拉取间隔
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > TOML 文件 > 默认值
    /// ENV 前缀：FOXESS，分隔符：__
    pub fn load(path: Option<&str>) -> Result<Self> {
        use config::{Config, Environment, File};

        let explicit = path.is_some();
        let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

        let settings = Config::builder()
            // 1. 从 TOML 文件加载（显式指定时必须存在）
            .add_source(File::with_name(path).required(explicit))
            // 2. 从环境变量覆盖
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("api.inverters")
                    .try_parsing(true),
            )
            .build()?;

        let config = settings.try_deserialize::<StaticConfig>()?;
        Ok(config)
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample = Self {
            api: ApiConfig {
                token: "your-api-token".to_string(),
                inverters: vec!["INVERTER_SN_1".to_string(), "INVERTER_SN_2".to_string()],
                default_labels: "site=home".to_string(),
                ..ApiConfig::default()
            },
            ..Self::default()
        };
        toml::to_string_pretty(&sample)
            .unwrap_or_else(|e| format!("# Error generating sample config: {}", e))
    }

    /// 保存示例配置到文件
    pub fn save_sample_config<P: AsRef<std::path::Path>>(path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, Self::generate_sample_config()).map_err(|e| {
            ExporterError::file_operation(format!(
                "failed to write {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address on which to expose metrics and the landing page.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    /// Path under which to expose metrics.
    #[serde(default = "default_telemetry_path")]
    pub telemetry_path: String,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

/// FoxESS Cloud API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Inverter serial numbers to poll.
    #[serde(default)]
    pub inverters: Vec<String>,
    /// How often to fetch the API, e.g. "10s".
    #[serde(default = "default_fetch_interval")]
    pub fetch_interval: String,
    /// How long to wait for one fetch batch, e.g. "5s".
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: String,
    /// Static labels applied to every series: "label1=value1 label2=value2".
    #[serde(default)]
    pub default_labels: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_listen_address() -> String {
    ":9561".to_string()
}

fn default_telemetry_path() -> String {
    "/metrics".to_string()
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_base_url() -> String {
    "https://www.foxesscloud.com".to_string()
}

fn default_fetch_interval() -> String {
    "10s".to_string()
}

fn default_fetch_timeout() -> String {
    "5s".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_file() -> Option<String> {
    None
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            telemetry_path: default_telemetry_path(),
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_url: default_base_url(),
            inverters: Vec::new(),
            fetch_interval: default_fetch_interval(),
            fetch_timeout: default_fetch_timeout(),
            default_labels: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: default_log_file(),
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}
