use std::fmt;

#[derive(Debug, Clone)]
pub enum ExporterError {
    Config(String),
    Transport(String),
    Api { errno: i64, msg: String },
    EmptyResponse(String),
    Timeout(String),
    Serialization(String),
    Metrics(String),
    FileOperation(String),
}

impl ExporterError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ExporterError::Config(_) => "E001",
            ExporterError::Transport(_) => "E002",
            ExporterError::Api { .. } => "E003",
            ExporterError::EmptyResponse(_) => "E004",
            ExporterError::Timeout(_) => "E005",
            ExporterError::Serialization(_) => "E006",
            ExporterError::Metrics(_) => "E007",
            ExporterError::FileOperation(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ExporterError::Config(_) => "Configuration Error",
            ExporterError::Transport(_) => "API Transport Error",
            ExporterError::Api { .. } => "API Error",
            ExporterError::EmptyResponse(_) => "Empty API Response",
            ExporterError::Timeout(_) => "Fetch Timeout",
            ExporterError::Serialization(_) => "Serialization Error",
            ExporterError::Metrics(_) => "Metrics Error",
            ExporterError::FileOperation(_) => "File Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ExporterError::Config(msg) => msg,
            ExporterError::Transport(msg) => msg,
            ExporterError::Api { msg, .. } => msg,
            ExporterError::EmptyResponse(msg) => msg,
            ExporterError::Timeout(msg) => msg,
            ExporterError::Serialization(msg) => msg,
            ExporterError::Metrics(msg) => msg,
            ExporterError::FileOperation(msg) => msg,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.format_detail().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.format_detail())
    }

    fn format_detail(&self) -> String {
        match self {
            ExporterError::Api { errno, msg } => format!("errno {}: {}", errno, msg),
            other => other.message().to_string(),
        }
    }
}

impl fmt::Display for ExporterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ExporterError {}

// 便捷的构造函数
impl ExporterError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        ExporterError::Config(msg.into())
    }

    pub fn transport<T: Into<String>>(msg: T) -> Self {
        ExporterError::Transport(msg.into())
    }

    pub fn api<T: Into<String>>(errno: i64, msg: T) -> Self {
        ExporterError::Api {
            errno,
            msg: msg.into(),
        }
    }

    pub fn empty_response<T: Into<String>>(msg: T) -> Self {
        ExporterError::EmptyResponse(msg.into())
    }

    pub fn timeout<T: Into<String>>(msg: T) -> Self {
        ExporterError::Timeout(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ExporterError::Serialization(msg.into())
    }

    pub fn metrics<T: Into<String>>(msg: T) -> Self {
        ExporterError::Metrics(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        ExporterError::FileOperation(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<std::io::Error> for ExporterError {
    fn from(err: std::io::Error) -> Self {
        ExporterError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ExporterError {
    fn from(err: serde_json::Error) -> Self {
        ExporterError::Serialization(err.to_string())
    }
}

impl From<prometheus::Error> for ExporterError {
    fn from(err: prometheus::Error) -> Self {
        ExporterError::Metrics(err.to_string())
    }
}

impl From<config::ConfigError> for ExporterError {
    fn from(err: config::ConfigError) -> Self {
        ExporterError::Config(err.to_string())
    }
}

impl From<ureq::Error> for ExporterError {
    fn from(err: ureq::Error) -> Self {
        ExporterError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExporterError>;
