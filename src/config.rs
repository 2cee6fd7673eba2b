use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 报表生成配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// 上传文件大小上限 (字节)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// 请求临时目录的父目录，缺省为系统临时目录
    #[serde(default)]
    pub temp_root: Option<PathBuf>,
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            temp_root: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            report: ReportConfig::default(),
        }
    }
}

impl AppConfig {
    /// 加载配置：默认值 -> config/sales-report.{toml,yaml,json} (可选) -> 环境变量
    ///
    /// 环境变量前缀 `SALES_REPORT`，层级分隔符 `__`，如 `SALES_REPORT__SERVER__PORT=9000`。
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();
        Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default(
                "report.max_upload_bytes",
                defaults.report.max_upload_bytes as i64,
            )?
            .add_source(File::with_name("config/sales-report").required(false))
            .add_source(
                Environment::with_prefix("SALES_REPORT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
