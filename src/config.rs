//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::services::disclaimer::DEFAULT_VALID_DAYS;
use crate::services::history::DEFAULT_HISTORY_LIMIT;
use crate::services::validation::{CapitalBounds, FORM_CAPITAL_BOUNDS, URL_CAPITAL_BOUNDS};

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// 分析引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 分析引擎 API 根地址（包含 /api 前缀）
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 生成分享链接时使用的站点地址
    #[serde(default = "default_public_origin")]
    pub public_origin: String,
}

/// 本地存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 存储文件路径
    #[serde(default = "default_storage_path")]
    pub path: String,
}

/// 业务限制
///
/// 投资金额有两套上下限：表单校验使用 form_capital，
/// URL 解析与自动修正使用 url_capital，两者需与分析引擎确认后统一
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_form_capital")]
    pub form_capital: CapitalBounds,
    #[serde(default = "default_url_capital")]
    pub url_capital: CapitalBounds,
    /// 历史记录保留条数
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// 免责声明有效天数
    #[serde(default = "default_disclaimer_days")]
    pub disclaimer_valid_days: i64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub log: LogConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_base_url() -> String { "http://127.0.0.1:5000/api".to_string() }
fn default_public_origin() -> String { "http://localhost:8080".to_string() }
fn default_storage_path() -> String { "data/storage.json".to_string() }
fn default_form_capital() -> CapitalBounds { FORM_CAPITAL_BOUNDS }
fn default_url_capital() -> CapitalBounds { URL_CAPITAL_BOUNDS }
fn default_history_limit() -> usize { DEFAULT_HISTORY_LIMIT }
fn default_disclaimer_days() -> i64 { DEFAULT_VALID_DAYS }
fn default_log_level() -> String { "info".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            public_origin: default_public_origin(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            form_capital: default_form_capital(),
            url_capital: default_url_capital(),
            history_limit: default_history_limit(),
            disclaimer_valid_days: default_disclaimer_days(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值；ENGINE_BASE_URL 环境变量覆盖引擎地址
    pub fn load() -> Self {
        let mut config = Self::load_file();

        if let Ok(base_url) = env::var("ENGINE_BASE_URL") {
            log::info!("使用环境变量 ENGINE_BASE_URL: {}", base_url);
            config.engine.base_url = base_url;
        }

        config
    }

    fn load_file() -> Self {
        let config_paths = ["config.json", "config/config.json"];

        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        log::info!("从 {} 加载配置成功", path);
                        return config;
                    }
                    Err(e) => {
                        log::warn!("加载配置文件 {} 失败: {}", path, e);
                    }
                }
            }
        }

        log::info!("使用默认配置");
        Self::default()
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
