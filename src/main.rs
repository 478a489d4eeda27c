//! ETF 网格交易分析前端服务
//!
//! 为浏览器端提供分析入口：分享链接参数编解码、输入校验、
//! 免责声明确认、分析历史，分析本身转发给后端分析引擎

mod config;     // 配置加载
mod handlers;   // HTTP 请求处理器
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use std::io;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::analysis::AnalysisService;
use crate::services::api_client::ApiClient;
use crate::services::codec::ParamCodec;
use crate::services::disclaimer::DisclaimerGate;
use crate::services::form_state::FormStateStore;
use crate::services::history::HistoryStore;
use crate::services::storage::{FileStorage, StoragePort};

/// 应用程序入口
#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = AppConfig::load();

    // 初始化日志系统，RUST_LOG 优先于配置文件
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));

    let storage: Arc<dyn StoragePort> = Arc::new(
        FileStorage::open(&config.storage.path).map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?,
    );

    let limits = &config.limits;
    let service = web::Data::new(AnalysisService::new(
        ParamCodec::new(limits.url_capital),
        limits.form_capital,
        config.engine.public_origin.clone(),
        ApiClient::new(config.engine.base_url.clone()),
        DisclaimerGate::new(storage.clone(), limits.disclaimer_valid_days),
        HistoryStore::new(storage.clone(), limits.history_limit),
        FormStateStore::new(storage),
    ));

    log::info!("启动 ETF 网格分析前端服务，监听 {}", config.bind_addr());
    log::info!("分析引擎地址: {}", config.engine.base_url);

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())  // 添加请求日志中间件
            .app_data(service.clone())
            .configure(handlers::config)  // 配置路由
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(config.bind_addr())?.run().await
}
