use actix_web::{web, HttpResponse, Result};
use serde_json::{json, Value};

use crate::models::{ApiResponse, VersionInfo};
use crate::services::analysis::AnalysisService;

/// 本服务状态，附带分析引擎的健康检查结果
///
/// 引擎不可达时本服务仍返回 200，`engine.reachable` 为 false
pub async fn health_check(service: web::Data<AnalysisService>) -> Result<HttpResponse> {
    let client = service.client();
    let engine = match client.health_check().await {
        Ok(health) => json!({ "baseUrl": client.base_url(), "reachable": true, "health": health, "error": null }),
        Err(e) => {
            log::warn!("分析引擎健康检查失败: {}", e);
            json!({ "baseUrl": client.base_url(), "reachable": false, "health": null, "error": e.to_string() })
        }
    };

    let data = json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "engine": engine,
    });
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

/// 转发分析引擎的版本号
pub async fn engine_version(service: web::Data<AnalysisService>) -> Result<HttpResponse> {
    match service.client().version().await {
        Ok(response) => match response.data {
            Some(version) if response.success => Ok(HttpResponse::Ok().json(ApiResponse::success(version))),
            _ => {
                let message = response.error.unwrap_or_else(|| "获取版本号失败".to_string());
                Ok(HttpResponse::BadGateway().json(ApiResponse::<VersionInfo>::error(message)))
            }
        },
        Err(e) => Ok(HttpResponse::BadGateway().json(ApiResponse::<Value>::error(e.to_string()))),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/version", web::get().to(engine_version));
}
