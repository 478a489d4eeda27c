//! 分析历史接口处理器
//!
//! ## API 列表
//! - GET /history - 历史列表（最新在前，附相对时间）
//! - DELETE /history - 清空历史
//! - DELETE /history/{index} - 删除一条

use actix_web::{web, HttpResponse, Result};
use chrono::Utc;
use serde::Serialize;

use crate::models::{ApiResponse, HistoryRecord};
use crate::services::analysis::AnalysisService;
use crate::services::format::{format_relative_time, format_yuan};

/// 带展示字段的历史记录
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub record: HistoryRecord,
    /// 如 "5分钟前"
    pub relative_time: String,
    /// 如 "¥100,000"
    pub capital_text: String,
}

pub async fn list_history(service: web::Data<AnalysisService>) -> Result<HttpResponse> {
    let now = Utc::now();
    let entries: Vec<HistoryEntry> = service
        .history()
        .load()
        .into_iter()
        .map(|record| HistoryEntry {
            relative_time: format_relative_time(record.timestamp, now),
            capital_text: format_yuan(record.params.total_capital).unwrap_or_default(),
            record,
        })
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(entries)))
}

pub async fn clear_history(service: web::Data<AnalysisService>) -> Result<HttpResponse> {
    match service.history().clear() {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message((), "历史记录已清空"))),
        Err(e) => {
            log::error!("清空分析历史失败: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(e.to_string())))
        }
    }
}

pub async fn delete_history(service: web::Data<AnalysisService>, path: web::Path<usize>) -> Result<HttpResponse> {
    let index = path.into_inner();

    match service.history().remove(index) {
        Ok(Some(record)) => Ok(HttpResponse::Ok().json(ApiResponse::success(record))),
        Ok(None) => {
            let response = ApiResponse::<HistoryRecord>::error(format!("历史记录不存在: {}", index));
            Ok(HttpResponse::NotFound().json(response))
        }
        Err(e) => {
            log::error!("删除分析历史失败: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<HistoryRecord>::error(e.to_string())))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/history")
            .route("", web::get().to(list_history))
            .route("", web::delete().to(clear_history))
            .route("/{index}", web::delete().to(delete_history)),
    );
}
