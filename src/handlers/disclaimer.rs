//! 免责声明接口处理器
//!
//! ## API 列表
//! - GET /disclaimer - 声明内容与确认状态
//! - POST /disclaimer/accept - 确认声明

use actix_web::{web, HttpResponse, Result};
use chrono::Utc;
use serde::Serialize;

use crate::models::ApiResponse;
use crate::services::analysis::AnalysisService;

pub const DISCLAIMER_TEXT: &str = "本工具所有数据及分析结果仅供学习、研究之用，不构成任何形式的投资建议或交易诱导。\
金融市场存在极高风险，任何投资决策都应基于您本人的独立判断。\
用户据此工具提供的信息进行的任何投资操作，其一切后果由用户自行承担，本工具及作者不承担任何法律责任和经济赔偿责任。";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisclaimerStatus {
    pub accepted: bool,
    pub remaining_days: i64,
    pub text: &'static str,
}

fn status(service: &AnalysisService) -> DisclaimerStatus {
    let now = Utc::now();
    DisclaimerStatus {
        accepted: service.disclaimer().check_status(now),
        remaining_days: service.disclaimer().remaining_days(now),
        text: DISCLAIMER_TEXT,
    }
}

pub async fn get_disclaimer(service: web::Data<AnalysisService>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(status(&service))))
}

pub async fn accept_disclaimer(service: web::Data<AnalysisService>) -> Result<HttpResponse> {
    match service.disclaimer().accept(Utc::now()) {
        Ok(()) => {
            log::info!("用户已确认免责声明");
            Ok(HttpResponse::Ok().json(ApiResponse::success(status(&service))))
        }
        Err(e) => {
            log::error!("保存免责声明确认失败: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<DisclaimerStatus>::error(e.to_string())))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/disclaimer")
            .route("", web::get().to(get_disclaimer))
            .route("/accept", web::post().to(accept_disclaimer)),
    );
}
