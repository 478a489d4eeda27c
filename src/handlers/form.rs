//! 参数表单接口处理器
//!
//! ## API 列表
//! - GET /form - 上次提交的表单输入，未提交过时为默认值

use actix_web::{web, HttpResponse, Result};

use crate::models::ApiResponse;
use crate::services::analysis::AnalysisService;

pub async fn get_form_state(service: web::Data<AnalysisService>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(service.form_state().load())))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/form", web::get().to(get_form_state));
}
