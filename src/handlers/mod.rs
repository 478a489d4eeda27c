pub mod analysis;
pub mod disclaimer;
pub mod etf;
pub mod form;
pub mod health;
pub mod history;
pub mod validate;

use actix_web::error::InternalError;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use std::fmt;

use crate::models::ApiResponse;

/// 请求体、路径或查询参数无法解析时，同样以统一响应格式返回 400
fn extractor_error<E>(err: E, req: &HttpRequest) -> Error
where
    E: fmt::Debug + fmt::Display + 'static,
{
    let message = err.to_string();
    log::warn!("请求参数解析失败 {}: {}", req.path(), message);
    let response = HttpResponse::BadRequest().json(ApiResponse::<()>::error(message));
    InternalError::from_response(err, response).into()
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(web::JsonConfig::default().error_handler(|err, req| extractor_error(err, req)))
            .app_data(web::PathConfig::default().error_handler(|err, req| extractor_error(err, req)))
            .app_data(web::QueryConfig::default().error_handler(|err, req| extractor_error(err, req)))
            .configure(health::config)
            .configure(analysis::config)
            .configure(form::config)
            .configure(etf::config)
            .configure(history::config)
            .configure(disclaimer::config)
            .configure(validate::config)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis::test_service;
    use actix_web::{http::header, test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_form_with_unknown_label_gets_field_error() {
        println!("\n========== 测试表单字段级错误 ==========");
        let (_, service) = test_service("http://127.0.0.1:9/api");
        let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/analysis")
            .set_json(json!({"etfCode": "510300", "totalCapital": 200000, "gridType": "geometric"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        println!("  响应: {}", body);
        assert_eq!(body["success"], false);
        assert_eq!(body["data"]["errors"]["gridType"], "网格类型参数无效");
        assert!(body["data"]["errors"].get("totalCapital").is_none());
        println!("✅ 表单字段级错误测试通过！");
    }

    #[actix_web::test]
    async fn test_malformed_body_gets_envelope() {
        let (_, service) = test_service("http://127.0.0.1:9/api");
        let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/analysis")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{\"etfCode\": 510300")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().map_or(false, |m| !m.is_empty()));
        assert!(body["timestamp"].is_string());
    }

    #[actix_web::test]
    async fn test_bad_path_segment_gets_envelope() {
        let (_, service) = test_service("http://127.0.0.1:9/api");
        let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(config)).await;

        let req = test::TestRequest::delete().uri("/api/v1/history/abc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].is_string());
    }

    #[actix_web::test]
    async fn test_bad_query_gets_envelope() {
        let (_, service) = test_service("http://127.0.0.1:9/api");
        let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(config)).await;

        let req = test::TestRequest::get()
            .uri("/api/v1/validate/percentage?value=0.5&min=low")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }
}
