//! 输入校验接口处理器
//!
//! 与分析表单使用相同的校验规则，供页面在提交前逐项检查
//!
//! ## API 列表
//! - GET /validate/etf-code?value=510300
//! - GET /validate/capital?value=200000 - 按表单金额上下限
//! - GET /validate/percentage?value=0.5&min=0.1&max=0.9 - 不给区间时按 [0, 1]
//! - GET /validate/date?value=20240315&format=compact - format 默认 dashed（YYYY-MM-DD）

use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;

use crate::models::ApiResponse;
use crate::services::analysis::AnalysisService;
use crate::services::validation::{
    validate_capital, validate_date, validate_etf_code, validate_percentage, validate_ratio, DateFormat, Validation,
};

#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    pub value: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub format: Option<String>,
}

impl ValidateQuery {
    fn number(&self) -> Option<f64> {
        self.value.as_deref().and_then(|v| v.trim().parse::<f64>().ok())
    }
}

pub async fn validate_field(
    service: web::Data<AnalysisService>,
    path: web::Path<String>,
    query: web::Query<ValidateQuery>,
) -> Result<HttpResponse> {
    let field = path.into_inner();

    let result = match field.as_str() {
        "etf-code" => {
            if validate_etf_code(query.value.as_deref()) {
                Validation::ok()
            } else {
                Validation::fail("请输入6位数字ETF代码")
            }
        }
        "capital" => validate_capital(query.number(), &service.form_capital()),
        "percentage" => match (query.min, query.max) {
            (None, None) => validate_ratio(query.number()),
            (min, max) => validate_percentage(query.number(), min.unwrap_or(0.0), max.unwrap_or(1.0)),
        },
        "date" => {
            let format = match query.format.as_deref() {
                None | Some("dashed") => DateFormat::Dashed,
                Some("compact") => DateFormat::Compact,
                Some(other) => {
                    let response = ApiResponse::<Validation>::error(format!("不支持的日期格式: {}", other));
                    return Ok(HttpResponse::BadRequest().json(response));
                }
            };
            validate_date(query.value.as_deref(), format)
        }
        _ => {
            let response = ApiResponse::<Validation>::error(format!("不支持的校验字段: {}", field));
            return Ok(HttpResponse::BadRequest().json(response));
        }
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(result)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/validate/{field}", web::get().to(validate_field));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis::test_service;
    use actix_web::{test, App};
    use serde_json::Value;

    async fn check(uri: &str) -> Value {
        let (_, service) = test_service("http://127.0.0.1:9/api");
        let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(config)).await;
        let req = test::TestRequest::get().uri(uri).to_request();
        test::call_and_read_body_json(&app, req).await
    }

    #[actix_web::test]
    async fn test_validate_fields() {
        println!("\n========== 测试输入校验接口 ==========");
        let body = check("/validate/etf-code?value=510300").await;
        assert_eq!(body["data"]["isValid"], true);

        let body = check("/validate/capital?value=50000").await;
        println!("  金额: {}", body["data"]);
        assert_eq!(body["data"]["isValid"], false);
        assert_eq!(body["data"]["error"], "投资金额不能少于10万元");

        let body = check("/validate/percentage?value=1.5").await;
        assert_eq!(body["data"]["error"], "百分比值不能大于100%");

        let body = check("/validate/percentage?value=0.05&min=0.1&max=0.9").await;
        assert_eq!(body["data"]["error"], "百分比值不能小于10%");

        let body = check("/validate/percentage").await;
        assert_eq!(body["data"]["error"], "请输入有效的百分比值");

        let body = check("/validate/date?value=20240230&format=compact").await;
        assert_eq!(body["data"]["error"], "请输入有效的日期");

        let body = check("/validate/date?value=2024-03-15").await;
        assert_eq!(body["data"]["isValid"], true);
        println!("✅ 输入校验接口测试通过！");
    }

    #[actix_web::test]
    async fn test_unknown_field() {
        let (_, service) = test_service("http://127.0.0.1:9/api");
        let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(config)).await;

        let req = test::TestRequest::get().uri("/validate/phone?value=1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let req = test::TestRequest::get().uri("/validate/date?value=2024-03-15&format=slash").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }
}
