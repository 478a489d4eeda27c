//! ETF 数据接口处理器
//!
//! 转发到分析引擎，代码格式先在本地校验
//!
//! ## API 列表
//! - GET /etf/info/{code} - ETF基础信息
//! - GET /etf/popular - 热门ETF（引擎不可用时返回内置列表）
//! - GET /etf/validate/{code} - 校验ETF代码
//! - GET /etf/historical/{code}?start_date=&end_date= - 历史行情

use actix_web::{web, HttpResponse, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{ApiResponse, EtfInfo, HistoricalBar};
use crate::services::analysis::AnalysisService;
use crate::services::etf_catalog;
use crate::services::format::{format_date, format_large_number, format_number, format_percent};
use crate::services::validation::{validate_date, validate_etf_code, DateFormat};

#[derive(Debug, Deserialize)]
pub struct HistoricalQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// 附带展示文本的ETF信息，日期统一为 YYYY-MM-DD
#[derive(Debug, Serialize)]
pub struct EtfInfoView {
    #[serde(flatten)]
    pub info: EtfInfo,
    pub display: EtfInfoDisplay,
}

#[derive(Debug, Serialize)]
pub struct EtfInfoDisplay {
    pub price: String,
    /// 涨跌幅，如 "+1.23%"
    pub change: String,
    pub volume: String,
    pub amount: String,
}

impl From<EtfInfo> for EtfInfoView {
    fn from(mut info: EtfInfo) -> Self {
        for date in [&mut info.setup_date, &mut info.list_date, &mut info.trade_date] {
            if let Some(formatted) = format_date(date.as_str()) {
                *date = formatted;
            }
        }

        // 引擎返回的涨跌幅已是百分数
        let change = match format_percent(info.change_pct / 100.0, 2) {
            Ok(text) if info.change_pct > 0.0 => format!("+{}", text),
            Ok(text) => text,
            Err(_) => "--".to_string(),
        };

        let display = EtfInfoDisplay {
            price: format_number(info.current_price),
            change,
            volume: format_large_number(info.volume),
            amount: format_large_number(info.amount),
        };
        Self { info, display }
    }
}

fn invalid_code() -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::<Value>::error("请输入6位数字ETF代码"))
}

/// 日期接受 YYYYMMDD 或 YYYY-MM-DD
fn valid_date(date: Option<&str>) -> bool {
    validate_date(date, DateFormat::Compact).is_valid || validate_date(date, DateFormat::Dashed).is_valid
}

pub async fn get_etf_info(service: web::Data<AnalysisService>, path: web::Path<String>) -> Result<HttpResponse> {
    let code = etf_catalog::extract_etf_code(&path.into_inner());
    if !validate_etf_code(Some(&code)) {
        return Ok(invalid_code());
    }

    match service.client().etf_info(&code).await {
        Ok(response) => {
            let message = response.failure_reason().unwrap_or("未找到ETF信息").to_string();
            match response.data {
                Some(info) if response.success => {
                    Ok(HttpResponse::Ok().json(ApiResponse::success(EtfInfoView::from(info))))
                }
                _ => Ok(HttpResponse::NotFound().json(ApiResponse::<EtfInfo>::error(message))),
            }
        }
        Err(e) => {
            let response = ApiResponse::<EtfInfo>::error(e.to_string());
            Ok(HttpResponse::BadGateway().json(response))
        }
    }
}

pub async fn get_popular_etfs(service: web::Data<AnalysisService>) -> Result<HttpResponse> {
    match service.client().popular_etfs().await {
        Ok(response) if response.success => {
            if let Some(list) = response.data.filter(|list| !list.is_empty()) {
                return Ok(HttpResponse::Ok().json(ApiResponse::success(list)));
            }
        }
        Ok(response) => {
            log::warn!("获取热门ETF失败: {}", response.failure_reason().unwrap_or("未知错误"));
        }
        Err(e) => {
            log::warn!("获取热门ETF失败: {}", e);
        }
    }

    let response = ApiResponse::success_with_message(etf_catalog::popular_etfs(), "分析引擎暂不可用，使用内置热门列表");
    Ok(HttpResponse::Ok().json(response))
}

pub async fn validate_etf(service: web::Data<AnalysisService>, path: web::Path<String>) -> Result<HttpResponse> {
    let code = path.into_inner();
    if !validate_etf_code(Some(&code)) {
        let data = json!({ "code": code, "valid": false });
        return Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(data, "请输入6位数字ETF代码")));
    }

    match service.client().validate_etf_code(&code).await {
        Ok(response) if response.success => {
            let data = response.data.unwrap_or_else(|| json!({ "code": code, "valid": true }));
            Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
        }
        Ok(response) => {
            let message = response.failure_reason().unwrap_or("ETF代码不存在").to_string();
            let data = json!({ "code": code, "valid": false });
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(data, message)))
        }
        Err(e) => {
            let response = ApiResponse::<Value>::error(e.to_string());
            Ok(HttpResponse::BadGateway().json(response))
        }
    }
}

pub async fn get_historical_data(
    service: web::Data<AnalysisService>,
    path: web::Path<String>,
    query: web::Query<HistoricalQuery>,
) -> Result<HttpResponse> {
    let code = path.into_inner();
    if !validate_etf_code(Some(&code)) {
        return Ok(invalid_code());
    }

    let (start_date, end_date) = match (query.start_date.as_deref(), query.end_date.as_deref()) {
        (Some(start), Some(end)) if valid_date(Some(start)) && valid_date(Some(end)) => (start, end),
        _ => {
            let response = ApiResponse::<Vec<HistoricalBar>>::error("请提供有效的开始和结束日期");
            return Ok(HttpResponse::BadRequest().json(response));
        }
    };

    match service.client().historical_data(&code, start_date, end_date).await {
        Ok(response) if response.success => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(response.data.unwrap_or_default())))
        }
        Ok(response) => {
            let message = response.failure_reason().unwrap_or("获取历史数据失败").to_string();
            Ok(HttpResponse::BadGateway().json(ApiResponse::<Vec<HistoricalBar>>::error(message)))
        }
        Err(e) => {
            let response = ApiResponse::<Vec<HistoricalBar>>::error(e.to_string());
            Ok(HttpResponse::BadGateway().json(response))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/etf")
            .route("/popular", web::get().to(get_popular_etfs))
            .route("/info/{code}", web::get().to(get_etf_info))
            .route("/validate/{code}", web::get().to(validate_etf))
            .route("/historical/{code}", web::get().to(get_historical_data)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis::test_service;
    use actix_web::{test, App};
    use mockito::Matcher;

    #[actix_web::test]
    async fn test_popular_falls_back_to_catalog() {
        println!("\n========== 测试热门ETF降级 ==========");
        let (_, service) = test_service("http://127.0.0.1:9/api");
        let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(config)).await;

        let req = test::TestRequest::get().uri("/etf/popular").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: Value = test::read_body_json(resp).await;
        let list = body["data"].as_array().unwrap();
        println!("  内置列表: {} 条", list.len());
        assert_eq!(list.len(), 15);
        assert_eq!(list[0]["code"], "510300");
        println!("✅ 热门ETF降级测试通过！");
    }

    #[actix_web::test]
    async fn test_etf_info_proxy() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/etf/info")
            .match_query(Matcher::UrlEncoded("code".into(), "510300".into()))
            .with_status(200)
            .with_body(
                r#"{"success": true, "data": {"code": "510300", "name": "沪深300ETF", "current_price": 3.9,
                    "change_pct": 1.234, "amount": 1234567890, "trade_date": "20240315"}}"#,
            )
            .create_async()
            .await;

        let (_, service) = test_service(&format!("{}/api", server.url()));
        let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(config)).await;

        let req = test::TestRequest::get().uri("/etf/info/510300").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["name"], "沪深300ETF");
        assert_eq!(body["data"]["current_price"], 3.9);
        assert_eq!(body["data"]["trade_date"], "2024-03-15");
        assert_eq!(body["data"]["display"]["change"], "+1.23%");
        assert_eq!(body["data"]["display"]["amount"], "12.35亿");
        assert_eq!(body["data"]["display"]["volume"], "0");
    }

    #[actix_web::test]
    async fn test_validate_rejects_bad_format_locally() {
        let (_, service) = test_service("http://127.0.0.1:9/api");
        let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(config)).await;

        let req = test::TestRequest::get().uri("/etf/validate/5103").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["valid"], false);
    }

    #[actix_web::test]
    async fn test_historical_requires_dates() {
        let (_, service) = test_service("http://127.0.0.1:9/api");
        let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(config)).await;

        let req = test::TestRequest::get()
            .uri("/etf/historical/510300?start_date=2024/01/01&end_date=20240131")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_historical_proxy() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/etf/historical")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("code".into(), "510300".into()),
                Matcher::UrlEncoded("start_date".into(), "2024-01-01".into()),
                Matcher::UrlEncoded("end_date".into(), "20240131".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"success": true, "data": [{"date": "2024-01-02", "open": 3.4, "close": 3.45}]}"#)
            .create_async()
            .await;

        let (_, service) = test_service(&format!("{}/api", server.url()));
        let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(config)).await;

        let req = test::TestRequest::get()
            .uri("/etf/historical/510300?start_date=2024-01-01&end_date=20240131")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"][0]["close"], 3.45);
    }
}
