//! 策略分析接口处理器
//!
//! ## API 列表
//! - GET /analysis/{etf_code}?capital=&grid=&risk=&adjustment= - 按分享链接参数分析
//! - POST /analysis - 按参数表单分析
//! - GET /analysis/{etf_code}/report/{tab}?... - 重新分析并只返回指定标签页的数据
//! - POST /analysis/report/{tab} - 从已有的分析结果中取指定标签页，不请求分析引擎

use actix_web::{web, HttpRequest, HttpResponse, Result};
use chrono::Utc;
use serde_json::{json, Value};

use crate::models::{AnalysisForm, AnalysisResult, ApiResponse, ReportTab};
use crate::services::analysis::{AnalysisOutcome, AnalysisService, CompletedAnalysis};

/// 非完成状态的统一响应；完成状态交给调用方处理
fn pending_response(outcome: AnalysisOutcome) -> std::result::Result<CompletedAnalysis, HttpResponse> {
    match outcome {
        AnalysisOutcome::Completed(completed) => Ok(completed),
        AnalysisOutcome::Rejected { etf_code } => Err(HttpResponse::BadRequest().json(ApiResponse::rejected(
            json!({ "etfCode": etf_code, "redirect": "/" }),
            format!("无效的ETF代码: {}", etf_code),
        ))),
        AnalysisOutcome::InvalidForm(validation) => {
            Err(HttpResponse::BadRequest().json(ApiResponse::rejected(validation, "参数校验失败")))
        }
        AnalysisOutcome::DisclaimerRequired { params, corrections } => Err(HttpResponse::Forbidden().json(
            ApiResponse::rejected(
                json!({ "params": params, "corrections": corrections }),
                "请先阅读并确认免责声明",
            ),
        )),
    }
}

fn engine_error(e: anyhow::Error) -> HttpResponse {
    HttpResponse::BadGateway().json(ApiResponse::<Value>::error(e.to_string()))
}

fn completed_response(completed: CompletedAnalysis) -> HttpResponse {
    if completed.corrections.is_empty() {
        HttpResponse::Ok().json(ApiResponse::success(completed))
    } else {
        let message = format!("参数已自动修正: {}", completed.corrections.join("; "));
        HttpResponse::Ok().json(ApiResponse::success_with_message(completed, message))
    }
}

pub async fn analyze_from_url(service: web::Data<AnalysisService>, req: HttpRequest) -> Result<HttpResponse> {
    match service.run_from_path(req.path(), req.query_string(), Utc::now()).await {
        Ok(outcome) => match pending_response(outcome) {
            Ok(completed) => Ok(completed_response(completed)),
            Err(response) => Ok(response),
        },
        Err(e) => Ok(engine_error(e)),
    }
}

pub async fn analyze_from_form(
    service: web::Data<AnalysisService>,
    form: web::Json<AnalysisForm>,
) -> Result<HttpResponse> {
    match service.run_from_form(&form, Utc::now()).await {
        Ok(outcome) => match pending_response(outcome) {
            Ok(completed) => Ok(completed_response(completed)),
            Err(response) => Ok(response),
        },
        Err(e) => Ok(engine_error(e)),
    }
}

fn report_tab(tab_id: &str) -> std::result::Result<ReportTab, HttpResponse> {
    ReportTab::from_id(tab_id).ok_or_else(|| {
        HttpResponse::BadRequest().json(ApiResponse::<Value>::error(format!("无效的报告标签: {}", tab_id)))
    })
}

/// 每次请求都会重新分析并刷新历史记录的时间
pub async fn analysis_report_tab(
    service: web::Data<AnalysisService>,
    path: web::Path<(String, String)>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let (etf_code, tab_id) = path.into_inner();

    let tab = match report_tab(&tab_id) {
        Ok(tab) => tab,
        Err(response) => return Ok(response),
    };

    match service.run_from_url(&etf_code, req.query_string(), Utc::now()).await {
        Ok(outcome) => match pending_response(outcome) {
            Ok(completed) => {
                let data = json!({
                    "tab": tab.id(),
                    "label": tab.label(),
                    "etfName": completed.etf_name,
                    "sections": tab.select(&completed.result),
                });
                Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
            }
            Err(response) => Ok(response),
        },
        Err(e) => Ok(engine_error(e)),
    }
}

/// 已有分析结果的标签页
pub async fn select_report_tab(
    path: web::Path<String>,
    result: web::Json<AnalysisResult>,
) -> Result<HttpResponse> {
    let tab = match report_tab(&path.into_inner()) {
        Ok(tab) => tab,
        Err(response) => return Ok(response),
    };

    let data = json!({
        "tab": tab.id(),
        "label": tab.label(),
        "etfName": result.etf_name(),
        "sections": tab.select(&result),
    });
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/analysis")
            .route("", web::post().to(analyze_from_form))
            .route("/report/{tab}", web::post().to(select_report_tab))
            .route("/{etf_code}", web::get().to(analyze_from_url))
            .route("/{etf_code}/report/{tab}", web::get().to(analysis_report_tab)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis::test_service;
    use actix_web::{test, App};

    fn analysis_body() -> String {
        json!({
            "success": true,
            "data": {
                "etf_info": {"code": "159915", "name": "创业板ETF"},
                "suitability_evaluation": {"total_score": 82},
                "grid_strategy": {"grid_count": 30},
                "strategy_rationale": {"summary": "波动充分"},
                "adjustment_suggestions": {},
                "data_quality": {},
                "input_parameters": {}
            }
        })
        .to_string()
    }

    #[actix_web::test]
    async fn test_invalid_code_returns_bad_request() {
        let (_, service) = test_service("http://127.0.0.1:9/api");
        let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(config)).await;

        let req = test::TestRequest::get().uri("/analysis/12ab56").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["data"]["redirect"], "/");
    }

    #[actix_web::test]
    async fn test_disclaimer_required_returns_forbidden() {
        let (_, service) = test_service("http://127.0.0.1:9/api");
        let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(config)).await;

        let req = test::TestRequest::get()
            .uri("/analysis/510300?capital=200000&adjustment=3")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["params"]["totalCapital"], 200000.0);
        assert_eq!(body["data"]["params"]["adjustmentCoefficient"], 1.0);
    }

    #[actix_web::test]
    async fn test_report_tab() {
        println!("\n========== 测试报告标签页接口 ==========");
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/analyze")
            .with_status(200)
            .with_body(analysis_body())
            .create_async()
            .await;

        let (_, service) = test_service(&format!("{}/api", server.url()));
        service.disclaimer().accept(Utc::now()).unwrap();
        let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(config)).await;

        let req = test::TestRequest::get()
            .uri("/analysis/159915/report/strategy?capital=150000")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: Value = test::read_body_json(resp).await;
        println!("  响应: {}", body);
        assert_eq!(body["data"]["label"], "网格策略");
        assert_eq!(body["data"]["etfName"], "创业板ETF");
        assert_eq!(body["data"]["sections"]["grid_strategy"]["grid_count"], 30);
        assert!(body["data"]["sections"].get("suitability_evaluation").is_none());
        println!("✅ 报告标签页接口测试通过！");
    }

    #[actix_web::test]
    async fn test_report_tab_from_existing_result() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/api/analyze").expect(0).create_async().await;

        let (_, service) = test_service(&format!("{}/api", server.url()));
        service.disclaimer().accept(Utc::now()).unwrap();
        let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(config)).await;

        let result: Value = serde_json::from_str::<Value>(&analysis_body()).unwrap()["data"].clone();
        let req = test::TestRequest::post()
            .uri("/analysis/report/strategy")
            .set_json(&result)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["etfName"], "创业板ETF");
        assert_eq!(body["data"]["sections"]["grid_strategy"]["grid_count"], 30);
        mock.assert_async().await;

        let req = test::TestRequest::post()
            .uri("/analysis/report/risk")
            .set_json(&result)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_unknown_report_tab() {
        let (_, service) = test_service("http://127.0.0.1:9/api");
        let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(config)).await;

        let req = test::TestRequest::get().uri("/analysis/510300/report/risk").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_form_analysis_with_correction_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/analyze")
            .with_status(200)
            .with_body(analysis_body())
            .create_async()
            .await;

        let (_, service) = test_service(&format!("{}/api", server.url()));
        service.disclaimer().accept(Utc::now()).unwrap();
        let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(config)).await;

        let req = test::TestRequest::get()
            .uri("/analysis/159915?grid=fibonacci")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "参数已自动修正: 网格类型参数无效");
        assert_eq!(body["data"]["correctedQuery"], "capital=100000&grid=geometric&risk=balanced&adjustment=1");

        let req = test::TestRequest::post()
            .uri("/analysis")
            .set_json(json!({"etfCode": "159915", "totalCapital": 20000}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["errors"]["totalCapital"], "投资金额不能少于10万元");
    }

    #[actix_web::test]
    async fn test_engine_unreachable_is_bad_gateway() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/analyze")
            .with_status(500)
            .with_body(r#"{"success": false, "error": "服务器内部错误"}"#)
            .create_async()
            .await;

        let (_, service) = test_service(&format!("{}/api", server.url()));
        service.disclaimer().accept(Utc::now()).unwrap();
        let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(config)).await;

        let req = test::TestRequest::get().uri("/analysis/510300").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 502);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "服务器内部错误");
    }
}
