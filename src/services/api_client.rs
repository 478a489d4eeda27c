//! 分析引擎 HTTP 客户端
//!
//! 所有请求走同一个 `request` 入口：统一 JSON 请求头、非 2xx 转为错误、
//! 响应体一律按 JSON 解析。不做重试，不设超时，错误原样交给调用方。
//!
//! ## 接口
//! - POST /analyze - 策略分析
//! - GET /etf/info?code= - ETF基础信息
//! - GET /etf/popular - 热门ETF
//! - GET /etf/validate?code= - 校验ETF代码
//! - GET /etf/historical?code=&start_date=&end_date= - 历史行情
//! - GET /health - 健康检查
//! - GET /version - 版本号

use anyhow::{anyhow, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::models::{
    AnalysisParameters, AnalysisResult, EngineResponse, EtfInfo, HealthStatus, HistoricalBar, PopularEtf,
    VersionInfo,
};

/// 分析引擎客户端
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// HTTP 客户端
    client: Client,
    /// API 根地址，如 http://127.0.0.1:5000/api
    base_url: String,
}

impl ApiClient {
    /// 创建客户端
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ==================== 通用请求 ====================

    /// 通用请求方法
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        log::debug!("📡 {} {}", method, url);

        let mut builder = self
            .client
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.body(body.to_string());
        }

        let result = Self::send(builder).await;
        if let Err(e) = &result {
            log::error!("API请求失败 [{}]: {}", endpoint, e);
        }
        result
    }

    async fn send(builder: RequestBuilder) -> Result<Value> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = ["message", "error"]
                .iter()
                .find_map(|key| body.get(*key).and_then(Value::as_str).filter(|m| !m.is_empty()))
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
            return Err(anyhow!(message));
        }

        Ok(response.json::<Value>().await?)
    }

    /// GET 请求
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T> {
        let value = self.request(Method::GET, endpoint, query, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// POST 请求
    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, endpoint: &str, data: &B) -> Result<T> {
        let body = serde_json::to_value(data)?;
        let value = self.request(Method::POST, endpoint, &[], Some(body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    // ==================== 业务接口 ====================

    /// ETF网格策略分析
    pub async fn analyze_etf(&self, params: &AnalysisParameters) -> Result<EngineResponse<AnalysisResult>> {
        self.post("/analyze", params).await
    }

    /// ETF基础信息
    pub async fn etf_info(&self, etf_code: &str) -> Result<EngineResponse<EtfInfo>> {
        self.get("/etf/info", &[("code", etf_code)]).await
    }

    /// 热门ETF列表
    pub async fn popular_etfs(&self) -> Result<EngineResponse<Vec<PopularEtf>>> {
        self.get("/etf/popular", &[]).await
    }

    /// 校验ETF代码是否存在
    pub async fn validate_etf_code(&self, etf_code: &str) -> Result<EngineResponse<Value>> {
        self.get("/etf/validate", &[("code", etf_code)]).await
    }

    /// 历史行情
    pub async fn historical_data(
        &self,
        etf_code: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<EngineResponse<Vec<HistoricalBar>>> {
        self.get(
            "/etf/historical",
            &[("code", etf_code), ("start_date", start_date), ("end_date", end_date)],
        )
        .await
    }

    /// 健康检查
    pub async fn health_check(&self) -> Result<HealthStatus> {
        self.get("/health", &[]).await
    }

    /// 系统版本号
    pub async fn version(&self) -> Result<EngineResponse<VersionInfo>> {
        self.get("/version", &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::ServerGuard) -> ApiClient {
        ApiClient::new(format!("{}/api/", server.url()))
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new("http://localhost:5000/api/");
        assert_eq!(client.base_url(), "http://localhost:5000/api");
    }

    #[tokio::test]
    async fn test_analyze_posts_parameters() {
        println!("\n========== 测试策略分析请求 ==========");
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/analyze")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "etfCode": "510300",
                "totalCapital": 100000.0,
                "gridType": "等比",
                "riskPreference": "均衡",
                "adjustmentCoefficient": 1.0
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "success": true,
                    "data": {
                        "etf_info": {"code": "510300", "name": "沪深300ETF"},
                        "suitability_evaluation": {"total_score": 78},
                        "grid_strategy": {"grid_count": 24}
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let response = client
            .analyze_etf(&AnalysisParameters::with_defaults("510300"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(response.success);
        let data = response.data.unwrap();
        println!("  ETF名称: {:?}", data.etf_name());
        assert_eq!(data.etf_name(), Some("沪深300ETF"));
        assert_eq!(data.grid_strategy["grid_count"], 24);
        assert!(data.data_quality.is_null());
        println!("✅ 策略分析请求测试通过！");
    }

    #[tokio::test]
    async fn test_get_sends_query_parameters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/etf/historical")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("code".into(), "510300".into()),
                Matcher::UrlEncoded("start_date".into(), "20240101".into()),
                Matcher::UrlEncoded("end_date".into(), "20240131".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"success": true, "data": [{"date": "2024-01-02", "close": 3.45}]}"#)
            .create_async()
            .await;

        let response = client_for(&server)
            .historical_data("510300", "20240101", "20240131")
            .await
            .unwrap();

        mock.assert_async().await;
        let bars = response.data.unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 3.45);
        assert_eq!(bars[0].open, 0.0);
    }

    #[tokio::test]
    async fn test_error_uses_message_from_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/etf/info")
            .match_query(Matcher::UrlEncoded("code".into(), "999999".into()))
            .with_status(404)
            .with_body(r#"{"success": false, "message": "未找到ETF代码: 999999"}"#)
            .create_async()
            .await;

        let err = client_for(&server).etf_info("999999").await.unwrap_err();
        assert_eq!(err.to_string(), "未找到ETF代码: 999999");
    }

    #[tokio::test]
    async fn test_error_falls_back_to_error_field() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/analyze")
            .with_status(400)
            .with_body(r#"{"success": false, "error": "投资金额应在1万-100万之间"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .analyze_etf(&AnalysisParameters::with_defaults("510300"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "投资金额应在1万-100万之间");
    }

    #[tokio::test]
    async fn test_error_without_json_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/version")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let err = client_for(&server).version().await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 502");
    }

    #[tokio::test]
    async fn test_health_and_version() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/health")
            .with_status(200)
            .with_body(r#"{"status": "healthy", "service": "ETF Grid Trading Analysis System", "version": "1.2.0"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/version")
            .with_status(200)
            .with_body(r#"{"success": true, "data": {"version": "1.2.0", "timestamp": "2024-03-15T10:00:00"}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let health = client.health_check().await.unwrap();
        assert_eq!(health.status, "healthy");

        let version = client.version().await.unwrap();
        assert_eq!(version.data.unwrap().version, "1.2.0");
    }

    #[tokio::test]
    async fn test_popular_etfs() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/etf/popular")
            .with_status(200)
            .with_body(r#"{"success": true, "data": [{"code": "510300", "name": "沪深300ETF"}]}"#)
            .create_async()
            .await;

        let response = client_for(&server).popular_etfs().await.unwrap();
        assert_eq!(
            response.data.unwrap(),
            vec![PopularEtf { code: "510300".into(), name: "沪深300ETF".into() }]
        );
    }
}
