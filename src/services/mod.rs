//! 业务逻辑服务模块
//!
//! 参数编解码、校验、历史与免责声明存储，以及对分析引擎的调用

pub mod analysis;     // 分析流程
pub mod api_client;   // 分析引擎客户端
pub mod codec;        // URL 参数编解码
pub mod disclaimer;   // 免责声明确认
pub mod etf_catalog;  // 常见ETF名称
pub mod form_state;   // 参数表单输入
pub mod format;       // 金额、百分比、日期格式化
pub mod history;      // 分析历史
pub mod storage;      // 本地键值存储
pub mod validation;   // 输入校验
