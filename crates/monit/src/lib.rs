//! # monit
//!
//! 장시간 실행되는 서버 프로세스용 경량 메트릭 리포터.
//! 요청 수와 처리 시간을 주기 동안 누산하고, 주기마다 프로세스 상태(메모리, 가동 시간)와
//! 사용자 기본 필드를 합친 JSON을 설정된 HTTP 수신처로 보낸다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use monit::{build_client, HttpReportSink, HttpSinkConfig, Monitor, MonitorOptions, ReportConfig};
//! use monit::SysInfoHealthProvider;
//! use std::sync::Arc;
//!
//! let config = ReportConfig::resolve(
//!     MonitorOptions::default()
//!         .with_host("https://myhost.com/reporting/")
//!         .with_base_field("auth", "maybeINeedThis?"),
//! )?;
//! let client = build_client(&HttpSinkConfig::default())?;
//! let sink = Arc::new(HttpReportSink::new(client, config.endpoint().clone()));
//! let monitor = Monitor::new(config, sink, Arc::new(SysInfoHealthProvider::new()?));
//! monitor.start()?;
//!
//! // 요청 처리마다
//! monitor.request_with(elapsed);
//! ```

pub mod monitor;
pub mod reporter;

pub use monit_core::accumulator::Accumulator;
pub use monit_core::config::{MonitorOptions, ReportConfig, ENV_HOST, ENV_INTERVAL};
pub use monit_core::error::CoreError;
pub use monit_core::models::report::CounterSnapshot;
pub use monit_monitor::process::SysInfoHealthProvider;
pub use monit_network::http_sink::{build_client, HttpReportSink, HttpSinkConfig};
pub use monitor::Monitor;
pub use reporter::FlushOutcome;
