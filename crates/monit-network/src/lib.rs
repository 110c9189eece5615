//! # monit-network
//!
//! 리포트 전송 HTTP 어댑터.
//! 하나의 공유 `reqwest::Client`를 만들어 각 Monitor의 수신처에 주입한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use monit_network::http_sink::{build_client, HttpReportSink, HttpSinkConfig};
//!
//! let client = build_client(&HttpSinkConfig::default())?;
//! let sink = HttpReportSink::new(client, config.endpoint().clone());
//! ```

pub mod http_sink;
