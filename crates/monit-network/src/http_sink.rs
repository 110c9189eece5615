//! HTTP 리포트 수신처.
//!
//! `ReportSink` 포트 구현. JSON 본문을 POST로 한 번만 보낸다 (재시도 없음).

use async_trait::async_trait;
use monit_core::error::CoreError;
use monit_core::ports::sink::ReportSink;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// 기본 요청 타임아웃
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// 에러 메시지에 담을 응답 본문 최대 길이
const MAX_ERROR_BODY: usize = 512;

/// 공유 HTTP 클라이언트 설정
#[derive(Debug, Clone)]
pub struct HttpSinkConfig {
    /// 요청 타임아웃
    pub timeout: Duration,
    /// 인증서 검증 생략 (자체 서명 인증서 수신처용)
    pub accept_invalid_certs: bool,
}

impl Default for HttpSinkConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            accept_invalid_certs: false,
        }
    }
}

/// 공유 HTTP 클라이언트 생성
///
/// 프로세스당 한 번 만들어 여러 `HttpReportSink`에 복제해 넣는다.
/// `reqwest::Client`는 내부적으로 `Arc`라 복제 비용이 작다.
pub fn build_client(config: &HttpSinkConfig) -> Result<reqwest::Client, CoreError> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()
        .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))
}

/// HTTP POST 수신처 — `ReportSink` 포트 구현
#[derive(Debug, Clone)]
pub struct HttpReportSink {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpReportSink {
    /// 주입된 클라이언트로 수신처 생성
    pub fn new(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    /// 수신처 URL
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ReportSink for HttpReportSink {
    async fn deliver(&self, body: Vec<u8>) -> Result<(), CoreError> {
        let size = body.len();
        let resp = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("리포트 전송 실패: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            debug!("리포트 전송 성공: {size} bytes → {status}");
            return Ok(());
        }

        let mut text = resp.text().await.unwrap_or_else(|e| {
            tracing::warn!("응답 본문 읽기 실패: {e}");
            String::new()
        });
        if text.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
        }

        Err(CoreError::Rejected {
            status: status.as_u16(),
            body: text,
        })
    }
}
