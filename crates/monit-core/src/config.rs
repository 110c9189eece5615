//! 리포트 설정.
//!
//! 수신처 URL, 리포트 주기, 기본 필드를 정의한다.
//! 명시값이 비어 있으면 `MONIT_HOST`, `MONIT_INTERVAL` 환경 변수로 대체하고,
//! 둘 다 없으면 생성 자체가 실패한다.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::CoreError;

/// 수신처 URL 환경 변수
pub const ENV_HOST: &str = "MONIT_HOST";

/// 리포트 주기(초) 환경 변수
pub const ENV_INTERVAL: &str = "MONIT_INTERVAL";

/// 사용자 입력 설정 — 모든 필드 선택
///
/// 빈 `host`와 `interval_secs = 0`은 "미지정"으로 취급한다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorOptions {
    /// 리포트를 보낼 전체 URL
    #[serde(default)]
    pub host: Option<String>,
    /// 리포트 주기 (초)
    #[serde(default)]
    pub interval_secs: Option<u64>,
    /// 모든 리포트에 포함될 기본 필드
    #[serde(default)]
    pub base: Map<String, Value>,
}

impl MonitorOptions {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_interval_secs(mut self, secs: u64) -> Self {
        self.interval_secs = Some(secs);
        self
    }

    /// 기본 필드 추가
    pub fn with_base_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.base.insert(key.into(), value.into());
        self
    }
}

/// 해석이 끝난 리포트 설정 (생성 후 불변)
#[derive(Debug, Clone)]
pub struct ReportConfig {
    endpoint: Url,
    interval_secs: u64,
    base: Map<String, Value>,
}

impl ReportConfig {
    /// 프로세스 환경 변수를 대체값으로 사용해 설정 해석
    pub fn resolve(options: MonitorOptions) -> Result<Self, CoreError> {
        Self::resolve_with(options, |key| std::env::var(key).ok())
    }

    /// 주입된 조회 함수를 대체값으로 사용해 설정 해석
    pub fn resolve_with<F>(options: MonitorOptions, lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = match options.host.filter(|h| !h.trim().is_empty()) {
            Some(host) => host,
            None => lookup(ENV_HOST)
                .filter(|h| !h.trim().is_empty())
                .ok_or_else(|| {
                    CoreError::Config(format!("수신처 URL 미지정 (host 또는 {ENV_HOST})"))
                })?,
        };
        let endpoint = parse_endpoint(host.trim())?;

        let interval_secs = match options.interval_secs.filter(|secs| *secs > 0) {
            Some(secs) => secs,
            None => {
                let raw = lookup(ENV_INTERVAL).ok_or_else(|| {
                    CoreError::Config(format!(
                        "리포트 주기 미지정 (interval_secs 또는 {ENV_INTERVAL})"
                    ))
                })?;
                parse_interval(&raw)?
            }
        };

        debug!("리포트 설정 해석 완료: endpoint={endpoint}, interval={interval_secs}s");

        Ok(Self {
            endpoint,
            interval_secs,
            base: options.base,
        })
    }

    /// 수신처 URL
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// 리포트 주기 (초)
    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    /// 리포트 주기
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// 기본 필드
    pub fn base(&self) -> &Map<String, Value> {
        &self.base
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, CoreError> {
    let url = Url::parse(raw).map_err(|e| CoreError::Validation {
        field: "host".to_string(),
        message: format!("URL 파싱 실패 ({raw}): {e}"),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(CoreError::Validation {
            field: "host".to_string(),
            message: format!("지원하지 않는 스킴: {other}"),
        }),
    }
}

fn parse_interval(raw: &str) -> Result<u64, CoreError> {
    let secs: u64 = raw.trim().parse().map_err(|e| CoreError::Validation {
        field: "interval".to_string(),
        message: format!("{ENV_INTERVAL} 파싱 실패 ({raw}): {e}"),
    })?;

    if secs == 0 {
        return Err(CoreError::Validation {
            field: "interval".to_string(),
            message: "리포트 주기는 1초 이상이어야 함".to_string(),
        });
    }
    Ok(secs)
}
