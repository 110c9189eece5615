//! 리포트 모델.
//!
//! 카운터 스냅샷, 프로세스 상태, 그리고 이 둘을 사용자 기본 필드와 합친
//! 평탄한 JSON 페이로드.

use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::error::CoreError;

/// 예약된 계산 필드 키
pub const KEY_APP_USED_MEMORY: &str = "app_used_memory";
pub const KEY_UPTIME: &str = "uptime";
pub const KEY_REQUESTS: &str = "requests";
pub const KEY_RESPONSE_TIMES: &str = "response_times";

/// 메모리 단위 변환 (bytes → MB, 10진)
const BYTES_PER_MB: f64 = 1_000_000.0;

/// 한 주기 동안 누산된 카운터 값
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    /// 요청 수
    pub requests: u64,
    /// 누적 처리 시간 (마이크로초)
    pub total_duration_micros: u64,
}

impl CounterSnapshot {
    /// 평균 처리 시간 (마이크로초, 정수 나눗셈). 요청이 없으면 0.
    pub fn mean_duration_micros(&self) -> u64 {
        if self.requests == 0 {
            return 0;
        }
        self.total_duration_micros / self.requests
    }
}

/// 프로세스 상태 측정값
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessHealth {
    /// 현재 프로세스 메모리 사용량 (바이트)
    pub used_memory_bytes: u64,
}

/// 플러시 시점에 계산되는 필드
#[derive(Debug, Clone, Serialize)]
pub struct ComputedFields {
    /// 메모리 사용량 (MB)
    pub app_used_memory: f64,
    /// Monitor 생성 이후 경과 시간 (초)
    pub uptime: u64,
    /// 이번 주기 요청 수
    pub requests: u64,
    /// 이번 주기 평균 처리 시간 (마이크로초)
    pub response_times: u64,
}

impl ComputedFields {
    pub fn new(health: &ProcessHealth, counters: &CounterSnapshot, uptime: Duration) -> Self {
        Self {
            app_used_memory: health.used_memory_bytes as f64 / BYTES_PER_MB,
            uptime: uptime.as_secs(),
            requests: counters.requests,
            response_times: counters.mean_duration_micros(),
        }
    }
}

/// 기본 필드와 계산 필드를 하나의 평탄한 객체로 병합
///
/// 기본 필드를 먼저 넣고 계산 필드로 덮어쓴다. 같은 키가 있으면 계산 필드가 이긴다.
pub fn merge_report(
    base: &Map<String, Value>,
    computed: &ComputedFields,
) -> Result<Map<String, Value>, CoreError> {
    let mut report = base.clone();
    match serde_json::to_value(computed)? {
        Value::Object(fields) => report.extend(fields),
        other => {
            // ComputedFields는 항상 객체로 직렬화된다
            return Err(CoreError::Serialization(serde::ser::Error::custom(format!(
                "계산 필드가 객체가 아님: {other}"
            ))));
        }
    }
    Ok(report)
}

/// 리포트를 JSON 바이트로 인코딩
pub fn encode_report(report: &Map<String, Value>) -> Result<Vec<u8>, CoreError> {
    Ok(serde_json::to_vec(report)?)
}
