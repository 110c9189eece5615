//! Monit 핵심 에러 타입.
//!
//! 어댑터 crate는 모두 이 타입을 그대로 반환한다.
//! 설정 에러만 생성 시점에 치명적이며, 나머지는 리포팅 루프 안에서 흡수된다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 필수 설정값이 명시값과 환경 변수 모두에 없음
    #[error("설정 에러: {0}")]
    Config(String),

    /// 설정값은 있으나 유효하지 않음
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// JSON 직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 수신 측이 2xx가 아닌 상태 코드로 응답
    #[error("리포트 거부 ({status}): {body}")]
    Rejected {
        /// HTTP 상태 코드
        status: u16,
        /// 응답 본문
        body: String,
    },

    /// 프로세스 상태 조회 실패
    #[error("상태 조회 실패: {0}")]
    Health(String),

    /// 라이프사이클 오용 (중복 시작, 종료 후 시작 등)
    #[error("잘못된 상태: {0}")]
    InvalidState(String),
}

impl CoreError {
    /// 생성 시점에 치명적인 설정 에러인지 여부
    pub fn is_config(&self) -> bool {
        matches!(self, CoreError::Config(_) | CoreError::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_fatal_kind() {
        assert!(CoreError::Config("host".to_string()).is_config());
        assert!(CoreError::Validation {
            field: "interval".to_string(),
            message: "0".to_string(),
        }
        .is_config());
        assert!(!CoreError::Network("down".to_string()).is_config());
        assert!(!CoreError::Rejected {
            status: 500,
            body: String::new(),
        }
        .is_config());
    }

    #[test]
    fn rejected_display_contains_status() {
        let err = CoreError::Rejected {
            status: 503,
            body: "busy".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("busy"));
    }
}
