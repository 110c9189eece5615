//! 리포트 전송 포트.
//!
//! 구현: `monit-network` crate (reqwest)

use async_trait::async_trait;

use crate::error::CoreError;

/// 직렬화된 리포트를 받는 외부 수신처
///
/// 성공/실패만 보고하면 되며, 재시도는 하지 않는다.
/// TLS/인증 같은 전송 설정은 구현체의 책임이다.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// JSON 본문 전송
    async fn deliver(&self, body: Vec<u8>) -> Result<(), CoreError>;
}
