//! 프로세스 상태 조회 포트.
//!
//! 구현: `monit-monitor` crate (sysinfo)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::report::ProcessHealth;

/// 현재 프로세스 상태 조회
#[async_trait]
pub trait HealthProvider: Send + Sync {
    /// 현재 메모리 사용량 수집
    async fn collect(&self) -> Result<ProcessHealth, CoreError>;
}
