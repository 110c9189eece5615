//! 현재 프로세스 상태 수집.
//!
//! `HealthProvider` 포트 구현. sysinfo로 자기 PID만 갱신한다.

use async_trait::async_trait;
use monit_core::error::CoreError;
use monit_core::models::report::ProcessHealth;
use monit_core::ports::health::HealthProvider;
use std::sync::Mutex;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::debug;

/// sysinfo 기반 프로세스 상태 조회 — `HealthProvider` 포트 구현
pub struct SysInfoHealthProvider {
    sys: Mutex<System>,
    pid: Pid,
}

impl SysInfoHealthProvider {
    /// 현재 프로세스용 조회기 생성
    pub fn new() -> Result<Self, CoreError> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| CoreError::Health(format!("현재 PID 조회 실패: {e}")))?;
        Ok(Self::for_pid(pid))
    }

    /// 지정한 PID용 조회기 생성
    pub fn for_pid(pid: Pid) -> Self {
        Self {
            sys: Mutex::new(System::new()),
            pid,
        }
    }

    /// 대상 PID
    pub fn pid(&self) -> Pid {
        self.pid
    }
}

#[async_trait]
impl HealthProvider for SysInfoHealthProvider {
    async fn collect(&self) -> Result<ProcessHealth, CoreError> {
        let mut sys = self
            .sys
            .lock()
            .map_err(|e| CoreError::Health(format!("시스템 잠금 실패: {e}")))?;

        sys.refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);

        let process = sys
            .process(self.pid)
            .ok_or_else(|| CoreError::Health(format!("프로세스 미발견: pid={}", self.pid)))?;

        let health = ProcessHealth {
            used_memory_bytes: process.memory(),
        };

        debug!(
            "프로세스 상태: pid={}, 메모리 {:.1}MB",
            self.pid,
            health.used_memory_bytes as f64 / 1_000_000.0
        );

        Ok(health)
    }
}
