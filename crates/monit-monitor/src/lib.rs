//! # monit-monitor
//!
//! 프로세스 상태 모니터링 어댑터.
//! 현재 프로세스의 메모리 사용량을 sysinfo로 수집한다.

pub mod process;
