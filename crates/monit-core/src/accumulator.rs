//! 요청 카운터 누산기.
//!
//! 호출자 스레드들이 요청 수와 누적 처리 시간을 기록하고,
//! 리포팅 루프가 주기마다 한 번 읽으면서 동시에 0으로 되돌린다.

use parking_lot::Mutex;
use std::time::Duration;

use crate::models::report::CounterSnapshot;

/// 한 리포트 주기의 요청 카운터
///
/// 읽기와 초기화는 반드시 하나의 임계 구역에서 일어나야 한다.
/// 요청 수와 누적 시간을 한 쌍으로 보호하기 위해 원자 변수 두 개 대신 뮤텍스를 쓴다.
#[derive(Debug, Default)]
pub struct Accumulator {
    counters: Mutex<CounterSnapshot>,
}

impl Accumulator {
    /// 0으로 초기화된 누산기 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 요청 1건 기록. 처리 시간이 있으면 마이크로초 단위로 누적한다.
    pub fn record_request(&self, duration: Option<Duration>) {
        let micros = duration.map_or(0, duration_micros);
        let mut counters = self.counters.lock();
        counters.requests = counters.requests.saturating_add(1);
        counters.total_duration_micros = counters.total_duration_micros.saturating_add(micros);
    }

    /// 현재 값을 반환하고 0으로 초기화
    pub fn snapshot_and_reset(&self) -> CounterSnapshot {
        std::mem::take(&mut *self.counters.lock())
    }

    /// 초기화 없이 현재 값 조회
    pub fn peek(&self) -> CounterSnapshot {
        *self.counters.lock()
    }
}

fn duration_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}
