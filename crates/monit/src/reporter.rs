//! 리포트 플러시 사이클.
//!
//! 상태 조회 → 카운터 스냅샷/초기화 → 병합 → 직렬화 → 전송.
//! 실패는 모두 이 안에서 로그로 흡수되며, 카운터는 결과와 무관하게 이미 초기화되어 있다.

use monit_core::accumulator::Accumulator;
use monit_core::config::ReportConfig;
use monit_core::error::CoreError;
use monit_core::models::report::{encode_report, merge_report, ComputedFields, ProcessHealth};
use monit_core::ports::health::HealthProvider;
use monit_core::ports::sink::ReportSink;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// 플러시 1회 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// 수신처가 2xx로 응답
    Delivered,
    /// 직렬화 실패로 이번 주기 폐기
    ///
    /// 기본 JSON 인코더는 `Map<String, Value>`에서 실패하지 않으므로
    /// 교체된 인코더를 쓸 때만 발생한다.
    SerializationFailed,
    /// 전송 실패로 이번 주기 폐기
    DeliveryFailed,
}

/// 병합된 리포트를 전송 본문으로 변환
pub(crate) type ReportEncoder = fn(&Map<String, Value>) -> Result<Vec<u8>, CoreError>;

/// Monitor 한 개가 소유하는 리포트 상태
pub(crate) struct ReportCycle {
    config: ReportConfig,
    accumulator: Arc<Accumulator>,
    sink: Arc<dyn ReportSink>,
    health: Arc<dyn HealthProvider>,
    encode: ReportEncoder,
    started_at: Instant,
}

impl ReportCycle {
    pub(crate) fn new(
        config: ReportConfig,
        sink: Arc<dyn ReportSink>,
        health: Arc<dyn HealthProvider>,
    ) -> Self {
        Self {
            config,
            accumulator: Arc::new(Accumulator::new()),
            sink,
            health,
            encode: encode_report,
            started_at: Instant::now(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_encoder(mut self, encode: ReportEncoder) -> Self {
        self.encode = encode;
        self
    }

    pub(crate) fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub(crate) fn accumulator(&self) -> &Arc<Accumulator> {
        &self.accumulator
    }

    /// 플러시 1회 실행. 에러를 반환하지 않는다.
    pub(crate) async fn flush(&self) -> FlushOutcome {
        // 상태 조회가 실패해도 이번 주기 카운터는 보고한다
        let health = match self.health.collect().await {
            Ok(health) => health,
            Err(e) => {
                warn!("프로세스 상태 조회 실패, 메모리 0으로 보고: {e}");
                ProcessHealth::default()
            }
        };

        let counters = self.accumulator.snapshot_and_reset();
        let computed = ComputedFields::new(&health, &counters, self.started_at.elapsed());

        let body = match merge_report(self.config.base(), &computed)
            .and_then(|report| (self.encode)(&report))
        {
            Ok(body) => body,
            Err(e) => {
                warn!("리포트 직렬화 실패, 이번 주기 폐기: {e}");
                return FlushOutcome::SerializationFailed;
            }
        };

        match self.sink.deliver(body).await {
            Ok(()) => {
                debug!(
                    "리포트 전송: requests={}, response_times={}µs, uptime={}s",
                    computed.requests, computed.response_times, computed.uptime
                );
                FlushOutcome::Delivered
            }
            Err(e) => {
                warn!(
                    "리포트 전송 실패 ({}), 요청 {}건 폐기: {e}",
                    self.config.endpoint(),
                    counters.requests
                );
                FlushOutcome::DeliveryFailed
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use monit_core::config::MonitorOptions;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration;

    /// 전송된 본문을 기록하는 수신처
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) bodies: Mutex<Vec<Value>>,
        pub(crate) fail: bool,
    }

    impl RecordingSink {
        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub(crate) fn reports(&self) -> Vec<Value> {
            self.bodies.lock().clone()
        }
    }

    #[async_trait]
    impl ReportSink for RecordingSink {
        async fn deliver(&self, body: Vec<u8>) -> Result<(), CoreError> {
            let value: Value = serde_json::from_slice(&body)?;
            self.bodies.lock().push(value);
            if self.fail {
                Err(CoreError::Network("mock 실패".to_string()))
            } else {
                Ok(())
            }
        }
    }

    /// 고정값을 반환하는 상태 조회기
    pub(crate) struct FixedHealth(pub(crate) Option<u64>);

    #[async_trait]
    impl HealthProvider for FixedHealth {
        async fn collect(&self) -> Result<ProcessHealth, CoreError> {
            self.0
                .map(|used_memory_bytes| ProcessHealth { used_memory_bytes })
                .ok_or_else(|| CoreError::Health("mock 실패".to_string()))
        }
    }

    pub(crate) fn test_config(base: Value) -> ReportConfig {
        let mut options = MonitorOptions::default()
            .with_host("http://localhost:9/report")
            .with_interval_secs(1);
        if let Value::Object(map) = base {
            options.base = map;
        }
        ReportConfig::resolve_with(options, |_| None).unwrap()
    }

    fn cycle(sink: Arc<RecordingSink>, health: FixedHealth, base: Value) -> ReportCycle {
        ReportCycle::new(test_config(base), sink, Arc::new(health))
    }

    #[tokio::test]
    async fn flush_reports_counters_and_resets() {
        let sink = Arc::new(RecordingSink::default());
        let cycle = cycle(sink.clone(), FixedHealth(Some(2_000_000)), json!({}));

        for micros in [100, 200, 300] {
            cycle
                .accumulator()
                .record_request(Some(Duration::from_micros(micros)));
        }

        assert_eq!(cycle.flush().await, FlushOutcome::Delivered);
        assert_eq!(cycle.flush().await, FlushOutcome::Delivered);

        let reports = sink.reports();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0]["requests"], json!(3));
        assert_eq!(reports[0]["response_times"], json!(200));
        assert_eq!(reports[0]["app_used_memory"], json!(2.0));
        assert_eq!(reports[1]["requests"], json!(0));
        assert_eq!(reports[1]["response_times"], json!(0));
    }

    #[tokio::test]
    async fn computed_fields_win_over_base() {
        let sink = Arc::new(RecordingSink::default());
        let cycle = cycle(
            sink.clone(),
            FixedHealth(Some(0)),
            json!({ "requests": "should-be-overwritten", "app": "shop" }),
        );
        cycle.accumulator().record_request(None);

        cycle.flush().await;

        let report = &sink.reports()[0];
        assert_eq!(report["requests"], json!(1));
        assert_eq!(report["app"], json!("shop"));
    }

    #[tokio::test]
    async fn delivery_failure_still_resets_counters() {
        let sink = Arc::new(RecordingSink::failing());
        let cycle = cycle(sink.clone(), FixedHealth(Some(0)), json!({}));
        cycle.accumulator().record_request(None);
        cycle.accumulator().record_request(None);

        assert_eq!(cycle.flush().await, FlushOutcome::DeliveryFailed);
        // 재시도/버퍼링 없음 → 누산기는 비어 있음
        assert_eq!(cycle.accumulator().peek().requests, 0);
        assert_eq!(sink.reports().len(), 1);
    }

    #[tokio::test]
    async fn health_failure_reports_zero_memory() {
        let sink = Arc::new(RecordingSink::default());
        let cycle = cycle(sink.clone(), FixedHealth(None), json!({}));
        cycle.accumulator().record_request(None);

        assert_eq!(cycle.flush().await, FlushOutcome::Delivered);
        let report = &sink.reports()[0];
        assert_eq!(report["app_used_memory"], json!(0.0));
        assert_eq!(report["requests"], json!(1));
    }

    fn broken_encoder(_report: &Map<String, Value>) -> Result<Vec<u8>, CoreError> {
        let err = serde_json::from_str::<Value>("{").unwrap_err();
        Err(CoreError::Serialization(err))
    }

    #[tokio::test]
    async fn serialization_failure_drops_interval() {
        let sink = Arc::new(RecordingSink::default());
        let cycle =
            cycle(sink.clone(), FixedHealth(Some(0)), json!({})).with_encoder(broken_encoder);
        cycle.accumulator().record_request(Some(Duration::from_micros(50)));
        cycle.accumulator().record_request(None);

        assert_eq!(cycle.flush().await, FlushOutcome::SerializationFailed);
        // 전송 없이 카운터만 초기화
        assert!(sink.reports().is_empty());
        assert_eq!(cycle.accumulator().peek(), Default::default());

        // 다음 주기는 새 카운터로 다시 시도
        cycle.accumulator().record_request(None);
        assert_eq!(cycle.flush().await, FlushOutcome::SerializationFailed);
        assert_eq!(cycle.accumulator().peek().requests, 0);
    }

    #[test]
    fn flush_outside_async_test() {
        let sink = Arc::new(RecordingSink::default());
        let cycle = cycle(sink.clone(), FixedHealth(Some(1)), json!({ "auth": "t" }));

        let outcome = tokio_test::block_on(cycle.flush());
        assert_eq!(outcome, FlushOutcome::Delivered);
        assert_eq!(sink.reports()[0]["auth"], json!("t"));
    }
}
