//! 리포팅 루프.
//!
//! `Idle → Running → Stopped`. 시작 시 Tokio 태스크 하나를 띄우고,
//! 주기마다 플러시를 실행하며, 매 대기 경계에서 종료 신호를 확인한다.

use monit_core::accumulator::Accumulator;
use monit_core::config::{MonitorOptions, ReportConfig};
use monit_core::error::CoreError;
use monit_core::models::report::CounterSnapshot;
use monit_core::ports::health::HealthProvider;
use monit_core::ports::sink::ReportSink;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::reporter::{FlushOutcome, ReportCycle};

/// 루프 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// 메트릭 리포터
///
/// 호출자는 요청마다 [`Monitor::request`] / [`Monitor::request_with`]를 호출하고,
/// 백그라운드 루프가 주기마다 누산값을 읽고 초기화한 뒤 리포트를 전송한다.
/// `Arc<Monitor>`로 여러 스레드/태스크에서 공유할 수 있다.
pub struct Monitor {
    cycle: Arc<ReportCycle>,
    state: Mutex<LoopState>,
    /// 아직 회수하지 않은 루프 태스크
    task: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
}

impl Monitor {
    /// 해석이 끝난 설정과 주입된 어댑터로 Monitor 생성
    pub fn new(
        config: ReportConfig,
        sink: Arc<dyn ReportSink>,
        health: Arc<dyn HealthProvider>,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            cycle: Arc::new(ReportCycle::new(config, sink, health)),
            state: Mutex::new(LoopState::Idle),
            task: Mutex::new(None),
            shutdown_tx,
        }
    }

    /// 입력 설정을 해석해 Monitor 생성
    ///
    /// 수신처나 주기를 명시값과 환경 변수 어디에서도 찾지 못하면 실패한다.
    pub fn from_options(
        options: MonitorOptions,
        sink: Arc<dyn ReportSink>,
        health: Arc<dyn HealthProvider>,
    ) -> Result<Self, CoreError> {
        Self::from_options_with(options, |key| std::env::var(key).ok(), sink, health)
    }

    /// 환경 변수 대신 주입된 조회 함수를 대체값으로 사용해 Monitor 생성
    pub fn from_options_with<F>(
        options: MonitorOptions,
        lookup: F,
        sink: Arc<dyn ReportSink>,
        health: Arc<dyn HealthProvider>,
    ) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ReportConfig::resolve_with(options, lookup)?;
        Ok(Self::new(config, sink, health))
    }

    /// 리포트 설정
    pub fn config(&self) -> &ReportConfig {
        self.cycle.config()
    }

    /// 누산기 핸들 (Monitor 없이 요청을 기록하려는 호출자용)
    pub fn accumulator(&self) -> Arc<Accumulator> {
        Arc::clone(self.cycle.accumulator())
    }

    /// 요청 1건 기록. 처리 시간은 선택.
    pub fn record_request(&self, duration: Option<Duration>) {
        self.cycle.accumulator().record_request(duration);
    }

    /// 처리 시간 없이 요청 1건 기록
    pub fn request(&self) {
        self.record_request(None);
    }

    /// 처리 시간과 함께 요청 1건 기록
    pub fn request_with(&self, duration: Duration) {
        self.record_request(Some(duration));
    }

    /// 다음 플러시에 보고될 현재 누산값
    pub fn pending(&self) -> CounterSnapshot {
        self.cycle.accumulator().peek()
    }

    /// 백그라운드 리포팅 루프 시작
    ///
    /// 인스턴스당 한 번만 호출할 수 있다. 이미 시작했거나 종료된 경우,
    /// 또는 Tokio 런타임 밖에서 호출한 경우 `InvalidState`를 반환한다.
    pub fn start(&self) -> Result<(), CoreError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| CoreError::InvalidState(format!("Tokio 런타임 없음: {e}")))?;

        let mut state = self.state.lock();
        match *state {
            LoopState::Idle => {}
            LoopState::Running => {
                return Err(CoreError::InvalidState("이미 시작된 Monitor".to_string()));
            }
            LoopState::Stopped => {
                return Err(CoreError::InvalidState(
                    "종료된 Monitor는 다시 시작할 수 없음".to_string(),
                ));
            }
        }

        let cycle = Arc::clone(&self.cycle);
        let shutdown_rx = self.shutdown_tx.subscribe();
        *self.task.lock() = Some(runtime.spawn(run_loop(cycle, shutdown_rx)));
        *state = LoopState::Running;

        info!(
            "리포팅 시작: endpoint={}, interval={}s",
            self.config().endpoint(),
            self.config().interval_secs()
        );
        Ok(())
    }

    /// 이후 주기가 예약되지 않도록 종료 신호 전송
    ///
    /// 진행 중인 전송은 취소하지 않는다. 여러 번 호출해도 첫 호출 이후에는 효과가 없다.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if *state == LoopState::Running {
            self.shutdown_tx.send_replace(true);
            info!("리포팅 종료 신호 발송");
        }
        *state = LoopState::Stopped;
    }

    /// 루프 태스크가 끝날 때까지 대기. 종료 신호는 보내지 않는다.
    ///
    /// 다른 곳에서 [`Monitor::stop`]을 호출하거나 루프가 이미 끝났을 때 반환된다.
    /// 시작 전이거나 다른 호출자가 이미 태스크를 회수했다면 바로 반환한다.
    pub async fn join(&self) {
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("리포팅 루프 비정상 종료: {e}");
            }
        }
    }

    /// 종료 신호를 보내고 루프 태스크가 끝날 때까지 대기
    pub async fn shutdown(&self) {
        self.stop();
        self.join().await;
    }

    /// 루프가 실행 중인지 여부
    pub fn is_running(&self) -> bool {
        *self.state.lock() == LoopState::Running
    }

    /// 주기와 무관하게 플러시 1회 실행
    ///
    /// 누산기는 결과와 무관하게 초기화된다.
    pub async fn flush_now(&self) -> FlushOutcome {
        self.cycle.flush().await
    }
}

/// 리포팅 루프 본체
///
/// 첫 플러시는 시작 후 한 주기 뒤. 종료 신호가 오거나 Monitor가 drop되어
/// 송신 측이 닫히면 루프를 빠져나간다.
async fn run_loop(cycle: Arc<ReportCycle>, mut shutdown_rx: watch::Receiver<bool>) {
    let period = cycle.config().interval();
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let outcome = cycle.flush().await;
                debug!("플러시 완료: {outcome:?}");
            }
        }
    }

    info!("리포팅 루프 종료");
}
