//! 대상 창 포커스 감시.
//!
//! 일정 주기로 포커스를 조회해 바뀔 때마다 오케스트레이터 신호 큐에
//! [`OrchestratorSignal::FocusChanged`]를 넣는다. 조회 실패는 포커스 없음으로 본다.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use echo_automation::orchestrator::OrchestratorSignal;
use echo_core::ports::capture::WindowSource;

/// 포커스 감시 루프
pub struct FocusWatcher {
    source: Arc<dyn WindowSource>,
    signals: mpsc::Sender<OrchestratorSignal>,
    interval: Duration,
}

impl FocusWatcher {
    pub fn new(
        source: Arc<dyn WindowSource>,
        signals: mpsc::Sender<OrchestratorSignal>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            signals,
            interval,
        }
    }

    async fn poll_focus(&self) -> bool {
        match self.source.is_focused().await {
            Ok(focused) => focused,
            Err(e) => {
                debug!("포커스 조회 실패, 비활성으로 간주: {e}");
                false
            }
        }
    }

    /// 토큰이 취소되거나 신호 큐가 닫힐 때까지 감시
    pub async fn run(self, shutdown: CancellationToken) {
        info!(interval_ms = self.interval.as_millis() as u64, "포커스 감시 시작");
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last: Option<bool> = None;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }

            let focused = tokio::select! {
                _ = shutdown.cancelled() => break,
                focused = self.poll_focus() => focused,
            };
            if last == Some(focused) {
                continue;
            }
            last = Some(focused);
            debug!(focused, "포커스 변경");

            tokio::select! {
                _ = shutdown.cancelled() => break,
                sent = self.signals.send(OrchestratorSignal::FocusChanged(focused)) => {
                    if sent.is_err() {
                        warn!("신호 큐 닫힘, 포커스 감시 중단");
                        break;
                    }
                }
            }
        }
        info!("포커스 감시 종료");
    }
}
