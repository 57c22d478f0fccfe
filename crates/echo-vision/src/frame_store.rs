//! 프레임 저장소.
//!
//! 단일 생산자가 주기적으로 최신 프레임을 게시한다. `publishing` 게이트가
//! 설정된 동안 [`FrameStore::latest`] 호출자는 대기하고, 게이트가 풀리면
//! 같은 주기에 등록된 대기자가 함께 깨어나 새 프레임을 받는다.
//! 게시된 프레임은 `Arc<Frame>` 불변 스냅샷이므로 읽는 쪽은 락 없이 분석한다.

use std::sync::Arc;
use std::time::Duration;

use echo_core::error::CoreError;
use echo_core::models::frame::Frame;
use echo_core::ports::capture::WindowSource;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
struct PublishState {
    publishing: bool,
    frame: Option<Arc<Frame>>,
    generation: u64,
}

impl PublishState {
    fn is_servable(&self) -> bool {
        !self.publishing && self.frame.is_some()
    }
}

/// 게시 도중 future가 drop되어도 게이트를 해제한다
struct GateGuard<'a> {
    state: &'a watch::Sender<PublishState>,
    armed: bool,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.send_modify(|s| s.publishing = false);
        }
    }
}

/// 최신 캡처 프레임 게시자
pub struct FrameStore {
    source: Arc<dyn WindowSource>,
    state: watch::Sender<PublishState>,
    interval: Duration,
}

impl FrameStore {
    pub fn new(source: Arc<dyn WindowSource>, interval: Duration) -> Self {
        let (state, _) = watch::channel(PublishState::default());
        Self {
            source,
            state,
            interval,
        }
    }

    /// 새 프레임을 캡처하여 현재 프레임을 교체. 캡처 실패 시 이전 프레임 유지.
    ///
    /// 성공 여부를 반환한다.
    pub async fn publish(&self) -> bool {
        self.state.send_modify(|s| s.publishing = true);
        let mut gate = GateGuard {
            state: &self.state,
            armed: true,
        };

        match self.source.capture_frame().await {
            Ok(frame) => {
                let frame = Arc::new(frame);
                let previous = self.swap_frame(frame);
                gate.armed = false;
                // 이전 버퍼는 교체가 끝난 뒤 해제
                drop(previous);
                true
            }
            Err(e) => {
                warn!("프레임 캡처 실패, 이전 프레임 유지: {e}");
                false
            }
        }
    }

    /// 가장 최근에 완전히 게시된 프레임.
    ///
    /// 게시 중이거나 아직 첫 프레임이 없으면 게시가 끝날 때까지 대기한다.
    pub async fn latest(&self) -> Result<Arc<Frame>, CoreError> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(PublishState::is_servable)
            .await
            .map_err(|_| CoreError::Internal("프레임 저장소가 닫힘".to_string()))?;
        state
            .frame
            .clone()
            .ok_or_else(|| CoreError::Internal("게시된 프레임 없음".to_string()))
    }

    /// 프레임 교체와 게이트 해제를 한 번의 알림으로 처리하고 이전 프레임을 돌려준다
    fn swap_frame(&self, frame: Arc<Frame>) -> Option<Arc<Frame>> {
        let mut previous = None;
        self.state.send_modify(|s| {
            previous = s.frame.replace(frame);
            s.generation += 1;
            s.publishing = false;
        });
        previous
    }

    /// 대기 없이 현재 프레임 조회 (게시 중이면 None)
    pub fn try_latest(&self) -> Option<Arc<Frame>> {
        let state = self.state.borrow();
        if state.is_servable() {
            state.frame.clone()
        } else {
            None
        }
    }

    /// 성공한 게시 횟수
    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    /// 고정 주기 캡처 루프. 토큰이 취소되면 종료.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(interval_ms = self.interval.as_millis() as u64, "프레임 캡처 루프 시작");
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        published = self.publish() => {
                            if published {
                                debug!(generation = self.generation(), "프레임 게시");
                            }
                        }
                    }
                }
            }
        }
        info!("프레임 캡처 루프 종료");
    }
}
