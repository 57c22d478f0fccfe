//! 이벤트 오케스트레이터.
//!
//! 고정 주기로 최신 프레임에 모든 체커를 돌리고, 가장 높은 우선순위의 감지에 대해
//! 짝지어진 핸들러를 실행한다. 동시에 실행되는 핸들러는 최대 하나이며,
//! 더 높은 우선순위가 감지되면 현재 핸들러를 취소하고 **완전히 끝날 때까지 기다린 뒤**
//! 새 핸들러를 시작한다.
//!
//! 취소 범위는 두 단계다.
//! - 오케스트레이터 범위: `stop()`에서 취소, 폴링 루프와 핸들러 모두 종료
//! - 핸들러 범위: 활성화마다 오케스트레이터 범위의 자식으로 새로 만든다
//!
//! 오케스트레이터 상태(활성 종류, 포커스)는 폴링 루프만 변경한다.
//! 외부 신호(포커스 변경)는 mpsc 큐로 받아 같은 루프 안에서 처리한다.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use echo_core::error::CoreError;
use echo_core::models::event::{EventKind, HandlerOutcome};
use echo_core::models::frame::Frame;
use echo_core::ports::events::{EventChecker, EventHandler};
use echo_core::ports::macro_control::MacroControl;
use echo_vision::frame_store::FrameStore;

/// 신호 큐 용량
const SIGNAL_CAPACITY: usize = 32;

/// 폴링 루프로 전달되는 외부 신호
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorSignal {
    /// 대상 창 포커스 변경
    FocusChanged(bool),
}

/// 루프가 멈춰 있는 동안 보관하는 상태 (재시작 시 이어받음)
struct IdleState {
    signals: mpsc::Receiver<OrchestratorSignal>,
    focused: bool,
}

struct RunningLoop {
    shutdown: CancellationToken,
    task: JoinHandle<IdleState>,
}

/// 우선순위 기반 이벤트 오케스트레이터
pub struct EventOrchestrator {
    frames: Arc<FrameStore>,
    macro_control: Arc<dyn MacroControl>,
    poll_interval: Duration,
    checkers: Vec<Arc<dyn EventChecker>>,
    handlers: HashMap<EventKind, Arc<dyn EventHandler>>,
    status: Arc<watch::Sender<EventKind>>,
    signal_tx: mpsc::Sender<OrchestratorSignal>,
    idle: Option<IdleState>,
    running: Option<RunningLoop>,
}

impl EventOrchestrator {
    pub fn new(
        frames: Arc<FrameStore>,
        macro_control: Arc<dyn MacroControl>,
        poll_interval: Duration,
    ) -> Self {
        let (status, _) = watch::channel(EventKind::None);
        let (signal_tx, signals) = mpsc::channel(SIGNAL_CAPACITY);
        Self {
            frames,
            macro_control,
            poll_interval,
            checkers: Vec::new(),
            handlers: HashMap::new(),
            status: Arc::new(status),
            signal_tx,
            idle: Some(IdleState {
                signals,
                focused: true,
            }),
            running: None,
        }
    }

    /// 체커/핸들러를 함께 구현한 대응 등록
    pub fn register<T>(&mut self, response: Arc<T>) -> &mut Self
    where
        T: EventChecker + EventHandler + 'static,
    {
        self.add_checker(response.clone());
        self.add_handler(response);
        self
    }

    pub fn add_checker(&mut self, checker: Arc<dyn EventChecker>) -> &mut Self {
        debug!(kind = %checker.kind(), "체커 등록");
        self.checkers.push(checker);
        self
    }

    /// 같은 종류의 핸들러가 이미 있으면 교체
    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) -> &mut Self {
        let kind = handler.kind();
        if self.handlers.insert(kind, handler).is_some() {
            warn!(%kind, "핸들러 교체");
        }
        self
    }

    /// 외부 신호 송신자 (포커스 감시 등)
    pub fn signals(&self) -> mpsc::Sender<OrchestratorSignal> {
        self.signal_tx.clone()
    }

    /// 활성 종류 변경 구독
    pub fn subscribe(&self) -> watch::Receiver<EventKind> {
        self.status.subscribe()
    }

    /// 현재 실행 중인 핸들러 종류 (없으면 `EventKind::None`)
    pub fn active_kind(&self) -> EventKind {
        *self.status.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    /// 폴링 루프 시작. 이미 실행 중이면 아무것도 하지 않는다.
    pub fn start(&mut self) {
        if self.running.is_some() {
            debug!("오케스트레이터 이미 실행 중");
            return;
        }
        let idle = match self.idle.take() {
            Some(idle) => idle,
            None => self.fresh_signal_queue(),
        };

        let shutdown = CancellationToken::new();
        let poll_loop = PollLoop {
            checkers: self.checkers.clone(),
            handlers: self.handlers.clone(),
            frames: self.frames.clone(),
            macro_control: self.macro_control.clone(),
            status: self.status.clone(),
            signals: idle.signals,
            focused: idle.focused,
            shutdown: shutdown.clone(),
            poll_interval: self.poll_interval,
            active: None,
        };
        info!(
            checkers = self.checkers.len(),
            handlers = self.handlers.len(),
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "오케스트레이터 시작"
        );
        let task = tokio::spawn(poll_loop.run());
        self.running = Some(RunningLoop { shutdown, task });
    }

    /// 폴링 루프와 실행 중인 핸들러를 취소하고, 둘 다 끝날 때까지 대기
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        info!("오케스트레이터 종료 요청");
        running.shutdown.cancel();
        match running.task.await {
            Ok(idle) => self.idle = Some(idle),
            Err(e) => error!("오케스트레이터 루프 비정상 종료: {e}"),
        }
        info!("오케스트레이터 종료 완료");
    }

    /// 루프가 비정상 종료되어 수신자를 잃었을 때 큐를 새로 만든다
    fn fresh_signal_queue(&mut self) -> IdleState {
        warn!("신호 큐 재생성, 이전 송신자는 무효");
        let (signal_tx, signals) = mpsc::channel(SIGNAL_CAPACITY);
        self.signal_tx = signal_tx;
        IdleState {
            signals,
            focused: true,
        }
    }
}

// ============================================================
// 폴링 루프
// ============================================================

type Joined = Result<Result<(), CoreError>, JoinError>;

struct ActiveHandler {
    kind: EventKind,
    cancel: CancellationToken,
    task: JoinHandle<Result<(), CoreError>>,
}

/// 오케스트레이터 상태의 단일 소유자
struct PollLoop {
    checkers: Vec<Arc<dyn EventChecker>>,
    handlers: HashMap<EventKind, Arc<dyn EventHandler>>,
    frames: Arc<FrameStore>,
    macro_control: Arc<dyn MacroControl>,
    status: Arc<watch::Sender<EventKind>>,
    signals: mpsc::Receiver<OrchestratorSignal>,
    focused: bool,
    shutdown: CancellationToken,
    poll_interval: Duration,
    active: Option<ActiveHandler>,
}

impl PollLoop {
    async fn run(mut self) -> IdleState {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                (kind, joined) = wait_active(&mut self.active) => {
                    self.active = None;
                    self.finish(kind, joined);
                }
                Some(signal) = self.signals.recv() => self.apply_signal(signal),
                _ = interval.tick() => self.poll_once().await,
            }
        }

        self.drain().await;
        debug!("폴링 루프 종료");
        IdleState {
            signals: self.signals,
            focused: self.focused,
        }
    }

    fn active_kind(&self) -> EventKind {
        self.active.as_ref().map_or(EventKind::None, |a| a.kind)
    }

    async fn poll_once(&mut self) {
        let frame = tokio::select! {
            _ = self.shutdown.cancelled() => return,
            frame = self.frames.latest() => match frame {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("프레임 조회 실패: {e}");
                    return;
                }
            },
        };

        let active = self.active_kind();
        let Some(winner) = self.detect_highest(frame, active).await else {
            return;
        };
        if winner <= active {
            debug!(%winner, %active, "우선순위가 낮아 무시");
            return;
        }
        if !self.handlers.contains_key(&winner) {
            warn!(%winner, "등록된 핸들러 없음");
            return;
        }

        self.preempt().await;
        self.activate(winner);
    }

    /// 활성 종류를 제외한 체커를 돌려 가장 높은 감지를 고른다.
    ///
    /// 체커는 픽셀 단위 분석이라 블로킹 스레드에서 실행한다.
    async fn detect_highest(&self, frame: Arc<Frame>, active: EventKind) -> Option<EventKind> {
        let checkers: Vec<Arc<dyn EventChecker>> = self
            .checkers
            .iter()
            .filter(|checker| checker.kind() != active)
            .cloned()
            .collect();
        if checkers.is_empty() {
            return None;
        }

        let pass = tokio::task::spawn_blocking(move || {
            checkers
                .iter()
                .filter_map(|checker| run_checker(checker.as_ref(), &frame))
                .filter(|kind| !kind.is_none())
                .max()
        });
        tokio::select! {
            _ = self.shutdown.cancelled() => None,
            joined = pass => match joined {
                Ok(winner) => winner,
                Err(e) => {
                    warn!("체커 실행 실패: {e}");
                    None
                }
            },
        }
    }

    /// 실행 중인 핸들러를 취소하고 끝날 때까지 대기
    async fn preempt(&mut self) {
        self.cancel_active("핸들러 선점").await;
    }

    async fn cancel_active(&mut self, reason: &str) {
        let Some(active) = self.active.take() else {
            return;
        };
        info!(kind = %active.kind, "{reason}");
        active.cancel.cancel();
        let joined = active.task.await;
        self.finish(active.kind, joined);
    }

    fn activate(&mut self, kind: EventKind) {
        let Some(handler) = self.handlers.get(&kind).cloned() else {
            return;
        };
        self.macro_control.pause();

        let cancel = self.shutdown.child_token();
        let scope = cancel.clone();
        let task = tokio::spawn(async move { handler.handle(scope).await });
        self.active = Some(ActiveHandler { kind, cancel, task });
        self.status.send_replace(kind);
        info!(%kind, "핸들러 시작");
    }

    /// 핸들러 종료 처리 (정상/취소/실패 공통)
    fn finish(&mut self, kind: EventKind, joined: Joined) {
        log_outcome(kind, outcome_of(joined));
        self.status.send_replace(EventKind::None);

        if self.focused {
            self.macro_control.resume();
        } else {
            info!(%kind, "창 포커스 없음, 포커스 복귀 시 매크로 재개");
        }
    }

    fn apply_signal(&mut self, signal: OrchestratorSignal) {
        match signal {
            OrchestratorSignal::FocusChanged(focused) => {
                if focused == self.focused {
                    return;
                }
                self.focused = focused;
                if !focused {
                    info!("창 포커스 잃음, 매크로 일시정지");
                    self.macro_control.pause();
                } else if self.active.is_none() {
                    info!("창 포커스 복귀, 매크로 재개");
                    self.macro_control.resume();
                } else {
                    debug!("창 포커스 복귀, 핸들러 종료 후 재개");
                }
            }
        }
    }

    /// 종료 시 실행 중인 핸들러가 끝날 때까지 대기. 완료 처리(재개 포함)는 선점과 같다.
    async fn drain(&mut self) {
        self.cancel_active("종료로 핸들러 취소").await;
    }
}

/// 활성 핸들러가 끝나면 완료, 없으면 영원히 대기
async fn wait_active(active: &mut Option<ActiveHandler>) -> (EventKind, Joined) {
    match active {
        Some(active) => {
            let joined = (&mut active.task).await;
            (active.kind, joined)
        }
        None => std::future::pending().await,
    }
}

/// 체커 에러/패닉은 감지 없음으로 처리
fn run_checker(checker: &dyn EventChecker, frame: &Frame) -> Option<EventKind> {
    match catch_unwind(AssertUnwindSafe(|| checker.detect(frame))) {
        Ok(Ok(detected)) => detected,
        Ok(Err(e)) => {
            warn!(kind = %checker.kind(), "체커 실패: {e}");
            None
        }
        Err(_) => {
            error!(kind = %checker.kind(), "체커 패닉");
            None
        }
    }
}

fn outcome_of(joined: Joined) -> HandlerOutcome {
    match joined {
        Ok(Ok(())) => HandlerOutcome::Completed,
        Ok(Err(CoreError::Cancelled)) => HandlerOutcome::Cancelled,
        Ok(Err(e)) => HandlerOutcome::Failed(e.to_string()),
        Err(e) if e.is_cancelled() => HandlerOutcome::Cancelled,
        Err(e) => HandlerOutcome::Failed(format!("핸들러 패닉: {e}")),
    }
}

fn log_outcome(kind: EventKind, outcome: HandlerOutcome) {
    match outcome {
        HandlerOutcome::Completed => info!(%kind, "핸들러 완료"),
        HandlerOutcome::Cancelled => info!(%kind, "핸들러 취소됨"),
        HandlerOutcome::Failed(reason) => error!(%kind, "핸들러 실패: {reason}"),
    }
}
