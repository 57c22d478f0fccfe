//! 라이프사이클 관리.
//!
//! 루트 취소 토큰 하나로 모든 백그라운드 루프의 종료를 묶는다.
//! OS 시그널(SIGINT, SIGTERM / Windows는 Ctrl+C)을 받으면 루트 토큰을 취소한다.

use tokio_util::sync::CancellationToken;
use tracing::info;

/// 라이프사이클 관리자
pub struct LifecycleManager {
    root: CancellationToken,
}

impl LifecycleManager {
    /// 새 라이프사이클 관리자 생성
    pub fn new() -> Self {
        Self {
            root: CancellationToken::new(),
        }
    }

    /// 루트 토큰의 자식 토큰. 루트가 취소되면 함께 취소된다.
    pub fn child_token(&self) -> CancellationToken {
        self.root.child_token()
    }

    /// 종료가 시작되었는지
    pub fn is_shutting_down(&self) -> bool {
        self.root.is_cancelled()
    }

    /// 종료 신호 발송
    pub fn shutdown(&self) {
        if !self.root.is_cancelled() {
            info!("종료 신호 발송");
        }
        self.root.cancel();
    }

    /// OS 시그널 또는 프로그램 내부 종료 요청 대기
    pub async fn wait_for_signal(&self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigint = signal(SignalKind::interrupt())?;
            let mut sigterm = signal(SignalKind::terminate())?;

            tokio::select! {
                _ = sigint.recv() => info!("SIGINT 수신"),
                _ = sigterm.recv() => info!("SIGTERM 수신"),
                _ = self.root.cancelled() => info!("내부 종료 요청 수신"),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result?;
                    info!("Ctrl+C 수신");
                }
                _ = self.root.cancelled() => info!("내부 종료 요청 수신"),
            }
        }

        self.shutdown();
        Ok(())
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}
