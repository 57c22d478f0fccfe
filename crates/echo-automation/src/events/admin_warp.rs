//! 관리자 워프 감지 시 알림 후 채팅으로 반응.

use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use echo_core::error::CoreError;
use echo_core::models::event::EventKind;
use echo_core::models::frame::Frame;
use echo_core::ports::events::{EventChecker, EventHandler};
use echo_core::ports::notifier::AlertNotifier;
use echo_vision::analyzers::ScreenAnalyzer;

use crate::pacing::pause_for;
use crate::player::PlayerController;

/// 채팅 응답 후보
pub const REPLIES: [&str; 4] = ["wtf", "uhhh", "hello", "huh"];

/// 관리자 워프 대응
pub struct AdminWarpResponse {
    player: Arc<PlayerController>,
    screen: Arc<ScreenAnalyzer>,
    notifier: Option<Arc<dyn AlertNotifier>>,
}

impl AdminWarpResponse {
    pub fn new(
        player: Arc<PlayerController>,
        screen: Arc<ScreenAnalyzer>,
        notifier: Option<Arc<dyn AlertNotifier>>,
    ) -> Self {
        Self {
            player,
            screen,
            notifier,
        }
    }

    /// 알림은 결과를 기다리지 않는다
    fn alert(&self) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };
        let message = format!(
            "관리자 워프 감지 @ {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        tokio::spawn(async move {
            if let Err(e) = notifier.send_alert(&message).await {
                warn!("관리자 워프 알림 실패: {e}");
            }
        });
    }
}

impl EventChecker for AdminWarpResponse {
    fn kind(&self) -> EventKind {
        EventKind::AdminWarp
    }

    fn detect(&self, frame: &Frame) -> Result<Option<EventKind>, CoreError> {
        Ok(self
            .screen
            .is_admin_warp_flash(frame)
            .then_some(EventKind::AdminWarp))
    }
}

#[async_trait]
impl EventHandler for AdminWarpResponse {
    fn kind(&self) -> EventKind {
        EventKind::AdminWarp
    }

    async fn handle(&self, cancel: CancellationToken) -> Result<(), CoreError> {
        warn!("관리자 워프 감지");
        self.alert();
        self.player.release_all().await?;
        pause_for(&cancel, 1500).await?;

        let reply = REPLIES.choose(&mut rand::rng()).copied().unwrap_or("huh");
        debug!(reply, "채팅 응답");
        self.player.send_message(reply, &cancel).await?;
        pause_for(&cancel, 4000).await
    }
}
