//! 룬 연속 실패 시 채널을 바꿨다가 돌아와 룬을 초기화.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use echo_core::error::CoreError;
use echo_core::models::event::EventKind;
use echo_core::models::frame::Frame;
use echo_core::ports::events::{EventChecker, EventHandler};
use echo_vision::analyzers::RuneAnalyzer;

use crate::pacing::pause_for;
use crate::player::PlayerController;

/// 채널 변경 재시도 상한
const MAX_CHANNEL_RETRIES: u32 = 10;

/// 룬 실패 대응
pub struct RuneFailureResponse {
    player: Arc<PlayerController>,
    rune: Arc<RuneAnalyzer>,
}

impl RuneFailureResponse {
    pub fn new(player: Arc<PlayerController>, rune: Arc<RuneAnalyzer>) -> Self {
        Self { player, rune }
    }

    /// 첫 시도가 실패하면 호흡/공격 없이 재시도
    async fn change_with_retries(
        &self,
        up: bool,
        first: (bool, bool),
        cancel: &CancellationToken,
    ) -> Result<bool, CoreError> {
        let (pre_wait_breath, attack_if_fail) = first;
        if self
            .player
            .change_channel(up, pre_wait_breath, attack_if_fail, cancel)
            .await?
        {
            return Ok(true);
        }
        for attempt in 1..=MAX_CHANNEL_RETRIES {
            self.player.release_all().await?;
            if self.player.change_channel(up, false, false, cancel).await? {
                return Ok(true);
            }
            warn!(up, attempt, "채널 변경 재시도 실패");
        }
        Ok(false)
    }
}

impl EventChecker for RuneFailureResponse {
    fn kind(&self) -> EventKind {
        EventKind::RuneFailure
    }

    fn detect(&self, _frame: &Frame) -> Result<Option<EventKind>, CoreError> {
        Ok(self
            .rune
            .attempts_exhausted()
            .then_some(EventKind::RuneFailure))
    }
}

#[async_trait]
impl EventHandler for RuneFailureResponse {
    fn kind(&self) -> EventKind {
        EventKind::RuneFailure
    }

    async fn handle(&self, cancel: CancellationToken) -> Result<(), CoreError> {
        info!(attempts = self.rune.attempts(), "룬 연속 실패, 채널 변경");
        self.player.release_all().await?;

        // 날아다니는 몹이 있을 수 있으므로 첫 시도는 공격 포함
        if !self.change_with_retries(true, (true, true), &cancel).await? {
            warn!("다음 채널로 이동하지 못함");
        }
        pause_for(&cancel, 6000).await?;

        if !self.change_with_retries(false, (false, false), &cancel).await? {
            warn!("원래 채널로 돌아가지 못함");
        }
        pause_for(&cancel, 3000).await?;

        self.rune.reset_attempts();
        info!("채널 초기화 완료");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::test_support::rig;
    use echo_core::config::{HotkeySettings, RuneConfig};
    use echo_core::models::frame::Rgb;
    use echo_core::models::input::Key;

    #[tokio::test]
    async fn detects_once_attempts_are_exhausted() {
        let rig = rig(Frame::filled(50, 50, Rgb::WHITE)).await;
        let rune = Arc::new(RuneAnalyzer::new(&RuneConfig::default()));
        let response = RuneFailureResponse::new(rig.player.clone(), rune.clone());
        let frame = rig.frames.latest().await.unwrap();

        rune.record_failure();
        rune.record_failure();
        assert_eq!(response.detect(&frame).unwrap(), None);
        rune.record_failure();
        assert_eq!(response.detect(&frame).unwrap(), Some(EventKind::RuneFailure));
    }

    #[tokio::test(start_paused = true)]
    async fn changes_up_then_back_and_resets() {
        // 검은 화면이면 채널 변경이 즉시 확인됨
        let rig = rig(Frame::filled(50, 50, Rgb::BLACK)).await;
        let rune = Arc::new(RuneAnalyzer::new(&RuneConfig::default()));
        for _ in 0..3 {
            rune.record_failure();
        }
        let response = RuneFailureResponse::new(rig.player.clone(), rune.clone());

        response.handle(CancellationToken::new()).await.unwrap();
        assert_eq!(rune.attempts(), 0);

        let menu = HotkeySettings::default().menu;
        let keys: Vec<Key> = rig.driver.key_history().iter().map(|(k, _)| *k).collect();
        // 위 채널 (Right) → 아래 채널 (Left)
        assert_eq!(
            keys,
            vec![
                Key::Right, menu, Key::Right, Key::Return,
                Key::Right, menu, Key::Left, Key::Return,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_retry_limit() {
        let rig = rig(Frame::filled(50, 50, Rgb::WHITE)).await;
        let rune = Arc::new(RuneAnalyzer::new(&RuneConfig::default()));
        let response = RuneFailureResponse::new(rig.player.clone(), rune.clone());
        let cancel = CancellationToken::new();

        assert!(!response.change_with_retries(false, (false, false), &cancel).await.unwrap());
        let menu = HotkeySettings::default().menu;
        let attempts = rig
            .driver
            .key_history()
            .iter()
            .filter(|(k, _)| *k == menu)
            .count();
        assert_eq!(attempts, 1 + MAX_CHANNEL_RETRIES as usize);
    }
}
