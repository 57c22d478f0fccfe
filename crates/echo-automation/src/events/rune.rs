//! 룬 감지 및 해제.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use echo_core::error::CoreError;
use echo_core::models::event::EventKind;
use echo_core::models::frame::Frame;
use echo_core::models::geometry::Point;
use echo_core::ports::events::{EventChecker, EventHandler};
use echo_vision::analyzers::rune::ARROWS_PER_RUNE;
use echo_vision::analyzers::{MinimapAnalyzer, RuneAnalyzer, ScreenAnalyzer};

use crate::pacing::pause_for;
use crate::player::PlayerController;

/// 화살표 입력 간격
const ARROW_GAP_MS: u64 = 70;

/// 미니맵에 룬이 보이면 걸어가서 화살표를 입력
pub struct RuneResponse {
    player: Arc<PlayerController>,
    minimap: Arc<MinimapAnalyzer>,
    screen: Arc<ScreenAnalyzer>,
    rune: Arc<RuneAnalyzer>,
    /// 마지막으로 감지한 룬 위치 (미니맵 좌표)
    location: Mutex<Option<Point>>,
}

impl RuneResponse {
    pub fn new(
        player: Arc<PlayerController>,
        minimap: Arc<MinimapAnalyzer>,
        screen: Arc<ScreenAnalyzer>,
        rune: Arc<RuneAnalyzer>,
    ) -> Self {
        Self {
            player,
            minimap,
            screen,
            rune,
            location: Mutex::new(None),
        }
    }

    pub fn last_location(&self) -> Option<Point> {
        *self.location.lock()
    }
}

impl EventChecker for RuneResponse {
    fn kind(&self) -> EventKind {
        EventKind::Rune
    }

    fn detect(&self, frame: &Frame) -> Result<Option<EventKind>, CoreError> {
        // 쿨다운 중인 룬은 활성화되지 않음
        if self.screen.rune_on_cooldown(frame) {
            return Ok(None);
        }
        Ok(self.minimap.rune_location(frame).map(|point| {
            *self.location.lock() = Some(point);
            EventKind::Rune
        }))
    }
}

#[async_trait]
impl EventHandler for RuneResponse {
    fn kind(&self) -> EventKind {
        EventKind::Rune
    }

    async fn handle(&self, cancel: CancellationToken) -> Result<(), CoreError> {
        let target = self.last_location().ok_or_else(|| CoreError::NotFound {
            resource_type: "Rune".to_string(),
            id: "minimap".to_string(),
        })?;

        pause_for(&cancel, 1000).await?;
        self.player.release_all().await?;
        self.player.go_to(target, &cancel).await?;
        info!("룬 위치 도착");

        pause_for(&cancel, 200).await?;
        self.player.press(self.player.hotkeys().npc_chat).await?;
        pause_for(&cancel, 2000).await?;

        let frame = self.player.latest_frame(&cancel).await?;
        let arrows = self.rune.read_arrows(&frame);
        let directions: Vec<_> = arrows.iter().map(|a| a.direction).collect();

        if arrows.len() == ARROWS_PER_RUNE {
            info!(?directions, "룬 화살표 판독 성공");
            for arrow in &arrows {
                self.player.press(arrow.direction.to_key()).await?;
                pause_for(&cancel, ARROW_GAP_MS).await?;
            }
            self.rune.reset_attempts();
        } else {
            let attempts = self.rune.record_failure();
            warn!(?directions, attempts, "룬 화살표 판독 실패");
            // 주변 몹 정리
            self.player.press(self.player.hotkeys().attack).await?;
        }

        pause_for(&cancel, 1000).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::test_support::{rig, rig_with_screen};
    use echo_core::config::{HotkeySettings, RuneConfig};
    use echo_core::models::frame::{Rgb, Template};
    use echo_core::models::input::{Key, PressKind};
    use echo_vision::analyzers::minimap::{PLAYER_MARKER, RUNE_MARKER};

    fn block(frame: &mut Frame, x0: u32, y0: u32, color: Rgb) {
        for y in y0..y0 + 3 {
            for x in x0..x0 + 3 {
                frame.set_pixel(x, y, color);
            }
        }
    }

    fn minimap_frame() -> Frame {
        let mut frame = Frame::filled(600, 300, Rgb::new(30, 30, 30));
        block(&mut frame, 60, 80, RUNE_MARKER);
        block(&mut frame, 60, 84, PLAYER_MARKER);
        frame
    }

    #[tokio::test]
    async fn detects_rune_and_remembers_location() {
        let rig = rig(minimap_frame()).await;
        let rune = Arc::new(RuneAnalyzer::new(&RuneConfig::default()));
        let response = RuneResponse::new(rig.player.clone(), rig.minimap.clone(), rig.screen.clone(), rune);

        let frame = rig.frames.latest().await.unwrap();
        assert_eq!(response.detect(&frame).unwrap(), Some(EventKind::Rune));
        assert_eq!(response.last_location(), Some(Point::new(61, 81)));
    }

    #[tokio::test]
    async fn rune_on_cooldown_is_not_detected() {
        let icon = Template::solid(8, 8, Rgb::new(250, 120, 20));
        let mut frame = minimap_frame();
        frame.paste(&icon, Point::new(560, 10));
        let screen = ScreenAnalyzer::new(Some(icon), None);
        let rig = rig_with_screen(frame, screen).await;
        let rune = Arc::new(RuneAnalyzer::new(&RuneConfig::default()));
        let response = RuneResponse::new(rig.player.clone(), rig.minimap.clone(), rig.screen.clone(), rune);

        let frame = rig.frames.latest().await.unwrap();
        assert_eq!(response.detect(&frame).unwrap(), None);
        assert_eq!(response.last_location(), None);
    }

    #[tokio::test]
    async fn no_rune_marker_no_detection() {
        let rig = rig(Frame::filled(300, 300, Rgb::BLACK)).await;
        let rune = Arc::new(RuneAnalyzer::new(&RuneConfig::default()));
        let response = RuneResponse::new(rig.player.clone(), rig.minimap.clone(), rig.screen.clone(), rune);
        let frame = rig.frames.latest().await.unwrap();
        assert_eq!(response.detect(&frame).unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_arrows_count_as_failure() {
        let rig = rig(minimap_frame()).await;
        let rune = Arc::new(RuneAnalyzer::new(&RuneConfig::default()));
        let response = RuneResponse::new(
            rig.player.clone(),
            rig.minimap.clone(),
            rig.screen.clone(),
            rune.clone(),
        );
        let frame = rig.frames.latest().await.unwrap();
        response.detect(&frame).unwrap();

        response.handle(CancellationToken::new()).await.unwrap();

        assert_eq!(rune.attempts(), 1);
        let hotkeys = HotkeySettings::default();
        let keys = rig.driver.key_history();
        assert_eq!(
            keys,
            vec![
                (hotkeys.npc_chat, PressKind::Press),
                (hotkeys.attack, PressKind::Press),
            ]
        );
        assert!(!keys.iter().any(|(k, _)| *k == Key::Up));
    }

    #[tokio::test]
    async fn handle_without_detection_fails() {
        let rig = rig(minimap_frame()).await;
        let rune = Arc::new(RuneAnalyzer::new(&RuneConfig::default()));
        let response = RuneResponse::new(rig.player.clone(), rig.minimap.clone(), rig.screen.clone(), rune);
        let result = response.handle(CancellationToken::new()).await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }
}
