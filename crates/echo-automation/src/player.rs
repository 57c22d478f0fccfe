//! 플레이어 동작 (미니맵 이동, 채널 변경, 채팅, 월드맵 이동).
//!
//! 핸들러들이 공유하는 고수준 입력 동작이다. 모든 대기는 취소 토큰을 관찰하며,
//! 취소되면 [`CoreError::Cancelled`]로 즉시 빠져나온다.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use echo_core::config::HotkeySettings;
use echo_core::error::CoreError;
use echo_core::models::frame::{Frame, Template};
use echo_core::models::geometry::Point;
use echo_core::models::input::{Key, MouseButton, PressKind};
use echo_core::ports::input_driver::InputDriver;
use echo_vision::analyzers::{MinimapAnalyzer, ScreenAnalyzer};
use echo_vision::frame_store::FrameStore;
use echo_vision::matching::find_template;

use crate::pacing::{ensure_active, pause_for};

// ============================================================
// 이동 상수
// ============================================================

/// 이 거리 이하의 x 차이는 도착으로 본다
const X_ARRIVAL: i32 = 5;
/// 이 거리를 넘는 x 차이는 더블 점프로 이동
const X_DOUBLE_JUMP: i32 = 30;
/// 이 거리 미만의 y 차이는 도착으로 본다
const Y_ARRIVAL: i32 = 10;
/// 이 높이를 넘으면 로프 리프트
const Y_ROPE_LIFT: i32 = 30;
/// 이 높이를 넘으면 윗점프
const Y_UP_JUMP: i32 = 5;
const RECHECK_MS: u64 = 100;
/// 점프/낙하 후 착지 대기
const VERTICAL_SETTLE_MS: u64 = 500;
/// 같은 위치가 이 횟수만큼 연속되면 끼임으로 판단
const STUCK_SAMPLES: usize = 5;

// ============================================================
// 채널 변경 상수
// ============================================================

const KEYSTROKE_MS: u64 = 150;
const CHANNEL_CHECK_FOR_MS: u64 = 800;
const CHANNEL_CHECK_EVERY_MS: u64 = 200;
/// 채널 변경 재시도 전 호흡 대기
const BREATH_MS: u64 = 10_000;
const ATTACK_ON_FAIL_COUNT: usize = 10;

/// 월드맵 목적지 템플릿 허용 오차
const WORLD_MAP_TOLERANCE: f64 = 0.1;

/// 핸들러가 공유하는 플레이어 동작 모음
pub struct PlayerController {
    input: Arc<dyn InputDriver>,
    frames: Arc<FrameStore>,
    minimap: Arc<MinimapAnalyzer>,
    screen: Arc<ScreenAnalyzer>,
    hotkeys: HotkeySettings,
}

impl PlayerController {
    pub fn new(
        input: Arc<dyn InputDriver>,
        frames: Arc<FrameStore>,
        minimap: Arc<MinimapAnalyzer>,
        screen: Arc<ScreenAnalyzer>,
        hotkeys: HotkeySettings,
    ) -> Self {
        Self {
            input,
            frames,
            minimap,
            screen,
            hotkeys,
        }
    }

    pub fn input(&self) -> &Arc<dyn InputDriver> {
        &self.input
    }

    pub fn hotkeys(&self) -> &HotkeySettings {
        &self.hotkeys
    }

    /// 최신 프레임. 첫 프레임을 기다리는 동안에도 취소를 관찰한다.
    pub async fn latest_frame(&self, cancel: &CancellationToken) -> Result<Arc<Frame>, CoreError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(CoreError::Cancelled),
            frame = self.frames.latest() => frame,
        }
    }

    pub async fn press(&self, key: Key) -> Result<(), CoreError> {
        self.input.press(key).await
    }

    async fn key(&self, key: Key, kind: PressKind) -> Result<(), CoreError> {
        self.input.send_key(key, kind).await
    }

    /// 눌린 키를 모두 놓는다
    pub async fn release_all(&self) -> Result<(), CoreError> {
        let released = self.input.release_all_pressed().await?;
        if !released.is_empty() {
            debug!(?released, "눌린 키 해제");
        }
        Ok(())
    }

    // ============================================================
    // 미니맵 이동
    // ============================================================

    /// 미니맵 좌표 `target`까지 걸어서 이동.
    ///
    /// 가로를 먼저 맞춘 뒤 세로를 맞춘다. 도착하면 눌린 키를 모두 놓는다.
    pub async fn go_to(&self, target: Point, cancel: &CancellationToken) -> Result<(), CoreError> {
        info!(x = target.x, y = target.y, "미니맵 이동 시작");
        let mut recent: VecDeque<Point> = VecDeque::with_capacity(STUCK_SAMPLES);

        loop {
            ensure_active(cancel)?;
            let frame = self.latest_frame(cancel).await?;
            let Some(player) = self.minimap.player_location(&frame) else {
                warn!("미니맵에서 플레이어를 찾을 수 없음");
                pause_for(cancel, RECHECK_MS).await?;
                continue;
            };

            let dx = target.x - player.x;
            let dy = target.y - player.y;

            if dx.abs() > X_ARRIVAL {
                self.walk_toward(dx).await?;
            } else {
                self.release_all().await?;
                if dy.abs() < Y_ARRIVAL {
                    break;
                }
                self.climb_or_drop(dy, cancel).await?;
                pause_for(cancel, VERTICAL_SETTLE_MS).await?;
            }

            recent.push_back(player);
            if recent.len() >= STUCK_SAMPLES {
                if recent.iter().all(|p| *p == player) {
                    self.unstick(cancel).await?;
                }
                recent.clear();
            }

            pause_for(cancel, RECHECK_MS).await?;
        }

        self.release_all().await?;
        info!(x = target.x, y = target.y, "미니맵 이동 완료");
        Ok(())
    }

    /// 목표 방향 화살표를 누른 채 유지. 멀면 더블 점프.
    async fn walk_toward(&self, dx: i32) -> Result<(), CoreError> {
        self.key(Key::Down, PressKind::Up).await?;
        let (hold, let_go) = if dx > 0 {
            (Key::Right, Key::Left)
        } else {
            (Key::Left, Key::Right)
        };
        self.key(let_go, PressKind::Up).await?;
        self.key(hold, PressKind::Down).await?;
        if dx.abs() > X_DOUBLE_JUMP {
            self.press(self.hotkeys.jump).await?;
            self.press(self.hotkeys.jump).await?;
        }
        Ok(())
    }

    /// `dy > 0`이면 목표가 아래, `dy < 0`이면 위
    async fn climb_or_drop(&self, dy: i32, cancel: &CancellationToken) -> Result<(), CoreError> {
        if dy > 0 {
            self.key(Key::Down, PressKind::Down).await?;
            return self.press(self.hotkeys.jump).await;
        }

        let height = -dy;
        if height > Y_ROPE_LIFT {
            self.release_all().await?;
            self.up_jump(cancel).await?;
            self.press(self.hotkeys.rope_lift).await
        } else if height > Y_UP_JUMP {
            self.release_all().await?;
            pause_for(cancel, 78).await?;
            self.up_jump(cancel).await
        } else {
            self.press(Key::Up).await?;
            self.press(self.hotkeys.jump).await
        }
    }

    /// 점프 → 위 + 점프 (윗점프)
    async fn up_jump(&self, cancel: &CancellationToken) -> Result<(), CoreError> {
        let jump = self.hotkeys.jump;
        self.key(jump, PressKind::Down).await?;
        pause_for(cancel, 78).await?;
        self.key(jump, PressKind::Up).await?;
        pause_for(cancel, 38).await?;
        self.key(Key::Up, PressKind::Down).await?;
        pause_for(cancel, 61).await?;
        self.key(jump, PressKind::Down).await?;
        pause_for(cancel, 136).await?;
        self.key(jump, PressKind::Up).await?;
        pause_for(cancel, 27).await?;
        self.key(Key::Up, PressKind::Up).await
    }

    async fn unstick(&self, cancel: &CancellationToken) -> Result<(), CoreError> {
        debug!("같은 위치 반복, 끼임 해제 시도");
        self.key(Key::Right, PressKind::Down).await?;
        pause_for(cancel, 30).await?;
        self.press(self.hotkeys.jump).await?;
        pause_for(cancel, 30).await?;
        self.key(Key::Right, PressKind::Up).await
    }

    // ============================================================
    // 채널 변경
    // ============================================================

    /// 메뉴로 채널 변경을 시도하고, 전환 화면이 보이면 `true`.
    ///
    /// * `up` - 다음 채널(true) / 이전 채널(false)
    /// * `pre_wait_breath` - 시도 전에 호흡 대기
    /// * `attack_if_fail` - 실패 시 공격 10회 후 호흡 대기
    pub async fn change_channel(
        &self,
        up: bool,
        pre_wait_breath: bool,
        attack_if_fail: bool,
        cancel: &CancellationToken,
    ) -> Result<bool, CoreError> {
        info!(up, pre_wait_breath, attack_if_fail, "채널 변경 시도");
        self.release_all().await?;
        pause_for(cancel, 500).await?;
        // 열린 채팅창 닫기용
        self.press(Key::Right).await?;
        if pre_wait_breath {
            pause_for(cancel, BREATH_MS).await?;
        }

        self.press(self.hotkeys.menu).await?;
        pause_for(cancel, KEYSTROKE_MS).await?;
        self.press(if up { Key::Right } else { Key::Left }).await?;
        pause_for(cancel, KEYSTROKE_MS).await?;
        self.press(Key::Return).await?;
        pause_for(cancel, KEYSTROKE_MS).await?;

        let mut waited = 0;
        while waited < CHANNEL_CHECK_FOR_MS {
            let frame = self.latest_frame(cancel).await?;
            if self.screen.is_transition_flash(&frame) {
                info!("채널 변경 확인");
                return Ok(true);
            }
            pause_for(cancel, CHANNEL_CHECK_EVERY_MS).await?;
            waited += CHANNEL_CHECK_EVERY_MS;
        }

        if attack_if_fail {
            for _ in 0..ATTACK_ON_FAIL_COUNT {
                self.press(self.hotkeys.attack).await?;
                pause_for(cancel, 500).await?;
            }
            pause_for(cancel, BREATH_MS).await?;
        }
        debug!("채널 변경 미확인");
        Ok(false)
    }

    // ============================================================
    // 채팅 / 월드맵
    // ============================================================

    /// 채팅창에 메시지 입력. a-z와 공백 외 문자는 건너뛴다.
    pub async fn send_message(&self, text: &str, cancel: &CancellationToken) -> Result<(), CoreError> {
        self.press(Key::Return).await?;
        pause_for(cancel, 500).await?;
        for key in text.chars().filter_map(Key::from_chat_char) {
            self.press(key).await?;
            pause_for(cancel, 10).await?;
        }
        pause_for(cancel, 500).await?;
        self.press(Key::Return).await?;
        self.press(Key::Return).await?;
        debug!(len = text.len(), "채팅 입력 완료");
        Ok(())
    }

    /// 월드맵을 열어 목적지 템플릿을 찾아 이동. 목적지를 찾았으면 `true`.
    pub async fn teleport_to_map(
        &self,
        destination: &Template,
        cancel: &CancellationToken,
    ) -> Result<bool, CoreError> {
        self.release_all().await?;
        pause_for(cancel, 1000).await?;
        self.press(self.hotkeys.map).await?;
        pause_for(cancel, 2000).await?;

        let frame = self.latest_frame(cancel).await?;
        let Some(target) = find_template(&frame, destination, WORLD_MAP_TOLERANCE, None) else {
            info!("월드맵에서 목적지를 찾을 수 없음");
            return Ok(false);
        };

        pause_for(cancel, 2000).await?;
        self.input
            .click_at(Point::new(100, 100), MouseButton::Left)
            .await?;
        pause_for(cancel, 1000).await?;
        // 더블 클릭
        self.input.click_at(target, MouseButton::Left).await?;
        pause_for(cancel, 20).await?;
        self.input.click_at(target, MouseButton::Left).await?;
        pause_for(cancel, 1000).await?;
        self.press(Key::Return).await?;
        pause_for(cancel, 100).await?;
        self.press(Key::Return).await?;
        pause_for(cancel, 100).await?;
        self.press(Key::Return).await?;
        info!(x = target.x, y = target.y, "월드맵 이동 확정");
        Ok(true)
    }
}
