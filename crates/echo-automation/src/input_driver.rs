//! 입력 드라이버 구현.
//!
//! `NoOpInputDriver` (dry-run/테스트용)와 `EnigoInputDriver` (실제 입력)를 제공한다.
//! 두 구현 모두 Down 상태로 남은 키를 추적해서 `release_all_pressed`로 일괄 해제한다.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use echo_core::error::CoreError;
use echo_core::models::geometry::Point;
use echo_core::models::input::{Key, MouseButton, PressKind};
use echo_core::ports::input_driver::InputDriver;

// ============================================================
// 눌린 키 추적
// ============================================================

/// Down/Up 입력을 따라가며 현재 눌린 키 집합을 유지
#[derive(Debug, Default)]
struct PressedKeys {
    keys: Mutex<BTreeSet<Key>>,
}

impl PressedKeys {
    fn track(&self, key: Key, kind: PressKind) {
        let mut keys = self.keys.lock();
        match kind {
            PressKind::Down => {
                keys.insert(key);
            }
            PressKind::Up => {
                keys.remove(&key);
            }
            PressKind::Press => {}
        }
    }

    fn take_all(&self) -> Vec<Key> {
        std::mem::take(&mut *self.keys.lock()).into_iter().collect()
    }
}

// ============================================================
// NoOpInputDriver: dry-run/테스트용
// ============================================================

/// 드라이버가 받은 입력 한 건
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Key(Key, PressKind),
    Click(Point, MouseButton),
}

const HISTORY_CAPACITY: usize = 1024;

/// No-Op 입력 드라이버: 입력을 로깅/기록만 하고 실행하지 않음
///
/// 최근 입력 기록은 최대 1024건까지 보관한다.
#[derive(Debug, Default)]
pub struct NoOpInputDriver {
    pressed: PressedKeys,
    history: Mutex<VecDeque<InputAction>>,
}

impl NoOpInputDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 지금까지 받은 입력 (오래된 순)
    pub fn history(&self) -> Vec<InputAction> {
        self.history.lock().iter().copied().collect()
    }

    /// 지금까지 받은 키 입력만
    pub fn key_history(&self) -> Vec<(Key, PressKind)> {
        self.history
            .lock()
            .iter()
            .filter_map(|action| match action {
                InputAction::Key(key, kind) => Some((*key, *kind)),
                InputAction::Click(..) => None,
            })
            .collect()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    fn record(&self, action: InputAction) {
        let mut history = self.history.lock();
        if history.len() == HISTORY_CAPACITY {
            history.pop_front();
        }
        history.push_back(action);
    }
}

#[async_trait]
impl InputDriver for NoOpInputDriver {
    async fn send_key(&self, key: Key, kind: PressKind) -> Result<(), CoreError> {
        debug!(?key, ?kind, "[NoOp] 키 입력");
        self.pressed.track(key, kind);
        self.record(InputAction::Key(key, kind));
        Ok(())
    }

    async fn click_at(&self, point: Point, button: MouseButton) -> Result<(), CoreError> {
        debug!(x = point.x, y = point.y, ?button, "[NoOp] 마우스 클릭");
        self.record(InputAction::Click(point, button));
        Ok(())
    }

    async fn release_all_pressed(&self) -> Result<Vec<Key>, CoreError> {
        let released = self.pressed.take_all();
        for key in &released {
            self.record(InputAction::Key(*key, PressKind::Up));
        }
        if !released.is_empty() {
            debug!(?released, "[NoOp] 눌린 키 해제");
        }
        Ok(released)
    }

    fn platform(&self) -> &str {
        "noop"
    }
}

// ============================================================
// EnigoInputDriver: 실제 마우스/키보드 입력
// ============================================================

/// 실제 마우스/키보드 입력 드라이버 (enigo 기반)
///
/// macOS: Accessibility 권한 필요
/// Windows: 대상 창과 같은 권한 수준으로 실행 필요
/// Linux: X11 또는 Wayland + uinput 권한 필요
///
/// 클릭 좌표는 창 클라이언트 기준이며, 원점 소스가 있으면 화면 좌표로 옮겨서 보낸다.
#[cfg(feature = "enigo")]
pub struct EnigoInputDriver {
    /// enigo 인스턴스 (Send지만 !Sync → tokio::sync::Mutex 사용)
    enigo: tokio::sync::Mutex<enigo::Enigo>,
    pressed: PressedKeys,
    origin: Option<Arc<dyn echo_core::ports::capture::WindowSource>>,
}

#[cfg(feature = "enigo")]
impl EnigoInputDriver {
    pub fn new(
        origin: Option<Arc<dyn echo_core::ports::capture::WindowSource>>,
    ) -> Result<Self, CoreError> {
        let settings = enigo::Settings::default();
        let enigo = enigo::Enigo::new(&settings)
            .map_err(|e| CoreError::Input(format!("입력 드라이버 초기화 실패: {e}")))?;
        Ok(Self {
            enigo: tokio::sync::Mutex::new(enigo),
            pressed: PressedKeys::default(),
            origin,
        })
    }

    /// 가상 키 → enigo 키 매핑
    fn map_key(key: Key) -> Result<enigo::Key, CoreError> {
        let mapped = match key {
            Key::Up => enigo::Key::UpArrow,
            Key::Down => enigo::Key::DownArrow,
            Key::Left => enigo::Key::LeftArrow,
            Key::Right => enigo::Key::RightArrow,
            Key::Return => enigo::Key::Return,
            Key::Space => enigo::Key::Space,
            Key::Escape => enigo::Key::Escape,
            Key::Tab => enigo::Key::Tab,
            Key::Shift => enigo::Key::Shift,
            Key::Control => enigo::Key::Control,
            Key::Alt => enigo::Key::Alt,
            Key::Home => enigo::Key::Home,
            Key::End => enigo::Key::End,
            Key::PageUp => enigo::Key::PageUp,
            Key::PageDown => enigo::Key::PageDown,
            Key::Delete => enigo::Key::Delete,
            #[cfg(not(target_os = "macos"))]
            Key::Insert => enigo::Key::Insert,
            Key::F(1) => enigo::Key::F1,
            Key::F(2) => enigo::Key::F2,
            Key::F(3) => enigo::Key::F3,
            Key::F(4) => enigo::Key::F4,
            Key::F(5) => enigo::Key::F5,
            Key::F(6) => enigo::Key::F6,
            Key::F(7) => enigo::Key::F7,
            Key::F(8) => enigo::Key::F8,
            Key::F(9) => enigo::Key::F9,
            Key::F(10) => enigo::Key::F10,
            Key::F(11) => enigo::Key::F11,
            Key::F(12) => enigo::Key::F12,
            Key::Char(ch) => enigo::Key::Unicode(ch),
            other => {
                return Err(CoreError::Input(format!(
                    "이 플랫폼에서 지원하지 않는 키: {other:?}"
                )))
            }
        };
        Ok(mapped)
    }

    async fn to_screen(&self, point: Point) -> Point {
        let Some(source) = &self.origin else {
            return point;
        };
        match source.origin().await {
            Ok(origin) => point.offset(origin.x, origin.y),
            Err(e) => {
                tracing::warn!("창 원점 조회 실패, 클라이언트 좌표 그대로 사용: {e}");
                point
            }
        }
    }
}

#[cfg(feature = "enigo")]
#[async_trait]
impl InputDriver for EnigoInputDriver {
    async fn send_key(&self, key: Key, kind: PressKind) -> Result<(), CoreError> {
        use enigo::Keyboard;
        debug!(?key, ?kind, "[Enigo] 키 입력");
        let direction = match kind {
            PressKind::Down => enigo::Direction::Press,
            PressKind::Up => enigo::Direction::Release,
            PressKind::Press => enigo::Direction::Click,
        };
        let mapped = Self::map_key(key)?;
        let mut enigo = self.enigo.lock().await;
        enigo
            .key(mapped, direction)
            .map_err(|e| CoreError::Input(format!("키 입력 실패: {e}")))?;
        self.pressed.track(key, kind);
        Ok(())
    }

    async fn click_at(&self, point: Point, button: MouseButton) -> Result<(), CoreError> {
        use enigo::Mouse;
        let screen = self.to_screen(point).await;
        debug!(x = screen.x, y = screen.y, ?button, "[Enigo] 마우스 클릭");
        let btn = match button {
            MouseButton::Left => enigo::Button::Left,
            MouseButton::Right => enigo::Button::Right,
            MouseButton::Middle => enigo::Button::Middle,
        };
        let mut enigo = self.enigo.lock().await;
        enigo
            .move_mouse(screen.x, screen.y, enigo::Coordinate::Abs)
            .map_err(|e| CoreError::Input(format!("마우스 이동 실패: {e}")))?;
        enigo
            .button(btn, enigo::Direction::Click)
            .map_err(|e| CoreError::Input(format!("마우스 클릭 실패: {e}")))?;
        Ok(())
    }

    async fn release_all_pressed(&self) -> Result<Vec<Key>, CoreError> {
        use enigo::Keyboard;
        let released = self.pressed.take_all();
        let mut enigo = self.enigo.lock().await;
        for key in &released {
            let mapped = Self::map_key(*key)?;
            enigo
                .key(mapped, enigo::Direction::Release)
                .map_err(|e| CoreError::Input(format!("키 해제 실패: {e}")))?;
        }
        if !released.is_empty() {
            debug!(?released, "[Enigo] 눌린 키 해제");
        }
        Ok(released)
    }

    fn platform(&self) -> &str {
        #[cfg(target_os = "macos")]
        {
            "macos"
        }
        #[cfg(target_os = "windows")]
        {
            "windows"
        }
        #[cfg(target_os = "linux")]
        {
            "linux"
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            "unknown"
        }
    }
}

/// 플랫폼별 입력 드라이버 생성 팩토리
///
/// `dry_run`이면 항상 NoOp. `enigo` feature 활성화 시 실제 입력 드라이버,
/// 비활성화되었거나 초기화에 실패하면 NoOp 드라이버를 반환한다.
pub fn create_platform_input_driver(
    dry_run: bool,
    origin: Option<Arc<dyn echo_core::ports::capture::WindowSource>>,
) -> Arc<dyn InputDriver> {
    if dry_run {
        tracing::info!("dry-run: NoOp 입력 드라이버 사용");
        return Arc::new(NoOpInputDriver::new());
    }
    #[cfg(feature = "enigo")]
    {
        match EnigoInputDriver::new(origin) {
            Ok(driver) => {
                tracing::info!("실제 입력 드라이버 (enigo) 초기화 완료");
                return Arc::new(driver);
            }
            Err(e) => {
                tracing::warn!("enigo 초기화 실패, NoOp 폴백: {e}");
            }
        }
    }
    #[cfg(not(feature = "enigo"))]
    {
        let _ = origin;
        tracing::warn!("enigo feature 비활성화, NoOp 입력 드라이버 사용");
    }
    Arc::new(NoOpInputDriver::new())
}

// ============================================================
// 테스트
// ============================================================
