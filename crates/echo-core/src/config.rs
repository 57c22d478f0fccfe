//! 애플리케이션 설정 구조체.
//!
//! 대상 창, 캡처/폴링 주기, 단축키, 템플릿 경로, 미니맵/룬 영역 등
//! 런타임 설정을 정의한다. 실행 중에는 읽기 전용으로만 사용한다.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::geometry::Region;
use crate::models::input::Key;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 대상 창 설정
    #[serde(default)]
    pub window: WindowConfig,
    /// 프레임 캡처 설정
    #[serde(default)]
    pub capture: CaptureConfig,
    /// 이벤트 오케스트레이터 설정
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// 이름 붙은 단축키
    #[serde(default)]
    pub hotkeys: HotkeySettings,
    /// 주입 가능한 키 풀
    #[serde(default = "default_injectable_keys")]
    pub injectable_keys: Vec<Key>,
    /// 템플릿 이미지 설정
    #[serde(default)]
    pub templates: TemplateConfig,
    /// 미니맵 설정
    #[serde(default)]
    pub minimap: MinimapConfig,
    /// 룬 설정
    #[serde(default)]
    pub rune: RuneConfig,
    /// 알림 설정
    #[serde(default)]
    pub notification: NotificationConfig,
}

// ============================================================
// 창 / 캡처
// ============================================================

/// 대상 창 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 창 제목에 포함된 문자열
    #[serde(default = "default_window_title")]
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_window_title(),
        }
    }
}

/// 프레임 캡처 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// 캡처 주기 (ms)
    #[serde(default = "default_capture_interval_ms")]
    pub interval_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_capture_interval_ms(),
        }
    }
}

// ============================================================
// 오케스트레이터
// ============================================================

/// 이벤트 오케스트레이터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// 체커 폴링 주기 (ms)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// 창 포커스 폴링 주기 (ms)
    #[serde(default = "default_focus_poll_interval_ms")]
    pub focus_poll_interval_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            focus_poll_interval_ms: default_focus_poll_interval_ms(),
        }
    }
}

// ============================================================
// 단축키
// ============================================================

/// 핸들러가 사용하는 이름 붙은 단축키
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeySettings {
    /// NPC 대화 / 룬 활성화
    pub npc_chat: Key,
    pub attack: Key,
    pub jump: Key,
    pub rope_lift: Key,
    /// 채널 변경 메뉴
    pub menu: Key,
    /// 월드맵
    pub map: Key,
    pub buff: Key,
}

impl Default for HotkeySettings {
    fn default() -> Self {
        Self {
            npc_chat: Key::Space,
            attack: Key::Control,
            jump: Key::Alt,
            rope_lift: Key::Char('c'),
            menu: Key::Escape,
            map: Key::Char('w'),
            buff: Key::Char('l'),
        }
    }
}

// ============================================================
// 템플릿 / 미니맵 / 룬
// ============================================================

/// 템플릿 이미지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// 참조 PNG 디렉토리
    #[serde(default = "default_template_dir")]
    pub dir: PathBuf,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            dir: default_template_dir(),
        }
    }
}

/// 미니맵 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinimapConfig {
    /// 모서리 템플릿 검색 영역
    #[serde(default = "default_minimap_search_area")]
    pub search_area: Region,
    /// 고정 미니맵 경계 (없으면 모서리 템플릿으로 보정)
    #[serde(default)]
    pub bounds: Option<Region>,
}

impl Default for MinimapConfig {
    fn default() -> Self {
        Self {
            search_area: default_minimap_search_area(),
            bounds: None,
        }
    }
}

/// 룬 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuneConfig {
    /// 화살표가 표시되는 영역
    #[serde(default = "default_arrow_region")]
    pub arrow_region: Region,
    /// 이 횟수만큼 연속 실패하면 채널 변경
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for RuneConfig {
    fn default() -> Self {
        Self {
            arrow_region: default_arrow_region(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// 알림 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// 알림 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ============================================================
// AppConfig impl
// ============================================================

impl AppConfig {
    /// 기본 설정
    pub fn default_config() -> Self {
        Self {
            window: WindowConfig::default(),
            capture: CaptureConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            hotkeys: HotkeySettings::default(),
            injectable_keys: default_injectable_keys(),
            templates: TemplateConfig::default(),
            minimap: MinimapConfig::default(),
            rune: RuneConfig::default(),
            notification: NotificationConfig::default(),
        }
    }

    /// 설정값 유효성 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.window.title.trim().is_empty() {
            return Err(validation("window.title", "비어 있음"));
        }
        if self.capture.interval_ms == 0 {
            return Err(validation("capture.interval_ms", "0보다 커야 함"));
        }
        if self.orchestrator.poll_interval_ms == 0 {
            return Err(validation("orchestrator.poll_interval_ms", "0보다 커야 함"));
        }
        if self.orchestrator.focus_poll_interval_ms == 0 {
            return Err(validation(
                "orchestrator.focus_poll_interval_ms",
                "0보다 커야 함",
            ));
        }
        if self.rune.max_attempts == 0 {
            return Err(validation("rune.max_attempts", "0보다 커야 함"));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.injectable_keys.iter().find(|k| !seen.insert(**k)) {
            return Err(validation("injectable_keys", &format!("중복 키 {dup:?}")));
        }
        Ok(())
    }

    pub fn capture_interval(&self) -> Duration {
        Duration::from_millis(self.capture.interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.orchestrator.poll_interval_ms)
    }

    pub fn focus_poll_interval(&self) -> Duration {
        Duration::from_millis(self.orchestrator.focus_poll_interval_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

fn validation(field: &str, message: &str) -> CoreError {
    CoreError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn default_true() -> bool {
    true
}
fn default_window_title() -> String {
    "MapleStory".to_string()
}
fn default_capture_interval_ms() -> u64 {
    250
}
fn default_poll_interval_ms() -> u64 {
    1_000
}
fn default_focus_poll_interval_ms() -> u64 {
    50
}
fn default_template_dir() -> PathBuf {
    PathBuf::from("imgs")
}
fn default_minimap_search_area() -> Region {
    Region::new(0, 0, 700, 500)
}
fn default_arrow_region() -> Region {
    Region::new(630, 280, 570, 200)
}
fn default_max_attempts() -> u32 {
    3
}
fn default_injectable_keys() -> Vec<Key> {
    vec![Key::Insert, Key::Home, Key::PageUp, Key::Delete, Key::End, Key::PageDown]
}
