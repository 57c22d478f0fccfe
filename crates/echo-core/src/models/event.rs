//! 상황 이벤트 종류와 핸들러 결과.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 감지된 상황의 종류.
///
/// 숫자 값이 곧 선점 우선순위다 (클수록 높음). `None`은 실제 이벤트가 아니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum EventKind {
    #[default]
    None = 0,
    LowPriorityBuff = 1,
    Rune = 10,
    RuneFailure = 15,
    WrongLocation = 20,
    EntityDefeated = 100,
    AdminWarp = 999,
}

impl EventKind {
    /// 우선순위 값
    pub const fn priority(self) -> u16 {
        self as u16
    }

    pub const fn is_none(self) -> bool {
        matches!(self, EventKind::None)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            EventKind::None => "none",
            EventKind::LowPriorityBuff => "low_priority_buff",
            EventKind::Rune => "rune",
            EventKind::RuneFailure => "rune_failure",
            EventKind::WrongLocation => "wrong_location",
            EventKind::EntityDefeated => "entity_defeated",
            EventKind::AdminWarp => "admin_warp",
        }
    }
}

impl PartialOrd for EventKind {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventKind {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority().cmp(&other.priority())
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.as_str(), self.priority())
    }
}

/// 핸들러 태스크의 종료 결과 (세 가지 모두 종결 상태)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    Completed,
    Cancelled,
    Failed(String),
}
