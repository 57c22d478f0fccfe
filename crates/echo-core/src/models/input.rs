//! 키보드/마우스 입력 모델.

use serde::{Deserialize, Serialize};

/// 가상 키
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Return,
    Space,
    Escape,
    Tab,
    Shift,
    Control,
    Alt,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    F(u8),
    Char(char),
}

impl Key {
    /// 채팅 입력용 문자 → 키 변환 (a-z, 공백만 지원)
    pub fn from_chat_char(c: char) -> Option<Key> {
        let lower = c.to_ascii_lowercase();
        match lower {
            'a'..='z' => Some(Key::Char(lower)),
            ' ' => Some(Key::Space),
            _ => None,
        }
    }
}

/// 키 입력 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressKind {
    Down,
    Up,
    /// Down 직후 Up
    #[default]
    Press,
}

/// 마우스 버튼
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}
