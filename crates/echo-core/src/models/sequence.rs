//! 반복 재생용 명령 시퀀스.
//!
//! 사람이 읽을 수 있는 JSON으로 저장/로드한다.
//!
//! ```json
//! {
//!   "name": "hunt",
//!   "commands": [
//!     { "key": "left", "kind": "down", "delay_ms": 0 },
//!     { "key": "left", "kind": "up", "delay_ms": 800 }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::input::{Key, PressKind};

/// 시퀀스의 단일 명령: `delay_ms` 대기 후 키 입력
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceCommand {
    pub key: Key,
    #[serde(default)]
    pub kind: PressKind,
    #[serde(default)]
    pub delay_ms: u64,
}

/// 이름 붙은 명령 목록
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSequence {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub commands: Vec<SequenceCommand>,
}

impl CommandSequence {
    pub fn new(name: impl Into<String>, commands: Vec<SequenceCommand>) -> Self {
        Self {
            name: name.into(),
            commands,
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// 순환 인덱스로 명령 조회 (`index % len`)
    pub fn command_at(&self, index: usize) -> Option<&SequenceCommand> {
        if self.commands.is_empty() {
            return None;
        }
        self.commands.get(index % self.commands.len())
    }

    /// JSON 파일에서 로드
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        let sequence: CommandSequence = serde_json::from_str(&content)?;
        Ok(sequence)
    }

    /// JSON 파일로 저장 (부모 디렉토리 자동 생성)
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
