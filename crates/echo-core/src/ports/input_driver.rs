//! 입력 드라이버 포트.
//!
//! 키보드/마우스 합성 입력을 위한 인터페이스를 정의한다.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::geometry::Point;
use crate::models::input::{Key, MouseButton, PressKind};

/// 입력 드라이버
///
/// 구현체: `EnigoInputDriver` (실제 입력), `NoOpInputDriver` (dry-run/테스트용)
#[async_trait]
pub trait InputDriver: Send + Sync {
    /// 키 입력 (누름 / 놓음 / 누름+놓음)
    async fn send_key(&self, key: Key, kind: PressKind) -> Result<(), CoreError>;

    /// 지정 좌표 클릭
    async fn click_at(&self, point: Point, button: MouseButton) -> Result<(), CoreError>;

    /// 눌려 있던 키를 모두 놓고, 놓은 키 목록을 반환
    async fn release_all_pressed(&self) -> Result<Vec<Key>, CoreError>;

    /// 플랫폼 이름 (예: "macos", "windows", "linux", "noop")
    fn platform(&self) -> &str;

    /// 누름+놓음 단축
    async fn press(&self, key: Key) -> Result<(), CoreError> {
        self.send_key(key, PressKind::Press).await
    }
}
