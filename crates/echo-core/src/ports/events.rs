//! 이벤트 체커/핸들러 능력.
//!
//! 체커는 프레임 하나를 보고 [`EventKind`]를 판정하고,
//! 핸들러는 해당 종류에 대한 자동 대응을 취소 범위 안에서 실행한다.
//! 한 쌍의 체커/핸들러는 마지막 감지 위치 같은 상태를 비공개로 공유할 수 있다.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;
use crate::models::event::EventKind;
use crate::models::frame::Frame;

/// 상황 감지 능력
pub trait EventChecker: Send + Sync {
    /// 이 체커가 판정하는 이벤트 종류
    fn kind(&self) -> EventKind;

    /// 프레임에서 상황을 판정. 감지되지 않으면 `Ok(None)`.
    ///
    /// 오케스트레이터 상태를 변경해서는 안 된다.
    fn detect(&self, frame: &Frame) -> Result<Option<EventKind>, CoreError>;
}

/// 자동 대응 능력
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// 처리하는 이벤트 종류
    fn kind(&self) -> EventKind;

    /// 대응 실행. 취소 시 [`CoreError::Cancelled`]를 반환해야 한다.
    async fn handle(&self, cancel: CancellationToken) -> Result<(), CoreError>;
}
