//! 버프 만료 시 재사용.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use echo_core::error::CoreError;
use echo_core::models::event::EventKind;
use echo_core::models::frame::{Frame, Template};
use echo_core::models::geometry::Region;
use echo_core::models::input::Key;
use echo_core::ports::events::{EventChecker, EventHandler};
use echo_core::ports::input_driver::InputDriver;
use echo_vision::matching::find_template;

use crate::pacing::pause_for;

/// 버프 바 높이 (화면 상단)
const BUFF_BAR_HEIGHT: i32 = 300;
const ACTIVE_TOLERANCE: f64 = 0.45;
const READY_TOLERANCE: f64 = 0.1;

/// 버프 갱신 대응.
///
/// 활성 버프 아이콘이 상단 버프 바에 없고 스킬 준비 아이콘이 보이면 감지한다.
pub struct BuffRefreshResponse {
    input: Arc<dyn InputDriver>,
    active_icon: Option<Template>,
    ready_icon: Option<Template>,
    buff_key: Key,
}

impl BuffRefreshResponse {
    pub fn new(
        input: Arc<dyn InputDriver>,
        active_icon: Option<Template>,
        ready_icon: Option<Template>,
        buff_key: Key,
    ) -> Self {
        Self {
            input,
            active_icon,
            ready_icon,
            buff_key,
        }
    }
}

impl EventChecker for BuffRefreshResponse {
    fn kind(&self) -> EventKind {
        EventKind::LowPriorityBuff
    }

    fn detect(&self, frame: &Frame) -> Result<Option<EventKind>, CoreError> {
        let (Some(active), Some(ready)) = (&self.active_icon, &self.ready_icon) else {
            return Ok(None);
        };
        let buff_bar = Region::new(0, 0, frame.width() as i32, BUFF_BAR_HEIGHT);
        let expired = find_template(frame, active, ACTIVE_TOLERANCE, Some(buff_bar)).is_none();
        let refreshed = expired && find_template(frame, ready, READY_TOLERANCE, None).is_some();
        Ok(refreshed.then_some(EventKind::LowPriorityBuff))
    }
}

#[async_trait]
impl EventHandler for BuffRefreshResponse {
    fn kind(&self) -> EventKind {
        EventKind::LowPriorityBuff
    }

    async fn handle(&self, cancel: CancellationToken) -> Result<(), CoreError> {
        pause_for(&cancel, 200).await?;
        debug!(key = ?self.buff_key, "버프 재사용");
        self.input.press(self.buff_key).await?;
        pause_for(&cancel, 1300).await
    }
}
