//! 캐릭터 사망 시 부활 대화상자 확인.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

use echo_core::error::CoreError;
use echo_core::models::event::EventKind;
use echo_core::models::frame::{Frame, Template};
use echo_core::models::geometry::Point;
use echo_core::models::input::MouseButton;
use echo_core::ports::events::{EventChecker, EventHandler};
use echo_core::ports::input_driver::InputDriver;
use echo_vision::matching::{find_template, DEFAULT_TOLERANCE};

use crate::pacing::pause_for;

/// 캡처 영역 기준 보정 (대화상자 위치 → 확인 버튼)
const CONFIRM_Y_OFFSET: i32 = -40;

/// 부활 대화상자 대응
pub struct EntityDefeatedResponse {
    input: Arc<dyn InputDriver>,
    dialog: Option<Template>,
    location: Mutex<Option<Point>>,
}

impl EntityDefeatedResponse {
    pub fn new(input: Arc<dyn InputDriver>, dialog: Option<Template>) -> Self {
        Self {
            input,
            dialog,
            location: Mutex::new(None),
        }
    }
}

impl EventChecker for EntityDefeatedResponse {
    fn kind(&self) -> EventKind {
        EventKind::EntityDefeated
    }

    fn detect(&self, frame: &Frame) -> Result<Option<EventKind>, CoreError> {
        let Some(dialog) = &self.dialog else {
            return Ok(None);
        };
        Ok(find_template(frame, dialog, DEFAULT_TOLERANCE, None).map(|point| {
            *self.location.lock() = Some(point);
            EventKind::EntityDefeated
        }))
    }
}

#[async_trait]
impl EventHandler for EntityDefeatedResponse {
    fn kind(&self) -> EventKind {
        EventKind::EntityDefeated
    }

    async fn handle(&self, cancel: CancellationToken) -> Result<(), CoreError> {
        let dialog = (*self.location.lock()).ok_or_else(|| CoreError::NotFound {
            resource_type: "RespawnDialog".to_string(),
            id: "screen".to_string(),
        })?;
        let confirm = dialog.offset(0, CONFIRM_Y_OFFSET);

        pause_for(&cancel, 1000).await?;
        info!(x = confirm.x, y = confirm.y, "부활 확인 클릭");
        self.input.click_at(confirm, MouseButton::Left).await?;
        pause_for(&cancel, 1000).await
    }
}
