//! 매크로 맵을 벗어났을 때 월드맵으로 복귀.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use echo_core::error::CoreError;
use echo_core::models::event::EventKind;
use echo_core::models::frame::{Frame, Template};
use echo_core::ports::events::{EventChecker, EventHandler};
use echo_vision::matching::find_template;

use crate::pacing::pause_for;
use crate::player::PlayerController;

/// 지역 이름 템플릿 허용 오차
const LOCATION_TOLERANCE: f64 = 0.4;

/// 잘못된 맵 대응.
///
/// 지역 이름 템플릿과 월드맵 목적지 템플릿이 모두 있어야 감지한다.
pub struct WrongLocationResponse {
    player: Arc<PlayerController>,
    location_name: Option<Template>,
    destination: Option<Template>,
}

impl WrongLocationResponse {
    pub fn new(
        player: Arc<PlayerController>,
        location_name: Option<Template>,
        destination: Option<Template>,
    ) -> Self {
        Self {
            player,
            location_name,
            destination,
        }
    }
}

impl EventChecker for WrongLocationResponse {
    fn kind(&self) -> EventKind {
        EventKind::WrongLocation
    }

    fn detect(&self, frame: &Frame) -> Result<Option<EventKind>, CoreError> {
        let (Some(name), Some(_)) = (&self.location_name, &self.destination) else {
            return Ok(None);
        };
        let here = find_template(frame, name, LOCATION_TOLERANCE, None).is_some();
        Ok((!here).then_some(EventKind::WrongLocation))
    }
}

#[async_trait]
impl EventHandler for WrongLocationResponse {
    fn kind(&self) -> EventKind {
        EventKind::WrongLocation
    }

    async fn handle(&self, cancel: CancellationToken) -> Result<(), CoreError> {
        let destination = self
            .destination
            .as_ref()
            .ok_or_else(|| CoreError::Config("월드맵 목적지 템플릿 없음".to_string()))?;

        info!("매크로 맵 이탈, 월드맵으로 복귀");
        if !self.player.teleport_to_map(destination, &cancel).await? {
            warn!("월드맵 복귀 실패");
        }
        pause_for(&cancel, 5000).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::test_support::rig;
    use echo_core::models::frame::Rgb;
    use echo_core::models::geometry::Point;

    fn name_tag() -> Template {
        Template::solid(10, 4, Rgb::new(240, 240, 20))
    }

    #[tokio::test]
    async fn never_detects_without_templates() {
        let rig = rig(Frame::filled(100, 100, Rgb::BLACK)).await;
        let frame = rig.frames.latest().await.unwrap();
        let response = WrongLocationResponse::new(rig.player.clone(), None, None);
        assert_eq!(response.detect(&frame).unwrap(), None);

        // 목적지 없이 이름만 있어도 감지하지 않음
        let response = WrongLocationResponse::new(rig.player.clone(), Some(name_tag()), None);
        assert_eq!(response.detect(&frame).unwrap(), None);
    }

    #[tokio::test]
    async fn detects_when_location_name_missing() {
        let rig = rig(Frame::filled(100, 100, Rgb::BLACK)).await;
        let frame = rig.frames.latest().await.unwrap();
        let destination = Template::solid(4, 4, Rgb::new(0, 0, 250));
        let response =
            WrongLocationResponse::new(rig.player.clone(), Some(name_tag()), Some(destination));
        assert_eq!(response.detect(&frame).unwrap(), Some(EventKind::WrongLocation));

        let mut frame = Frame::filled(100, 100, Rgb::BLACK);
        frame.paste(&name_tag(), Point::new(5, 5));
        assert_eq!(response.detect(&frame).unwrap(), None);
    }
}
