//! 창 캡처 포트.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::frame::Frame;
use crate::models::geometry::Point;

/// 대상 창의 프레임 버퍼와 상태를 제공하는 협력자.
///
/// 구현체: `XcapWindowSource` (실제 창), 테스트용 고정 프레임 소스
#[async_trait]
pub trait WindowSource: Send + Sync {
    /// 현재 창 내용을 캡처. 창이 없으면 [`CoreError::CaptureUnavailable`].
    async fn capture_frame(&self) -> Result<Frame, CoreError>;

    /// 대상 창이 포커스를 가지고 있는지 여부
    async fn is_focused(&self) -> Result<bool, CoreError>;

    /// 창 클라이언트 영역의 화면 좌표 원점 (클릭 좌표 변환용)
    async fn origin(&self) -> Result<Point, CoreError> {
        Ok(Point::default())
    }
}
