//! 창 캡처.
//!
//! xcap 기반으로 제목이 일치하는 창을 찾아 캡처한다.
//! 캡처는 블로킹 호출이므로 `spawn_blocking`에서 실행한다.

use async_trait::async_trait;
use echo_core::error::CoreError;
use echo_core::models::frame::Frame;
use echo_core::models::geometry::Point;
use echo_core::ports::capture::WindowSource;
use tracing::debug;
use xcap::Window;

/// 창 제목 부분 일치로 대상 창을 찾는 캡처 소스
pub struct XcapWindowSource {
    title: String,
}

impl XcapWindowSource {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    fn find_window(title: &str) -> Result<Window, CoreError> {
        let windows = Window::all()
            .map_err(|e| CoreError::CaptureUnavailable(format!("창 목록 조회 실패: {e}")))?;

        windows
            .into_iter()
            .filter(|w| !w.is_minimized().unwrap_or(false))
            .find(|w| w.title().map(|t| t.contains(title)).unwrap_or(false))
            .ok_or_else(|| CoreError::NotFound {
                resource_type: "Window".to_string(),
                id: title.to_string(),
            })
    }
}

#[async_trait]
impl WindowSource for XcapWindowSource {
    async fn capture_frame(&self) -> Result<Frame, CoreError> {
        let title = self.title.clone();
        tokio::task::spawn_blocking(move || {
            let window = Self::find_window(&title)?;
            let image = window
                .capture_image()
                .map_err(|e| CoreError::CaptureUnavailable(format!("창 캡처 실패: {e}")))?;
            debug!("창 캡처 완료: {}x{}", image.width(), image.height());
            Frame::from_rgba(image.width(), image.height(), image.as_raw())
        })
        .await
        .map_err(|e| CoreError::Internal(format!("캡처 태스크 실패: {e}")))?
    }

    async fn is_focused(&self) -> Result<bool, CoreError> {
        let title = self.title.clone();
        tokio::task::spawn_blocking(move || match Self::find_window(&title) {
            Ok(window) => window
                .is_focused()
                .map_err(|e| CoreError::CaptureUnavailable(format!("포커스 조회 실패: {e}"))),
            Err(CoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        })
        .await
        .map_err(|e| CoreError::Internal(format!("포커스 조회 태스크 실패: {e}")))?
    }

    async fn origin(&self) -> Result<Point, CoreError> {
        let title = self.title.clone();
        tokio::task::spawn_blocking(move || {
            let window = Self::find_window(&title)?;
            let x = window
                .x()
                .map_err(|e| CoreError::CaptureUnavailable(format!("창 위치 조회 실패: {e}")))?;
            let y = window
                .y()
                .map_err(|e| CoreError::CaptureUnavailable(format!("창 위치 조회 실패: {e}")))?;
            Ok(Point::new(x, y))
        })
        .await
        .map_err(|e| CoreError::Internal(format!("창 위치 조회 태스크 실패: {e}")))?
    }
}
