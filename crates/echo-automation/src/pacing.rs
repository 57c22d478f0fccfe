//! 취소 가능한 대기.
//!
//! 핸들러/재생기의 모든 대기는 이 함수를 거쳐 취소 토큰을 관찰한다.

use std::time::Duration;

use echo_core::error::CoreError;
use tokio_util::sync::CancellationToken;

/// `ms` 밀리초 대기. 대기 중 취소되면 [`CoreError::Cancelled`].
pub async fn pause_for(cancel: &CancellationToken, ms: u64) -> Result<(), CoreError> {
    ensure_active(cancel)?;
    tokio::select! {
        _ = cancel.cancelled() => Err(CoreError::Cancelled),
        _ = tokio::time::sleep(Duration::from_millis(ms)) => Ok(()),
    }
}

/// 이미 취소되었으면 즉시 [`CoreError::Cancelled`]
pub fn ensure_active(cancel: &CancellationToken) -> Result<(), CoreError> {
    if cancel.is_cancelled() {
        Err(CoreError::Cancelled)
    } else {
        Ok(())
    }
}
