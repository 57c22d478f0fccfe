//! 알림 어댑터.
//!
//! 외부 채팅 전송 대신 경고 로그로 남긴다.

use async_trait::async_trait;
use tracing::warn;

use echo_core::error::CoreError;
use echo_core::ports::notifier::AlertNotifier;

/// 경고 로그 알림
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl AlertNotifier for LogNotifier {
    async fn send_alert(&self, message: &str) -> Result<(), CoreError> {
        warn!(target: "echo::alert", "{message}");
        Ok(())
    }
}
