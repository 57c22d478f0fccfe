//! 외부 알림 포트.
//!
//! 핸들러가 fire-and-forget으로 호출한다. 오케스트레이터는 결과를 기다리지 않는다.

use async_trait::async_trait;

use crate::error::CoreError;

/// 외부 메시징 협력자 (채팅 채널 등)
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    /// 경고 메시지 전송
    async fn send_alert(&self, message: &str) -> Result<(), CoreError>;
}
