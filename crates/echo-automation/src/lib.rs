//! # echo-automation
//!
//! 자동화 크레이트.
//! 이벤트 오케스트레이터(우선순위 선점, 단일 활성 핸들러, 협조적 취소),
//! 상황별 체커/핸들러 쌍, 플레이어 이동/채널 변경 동작,
//! 매크로 재생기, 입력 드라이버, 알림 어댑터를 제공한다.

pub mod events;
pub mod input_driver;
pub mod macro_player;
pub mod notifier;
pub mod orchestrator;
pub mod pacing;
pub mod player;
