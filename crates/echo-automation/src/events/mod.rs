//! 상황별 체커/핸들러 쌍.
//!
//! 각 타입이 [`EventChecker`]와 [`EventHandler`]를 함께 구현하며,
//! 감지 시점에 본 위치 같은 상태를 핸들러와 비공개로 공유한다.
//!
//! | 종류 | 우선순위 |
//! |------|---------|
//! | 관리자 워프 | 999 |
//! | 캐릭터 사망 | 100 |
//! | 잘못된 맵 | 20 |
//! | 룬 해제 실패 | 15 |
//! | 룬 | 10 |
//! | 버프 갱신 | 1 |
//!
//! [`EventChecker`]: echo_core::ports::events::EventChecker
//! [`EventHandler`]: echo_core::ports::events::EventHandler

pub mod admin_warp;
pub mod buff;
pub mod entity_defeated;
pub mod rune;
pub mod rune_failure;
pub mod wrong_location;

pub use admin_warp::AdminWarpResponse;
pub use buff::BuffRefreshResponse;
pub use entity_defeated::EntityDefeatedResponse;
pub use rune::RuneResponse;
pub use rune_failure::RuneFailureResponse;
pub use wrong_location::WrongLocationResponse;
