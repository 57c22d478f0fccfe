//! 포트 인터페이스 (trait).
//!
//! 외부 협력자(창 캡처, 입력 전송, 매크로 재생, 알림)와
//! 이벤트 체커/핸들러 능력을 정의한다.
//! 각 어댑터 crate가 이 trait들을 구현하며, `echo-app`에서 `Arc<dyn T>`로 와이어링한다.

pub mod capture;
pub mod events;
pub mod input_driver;
pub mod macro_control;
pub mod notifier;
