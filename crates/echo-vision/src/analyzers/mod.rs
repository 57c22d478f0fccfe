//! 상황 분석기.
//!
//! 매칭 엔진 위의 작은 상태 보유 래퍼로, 프레임 하나에 대해
//! 도메인 질문(전환 화면인가? 룬이 미니맵에 있는가?)에 답한다.

pub mod minimap;
pub mod rune;
pub mod screen;

pub use minimap::MinimapAnalyzer;
pub use rune::RuneAnalyzer;
pub use screen::ScreenAnalyzer;
