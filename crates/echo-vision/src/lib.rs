//! # echo-vision
//!
//! 비전 파이프라인 크레이트.
//! 프레임 저장소, 픽셀 매칭 엔진, 룬 화살표 판독, 상황 분석기,
//! 템플릿 로드, 창 캡처 어댑터를 담당한다.

pub mod analyzers;
#[cfg(feature = "capture")]
pub mod capture;
pub mod frame_store;
pub mod matching;
pub mod rune_arrows;
pub mod templates;
