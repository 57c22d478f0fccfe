//! 도메인 모델.
//!
//! 캡처 프레임, 좌표/영역, 이벤트 종류, 입력, 명령 시퀀스를 정의한다.

pub mod event;
pub mod frame;
pub mod geometry;
pub mod input;
pub mod sequence;
