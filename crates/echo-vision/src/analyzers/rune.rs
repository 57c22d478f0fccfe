//! 룬 상태 분석 (화살표 판독, 연속 실패 횟수).

use std::sync::atomic::{AtomicU32, Ordering};

use echo_core::config::RuneConfig;
use echo_core::models::frame::Frame;
use echo_core::models::geometry::Region;
use tracing::debug;

use crate::rune_arrows::{read_arrows, ArrowReading};

/// 룬 해제에 필요한 화살표 수
pub const ARROWS_PER_RUNE: usize = 4;

/// 룬 분석기.
///
/// 룬 핸들러와 룬 실패 체커가 `Arc`로 공유하며, 시도 횟수가 둘 사이의 통로다.
#[derive(Debug)]
pub struct RuneAnalyzer {
    arrow_region: Region,
    max_attempts: u32,
    attempts: AtomicU32,
}

impl RuneAnalyzer {
    pub fn new(config: &RuneConfig) -> Self {
        Self {
            arrow_region: config.arrow_region,
            max_attempts: config.max_attempts,
            attempts: AtomicU32::new(0),
        }
    }

    /// 화살표 영역에서 방향 판독
    pub fn read_arrows(&self, frame: &Frame) -> Vec<ArrowReading> {
        let readings = read_arrows(frame, self.arrow_region);
        debug!(count = readings.len(), "룬 화살표 판독");
        readings
    }

    /// 현재 연속 실패 횟수
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// 실패 1회 기록, 갱신된 횟수 반환
    pub fn record_failure(&self) -> u32 {
        self.attempts.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn reset_attempts(&self) {
        self.attempts.store(0, Ordering::SeqCst);
    }

    /// 채널 변경이 필요할 만큼 실패했는지
    pub fn attempts_exhausted(&self) -> bool {
        self.attempts() >= self.max_attempts
    }
}
