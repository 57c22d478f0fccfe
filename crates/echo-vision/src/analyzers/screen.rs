//! 화면 전체 상태 분석 (전환 화면, 관리자 워프, 룬 쿨다운).

use echo_core::models::frame::{Frame, Rgb, Template};
use echo_core::models::geometry::Region;

use crate::matching::{color_coverage, find_template, DEFAULT_TOLERANCE};
use crate::templates::TemplateLibrary;

/// 맵/채널 전환 시 검은 화면 비율
pub const TRANSITION_BLACK_FRACTION: f64 = 0.8;
/// 관리자 워프 맵의 흰 화면 비율
pub const ADMIN_WARP_WHITE_FRACTION: f64 = 0.4;
/// 룬 쿨다운 아이콘 허용 오차
pub const RUNE_COOLDOWN_TOLERANCE: f64 = 0.3;

/// 화면 전체 상태 분석기
#[derive(Debug, Clone, Default)]
pub struct ScreenAnalyzer {
    cooldown_top: Option<Template>,
    cooldown_bottom: Option<Template>,
}

impl ScreenAnalyzer {
    pub fn new(cooldown_top: Option<Template>, cooldown_bottom: Option<Template>) -> Self {
        Self {
            cooldown_top,
            cooldown_bottom,
        }
    }

    pub fn from_library(library: &TemplateLibrary) -> Self {
        Self::new(
            library.rune_cooldown_top.clone(),
            library.rune_cooldown_bottom.clone(),
        )
    }

    /// 맵 이동/채널 변경 중의 검은 화면
    pub fn is_transition_flash(&self, frame: &Frame) -> bool {
        color_coverage(frame, Rgb::BLACK, TRANSITION_BLACK_FRACTION, DEFAULT_TOLERANCE)
    }

    /// 관리자 워프 맵 (대부분 흰 화면)
    pub fn is_admin_warp_flash(&self, frame: &Frame) -> bool {
        color_coverage(frame, Rgb::WHITE, ADMIN_WARP_WHITE_FRACTION, DEFAULT_TOLERANCE)
    }

    /// 우측 상단 버프 영역에 룬 쿨다운 아이콘(위/아래 중 하나)이 보이는지
    pub fn rune_on_cooldown(&self, frame: &Frame) -> bool {
        let region = cooldown_region(frame.width());
        [&self.cooldown_top, &self.cooldown_bottom]
            .into_iter()
            .flatten()
            .any(|icon| find_template(frame, icon, RUNE_COOLDOWN_TOLERANCE, Some(region)).is_some())
    }
}

/// 쿨다운 아이콘 검색 영역: (w-400, 0, 400, 75)
fn cooldown_region(frame_width: u32) -> Region {
    Region::new(frame_width as i32 - 400, 0, 400, 75)
}
