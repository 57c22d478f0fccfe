//! 미니맵 분석.
//!
//! 미니맵 경계를 설정값 또는 모서리 템플릿으로 정한 뒤, 경계 안에서
//! 플레이어/룬 마커 색상의 무게중심으로 위치를 구한다.

use echo_core::config::MinimapConfig;
use echo_core::error::CoreError;
use echo_core::models::frame::{Frame, Rgb, Template};
use echo_core::models::geometry::{Point, Region};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::matching::{color_centroid, find_template, DEFAULT_MIN_HITS};

/// 플레이어 마커 색상
pub const PLAYER_MARKER: Rgb = Rgb::new(0xFE, 0xEF, 0x00);
/// 룬 마커 색상
pub const RUNE_MARKER: Rgb = Rgb::new(0xDD, 0x66, 0xFF);

const CORNER_TOLERANCE: f64 = 0.4;
const BOUNDS_PADDING: i32 = 10;

/// 미니맵 분석기
pub struct MinimapAnalyzer {
    top_left: Option<Template>,
    bottom_right: Option<Template>,
    search_area: Region,
    bounds: RwLock<Option<Region>>,
}

impl MinimapAnalyzer {
    pub fn new(
        config: &MinimapConfig,
        top_left: Option<Template>,
        bottom_right: Option<Template>,
    ) -> Self {
        Self {
            top_left,
            bottom_right,
            search_area: config.search_area,
            bounds: RwLock::new(config.bounds),
        }
    }

    /// 고정 경계로 생성 (보정 없음)
    pub fn with_bounds(bounds: Region) -> Self {
        Self {
            top_left: None,
            bottom_right: None,
            search_area: Region::default(),
            bounds: RwLock::new(Some(bounds)),
        }
    }

    /// 현재 미니맵 경계
    pub fn bounds(&self) -> Option<Region> {
        *self.bounds.read()
    }

    /// 모서리 템플릿으로 경계를 다시 구한다.
    ///
    /// 경계 = 좌상단 위치부터 우하단 위치 + 우하단 템플릿 크기 + 여백 10px.
    /// 모서리가 뒤집혀 경계가 비면 저장하지 않고 `Validation` 에러.
    pub fn calibrate(&self, frame: &Frame) -> Result<Region, CoreError> {
        let (Some(tl_icon), Some(br_icon)) = (&self.top_left, &self.bottom_right) else {
            return Err(CoreError::Config("미니맵 모서리 템플릿 없음".to_string()));
        };
        let not_found = |id: &str| CoreError::NotFound {
            resource_type: "MinimapCorner".to_string(),
            id: id.to_string(),
        };

        let tl = find_template(frame, tl_icon, CORNER_TOLERANCE, Some(self.search_area))
            .ok_or_else(|| not_found("top_left"))?;
        let br = find_template(frame, br_icon, CORNER_TOLERANCE, Some(self.search_area))
            .ok_or_else(|| not_found("bottom_right"))?;
        let br = br.offset(br_icon.width() as i32, br_icon.height() as i32);

        let bounds = Region::new(
            tl.x,
            tl.y,
            br.x.saturating_sub(tl.x).saturating_add(BOUNDS_PADDING),
            br.y.saturating_sub(tl.y).saturating_add(BOUNDS_PADDING),
        );
        if bounds.is_empty() {
            warn!(?tl, ?br, "미니맵 모서리 위치가 뒤집힘, 경계 무시");
            return Err(CoreError::Validation {
                field: "minimap.bounds".to_string(),
                message: format!("모서리로 구한 경계가 비어 있음: {bounds:?}"),
            });
        }
        *self.bounds.write() = Some(bounds);
        info!(?bounds, "미니맵 경계 보정");
        Ok(bounds)
    }

    /// 미니맵 위 플레이어 위치
    pub fn player_location(&self, frame: &Frame) -> Option<Point> {
        self.locate(frame, PLAYER_MARKER)
    }

    /// 미니맵 위 룬 위치
    pub fn rune_location(&self, frame: &Frame) -> Option<Point> {
        self.locate(frame, RUNE_MARKER)
    }

    fn locate(&self, frame: &Frame, marker: Rgb) -> Option<Point> {
        let bounds = match self.bounds() {
            Some(bounds) => bounds,
            None => match self.calibrate(frame) {
                Ok(bounds) => bounds,
                Err(e) => {
                    debug!("미니맵 경계 미확정: {e}");
                    return None;
                }
            },
        };
        color_centroid(frame, marker, bounds, DEFAULT_MIN_HITS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner(seed: u8) -> Template {
        let pixels = (0..5 * 5)
            .flat_map(|i| [seed, (i * 9) as u8, 255 - seed])
            .collect();
        Template::new(5, 5, pixels).unwrap()
    }

    fn marker_block(frame: &mut Frame, x0: u32, y0: u32, color: Rgb) {
        for y in y0..y0 + 3 {
            for x in x0..x0 + 3 {
                frame.set_pixel(x, y, color);
            }
        }
    }

    #[test]
    fn calibrates_from_corner_templates() {
        let analyzer = MinimapAnalyzer::new(&MinimapConfig::default(), Some(corner(10)), Some(corner(240)));
        let mut frame = Frame::filled(800, 600, Rgb::BLACK);
        frame.paste(&corner(10), Point::new(20, 60));
        frame.paste(&corner(240), Point::new(200, 160));

        let bounds = analyzer.calibrate(&frame).unwrap();
        // (200+5) - 20 + 10, (160+5) - 60 + 10
        assert_eq!(bounds, Region::new(20, 60, 195, 115));
        assert_eq!(analyzer.bounds(), Some(bounds));
    }

    #[test]
    fn missing_corner_is_not_found() {
        let analyzer = MinimapAnalyzer::new(&MinimapConfig::default(), Some(corner(10)), Some(corner(240)));
        let mut frame = Frame::filled(800, 600, Rgb::BLACK);
        frame.paste(&corner(10), Point::new(20, 60));
        assert!(matches!(analyzer.calibrate(&frame), Err(CoreError::NotFound { .. })));
        assert!(analyzer.bounds().is_none());
    }

    #[test]
    fn inverted_corners_are_rejected() {
        let analyzer = MinimapAnalyzer::new(&MinimapConfig::default(), Some(corner(10)), Some(corner(240)));
        let mut frame = Frame::filled(800, 600, Rgb::BLACK);
        // 우하단 아이콘이 좌상단 아이콘보다 왼쪽 위에 있음
        frame.paste(&corner(10), Point::new(200, 160));
        frame.paste(&corner(240), Point::new(20, 60));

        assert!(matches!(
            analyzer.calibrate(&frame),
            Err(CoreError::Validation { .. })
        ));
        assert!(analyzer.bounds().is_none());
        // 경계가 없으니 위치도 없음
        assert_eq!(analyzer.player_location(&frame), None);
    }

    #[test]
    fn locates_player_and_rune_inside_bounds() {
        let analyzer = MinimapAnalyzer::with_bounds(Region::new(0, 0, 100, 100));
        let mut frame = Frame::filled(300, 300, Rgb::BLACK);
        marker_block(&mut frame, 40, 50, PLAYER_MARKER);
        marker_block(&mut frame, 70, 20, RUNE_MARKER);
        // 경계 밖 마커는 무시
        marker_block(&mut frame, 200, 200, RUNE_MARKER);

        assert_eq!(analyzer.player_location(&frame), Some(Point::new(41, 51)));
        assert_eq!(analyzer.rune_location(&frame), Some(Point::new(71, 21)));
    }

    #[test]
    fn lazy_calibration_on_first_locate() {
        let analyzer = MinimapAnalyzer::new(&MinimapConfig::default(), Some(corner(10)), Some(corner(240)));
        let mut frame = Frame::filled(800, 600, Rgb::BLACK);
        frame.paste(&corner(10), Point::new(10, 10));
        frame.paste(&corner(240), Point::new(150, 120));
        marker_block(&mut frame, 60, 60, PLAYER_MARKER);

        assert_eq!(analyzer.player_location(&frame), Some(Point::new(61, 61)));
        assert!(analyzer.bounds().is_some());
    }

    #[test]
    fn no_bounds_no_templates_is_none() {
        let analyzer = MinimapAnalyzer::new(&MinimapConfig::default(), None, None);
        let mut frame = Frame::filled(100, 100, Rgb::BLACK);
        marker_block(&mut frame, 10, 10, PLAYER_MARKER);
        assert_eq!(analyzer.player_location(&frame), None);
    }
}
