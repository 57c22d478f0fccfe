//! 픽셀 매칭 엔진.
//!
//! 공유 상태 없는 순수 함수 3종:
//! - [`find_template`]: 허용 오차 기반 부분 이미지 검색
//! - [`color_coverage`]: 격자 샘플링 색상 점유율
//! - [`color_centroid`]: 정확히 일치하는 색상의 무게중심
//!
//! "찾지 못함"은 에러가 아니라 `None`/`false` 반환값이다.
//! 행 배치는 스캔마다 한 번 [`Frame::layout`]으로 해석하고,
//! 픽셀 접근은 바이트 슬라이스 인덱싱으로만 한다.

use echo_core::models::frame::{Frame, Rgb, Template, BYTES_PER_PIXEL};
use echo_core::models::geometry::{Point, Region};

/// 색상 점유율 기본 채널 허용 오차
pub const DEFAULT_TOLERANCE: f64 = 0.10;

/// 색상 점유율 샘플링 격자 (축당 샘플 수)
pub const COVERAGE_GRID: u32 = 20;

/// 무게중심 최소 일치 픽셀 수 기본값
pub const DEFAULT_MIN_HITS: u32 = 8;

/// 허용 오차(0.0~1.0)를 채널당 최대 차이로 변환: floor(255 × tolerance)
pub fn channel_margin(tolerance: f64) -> i32 {
    (255.0 * tolerance).floor().clamp(0.0, 255.0) as i32
}

#[inline]
fn channels_within(a: &[u8], b: &[u8], margin: i32) -> bool {
    (i32::from(a[0]) - i32::from(b[0])).abs() <= margin
        && (i32::from(a[1]) - i32::from(b[1])).abs() <= margin
        && (i32::from(a[2]) - i32::from(b[2])).abs() <= margin
}

/// 두 행의 모든 픽셀이 허용 오차 안인지. 첫 불일치에서 종료.
#[inline]
fn rows_match(frame_row: &[u8], template_row: &[u8], margin: i32) -> bool {
    frame_row
        .chunks_exact(BYTES_PER_PIXEL)
        .zip(template_row.chunks_exact(BYTES_PER_PIXEL))
        .all(|(a, b)| channels_within(a, b, margin))
}

/// 프레임에서 템플릿 위치 검색.
///
/// 검색 영역(기본: 프레임 전체)을 프레임 경계로 자르고, 영역이 템플릿보다
/// 작으면 `None`. 후보 좌상단을 행 우선 순서로 훑어 모든 픽셀이 일치하는
/// 첫 위치를 반환한다.
pub fn find_template(
    frame: &Frame,
    template: &Template,
    tolerance: f64,
    region: Option<Region>,
) -> Option<Point> {
    let area = region
        .unwrap_or_else(|| frame.bounds())
        .clamp_to(frame.width(), frame.height());
    let tw = i32::try_from(template.width()).ok()?;
    let th = i32::try_from(template.height()).ok()?;
    if tw == 0 || th == 0 || area.width < tw || area.height < th {
        return None;
    }

    let margin = channel_margin(tolerance);
    let layout = frame.layout();
    let bytes = frame.as_bytes();
    let row_len = tw as usize * BYTES_PER_PIXEL;

    for y in area.y..=area.bottom() - th {
        'candidate: for x in area.x..=area.right() - tw {
            let column = x as usize * BYTES_PER_PIXEL;
            for ty in 0..th {
                let start = layout.offset((y + ty) as u32) + column;
                let frame_row = &bytes[start..start + row_len];
                if !rows_match(frame_row, template.row(ty as u32), margin) {
                    continue 'candidate;
                }
            }
            return Some(Point::new(x, y));
        }
    }
    None
}

/// 프레임 전체에서 목표 색상이 차지하는 비율이 `required_fraction` 이상인지.
///
/// 모든 픽셀 대신 축당 약 20개(step = max(1, 크기/20))의 격자를 샘플링한다.
pub fn color_coverage(frame: &Frame, target: Rgb, required_fraction: f64, tolerance: f64) -> bool {
    let step_x = (frame.width() / COVERAGE_GRID).max(1) as usize;
    let step_y = (frame.height() / COVERAGE_GRID).max(1) as usize;
    let margin = channel_margin(tolerance);
    let target = target.channels();
    let layout = frame.layout();
    let bytes = frame.as_bytes();

    let mut hits = 0u64;
    let mut total = 0u64;
    for y in (0..frame.height()).step_by(step_y) {
        let row = layout.offset(y);
        for x in (0..frame.width() as usize).step_by(step_x) {
            let i = row + x * BYTES_PER_PIXEL;
            if channels_within(&bytes[i..i + BYTES_PER_PIXEL], &target, margin) {
                hits += 1;
            }
            total += 1;
        }
    }

    if total == 0 {
        return false;
    }
    hits as f64 >= total as f64 * required_fraction
}

/// 영역 안에서 목표 색상과 정확히 같은 픽셀들의 무게중심.
///
/// 일치 개수가 `min_hits` 미만이면 `None`. 좌표 평균은 정수 나눗셈으로 자른다.
pub fn color_centroid(frame: &Frame, target: Rgb, region: Region, min_hits: u32) -> Option<Point> {
    let area = region.clamp_to(frame.width(), frame.height());
    if area.is_empty() {
        return None;
    }
    let target = target.channels();
    let layout = frame.layout();
    let bytes = frame.as_bytes();
    let row_len = area.width as usize * BYTES_PER_PIXEL;

    let (mut sum_x, mut sum_y, mut count) = (0i64, 0i64, 0i64);
    for y in area.y..area.bottom() {
        let start = layout.offset(y as u32) + area.x as usize * BYTES_PER_PIXEL;
        for (dx, px) in bytes[start..start + row_len]
            .chunks_exact(BYTES_PER_PIXEL)
            .enumerate()
        {
            if px == target.as_slice() {
                sum_x += i64::from(area.x) + dx as i64;
                sum_y += i64::from(y);
                count += 1;
            }
        }
    }

    if count == 0 || count < i64::from(min_hits) {
        return None;
    }
    Some(Point::new((sum_x / count) as i32, (sum_y / count) as i32))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: Rgb = Rgb::new(0xFE, 0xEF, 0x00);

    fn checker_template() -> Template {
        let pixels = vec![
            10, 20, 30, 200, 100, 50, //
            90, 90, 90, 0, 255, 0,
        ];
        Template::new(2, 2, pixels).unwrap()
    }

    fn to_bottom_up(frame: &Frame) -> Frame {
        let mut stored = Vec::new();
        for y in (0..frame.height()).rev() {
            stored.extend_from_slice(frame.row(y).unwrap());
        }
        Frame::new(stored, frame.width(), frame.height(), -(frame.width() as i32 * 3)).unwrap()
    }

    // ── find_template ──

    #[test]
    fn finds_pasted_template() {
        let template = checker_template();
        let mut frame = Frame::filled(40, 30, Rgb::BLACK);
        frame.paste(&template, Point::new(17, 9));
        assert_eq!(find_template(&frame, &template, 0.0, None), Some(Point::new(17, 9)));
    }

    #[test]
    fn returns_first_in_row_major_order() {
        let template = checker_template();
        let mut frame = Frame::filled(40, 30, Rgb::BLACK);
        frame.paste(&template, Point::new(30, 20));
        frame.paste(&template, Point::new(2, 12));
        frame.paste(&template, Point::new(25, 12));
        // 같은 행이면 왼쪽, 다른 행이면 위쪽이 먼저
        assert_eq!(find_template(&frame, &template, 0.0, None), Some(Point::new(2, 12)));
    }

    #[test]
    fn absent_template_is_none() {
        let frame = Frame::filled(20, 20, Rgb::BLACK);
        assert_eq!(find_template(&frame, &checker_template(), 0.0, None), None);
    }

    #[test]
    fn tolerance_allows_small_drift() {
        let template = Template::solid(3, 3, Rgb::new(100, 100, 100));
        let mut frame = Frame::filled(10, 10, Rgb::BLACK);
        frame.paste(&Template::solid(3, 3, Rgb::new(120, 90, 110)), Point::new(4, 4));

        // 차이 20 → margin floor(255*0.05)=12 로는 불일치, floor(255*0.1)=25 로는 일치
        assert_eq!(find_template(&frame, &template, 0.05, None), None);
        assert_eq!(find_template(&frame, &template, 0.10, None), Some(Point::new(4, 4)));
    }

    #[test]
    fn region_limits_search() {
        let template = checker_template();
        let mut frame = Frame::filled(40, 30, Rgb::BLACK);
        frame.paste(&template, Point::new(2, 2));
        frame.paste(&template, Point::new(30, 20));

        let region = Region::new(20, 15, 20, 15);
        assert_eq!(
            find_template(&frame, &template, 0.0, Some(region)),
            Some(Point::new(30, 20))
        );
    }

    #[test]
    fn region_smaller_than_template_is_none() {
        let template = Template::solid(5, 5, Rgb::BLACK);
        let frame = Frame::filled(40, 30, Rgb::BLACK);
        assert_eq!(
            find_template(&frame, &template, 0.0, Some(Region::new(0, 0, 4, 10))),
            None
        );
        // 프레임 밖으로 나간 영역은 잘린 뒤 너무 작아짐
        assert_eq!(
            find_template(&frame, &template, 0.0, Some(Region::new(37, 0, 10, 10))),
            None
        );
    }

    #[test]
    fn bottom_up_frame_matches_same_coordinates() {
        let template = checker_template();
        let mut frame = Frame::filled(16, 12, Rgb::WHITE);
        frame.paste(&template, Point::new(5, 3));
        let flipped = to_bottom_up(&frame);
        assert_eq!(find_template(&flipped, &template, 0.0, None), Some(Point::new(5, 3)));
    }

    // ── color_coverage ──

    #[test]
    fn sparse_block_below_fraction() {
        let mut frame = Frame::filled(100, 100, Rgb::BLACK);
        for y in 10..=12 {
            for x in 10..=12 {
                frame.set_pixel(x, y, Rgb::WHITE);
            }
        }
        // step 5 → 400 샘플 중 (10,10) 하나만 적중, 1/400 < 0.05
        assert!(!color_coverage(&frame, Rgb::WHITE, 0.05, DEFAULT_TOLERANCE));
        assert!(color_coverage(&frame, Rgb::WHITE, 0.002, DEFAULT_TOLERANCE));
    }

    #[test]
    fn full_black_frame_is_covered() {
        let frame = Frame::filled(64, 48, Rgb::new(8, 8, 8));
        assert!(color_coverage(&frame, Rgb::BLACK, 0.8, DEFAULT_TOLERANCE));
        assert!(!color_coverage(&frame, Rgb::WHITE, 0.1, DEFAULT_TOLERANCE));
    }

    #[test]
    fn tiny_frame_uses_step_one() {
        let mut frame = Frame::filled(4, 4, Rgb::BLACK);
        frame.set_pixel(0, 0, Rgb::WHITE);
        frame.set_pixel(3, 3, Rgb::WHITE);
        // 16 샘플 중 2개
        assert!(color_coverage(&frame, Rgb::WHITE, 2.0 / 16.0, 0.0));
        assert!(!color_coverage(&frame, Rgb::WHITE, 3.0 / 16.0, 0.0));
    }

    #[test]
    fn empty_frame_is_not_covered() {
        let frame = Frame::filled(0, 0, Rgb::WHITE);
        assert!(!color_coverage(&frame, Rgb::WHITE, 0.0, DEFAULT_TOLERANCE));
    }

    // ── color_centroid ──

    fn paint(frame: &mut Frame, points: &[(u32, u32)], color: Rgb) {
        for &(x, y) in points {
            frame.set_pixel(x, y, color);
        }
    }

    const EIGHT: [(u32, u32); 8] = [(5, 5), (5, 6), (5, 7), (6, 5), (6, 6), (6, 7), (7, 5), (7, 6)];

    #[test]
    fn centroid_truncates_average() {
        let mut frame = Frame::filled(20, 20, Rgb::BLACK);
        paint(&mut frame, &EIGHT, MARKER);
        // 평균 (5.875, 5.875) → (5, 5)
        assert_eq!(
            color_centroid(&frame, MARKER, frame.bounds(), 8),
            Some(Point::new(5, 5))
        );
    }

    #[test]
    fn centroid_below_min_hits_is_none() {
        let mut frame = Frame::filled(20, 20, Rgb::BLACK);
        paint(&mut frame, &EIGHT[..7], MARKER);
        assert_eq!(color_centroid(&frame, MARKER, frame.bounds(), 8), None);
    }

    #[test]
    fn centroid_requires_exact_color() {
        let mut frame = Frame::filled(20, 20, Rgb::BLACK);
        paint(&mut frame, &EIGHT, Rgb::new(0xFE, 0xEF, 0x01));
        assert_eq!(color_centroid(&frame, MARKER, frame.bounds(), 1), None);
    }

    #[test]
    fn centroid_respects_region() {
        let mut frame = Frame::filled(40, 40, Rgb::BLACK);
        paint(&mut frame, &EIGHT, MARKER);
        let far: Vec<(u32, u32)> = EIGHT.iter().map(|&(x, y)| (x + 25, y + 25)).collect();
        paint(&mut frame, &far, MARKER);

        assert_eq!(
            color_centroid(&frame, MARKER, Region::new(20, 20, 20, 20), 8),
            Some(Point::new(30, 30))
        );
        assert_eq!(color_centroid(&frame, MARKER, Region::new(50, 50, 5, 5), 0), None);
    }

    #[test]
    fn centroid_on_bottom_up_frame() {
        let mut frame = Frame::filled(20, 20, Rgb::BLACK);
        paint(&mut frame, &EIGHT, MARKER);
        let flipped = to_bottom_up(&frame);
        assert_eq!(
            color_centroid(&flipped, MARKER, flipped.bounds(), 8),
            Some(Point::new(5, 5))
        );
    }

    #[test]
    fn margin_is_floored() {
        assert_eq!(channel_margin(0.10), 25);
        assert_eq!(channel_margin(0.4), 102);
        assert_eq!(channel_margin(0.0), 0);
        assert_eq!(channel_margin(2.0), 255);
    }
}
