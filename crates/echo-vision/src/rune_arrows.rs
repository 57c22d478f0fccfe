//! 룬 화살표 판독.
//!
//! 화살표는 붉은색에서 시작해 약 30px에 걸쳐 초록색으로 변하는 그라데이션이다.
//! 잘라낸 영역을 HSV로 변환한 뒤, 붉은 기준점마다 네 방향으로 그라데이션을
//! 따라가 초록색에 도달하는 방향을 찾는다. 기준점은 x 우선 순서로 훑는다.

use echo_core::models::frame::Frame;
use echo_core::models::geometry::{Point, Region};
use echo_core::models::input::Key;

/// 그라데이션 최대 길이 (px)
const GRADIENT_STEPS: u32 = 30;
/// 인접 픽셀 간 허용 색상 차
const HUE_STEP_LIMIT: f64 = 20.0;
/// 이미 찾은 화살표 주변 무시 반경 (px)
const NEAR_RADIUS: i32 = 25;

/// 화살표 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrowDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ArrowDirection {
    /// 입력할 방향키
    pub fn to_key(self) -> Key {
        match self {
            ArrowDirection::Up => Key::Up,
            ArrowDirection::Down => Key::Down,
            ArrowDirection::Left => Key::Left,
            ArrowDirection::Right => Key::Right,
        }
    }
}

/// 판독된 화살표 하나 (기준점은 프레임 좌표)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrowReading {
    pub direction: ArrowDirection,
    pub anchor: Point,
}

#[derive(Debug, Clone, Copy, Default)]
struct Hsv {
    h: f64,
    s: f64,
    v: f64,
}

impl Hsv {
    fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let s = if max == 0 {
            0.0
        } else {
            1.0 - f64::from(min) / f64::from(max)
        };
        Self {
            h: hue(r, g, b),
            s,
            v: f64::from(max) / 255.0,
        }
    }

    fn is_red(&self) -> bool {
        ((0.0..=30.0).contains(&self.h) || (300.0..=360.0).contains(&self.h))
            && self.s >= 0.8
            && self.v >= 0.8
    }

    fn is_green(&self) -> bool {
        (60.0..=140.0).contains(&self.h)
    }

    /// `self`에서 `next`로 그라데이션이 이어지는지
    fn continues_to(&self, next: &Hsv) -> bool {
        self.h - next.h <= HUE_STEP_LIMIT && next.s >= 0.6 && next.v >= 0.6 && next.h <= 140.0
    }
}

/// 색상각 (0~360). 무채색은 0.
fn hue(r: u8, g: u8, b: u8) -> f64 {
    if r == g && g == b {
        return 0.0;
    }
    let (r, g, b) = (
        f64::from(r) / 255.0,
        f64::from(g) / 255.0,
        f64::from(b) / 255.0,
    );
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let sector = if r == max {
        (g - b) / delta
    } else if g == max {
        2.0 + (b - r) / delta
    } else {
        4.0 + (r - g) / delta
    };
    let degrees = sector * 60.0;
    if degrees < 0.0 {
        degrees + 360.0
    } else {
        degrees
    }
}

struct HsvMap {
    width: i32,
    height: i32,
    cells: Vec<Hsv>,
}

impl HsvMap {
    fn from_frame(frame: &Frame) -> Self {
        let mut cells = Vec::with_capacity(frame.width() as usize * frame.height() as usize);
        for y in 0..frame.height() {
            if let Some(row) = frame.row(y) {
                cells.extend(row.chunks_exact(3).map(|px| Hsv::from_rgb(px[0], px[1], px[2])));
            }
        }
        Self {
            width: frame.width() as i32,
            height: frame.height() as i32,
            cells,
        }
    }

    fn get(&self, x: i32, y: i32) -> Option<&Hsv> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get((y * self.width + x) as usize)
    }
}

struct ArrowScan<'a> {
    map: &'a HsvMap,
    found: Vec<Point>,
}

impl ArrowScan<'_> {
    fn near_found(&self, x: i32, y: i32) -> bool {
        self.found
            .iter()
            .any(|p| (p.x - x).abs() < NEAR_RADIUS && (p.y - y).abs() < NEAR_RADIUS)
    }

    /// (x, y)에서 (dx, dy) 방향으로 초록색까지 이어지는 그라데이션이 있는지
    fn gradient_exists(&mut self, x: i32, y: i32, dx: i32, dy: i32) -> bool {
        if self.near_found(x, y) {
            return false;
        }
        let (mut cx, mut cy) = (x, y);
        for _ in 0..GRADIENT_STEPS {
            let (nx, ny) = (cx + dx, cy + dy);
            let (Some(current), Some(next)) = (self.map.get(cx, cy), self.map.get(nx, ny)) else {
                return false;
            };
            if !current.continues_to(next) {
                return false;
            }
            if next.is_green() {
                self.found.push(Point::new(x, y));
                return true;
            }
            cx = nx;
            cy = ny;
        }
        false
    }

    /// 그라데이션이 뻗은 방향의 반대가 화살표 방향이다
    fn direction_at(&mut self, x: i32, y: i32) -> Option<ArrowDirection> {
        const PROBES: [(i32, i32, ArrowDirection); 4] = [
            (-1, 0, ArrowDirection::Right),
            (1, 0, ArrowDirection::Left),
            (0, -1, ArrowDirection::Down),
            (0, 1, ArrowDirection::Up),
        ];
        PROBES
            .iter()
            .find(|(dx, dy, _)| self.gradient_exists(x, y, *dx, *dy))
            .map(|(_, _, direction)| *direction)
    }
}

/// 프레임의 `region` 안에서 화살표들을 판독한다.
pub fn read_arrows(frame: &Frame, region: Region) -> Vec<ArrowReading> {
    let Some(cropped) = frame.crop(region) else {
        return Vec::new();
    };
    let origin = region.clamp_to(frame.width(), frame.height()).origin();
    let map = HsvMap::from_frame(&cropped);
    let mut scan = ArrowScan {
        map: &map,
        found: Vec::new(),
    };

    let mut readings = Vec::new();
    for x in 0..map.width {
        for y in 0..map.height {
            let is_red = map.get(x, y).is_some_and(Hsv::is_red);
            if !is_red || scan.near_found(x, y) {
                continue;
            }
            if let Some(direction) = scan.direction_at(x, y) {
                readings.push(ArrowReading {
                    direction,
                    anchor: origin.offset(x, y),
                });
            }
        }
    }
    readings
}

#[cfg(test)]
mod tests {
    use super::*;
    use echo_core::models::frame::Rgb;

    /// 채도·명도 1인 색상각 → RGB
    fn hue_color(h: f64) -> Rgb {
        let sector = (h / 60.0) % 6.0;
        let f = sector - sector.floor();
        let up = (255.0 * f).round() as u8;
        let down = (255.0 * (1.0 - f)).round() as u8;
        match sector.floor() as u32 {
            0 => Rgb::new(255, up, 0),
            1 => Rgb::new(down, 255, 0),
            2 => Rgb::new(0, 255, up),
            3 => Rgb::new(0, down, 255),
            4 => Rgb::new(up, 0, 255),
            _ => Rgb::new(255, 0, down),
        }
    }

    /// 기준점(빨강)에서 (dx, dy) 방향으로 초록까지 이어지는 그라데이션
    fn draw_arrow(frame: &mut Frame, anchor: (i32, i32), dx: i32, dy: i32) {
        for k in 0..=10 {
            let (x, y) = (anchor.0 + dx * k, anchor.1 + dy * k);
            frame.set_pixel(x as u32, y as u32, hue_color(12.0 * k as f64));
        }
    }

    #[test]
    fn hue_matches_reference_values() {
        assert_eq!(hue(255, 0, 0), 0.0);
        assert_eq!(hue(255, 255, 0), 60.0);
        assert_eq!(hue(0, 255, 0), 120.0);
        assert_eq!(hue(255, 0, 255), 300.0);
        assert_eq!(hue(40, 40, 40), 0.0);
    }

    #[test]
    fn red_requires_saturation_and_value() {
        assert!(Hsv::from_rgb(255, 20, 20).is_red());
        assert!(Hsv::from_rgb(250, 0, 60).is_red());
        // 어두운 빨강
        assert!(!Hsv::from_rgb(120, 0, 0).is_red());
        // 흐린 빨강
        assert!(!Hsv::from_rgb(255, 150, 150).is_red());
    }

    #[test]
    fn reads_four_arrows_in_scan_order() {
        let mut frame = Frame::filled(200, 40, Rgb::BLACK);
        draw_arrow(&mut frame, (40, 10), -1, 0);
        draw_arrow(&mut frame, (80, 10), 1, 0);
        draw_arrow(&mut frame, (120, 5), 0, 1);
        draw_arrow(&mut frame, (160, 30), 0, -1);

        let readings = read_arrows(&frame, frame.bounds());
        let directions: Vec<_> = readings.iter().map(|r| r.direction).collect();
        assert_eq!(
            directions,
            vec![
                ArrowDirection::Right,
                ArrowDirection::Left,
                ArrowDirection::Up,
                ArrowDirection::Down,
            ]
        );
    }

    #[test]
    fn anchors_are_in_frame_coordinates() {
        let mut frame = Frame::filled(120, 60, Rgb::BLACK);
        draw_arrow(&mut frame, (70, 30), 1, 0);

        let readings = read_arrows(&frame, Region::new(50, 20, 60, 30));
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].direction, ArrowDirection::Left);
        assert_eq!(readings[0].anchor, Point::new(70, 30));
    }

    #[test]
    fn red_without_gradient_is_ignored() {
        let mut frame = Frame::filled(60, 60, Rgb::BLACK);
        for x in 10..20 {
            frame.set_pixel(x, 10, Rgb::new(255, 0, 0));
        }
        assert!(read_arrows(&frame, frame.bounds()).is_empty());
    }

    #[test]
    fn region_outside_frame_is_empty() {
        let frame = Frame::filled(50, 50, Rgb::BLACK);
        assert!(read_arrows(&frame, Region::new(630, 280, 570, 200)).is_empty());
    }

    #[test]
    fn direction_keys() {
        assert_eq!(ArrowDirection::Up.to_key(), Key::Up);
        assert_eq!(ArrowDirection::Right.to_key(), Key::Right);
    }
}
