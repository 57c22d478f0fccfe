//! 좌표와 직사각형 영역.

use serde::{Deserialize, Serialize};

/// 픽셀 좌표 (프레임 또는 클라이언트 영역 기준)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// 좌표 평행 이동. i32 범위 끝에서 포화한다.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// 직사각형 영역.
///
/// 음수 원점이나 프레임을 벗어나는 크기도 표현할 수 있으며,
/// 사용 전에 항상 [`Region::clamp_to`]로 프레임 경계와 교차시킨다.
/// 너비나 높이가 0 이하인 영역은 "영역 없음"을 뜻하는 유효한 값이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// (0, 0)에서 시작하는 전체 크기 영역
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, saturate(width), saturate(height))
    }

    /// 오른쪽 경계 (배타). i32 범위 끝에서 포화한다.
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// 두 영역의 교집합. 겹치지 않으면 빈 영역.
    pub fn intersect(&self, other: &Region) -> Region {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return Region::default();
        }
        Region::new(
            left,
            top,
            right.saturating_sub(left),
            bottom.saturating_sub(top),
        )
    }

    /// width x height 프레임 경계로 자른 영역
    pub fn clamp_to(&self, width: u32, height: u32) -> Region {
        self.intersect(&Region::full(width, height))
    }
}

fn saturate(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_overlapping() {
        let a = Region::new(0, 0, 10, 10);
        let b = Region::new(5, 5, 10, 10);
        assert_eq!(a.intersect(&b), Region::new(5, 5, 5, 5));
    }

    #[test]
    fn intersect_disjoint_is_empty() {
        let a = Region::new(0, 0, 10, 10);
        let b = Region::new(20, 20, 5, 5);
        assert!(a.intersect(&b).is_empty());
    }

    #[test]
    fn clamp_negative_origin() {
        // 작은 프레임에서 (w-400, 0, 400, 75) 같은 영역이 음수 원점을 가질 수 있음
        let r = Region::new(-200, 0, 400, 75).clamp_to(300, 50);
        assert_eq!(r, Region::new(0, 0, 200, 50));
    }

    #[test]
    fn contains_is_half_open() {
        let r = Region::new(2, 2, 3, 3);
        assert!(r.contains(Point::new(2, 2)));
        assert!(r.contains(Point::new(4, 4)));
        assert!(!r.contains(Point::new(5, 4)));
    }

    #[test]
    fn edges_saturate_near_i32_max() {
        // 설정 파일의 큰 값이 오버플로 없이 프레임 밖 영역으로 처리됨
        let huge = Region::new(i32::MAX - 5, i32::MAX - 5, 100, 100);
        assert_eq!(huge.right(), i32::MAX);
        assert_eq!(huge.bottom(), i32::MAX);
        assert!(huge.clamp_to(200, 200).is_empty());
        assert!(!huge.contains(Point::new(i32::MAX, 0)));

        let wide = Region::new(i32::MIN, 0, i32::MAX, 10);
        assert_eq!(wide.clamp_to(200, 200), Region::default());

        assert_eq!(
            Point::new(i32::MAX - 1, i32::MIN + 1).offset(10, -10),
            Point::new(i32::MAX, i32::MIN)
        );
    }
}
