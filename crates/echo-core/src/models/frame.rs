//! 캡처 프레임과 템플릿 이미지 모델.
//!
//! 픽셀은 3바이트(R, G, B) 순서로 저장된다. 행 간격(stride)의 부호가
//! 저장 방향을 나타내며, 음수면 마지막 행부터 저장된 bottom-up 버퍼다.
//! 스캔 코드는 [`Frame::layout`]으로 방향을 한 번만 해석한 뒤
//! 행 오프셋 함수로 바이트 슬라이스에 접근한다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::geometry::{Point, Region};

/// 픽셀당 바이트 수
pub const BYTES_PER_PIXEL: usize = 3;

/// 채널 순서가 고정된 색상
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// 3바이트 픽셀 슬라이스에서 색상 추출
    pub fn from_pixel(px: &[u8]) -> Self {
        Self::new(px[0], px[1], px[2])
    }

    pub const fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// 스캔 1회 동안 고정되는 행 배치 정보
#[derive(Debug, Clone, Copy)]
pub struct RowLayout {
    stride: usize,
    height: u32,
    bottom_up: bool,
}

impl RowLayout {
    /// 논리 행 `y`(위에서부터)의 바이트 오프셋
    #[inline]
    pub fn offset(&self, y: u32) -> usize {
        let stored = if self.bottom_up {
            self.height - 1 - y
        } else {
            y
        };
        stored as usize * self.stride
    }
}

/// 한 번 캡처된 불변 픽셀 스냅샷
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    stride: i32,
}

impl Frame {
    /// 원시 버퍼로 프레임 생성. 버퍼 길이와 stride를 검증한다.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, stride: i32) -> Result<Self, CoreError> {
        let row_bytes = width as usize * BYTES_PER_PIXEL;
        let abs_stride = stride.unsigned_abs() as usize;
        if abs_stride < row_bytes {
            return Err(CoreError::Validation {
                field: "stride".to_string(),
                message: format!("|stride| {abs_stride} < 행 바이트 {row_bytes}"),
            });
        }
        let needed = abs_stride * height as usize;
        if pixels.len() < needed {
            return Err(CoreError::Validation {
                field: "pixels".to_string(),
                message: format!("버퍼 {}바이트 < 필요 {needed}바이트", pixels.len()),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
            stride,
        })
    }

    /// 빈틈 없는 top-down RGB 버퍼로 프레임 생성
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, CoreError> {
        let stride = i32::try_from(width as usize * BYTES_PER_PIXEL).map_err(|_| {
            CoreError::Validation {
                field: "width".to_string(),
                message: format!("너비 {width} 초과"),
            }
        })?;
        Self::new(pixels, width, height, stride)
    }

    /// 캡처 결과(RGBA)에서 알파 채널을 버리고 프레임 생성
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self, CoreError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(CoreError::Validation {
                field: "rgba".to_string(),
                message: format!("버퍼 {}바이트 != 기대 {expected}바이트", rgba.len()),
            });
        }
        let pixels = rgba
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        Self::from_rgb(width, height, pixels)
    }

    /// 단색 프레임
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        let pixels = color
            .channels()
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * BYTES_PER_PIXEL)
            .collect();
        Self {
            pixels,
            width,
            height,
            stride: (width as usize * BYTES_PER_PIXEL) as i32,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> i32 {
        self.stride
    }

    pub fn is_bottom_up(&self) -> bool {
        self.stride < 0
    }

    pub fn bounds(&self) -> Region {
        Region::full(self.width, self.height)
    }

    /// 원시 바이트 (저장 순서 그대로)
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// 저장 방향을 해석한 행 배치
    pub fn layout(&self) -> RowLayout {
        RowLayout {
            stride: self.stride.unsigned_abs() as usize,
            height: self.height,
            bottom_up: self.is_bottom_up(),
        }
    }

    /// 논리 행 `y`의 픽셀 바이트 (width * 3)
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = self.layout().offset(y);
        self.pixels
            .get(start..start + self.width as usize * BYTES_PER_PIXEL)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width {
            return None;
        }
        let row = self.row(y)?;
        let i = x as usize * BYTES_PER_PIXEL;
        Some(Rgb::from_pixel(&row[i..i + BYTES_PER_PIXEL]))
    }

    /// 픽셀 하나를 덮어쓴다. 범위 밖이면 false.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgb) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let i = self.layout().offset(y) + x as usize * BYTES_PER_PIXEL;
        self.pixels[i..i + BYTES_PER_PIXEL].copy_from_slice(&color.channels());
        true
    }

    /// 템플릿을 `at` 위치에 그대로 붙여 넣는다 (프레임 밖은 잘림)
    pub fn paste(&mut self, template: &Template, at: Point) {
        for ty in 0..template.height() {
            for tx in 0..template.width() {
                let (x, y) = (at.x + tx as i32, at.y + ty as i32);
                if x < 0 || y < 0 {
                    continue;
                }
                if let Some(color) = template.pixel(tx, ty) {
                    self.set_pixel(x as u32, y as u32, color);
                }
            }
        }
    }

    /// 영역을 잘라 top-down 프레임으로 복사. 교집합이 비면 None.
    pub fn crop(&self, region: Region) -> Option<Frame> {
        let area = region.clamp_to(self.width, self.height);
        if area.is_empty() {
            return None;
        }
        let layout = self.layout();
        let row_bytes = area.width as usize * BYTES_PER_PIXEL;
        let mut pixels = Vec::with_capacity(row_bytes * area.height as usize);
        for y in area.y..area.bottom() {
            let start = layout.offset(y as u32) + area.x as usize * BYTES_PER_PIXEL;
            pixels.extend_from_slice(&self.pixels[start..start + row_bytes]);
        }
        Some(Frame {
            pixels,
            width: area.width as u32,
            height: area.height as u32,
            stride: row_bytes as i32,
        })
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .finish_non_exhaustive()
    }
}

/// 프레임 안에서 찾을 작은 참조 이미지 (top-down, 빈틈 없음)
#[derive(Clone, PartialEq, Eq)]
pub struct Template {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl Template {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, CoreError> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(CoreError::Validation {
                field: "template".to_string(),
                message: format!("버퍼 {}바이트 != 기대 {expected}바이트", pixels.len()),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    /// 단색 템플릿
    pub fn solid(width: u32, height: u32, color: Rgb) -> Self {
        let frame = Frame::filled(width, height, color);
        Self {
            pixels: frame.pixels,
            width,
            height,
        }
    }

    /// 프레임의 일부 영역을 템플릿으로 복사
    pub fn from_frame(frame: &Frame, region: Region) -> Option<Self> {
        let cropped = frame.crop(region)?;
        Some(Self {
            width: cropped.width,
            height: cropped.height,
            pixels: cropped.pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let row_bytes = self.width as usize * BYTES_PER_PIXEL;
        let start = y as usize * row_bytes;
        &self.pixels[start..start + row_bytes]
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = x as usize * BYTES_PER_PIXEL;
        Some(Rgb::from_pixel(&self.row(y)[i..i + BYTES_PER_PIXEL]))
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
