//! 템플릿 이미지 로드.
//!
//! 참조 PNG를 한 번 읽어 불변 [`Template`]으로 보관한다.
//! 필수 템플릿이 없으면 시작 시점에 실패하고, 선택 템플릿은 없으면 해당
//! 체커가 감지를 하지 않는다.

use std::path::Path;

use echo_core::error::CoreError;
use echo_core::models::frame::Template;
use tracing::{debug, info};

pub const RUNE_COOLDOWN_TOP: &str = "rune_cd_icon_top.png";
pub const RUNE_COOLDOWN_BOTTOM: &str = "rune_cd_icon_bot.png";
pub const MINIMAP_TOP_LEFT: &str = "minimap_tl.png";
pub const MINIMAP_BOTTOM_RIGHT: &str = "minimap_br.png";
pub const RESPAWN_DIALOG: &str = "respawnok.png";
pub const BUFF_ACTIVE: &str = "buff_icon.png";
pub const BUFF_READY: &str = "buff_ready_icon.png";
pub const LOCATION_NAME: &str = "location_name.png";
pub const WORLD_MAP_TARGET: &str = "world_map_target.png";

/// 이미지 파일 하나를 RGB 템플릿으로 로드
pub fn load_template(path: &Path) -> Result<Template, CoreError> {
    let image = image::open(path).map_err(|e| CoreError::Template {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    debug!(path = %path.display(), width, height, "템플릿 로드");
    Template::new(width, height, rgb.into_raw())
}

fn load_optional(dir: &Path, name: &str) -> Result<Option<Template>, CoreError> {
    let path = dir.join(name);
    if !path.exists() {
        debug!(path = %path.display(), "선택 템플릿 없음");
        return Ok(None);
    }
    load_template(&path).map(Some)
}

/// 분석기와 핸들러가 사용하는 템플릿 묶음
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    pub rune_cooldown_top: Option<Template>,
    pub rune_cooldown_bottom: Option<Template>,
    pub minimap_top_left: Option<Template>,
    pub minimap_bottom_right: Option<Template>,
    pub respawn_dialog: Option<Template>,
    pub buff_active: Option<Template>,
    pub buff_ready: Option<Template>,
    pub location_name: Option<Template>,
    pub world_map_target: Option<Template>,
}

impl TemplateLibrary {
    /// 디렉토리에서 로드. 필수 템플릿(미니맵 모서리, 부활 대화상자)이 없으면 에러.
    pub fn load(dir: &Path) -> Result<Self, CoreError> {
        let required = |name: &str| load_template(&dir.join(name)).map(Some);
        let library = Self {
            rune_cooldown_top: load_optional(dir, RUNE_COOLDOWN_TOP)?,
            rune_cooldown_bottom: load_optional(dir, RUNE_COOLDOWN_BOTTOM)?,
            minimap_top_left: required(MINIMAP_TOP_LEFT)?,
            minimap_bottom_right: required(MINIMAP_BOTTOM_RIGHT)?,
            respawn_dialog: required(RESPAWN_DIALOG)?,
            buff_active: load_optional(dir, BUFF_ACTIVE)?,
            buff_ready: load_optional(dir, BUFF_READY)?,
            location_name: load_optional(dir, LOCATION_NAME)?,
            world_map_target: load_optional(dir, WORLD_MAP_TARGET)?,
        };
        info!(dir = %dir.display(), loaded = library.loaded_count(), "템플릿 로드 완료");
        Ok(library)
    }

    fn loaded_count(&self) -> usize {
        [
            &self.rune_cooldown_top,
            &self.rune_cooldown_bottom,
            &self.minimap_top_left,
            &self.minimap_bottom_right,
            &self.respawn_dialog,
            &self.buff_active,
            &self.buff_ready,
            &self.location_name,
            &self.world_map_target,
        ]
        .iter()
        .filter(|t| t.is_some())
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb as ImageRgb, RgbImage};
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| ImageRgb([x as u8, y as u8, 200]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn loads_png_as_rgb_template() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), "t.png", 3, 2);

        let template = load_template(&dir.path().join("t.png")).unwrap();
        assert_eq!((template.width(), template.height()), (3, 2));
        assert_eq!(template.pixel(2, 1).unwrap().channels(), [2, 1, 200]);
    }

    #[test]
    fn missing_file_is_template_error() {
        let dir = TempDir::new().unwrap();
        let result = load_template(&dir.path().join("none.png"));
        assert!(matches!(result, Err(CoreError::Template { .. })));
    }

    #[test]
    fn library_requires_core_templates() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), MINIMAP_TOP_LEFT, 4, 4);
        write_png(dir.path(), MINIMAP_BOTTOM_RIGHT, 4, 4);
        assert!(TemplateLibrary::load(dir.path()).is_err());

        write_png(dir.path(), RESPAWN_DIALOG, 8, 4);
        let library = TemplateLibrary::load(dir.path()).unwrap();
        assert!(library.respawn_dialog.is_some());
        assert!(library.buff_active.is_none());
        assert_eq!(library.loaded_count(), 3);
    }
}
