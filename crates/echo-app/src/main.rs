//! # echo-app
//!
//! Echo 바이너리 진입점.
//! 설정 로드, DI 와이어링, 캡처/포커스/이벤트 루프 기동, 종료 순서 관리.

mod focus;
mod lifecycle;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use echo_automation::events::{
    AdminWarpResponse, BuffRefreshResponse, EntityDefeatedResponse, RuneFailureResponse,
    RuneResponse, WrongLocationResponse,
};
use echo_automation::input_driver::create_platform_input_driver;
use echo_automation::macro_player::MacroPlayer;
use echo_automation::notifier::LogNotifier;
use echo_automation::orchestrator::EventOrchestrator;
use echo_automation::player::PlayerController;
use echo_core::config::AppConfig;
use echo_core::config_manager::ConfigManager;
use echo_core::models::input::Key;
use echo_core::models::sequence::CommandSequence;
use echo_core::ports::capture::WindowSource;
use echo_core::ports::macro_control::MacroControl;
use echo_core::ports::notifier::AlertNotifier;
use echo_vision::analyzers::minimap::MinimapAnalyzer;
use echo_vision::analyzers::rune::RuneAnalyzer;
use echo_vision::analyzers::screen::ScreenAnalyzer;
use echo_vision::capture::XcapWindowSource;
use echo_vision::frame_store::FrameStore;
use echo_vision::templates::TemplateLibrary;

use crate::focus::FocusWatcher;
use crate::lifecycle::LifecycleManager;

/// Echo 화면 인식 자동화 에이전트
///
/// 대상 창을 캡처해 상황을 판단하고, 우선순위가 가장 높은 대응을 하나씩 실행한다.
#[derive(Parser, Debug)]
#[command(name = "echo")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 반복 재생할 명령 시퀀스 JSON 경로
    #[arg(long, short = 's')]
    sequence: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 입력을 실제로 보내지 않고 기록만 한다
    #[arg(long)]
    dry_run: bool,
}

/// 설정 로드 (CLI 경로 우선)
fn load_config(path: Option<PathBuf>) -> Result<Arc<AppConfig>> {
    let manager = match path {
        Some(path) => ConfigManager::with_path(path)?,
        None => ConfigManager::new()?,
    };
    info!("설정 로드: {}", manager.config_path().display());
    Ok(manager.get())
}

/// 시퀀스가 단축키나 주입 가능 키 풀에 없는 키를 쓰면 목록으로 돌려준다
fn unlisted_sequence_keys(config: &AppConfig, sequence: &CommandSequence) -> Vec<Key> {
    let hotkeys = &config.hotkeys;
    let mut known: HashSet<Key> = config.injectable_keys.iter().copied().collect();
    known.extend([
        hotkeys.npc_chat,
        hotkeys.attack,
        hotkeys.jump,
        hotkeys.rope_lift,
        hotkeys.menu,
        hotkeys.map,
        hotkeys.buff,
    ]);

    let mut unlisted = Vec::new();
    for command in &sequence.commands {
        if !known.contains(&command.key) && !unlisted.contains(&command.key) {
            unlisted.push(command.key);
        }
    }
    unlisted
}

/// 대상 창에 포커스가 있을 때만 매크로를 시작한다.
///
/// 포커스가 없으면 포커스 감시의 첫 신호 이후 복귀할 때 오케스트레이터가 재개한다.
async fn resume_if_focused(source: &dyn WindowSource, macro_control: &dyn MacroControl) -> bool {
    let focused = match source.is_focused().await {
        Ok(focused) => focused,
        Err(e) => {
            warn!("포커스 조회 실패: {e}");
            false
        }
    };
    if focused {
        macro_control.resume();
    } else {
        info!("창 포커스 없음, 포커스 복귀 시 매크로 시작");
    }
    focused
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // tracing 초기화
    let log_filter = format!(
        "echo={0},echo_app={0},echo_core={0},echo_vision={0},echo_automation={0}",
        args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    info!("Echo 시작");
    let config = load_config(args.config.clone())?;
    if args.dry_run {
        info!("드라이런 모드: 입력은 기록만 됨");
    }

    let lifecycle = LifecycleManager::new();

    // ── 어댑터 생성 (DI 와이어링) ──

    // 1. 창 캡처
    let source: Arc<dyn WindowSource> = Arc::new(XcapWindowSource::new(config.window.title.clone()));
    info!(title = %config.window.title, "대상 창");

    // 2. 프레임 저장소
    let frames = Arc::new(FrameStore::new(source.clone(), config.capture_interval()));

    // 3. 템플릿
    let templates = TemplateLibrary::load(&config.templates.dir)
        .with_context(|| format!("템플릿 로드 실패: {}", config.templates.dir.display()))?;

    // 4. 분석기
    let screen = Arc::new(ScreenAnalyzer::from_library(&templates));
    let minimap = Arc::new(MinimapAnalyzer::new(
        &config.minimap,
        templates.minimap_top_left.clone(),
        templates.minimap_bottom_right.clone(),
    ));
    let rune = Arc::new(RuneAnalyzer::new(&config.rune));

    // 5. 입력 드라이버
    let input = create_platform_input_driver(args.dry_run, Some(source.clone()));
    info!(platform = input.platform(), "입력 드라이버 준비");

    // 6. 캐릭터 조작
    let player = Arc::new(PlayerController::new(
        input.clone(),
        frames.clone(),
        minimap.clone(),
        screen.clone(),
        config.hotkeys.clone(),
    ));

    // 7. 매크로 재생기
    let macro_player = Arc::new(MacroPlayer::new(input.clone()));
    if let Some(path) = &args.sequence {
        let sequence = CommandSequence::load(path)
            .with_context(|| format!("시퀀스 로드 실패: {}", path.display()))?;
        let unlisted = unlisted_sequence_keys(&config, &sequence);
        if !unlisted.is_empty() {
            warn!(?unlisted, "시퀀스에 단축키/주입 키 목록에 없는 키가 있음");
        }
        macro_player.set_sequence(sequence);
    } else {
        info!("재생할 시퀀스 없음: 이벤트 대응만 실행");
    }

    // 8. 상황 대응 (체커 + 핸들러)
    let notifier: Option<Arc<dyn AlertNotifier>> = if config.notification.enabled {
        Some(Arc::new(LogNotifier))
    } else {
        None
    };
    let macro_control: Arc<dyn MacroControl> = macro_player.clone();
    let mut orchestrator =
        EventOrchestrator::new(frames.clone(), macro_control.clone(), config.poll_interval());
    orchestrator
        .register(Arc::new(AdminWarpResponse::new(
            player.clone(),
            screen.clone(),
            notifier,
        )))
        .register(Arc::new(EntityDefeatedResponse::new(
            input.clone(),
            templates.respawn_dialog.clone(),
        )))
        .register(Arc::new(WrongLocationResponse::new(
            player.clone(),
            templates.location_name.clone(),
            templates.world_map_target.clone(),
        )))
        .register(Arc::new(RuneFailureResponse::new(player.clone(), rune.clone())))
        .register(Arc::new(RuneResponse::new(
            player.clone(),
            minimap.clone(),
            screen.clone(),
            rune,
        )))
        .register(Arc::new(BuffRefreshResponse::new(
            input.clone(),
            templates.buff_active.clone(),
            templates.buff_ready.clone(),
            config.hotkeys.buff,
        )));

    // 9. 백그라운드 루프 기동
    let capture_task = {
        let frames = frames.clone();
        let token = lifecycle.child_token();
        tokio::spawn(async move { frames.run(token).await })
    };

    // 미니맵 경계가 설정에 없으면 첫 프레임으로 보정
    if minimap.bounds().is_none() {
        tokio::select! {
            _ = lifecycle.wait_for_signal() => {}
            frame = frames.latest() => match minimap.calibrate(&*frame?) {
                Ok(bounds) => info!(?bounds, "미니맵 경계 보정"),
                Err(e) => warn!("미니맵 경계 보정 실패: {e}"),
            },
        }
    }

    let focus_task = {
        let watcher = FocusWatcher::new(
            source.clone(),
            orchestrator.signals(),
            config.focus_poll_interval(),
        );
        tokio::spawn(watcher.run(lifecycle.child_token()))
    };

    if !lifecycle.is_shutting_down() {
        orchestrator.start();
        resume_if_focused(source.as_ref(), macro_control.as_ref()).await;
        info!("Echo 실행 중 (Ctrl+C로 종료)");

        // OS 시그널 대기
        lifecycle.wait_for_signal().await?;
    }

    // ── 종료 순서: 오케스트레이터 → 매크로 → 캡처/포커스 루프 ──
    lifecycle.shutdown();
    orchestrator.stop().await;
    macro_control.pause();
    if let Err(e) = capture_task.await {
        warn!("캡처 루프 종료 실패: {e}");
    }
    if let Err(e) = focus_task.await {
        warn!("포커스 감시 종료 실패: {e}");
    }

    info!("Echo 종료");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use echo_core::error::CoreError;
    use echo_core::models::frame::{Frame, Rgb};
    use echo_core::models::input::PressKind;
    use echo_core::models::sequence::SequenceCommand;

    /// 포커스 조회 결과가 고정된 창
    struct FixedFocus(Result<bool, ()>);

    #[async_trait]
    impl WindowSource for FixedFocus {
        async fn capture_frame(&self) -> Result<Frame, CoreError> {
            Ok(Frame::filled(4, 4, Rgb::BLACK))
        }

        async fn is_focused(&self) -> Result<bool, CoreError> {
            self.0
                .map_err(|()| CoreError::Internal("창 핸들 없음".to_string()))
        }
    }

    #[derive(Default)]
    struct CountingMacro {
        resumes: AtomicUsize,
    }

    impl MacroControl for CountingMacro {
        fn pause(&self) {}

        fn resume(&self) {
            self.resumes.fetch_add(1, Ordering::SeqCst);
        }

        fn set_sequence(&self, _sequence: CommandSequence) {}
    }

    fn command(key: Key) -> SequenceCommand {
        SequenceCommand {
            key,
            kind: PressKind::Press,
            delay_ms: 100,
        }
    }

    #[test]
    fn cli_parses_all_flags() {
        let args = Args::parse_from([
            "echo",
            "--config",
            "cfg.json",
            "--sequence",
            "hunt.json",
            "-l",
            "debug",
            "--dry-run",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("cfg.json")));
        assert_eq!(args.sequence, Some(PathBuf::from("hunt.json")));
        assert_eq!(args.log_level, "debug");
        assert!(args.dry_run);
    }

    #[test]
    fn cli_defaults() {
        let args = Args::parse_from(["echo"]);
        assert!(args.config.is_none());
        assert_eq!(args.log_level, "info");
        assert!(!args.dry_run);
    }

    #[test]
    fn sequence_keys_checked_against_pool_and_hotkeys() {
        let config = AppConfig::default_config();
        let sequence = CommandSequence::new(
            "hunt",
            vec![
                command(config.hotkeys.attack),
                command(Key::Home),
                command(Key::F(7)),
                command(Key::F(7)),
            ],
        );
        // 단축키와 기본 주입 키는 통과, 목록 밖 키는 한 번만 보고
        assert_eq!(unlisted_sequence_keys(&config, &sequence), vec![Key::F(7)]);
    }

    #[test]
    fn explicit_config_path_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = load_config(Some(path.clone())).unwrap();
        assert!(path.exists());
        assert_eq!(config.capture.interval_ms, 250);
    }

    #[tokio::test]
    async fn macro_starts_only_when_window_focused() {
        let macro_control = CountingMacro::default();

        // 포커스 없음 / 조회 실패: 시작하지 않음
        assert!(!resume_if_focused(&FixedFocus(Ok(false)), &macro_control).await);
        assert!(!resume_if_focused(&FixedFocus(Err(())), &macro_control).await);
        assert_eq!(macro_control.resumes.load(Ordering::SeqCst), 0);

        assert!(resume_if_focused(&FixedFocus(Ok(true)), &macro_control).await);
        assert_eq!(macro_control.resumes.load(Ordering::SeqCst), 1);
    }
}
