//! 매크로(입력 시퀀스) 재생기.
//!
//! 시퀀스를 명시적 인덱스와 모듈로 순환으로 반복 재생한다.
//! 재생은 별도 태스크에서 돌고, 일시정지는 해당 태스크의 취소 토큰을 끊는 것으로 이뤄진다.
//! 재생 태스크는 종료 직전에 눌린 키를 모두 놓는다.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use echo_core::error::CoreError;
use echo_core::models::sequence::CommandSequence;
use echo_core::ports::input_driver::InputDriver;
use echo_core::ports::macro_control::MacroControl;

use crate::pacing::pause_for;

#[derive(Default)]
struct PlaybackState {
    sequence: Option<Arc<CommandSequence>>,
    /// 다음에 보낼 명령 인덱스
    cursor: usize,
    /// 실행 중인 재생 태스크의 취소 토큰
    playback: Option<CancellationToken>,
    /// 재생 태스크 세대. 최신 세대만 커서를 전진시킨다.
    generation: u64,
}

/// 입력 시퀀스 재생기
pub struct MacroPlayer {
    input: Arc<dyn InputDriver>,
    state: Arc<Mutex<PlaybackState>>,
}

impl MacroPlayer {
    pub fn new(input: Arc<dyn InputDriver>) -> Self {
        Self {
            input,
            state: Arc::new(Mutex::new(PlaybackState::default())),
        }
    }

    /// 재생 태스크가 돌고 있는지
    pub fn is_playing(&self) -> bool {
        self.state
            .lock()
            .playback
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    /// 다음에 보낼 명령 인덱스
    pub fn cursor(&self) -> usize {
        self.state.lock().cursor
    }

    /// 현재 시퀀스 이름
    pub fn sequence_name(&self) -> Option<String> {
        self.state.lock().sequence.as_ref().map(|s| s.name.clone())
    }

    fn start_playback(&self) {
        let mut state = self.state.lock();
        if state.playback.as_ref().is_some_and(|t| !t.is_cancelled()) {
            debug!("매크로 이미 재생 중");
            return;
        }
        let Some(sequence) = state.sequence.clone() else {
            debug!("재생할 시퀀스 없음");
            return;
        };
        if sequence.is_empty() {
            warn!(name = %sequence.name, "빈 시퀀스는 재생하지 않음");
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("tokio 런타임 밖에서 재생 요청됨");
            return;
        };

        let token = CancellationToken::new();
        state.generation += 1;
        state.playback = Some(token.clone());
        let generation = state.generation;
        let cursor = state.cursor;
        drop(state);

        info!(name = %sequence.name, cursor, "매크로 재생 시작");
        let input = self.input.clone();
        let shared = self.state.clone();
        runtime.spawn(async move {
            let result = playback_loop(&input, &shared, &sequence, generation, &token).await;
            match result {
                Ok(()) | Err(CoreError::Cancelled) => debug!("매크로 재생 종료"),
                Err(e) => {
                    warn!("매크로 재생 중단: {e}");
                    token.cancel();
                }
            }
            match input.release_all_pressed().await {
                Ok(released) if !released.is_empty() => debug!(?released, "재생 종료 후 키 해제"),
                Ok(_) => {}
                Err(e) => warn!("키 해제 실패: {e}"),
            }
        });
    }

    fn stop_playback(&self) {
        if let Some(token) = self.state.lock().playback.take() {
            token.cancel();
            info!("매크로 재생 일시정지");
        }
    }
}

/// 지연 대기 → 키 전송 → 인덱스 전진을 취소될 때까지 반복
async fn playback_loop(
    input: &Arc<dyn InputDriver>,
    state: &Mutex<PlaybackState>,
    sequence: &CommandSequence,
    generation: u64,
    cancel: &CancellationToken,
) -> Result<(), CoreError> {
    loop {
        let index = state.lock().cursor;
        let Some(command) = sequence.command_at(index) else {
            return Ok(());
        };
        pause_for(cancel, command.delay_ms).await?;
        input.send_key(command.key, command.kind).await?;

        let mut state = state.lock();
        if state.generation != generation {
            return Ok(());
        }
        state.cursor = (index + 1) % sequence.len();
    }
}

impl MacroControl for MacroPlayer {
    fn pause(&self) {
        self.stop_playback();
    }

    fn resume(&self) {
        self.start_playback();
    }

    fn set_sequence(&self, sequence: CommandSequence) {
        self.stop_playback();
        let mut state = self.state.lock();
        info!(name = %sequence.name, commands = sequence.len(), "재생 시퀀스 교체");
        state.sequence = Some(Arc::new(sequence));
        state.cursor = 0;
        state.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_driver::NoOpInputDriver;
    use echo_core::models::input::{Key, PressKind};
    use echo_core::models::sequence::SequenceCommand;
    use std::time::Duration;

    fn sequence() -> CommandSequence {
        CommandSequence::new(
            "test",
            vec![
                SequenceCommand {
                    key: Key::Left,
                    kind: PressKind::Down,
                    delay_ms: 100,
                },
                SequenceCommand {
                    key: Key::Left,
                    kind: PressKind::Up,
                    delay_ms: 100,
                },
                SequenceCommand {
                    key: Key::Control,
                    kind: PressKind::Press,
                    delay_ms: 100,
                },
            ],
        )
    }

    fn player() -> (Arc<NoOpInputDriver>, MacroPlayer) {
        let driver = Arc::new(NoOpInputDriver::new());
        let player = MacroPlayer::new(driver.clone());
        (driver, player)
    }

    #[tokio::test(start_paused = true)]
    async fn plays_in_order_and_wraps_around() {
        let (driver, player) = player();
        player.set_sequence(sequence());
        player.resume();
        assert!(player.is_playing());

        // 명령 4개분 (100ms * 4) + 여유
        tokio::time::sleep(Duration::from_millis(450)).await;
        player.pause();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let keys = driver.key_history();
        assert_eq!(
            &keys[..4],
            &[
                (Key::Left, PressKind::Down),
                (Key::Left, PressKind::Up),
                (Key::Control, PressKind::Press),
                (Key::Left, PressKind::Down),
            ]
        );
        assert_eq!(player.cursor(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_releases_held_keys_and_resume_continues() {
        let (driver, player) = player();
        player.set_sequence(sequence());
        player.resume();

        // 첫 명령 (Left Down) 직후 일시정지
        tokio::time::sleep(Duration::from_millis(150)).await;
        player.pause();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!player.is_playing());
        assert_eq!(
            driver.key_history(),
            vec![(Key::Left, PressKind::Down), (Key::Left, PressKind::Up)]
        );

        // 재개는 저장된 인덱스(1)부터
        driver.clear_history();
        player.resume();
        tokio::time::sleep(Duration::from_millis(150)).await;
        player.pause();
        assert_eq!(driver.key_history()[0], (Key::Left, PressKind::Up));
    }

    #[tokio::test(start_paused = true)]
    async fn set_sequence_resets_cursor() {
        let (_driver, player) = player();
        player.set_sequence(sequence());
        player.resume();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(player.cursor(), 2);

        player.set_sequence(sequence());
        assert!(!player.is_playing());
        assert_eq!(player.cursor(), 0);
        assert_eq!(player.sequence_name().as_deref(), Some("test"));
    }

    #[tokio::test]
    async fn resume_without_sequence_is_noop() {
        let (driver, player) = player();
        player.resume();
        assert!(!player.is_playing());
        assert!(driver.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn double_resume_spawns_single_task() {
        let (driver, player) = player();
        player.set_sequence(sequence());
        player.resume();
        player.resume();
        tokio::time::sleep(Duration::from_millis(150)).await;
        player.pause();
        // 첫 명령이 한 번만 전송됨
        let downs = driver
            .key_history()
            .iter()
            .filter(|(k, kind)| *k == Key::Left && *kind == PressKind::Down)
            .count();
        assert_eq!(downs, 1);
    }
}
