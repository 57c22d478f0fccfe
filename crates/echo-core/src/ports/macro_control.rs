//! 매크로(입력 재생) 제어 포트.

use crate::models::sequence::CommandSequence;

/// 백그라운드 입력 재생 협력자.
///
/// 오케스트레이터는 핸들러 활성화 전후로 `pause`/`resume`만 호출하며
/// 재생 자체는 구현하지 않는다. 호출은 즉시 반환된다.
pub trait MacroControl: Send + Sync {
    /// 재생 중단 (눌린 키 해제 포함)
    fn pause(&self);

    /// 저장된 위치부터 재생 재개
    fn resume(&self);

    /// 재생할 시퀀스 교체 (처음부터)
    fn set_sequence(&self, sequence: CommandSequence);
}
