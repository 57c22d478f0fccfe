//! Echo 핵심 에러 타입.
//!
//! 라이브러리 crate는 모두 이 타입을 반환하고, 바이너리는 `anyhow`로 감싼다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 ({field}): {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 대상 창을 캡처할 수 없음 (창 없음, 최소화 등)
    #[error("캡처 불가: {0}")]
    CaptureUnavailable(String),

    /// 키/마우스 입력 전송 실패
    #[error("입력 전송 실패: {0}")]
    Input(String),

    /// 템플릿 이미지 로드 실패
    #[error("템플릿 로드 실패 {path}: {message}")]
    Template {
        /// 템플릿 파일 경로
        path: String,
        /// 실패 사유
        message: String,
    },

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "Window", "Handler")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 협조적 취소 (선점 또는 종료)
    #[error("작업 취소됨")]
    Cancelled,

    /// 파일 I/O 실패
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 취소로 인한 종료인지 여부
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled)
    }
}
