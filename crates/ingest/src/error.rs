//! 수집 엔진 에러 타입
//!
//! [`IngestError`]는 수집 파이프라인에서 발생하는 모든 에러를 표현합니다.
//! `From<IngestError> for ChimeraError` 변환이 구현되어 있어 상위
//! 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! 파싱 실패는 에러가 아닙니다 — 해석할 수 없는 라인은 파서가 `None`으로
//! 떨어뜨리는 정상 데이터 경로입니다.

use chimera_core::error::ChimeraError;
use chimera_store::StoreError;

/// 수집 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// 지원하지 않는 컨테이너 런타임
    #[error("unsupported container runtime: {runtime} (expected: docker)")]
    UnsupportedRuntime {
        /// 설정된 런타임 이름
        runtime: String,
    },

    /// 설정에 없는 소스 이름
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// 수집기 에러 (도구 비정상 종료, 런타임 접근 불가 등) — 재시도 가능
    #[error("collector error: {source_type}: {reason}")]
    Collector {
        /// 실패 지점 (journalctl, docker, file 등)
        source_type: String,
        /// 에러 사유
        reason: String,
    },

    /// 외부 도구 실행 시간 초과 — 재시도 가능
    #[error("{tool} timed out after {seconds}s")]
    ToolTimeout {
        /// 도구 이름
        tool: String,
        /// 적용된 제한 시간 (초)
        seconds: u64,
    },

    /// 저장된 재개 커서가 유효한 형식이 아님
    #[error("invalid resume cursor for source '{source_name}'")]
    InvalidCursor {
        /// 소스 이름
        source_name: String,
    },

    /// 저장소 에러 — 전체 호출에 치명적
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IngestError> for ChimeraError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Store(e) => e.into(),
            other => ChimeraError::Ingest(other.to_string()),
        }
    }
}
