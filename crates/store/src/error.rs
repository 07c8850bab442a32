//! 저장소 에러 타입
//!
//! `From<StoreError> for ChimeraError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use chimera_core::error::{ChimeraError, StorageError};

/// 저장소 도메인 에러
///
/// 제약 조건 위반은 에러가 아닙니다 — 중복 삽입은 `ON CONFLICT DO NOTHING`
/// 경로에서 조용히 흡수됩니다. 여기 도달하는 것은 예기치 못한 실패뿐입니다.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// SQLite 에러
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// 데이터베이스 파일/디렉토리 I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for ChimeraError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => ChimeraError::Storage(StorageError::Query(e.to_string())),
            StoreError::Io(e) => ChimeraError::Io(e),
        }
    }
}
