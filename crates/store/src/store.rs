//! 저장소 연결 핸들
//!
//! [`LogStore`]는 SQLite 연결 하나를 감싸는 얇은 핸들입니다. 호출자는
//! 수집 호출마다 열고 닫으며, 장수 연결이나 연결 풀은 두지 않습니다.
//! 동시 호출자 간의 안전성은 잠금이 아니라 스키마의 유니크 제약이
//! 보장합니다.

use std::path::Path;

use rusqlite::Connection;
use tracing::debug;

use crate::error::StoreError;
use crate::schema::initialize_schema;

/// SQLite 로그 저장소 핸들
pub struct LogStore {
    pub(crate) conn: Connection,
}

impl LogStore {
    /// 파일 경로로 저장소를 엽니다.
    ///
    /// 부모 디렉토리가 없으면 생성하고, 스키마를 보장한 뒤 반환합니다.
    /// WAL 모드와 busy timeout은 동시 호출자가 같은 소스를 수집하는
    /// 경우를 위한 설정입니다.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        initialize_schema(&conn)?;

        debug!(path = %path.display(), "log store opened");
        Ok(Self { conn })
    }

    /// 인메모리 저장소를 엽니다. 테스트 용도입니다.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// `logs` 테이블의 전체 행 수를 반환합니다.
    pub fn total_rows(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// 심각도별 행 수를 반환합니다 (상태 보고용).
    pub fn severity_counts(&self) -> Result<Vec<(String, u64)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT COALESCE(severity, '-') AS sev, COUNT(*) FROM logs \
             GROUP BY sev ORDER BY COUNT(*) DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            let sev: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((sev, count.max(0) as u64))
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }
}
