//! 소스별 재개 커서 상태
//!
//! `ingest_state`는 소스 이름당 한 행이며, 전진 시마다 덮어써집니다.
//! 커서는 해당 배치의 쓰기가 커밋된 뒤에만 전진하므로, 쓰기와 전진
//! 사이에서 프로세스가 죽으면 다음 실행이 마지막 배치를 다시 가져오고
//! 중복 제거가 겹침을 흡수합니다. 동시 전진은 마지막 기록자가 이깁니다.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::OptionalExtension;
use tracing::debug;

use crate::error::StoreError;
use crate::store::LogStore;

/// 소스 하나의 커서 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorState {
    /// 소스 이름
    pub source: String,
    /// 마지막으로 전진한 재개 토큰
    pub cursor: Option<String>,
    /// 마지막 전진 시각 (RFC 3339)
    pub updated_at: String,
}

impl LogStore {
    /// 소스의 마지막 커서를 조회합니다. 없으면 `None`.
    pub fn load_cursor(&self, source: &str) -> Result<Option<String>, StoreError> {
        let cursor: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT cursor FROM ingest_state WHERE source = ?1",
                [source],
                |row| row.get(0),
            )
            .optional()?;
        Ok(cursor.flatten())
    }

    /// 소스의 커서를 덮어씁니다.
    pub fn advance_cursor(&self, source: &str, cursor: &str) -> Result<(), StoreError> {
        self.advance_cursor_at(source, cursor, Utc::now())
    }

    /// 전진 시각을 지정하는 내부 변형 (테스트에서 사용).
    pub(crate) fn advance_cursor_at(
        &self,
        source: &str,
        cursor: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO ingest_state (source, cursor, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(source) DO UPDATE SET cursor = excluded.cursor, \
             updated_at = excluded.updated_at",
            rusqlite::params![
                source,
                cursor,
                at.to_rfc3339_opts(SecondsFormat::Micros, true)
            ],
        )?;
        debug!(source, cursor, "ingest cursor advanced");
        Ok(())
    }

    /// 저장된 모든 커서 상태를 반환합니다 (상태 보고용).
    pub fn cursors(&self) -> Result<Vec<CursorState>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT source, cursor, updated_at FROM ingest_state ORDER BY source")?;
        let rows = stmt.query_map([], |row| {
            Ok(CursorState {
                source: row.get(0)?,
                cursor: row.get(1)?,
                updated_at: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }
}
