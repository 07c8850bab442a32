//! 로그 저장소 스키마
//!
//! `logs`는 정규화된 이벤트 전체 필드에 식별자(`id`, `fingerprint`)와
//! 재개 토큰(`cursor`)을 더한 단일 테이블입니다. `ingest_state`는 소스당
//! 한 행으로 마지막 커서를 보관합니다.
//!
//! # 중복 제거 불변식
//! - `id` (기본 키): 내용 핑거프린트에서 파생된 결정적 64비트 정수
//! - `fingerprint` 유니크 인덱스: 커서가 없는 소스의 내용 기반 중복 차단
//! - `cursor` 유니크 인덱스: 저널 재생 시 토큰 기반 중복 차단
//!
//! SQLite의 유니크 인덱스는 NULL끼리 충돌하지 않으므로, 토큰이 없는
//! 행이 여럿 있어도 서로 막지 않습니다.

use rusqlite::Connection;
use tracing::debug;

use crate::error::StoreError;

const CREATE_LOGS: &str = "
CREATE TABLE IF NOT EXISTS logs (
    id          INTEGER PRIMARY KEY,
    ts          TEXT NOT NULL,
    hostname    TEXT,
    source      TEXT,
    unit        TEXT,
    facility    TEXT,
    severity    TEXT,
    pid         INTEGER,
    uid         INTEGER,
    gid         INTEGER,
    message     TEXT,
    raw         TEXT,
    fingerprint TEXT,
    cursor      TEXT
)";

const CREATE_INGEST_STATE: &str = "
CREATE TABLE IF NOT EXISTS ingest_state (
    source     TEXT PRIMARY KEY,
    cursor     TEXT,
    updated_at TEXT
)";

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_logs_ts ON logs(ts)",
    "CREATE INDEX IF NOT EXISTS idx_logs_unit ON logs(unit)",
    "CREATE INDEX IF NOT EXISTS idx_logs_hostname ON logs(hostname)",
    "CREATE INDEX IF NOT EXISTS idx_logs_severity ON logs(severity)",
    "CREATE UNIQUE INDEX IF NOT EXISTS uidx_logs_fingerprint ON logs(fingerprint)",
    "CREATE UNIQUE INDEX IF NOT EXISTS uidx_logs_cursor ON logs(cursor)",
];

/// 스키마를 생성합니다. 몇 번을 호출해도 안전합니다.
pub fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(CREATE_LOGS, [])?;
    conn.execute(CREATE_INGEST_STATE, [])?;

    // 구버전 설치본 컬럼 백필 (이미 있으면 실패하므로 무시)
    for ddl in [
        "ALTER TABLE logs ADD COLUMN fingerprint TEXT",
        "ALTER TABLE logs ADD COLUMN cursor TEXT",
    ] {
        if conn.execute(ddl, []).is_err() {
            debug!(ddl, "column backfill skipped");
        }
    }

    for ddl in CREATE_INDEXES {
        conn.execute(ddl, [])?;
    }
    Ok(())
}
