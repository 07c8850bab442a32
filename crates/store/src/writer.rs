//! 중복 제거 쓰기 경로
//!
//! 배치 전체를 단일 트랜잭션에서 `INSERT ... ON CONFLICT DO NOTHING`으로
//! 기록합니다. 기본 키(`id`)와 fingerprint/cursor 유니크 인덱스 중 무엇에
//! 걸리든 해당 행만 조용히 무시되므로, 같은 소스 출력을 몇 번 재수집해도
//! 저장소는 한 번만 자랍니다.
//!
//! 벌크 API는 행 단위 결과를 보고하지 않으므로, 실제 삽입 수는 트랜잭션
//! 전후의 전체 행 수 차이로 계산합니다.

use chimera_core::event::{NormalizedEvent, Severity};
use chimera_core::identity::{EventIdentity, identify};
use chrono::SecondsFormat;
use tracing::debug;

use crate::error::StoreError;
use crate::store::LogStore;

const INSERT_SQL: &str = "
INSERT INTO logs (id, ts, hostname, source, unit, facility, severity,
                  pid, uid, gid, message, raw, fingerprint, cursor)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
ON CONFLICT DO NOTHING";

/// 저장소 행 하나에 해당하는 (이벤트, 식별자) 쌍
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// 정규화된 이벤트
    pub event: NormalizedEvent,
    /// 이벤트에서 파생된 결정적 식별자
    pub identity: EventIdentity,
}

impl LogRecord {
    /// 이벤트의 식별자를 계산하여 레코드를 만듭니다.
    pub fn new(event: NormalizedEvent) -> Self {
        let identity = identify(&event);
        Self { event, identity }
    }
}

/// 배치 삽입 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    /// 실제로 새로 삽입된 행 수 (충돌로 무시된 행 제외)
    pub inserted: u64,
    /// 삽입 후 저장소의 전체 행 수
    pub total: u64,
}

impl LogStore {
    /// 레코드 배치를 충돌 무시 방식으로 삽입합니다.
    ///
    /// 커서는 건드리지 않습니다 — 커서 전진은 호출자가 쓰기 성공을
    /// 확인한 뒤에만 수행합니다.
    pub fn insert_batch(&mut self, records: &[LogRecord]) -> Result<InsertOutcome, StoreError> {
        let before = self.total_rows()?;
        if records.is_empty() {
            return Ok(InsertOutcome {
                inserted: 0,
                total: before,
            });
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(INSERT_SQL)?;
            for record in records {
                let event = &record.event;
                stmt.execute(rusqlite::params![
                    record.identity.record_id,
                    event.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
                    event.hostname,
                    event.source_name,
                    event.unit,
                    event.facility,
                    event.severity.as_ref().map(Severity::as_str),
                    event.pid,
                    event.uid,
                    event.gid,
                    event.message,
                    event.raw,
                    record.identity.fingerprint,
                    event.resume_token,
                ])?;
            }
        }
        tx.commit()?;

        let total = self.total_rows()?;
        let inserted = total.saturating_sub(before);
        debug!(
            attempted = records.len(),
            inserted,
            skipped = records.len() as u64 - inserted,
            "batch insert committed"
        );
        metrics::gauge!(chimera_core::metrics::STORE_LOG_ROWS).set(total as f64);

        Ok(InsertOutcome { inserted, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(message: &str, token: Option<&str>) -> NormalizedEvent {
        NormalizedEvent {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 45).unwrap(),
            hostname: Some("h".to_owned()),
            source_name: "system-journald".to_owned(),
            unit: Some("nginx.service".to_owned()),
            facility: None,
            severity: Some(Severity::Info),
            pid: Some(1),
            uid: None,
            gid: None,
            message: message.to_owned(),
            raw: "{}".to_owned(),
            resume_token: token.map(str::to_owned),
        }
    }

    #[test]
    fn inserts_new_records() {
        let mut store = LogStore::open_in_memory().unwrap();
        let records = vec![
            LogRecord::new(event("a", Some("c1"))),
            LogRecord::new(event("b", Some("c2"))),
        ];
        let outcome = store.insert_batch(&records).unwrap();
        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.total, 2);
    }

    #[test]
    fn reinserting_same_batch_is_a_noop() {
        let mut store = LogStore::open_in_memory().unwrap();
        let records = vec![
            LogRecord::new(event("a", Some("c1"))),
            LogRecord::new(event("b", Some("c2"))),
        ];
        store.insert_batch(&records).unwrap();
        let second = store.insert_batch(&records).unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.total, 2);
    }

    #[test]
    fn same_content_different_token_is_still_duplicate() {
        // raw/token이 달라도 내용이 같으면 record_id가 같아 한 행만 남는다
        let mut store = LogStore::open_in_memory().unwrap();
        store
            .insert_batch(&[LogRecord::new(event("a", Some("c1")))])
            .unwrap();
        let outcome = store
            .insert_batch(&[LogRecord::new(event("a", None))])
            .unwrap();
        assert_eq!(outcome.inserted, 0);
        assert_eq!(outcome.total, 1);
    }

    #[test]
    fn tokenless_records_do_not_block_each_other() {
        let mut store = LogStore::open_in_memory().unwrap();
        let records = vec![
            LogRecord::new(event("a", None)),
            LogRecord::new(event("b", None)),
        ];
        let outcome = store.insert_batch(&records).unwrap();
        assert_eq!(outcome.inserted, 2);
    }

    #[test]
    fn empty_batch_reports_current_total() {
        let mut store = LogStore::open_in_memory().unwrap();
        store
            .insert_batch(&[LogRecord::new(event("a", None))])
            .unwrap();
        let outcome = store.insert_batch(&[]).unwrap();
        assert_eq!(outcome.inserted, 0);
        assert_eq!(outcome.total, 1);
    }

    #[test]
    fn stored_row_preserves_fields() {
        let mut store = LogStore::open_in_memory().unwrap();
        let record = LogRecord::new(event("hello", Some("c9")));
        store.insert_batch(std::slice::from_ref(&record)).unwrap();

        let (unit, severity, cursor): (String, String, String) = store
            .conn
            .query_row(
                "SELECT unit, severity, cursor FROM logs WHERE id = ?1",
                [record.identity.record_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(unit, "nginx.service");
        assert_eq!(severity, "info");
        assert_eq!(cursor, "c9");
    }
}
