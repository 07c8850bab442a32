//! journald 수집기
//!
//! 저장된 재개 커서가 있으면 "커서 이후", 없으면 "최근 N초" 범위로
//! journalctl을 호출해 구조화 엔트리를 가져옵니다.
//!
//! journalctl 호출은 [`JournalQuery`] trait 뒤로 추상화되어 있습니다.
//! 프로덕션은 [`JournalctlQuery`]가 서브프로세스를 실행하고, 테스트는
//! 준비된 출력을 돌려주는 구현을 주입합니다.
//!
//! # unit 제외 필터
//! journalctl에는 unit 제외 플래그가 없으므로, 제외 글롭은 파싱된
//! 이벤트에 대한 후처리 필터로 적용합니다 (빈 목록 = 필터 없음).

use std::future::Future;

use chimera_core::config::SourceConfig;
use chimera_core::event::NormalizedEvent;
use tracing::debug;

use super::run_tool;
use crate::error::IngestError;
use crate::parser::{JournaldParser, LineParser, SourceContext};
use crate::pattern;

/// 커서 문자열 최대 길이
const MAX_CURSOR_LEN: usize = 500;

/// 재개 커서가 명령줄에 올려도 안전한 형식인지 검증합니다.
///
/// journald 커서는 base64 유사 문자들로 구성됩니다. 저장소가 오염되었거나
/// 조작된 커서가 서브프로세스 인자로 흘러가는 것을 막습니다.
pub(crate) fn cursor_is_valid(cursor: &str) -> bool {
    if cursor.is_empty() || cursor.len() > MAX_CURSOR_LEN {
        return false;
    }
    cursor.chars().all(|c| {
        c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=' | '-' | '_' | ';')
    })
}

/// journalctl 조회 요청
#[derive(Debug, Clone)]
pub struct JournalRequest {
    /// 소스 이름 (에러 보고용)
    pub source_name: String,
    /// 이 커서 이후의 엔트리만 조회. `None`이면 시간 창 조회.
    pub after_cursor: Option<String>,
    /// 커서가 없을 때 조회할 최근 시간 창 (초)
    pub window_secs: u64,
    /// 이 unit들만 조회 (`-u` 플래그). 비어 있으면 전체.
    pub units: Vec<String>,
    /// 반환 엔트리 수 상한 (`-n` 플래그)
    pub limit: Option<usize>,
}

/// journal 조회 능력 trait
///
/// 프로덕션 구현과 mock 구현이 같은 계약을 공유합니다.
pub trait JournalQuery: Send + Sync {
    /// 요청 범위의 엔트리를 JSON 라인 스트림(stdout 텍스트)으로 반환합니다.
    fn fetch(
        &self,
        request: &JournalRequest,
    ) -> impl Future<Output = Result<String, IngestError>> + Send;
}

/// journalctl 서브프로세스 기반 프로덕션 구현
///
/// journalctl이 PATH에 있고 엔트리별 불투명 커서를 지원한다고 가정합니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct JournalctlQuery;

impl JournalQuery for JournalctlQuery {
    async fn fetch(&self, request: &JournalRequest) -> Result<String, IngestError> {
        let mut args = vec![
            "--no-pager".to_owned(),
            "-o".to_owned(),
            "json".to_owned(),
        ];

        match &request.after_cursor {
            Some(cursor) => {
                if !cursor_is_valid(cursor) {
                    return Err(IngestError::InvalidCursor {
                        source_name: request.source_name.clone(),
                    });
                }
                args.push("--after-cursor".to_owned());
                args.push(cursor.clone());
            }
            None => {
                args.push("--since".to_owned());
                args.push(format!("-{}s", request.window_secs));
            }
        }

        for unit in &request.units {
            args.push("-u".to_owned());
            args.push(unit.clone());
        }

        if let Some(limit) = request.limit
            && limit > 0
        {
            args.push("-n".to_owned());
            args.push(limit.to_string());
        }

        run_tool("journalctl", &args).await
    }
}

/// journald 수집기
///
/// 조회 결과를 파싱하고 제외 글롭과 엔트리 상한을 적용합니다.
pub struct JournalCollector<'a, Q> {
    query: &'a Q,
    parser: JournaldParser,
}

impl<'a, Q: JournalQuery> JournalCollector<'a, Q> {
    /// 조회 구현을 주입하여 수집기를 만듭니다.
    pub fn new(query: &'a Q) -> Self {
        Self {
            query,
            parser: JournaldParser::new(),
        }
    }

    /// 엔트리를 수집해 정규화된 이벤트 목록을 반환합니다.
    ///
    /// 반환 순서는 journal 재생 순서 그대로이며, 마지막 이벤트의
    /// `resume_token`이 다음 호출의 커서 후보입니다.
    pub async fn collect(
        &self,
        source: &SourceConfig,
        after_cursor: Option<String>,
        window_secs: u64,
        limit: Option<usize>,
    ) -> Result<Vec<NormalizedEvent>, IngestError> {
        let request = JournalRequest {
            source_name: source.name.clone(),
            after_cursor,
            window_secs,
            units: source.journald.units.clone(),
            limit,
        };
        let stdout = self.query.fetch(&request).await?;

        let excludes = pattern::compile_all(&source.journald.exclude_units);
        let ctx = SourceContext::new(&source.name);
        let mut events = Vec::new();
        let mut dropped = 0u64;

        for line in stdout.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some(event) = self.parser.parse_line(line, &ctx) else {
                dropped += 1;
                continue;
            };
            if !excludes.is_empty()
                && pattern::matches_any(&excludes, event.unit.as_deref().unwrap_or(""))
            {
                continue;
            }
            events.push(event);
            if let Some(cap) = request.limit
                && events.len() >= cap
            {
                break;
            }
        }

        if dropped > 0 {
            metrics::counter!(
                chimera_core::metrics::INGEST_PARSE_DROPS_TOTAL,
                chimera_core::metrics::LABEL_KIND => "journald"
            )
            .increment(dropped);
        }
        debug!(
            source = source.name.as_str(),
            collected = events.len(),
            dropped,
            "journal entries collected"
        );
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chimera_core::event::SourceKind;

    /// 준비된 출력을 돌려주는 테스트용 조회 구현
    struct CannedJournal {
        stdout: String,
    }

    impl JournalQuery for CannedJournal {
        async fn fetch(&self, _request: &JournalRequest) -> Result<String, IngestError> {
            Ok(self.stdout.clone())
        }
    }

    struct FailingJournal;

    impl JournalQuery for FailingJournal {
        async fn fetch(&self, _request: &JournalRequest) -> Result<String, IngestError> {
            Err(IngestError::Collector {
                source_type: "journalctl".to_owned(),
                reason: "exit code 1: no journal".to_owned(),
            })
        }
    }

    fn journald_source(exclude_units: &[&str]) -> SourceConfig {
        SourceConfig {
            name: "j".to_owned(),
            kind: SourceKind::Journald,
            enabled: true,
            journald: chimera_core::config::JournaldOptions {
                units: Vec::new(),
                exclude_units: exclude_units.iter().map(|s| (*s).to_owned()).collect(),
            },
            file: Default::default(),
            container: Default::default(),
        }
    }

    fn entry(unit: &str, cursor: &str, micros: u64) -> String {
        format!(
            r#"{{"__REALTIME_TIMESTAMP":"{micros}","_SYSTEMD_UNIT":"{unit}","MESSAGE":"m","PRIORITY":"6","__CURSOR":"{cursor}"}}"#
        )
    }

    #[tokio::test]
    async fn collects_entries_in_order() {
        let canned = CannedJournal {
            stdout: [
                entry("a.service", "cursor-0", 1_705_314_645_000_000),
                entry("b.service", "cursor-1", 1_705_314_646_000_000),
            ]
            .join("\n"),
        };
        let collector = JournalCollector::new(&canned);
        let events = collector
            .collect(&journald_source(&[]), None, 3600, None)
            .await
            .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].resume_token.as_deref(), Some("cursor-1"));
    }

    #[tokio::test]
    async fn exclude_glob_filters_units() {
        let canned = CannedJournal {
            stdout: [
                entry("nginx.service", "c1", 1_705_314_645_000_000),
                entry("systemd-networkd.service", "c2", 1_705_314_646_000_000),
            ]
            .join("\n"),
        };
        let collector = JournalCollector::new(&canned);
        let events = collector
            .collect(&journald_source(&["systemd-*"]), None, 3600, None)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].unit.as_deref(), Some("nginx.service"));
    }

    #[tokio::test]
    async fn malformed_lines_are_dropped_not_fatal() {
        let canned = CannedJournal {
            stdout: format!(
                "not json\n\n{}\n{{\"MESSAGE\":\"no ts\"}}",
                entry("a.service", "c1", 1_705_314_645_000_000)
            ),
        };
        let collector = JournalCollector::new(&canned);
        let events = collector
            .collect(&journald_source(&[]), None, 3600, None)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn limit_caps_collected_entries() {
        let canned = CannedJournal {
            stdout: (0..10)
                .map(|i| entry("a.service", &format!("c{i}"), 1_705_314_645_000_000 + i))
                .collect::<Vec<_>>()
                .join("\n"),
        };
        let collector = JournalCollector::new(&canned);
        let events = collector
            .collect(&journald_source(&[]), None, 3600, Some(3))
            .await
            .unwrap();
        assert_eq!(events.len(), 3);
    }

    #[tokio::test]
    async fn query_failure_propagates() {
        let collector = JournalCollector::new(&FailingJournal);
        let err = collector
            .collect(&journald_source(&[]), None, 3600, None)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Collector { .. }));
    }

    #[test]
    fn cursor_validation_accepts_journald_shapes() {
        assert!(cursor_is_valid("s=abc123;i=4f2"));
        assert!(cursor_is_valid("QWJjMTIzPT0_-"));
        assert!(!cursor_is_valid(""));
        assert!(!cursor_is_valid("bad cursor with spaces"));
        assert!(!cursor_is_valid("dollar$sign"));
        assert!(!cursor_is_valid(&"x".repeat(501)));
    }

    #[tokio::test]
    async fn invalid_stored_cursor_is_rejected_before_spawn() {
        let query = JournalctlQuery;
        let request = JournalRequest {
            source_name: "j".to_owned(),
            after_cursor: Some("rm -rf /; echo".to_owned()),
            window_secs: 60,
            units: Vec::new(),
            limit: None,
        };
        let err = query.fetch(&request).await.unwrap_err();
        assert!(matches!(err, IngestError::InvalidCursor { .. }));
    }
}
