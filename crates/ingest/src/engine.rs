//! 수집 엔진 — 소스 순회, 커서 처리, 소스 단위 실패 격리
//!
//! 소스 하나의 처리 흐름은 고정된 상태 기계입니다.
//!
//! ```text
//! LoadCursor -> Collect -> Parse&Identify -> Write -> AdvanceCursor -> Done
//! ```
//!
//! 커서 전진은 해당 배치의 쓰기가 커밋된 뒤에만 일어납니다. 쓰기 후
//! 전진 전에 프로세스가 죽으면 다음 실행이 겹치는 범위를 다시 가져오고,
//! 쓰기 경로의 멱등성이 겹침을 흡수합니다.
//!
//! 엔진 내부에 스케줄러나 잠금은 없습니다. 동시 호출자가 같은 소스를
//! 수집해도 저장소의 유니크 제약이 중복을 막고, 커서 전진은 마지막
//! 기록자가 이깁니다. 저장소 연결은 호출마다 열리고 닫힙니다.

use chimera_core::config::{ChimeraConfig, SourceConfig};
use chimera_core::event::SourceKind;
use chimera_core::metrics as metric_names;
use chimera_store::{LogRecord, LogStore};
use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::collector::container::{ContainerCollector, ContainerRuntime, DockerCliRuntime};
use crate::collector::file::FileCollector;
use crate::collector::journald::{JournalCollector, JournalQuery, JournalctlQuery};
use crate::error::IngestError;

/// 소스 하나의 수집 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    /// 새로 삽입된 행 수 (충돌로 무시된 행 제외)
    pub inserted: u64,
    /// 수집 후 저장소의 전체 행 수
    pub total: u64,
}

/// `ingest_all` 보고서의 소스 항목
#[derive(Debug, Serialize)]
pub struct SourceReport {
    /// 소스 이름
    pub source: String,
    /// 이 소스가 새로 삽입한 행 수
    pub inserted: u64,
    /// 실패한 경우의 에러 메시지
    pub error: Option<String>,
}

/// 활성 소스 전체에 대한 수집 보고서
#[derive(Debug, Serialize)]
pub struct IngestReport {
    /// 전 소스에 걸쳐 새로 삽입된 행 수
    pub inserted: u64,
    /// 마지막 성공 소스 기준 저장소 전체 행 수
    pub total: u64,
    /// 소스별 결과 (설정 순서)
    pub sources: Vec<SourceReport>,
}

impl IngestReport {
    /// 실패한 소스 수를 반환합니다.
    pub fn failures(&self) -> usize {
        self.sources.iter().filter(|s| s.error.is_some()).count()
    }
}

/// 로그 수집 엔진
///
/// 설정은 생성 시 명시적으로 전달되며, 엔진은 전역 가변 상태를 갖지
/// 않습니다. journal 조회와 컨테이너 런타임은 타입 매개변수로 주입되어
/// 테스트에서 mock으로 교체됩니다.
pub struct IngestEngine<J = JournalctlQuery, R = DockerCliRuntime> {
    config: ChimeraConfig,
    journal: J,
    containers: R,
}

impl IngestEngine {
    /// 프로덕션 런타임(journalctl, docker CLI)으로 엔진을 만듭니다.
    pub fn new(config: ChimeraConfig) -> Self {
        Self::with_runtimes(config, JournalctlQuery, DockerCliRuntime)
    }
}

impl<J: JournalQuery, R: ContainerRuntime> IngestEngine<J, R> {
    /// 조회/런타임 구현을 지정하여 엔진을 만듭니다.
    pub fn with_runtimes(config: ChimeraConfig, journal: J, containers: R) -> Self {
        Self {
            config,
            journal,
            containers,
        }
    }

    /// 엔진이 들고 있는 설정을 반환합니다.
    pub fn config(&self) -> &ChimeraConfig {
        &self.config
    }

    /// 이름으로 소스를 찾아 수집합니다.
    pub async fn ingest_by_name(
        &self,
        name: &str,
        window_secs: Option<u64>,
        limit: Option<usize>,
    ) -> Result<IngestOutcome, IngestError> {
        let source = self
            .config
            .source_by_name(name)
            .ok_or_else(|| IngestError::UnknownSource(name.to_owned()))?;
        self.ingest(source, window_secs, limit).await
    }

    /// 소스 하나를 수집합니다.
    ///
    /// `window_secs`가 `None`이면 설정의 기본 시간 창을 사용하고,
    /// `limit`은 설정의 `max_limit`으로 잘립니다.
    pub async fn ingest(
        &self,
        source: &SourceConfig,
        window_secs: Option<u64>,
        limit: Option<usize>,
    ) -> Result<IngestOutcome, IngestError> {
        let window = window_secs.unwrap_or(self.config.ingest.default_window_secs);
        let max = self.config.ingest.max_limit;
        let effective_limit = Some(limit.unwrap_or(max).min(max));

        info!(
            source = source.name.as_str(),
            kind = %source.kind,
            window_secs = window,
            limit = effective_limit,
            "starting ingestion"
        );

        let mut store = LogStore::open(&self.config.storage.db_path)?;
        let outcome = match source.kind {
            SourceKind::Journald => {
                self.ingest_journald(&mut store, source, window, effective_limit)
                    .await?
            }
            SourceKind::File => {
                self.ingest_files(&mut store, source, window, effective_limit)
                    .await?
            }
            SourceKind::Container => {
                self.ingest_containers(&mut store, source, window, effective_limit)
                    .await?
            }
        };

        info!(
            source = source.name.as_str(),
            inserted = outcome.inserted,
            total = outcome.total,
            "ingestion complete"
        );
        Ok(outcome)
    }

    /// 활성화된 모든 소스를 설정 순서대로 수집합니다.
    ///
    /// 소스 하나의 수집기 실패는 기록만 하고 다음 소스로 넘어갑니다.
    /// 저장소 실패만이 전체 호출을 중단시킵니다.
    pub async fn ingest_all(
        &self,
        window_secs: Option<u64>,
        limit: Option<usize>,
    ) -> Result<IngestReport, IngestError> {
        let mut report = IngestReport {
            inserted: 0,
            total: 0,
            sources: Vec::new(),
        };

        for source in self.config.enabled_sources() {
            match self.ingest(source, window_secs, limit).await {
                Ok(outcome) => {
                    report.inserted += outcome.inserted;
                    report.total = outcome.total;
                    report.sources.push(SourceReport {
                        source: source.name.clone(),
                        inserted: outcome.inserted,
                        error: None,
                    });
                }
                Err(IngestError::Store(e)) => return Err(IngestError::Store(e)),
                Err(e) => {
                    warn!(source = source.name.as_str(), error = %e, "source ingestion failed");
                    metrics::counter!(
                        metric_names::INGEST_SOURCE_FAILURES_TOTAL,
                        metric_names::LABEL_SOURCE => source.name.clone()
                    )
                    .increment(1);
                    report.sources.push(SourceReport {
                        source: source.name.clone(),
                        inserted: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        Ok(report)
    }

    async fn ingest_journald(
        &self,
        store: &mut LogStore,
        source: &SourceConfig,
        window: u64,
        limit: Option<usize>,
    ) -> Result<IngestOutcome, IngestError> {
        let after_cursor = store.load_cursor(&source.name)?;

        let collector = JournalCollector::new(&self.journal);
        let events = collector
            .collect(source, after_cursor.clone(), window, limit)
            .await?;

        // 배치에서 마지막으로 관측된 토큰이 다음 커서 후보
        let last_token = events.iter().rev().find_map(|e| e.resume_token.clone());

        let outcome = self.write_batch(store, source, events)?;

        if let Some(token) = last_token
            && after_cursor.as_deref() != Some(token.as_str())
        {
            store.advance_cursor(&source.name, &token)?;
        }
        Ok(outcome)
    }

    async fn ingest_files(
        &self,
        store: &mut LogStore,
        source: &SourceConfig,
        window: u64,
        limit: Option<usize>,
    ) -> Result<IngestOutcome, IngestError> {
        let cutoff = Utc::now() - Duration::seconds(window.min(i64::MAX as u64) as i64);
        let collector = FileCollector::new();
        let events = collector.collect(source, cutoff, limit).await?;
        self.write_batch(store, source, events)
    }

    async fn ingest_containers(
        &self,
        store: &mut LogStore,
        source: &SourceConfig,
        window: u64,
        limit: Option<usize>,
    ) -> Result<IngestOutcome, IngestError> {
        let collector = ContainerCollector::new(&self.containers);
        let events = collector.collect(source, window, limit).await?;
        self.write_batch(store, source, events)
    }

    /// 이벤트 배치에 식별자를 부여하고 멱등 삽입합니다.
    fn write_batch(
        &self,
        store: &mut LogStore,
        source: &SourceConfig,
        events: Vec<chimera_core::NormalizedEvent>,
    ) -> Result<IngestOutcome, IngestError> {
        let collected = events.len() as u64;
        let records: Vec<LogRecord> = events.into_iter().map(LogRecord::new).collect();
        let outcome = store.insert_batch(&records)?;

        metrics::counter!(
            metric_names::INGEST_EVENTS_COLLECTED_TOTAL,
            metric_names::LABEL_SOURCE => source.name.clone()
        )
        .increment(collected);
        metrics::counter!(
            metric_names::INGEST_EVENTS_INSERTED_TOTAL,
            metric_names::LABEL_SOURCE => source.name.clone()
        )
        .increment(outcome.inserted);
        metrics::counter!(
            metric_names::INGEST_DUPLICATES_SKIPPED_TOTAL,
            metric_names::LABEL_SOURCE => source.name.clone()
        )
        .increment(collected.saturating_sub(outcome.inserted));

        Ok(IngestOutcome {
            inserted: outcome.inserted,
            total: outcome.total,
        })
    }
}
