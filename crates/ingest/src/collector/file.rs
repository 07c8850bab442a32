//! 파일 기반 로그 수집기
//!
//! 설정된 경로/글롭 패턴을 후보 파일 목록으로 풀고, 수정 시각이 요청
//! 시간 창보다 오래됐거나 크기 상한을 넘는 파일을 걸러낸 뒤, 남은
//! 파일을 라인 단위로 syslog 파서에 통과시킵니다.
//!
//! 재개 토큰이 없으므로 재스캔 중복은 전적으로 내용 핑거프린트가
//! 쓰기 단계에서 흡수합니다 — 변하지 않은 파일의 재스캔은 삽입 0건의
//! 저렴한 no-op입니다. 없거나 읽을 수 없는 파일은 건너뜁니다.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chimera_core::config::{FileOptions, SourceConfig};
use chimera_core::event::NormalizedEvent;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::IngestError;
use crate::parser::{LineParser, SourceContext, SyslogFileParser};

/// 파일 수집기
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCollector {
    parser: SyslogFileParser,
}

impl FileCollector {
    /// 새 파일 수집기를 생성합니다.
    pub fn new() -> Self {
        Self {
            parser: SyslogFileParser::new(),
        }
    }

    /// 시간 창 안에서 수정된 파일들을 스캔해 이벤트를 수집합니다.
    pub async fn collect(
        &self,
        source: &SourceConfig,
        cutoff: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<NormalizedEvent>, IngestError> {
        let candidates = resolve_candidates(&source.file);
        let max_size_bytes = source.file.max_file_size_mb.saturating_mul(1024 * 1024);
        let survivors = filter_candidates(candidates, max_size_bytes, cutoff.into());

        let ctx = SourceContext::new(&source.name);
        let mut events = Vec::new();
        let mut dropped = 0u64;

        'files: for path in survivors {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };
            for line in String::from_utf8_lossy(&bytes).lines() {
                if line.trim().is_empty() {
                    continue;
                }
                match self.parser.parse_line(line, &ctx) {
                    Some(event) => events.push(event),
                    None => dropped += 1,
                }
                if let Some(cap) = limit
                    && events.len() >= cap
                {
                    break 'files;
                }
            }
        }

        if dropped > 0 {
            metrics::counter!(
                chimera_core::metrics::INGEST_PARSE_DROPS_TOTAL,
                chimera_core::metrics::LABEL_KIND => "file"
            )
            .increment(dropped);
        }
        debug!(
            source = source.name.as_str(),
            collected = events.len(),
            dropped,
            "log files scanned"
        );
        Ok(events)
    }
}

/// 설정된 경로와 패턴을 후보 파일 목록으로 풉니다.
///
/// 경로가 파일이면 그대로, 디렉토리면 패턴별 글롭 매칭 결과를 더합니다.
/// 존재하지 않는 경로는 조용히 무시됩니다.
pub(crate) fn resolve_candidates(options: &FileOptions) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in &options.paths {
        let path = Path::new(path);
        if path.is_file() {
            files.push(path.to_path_buf());
        } else if path.is_dir() {
            for pattern in &options.patterns {
                let full = path.join(pattern);
                let Some(full) = full.to_str() else { continue };
                let Ok(matches) = glob::glob(full) else { continue };
                files.extend(matches.flatten().filter(|p| p.is_file()));
            }
        }
    }
    files
}

/// 크기 상한과 수정 시각 컷오프로 후보를 걸러냅니다.
///
/// stat에 실패한 파일은 제외합니다.
pub(crate) fn filter_candidates(
    candidates: Vec<PathBuf>,
    max_size_bytes: u64,
    cutoff: SystemTime,
) -> Vec<PathBuf> {
    candidates
        .into_iter()
        .filter(|path| {
            let Ok(meta) = std::fs::metadata(path) else {
                return false;
            };
            if meta.len() > max_size_bytes {
                debug!(path = %path.display(), size = meta.len(), "file exceeds size cap");
                return false;
            }
            match meta.modified() {
                Ok(mtime) => mtime >= cutoff,
                Err(_) => false,
            }
        })
        .collect()
}
