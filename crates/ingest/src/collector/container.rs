//! 컨테이너 로그 수집기
//!
//! 실행 중인 컨테이너를 열거하고, 이름을 include/exclude 글롭으로
//! 거른 뒤, 컨테이너별로 요청 시간 창의 로그를 가져와 파싱합니다.
//!
//! 런타임 접근은 [`ContainerRuntime`] trait 뒤로 추상화되어 있습니다.
//! 프로덕션은 [`DockerCliRuntime`]이 docker CLI를 실행하고, 테스트는
//! 준비된 응답을 돌려주는 구현을 주입합니다.
//!
//! # 실패 처리
//! - 컨테이너 열거 실패: 소스 전체의 수집기 에러 (재시도 가능)
//! - 개별 컨테이너 로그 가져오기 실패: 해당 컨테이너만 건너뜀

use std::future::Future;

use chimera_core::config::SourceConfig;
use chimera_core::event::NormalizedEvent;
use tracing::{debug, warn};

use super::{local_hostname, run_tool};
use crate::error::IngestError;
use crate::parser::{ContainerLogParser, LineParser, SourceContext};
use crate::pattern;

/// 컨테이너 이름이 명령줄에 올려도 안전한지 검증합니다.
///
/// docker 이름 규칙([A-Za-z0-9][A-Za-z0-9_.-]*)의 상위 집합만 허용합니다.
fn container_name_is_valid(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 255
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// 컨테이너 런타임 능력 trait
///
/// "실행 중 컨테이너 목록"과 "시간 창 로그 가져오기" 두 가지 호출만
/// 계약합니다.
pub trait ContainerRuntime: Send + Sync {
    /// 실행 중인 컨테이너 이름 목록을 반환합니다.
    fn list_names(&self) -> impl Future<Output = Result<Vec<String>, IngestError>> + Send;

    /// 컨테이너의 최근 `window_secs`초 로그를 반환합니다.
    fn logs_since(
        &self,
        name: &str,
        window_secs: u64,
    ) -> impl Future<Output = Result<String, IngestError>> + Send;
}

/// docker CLI 기반 프로덕션 런타임
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerCliRuntime;

impl ContainerRuntime for DockerCliRuntime {
    async fn list_names(&self) -> Result<Vec<String>, IngestError> {
        let stdout = run_tool(
            "docker",
            &["ps".to_owned(), "--format".to_owned(), "{{.Names}}".to_owned()],
        )
        .await?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect())
    }

    async fn logs_since(&self, name: &str, window_secs: u64) -> Result<String, IngestError> {
        if !container_name_is_valid(name) {
            return Err(IngestError::Collector {
                source_type: "docker".to_owned(),
                reason: format!("invalid container name: {name:?}"),
            });
        }
        run_tool(
            "docker",
            &[
                "logs".to_owned(),
                "--since".to_owned(),
                format!("{window_secs}s"),
                "--timestamps".to_owned(),
                name.to_owned(),
            ],
        )
        .await
    }
}

/// 컨테이너 로그 수집기
pub struct ContainerCollector<'a, R> {
    runtime: &'a R,
    parser: ContainerLogParser,
}

impl<'a, R: ContainerRuntime> ContainerCollector<'a, R> {
    /// 런타임 구현을 주입하여 수집기를 만듭니다.
    pub fn new(runtime: &'a R) -> Self {
        Self {
            runtime,
            parser: ContainerLogParser::new(),
        }
    }

    /// 필터를 통과한 컨테이너들의 로그를 수집합니다.
    ///
    /// include 글롭은 OR로 결합되고(빈 목록 = 전체 포함), exclude 글롭이
    /// 그 결과에서 빠집니다.
    pub async fn collect(
        &self,
        source: &SourceConfig,
        window_secs: u64,
        limit: Option<usize>,
    ) -> Result<Vec<NormalizedEvent>, IngestError> {
        if source.container.runtime != "docker" {
            return Err(IngestError::UnsupportedRuntime {
                runtime: source.container.runtime.clone(),
            });
        }

        let names = self.runtime.list_names().await?;
        let includes = pattern::compile_all(&source.container.include_patterns);
        let excludes = pattern::compile_all(&source.container.exclude_patterns);
        let selected: Vec<&String> = names
            .iter()
            .filter(|name| includes.is_empty() || pattern::matches_any(&includes, name))
            .filter(|name| !pattern::matches_any(&excludes, name))
            .collect();

        let hostname = local_hostname();
        let mut events = Vec::new();
        let mut dropped = 0u64;

        'containers: for name in selected {
            if let Some(cap) = limit
                && events.len() >= cap
            {
                break;
            }
            let logs = match self.runtime.logs_since(name, window_secs).await {
                Ok(logs) => logs,
                Err(e) => {
                    warn!(container = name.as_str(), error = %e, "skipping container");
                    continue;
                }
            };
            let ctx = SourceContext::new(&source.name)
                .with_hostname(hostname.as_deref())
                .with_container(name);
            for line in logs.lines() {
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
                    break 'containers;
                }
            }
        }

        if dropped > 0 {
            metrics::counter!(
                chimera_core::metrics::INGEST_PARSE_DROPS_TOTAL,
                chimera_core::metrics::LABEL_KIND => "container"
            )
            .increment(dropped);
        }
        debug!(
            source = source.name.as_str(),
            collected = events.len(),
            dropped,
            "container logs collected"
        );
        Ok(events)
    }
}
