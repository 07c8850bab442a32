//! 로그 수집 모듈 -- 외부 소스에서 원시 라인을 가져옵니다.
//!
//! # 수집기 목록
//! - [`journald::JournalCollector`]: journalctl 재생 (커서 또는 시간 창)
//! - [`file::FileCollector`]: 파일시스템 스캔 (크기/수정시각 필터)
//! - [`container::ContainerCollector`]: 컨테이너 런타임 CLI 로그 재생
//!
//! 수집기는 동기적 풀 방식입니다 — 엔진이 호출하면 제한된 범위를 한 번
//! 가져와 파싱된 이벤트 목록을 돌려주고 끝납니다. 배치 도중 취소
//! 프리미티브는 없으며, 외부 도구 호출은 전체가 제한 시간 안에 끝나거나
//! 전체가 실패합니다.

pub mod container;
pub mod file;
pub mod journald;

pub use container::{ContainerCollector, ContainerRuntime, DockerCliRuntime};
pub use file::FileCollector;
pub use journald::{JournalCollector, JournalQuery, JournalRequest, JournalctlQuery};

use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::IngestError;

/// 외부 도구 호출 제한 시간 (초)
///
/// journalctl/docker 호출이 이 시간을 넘기면 행(hang)이 아니라 실패로
/// 처리됩니다.
pub(crate) const TOOL_TIMEOUT_SECS: u64 = 300;

/// 외부 도구를 실행하고 stdout을 돌려줍니다.
///
/// 실패 모드:
/// - 제한 시간 초과 → [`IngestError::ToolTimeout`]
/// - 실행 불가(PATH에 없음 등) 또는 비정상 종료 → [`IngestError::Collector`]
pub(crate) async fn run_tool(tool: &str, args: &[String]) -> Result<String, IngestError> {
    debug!(tool, ?args, "executing collector tool");

    let output = tokio::time::timeout(
        Duration::from_secs(TOOL_TIMEOUT_SECS),
        Command::new(tool).args(args).kill_on_drop(true).output(),
    )
    .await
    .map_err(|_| IngestError::ToolTimeout {
        tool: tool.to_owned(),
        seconds: TOOL_TIMEOUT_SECS,
    })?
    .map_err(|e| IngestError::Collector {
        source_type: tool.to_owned(),
        reason: format!("failed to execute: {e}"),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(IngestError::Collector {
            source_type: tool.to_owned(),
            reason: format!(
                "exit code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            ),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// 수집 호스트의 호스트명을 알아냅니다.
///
/// `HOSTNAME` 환경변수를 먼저 보고, 없으면 `gethostname()`으로
/// 폴백합니다. 둘 다 없으면 `None` — 이벤트의 hostname은 비워 둡니다.
pub(crate) fn local_hostname() -> Option<String> {
    if let Ok(name) = std::env::var("HOSTNAME")
        && !name.is_empty()
    {
        return Some(name);
    }
    nix::unistd::gethostname()
        .ok()
        .and_then(|os| os.into_string().ok())
        .filter(|name| !name.is_empty())
}
