//! 컨테이너 로그 라인 파서
//!
//! `RFC3339-nanos stream message` 형태를 파싱합니다.
//!
//! ```text
//! 2024-01-15T10:30:45.123456789Z stdout request handled
//! ```
//!
//! stdout은 info, stderr는 warning으로 매핑합니다. unit은 맥락으로 전달된
//! 컨테이너 이름이며, 재개 토큰은 없습니다.

use std::sync::LazyLock;

use chimera_core::event::{NormalizedEvent, Severity, SourceKind};
use chrono::{DateTime, Utc};
use regex::Regex;

use super::{LineParser, SourceContext};

static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+)\s+(stdout|stderr)\s+(.*)$").expect("container line regex is valid")
});

/// 컨테이너 stdout/stderr 로그 파서
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerLogParser;

impl ContainerLogParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self
    }
}

impl LineParser for ContainerLogParser {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Container
    }

    fn parse_line(&self, raw: &str, ctx: &SourceContext<'_>) -> Option<NormalizedEvent> {
        let caps = LINE_RE.captures(raw.trim())?;

        let timestamp = DateTime::parse_from_rfc3339(&caps[1])
            .ok()?
            .with_timezone(&Utc);
        let severity = match &caps[2] {
            "stderr" => Severity::Warning,
            _ => Severity::Info,
        };

        Some(NormalizedEvent {
            timestamp,
            hostname: ctx.hostname.map(str::to_owned),
            source_name: ctx.source_name.to_owned(),
            unit: ctx.container_name.map(str::to_owned),
            facility: None,
            severity: Some(severity),
            pid: None,
            uid: None,
            gid: None,
            message: caps[3].to_owned(),
            raw: raw.to_owned(),
            resume_token: None,
        })
    }
}
