//! journald JSON 엔트리 파서
//!
//! `journalctl -o json` 출력의 한 줄(엔트리 하나)을 소비합니다.
//!
//! # 필드 매핑
//! - `__REALTIME_TIMESTAMP` (마이크로초) → UTC 타임스탬프. 없거나 숫자가
//!   아니면 엔트리를 버립니다.
//! - `PRIORITY` 0~7 → 8단계 심각도. 그 외 값은 원문 그대로 통과.
//! - unit은 `_SYSTEMD_UNIT`, 없으면 `SYSLOG_IDENTIFIER`로 폴백.
//! - `__CURSOR` → 재개 토큰.

use chimera_core::event::{NormalizedEvent, Severity, SourceKind};
use chrono::DateTime;
use serde_json::Value;

use super::{LineParser, SourceContext};

/// journald 구조화 엔트리 파서
#[derive(Debug, Clone, Copy, Default)]
pub struct JournaldParser;

impl JournaldParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// `PRIORITY` 값을 심각도로 변환합니다.
    ///
    /// 0~7 밖의 값은 [`Severity::Unmapped`]로 원문을 보존합니다.
    fn parse_priority(value: Option<&str>) -> Option<Severity> {
        let value = value?;
        match value.parse::<u8>().ok().and_then(Severity::from_priority) {
            Some(severity) => Some(severity),
            None => Some(Severity::Unmapped(value.to_owned())),
        }
    }

    /// `__REALTIME_TIMESTAMP`(마이크로초 문자열)를 UTC로 변환합니다.
    fn parse_realtime_timestamp(micros: Option<&str>) -> Option<DateTime<chrono::Utc>> {
        let micros = micros?.parse::<i64>().ok()?;
        DateTime::from_timestamp_micros(micros)
    }
}

/// JSON 값에서 문자열 필드를 꺼냅니다. 숫자도 문자열로 받아들입니다.
fn field(entry: &Value, key: &str) -> Option<String> {
    match entry.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn int_field(entry: &Value, key: &str) -> Option<i64> {
    field(entry, key)?.parse::<i64>().ok()
}

impl LineParser for JournaldParser {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Journald
    }

    fn parse_line(&self, raw: &str, ctx: &SourceContext<'_>) -> Option<NormalizedEvent> {
        let entry: Value = serde_json::from_str(raw).ok()?;
        if !entry.is_object() {
            return None;
        }

        let timestamp = Self::parse_realtime_timestamp(
            field(&entry, "__REALTIME_TIMESTAMP").as_deref(),
        )?;

        let unit = field(&entry, "_SYSTEMD_UNIT").or_else(|| field(&entry, "SYSLOG_IDENTIFIER"));

        Some(NormalizedEvent {
            timestamp,
            hostname: field(&entry, "_HOSTNAME"),
            source_name: ctx.source_name.to_owned(),
            unit,
            facility: field(&entry, "SYSLOG_FACILITY"),
            severity: Self::parse_priority(field(&entry, "PRIORITY").as_deref()),
            pid: int_field(&entry, "_PID"),
            uid: int_field(&entry, "_UID"),
            gid: int_field(&entry, "_GID"),
            message: field(&entry, "MESSAGE").unwrap_or_default(),
            raw: raw.to_owned(),
            resume_token: field(&entry, "__CURSOR"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> SourceContext<'static> {
        SourceContext::new("system-journald")
    }

    fn entry_json(priority: &str) -> String {
        format!(
            r#"{{"__REALTIME_TIMESTAMP":"1705314645123456","_HOSTNAME":"server-01",
                "_SYSTEMD_UNIT":"nginx.service","PRIORITY":"{priority}","_PID":"1234",
                "_UID":"0","_GID":"0","SYSLOG_FACILITY":"3","MESSAGE":"request handled",
                "__CURSOR":"s=abc;i=1"}}"#
        )
        .replace('\n', "")
    }

    #[test]
    fn parses_complete_entry() {
        let parser = JournaldParser::new();
        let event = parser.parse_line(&entry_json("6"), &ctx()).unwrap();

        assert_eq!(event.hostname.as_deref(), Some("server-01"));
        assert_eq!(event.unit.as_deref(), Some("nginx.service"));
        assert_eq!(event.severity, Some(Severity::Info));
        assert_eq!(event.pid, Some(1234));
        assert_eq!(event.facility.as_deref(), Some("3"));
        assert_eq!(event.message, "request handled");
        assert_eq!(event.resume_token.as_deref(), Some("s=abc;i=1"));
        assert_eq!(event.source_name, "system-journald");
        // 1705314645123456µs = 2024-01-15T10:30:45.123456Z
        assert_eq!(event.timestamp.timestamp_micros(), 1_705_314_645_123_456);
    }

    #[test]
    fn priority_4_maps_to_warning() {
        let parser = JournaldParser::new();
        let event = parser.parse_line(&entry_json("4"), &ctx()).unwrap();
        assert_eq!(event.severity, Some(Severity::Warning));
    }

    #[test]
    fn unmapped_priority_passes_through() {
        let parser = JournaldParser::new();
        let event = parser.parse_line(&entry_json("9"), &ctx()).unwrap();
        assert_eq!(event.severity, Some(Severity::Unmapped("9".to_owned())));
    }

    #[test]
    fn missing_timestamp_drops_entry() {
        let parser = JournaldParser::new();
        let line = r#"{"_HOSTNAME":"h","MESSAGE":"no ts"}"#;
        assert!(parser.parse_line(line, &ctx()).is_none());
    }

    #[test]
    fn unparseable_timestamp_drops_entry() {
        let parser = JournaldParser::new();
        let line = r#"{"__REALTIME_TIMESTAMP":"not-a-number","MESSAGE":"m"}"#;
        assert!(parser.parse_line(line, &ctx()).is_none());
    }

    #[test]
    fn malformed_json_returns_none() {
        let parser = JournaldParser::new();
        assert!(parser.parse_line("{truncated", &ctx()).is_none());
        assert!(parser.parse_line("", &ctx()).is_none());
        assert!(parser.parse_line("[1,2,3]", &ctx()).is_none());
    }

    #[test]
    fn unit_falls_back_to_syslog_identifier() {
        let parser = JournaldParser::new();
        let line = r#"{"__REALTIME_TIMESTAMP":"1705314645000000","SYSLOG_IDENTIFIER":"cron","MESSAGE":"m"}"#;
        let event = parser.parse_line(line, &ctx()).unwrap();
        assert_eq!(event.unit.as_deref(), Some("cron"));
    }

    #[test]
    fn missing_optional_fields_become_none() {
        let parser = JournaldParser::new();
        let line = r#"{"__REALTIME_TIMESTAMP":"1705314645000000"}"#;
        let event = parser.parse_line(line, &ctx()).unwrap();
        assert_eq!(event.hostname, None);
        assert_eq!(event.unit, None);
        assert_eq!(event.severity, None);
        assert_eq!(event.pid, None);
        assert_eq!(event.message, "");
        assert_eq!(event.resume_token, None);
    }

    #[test]
    fn raw_preserves_original_line() {
        let parser = JournaldParser::new();
        let line = entry_json("6");
        let event = parser.parse_line(&line, &ctx()).unwrap();
        assert_eq!(event.raw, line);
    }
}
