//! syslog 형식 파일 라인 파서
//!
//! 클래식 BSD syslog 라인 형태를 고정 문법으로 파싱합니다.
//!
//! ```text
//! <PRI>Mon dd HH:MM:SS hostname program[pid]: message
//! ```
//!
//! PRI의 하위 3비트가 심각도를 결정합니다 (PRI = facility * 8 + severity).
//! 타임스탬프에 연도가 없으므로 현재 연도로 가정합니다. 파일 소스에는
//! 재개 토큰이 없습니다 — 재스캔 시 중복은 내용 핑거프린트가 막습니다.

use std::sync::LazyLock;

use chimera_core::event::{NormalizedEvent, Severity, SourceKind};
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use regex::Regex;

use super::{LineParser, SourceContext};

/// 유효한 최대 PRI 값 (facility 최댓값 23 * 8 + severity 최댓값 7)
const MAX_SYSLOG_PRI: u16 = 191;

static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^<(\d{1,3})>(\w{3})\s+(\d{1,2})\s+(\d{2}:\d{2}:\d{2})\s+(\S+)\s+([^\s:\[]+)(?:\[(\d+)\])?:\s*(.*)$",
    )
    .expect("syslog line regex is valid")
});

/// syslog 파일 라인 파서
#[derive(Debug, Clone, Copy, Default)]
pub struct SyslogFileParser;

impl SyslogFileParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// 연도 없는 syslog 타임스탬프를 현재 연도 기준 UTC로 해석합니다.
    fn parse_timestamp(month: &str, day: &str, time: &str) -> Option<DateTime<Utc>> {
        let year = Utc::now().year();
        let composed = format!("{year} {month} {day} {time}");
        let naive = NaiveDateTime::parse_from_str(&composed, "%Y %b %d %H:%M:%S").ok()?;
        Some(naive.and_utc())
    }
}

impl LineParser for SyslogFileParser {
    fn source_kind(&self) -> SourceKind {
        SourceKind::File
    }

    fn parse_line(&self, raw: &str, ctx: &SourceContext<'_>) -> Option<NormalizedEvent> {
        let caps = LINE_RE.captures(raw.trim())?;

        let pri = caps[1].parse::<u16>().ok()?;
        if pri > MAX_SYSLOG_PRI {
            return None;
        }
        let severity = Severity::from_priority((pri & 0x07) as u8)?;

        let timestamp = Self::parse_timestamp(&caps[2], &caps[3], &caps[4])?;
        let pid = caps.get(7).and_then(|m| m.as_str().parse::<i64>().ok());

        Some(NormalizedEvent {
            timestamp,
            hostname: Some(caps[5].to_owned()),
            source_name: ctx.source_name.to_owned(),
            unit: Some(caps[6].to_owned()),
            facility: None,
            severity: Some(severity),
            pid,
            uid: None,
            gid: None,
            message: caps[8].to_owned(),
            raw: raw.to_owned(),
            resume_token: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> SourceContext<'static> {
        SourceContext::new("system-files")
    }

    #[test]
    fn parses_line_with_pid() {
        let parser = SyslogFileParser::new();
        let line = "<11>Jan 15 10:30:45 server-01 sshd[4321]: Failed password for root";
        let event = parser.parse_line(line, &ctx()).unwrap();

        assert_eq!(event.hostname.as_deref(), Some("server-01"));
        assert_eq!(event.unit.as_deref(), Some("sshd"));
        assert_eq!(event.pid, Some(4321));
        assert_eq!(event.message, "Failed password for root");
        assert_eq!(event.resume_token, None);
        assert_eq!(event.facility, None);
    }

    #[test]
    fn priority_11_maps_to_err() {
        // 11 = 0b00001011, facility=1, severity=3
        let parser = SyslogFileParser::new();
        let line = "<11>Jan 15 10:30:45 h prog: m";
        let event = parser.parse_line(line, &ctx()).unwrap();
        assert_eq!(event.severity, Some(Severity::Err));
    }

    #[test]
    fn priority_low_bits_select_severity() {
        let parser = SyslogFileParser::new();
        // 30 = facility 3, severity 6 (info)
        let event = parser
            .parse_line("<30>Feb  3 01:02:03 h cron: tick", &ctx())
            .unwrap();
        assert_eq!(event.severity, Some(Severity::Info));
    }

    #[test]
    fn line_without_pid() {
        let parser = SyslogFileParser::new();
        let line = "<13>Mar 10 08:00:00 host kernel: oom-killer invoked";
        let event = parser.parse_line(line, &ctx()).unwrap();
        assert_eq!(event.unit.as_deref(), Some("kernel"));
        assert_eq!(event.pid, None);
    }

    #[test]
    fn current_year_is_assumed() {
        let parser = SyslogFileParser::new();
        let line = "<11>Jan 15 10:30:45 h prog: m";
        let event = parser.parse_line(line, &ctx()).unwrap();
        assert_eq!(event.timestamp.year(), Utc::now().year());
    }

    #[test]
    fn single_digit_day_parses() {
        let parser = SyslogFileParser::new();
        let line = "<11>Jan  5 10:30:45 h prog: m";
        let event = parser.parse_line(line, &ctx()).unwrap();
        assert_eq!(event.timestamp.day(), 5);
    }

    #[test]
    fn malformed_lines_return_none() {
        let parser = SyslogFileParser::new();
        assert!(parser.parse_line("", &ctx()).is_none());
        assert!(parser.parse_line("no priority here", &ctx()).is_none());
        assert!(parser.parse_line("<11>not a timestamp h p: m", &ctx()).is_none());
        assert!(parser.parse_line("<abc>Jan 15 10:30:45 h p: m", &ctx()).is_none());
    }

    #[test]
    fn out_of_range_pri_is_dropped() {
        let parser = SyslogFileParser::new();
        let line = "<200>Jan 15 10:30:45 h prog: m";
        assert!(parser.parse_line(line, &ctx()).is_none());
    }

    #[test]
    fn invalid_calendar_date_is_dropped() {
        let parser = SyslogFileParser::new();
        let line = "<11>Feb 31 10:30:45 h prog: m";
        assert!(parser.parse_line(line, &ctx()).is_none());
    }

    #[test]
    fn empty_message_is_allowed() {
        let parser = SyslogFileParser::new();
        let line = "<11>Jan 15 10:30:45 h prog[1]:";
        let event = parser.parse_line(line, &ctx()).unwrap();
        assert_eq!(event.message, "");
    }
}
