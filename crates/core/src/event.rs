//! 도메인 타입 — 정규화된 로그 이벤트와 심각도
//!
//! 모든 수집 소스(journald, 파일, 컨테이너)는 파싱 후 [`NormalizedEvent`]
//! 하나의 형태로 수렴합니다. 식별([`crate::identity`])과 저장은 이 타입만을
//! 입력으로 받습니다.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// 수집 소스 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// systemd journal (journalctl)
    Journald,
    /// syslog 형식 플랫 파일
    File,
    /// 컨테이너 stdout/stderr 로그
    Container,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Journald => write!(f, "journald"),
            Self::File => write!(f, "file"),
            Self::Container => write!(f, "container"),
        }
    }
}

/// syslog 심각도 레벨
///
/// RFC 5424의 8단계 열거형을 그대로 사용합니다 (0=emerg .. 7=debug).
/// 매핑할 수 없는 입력은 [`Severity::Unmapped`]로 원문 그대로 보존되어
/// 저장과 핑거프린트 계산에 참여합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Severity {
    /// 시스템 사용 불가
    Emerg,
    /// 즉시 조치 필요
    Alert,
    /// 치명적 상태
    Crit,
    /// 에러
    Err,
    /// 경고
    Warning,
    /// 정상이지만 주목할 상태
    Notice,
    /// 정보성 이벤트
    Info,
    /// 디버그
    Debug,
    /// 8단계에 매핑되지 않은 원문 값
    Unmapped(String),
}

impl Severity {
    /// journald/syslog 우선순위(0~7)를 심각도로 변환합니다.
    pub fn from_priority(priority: u8) -> Option<Self> {
        match priority {
            0 => Some(Self::Emerg),
            1 => Some(Self::Alert),
            2 => Some(Self::Crit),
            3 => Some(Self::Err),
            4 => Some(Self::Warning),
            5 => Some(Self::Notice),
            6 => Some(Self::Info),
            7 => Some(Self::Debug),
            _ => None,
        }
    }

    /// 문자열에서 심각도를 파싱합니다.
    ///
    /// 정식 8단계 이름이 아니면 [`Severity::Unmapped`]로 원문을 보존합니다.
    pub fn parse(s: &str) -> Self {
        match s {
            "emerg" => Self::Emerg,
            "alert" => Self::Alert,
            "crit" => Self::Crit,
            "err" => Self::Err,
            "warning" => Self::Warning,
            "notice" => Self::Notice,
            "info" => Self::Info,
            "debug" => Self::Debug,
            other => Self::Unmapped(other.to_owned()),
        }
    }

    /// 저장/핑거프린트에 쓰이는 정규 문자열 형태를 반환합니다.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Emerg => "emerg",
            Self::Alert => "alert",
            Self::Crit => "crit",
            Self::Err => "err",
            Self::Warning => "warning",
            Self::Notice => "notice",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Unmapped(raw) => raw,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// 정규화된 로그 이벤트
///
/// 파서가 생성하는 정식 레코드입니다. `timestamp`는 항상 해석 가능한
/// UTC 값입니다 — 타임스탬프를 해석할 수 없는 입력은 파서 단계에서
/// 버려지며, null 타임스탬프로 저장되는 일은 없습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// 이벤트 발생 시각 (UTC, 마이크로초 정밀도)
    pub timestamp: DateTime<Utc>,
    /// 호스트명
    pub hostname: Option<String>,
    /// 설정상의 소스 식별자 (예: "system-journald")
    pub source_name: String,
    /// 서비스/프로그램 이름 (systemd unit, syslog 프로그램명, 컨테이너명)
    pub unit: Option<String>,
    /// syslog facility (원문 그대로)
    pub facility: Option<String>,
    /// 심각도
    pub severity: Option<Severity>,
    /// 프로세스 ID
    pub pid: Option<i64>,
    /// 사용자 ID
    pub uid: Option<i64>,
    /// 그룹 ID
    pub gid: Option<i64>,
    /// 로그 메시지 (빈 문자열 허용)
    pub message: String,
    /// 원본 직렬화 형태 (감사용)
    pub raw: String,
    /// 소스 고유 재개 토큰 (journald 커서 등, 없을 수 있음)
    pub resume_token: Option<String>,
}

impl fmt::Display for NormalizedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.severity.as_ref().map_or("-", Severity::as_str),
            self.hostname.as_deref().unwrap_or("-"),
            self.unit.as_deref().unwrap_or("-"),
            self.message,
        )
    }
}
