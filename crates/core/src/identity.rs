//! 이벤트 식별 — 내용 기반 핑거프린트와 결정적 레코드 ID
//!
//! journald 커서 같은 소스 고유 토큰은 파일/컨테이너 소스에는 존재하지
//! 않습니다. 대신 이벤트의 식별 필드를 이어붙여 해시한 핑거프린트가
//! 소스에 무관한 멱등성 키 역할을 합니다. 같은 논리적 이벤트가 몇 번
//! 재관측되든 항상 같은 `record_id`로 수렴하므로, 저장소의 기본 키
//! 충돌 무시 삽입만으로 중복이 제거됩니다.

use chrono::SecondsFormat;
use sha2::{Digest, Sha256};

use crate::event::{NormalizedEvent, Severity};

/// 핑거프린트 입력 필드를 잇는 구분자
const FIELD_DELIMITER: &str = "|";

/// 이벤트에서 파생된 결정적 식별자 쌍
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventIdentity {
    /// 식별 필드에 대한 SHA-256 16진수 다이제스트
    pub fingerprint: String,
    /// 다이제스트 앞 8바이트(big-endian)를 부호 있는 64비트 정수로 해석한 값.
    /// 저장소의 기본 키로 사용됩니다.
    pub record_id: i64,
}

/// 이벤트의 핑거프린트와 레코드 ID를 계산합니다.
///
/// 해시 대상은 `(timestamp, hostname, unit, severity, pid, message)`이며,
/// `raw`와 `resume_token`은 식별에 참여하지 않습니다 — 같은 내용이
/// 다른 경로로 재관측되어도 동일한 식별자가 나와야 하기 때문입니다.
pub fn identify(event: &NormalizedEvent) -> EventIdentity {
    let digest = Sha256::digest(canonical_key(event).as_bytes());

    let mut id_bytes = [0u8; 8];
    id_bytes.copy_from_slice(&digest[..8]);

    EventIdentity {
        fingerprint: to_hex(&digest),
        record_id: i64::from_be_bytes(id_bytes),
    }
}

/// 식별 필드의 정규 문자열 형태를 만듭니다.
///
/// 타임스탬프는 마이크로초 정밀도의 RFC 3339로 고정합니다. 없는 필드는
/// 빈 문자열로 표현됩니다.
fn canonical_key(event: &NormalizedEvent) -> String {
    let ts = event.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true);
    let pid = event.pid.map(|p| p.to_string()).unwrap_or_default();
    [
        ts.as_str(),
        event.hostname.as_deref().unwrap_or(""),
        event.unit.as_deref().unwrap_or(""),
        event.severity.as_ref().map_or("", Severity::as_str),
        pid.as_str(),
        event.message.as_str(),
    ]
    .join(FIELD_DELIMITER)
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(message: &str) -> NormalizedEvent {
        NormalizedEvent {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 45).unwrap(),
            hostname: Some("h".to_owned()),
            source_name: "system-journald".to_owned(),
            unit: Some("nginx.service".to_owned()),
            facility: None,
            severity: Some(Severity::Info),
            pid: Some(42),
            uid: None,
            gid: None,
            message: message.to_owned(),
            raw: "{\"MESSAGE\":\"ok\"}".to_owned(),
            resume_token: Some("cursor-0".to_owned()),
        }
    }

    #[test]
    fn identical_content_yields_identical_identity() {
        let a = identify(&event("ok"));
        let b = identify(&event("ok"));
        assert_eq!(a, b);
    }

    #[test]
    fn raw_and_resume_token_do_not_affect_identity() {
        let base = event("ok");
        let mut variant = base.clone();
        variant.raw = "totally different serialization".to_owned();
        variant.resume_token = None;
        assert_eq!(identify(&base), identify(&variant));
    }

    #[test]
    fn message_change_yields_different_identity() {
        let a = identify(&event("ok"));
        let b = identify(&event("not ok"));
        assert_ne!(a.fingerprint, b.fingerprint);
        assert_ne!(a.record_id, b.record_id);
    }

    #[test]
    fn timestamp_microseconds_participate_in_identity() {
        let base = event("ok");
        let mut shifted = base.clone();
        shifted.timestamp += chrono::Duration::microseconds(1);
        assert_ne!(identify(&base), identify(&shifted));
    }

    #[test]
    fn fingerprint_is_hex_sha256() {
        let id = identify(&event("ok"));
        assert_eq!(id.fingerprint.len(), 64);
        assert!(id.fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn record_id_matches_fingerprint_prefix() {
        let id = identify(&event("ok"));
        // record_id는 핑거프린트의 앞 16 hex 문자를 big-endian으로 읽은 값
        let prefix = u64::from_str_radix(&id.fingerprint[..16], 16).unwrap();
        assert_eq!(id.record_id, prefix as i64);
    }

    #[test]
    fn canonical_key_uses_empty_string_for_missing_fields() {
        let mut e = event("ok");
        e.hostname = None;
        e.pid = None;
        e.severity = None;
        let key = canonical_key(&e);
        assert!(key.contains("|||"));
        assert!(key.ends_with("|ok"));
    }
}
