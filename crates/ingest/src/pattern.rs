//! 이름 글롭 매칭
//!
//! unit 이름과 컨테이너 이름 필터에 쓰이는 단순 글롭입니다.
//! `*`는 이름 안의 임의 부분 문자열과 일치하고, 그 외 문자는 전부
//! 리터럴입니다. 빈 패턴 목록은 "필터 없음"을 뜻하며, 호출하는 쪽에서
//! 그렇게 해석합니다.

use regex::Regex;

/// 컴파일된 이름 패턴
///
/// `*`가 없는 패턴은 정확 일치로, 있는 패턴은 앵커된 정규식으로
/// 한 번만 컴파일해 재사용합니다.
#[derive(Debug, Clone)]
pub struct NamePattern {
    exact: Option<String>,
    regex: Option<Regex>,
}

impl NamePattern {
    /// 패턴 문자열을 컴파일합니다.
    ///
    /// 모든 문자가 이스케이프되므로 컴파일은 실패하지 않습니다.
    pub fn compile(pattern: &str) -> Self {
        if !pattern.contains('*') {
            return Self {
                exact: Some(pattern.to_owned()),
                regex: None,
            };
        }
        let anchored = format!("^{}$", regex::escape(pattern).replace("\\*", ".*"));
        Self {
            exact: None,
            regex: Regex::new(&anchored).ok(),
        }
    }

    /// 이름이 이 패턴과 일치하는지 확인합니다.
    pub fn matches(&self, name: &str) -> bool {
        if let Some(exact) = &self.exact {
            return exact == name;
        }
        self.regex.as_ref().is_some_and(|re| re.is_match(name))
    }
}

/// 패턴 목록을 한꺼번에 컴파일합니다.
pub fn compile_all(patterns: &[String]) -> Vec<NamePattern> {
    patterns.iter().map(|p| NamePattern::compile(p)).collect()
}

/// 이름이 패턴 중 하나라도 일치하는지 확인합니다.
///
/// 빈 목록이면 `false`입니다 — "빈 목록 = 필터 없음" 해석은 호출자 몫입니다.
pub fn matches_any(patterns: &[NamePattern], name: &str) -> bool {
    patterns.iter().any(|p| p.matches(name))
}
