//! tracing 초기화
//!
//! `[general]` 섹션의 log_level/log_format으로 전역 구독자를 설치합니다.
//! `RUST_LOG` 환경변수가 설정되어 있으면 설정 파일의 레벨보다 우선합니다.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use chimera_core::config::GeneralConfig;

use crate::error::CliError;

/// 전역 tracing 구독자를 설치합니다. 프로세스당 한 번만 호출합니다.
///
/// `log_format`이 `json`이면 기계가 읽는 JSON 라인을, `pretty`면 사람이
/// 읽는 컬러 출력을 내보냅니다.
pub fn init_tracing(general: &GeneralConfig) -> Result<(), CliError> {
    let filter = std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .and_then(|spec| spec.parse::<EnvFilter>().ok())
        .unwrap_or_else(|| EnvFilter::new(&general.log_level));

    let builder = fmt().with_env_filter(filter);
    let installed = match general.log_format.as_str() {
        "json" => builder.json().try_init(),
        "pretty" => builder.pretty().try_init(),
        other => {
            return Err(CliError::Config(format!(
                "unsupported log_format '{other}'"
            )));
        }
    };
    installed.map_err(|e| CliError::Config(format!("tracing setup failed: {e}")))
}
