//! 설정 관리 — chimera.toml 파싱 및 런타임 설정
//!
//! [`ChimeraConfig`]는 엔진이 소비하는 읽기 전용 설정의 최상위 구조체입니다.
//! 전역 싱글턴은 없습니다 — 호출자가 로드하여 엔진에 명시적으로 전달합니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`CHIMERA_STORAGE_DB_PATH=/tmp/x.db` 형식)
//! 2. 설정 파일 (`chimera.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), chimera_core::error::ChimeraError> {
//! use chimera_core::config::ChimeraConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ChimeraConfig::load("chimera.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ChimeraConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ChimeraError, ConfigError};
use crate::event::SourceKind;

/// Chimera 통합 설정
///
/// `chimera.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChimeraConfig {
    /// 일반 설정
    pub general: GeneralConfig,
    /// 로그 저장소 설정
    pub storage: StorageConfig,
    /// 수집 동작 설정
    pub ingest: IngestConfig,
    /// 수집 소스 목록
    pub sources: Vec<SourceConfig>,
}

impl ChimeraConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ChimeraError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ChimeraError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ChimeraError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ChimeraError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ChimeraError> {
        toml::from_str(toml_str).map_err(|e| {
            ChimeraError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `CHIMERA_{SECTION}_{FIELD}`
    /// 소스 목록은 환경변수로 오버라이드할 수 없습니다.
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "CHIMERA_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "CHIMERA_GENERAL_LOG_FORMAT");

        override_string(&mut self.storage.db_path, "CHIMERA_STORAGE_DB_PATH");

        override_u64(
            &mut self.ingest.default_window_secs,
            "CHIMERA_INGEST_DEFAULT_WINDOW_SECS",
        );
        override_usize(&mut self.ingest.max_limit, "CHIMERA_INGEST_MAX_LIMIT");
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 잘못된 설정은 수집이 시작되기 전에 여기서 거부됩니다.
    pub fn validate(&self) -> Result<(), ChimeraError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.storage.db_path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "storage.db_path".to_owned(),
                reason: "db_path must not be empty".to_owned(),
            }
            .into());
        }

        if self.ingest.default_window_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ingest.default_window_secs".to_owned(),
                reason: "window must be at least 1 second".to_owned(),
            }
            .into());
        }

        if self.ingest.max_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ingest.max_limit".to_owned(),
                reason: "max_limit must be at least 1".to_owned(),
            }
            .into());
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if source.name.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "sources.name".to_owned(),
                    reason: "source name must not be empty".to_owned(),
                }
                .into());
            }
            if !names.insert(source.name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "sources.name".to_owned(),
                    reason: format!("duplicate source name '{}'", source.name),
                }
                .into());
            }
            source.validate()?;
        }

        Ok(())
    }

    /// 활성화된 소스 목록을 설정 순서대로 반환합니다.
    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|s| s.enabled)
    }

    /// 이름으로 소스를 찾습니다.
    pub fn source_by_name(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }
}

impl Default for ChimeraConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            storage: StorageConfig::default(),
            ingest: IngestConfig::default(),
            sources: default_sources(),
        }
    }
}

/// 기본 소스 세트
///
/// 시스템 저널, 표준 /var/log 파일 세트, 그리고 기본 비활성 상태의
/// 도커 컨테이너 소스로 구성됩니다.
fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            name: "system-journald".to_owned(),
            kind: SourceKind::Journald,
            enabled: true,
            journald: JournaldOptions {
                units: Vec::new(),
                exclude_units: vec!["systemd-*".to_owned(), "dbus-*".to_owned()],
            },
            file: FileOptions::default(),
            container: ContainerOptions::default(),
        },
        SourceConfig {
            name: "system-files".to_owned(),
            kind: SourceKind::File,
            enabled: true,
            journald: JournaldOptions::default(),
            file: FileOptions {
                paths: vec![
                    "/var/log/syslog".to_owned(),
                    "/var/log/auth.log".to_owned(),
                    "/var/log/kern.log".to_owned(),
                    "/var/log/dpkg.log".to_owned(),
                ],
                patterns: vec!["*.log".to_owned(), "*.log.*".to_owned()],
                max_file_size_mb: 100,
            },
            container: ContainerOptions::default(),
        },
        SourceConfig {
            name: "docker-containers".to_owned(),
            kind: SourceKind::Container,
            enabled: false,
            journald: JournaldOptions::default(),
            file: FileOptions::default(),
            container: ContainerOptions {
                runtime: "docker".to_owned(),
                include_patterns: vec!["*".to_owned()],
                exclude_patterns: vec!["chimera-*".to_owned()],
            },
        },
    ]
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 로그 저장소 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite 데이터베이스 파일 경로
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "/var/lib/chimera/chimera.db".to_owned(),
        }
    }
}

/// 수집 동작 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// 커서가 없을 때 조회할 기본 시간 창 (초)
    pub default_window_secs: u64,
    /// 호출당 수집 엔트리 상한
    pub max_limit: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            default_window_secs: 3600,
            max_limit: 10_000,
        }
    }
}

/// 수집 소스 설정
///
/// `kind`에 해당하는 옵션 섹션만 의미를 가지며, 나머지 섹션은 기본값으로
/// 남습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// 고유한 소스 이름
    pub name: String,
    /// 소스 종류
    pub kind: SourceKind,
    /// 활성화 여부
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// journald 소스 옵션
    #[serde(default)]
    pub journald: JournaldOptions,
    /// 파일 소스 옵션
    #[serde(default)]
    pub file: FileOptions,
    /// 컨테이너 소스 옵션
    #[serde(default)]
    pub container: ContainerOptions,
}

impl SourceConfig {
    /// 소스 단위 유효성 검증
    fn validate(&self) -> Result<(), ConfigError> {
        if self.kind == SourceKind::File {
            if self.enabled && self.file.paths.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("sources.{}.file.paths", self.name),
                    reason: "enabled file source needs at least one path".to_owned(),
                });
            }
            for pattern in &self.file.patterns {
                glob::Pattern::new(pattern).map_err(|e| ConfigError::InvalidValue {
                    field: format!("sources.{}.file.patterns", self.name),
                    reason: format!("invalid glob '{pattern}': {e}"),
                })?;
            }
        }
        Ok(())
    }
}

fn default_enabled() -> bool {
    true
}

/// journald 소스 옵션
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JournaldOptions {
    /// 이 unit들만 조회 (`journalctl -u`). 비어 있으면 전체.
    pub units: Vec<String>,
    /// 제외할 unit 글롭 패턴 (`*`는 임의 부분 문자열)
    pub exclude_units: Vec<String>,
}

/// 파일 소스 옵션
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOptions {
    /// 스캔할 파일 또는 디렉토리 경로
    pub paths: Vec<String>,
    /// 디렉토리 경로에 적용할 파일명 글롭 패턴
    pub patterns: Vec<String>,
    /// 이 크기(MB)를 넘는 파일은 스캔하지 않음
    pub max_file_size_mb: u64,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            patterns: vec!["*.log".to_owned()],
            max_file_size_mb: 100,
        }
    }
}

/// 컨테이너 소스 옵션
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    /// 컨테이너 런타임 (현재 docker만 지원)
    pub runtime: String,
    /// 포함할 컨테이너 이름 글롭 (OR 결합)
    pub include_patterns: Vec<String>,
    /// 제외할 컨테이너 이름 글롭
    pub exclude_patterns: Vec<String>,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            runtime: "docker".to_owned(),
            include_patterns: vec!["*".to_owned()],
            exclude_patterns: Vec::new(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}
