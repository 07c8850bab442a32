//! 서브커맨드 출력 계층
//!
//! 커맨드 핸들러는 결과를 뷰 구조체로 만들어 [`Reporter::emit`]에 넘기고,
//! 텍스트/JSON 분기는 전부 여기서 처리합니다. JSON 형태는 뷰의 serde
//! 직렬화가 곧 계약이므로, 뷰는 [`TextView`]와 함께 `Serialize`를
//! 구현해야 합니다.

use std::io;
use std::io::Write;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// 사람이 읽는 텍스트 표현을 가진 출력 뷰
///
/// JSON 출력은 serde 직렬화를 그대로 쓰므로 별도 메서드가 없습니다.
pub trait TextView: Serialize {
    /// 텍스트 형태를 `out`에 씁니다.
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()>;
}

/// 선택된 출력 형식으로 뷰를 내보내는 리포터
pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    /// 출력 형식을 지정해 리포터를 만듭니다.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// 뷰 하나를 stdout으로 내보냅니다.
    pub fn emit<V: TextView>(&self, view: &V) -> Result<(), CliError> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        match self.format {
            OutputFormat::Text => view.write_text(&mut out)?,
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(view)?;
                writeln!(out, "{json}")?;
            }
        }
        Ok(())
    }
}
