//! 문장 하나를 검증하고 저장소에 실행하는 유스케이스.

use std::io::{self, Write};

use anyhow::Result;
use tracing::{debug, warn};

use crate::application::ports::KvStore;
use crate::domain::entry::IteratorOptions;
use crate::domain::statement::{SYNTAX_HELP, Statement};

/// 문장 실행 결과. 배치 모드와 대화형 모드가 같은 결과에 서로 다른 정책을 적용한다.
#[derive(Debug)]
pub enum DispatchOutcome {
    Completed,
    /// 알 수 없는 동사 또는 인자 개수 불일치. 저장소는 건드리지 않는다.
    Usage,
    /// 저장소 연산 실패.
    Failed(anyhow::Error),
}

impl DispatchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, DispatchOutcome::Completed)
    }
}

pub struct DispatchStatementUseCase<'a> {
    pub store: &'a dyn KvStore,
}

impl<'a> DispatchStatementUseCase<'a> {
    /// 정확히 한 문장을 실행한다.
    /// 어떤 실패도 호출자에게 전파하지 않고 `DispatchOutcome`으로 돌려준다.
    pub fn execute(
        &self,
        tokens: &[String],
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> DispatchOutcome {
        let statement = match Statement::parse(tokens) {
            Ok(statement) => statement,
            Err(reason) => {
                debug!(%reason, "statement rejected");
                return DispatchOutcome::Usage;
            }
        };

        debug!(verb = statement.verb().as_str(), "dispatching statement");
        match self.run(&statement, out, err) {
            Ok(()) => DispatchOutcome::Completed,
            Err(cause) => DispatchOutcome::Failed(cause),
        }
    }

    fn run(&self, statement: &Statement, out: &mut dyn Write, err: &mut dyn Write) -> Result<()> {
        match statement {
            Statement::Get { key } => {
                let value = self
                    .store
                    .get(key)?
                    .map(|item| item.value)
                    .unwrap_or_default();
                // 빈 값과 없는 키는 아무것도 출력하지 않는다.
                if !value.is_empty() {
                    out.write_all(&value)?;
                    out.write_all(b"\n")?;
                }
            }
            Statement::Set { key, value, meta } => self.store.set(key, value, *meta)?,
            Statement::Delete { key } => self.store.delete(key)?,
            Statement::Dump => self.dump(out, err)?,
        }
        out.flush()?;
        Ok(())
    }

    fn dump(&self, out: &mut dyn Write, err: &mut dyn Write) -> Result<()> {
        let entries = self.store.iter(&IteratorOptions::default())?;
        let mut skipped = 0usize;

        for entry in entries {
            let entry = entry?;
            match entry.value {
                Ok(value) => {
                    out.write_all(&entry.key)?;
                    out.write_all(b" ")?;
                    out.write_all(&value)?;
                    out.write_all(b"\n")?;
                }
                Err(cause) => {
                    // 값 조회 실패 항목은 건너뛰고 스캔을 계속한다.
                    let key = String::from_utf8_lossy(&entry.key);
                    warn!(%key, error = %cause, "skipping entry with unreadable value");
                    writeln!(err, "error: {key}: {cause:#}")?;
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            debug!(skipped, "dump finished with skipped entries");
        }
        Ok(())
    }
}

/// 실행 결과를 사용자에게 보여 준다.
/// 사용법 오류는 문법 도움말을 stdout에, 연산 실패는 `error: ` 접두어로 stderr에 쓴다.
pub fn render_outcome(
    outcome: &DispatchOutcome,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> io::Result<()> {
    match outcome {
        DispatchOutcome::Completed => Ok(()),
        DispatchOutcome::Usage => {
            out.write_all(SYNTAX_HELP.as_bytes())?;
            out.flush()
        }
        DispatchOutcome::Failed(cause) => {
            writeln!(err, "error: {cause:#}")?;
            err.flush()
        }
    }
}
