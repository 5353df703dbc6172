//! 대화형 세션 루프 유스케이스.

use std::io::Write;

use anyhow::Result;
use tracing::debug;

use crate::application::ports::{KvStore, LineSource, ReadOutcome};
use crate::application::usecases::dispatch_statement::{
    DispatchStatementUseCase, render_outcome,
};
use crate::domain::session::{INTERACTIVE_HELP, SessionState, ShellInput};
use crate::domain::statement::SYNTAX_HELP;

/// 줄 입력을 읽어 종료 조건을 판정하고 나머지는 문장 실행으로 넘긴다.
pub struct RunSessionUseCase<'a> {
    pub store: &'a dyn KvStore,
}

impl<'a> RunSessionUseCase<'a> {
    /// 세션이 `Stopped`가 될 때까지 반복한다.
    /// 잘못된 문장은 오류로 올라오지 않으며, 입력 장치 오류만 `Err`로 반환된다.
    pub fn execute(
        &self,
        source: &mut dyn LineSource,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<()> {
        let mut state = SessionState::Running;
        while state.is_running() {
            let input = source.read_line()?;
            state = self.step(state, input, out, err)?;
        }
        debug!("session stopped");
        Ok(())
    }

    /// 입력 하나를 처리하고 다음 상태를 반환한다.
    pub fn step(
        &self,
        state: SessionState,
        input: ReadOutcome,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<SessionState> {
        if !state.is_running() {
            return Ok(SessionState::Stopped);
        }

        let line = match input {
            // 입력 중이던 줄이 있으면 비우기만 하고 계속한다.
            ReadOutcome::Interrupted { pending } if pending.is_empty() => {
                return Ok(SessionState::Stopped);
            }
            ReadOutcome::Interrupted { .. } => return Ok(SessionState::Running),
            ReadOutcome::Eof => return Ok(SessionState::Stopped),
            ReadOutcome::Line(line) => line,
        };

        match ShellInput::classify(&line) {
            ShellInput::Empty => Ok(SessionState::Running),
            ShellInput::Terminate => Ok(SessionState::Stopped),
            ShellInput::Help => {
                out.write_all(SYNTAX_HELP.as_bytes())?;
                out.write_all(INTERACTIVE_HELP.as_bytes())?;
                out.flush()?;
                Ok(SessionState::Running)
            }
            ShellInput::Statement(tokens) => {
                let dispatcher = DispatchStatementUseCase { store: self.store };
                let outcome = dispatcher.execute(&tokens, out, err);
                render_outcome(&outcome, out, err)?;
                Ok(SessionState::Running)
            }
        }
    }
}
