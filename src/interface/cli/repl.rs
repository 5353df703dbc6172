//! `kvsh` 대화형 쉘(REPL) 인터페이스.

use std::io::{self, IsTerminal, Write};

use anyhow::Result;

use crate::interface::cli::composition::AppComposition;

/// 종료 조건까지 줄 단위로 문장을 실행한다.
pub fn run_repl(composition: &AppComposition) -> Result<()> {
    let mut source = composition.line_source();
    let mut out = io::stdout();
    let mut err = io::stderr();

    if out.is_terminal() {
        writeln!(out, r"Type \? for help, \q to exit.")?;
        out.flush()?;
    }

    composition
        .session_usecase()
        .execute(&mut source, &mut out, &mut err)
}
