//! 프로세스 인자로 받은 문장 하나를 실행하는 배치 모드.

use std::io::{self, Write};

use crate::application::usecases::{DispatchOutcome, render_outcome};
use crate::interface::cli::composition::AppComposition;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

/// 문장을 한 번 실행하고 프로세스 종료 코드를 반환한다.
pub fn run_batch(composition: &AppComposition, tokens: &[String]) -> i32 {
    let mut out = io::stdout();
    let mut err = io::stderr();
    let outcome = composition
        .dispatch_usecase()
        .execute(tokens, &mut out, &mut err);
    finish(&outcome, &mut out, &mut err)
}

fn finish(outcome: &DispatchOutcome, out: &mut dyn Write, err: &mut dyn Write) -> i32 {
    if let Err(write_err) = render_outcome(outcome, out, err) {
        let _ = writeln!(err, "error: {write_err}");
        return EXIT_FAILURE;
    }
    exit_code(outcome)
}

/// 배치 모드 종료 정책. 대화형 모드는 이 값을 쓰지 않는다.
pub fn exit_code(outcome: &DispatchOutcome) -> i32 {
    match outcome {
        DispatchOutcome::Completed => EXIT_OK,
        DispatchOutcome::Usage => EXIT_USAGE,
        DispatchOutcome::Failed(_) => EXIT_FAILURE,
    }
}
