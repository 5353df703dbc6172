//! kvsh library root.
//! Clean Architecture + DDD 계층을 외부에 노출한다.

use std::io::Write;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interface;

use application::ports::KvStore;
use application::usecases::{DispatchOutcome, DispatchStatementUseCase};
use domain::statement::tokenize;

/// 라이브러리 직접 호출용 실행 함수.
/// 한 줄을 공백 기준으로 나눠 문장으로 실행한다.
pub fn execute(
    store: &dyn KvStore,
    line: &str,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> DispatchOutcome {
    let tokens = tokenize(line);
    DispatchStatementUseCase { store }.execute(&tokens, out, err)
}
