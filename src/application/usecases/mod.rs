//! 문장 실행과 세션 루프 유스케이스.

pub mod dispatch_statement;
pub mod run_session;

pub use dispatch_statement::{DispatchOutcome, DispatchStatementUseCase, render_outcome};
pub use run_session::RunSessionUseCase;
