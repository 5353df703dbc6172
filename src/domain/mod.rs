//! Domain layer
//! 문장 문법, 세션 상태, 저장 항목을 외부 의존성 없이 표현한다.

pub mod entry;
pub mod session;
pub mod statement;
