//! 애플리케이션 포트를 실제 인프라 구현체로 연결하는 어댑터 계층.

mod history;
mod terminal_line_source;

pub use history::History;
pub use terminal_line_source::TerminalLineSource;
