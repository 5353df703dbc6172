//! 대화형 세션 상태와 입력 분류 규칙.

use crate::domain::statement::tokenize;

/// 세션 종료 토큰.
pub const TERMINATE_TOKENS: [&str; 2] = [r"\q", "exit"];
/// 대화형 도움말 토큰.
pub const HELP_TOKENS: [&str; 2] = [r"\?", r"\help"];

/// 대화형 모드에서만 추가로 안내하는 도움말.
pub const INTERACTIVE_HELP: &str = "\
Type:
  \\q or exit               exit (Ctrl+C on an empty line/Ctrl+D also supported)
  \\? or \\help              print this help.
";

/// 세션 루프 상태. `Stopped`는 종단 상태이며 다시 `Running`으로 돌아가지 않는다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Running,
    Stopped,
}

impl SessionState {
    pub fn is_running(self) -> bool {
        self == SessionState::Running
    }
}

/// 입력 한 줄을 세션 관점에서 분류한 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    Empty,
    Terminate,
    Help,
    Statement(Vec<String>),
}

impl ShellInput {
    /// 첫 토큰만 보고 종료/도움말/문장을 구분한다.
    pub fn classify(line: &str) -> Self {
        let tokens = tokenize(line);
        let Some(first) = tokens.first() else {
            return ShellInput::Empty;
        };

        if TERMINATE_TOKENS.contains(&first.as_str()) {
            return ShellInput::Terminate;
        }
        if HELP_TOKENS.contains(&first.as_str()) {
            return ShellInput::Help;
        }

        ShellInput::Statement(tokens)
    }
}
