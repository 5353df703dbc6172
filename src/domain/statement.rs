//! 입력 한 줄을 문장(statement)으로 해석하는 모듈.
//! 동사는 대소문자를 구분하며 인자 개수는 정확히 일치해야 한다.

use std::fmt;

/// `set` 문장이 저장하는 메타 바이트. 문법으로 노출하지 않으므로 항상 0이다.
pub const DEFAULT_META: u8 = 0;

/// 문법 요약. 사용법 오류와 `--help` 양쪽에서 같은 문구를 출력한다.
pub const SYNTAX_HELP: &str = "\
Syntax:
  get <KEY>                 get value by key
  set <KEY> <VALUE>         set item by key and value
  delete <KEY>              delete item by key
  dump                      dump item list
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Set,
    Delete,
    Dump,
}

impl Verb {
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "get" => Some(Verb::Get),
            "set" => Some(Verb::Set),
            "delete" => Some(Verb::Delete),
            "dump" => Some(Verb::Dump),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Set => "set",
            Verb::Delete => "delete",
            Verb::Dump => "dump",
        }
    }
}

/// 인자 검증을 통과한 단일 문장.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Get { key: Vec<u8> },
    Set { key: Vec<u8>, value: Vec<u8>, meta: u8 },
    Delete { key: Vec<u8> },
    Dump,
}

/// 문장으로 해석할 수 없는 이유. 사용자에게는 모두 문법 도움말로 안내된다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementError {
    Empty,
    UnknownVerb(String),
    Arity { verb: Verb, given: usize },
}

impl fmt::Display for StatementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementError::Empty => write!(f, "empty statement"),
            StatementError::UnknownVerb(word) => write!(f, "unknown verb: {word}"),
            StatementError::Arity { verb, given } => {
                write!(f, "wrong argument count for {}: {given}", verb.as_str())
            }
        }
    }
}

impl Statement {
    /// 토큰 목록(첫 토큰이 동사)을 문장으로 변환한다.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self, StatementError> {
        let Some((head, args)) = tokens.split_first() else {
            return Err(StatementError::Empty);
        };
        let verb = Verb::parse(head.as_ref())
            .ok_or_else(|| StatementError::UnknownVerb(head.as_ref().to_string()))?;

        match (verb, args) {
            (Verb::Get, [key]) => Ok(Statement::Get { key: bytes(key) }),
            (Verb::Set, [key, value]) => Ok(Statement::Set {
                key: bytes(key),
                value: bytes(value),
                meta: DEFAULT_META,
            }),
            (Verb::Delete, [key]) => Ok(Statement::Delete { key: bytes(key) }),
            (Verb::Dump, []) => Ok(Statement::Dump),
            _ => Err(StatementError::Arity {
                verb,
                given: args.len(),
            }),
        }
    }

    pub fn verb(&self) -> Verb {
        match self {
            Statement::Get { .. } => Verb::Get,
            Statement::Set { .. } => Verb::Set,
            Statement::Delete { .. } => Verb::Delete,
            Statement::Dump => Verb::Dump,
        }
    }
}

/// 앞뒤 공백을 제거하고 공백 단위로 토큰을 나눈다.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(ToString::to_string).collect()
}

fn bytes<S: AsRef<str>>(token: &S) -> Vec<u8> {
    token.as_ref().as_bytes().to_vec()
}
