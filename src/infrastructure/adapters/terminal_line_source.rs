//! 터미널 줄 입력 어댑터.
//! TTY에서는 raw mode 줄 편집기로, 그 외에는 일반 stdin 줄 읽기로 동작한다.

use std::env;
use std::io::{self, IsTerminal, Write};

use anyhow::Result;
use crossterm::cursor;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{self, ClearType};
use tracing::debug;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::history::History;
use crate::application::ports::{LineSource, ReadOutcome};

const INTERRUPT_ECHO: &str = "^C";
const EOF_ECHO: &str = "exit";

/// 프롬프트와 입력 기록을 가진 줄 입력기.
pub struct TerminalLineSource {
    prompt: String,
    history: History,
    interactive: bool,
}

impl TerminalLineSource {
    pub fn new(prompt: String, history: History) -> Self {
        Self {
            prompt,
            history,
            interactive: supports_interactive_input(),
        }
    }
}

impl LineSource for TerminalLineSource {
    fn read_line(&mut self) -> Result<ReadOutcome> {
        let outcome = if self.interactive {
            match read_line_interactive(&self.prompt, &self.history) {
                Ok(v) => v,
                Err(err) => {
                    debug!(error = %err, "interactive input failed, falling back to plain stdin");
                    self.interactive = false;
                    read_line_fallback(&self.prompt)?
                }
            }
        } else {
            read_line_fallback(&self.prompt)?
        };

        if let ReadOutcome::Line(line) = &outcome {
            self.history.push(line);
        }
        Ok(outcome)
    }
}

fn supports_interactive_input() -> bool {
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return false;
    }

    // dumb 터미널에서는 제어 시퀀스 기반 편집을 비활성화한다.
    if let Ok(term) = env::var("TERM")
        && term.eq_ignore_ascii_case("dumb")
    {
        return false;
    }

    true
}

fn read_line_fallback(prompt: &str) -> Result<ReadOutcome> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut line = String::new();
    let read = io::stdin().read_line(&mut line)?;
    if read == 0 {
        return Ok(ReadOutcome::Eof);
    }

    Ok(ReadOutcome::Line(trim_newline(line)))
}

fn read_line_interactive(prompt: &str, history: &History) -> Result<ReadOutcome> {
    let mut stdout = io::stdout();
    let _guard = InputGuard::enter(&mut stdout)?;
    let mut editor = LineEditor::new(history);

    loop {
        let search_prompt = editor.search_prompt();
        render_line(
            &mut stdout,
            search_prompt.as_deref().unwrap_or(prompt),
            &editor.buffer,
        )?;

        let outcome = match event::read()? {
            Event::Paste(text) => {
                editor.buffer.insert_str(&text);
                None
            }
            Event::Key(key) if key.kind == KeyEventKind::Press => editor.handle_key(key),
            _ => None,
        };

        if let Some(outcome) = outcome {
            match &outcome {
                ReadOutcome::Interrupted { .. } => write!(stdout, "{INTERRUPT_ECHO}")?,
                ReadOutcome::Eof => write!(stdout, "{EOF_ECHO}")?,
                ReadOutcome::Line(_) => {}
            }
            // raw mode에서는 줄바꿈이 커서를 맨 앞으로 보내지 않는다.
            write!(stdout, "\r\n")?;
            stdout.flush()?;
            return Ok(outcome);
        }
    }
}

/// 편집 중인 한 줄. 커서는 문자 단위 위치다.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct LineBuffer {
    text: String,
    cursor: usize,
}

impl LineBuffer {
    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub(crate) fn insert(&mut self, ch: char) {
        let idx = byte_index_at_char(&self.text, self.cursor);
        self.text.insert(idx, ch);
        self.cursor += 1;
    }

    /// 붙여넣기. 줄바꿈은 공백으로 바꿔 한 줄로 유지한다.
    pub(crate) fn insert_str(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' || ch == '\r' {
                self.insert(' ');
            } else {
                self.insert(ch);
            }
        }
    }

    pub(crate) fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.remove_at(self.cursor);
        }
    }

    pub(crate) fn delete(&mut self) {
        if self.cursor < self.char_len() {
            self.remove_at(self.cursor);
        }
    }

    pub(crate) fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub(crate) fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_len());
    }

    pub(crate) fn home(&mut self) {
        self.cursor = 0;
    }

    pub(crate) fn end(&mut self) {
        self.cursor = self.char_len();
    }

    /// 커서 앞부분을 지운다.
    pub(crate) fn kill_to_start(&mut self) {
        let idx = byte_index_at_char(&self.text, self.cursor);
        self.text.replace_range(..idx, "");
        self.cursor = 0;
    }

    pub(crate) fn replace(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.char_len();
    }

    fn remove_at(&mut self, char_idx: usize) {
        let start = byte_index_at_char(&self.text, char_idx);
        let end = byte_index_at_char(&self.text, char_idx + 1);
        if start < end {
            self.text.replace_range(start..end, "");
        }
    }
}

/// Ctrl-R 역방향 검색 상태.
struct ReverseSearch {
    query: String,
    /// 마지막으로 찾은 기록 위치
    hit: Option<usize>,
    failed: bool,
    /// 검색 전 버퍼. 취소하면 되돌린다.
    original: String,
}

enum SearchStep {
    Consumed,
    /// 검색을 끝내고 같은 키를 일반 편집으로 처리한다.
    Exit,
}

/// 키 입력을 버퍼 편집과 기록 탐색으로 해석한다.
pub(crate) struct LineEditor<'h> {
    pub(crate) buffer: LineBuffer,
    history: &'h History,
    /// 기록 탐색 중인 위치. `None`이면 새 줄을 편집 중이다.
    browsing: Option<usize>,
    draft: String,
    search: Option<ReverseSearch>,
}

impl<'h> LineEditor<'h> {
    pub(crate) fn new(history: &'h History) -> Self {
        Self {
            buffer: LineBuffer::default(),
            history,
            browsing: None,
            draft: String::new(),
            search: None,
        }
    }

    /// 검색 중이면 프롬프트 대신 보여 줄 검색 표시줄.
    pub(crate) fn search_prompt(&self) -> Option<String> {
        self.search.as_ref().map(|search| {
            let label = if search.failed {
                "failed reverse-i-search"
            } else {
                "reverse-i-search"
            };
            format!("({label})'{}': ", search.query)
        })
    }

    /// 입력이 끝나면 결과를, 계속 편집해야 하면 `None`을 반환한다.
    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> Option<ReadOutcome> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if self.search.is_some() {
            match self.search_key(key) {
                SearchStep::Consumed => return None,
                SearchStep::Exit => self.browsing = None,
            }
        }

        match key.code {
            KeyCode::Enter => return Some(ReadOutcome::Line(self.buffer.text().to_string())),
            KeyCode::Char('c') if ctrl => {
                return Some(ReadOutcome::Interrupted {
                    pending: self.buffer.text().to_string(),
                });
            }
            KeyCode::Char('d') if ctrl => {
                if self.buffer.text().is_empty() {
                    return Some(ReadOutcome::Eof);
                }
                self.buffer.delete();
            }
            KeyCode::Char('u') if ctrl => self.buffer.kill_to_start(),
            KeyCode::Char('a') if ctrl => self.buffer.home(),
            KeyCode::Char('e') if ctrl => self.buffer.end(),
            KeyCode::Char('r') if ctrl => {
                self.search = Some(ReverseSearch {
                    query: String::new(),
                    hit: None,
                    failed: false,
                    original: self.buffer.text().to_string(),
                });
            }
            KeyCode::Backspace => self.buffer.backspace(),
            KeyCode::Delete => self.buffer.delete(),
            KeyCode::Left => self.buffer.left(),
            KeyCode::Right => self.buffer.right(),
            KeyCode::Home => self.buffer.home(),
            KeyCode::End => self.buffer.end(),
            KeyCode::Up => self.history_older(),
            KeyCode::Down => self.history_newer(),
            KeyCode::Char(ch) => {
                if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) {
                    self.buffer.insert(ch);
                }
            }
            _ => {}
        }
        None
    }

    fn search_key(&mut self, key: KeyEvent) -> SearchStep {
        let Some(mut search) = self.search.take() else {
            return SearchStep::Exit;
        };
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('r') if ctrl => {
                let before = search.hit.unwrap_or(self.history.len());
                self.find(&mut search, before);
            }
            KeyCode::Char('g') if ctrl => {
                self.buffer.replace(&search.original);
                return SearchStep::Consumed;
            }
            KeyCode::Esc => {
                self.buffer.replace(&search.original);
                return SearchStep::Consumed;
            }
            KeyCode::Char('c') if ctrl => {
                self.buffer.replace(&search.original);
                return SearchStep::Exit;
            }
            KeyCode::Backspace => {
                search.query.pop();
                self.find(&mut search, self.history.len());
            }
            KeyCode::Char(ch) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                search.query.push(ch);
                self.find(&mut search, self.history.len());
            }
            _ => return SearchStep::Exit,
        }

        self.search = Some(search);
        SearchStep::Consumed
    }

    fn find(&mut self, search: &mut ReverseSearch, before: usize) {
        match self.history.search_back(&search.query, before) {
            Some((idx, entry)) => {
                search.hit = Some(idx);
                search.failed = false;
                self.buffer.replace(&entry);
            }
            None => search.failed = !search.query.is_empty(),
        }
    }

    fn history_older(&mut self) {
        if self.history.is_empty() {
            return;
        }

        let next = match self.browsing {
            None => {
                self.draft = self.buffer.text().to_string();
                self.history.len() - 1
            }
            Some(0) => 0,
            Some(idx) => idx - 1,
        };
        self.show_history(next);
    }

    fn history_newer(&mut self) {
        let Some(idx) = self.browsing else {
            return;
        };

        if idx + 1 < self.history.len() {
            self.show_history(idx + 1);
        } else {
            // 가장 최근 기록 다음은 편집하던 새 줄이다.
            self.browsing = None;
            let draft = std::mem::take(&mut self.draft);
            self.buffer.replace(&draft);
        }
    }

    fn show_history(&mut self, idx: usize) {
        if let Some(entry) = self.history.get(idx) {
            self.browsing = Some(idx);
            self.buffer.replace(&entry);
        }
    }
}

fn render_line(stdout: &mut io::Stdout, prompt: &str, buffer: &LineBuffer) -> Result<()> {
    let (w, _) = terminal::size().unwrap_or((80, 24));
    let width = w as usize;
    let prompt_width = display_width(prompt);
    let available = width.saturating_sub(prompt_width + 1).max(1);
    let (shown, cursor_offset) = visible_window(buffer.text(), buffer.cursor(), available);

    execute!(
        stdout,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine)
    )?;
    write!(stdout, "{prompt}{shown}")?;
    execute!(
        stdout,
        cursor::MoveToColumn((prompt_width + cursor_offset) as u16)
    )?;
    stdout.flush()?;
    Ok(())
}

/// 폭 `available` 안에 커서가 보이도록 잘라 낸 문자열과 그 안의 커서 열을 반환한다.
pub(crate) fn visible_window(text: &str, cursor_chars: usize, available: usize) -> (String, usize) {
    let chars: Vec<char> = text.chars().collect();
    let cursor_chars = cursor_chars.min(chars.len());

    // 커서 앞부분은 폭이 넘치면 앞에서부터 버린다.
    let mut start = cursor_chars;
    let mut used = 0usize;
    while start > 0 {
        let cw = char_display_width(chars[start - 1]);
        if used + cw >= available {
            break;
        }
        used += cw;
        start -= 1;
    }
    let cursor_offset = used;

    let mut shown: String = chars[start..cursor_chars].iter().collect();
    for &ch in &chars[cursor_chars..] {
        let cw = char_display_width(ch);
        if used + cw > available {
            break;
        }
        shown.push(ch);
        used += cw;
    }

    (shown, cursor_offset)
}

fn trim_newline(mut s: String) -> String {
    while matches!(s.chars().last(), Some('\n' | '\r')) {
        s.pop();
    }
    s
}

// unicode-width 크레이트를 사용하여 정확한 터미널 표시 폭을 계산한다.
fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

fn char_display_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

fn byte_index_at_char(input: &str, char_idx: usize) -> usize {
    input
        .char_indices()
        .nth(char_idx)
        .map(|(idx, _)| idx)
        .unwrap_or(input.len())
}

/// raw mode 구간. drop 시 터미널을 원래 상태로 돌린다.
struct InputGuard;

impl InputGuard {
    fn enter(stdout: &mut io::Stdout) -> Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(stdout, cursor::Show)?;
        Ok(Self)
    }
}

impl Drop for InputGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, cursor::Show);
        let _ = terminal::disable_raw_mode();
        let _ = stdout.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn type_text(editor: &mut LineEditor<'_>, text: &str) {
        for ch in text.chars() {
            assert_eq!(editor.handle_key(key(KeyCode::Char(ch))), None);
        }
    }

    #[test]
    fn enter_submits_buffer() {
        let history = History::in_memory(10);
        let mut editor = LineEditor::new(&history);
        type_text(&mut editor, "get a");
        assert_eq!(
            editor.handle_key(key(KeyCode::Enter)),
            Some(ReadOutcome::Line("get a".to_string()))
        );
    }

    #[test]
    fn ctrl_c_reports_pending_text() {
        let history = History::in_memory(10);
        let mut editor = LineEditor::new(&history);
        assert_eq!(
            editor.handle_key(ctrl('c')),
            Some(ReadOutcome::Interrupted {
                pending: String::new()
            })
        );

        type_text(&mut editor, "set");
        assert_eq!(
            editor.handle_key(ctrl('c')),
            Some(ReadOutcome::Interrupted {
                pending: "set".to_string()
            })
        );
    }

    #[test]
    fn ctrl_d_is_eof_only_on_empty_line() {
        let history = History::in_memory(10);
        let mut editor = LineEditor::new(&history);
        type_text(&mut editor, "ab");
        editor.handle_key(key(KeyCode::Home));
        assert_eq!(editor.handle_key(ctrl('d')), None);
        assert_eq!(editor.buffer.text(), "b");

        editor.handle_key(ctrl('d'));
        assert_eq!(editor.handle_key(ctrl('d')), Some(ReadOutcome::Eof));
    }

    #[test]
    fn cursor_editing_handles_multibyte_text() {
        let history = History::in_memory(10);
        let mut editor = LineEditor::new(&history);
        type_text(&mut editor, "키값");
        editor.handle_key(key(KeyCode::Left));
        editor.handle_key(key(KeyCode::Backspace));
        assert_eq!(editor.buffer.text(), "값");
        editor.handle_key(key(KeyCode::End));
        type_text(&mut editor, "!");
        assert_eq!(editor.buffer.text(), "값!");
    }

    #[test]
    fn ctrl_u_clears_before_cursor() {
        let history = History::in_memory(10);
        let mut editor = LineEditor::new(&history);
        type_text(&mut editor, "set a 1");
        editor.handle_key(key(KeyCode::Left));
        editor.handle_key(ctrl('u'));
        assert_eq!(editor.buffer.text(), "1");
        assert_eq!(editor.buffer.cursor(), 0);
    }

    #[test]
    fn history_navigation_restores_draft() {
        let mut history = History::in_memory(10);
        history.push("set a 1");
        history.push("get a");
        let mut editor = LineEditor::new(&history);
        type_text(&mut editor, "du");

        editor.handle_key(key(KeyCode::Up));
        assert_eq!(editor.buffer.text(), "get a");
        editor.handle_key(key(KeyCode::Up));
        assert_eq!(editor.buffer.text(), "set a 1");
        editor.handle_key(key(KeyCode::Up));
        assert_eq!(editor.buffer.text(), "set a 1");

        editor.handle_key(key(KeyCode::Down));
        assert_eq!(editor.buffer.text(), "get a");
        editor.handle_key(key(KeyCode::Down));
        assert_eq!(editor.buffer.text(), "du");
    }

    #[test]
    fn ctrl_r_finds_older_matches_and_submits() {
        let mut history = History::in_memory(10);
        for line in ["set a 1", "get a", "set b 2"] {
            history.push(line);
        }
        let mut editor = LineEditor::new(&history);

        assert_eq!(editor.handle_key(ctrl('r')), None);
        type_text(&mut editor, "set");
        assert_eq!(editor.buffer.text(), "set b 2");
        assert_eq!(
            editor.search_prompt().as_deref(),
            Some("(reverse-i-search)'set': ")
        );

        editor.handle_key(ctrl('r'));
        assert_eq!(editor.buffer.text(), "set a 1");
        editor.handle_key(ctrl('r'));
        assert_eq!(editor.buffer.text(), "set a 1");
        assert_eq!(
            editor.search_prompt().as_deref(),
            Some("(failed reverse-i-search)'set': ")
        );

        assert_eq!(
            editor.handle_key(key(KeyCode::Enter)),
            Some(ReadOutcome::Line("set a 1".to_string()))
        );
        assert_eq!(editor.search_prompt(), None);
    }

    #[test]
    fn escape_cancels_search_and_restores_line() {
        let mut history = History::in_memory(10);
        history.push("dump");
        let mut editor = LineEditor::new(&history);
        type_text(&mut editor, "get");

        editor.handle_key(ctrl('r'));
        type_text(&mut editor, "du");
        assert_eq!(editor.buffer.text(), "dump");

        assert_eq!(editor.handle_key(key(KeyCode::Esc)), None);
        assert_eq!(editor.buffer.text(), "get");
        assert_eq!(editor.search_prompt(), None);
    }

    #[test]
    fn ctrl_c_during_search_reports_original_line() {
        let mut history = History::in_memory(10);
        history.push("dump");
        let mut editor = LineEditor::new(&history);

        editor.handle_key(ctrl('r'));
        type_text(&mut editor, "du");
        assert_eq!(
            editor.handle_key(ctrl('c')),
            Some(ReadOutcome::Interrupted {
                pending: String::new()
            })
        );
    }

    #[test]
    fn arrow_key_leaves_search_with_match_in_buffer() {
        let mut history = History::in_memory(10);
        history.push("get abc");
        let mut editor = LineEditor::new(&history);

        editor.handle_key(ctrl('r'));
        type_text(&mut editor, "abc");
        editor.handle_key(key(KeyCode::Left));
        assert_eq!(editor.search_prompt(), None);
        type_text(&mut editor, "d");
        assert_eq!(editor.buffer.text(), "get abdc");
    }

    #[test]
    fn paste_stays_on_one_line() {
        let mut buffer = LineBuffer::default();
        buffer.insert_str("set a\n1");
        assert_eq!(buffer.text(), "set a 1");
    }

    #[test]
    fn visible_window_keeps_cursor_in_view() {
        assert_eq!(visible_window("abc", 3, 10), ("abc".to_string(), 3));
        assert_eq!(visible_window("abcdefgh", 8, 4), ("fgh".to_string(), 3));
        assert_eq!(visible_window("abcdefgh", 0, 4), ("abcd".to_string(), 0));
    }

    #[test]
    fn trailing_newlines_are_removed() {
        assert_eq!(trim_newline("get a\r\n".to_string()), "get a");
    }
}
