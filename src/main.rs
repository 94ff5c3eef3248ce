// ved — a terminal text editor with a composable modal command language.
//
// This binary is the host: it owns the terminal and the file, and feeds key
// tokens into the ved-core editor. Each keypress flows through:
//
//   stdin → crossterm event → translate → Editor::feed → mode dispatch
//   paint → visible lines + status line + message/prompt line
//
// Layout:
//
//   ┌──────────────────────────────┐
//   │ text area                    │  ← h - 2 rows
//   ├──────────────────────────────┤
//   │ status line (INVERSE)        │  ← 1 row
//   ├──────────────────────────────┤
//   │ prompt / message line        │  ← 1 row
//   └──────────────────────────────┘
//
// The `:` command parser lives here — the core queues submitted lines and
// the host decides what `:w` and friends mean.

use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Attribute, SetAttribute};
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use unicode_width::UnicodeWidthChar;

use ved_core::buffer::Buffer;
use ved_core::key::Key;
use ved_core::ui::Ui;
use ved_core::Editor;

// ─── Terminal UI ────────────────────────────────────────────────────────────

/// The core's view of the terminal. The host repaints after every event, so
/// most hooks are signals it can ignore; suspend is the exception.
struct TermUi;

impl Ui for TermUi {
    fn view_width(&self) -> u16 {
        terminal::size().map_or(80, |(w, _)| w)
    }

    fn view_height(&self) -> u16 {
        terminal::size().map_or(24, |(_, h)| h.saturating_sub(2))
    }

    #[cfg(unix)]
    fn suspend(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // SAFETY: raising SIGTSTP stops this process until `fg`.
        unsafe {
            libc::raise(libc::SIGTSTP);
        }
        let _ = enable_raw_mode();
        let _ = execute!(io::stdout(), EnterAlternateScreen);
    }
}

// ─── Command parsing ────────────────────────────────────────────────────────

/// A parsed `:` command.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    /// `:w` — save to the current path.
    Write,
    /// `:w <path>` — save to a specific path.
    WriteAs(PathBuf),
    /// `:q` — quit (refuses if the buffer is modified).
    Quit,
    /// `:q!` — quit, discarding changes.
    ForceQuit,
    /// `:wq` — save and quit.
    WriteQuit,
    /// `:x` — save if modified, then quit.
    ExitSave,
    /// `:earlier N` — go N text states back in time.
    Earlier(usize),
    /// `:later N` — go N text states forward in time.
    Later(usize),
    /// Unknown command — the full input, for the error message.
    Unknown(String),
}

/// Parse a command line (without the leading `:`).
fn parse_command(input: &str) -> Command {
    // A visual-range prefix is accepted and ignored; the commands below all
    // act on the whole buffer.
    let trimmed = input.trim().trim_start_matches("'<,'>");

    if trimmed.is_empty() {
        return Command::Unknown(String::new());
    }

    let (cmd, arg) = trimmed
        .find(char::is_whitespace)
        .map_or((trimmed, ""), |at| (&trimmed[..at], trimmed[at..].trim_start()));

    match cmd {
        "w" | "write" => {
            if arg.is_empty() {
                Command::Write
            } else {
                Command::WriteAs(PathBuf::from(arg))
            }
        }
        "q" | "quit" => Command::Quit,
        "q!" | "quit!" => Command::ForceQuit,
        "wq" => Command::WriteQuit,
        "x" | "xit" => Command::ExitSave,
        "earlier" => Command::Earlier(arg.parse().unwrap_or(1)),
        "later" => Command::Later(arg.parse().unwrap_or(1)),
        _ => Command::Unknown(trimmed.to_string()),
    }
}

/// What a command asked the event loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostAction {
    Continue,
    Quit,
}

fn run_command(ed: &mut Editor, line: &str) -> HostAction {
    match parse_command(line) {
        Command::Write => {
            cmd_write(ed);
            HostAction::Continue
        }
        Command::WriteAs(path) => {
            cmd_write_as(ed, &path);
            HostAction::Continue
        }
        Command::Quit => {
            if ed.buffer().is_modified() {
                ed.set_error("no write since last change (add ! to override)");
                HostAction::Continue
            } else {
                HostAction::Quit
            }
        }
        Command::ForceQuit => HostAction::Quit,
        Command::WriteQuit => {
            if cmd_write(ed) {
                HostAction::Quit
            } else {
                HostAction::Continue
            }
        }
        Command::ExitSave => {
            if !ed.buffer().is_modified() || cmd_write(ed) {
                HostAction::Quit
            } else {
                HostAction::Continue
            }
        }
        Command::Earlier(n) => {
            if let Err(err) = ed.earlier(n) {
                ed.set_error(err.to_string());
            }
            HostAction::Continue
        }
        Command::Later(n) => {
            if let Err(err) = ed.later(n) {
                ed.set_error(err.to_string());
            }
            HostAction::Continue
        }
        Command::Unknown(input) => {
            if !input.is_empty() {
                ed.set_error(format!("not an editor command: {input}"));
            }
            HostAction::Continue
        }
    }
}

fn cmd_write(ed: &mut Editor) -> bool {
    if ed.buffer().path().is_none() {
        ed.set_error("no file name");
        return false;
    }
    match ed.buffer_mut().save() {
        Ok(()) => {
            let name = file_name(ed.buffer().path());
            let bytes = ed.buffer().len_bytes();
            ed.set_message(format!("\"{name}\" written, {bytes}B"));
            true
        }
        Err(err) => {
            ed.set_error(format!("can't save file: {err}"));
            false
        }
    }
}

fn cmd_write_as(ed: &mut Editor, path: &Path) {
    match ed.buffer_mut().save_as(path) {
        Ok(()) => {
            let name = file_name(Some(path));
            let bytes = ed.buffer().len_bytes();
            ed.set_message(format!("\"{name}\" written, {bytes}B"));
        }
        Err(err) => ed.set_error(format!("can't save file: {err}")),
    }
}

fn file_name(path: Option<&Path>) -> String {
    path.and_then(Path::file_name)
        .and_then(|n| n.to_str())
        .unwrap_or("[no name]")
        .to_string()
}

// ─── Key translation ────────────────────────────────────────────────────────

/// Map a crossterm key event onto a core key token.
fn translate(key: &KeyEvent) -> Option<Key> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if let KeyCode::Char(ch) = key.code {
            return Some(Key::Ctrl(ch.to_ascii_lowercase()));
        }
    }
    match key.code {
        KeyCode::Char(ch) => Some(Key::Char(ch)),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Esc => Some(Key::Escape),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Delete => Some(Key::Delete),
        KeyCode::Tab => Some(Key::Tab),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Home => Some(Key::Home),
        KeyCode::End => Some(Key::End),
        KeyCode::PageUp => Some(Key::PageUp),
        KeyCode::PageDown => Some(Key::PageDown),
        _ => None,
    }
}

// ─── Painting ───────────────────────────────────────────────────────────────

const TAB_WIDTH: usize = 8;

/// Display column of a char column, expanding tabs and wide characters.
fn display_col<I: Iterator<Item = char>>(chars: I, char_col: usize) -> usize {
    let mut col = 0;
    for (i, ch) in chars.enumerate() {
        if i >= char_col {
            break;
        }
        match ch {
            '\n' | '\r' => break,
            '\t' => col = (col / TAB_WIDTH + 1) * TAB_WIDTH,
            _ => col += ch.width().unwrap_or(0),
        }
    }
    col
}

/// Render one buffer line into at most `width` display columns, starting at
/// display column `left`.
fn render_line(line: &str, left: usize, width: usize) -> String {
    let mut out = String::new();
    let mut col = 0;
    for ch in line.chars() {
        if ch == '\n' || ch == '\r' {
            break;
        }
        let w = match ch {
            '\t' => (col / TAB_WIDTH + 1) * TAB_WIDTH - col,
            _ => ch.width().unwrap_or(0),
        };
        if col + w > left + width {
            break;
        }
        if col >= left {
            if ch == '\t' {
                out.push_str(&" ".repeat(w));
            } else {
                out.push(ch);
            }
        }
        col += w;
    }
    out
}

fn paint(ed: &Editor, out: &mut impl Write) -> io::Result<()> {
    let (width, height) = terminal::size()?;
    if height < 3 {
        return Ok(());
    }
    let text_rows = height - 2;

    queue!(out, Clear(ClearType::All))?;

    // Text area.
    let view = ed.view();
    let buf = ed.buffer();
    for row in 0..text_rows {
        let line_idx = view.top_line() + row as usize;
        queue!(out, MoveTo(0, row))?;
        match buf.line(line_idx) {
            Some(line) => {
                let text = render_line(&line.to_string(), view.left_col(), width as usize);
                out.write_all(text.as_bytes())?;
            }
            None => out.write_all(b"~")?,
        }
    }

    // Status line.
    let pos = view.primary().position();
    let name = file_name(buf.path());
    let modified = if buf.is_modified() { " [+]" } else { "" };
    let recording = if ed.is_recording() { " recording" } else { "" };
    let cursors = if view.cursor_count() > 1 {
        format!(" ({} cursors)", view.cursor_count())
    } else {
        String::new()
    };
    let left = format!("{name}{modified}{cursors}{recording}");
    let right = format!("{} {}", ed.mode().status(), pos);
    let pad = (width as usize).saturating_sub(left.chars().count() + right.chars().count());
    queue!(out, MoveTo(0, text_rows), SetAttribute(Attribute::Reverse))?;
    write!(out, "{left}{}{right}", " ".repeat(pad))?;
    queue!(out, SetAttribute(Attribute::Reset))?;

    // Prompt / message line, and the hardware cursor.
    queue!(out, MoveTo(0, text_rows + 1))?;
    if let Some(prompt) = ed.prompt() {
        write!(out, "{}{}", prompt.leader(), prompt.line())?;
        let col = 1 + display_col(prompt.line().chars(), prompt.cursor());
        queue!(out, MoveTo(col as u16, text_rows + 1))?;
    } else {
        if let Some((message, _is_error)) = ed.message() {
            let text: String = message.chars().take(width as usize).collect();
            out.write_all(text.as_bytes())?;
        }
        let row = pos.line.saturating_sub(view.top_line()) as u16;
        let col = buf
            .line(pos.line)
            .map_or(0, |l| display_col(l.chars(), pos.col))
            .saturating_sub(view.left_col());
        queue!(out, MoveTo(col as u16, row.min(text_rows.saturating_sub(1))))?;
    }

    out.flush()
}

// ─── Logging ────────────────────────────────────────────────────────────────

/// A TUI owns stdout, so logs go to the file named by `VED_LOG` (if set).
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let path = env::var_os("VED_LOG")?;
    let file = std::fs::File::create(PathBuf::from(path)).ok()?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ved_core=debug")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn event_loop(ed: &mut Editor) -> io::Result<()> {
    let mut stdout = io::stdout();
    loop {
        let (w, h) = terminal::size()?;
        ed.view_mut().set_dimensions(w, h.saturating_sub(2));
        paint(ed, &mut stdout)?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if let Some(token) = translate(&key) {
                    ed.feed(token);
                }
            }
            Event::Resize(w, h) => {
                ed.view_mut().set_dimensions(w, h.saturating_sub(2));
            }
            _ => {}
        }

        while let Some(line) = ed.take_command() {
            if run_command(ed, &line) == HostAction::Quit {
                return Ok(());
            }
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let _log_guard = init_logging();

    let buffer = match args.get(1) {
        Some(path) => Buffer::from_file(Path::new(path)).unwrap_or_else(|err| {
            eprintln!("ved: {path}: {err}");
            process::exit(1);
        }),
        None => Buffer::new(),
    };

    let mut ed = Editor::with_buffer(buffer);
    ed.set_ui(Box::new(TermUi));

    if enable_raw_mode().is_err() {
        eprintln!("ved: failed to enter raw mode (not a terminal?)");
        process::exit(1);
    }
    let _ = execute!(io::stdout(), EnterAlternateScreen);

    let result = event_loop(&mut ed);

    let _ = execute!(io::stdout(), LeaveAlternateScreen);
    let _ = disable_raw_mode();

    if let Err(err) = result {
        eprintln!("ved: {err}");
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // -- Command parsing ----------------------------------------------------

    #[test]
    fn parse_basic_commands() {
        assert_eq!(parse_command("w"), Command::Write);
        assert_eq!(parse_command("write"), Command::Write);
        assert_eq!(
            parse_command("w /tmp/file.txt"),
            Command::WriteAs(PathBuf::from("/tmp/file.txt"))
        );
        assert_eq!(parse_command("q"), Command::Quit);
        assert_eq!(parse_command("q!"), Command::ForceQuit);
        assert_eq!(parse_command("wq"), Command::WriteQuit);
        assert_eq!(parse_command("x"), Command::ExitSave);
    }

    #[test]
    fn parse_history_commands() {
        assert_eq!(parse_command("earlier 3"), Command::Earlier(3));
        assert_eq!(parse_command("later"), Command::Later(1));
        assert_eq!(parse_command("earlier x"), Command::Earlier(1));
    }

    #[test]
    fn parse_strips_visual_range() {
        assert_eq!(parse_command("'<,'>w"), Command::Write);
    }

    #[test]
    fn parse_unknown() {
        assert_eq!(
            parse_command("frobnicate"),
            Command::Unknown("frobnicate".into())
        );
        assert_eq!(parse_command("  "), Command::Unknown(String::new()));
    }

    #[test]
    fn parse_path_with_spaces() {
        assert_eq!(
            parse_command("w /tmp/my file.txt"),
            Command::WriteAs(PathBuf::from("/tmp/my file.txt"))
        );
    }

    // -- Command execution --------------------------------------------------

    #[test]
    fn quit_refuses_modified_buffer() {
        let mut ed = Editor::with_text("hello");
        ed.keys("x");
        assert_eq!(run_command(&mut ed, "q"), HostAction::Continue);
        assert!(ed.message().is_some_and(|(_, err)| err));
        assert_eq!(run_command(&mut ed, "q!"), HostAction::Quit);
    }

    #[test]
    fn unknown_command_reports() {
        let mut ed = Editor::with_text("");
        run_command(&mut ed, "nope");
        assert!(ed
            .message()
            .is_some_and(|(m, err)| err && m.contains("nope")));
    }

    #[test]
    fn earlier_later_through_commands() {
        let mut ed = Editor::with_text("");
        ed.keys("ia<Esc>ob<Esc>");
        assert_eq!(ed.buffer().contents(), "a\nb");
        run_command(&mut ed, "earlier 2");
        assert_eq!(ed.buffer().contents(), "");
        run_command(&mut ed, "later 1");
        assert_eq!(ed.buffer().contents(), "a");
    }

    #[test]
    fn write_without_name_reports() {
        let mut ed = Editor::with_text("hello");
        run_command(&mut ed, "w");
        assert!(ed
            .message()
            .is_some_and(|(m, err)| err && m.contains("file name")));
    }

    // -- Key translation ----------------------------------------------------

    #[test]
    fn translate_plain_and_control() {
        let plain = KeyEvent::from(KeyCode::Char('a'));
        assert_eq!(translate(&plain), Some(Key::Char('a')));

        let ctrl = KeyEvent::new(KeyCode::Char('R'), KeyModifiers::CONTROL);
        assert_eq!(translate(&ctrl), Some(Key::Ctrl('r')));

        let esc = KeyEvent::from(KeyCode::Esc);
        assert_eq!(translate(&esc), Some(Key::Escape));
    }

    // -- Rendering helpers --------------------------------------------------

    #[test]
    fn display_col_expands_tabs() {
        assert_eq!(display_col("ab".chars(), 1), 1);
        assert_eq!(display_col("\tx".chars(), 1), 8);
        assert_eq!(display_col("a\tx".chars(), 2), 8);
    }

    #[test]
    fn display_col_wide_chars() {
        assert_eq!(display_col("日本".chars(), 1), 2);
        assert_eq!(display_col("日本".chars(), 2), 4);
    }

    #[test]
    fn render_line_window() {
        assert_eq!(render_line("hello world", 0, 5), "hello");
        assert_eq!(render_line("hello world", 6, 5), "world");
        assert_eq!(render_line("ab", 0, 80), "ab");
        assert_eq!(render_line("a\tb", 0, 80), "a       b");
    }
}
