//! Interactive typing trainer on a raw-mode terminal.
//!
//! The one-second ticker lives inside [`run_session`], so it only exists while
//! a session is running and is dropped whenever the session ends: finish,
//! quit or an input error.

use std::io::{self, Write};
use std::time::Duration;

use colored::Colorize;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use futures::StreamExt;
use quicktoolify_core::typing::{
    key_cap_for, keyboard_layout, KeyboardType, Keystroke, OsType, PracticeType, TypingResult,
    TypingSession,
};

use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "typing")]
#[command(about = "Interactive typing practice")]
pub struct App {
    /// Kind of text to practise on
    #[arg(short, long, value_enum, default_value = "home-row")]
    practice: Practice,

    /// Keyboard layout shown on screen
    #[arg(short, long, value_enum, default_value = "us")]
    keyboard: Keyboard,

    /// Operating system key labels
    #[arg(long, value_enum, default_value = "windows")]
    os: Os,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum Practice {
    HomeRow,
    TopRow,
    BottomRow,
    Mixed,
    Numbers,
    Symbols,
    JapaneseMixed,
    Programming,
    Punctuation,
}

impl From<Practice> for PracticeType {
    fn from(practice: Practice) -> Self {
        match practice {
            Practice::HomeRow => PracticeType::HomeRow,
            Practice::TopRow => PracticeType::TopRow,
            Practice::BottomRow => PracticeType::BottomRow,
            Practice::Mixed => PracticeType::Mixed,
            Practice::Numbers => PracticeType::Numbers,
            Practice::Symbols => PracticeType::Symbols,
            Practice::JapaneseMixed => PracticeType::JapaneseMixed,
            Practice::Programming => PracticeType::Programming,
            Practice::Punctuation => PracticeType::Punctuation,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum Keyboard {
    Us,
    Jp,
}

impl From<Keyboard> for KeyboardType {
    fn from(keyboard: Keyboard) -> Self {
        match keyboard {
            Keyboard::Us => KeyboardType::Us,
            Keyboard::Jp => KeyboardType::Jp,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum Os {
    Windows,
    Mac,
}

impl From<Os> for OsType {
    fn from(os: Os) -> Self {
        match os {
            Os::Windows => OsType::Windows,
            Os::Mac => OsType::Mac,
        }
    }
}

/// What the screen shows besides the session itself.
struct View {
    practice: PracticeType,
    layout: &'static [&'static [&'static str]],
}

enum SessionEnd {
    Finished(TypingResult),
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Key(Keystroke),
    Quit,
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharState {
    Correct,
    Wrong,
    Next,
    Pending,
}

/// Puts the terminal in raw mode on an alternate screen and restores it on drop.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        execute!(io::stdout(), EnterAlternateScreen, Hide)
            .context("Failed to enter the alternate screen")?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let view = View {
        practice: app.practice.into(),
        layout: keyboard_layout(app.keyboard.into(), app.os.into()),
    };

    if global.verbose {
        println!(
            "Practice: {} ({} texts)",
            view.practice.label(),
            view.practice.texts().len()
        );
    }

    let mut results = Vec::new();
    {
        let _guard = TerminalGuard::enter()?;
        let mut events = EventStream::new();
        let mut stdout = io::stdout();
        let mut rng = rand::thread_rng();

        loop {
            let mut session = TypingSession::new();
            session.start(view.practice.random_text(&mut rng));

            match run_session(&mut session, &mut events, &mut stdout, &view).await? {
                SessionEnd::Quit => break,
                SessionEnd::Finished(result) => {
                    log::info!("Finished run: {result:?}");
                    results.push(result);
                    draw_result(&mut stdout, &result)?;
                    if !wait_for_retry(&mut events).await? {
                        break;
                    }
                }
            }
        }
    }

    for (i, result) in results.iter().enumerate() {
        println!(
            "{} {} WPM, {}% accuracy, {} mistake(s) in {}s",
            format!("Run {}:", i + 1).bold(),
            result.wpm.to_string().green().bold(),
            result.accuracy,
            result.mistakes,
            result.time
        );
    }

    Ok(())
}

async fn run_session<W: Write>(
    session: &mut TypingSession,
    events: &mut EventStream,
    out: &mut W,
    view: &View,
) -> Result<SessionEnd> {
    let period = Duration::from_secs(1);
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

    draw(out, session, view)?;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                session.tick();
            }

            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) => match classify(key) {
                        Input::Quit => return Ok(SessionEnd::Quit),
                        Input::Key(keystroke) => {
                            if let Some(result) = session.key(keystroke) {
                                return Ok(SessionEnd::Finished(result));
                            }
                        }
                        Input::Ignore => continue,
                    },
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(eyre!("Failed to read terminal input: {e}")),
                    None => return Ok(SessionEnd::Quit),
                }
            }
        }

        draw(out, session, view)?;
    }
}

fn classify(key: KeyEvent) -> Input {
    if key.kind != KeyEventKind::Press {
        return Input::Ignore;
    }

    match key.code {
        KeyCode::Esc => Input::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Input::Quit,
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Input::Key(Keystroke::Char(c))
        }
        KeyCode::Backspace => Input::Key(Keystroke::Backspace),
        _ => Input::Ignore,
    }
}

async fn wait_for_retry(events: &mut EventStream) -> Result<bool> {
    while let Some(event) = events.next().await {
        let Event::Key(key) = event.context("Failed to read terminal input")? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter | KeyCode::Char('r') => return Ok(true),
            KeyCode::Esc | KeyCode::Char('q') => return Ok(false),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(false)
            }
            _ => {}
        }
    }
    Ok(false)
}

fn char_states(session: &TypingSession) -> Vec<(char, CharState)> {
    let target = session.target();
    let typed: Vec<char> = session.typed().chars().collect();

    target
        .chars()
        .enumerate()
        .map(|(i, expected)| {
            let state = match typed.get(i) {
                Some(actual) if *actual == expected => CharState::Correct,
                Some(_) => CharState::Wrong,
                None if i == typed.len() => CharState::Next,
                None => CharState::Pending,
            };
            (expected, state)
        })
        .collect()
}

fn render_text(session: &TypingSession) -> String {
    char_states(session)
        .into_iter()
        .map(|(c, state)| {
            let shown = c.to_string();
            match state {
                CharState::Correct => shown.green().to_string(),
                CharState::Wrong if c == ' ' => "_".red().bold().to_string(),
                CharState::Wrong => shown.red().bold().underline().to_string(),
                CharState::Next => shown.black().on_bright_white().to_string(),
                CharState::Pending => shown.bright_black().to_string(),
            }
        })
        .collect()
}

/// Keyboard rows with the cap for `expected` flagged.
fn keyboard_rows(
    layout: &[&[&'static str]],
    expected: Option<char>,
) -> Vec<Vec<(&'static str, bool)>> {
    let highlight = expected.and_then(|c| key_cap_for(layout, c));
    layout
        .iter()
        .map(|row| {
            row.iter()
                .map(|cap| (*cap, Some(*cap) == highlight))
                .collect()
        })
        .collect()
}

fn stats_line(session: &TypingSession) -> String {
    format!(
        "Time: {}s   WPM: {}   Accuracy: {}%   Mistakes: {}",
        session.elapsed_secs(),
        session.wpm().to_string().bold(),
        session.accuracy(),
        session.mistakes()
    )
}

fn write_lines<W: Write>(out: &mut W, lines: Vec<String>) -> Result<()> {
    queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
    for line in lines {
        queue!(out, Print(line), Print("\r\n"))?;
    }
    out.flush()?;
    Ok(())
}

fn draw<W: Write>(out: &mut W, session: &TypingSession, view: &View) -> Result<()> {
    let mut lines = vec![
        format!("{} {}", "Typing practice:".bold().cyan(), view.practice.label()),
        stats_line(session),
        String::new(),
        render_text(session),
        String::new(),
    ];

    for row in keyboard_rows(view.layout, session.expected()) {
        let caps: Vec<String> = row
            .into_iter()
            .map(|(cap, lit)| {
                let cap = format!("[{cap}]");
                if lit {
                    cap.black().on_yellow().to_string()
                } else {
                    cap.bright_black().to_string()
                }
            })
            .collect();
        lines.push(caps.join(" "));
    }

    lines.push(String::new());
    lines.push("Esc to quit".bright_black().to_string());
    write_lines(out, lines)
}

fn draw_result<W: Write>(out: &mut W, result: &TypingResult) -> Result<()> {
    write_lines(
        out,
        vec![
            "Finished!".green().bold().to_string(),
            String::new(),
            format!("WPM:       {}", result.wpm.to_string().bold()),
            format!("Accuracy:  {}%", result.accuracy),
            format!("Mistakes:  {}", result.mistakes),
            format!("Time:      {}s", result.time),
            String::new(),
            "Enter or r to try another text, Esc or q to quit".bright_black().to_string(),
        ],
    )
}
