//! Typing practice: text pools, keyboard layouts and the session state
//! machine. The one-second clock lives with the caller, which reports each
//! elapsed second through [`TypingSession::tick`].

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PracticeType {
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

impl PracticeType {
    pub const ALL: [PracticeType; 9] = [
        PracticeType::HomeRow,
        PracticeType::TopRow,
        PracticeType::BottomRow,
        PracticeType::Mixed,
        PracticeType::Numbers,
        PracticeType::Symbols,
        PracticeType::JapaneseMixed,
        PracticeType::Programming,
        PracticeType::Punctuation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PracticeType::HomeRow => "Home row",
            PracticeType::TopRow => "Top row",
            PracticeType::BottomRow => "Bottom row",
            PracticeType::Mixed => "Mixed sentences",
            PracticeType::Numbers => "Numbers",
            PracticeType::Symbols => "Symbols",
            PracticeType::JapaneseMixed => "Japanese mixed",
            PracticeType::Programming => "Programming",
            PracticeType::Punctuation => "Punctuation",
        }
    }

    pub fn texts(self) -> &'static [&'static str] {
        match self {
            PracticeType::HomeRow => &[
                "asdf jkl; asdf jkl; asdf jkl;",
                "asdfjkl; asdfjkl; asdfjkl;",
                "a;sldkfj a;sldkfj a;sldkfj",
                "dad sad lad fad jak ask all",
                "as la da fa ja ka sa ;a a; l;",
            ],
            PracticeType::TopRow => &[
                "qwer tyui qwer tyui qwer tyui",
                "qwertyui qwertyui qwertyui",
                "quit wet pet rye top yip ire",
                "require property quiet type",
                "we were tyre your quiet pie",
            ],
            PracticeType::BottomRow => &[
                "zxcv bnm, zxcv bnm, zxcv bnm,",
                "zxcvbnm, zxcvbnm, zxcvbnm,",
                "zoo box cat van bin man cool",
                "zoom extra vibe next combo",
                "zebra mixer choice vibrant",
            ],
            PracticeType::Mixed => &[
                "The quick brown fox jumps over the lazy dog.",
                "Pack my box with five dozen liquor jugs.",
                "How vexingly quick daft zebras jump!",
                "Sphinx of black quartz, judge my vow.",
                "Amazingly few discotheques provide jukeboxes.",
            ],
            PracticeType::Numbers => &[
                "1234 5678 1234 5678 1234 5678",
                "12345678 12345678 12345678",
                "19 28 37 46 55 64 73 82 91",
                "123 456 789 123 456 789",
                "2021 1984 3456 7890 1234",
            ],
            PracticeType::Symbols => &[
                "!@#$ %^&* !@#$ %^&* !@#$ %^&*",
                "!@#$%^&* !@#$%^&* !@#$%^&*",
                "a@b#c$d% e^f&g*h( i)j_k+",
                "!? [] {} () <> :: ;; --",
                "a-b_c:d;e\"f'g\\h|i/j*k+l",
            ],
            PracticeType::JapaneseMixed => &[
                "こんにちは、Hello123!世界へようこそ。",
                "私の電話番号は090-1234-5678です。",
                "メールアドレス: example@mail.co.jp",
                "今日は2025年3月23日(日)です。",
                "プログラミング言語：JavaScript、Python、C#、Ruby",
            ],
            PracticeType::Programming => &[
                "const array = [1, 2, 3].map(x => x * 2);",
                "if (condition) { return true; } else { return false; }",
                "function hello() { console.log('Hello, world!'); }",
                "import React, { useState } from 'react';",
                "SELECT * FROM users WHERE age > 18 ORDER BY name;",
            ],
            PracticeType::Punctuation => &[
                "Hello, world! How are you today? I'm fine, thank you.",
                "Please check the website (https://example.com) for more info.",
                "Items needed: eggs, milk, bread, cheese, and apples.",
                "The password is: P@ssw0rd! Keep it secret.",
                "\"To be, or not to be,\" that is the question.",
            ],
        }
    }

    pub fn random_text<R: Rng>(self, rng: &mut R) -> &'static str {
        self.texts().choose(rng).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum KeyboardType {
    Us,
    Jp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OsType {
    Windows,
    Mac,
}

/// Rows of key caps, top to bottom.
pub fn keyboard_layout(keyboard: KeyboardType, os: OsType) -> &'static [&'static [&'static str]] {
    match (keyboard, os) {
        (KeyboardType::Us, OsType::Windows) => &[
            &["`", "1", "2", "3", "4", "5", "6", "7", "8", "9", "0", "-", "=", "Backspace"],
            &["Tab", "q", "w", "e", "r", "t", "y", "u", "i", "o", "p", "[", "]", "\\"],
            &["Caps", "a", "s", "d", "f", "g", "h", "j", "k", "l", ";", "'", "Enter"],
            &["Shift", "z", "x", "c", "v", "b", "n", "m", ",", ".", "/", "Shift"],
            &["Ctrl", "Win", "Alt", "Space", "Alt", "Menu", "Ctrl"],
        ],
        (KeyboardType::Us, OsType::Mac) => &[
            &["`", "1", "2", "3", "4", "5", "6", "7", "8", "9", "0", "-", "=", "Delete"],
            &["Tab", "q", "w", "e", "r", "t", "y", "u", "i", "o", "p", "[", "]", "\\"],
            &["Caps", "a", "s", "d", "f", "g", "h", "j", "k", "l", ";", "'", "Return"],
            &["Shift", "z", "x", "c", "v", "b", "n", "m", ",", ".", "/", "Shift"],
            &["fn", "ctrl", "opt", "cmd", "Space", "cmd", "opt", "ctrl"],
        ],
        (KeyboardType::Jp, OsType::Windows) => &[
            &["半角/全角", "1", "2", "3", "4", "5", "6", "7", "8", "9", "0", "-", "^", "\\", "Backspace"],
            &["Tab", "q", "w", "e", "r", "t", "y", "u", "i", "o", "p", "@", "[", "Enter"],
            &["Caps", "a", "s", "d", "f", "g", "h", "j", "k", "l", ";", ":", "]"],
            &["Shift", "z", "x", "c", "v", "b", "n", "m", ",", ".", "/", "\\", "Shift"],
            &["Ctrl", "Win", "Alt", "無変換", "Space", "変換", "カタカナ", "Alt", "Menu", "Ctrl"],
        ],
        (KeyboardType::Jp, OsType::Mac) => &[
            &["英数", "1", "2", "3", "4", "5", "6", "7", "8", "9", "0", "-", "^", "\\", "Delete"],
            &["Tab", "q", "w", "e", "r", "t", "y", "u", "i", "o", "p", "@", "[", "Return"],
            &["Caps", "a", "s", "d", "f", "g", "h", "j", "k", "l", ";", ":", "]"],
            &["Shift", "z", "x", "c", "v", "b", "n", "m", ",", ".", "/", "\\", "Shift"],
            &["fn", "ctrl", "opt", "cmd", "Space", "cmd", "opt", "ctrl"],
        ],
    }
}

/// The key cap to highlight for the next expected character, if the layout
/// has one. Letters match case-insensitively; a space maps to `Space`.
pub fn key_cap_for(layout: &[&[&'static str]], expected: char) -> Option<&'static str> {
    if expected == ' ' {
        return Some("Space");
    }
    let wanted = expected.to_lowercase().to_string();
    layout
        .iter()
        .flat_map(|row| row.iter())
        .find(|cap| **cap == wanted)
        .copied()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    Char(char),
    Backspace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    NotStarted,
    Running,
    Finished,
}

/// Final metrics shown when a run completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypingResult {
    pub wpm: u32,
    pub accuracy: u32,
    pub time: u64,
    pub mistakes: u32,
}

/// One practice run.
#[derive(Debug, Clone)]
pub struct TypingSession {
    state: SessionState,
    target: Vec<char>,
    typed: Vec<char>,
    elapsed_secs: u64,
    mistakes: u32,
    wpm: u32,
    accuracy: u32,
    result: Option<TypingResult>,
}

impl Default for TypingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TypingSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::NotStarted,
            target: Vec::new(),
            typed: Vec::new(),
            elapsed_secs: 0,
            mistakes: 0,
            wpm: 0,
            accuracy: 100,
            result: None,
        }
    }

    /// Enter Running with a fresh text. Valid from any state; counters reset.
    pub fn start(&mut self, text: &str) {
        *self = Self {
            state: SessionState::Running,
            target: text.chars().collect(),
            ..Self::new()
        };
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn target(&self) -> String {
        self.target.iter().collect()
    }

    pub fn typed(&self) -> String {
        self.typed.iter().collect()
    }

    pub fn typed_len(&self) -> usize {
        self.typed.len()
    }

    /// Next character the user is expected to type.
    pub fn expected(&self) -> Option<char> {
        self.target.get(self.typed.len()).copied()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    pub fn wpm(&self) -> u32 {
        self.wpm
    }

    pub fn accuracy(&self) -> u32 {
        self.accuracy
    }

    pub fn result(&self) -> Option<TypingResult> {
        self.result
    }

    /// One second has passed. Ignored unless running.
    pub fn tick(&mut self) {
        if self.is_running() {
            self.elapsed_secs += 1;
            self.recompute();
        }
    }

    /// Apply a keystroke. Returns the result when this key completes the run.
    pub fn key(&mut self, keystroke: Keystroke) -> Option<TypingResult> {
        if !self.is_running() {
            return None;
        }

        match keystroke {
            Keystroke::Backspace => {
                self.typed.pop();
                self.recompute();
                None
            }
            Keystroke::Char(c) => {
                if self.expected() != Some(c) {
                    self.mistakes += 1;
                }
                self.typed.push(c);
                self.recompute();

                if self.typed.len() >= self.target.len() {
                    Some(self.finish())
                } else {
                    None
                }
            }
        }
    }

    /// Stop the run and snapshot the metrics.
    pub fn finish(&mut self) -> TypingResult {
        let result = TypingResult {
            wpm: self.wpm,
            accuracy: self.accuracy,
            time: self.elapsed_secs,
            mistakes: self.mistakes,
        };
        self.state = SessionState::Finished;
        self.result = Some(result);
        result
    }

    fn recompute(&mut self) {
        let typed = self.typed.len();
        if typed == 0 {
            return;
        }
        if let Some(wpm) = words_per_minute(typed, self.elapsed_secs) {
            self.wpm = wpm;
        }
        self.accuracy = accuracy(typed, self.mistakes);
    }
}

/// `(typed / 5) / minutes`, rounded. `None` before the first second.
pub fn words_per_minute(typed_chars: usize, elapsed_secs: u64) -> Option<u32> {
    if elapsed_secs == 0 {
        return None;
    }
    let words = typed_chars as f64 / 5.0;
    let minutes = elapsed_secs as f64 / 60.0;
    Some((words / minutes).round() as u32)
}

/// `round((1 - mistakes / typed) * 100)`, floored at zero.
pub fn accuracy(typed_chars: usize, mistakes: u32) -> u32 {
    if typed_chars == 0 {
        return 100;
    }
    let ratio = 1.0 - mistakes as f64 / typed_chars as f64;
    (ratio * 100.0).round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn type_str(session: &mut TypingSession, s: &str) -> Option<TypingResult> {
        let mut last = None;
        for c in s.chars() {
            last = session.key(Keystroke::Char(c));
        }
        last
    }

    #[test]
    fn test_mistake_and_accuracy_on_completion() {
        let mut session = TypingSession::new();
        session.start("abc");
        let result = type_str(&mut session, "axc").unwrap();

        assert_eq!(session.mistakes(), 1);
        assert_eq!(result.accuracy, 67);
        assert_eq!(session.state(), SessionState::Finished);
    }

    #[test]
    fn test_keys_ignored_before_start_and_after_finish() {
        let mut session = TypingSession::new();
        assert_eq!(session.key(Keystroke::Char('a')), None);
        assert_eq!(session.typed_len(), 0);

        session.start("a");
        assert!(session.key(Keystroke::Char('a')).is_some());
        assert_eq!(session.key(Keystroke::Char('b')), None);
        assert_eq!(session.typed(), "a");
    }

    #[test]
    fn test_backspace_removes_but_keeps_mistakes() {
        let mut session = TypingSession::new();
        session.start("abcd");
        type_str(&mut session, "ax");
        session.key(Keystroke::Backspace);
        assert_eq!(session.typed(), "a");
        assert_eq!(session.expected(), Some('b'));
        assert_eq!(session.mistakes(), 1);

        session.key(Keystroke::Backspace);
        session.key(Keystroke::Backspace);
        assert_eq!(session.typed_len(), 0);
    }

    #[test]
    fn test_wpm_uses_elapsed_seconds() {
        let mut session = TypingSession::new();
        session.start("aaaaaaaaaaaa");
        type_str(&mut session, "aaaaa");
        assert_eq!(session.wpm(), 0);

        for _ in 0..6 {
            session.tick();
        }
        // 5 chars = 1 word in 0.1 minutes.
        assert_eq!(session.wpm(), 10);
        assert_eq!(session.elapsed_secs(), 6);
    }

    #[test]
    fn test_tick_ignored_when_not_running() {
        let mut session = TypingSession::new();
        session.tick();
        assert_eq!(session.elapsed_secs(), 0);

        session.start("a");
        session.tick();
        session.key(Keystroke::Char('a'));
        session.tick();
        assert_eq!(session.result().unwrap().time, 1);
        assert_eq!(session.elapsed_secs(), 1);
    }

    #[test]
    fn test_restart_resets_counters() {
        let mut session = TypingSession::new();
        session.start("ab");
        session.tick();
        type_str(&mut session, "xx");
        session.start("cd");
        assert!(session.is_running());
        assert_eq!(session.mistakes(), 0);
        assert_eq!(session.elapsed_secs(), 0);
        assert_eq!(session.accuracy(), 100);
        assert_eq!(session.result(), None);
        assert_eq!(session.target(), "cd");
    }

    #[test]
    fn test_multibyte_targets_count_characters() {
        let mut session = TypingSession::new();
        session.start("日本");
        assert!(session.key(Keystroke::Char('日')).is_none());
        let result = session.key(Keystroke::Char('本')).unwrap();
        assert_eq!(result.accuracy, 100);
    }

    #[test]
    fn test_formulas() {
        assert_eq!(words_per_minute(50, 60), Some(10));
        assert_eq!(words_per_minute(10, 0), None);
        assert_eq!(accuracy(3, 1), 67);
        assert_eq!(accuracy(0, 0), 100);
        assert_eq!(accuracy(2, 5), 0);
    }

    #[test]
    fn test_every_practice_type_has_texts() {
        let mut rng = StdRng::seed_from_u64(3);
        for practice in PracticeType::ALL {
            assert_eq!(practice.texts().len(), 5);
            let text = practice.random_text(&mut rng);
            assert!(practice.texts().contains(&text));
        }
    }

    #[test]
    fn test_key_cap_lookup() {
        let layout = keyboard_layout(KeyboardType::Us, OsType::Windows);
        assert_eq!(key_cap_for(layout, 'A'), Some("a"));
        assert_eq!(key_cap_for(layout, ' '), Some("Space"));
        assert_eq!(key_cap_for(layout, ';'), Some(";"));
        assert_eq!(key_cap_for(layout, '!'), None);

        let jp = keyboard_layout(KeyboardType::Jp, OsType::Mac);
        assert_eq!(jp.len(), 5);
        assert_eq!(key_cap_for(jp, '@'), Some("@"));
    }
}
