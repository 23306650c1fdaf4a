//! Discrete input events delivered by a host, and the hotkey table.

use crate::editing::Patch;
use crate::media::{FileRef, ReadRequest, ReadTicket, TransferEvent};
use crate::schema::{MarkType, NodeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Tab,
    Enter,
    Backspace,
    Left,
    Right,
    Up,
    Down,
    Esc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    /// Command or Super key
    pub meta: bool,
}

/// A key press together with the modifiers held at the time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyChord {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.modifiers.alt = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.modifiers.meta = true;
        self
    }

    /// The platform "mod" key: Control, or Command where hosts report it
    pub fn has_mod(&self) -> bool {
        self.modifiers.ctrl || self.modifiers.meta
    }

    fn is_mod_char(&self, c: char) -> bool {
        let Key::Char(pressed) = self.key else {
            return false;
        };
        self.has_mod()
            && !self.modifiers.shift
            && !self.modifiers.alt
            && pressed.eq_ignore_ascii_case(&c)
    }

    fn is_tab(&self, shift: bool) -> bool {
        self.key == Key::Tab
            && self.modifiers.shift == shift
            && !self.has_mod()
            && !self.modifiers.alt
    }
}

/// Mark toggled by a recognised hotkey
///
/// shift+tab is checked before tab.
pub fn hotkey_mark(chord: &KeyChord) -> Option<MarkType> {
    if chord.is_mod_char('b') {
        Some(MarkType::Bold)
    } else if chord.is_mod_char('i') {
        Some(MarkType::Italic)
    } else if chord.is_mod_char('u') {
        Some(MarkType::Underlined)
    } else if chord.is_mod_char('`') {
        Some(MarkType::Code)
    } else if chord.is_tab(true) {
        Some(MarkType::TabDown)
    } else if chord.is_tab(false) {
        Some(MarkType::Tab)
    } else {
        None
    }
}

/// One event from the host, translated into exactly one command
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown(KeyChord),
    MarkButton(MarkType),
    BlockButton(NodeType),
    /// Answer to the image URL prompt; `None` when it was dismissed
    ImagePrompt(Option<String>),
    FileChosen(FileRef),
    UploadSubmitted,
    /// A drop or paste
    Transfer(TransferEvent),
    ReadCompleted {
        ticket: ReadTicket,
        result: Result<Vec<u8>, String>,
    },
}

/// What handling an event did
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    Applied(Patch),
    /// Nothing changed yet; a file was remembered for upload
    FileHeld,
    /// The host has to perform these reads and report back
    Reads(Vec<ReadRequest>),
}
