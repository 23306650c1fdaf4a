use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use rich_composer_engine::editing::selection::{
    adjacent_block_start, block_end, block_start, document_start, point_after, point_before,
};
use rich_composer_engine::input::{InputEvent, InputOutcome, Key, KeyChord, Modifiers, hotkey_mark};
use rich_composer_engine::media::{FileRef, ReadRequest, ReadTicket, Transfer, TransferEvent, TransferKind};
use rich_composer_engine::{Editor, NodeType, Rejection, Selection, io};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

type ReadResult = (ReadTicket, Result<Vec<u8>, String>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    ImageUrl,
    FilePath,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            PromptKind::ImageUrl => "Enter the URL of the image: ",
            PromptKind::FilePath => "Image file to upload: ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Editing,
    Prompt { kind: PromptKind, input: String },
}

pub struct App {
    pub editor: Editor,
    pub document_path: PathBuf,
    pub mode: Mode,
    pub status: Option<String>,
    saved_version: u64,
    quit: bool,
    reads_tx: Sender<ReadResult>,
    reads_rx: Receiver<ReadResult>,
}

impl App {
    pub fn new(editor: Editor, document_path: PathBuf) -> Self {
        let (reads_tx, reads_rx) = mpsc::channel();
        Self {
            saved_version: editor.snapshot().version(),
            editor,
            document_path,
            mode: Mode::Editing,
            status: None,
            quit: false,
            reads_tx,
            reads_rx,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn is_modified(&self) -> bool {
        self.editor.snapshot().version() != self.saved_version
    }

    pub fn save(&mut self) {
        match io::write_value(&self.document_path, &self.editor.value()) {
            Ok(()) => {
                log::info!("saved {}", self.document_path.display());
                self.saved_version = self.editor.snapshot().version();
                self.status = Some(format!("Saved {}", self.document_path.display()));
            }
            Err(e) => {
                log::error!("failed to save {}: {e}", self.document_path.display());
                self.status = Some(format!("Error saving: {e}"));
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if let Mode::Prompt { kind, input } = &mut self.mode {
            match key.code {
                KeyCode::Esc => {
                    let kind = *kind;
                    self.mode = Mode::Editing;
                    if kind == PromptKind::ImageUrl {
                        self.dispatch(InputEvent::ImagePrompt(None));
                    }
                }
                KeyCode::Enter => {
                    let (kind, input) = (*kind, std::mem::take(input));
                    self.mode = Mode::Editing;
                    self.submit_prompt(kind, input);
                }
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                _ => {}
            }
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Char('s') if ctrl => self.save(),
            KeyCode::Char('g') if ctrl => self.open_prompt(PromptKind::ImageUrl),
            KeyCode::Char('o') if ctrl => self.open_prompt(PromptKind::FilePath),
            KeyCode::Char('p') if ctrl => self.dispatch(InputEvent::UploadSubmitted),
            KeyCode::Char(c) if alt && !ctrl => {
                if let Some(node_type) = block_for_key(c) {
                    self.dispatch(InputEvent::BlockButton(node_type));
                }
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down | KeyCode::Home
            | KeyCode::End => self.move_caret(key.code, shift),
            _ => {
                if let Some(chord) = to_chord(&key)
                    && hotkey_mark(&chord).is_some()
                {
                    self.dispatch(InputEvent::KeyDown(chord));
                    return;
                }
                self.edit(key.code, ctrl);
            }
        }
    }

    fn edit(&mut self, code: KeyCode, ctrl: bool) {
        let result = match code {
            KeyCode::Enter => self.editor.split_block(),
            KeyCode::Backspace => self.editor.delete_backward(),
            KeyCode::Char(c) if !ctrl => self.editor.insert_text(&c.to_string()),
            _ => return,
        };
        self.report(result.map(InputOutcome::Applied));
    }

    fn open_prompt(&mut self, kind: PromptKind) {
        self.mode = Mode::Prompt {
            kind,
            input: String::new(),
        };
    }

    fn submit_prompt(&mut self, kind: PromptKind, input: String) {
        match kind {
            PromptKind::ImageUrl => self.dispatch(InputEvent::ImagePrompt(Some(input))),
            PromptKind::FilePath => {
                let input = input.trim();
                if input.is_empty() {
                    self.status = Some(Rejection::NoFileChosen.to_string());
                    return;
                }
                let file = FileRef::from_path(&PathBuf::from(input));
                self.dispatch(InputEvent::FileChosen(file));
            }
        }
    }

    /// Bracketed paste: an existing file path is dropped at the caret,
    /// anything else is pasted as text
    pub fn handle_paste(&mut self, text: String) {
        if self.mode != Mode::Editing {
            if let Mode::Prompt { input, .. } = &mut self.mode {
                input.push_str(text.trim());
            }
            return;
        }
        let path = PathBuf::from(text.trim());
        let event = if path.is_file() {
            TransferEvent {
                kind: TransferKind::Drop,
                target: self.editor.snapshot().selection().cloned(),
                transfer: Transfer::Files(vec![FileRef::from_path(&path)]),
            }
        } else {
            TransferEvent {
                kind: TransferKind::Paste,
                target: None,
                transfer: Transfer::Text(text.clone()),
            }
        };
        match self.editor.handle(InputEvent::Transfer(event)) {
            // Not an image URL: it is ordinary text
            Err(Rejection::NotAUrl(_) | Rejection::NotAnImage(_)) => {
                let result = self.editor.insert_text(&text);
                self.report(result.map(InputOutcome::Applied));
            }
            other => self.report(other),
        }
    }

    fn dispatch(&mut self, event: InputEvent) {
        let result = self.editor.handle(event);
        self.report(result);
    }

    fn report(&mut self, result: Result<InputOutcome, Rejection>) {
        match result {
            Ok(InputOutcome::Applied(_)) => self.status = None,
            Ok(InputOutcome::FileHeld) => {
                let name = self
                    .editor
                    .chosen_file()
                    .map(|f| f.name.clone())
                    .unwrap_or_default();
                self.status = Some(format!("Chose {name}, Ctrl+P to upload"));
            }
            Ok(InputOutcome::Reads(requests)) => {
                self.status = Some(format!("Reading {} file(s)", requests.len()));
                self.spawn_reads(requests);
            }
            Err(rejection) => {
                log::info!("{rejection}");
                self.status = Some(rejection.to_string());
            }
        }
    }

    fn spawn_reads(&self, requests: Vec<ReadRequest>) {
        for request in requests {
            let tx = self.reads_tx.clone();
            thread::spawn(move || {
                let result = match &request.file.path {
                    Some(path) => io::read_bytes(path).map_err(|e| e.to_string()),
                    None => Err(format!("{} is not a local file", request.file.name)),
                };
                // The receiver is gone only when the app is shutting down
                let _ = tx.send((request.ticket, result));
            });
        }
    }

    /// Feed finished reads back into the editor
    pub fn poll_reads(&mut self) {
        while let Ok((ticket, result)) = self.reads_rx.try_recv() {
            self.dispatch(InputEvent::ReadCompleted { ticket, result });
        }
    }

    fn move_caret(&mut self, code: KeyCode, extend: bool) {
        let snapshot = self.editor.snapshot();
        let tree = snapshot.tree();
        let selection = match snapshot.selection() {
            Some(selection) => selection.clone(),
            None => {
                let Some(start) = document_start(tree) else {
                    return;
                };
                Selection::collapsed(start)
            }
        };
        let focus = selection.focus;
        let next = match code {
            KeyCode::Left => point_before(tree, &focus),
            KeyCode::Right => point_after(tree, &focus),
            KeyCode::Up => adjacent_block_start(tree, &focus, true),
            KeyCode::Down => adjacent_block_start(tree, &focus, false),
            KeyCode::Home => block_start(tree, &focus),
            KeyCode::End => block_end(tree, &focus),
            _ => None,
        };
        let Some(next) = next else {
            return;
        };
        let moved = if extend {
            Selection::new(selection.anchor, next)
        } else {
            Selection::collapsed(next)
        };
        let result = self.editor.select(moved);
        self.report(result.map(InputOutcome::Applied));
    }
}

/// Alt+key block shortcuts
fn block_for_key(c: char) -> Option<NodeType> {
    match c {
        '1' => Some(NodeType::HeadingOne),
        '2' => Some(NodeType::HeadingTwo),
        'q' => Some(NodeType::BlockQuote),
        'n' => Some(NodeType::NumberedList),
        'b' => Some(NodeType::BulletedList),
        _ => None,
    }
}

pub fn to_chord(key: &KeyEvent) -> Option<KeyChord> {
    let (code, back_tab) = match key.code {
        KeyCode::Char(c) => (Key::Char(c), false),
        KeyCode::Tab => (Key::Tab, false),
        KeyCode::BackTab => (Key::Tab, true),
        KeyCode::Enter => (Key::Enter, false),
        KeyCode::Backspace => (Key::Backspace, false),
        KeyCode::Left => (Key::Left, false),
        KeyCode::Right => (Key::Right, false),
        KeyCode::Up => (Key::Up, false),
        KeyCode::Down => (Key::Down, false),
        KeyCode::Esc => (Key::Esc, false),
        _ => return None,
    };
    let m = key.modifiers;
    Some(KeyChord {
        key: code,
        modifiers: Modifiers {
            ctrl: m.contains(KeyModifiers::CONTROL),
            shift: back_tab || m.contains(KeyModifiers::SHIFT),
            alt: m.contains(KeyModifiers::ALT),
            meta: m.contains(KeyModifiers::SUPER) || m.contains(KeyModifiers::META),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rich_composer_engine::MarkType;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(press(KeyCode::Char(c), KeyModifiers::NONE));
        }
    }

    fn app_in(dir: &TempDir) -> App {
        let editor = Editor::from_json(r#"{"document":{"nodes":[]}}"#).unwrap();
        App::new(editor, dir.path().join("doc.json"))
    }

    fn document_text(app: &App) -> String {
        let tree = app.editor.snapshot().tree();
        tree.text_of(tree.root_key())
    }

    #[test]
    fn test_crossterm_keys_become_chords() {
        let chord = to_chord(&press(KeyCode::Char('b'), KeyModifiers::CONTROL)).unwrap();
        assert_eq!(hotkey_mark(&chord), Some(MarkType::Bold));

        let chord = to_chord(&press(KeyCode::BackTab, KeyModifiers::SHIFT)).unwrap();
        assert_eq!(hotkey_mark(&chord), Some(MarkType::TabDown));

        let chord = to_chord(&press(KeyCode::Char('b'), KeyModifiers::NONE)).unwrap();
        assert_eq!(hotkey_mark(&chord), None);

        assert!(to_chord(&press(KeyCode::F(1), KeyModifiers::NONE)).is_none());
    }

    #[test]
    fn test_typing_and_saving() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);

        type_text(&mut app, "Hi");
        app.handle_key(press(KeyCode::Enter, KeyModifiers::NONE));
        type_text(&mut app, "there");
        assert!(app.is_modified());

        app.handle_key(press(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert!(!app.is_modified());

        let saved = io::read_value(&dir.path().join("doc.json")).unwrap();
        assert_eq!(saved.document.nodes.len(), 2);
        assert_eq!(document_text(&app), "Hithere");
    }

    #[test]
    fn test_alt_keys_toggle_blocks() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        type_text(&mut app, "Title");

        app.handle_key(press(KeyCode::Char('1'), KeyModifiers::ALT));
        assert!(app.editor.block_button_active(&NodeType::HeadingOne));

        app.handle_key(press(KeyCode::Char('b'), KeyModifiers::ALT));
        assert!(app.editor.block_button_active(&NodeType::BulletedList));
    }

    #[test]
    fn test_shift_arrows_extend_the_selection() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        type_text(&mut app, "abc");

        app.handle_key(press(KeyCode::Left, KeyModifiers::SHIFT));
        app.handle_key(press(KeyCode::Left, KeyModifiers::SHIFT));
        app.handle_key(press(KeyCode::Char('b'), KeyModifiers::CONTROL));

        assert_eq!(document_text(&app), "abc");
        let outline = app.editor.snapshot().tree().outline();
        assert!(outline.contains(r#""a""#), "{outline}");
        assert!(outline.contains(r#""bc" [bold]"#), "{outline}");
    }

    #[test]
    fn test_image_url_prompt() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);

        app.handle_key(press(KeyCode::Char('g'), KeyModifiers::CONTROL));
        assert!(matches!(app.mode, Mode::Prompt { kind: PromptKind::ImageUrl, .. }));
        app.handle_paste("http://x.com/a.png".to_string());
        app.handle_key(press(KeyCode::Enter, KeyModifiers::NONE));

        assert_eq!(app.mode, Mode::Editing);
        let tree = app.editor.snapshot().tree();
        assert!(
            tree.leaf_blocks()
                .iter()
                .any(|b| b.has_type(&NodeType::Image))
        );
    }

    #[test]
    fn test_cancelled_prompt_reports_the_empty_url() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);

        app.handle_key(press(KeyCode::Char('g'), KeyModifiers::CONTROL));
        app.handle_key(press(KeyCode::Esc, KeyModifiers::NONE));

        assert_eq!(app.mode, Mode::Editing);
        assert_eq!(app.status, Some(Rejection::EmptyUrl.to_string()));
        assert!(!app.should_quit());
    }

    #[test]
    fn test_pasted_text_that_is_not_an_image_is_typed() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);

        app.handle_paste("hello".to_string());

        assert_eq!(document_text(&app), "hello");
    }

    #[test]
    fn test_pasted_image_path_is_read_in_the_background() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("pixel.png");
        std::fs::write(&image, b"abc").unwrap();
        let mut app = app_in(&dir);

        app.handle_paste(image.display().to_string());
        assert_eq!(app.editor.media().pending_count(), 1);

        let deadline = Instant::now() + Duration::from_secs(5);
        while app.editor.media().pending_count() > 0 && Instant::now() < deadline {
            app.poll_reads();
            thread::sleep(Duration::from_millis(10));
        }

        let tree = app.editor.snapshot().tree();
        let srcs: Vec<String> = tree
            .leaf_blocks()
            .iter()
            .filter_map(|b| b.data()?.get("src")?.as_str().map(str::to_string))
            .collect();
        assert_eq!(srcs, vec!["data:image/png;base64,YWJj"]);
    }
}
