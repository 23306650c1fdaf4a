mod app;
mod view;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use rich_composer_config::Config;
use rich_composer_engine::media::MediaPolicy;
use rich_composer_engine::render::{html::to_html, render};
use rich_composer_engine::Editor;
use std::{
    env,
    fs::{self, OpenOptions},
    io::{Stdout, stdout},
    path::{Path, PathBuf},
    process,
    time::Duration,
};

use crate::app::App;

const WELCOME_VALUE: &str = include_str!("../assets/value.json");
const DEFAULT_DOCUMENT: &str = "rich-composer.json";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let html = args.iter().skip(1).any(|a| a == "--html");
    let positional: Vec<&String> = args.iter().skip(1).filter(|a| *a != "--html").collect();
    let config_path = Config::config_path();

    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", config_path.display());
            process::exit(1);
        }
    };

    let document_path = match positional.as_slice() {
        [path] => PathBuf::from(path),
        [] => config
            .document_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCUMENT)),
        _ => {
            eprintln!("Usage: {} [value.json] [--html]", args[0]);
            process::exit(1);
        }
    };

    init_logging(&config, html)?;
    log::info!("rich-composer starting up!");

    let editor = load_editor(&document_path)?;
    let editor = match &config.media.image_extensions {
        Some(extensions) => editor.with_media_policy(MediaPolicy::with_extensions(extensions)),
        None => editor,
    };

    if html {
        println!("{}", to_html(&render(editor.snapshot())));
        return Ok(());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(editor, document_path);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

/// Open the document, or start a new one from the welcome value
fn load_editor(path: &Path) -> Result<Editor> {
    if path.exists() {
        return Editor::open(path);
    }
    log::info!("{} does not exist yet, starting from the welcome document", path.display());
    Editor::from_json(WELCOME_VALUE).context("Bundled welcome document is invalid")
}

/// The terminal belongs to the editor, so logs go to a file unless only
/// printing HTML
fn init_logging(config: &Config, to_stderr: bool) -> Result<()> {
    let env = env_logger::Env::default().default_filter_or(config.logging.level.as_str());
    let mut builder = env_logger::Builder::from_env(env);
    if !to_stderr {
        let log_file = config.log_file();
        if let Some(parent) = log_file.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .with_context(|| format!("Failed to open log file {}", log_file.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| view::ui(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) => app.handle_key(key),
                Event::Paste(text) => app.handle_paste(text),
                _ => {}
            }
        }
        app.poll_reads();

        if app.should_quit() {
            return Ok(());
        }
    }
}
