//! Terminal front end for the scry console, driving the demo registry.
//!
//! Line editing and history come from rustyline; Tab completion goes
//! through the console's synchronous suggestion path, and `:suggest`
//! shows the full paged candidate list (including overload hints) for a
//! partial line.

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use clap::Parser;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Config, Context, Editor, Helper};
use tracing_subscriber::EnvFilter;

use scry_common::settings::Settings;
use scry_common::value::Value;
use scry_console::{Console, ExecOutcome};
use scry_suggest::{SuggestMode, Suggestions};

const SUGGEST_PAGE: usize = 10;

#[derive(Parser)]
#[command(name = "scry", about = "Interactive console over the demo registry")]
struct Cli {
    /// TOML settings file (safe_mode, using_namespaces, history_size).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Expose non-public types and members.
    #[arg(long)]
    unsafe_mode: bool,
    /// Additional using-namespace, searched after the configured ones.
    #[arg(long = "using", value_name = "NAMESPACE")]
    usings: Vec<String>,
}

fn load_settings(cli: &Cli) -> Result<Settings, Box<dyn Error>> {
    let mut settings: Settings = match &cli.config {
        Some(path) => toml::from_str(&fs::read_to_string(path)?)?,
        None => Settings {
            using_namespaces: vec!["Demo".to_string(), "Game".to_string()],
            ..Settings::default()
        },
    };
    if cli.unsafe_mode {
        settings.safe_mode = false;
    }
    settings.using_namespaces.extend(cli.usings.iter().cloned());
    Ok(settings)
}

/// rustyline glue: Tab completion over the console's suggestion engine.
struct ScryHelper {
    console: Arc<Mutex<Console>>,
}

impl Completer for ScryHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let console = self.console.lock().unwrap();
        let Some(suggestions) = console.suggest_now(line, pos) else {
            return Ok((pos, Vec::new()));
        };
        if suggestions.mode != SuggestMode::Completions {
            return Ok((pos, Vec::new()));
        }
        let start = pos.saturating_sub(suggestions.match_len);
        let pairs = suggestions
            .candidates
            .iter()
            .map(|c| Pair { display: c.display.clone(), replacement: c.display.clone() })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ScryHelper {
    type Hint = String;
}
impl Highlighter for ScryHelper {}
impl Validator for ScryHelper {}
impl Helper for ScryHelper {}

/// One page of candidates with overflow markers on both ends. The typed
/// prefix is what every candidate already matches, so only the tail is
/// interesting; the active parameter is called out for overload hints.
fn render_suggestions(suggestions: &Suggestions, offset: usize) {
    if suggestions.is_empty() {
        println!("  (no suggestions)");
        return;
    }
    let page = suggestions.page(offset, SUGGEST_PAGE);
    if page.hidden_before > 0 {
        println!("  ({} earlier results)", page.hidden_before);
    }
    for candidate in page.items {
        match suggestions.mode {
            SuggestMode::Completions if suggestions.match_len > 0 => {
                let (head, tail) = candidate.display.split_at(
                    suggestions.match_len.min(candidate.display.len()),
                );
                println!("  {head}|{tail}");
            }
            _ => println!("  {}", candidate.display),
        }
    }
    if page.hidden_after > 0 {
        println!("  ({} more results)", page.hidden_after);
    }
    if let Some(index) = suggestions.active_param {
        println!("  active parameter: {index}");
    }
}

fn run_line(console: &mut Console, line: &str) {
    match console.execute(line) {
        ExecOutcome::NotReady => {
            println!("(type catalog still building, try again)");
        }
        ExecOutcome::Value(Value::Void) => {}
        ExecOutcome::Value(value) => println!("{}", console.display(&value)),
        ExecOutcome::Failed(error) => eprintln!("error: {error}"),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    let history_size = settings.history_size;

    let demo = scry_registry::demo::build_demo();
    let console = Arc::new(Mutex::new(Console::new(Arc::new(demo.registry), settings)));

    // Let the catalog land before the first prompt; it is small enough
    // that this is nearly instant, and the loop below copes either way.
    for _ in 0..100 {
        let mut c = console.lock().unwrap();
        c.tick();
        if c.is_ready() {
            break;
        }
        drop(c);
        thread::sleep(Duration::from_millis(5));
    }

    let config = Config::builder().max_history_size(history_size)?.build();
    let mut editor: Editor<ScryHelper, DefaultHistory> = Editor::with_config(config)?;
    editor.set_helper(Some(ScryHelper { console: console.clone() }));

    println!("scry console -- :suggest <partial> for hints, Ctrl-D to exit");
    loop {
        console.lock().unwrap().tick();
        match editor.readline("scry> ") {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());
                if let Some(partial) = line.strip_prefix(":suggest ") {
                    let console = console.lock().unwrap();
                    match console.suggest_now(partial, partial.len()) {
                        Some(suggestions) => render_suggestions(&suggestions, 0),
                        None => println!("(type catalog still building, try again)"),
                    }
                    continue;
                }
                run_line(&mut console.lock().unwrap(), &line);
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(error) => {
                tracing::error!(%error, "read failed");
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_file_round_trips() {
        let text = "safe_mode = false\nusing_namespaces = [\"Game\"]\nhistory_size = 7\n";
        let settings: Settings = toml::from_str(text).expect("valid settings");
        assert!(!settings.safe_mode);
        assert_eq!(settings.using_namespaces, vec!["Game".to_string()]);
        assert_eq!(settings.history_size, 7);
    }

    #[test]
    fn partial_settings_fall_back_to_defaults() {
        let settings: Settings = toml::from_str("safe_mode = false\n").expect("valid settings");
        assert!(!settings.safe_mode);
        assert_eq!(settings.history_size, Settings::default().history_size);
    }
}
