use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use brand_color_api::DeliveryClientFactory;
use brand_color_engine::{Coordinator, ExtensionState, InitializeOutcome, MemoryHost, ReadyConnector};
use clap::{Parser, Subcommand};
use tracing::debug;

mod session;

use session::{SessionFile, load_session, resolve_session_path, save_session};

#[derive(Debug, Parser)]
#[command(name = "brand-color", version, about = "Preview and edit brand color field values")]
struct Cli {
    /// Session file describing the host (defaults to the config directory).
    #[arg(long, global = true, value_name = "PATH")]
    session: Option<PathBuf>,
    /// Content request timeout in seconds.
    #[arg(long, global = true, value_name = "SECS", default_value_t = 30)]
    timeout: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load the palette and show the current selection.
    Show {
        /// Print the full state as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Select a color by its stored key (name or value).
    Select {
        key: String,
        /// Persist the new field value to the session file.
        #[arg(long)]
        write: bool,
    },
    /// Clear the field.
    Clear {
        /// Persist the cleared value to the session file.
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let path = resolve_session_path(cli.session.as_deref());
    let mut session = load_session(&path).with_context(|| format!("load session from {}", path.display()))?;
    debug!(path = %path.display(), "session loaded");

    let host = Arc::new(session.to_host());
    let coordinator = Coordinator::new(
        Arc::new(ReadyConnector::new(host.clone())),
        Arc::new(DeliveryClientFactory::with_timeout(Duration::from_secs(cli.timeout))),
        host.clone(),
    );

    let outcome = coordinator.initialize().await;
    let result = run_command(&cli.command, &coordinator, &outcome);
    coordinator.shutdown().await;
    let persist = result?;

    if persist {
        write_back(&mut session, &host, &path)?;
    }
    Ok(())
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Execute a subcommand against an initialized coordinator. Returns whether the
/// field value should be written back to the session file.
fn run_command(command: &Command, coordinator: &Coordinator, outcome: &InitializeOutcome) -> Result<bool> {
    let state = coordinator.state();
    if let InitializeOutcome::Failed(_) = outcome {
        bail!("{}", state.palette.name);
    }

    match command {
        Command::Show { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                print!("{}", render_state(&state));
            }
            Ok(false)
        }
        Command::Select { key, write } => {
            let entry = coordinator.find_existing_color(Some(key.as_str()));
            coordinator.select_color(entry).context("select color")?;
            let state = coordinator.state();
            print!("{}", render_state(&state));
            println!("field value: {}", state.selected_key().unwrap_or("<none>"));
            Ok(*write)
        }
        Command::Clear { write } => {
            coordinator.select_color(None).context("clear color")?;
            print!("{}", render_state(&coordinator.state()));
            println!("field value: <none>");
            Ok(*write)
        }
    }
}

fn write_back(session: &mut SessionFile, host: &MemoryHost, path: &std::path::Path) -> Result<()> {
    session.value = host.value();
    save_session(session, path).with_context(|| format!("save session to {}", path.display()))?;
    debug!(path = %path.display(), "session updated");
    Ok(())
}

/// Plain-text listing of the palette with the selection marked.
fn render_state(state: &ExtensionState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", state.palette.name);

    let name_width = state
        .palette
        .colors
        .iter()
        .map(|entry| entry.name.chars().count())
        .max()
        .unwrap_or(0);
    for entry in &state.palette.colors {
        let marker = if state.is_selected(entry) { '*' } else { ' ' };
        let _ = writeln!(out, "  {marker} {:<name_width$}  {}", entry.name, entry.color);
    }

    match state.selected.as_ref() {
        Some(entry) if !state.palette.colors.contains(entry) => {
            let _ = writeln!(out, "selected: {} (not in palette)", entry.name);
        }
        Some(entry) => {
            let _ = writeln!(out, "selected: {} ({})", entry.name, entry.color);
        }
        None => {
            let _ = writeln!(out, "selected: <none>");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use brand_color_types::{ColorEntry, Palette};

    fn loaded_state(selected: Option<ColorEntry>) -> ExtensionState {
        ExtensionState {
            palette: Palette {
                name: "Brand (Primary)".into(),
                groups: Vec::new(),
                colors: vec![ColorEntry::new("Sky", "#00aaff"), ColorEntry::new("Navy", "#001f3f")],
                failure: false,
            },
            selected,
            params: None,
        }
    }

    #[test]
    fn render_marks_selected_entry() {
        let rendered = render_state(&loaded_state(Some(ColorEntry::new("Navy", "#001f3f"))));
        assert_eq!(
            rendered,
            "Brand (Primary)\n    Sky   #00aaff\n  * Navy  #001f3f\nselected: Navy (#001f3f)\n"
        );
    }

    #[test]
    fn render_flags_unrecognized_selection() {
        let rendered = render_state(&loaded_state(Some(ColorEntry::unrecognized("#123456"))));
        assert!(rendered.ends_with("selected: #123456 (not in palette)\n"));
        assert!(!rendered.contains('*'));
    }

    #[test]
    fn cli_parses_select_with_global_session() {
        let cli = Cli::try_parse_from(["brand-color", "select", "Sky", "--write", "--session", "/tmp/s.json"]).expect("parse args");
        assert_eq!(cli.session, Some(PathBuf::from("/tmp/s.json")));
        assert_eq!(cli.timeout, 30);
        assert!(matches!(cli.command, Command::Select { ref key, write: true } if key == "Sky"));
    }

    #[tokio::test]
    async fn failed_initialization_aborts_commands() {
        let host = Arc::new(MemoryHost::new(serde_json::json!({})));
        let coordinator = Coordinator::new(
            Arc::new(ReadyConnector::new(host.clone())),
            Arc::new(DeliveryClientFactory::default()),
            host.clone(),
        );
        let outcome = coordinator.initialize().await;
        assert!(matches!(outcome, InitializeOutcome::Failed(_)));

        let error = run_command(&Command::Show { json: false }, &coordinator, &outcome).expect_err("palette failed");
        assert!(error.to_string().starts_with("(Failed to load colors: "));
    }
}
