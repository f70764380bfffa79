// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rj - remote job controller TUI

mod app;
mod form;
mod input;
mod msg;
mod tasks;
mod ui;

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode, KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use rj_core::{Host, SystemClock};
use rj_remote::SshRunner;
use rj_storage::JobStore;

use crate::app::App;
use crate::msg::{Cmd, Msg};
use crate::tasks::TaskCtx;

/// Cadence of the background tickers.
const SYNC_TICK: Duration = Duration::from_secs(15);
const LOG_TICK: Duration = Duration::from_secs(2);
const HOST_TICK: Duration = Duration::from_secs(30);
const UI_TICK: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "rj", version, about = "Remote job controller")]
struct Args {
    /// Database path (default: ~/.local/share/rj/jobs.db)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Extra hosts to show in the hosts view
    #[arg(long = "host")]
    hosts: Vec<String>,
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rj")
        .join("jobs.db")
}

/// File-only logging: a TUI owns the terminal, stderr would corrupt
/// the alternate screen.
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = dirs::state_dir()
        .or_else(dirs::cache_dir)?
        .join("rj");
    std::fs::create_dir_all(&log_dir).ok()?;
    let appender = tracing_appender::rolling::never(log_dir, "rj.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

type Backend = CrosstermBackend<Stdout>;
type Term = Terminal<Backend>;

fn setup_terminal() -> Result<Term> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).context("enter alt screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("create terminal")
}

fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode().context("disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("leave alt screen")?;
    terminal.show_cursor().context("show cursor")?;
    Ok(())
}

/// Forward crossterm events into the message channel. Runs until the
/// channel closes.
fn spawn_input_task(tx: mpsc::UnboundedSender<Msg>) {
    tokio::spawn(async move {
        loop {
            let event = tokio::task::spawn_blocking(|| {
                if crossterm::event::poll(Duration::from_millis(100)).unwrap_or(false) {
                    crossterm::event::read().ok()
                } else {
                    None
                }
            })
            .await;

            let msg = match event {
                Ok(Some(CrosstermEvent::Key(key))) => Some(Msg::Key(key)),
                Ok(Some(CrosstermEvent::Mouse(mouse))) => Some(Msg::Mouse(mouse)),
                Ok(Some(CrosstermEvent::Resize(w, h))) => Some(Msg::Resize(w, h)),
                Ok(_) => None,
                Err(_) => break,
            };
            if let Some(msg) = msg {
                if tx.send(msg).is_err() {
                    break;
                }
            }
        }
    });
}

fn spawn_ticker(tx: mpsc::UnboundedSender<Msg>, period: Duration, make: fn() -> Msg) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if tx.send(make()).is_err() {
                break;
            }
        }
    });
}

/// Seed the host table: cached hosts, hosts with job rows, CLI extras.
fn seed_hosts(store: &JobStore, extra: &[String]) -> Vec<Host> {
    let mut hosts: Vec<Host> = Vec::new();
    if let Ok(cached) = store.load_all_cached_hosts() {
        hosts.extend(cached.iter().map(Host::from_cache));
    }
    let mut known: Vec<String> = hosts.iter().map(|h| h.name.clone()).collect();
    let mut add_named = |name: &str, hosts: &mut Vec<Host>, known: &mut Vec<String>| {
        if !known.iter().any(|k| k == name) {
            known.push(name.to_string());
            hosts.push(Host::named(name));
        }
    };
    if let Ok(names) = store.list_unique_hosts() {
        for name in names {
            add_named(&name, &mut hosts, &mut known);
        }
    }
    for name in extra {
        add_named(name, &mut hosts, &mut known);
    }
    hosts
}

/// Release the terminal and stop ourselves; the shell's `fg` resumes
/// us and we re-enter raw mode.
fn suspend_self(terminal: &mut Term) -> Result<()> {
    restore_terminal(terminal)?;
    let pid = std::process::id().to_string();
    let _ = std::process::Command::new("kill")
        .args(["-TSTP", &pid])
        .status();
    // Execution continues here after `fg`.
    enable_raw_mode().context("re-enable raw mode")?;
    execute!(
        terminal.backend_mut(),
        EnterAlternateScreen,
        EnableMouseCapture
    )
    .context("re-enter alt screen")?;
    terminal.clear().context("clear after resume")?;
    Ok(())
}

/// Release the terminal and attach to a remote tmux session; returns
/// when the user detaches.
async fn attach_session(
    terminal: &mut Term,
    remote: &SshRunner,
    host: &str,
    session: &str,
) -> Result<()> {
    restore_terminal(terminal)?;
    let result = remote
        .run_interactive(host, &format!("tmux attach -t {session}"))
        .await;
    enable_raw_mode().context("re-enable raw mode")?;
    execute!(
        terminal.backend_mut(),
        EnterAlternateScreen,
        EnableMouseCapture
    )
    .context("re-enter alt screen")?;
    terminal.clear().context("clear after attach")?;
    result.map(|_| ()).context("attach failed")
}

async fn run_event_loop(
    terminal: &mut Term,
    app: &mut App,
    rx: &mut mpsc::UnboundedReceiver<Msg>,
    ctx: &TaskCtx,
) -> Result<()> {
    terminal.draw(|frame| ui::render(frame, app))?;

    while let Some(msg) = rx.recv().await {
        // Suspend must be handled where the terminal lives.
        if let Msg::Key(key) = &msg {
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('z') {
                suspend_self(terminal)?;
                terminal.draw(|frame| ui::render(frame, app))?;
                continue;
            }
        }

        for cmd in app.update(msg) {
            match cmd {
                Cmd::Quit => return Ok(()),
                Cmd::Suspend => suspend_self(terminal)?,
                Cmd::Attach { host, session } => {
                    if let Err(err) =
                        attach_session(terminal, &ctx.remote, &host, &session).await
                    {
                        app.set_flash(err.to_string(), true);
                    }
                }
                other => tasks::dispatch(ctx, other),
            }
        }

        if app.should_quit {
            return Ok(());
        }
        terminal.draw(|frame| ui::render(frame, app))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging();

    let db_path = args.db.clone().unwrap_or_else(default_db_path);
    let store = Arc::new(
        JobStore::open(&db_path)
            .with_context(|| format!("opening job store at {}", db_path.display()))?,
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<Msg>();
    let ctx = TaskCtx {
        store: Arc::clone(&store),
        remote: SshRunner::new(),
        clock: SystemClock,
        tx: tx.clone(),
    };

    let mut app = App::new(seed_hosts(&store, &args.hosts));

    let mut terminal = setup_terminal()?;
    spawn_input_task(tx.clone());
    spawn_ticker(tx.clone(), SYNC_TICK, || Msg::SyncTick);
    spawn_ticker(tx.clone(), LOG_TICK, || Msg::LogTick);
    spawn_ticker(tx.clone(), HOST_TICK, || Msg::HostTick);
    spawn_ticker(tx.clone(), UI_TICK, || Msg::UiTick);

    // First paint needs data.
    tasks::dispatch(&ctx, Cmd::RefreshJobs);

    tracing::info!(db = %db_path.display(), "rj starting");
    let result = run_event_loop(&mut terminal, &mut app, &mut rx, &ctx).await;

    restore_terminal(&mut terminal)?;
    tracing::info!("rj stopped");
    result
}
