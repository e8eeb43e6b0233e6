mod app;
mod commands;
mod config;
mod domain;
mod input;
mod logging;
mod notifications;
mod persistence;
mod store;
mod ui;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use commands::{AddArgs, App};
use config::load_config;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use persistence::{config_file, ensure_data_dir, init_local_data_dir, log_file};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "habit")]
#[command(about = "A terminal habit tracker with daily reminders", long_about = None)]
struct Cli {
    /// Data directory (default: nearest .habit, then ~/.habit)
    #[arg(long, global = true, value_name = "DIR")]
    data: Option<PathBuf>,

    /// More log output (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Less log output (-q, -qq)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .habit directory in the current directory
    Init,
    /// List activities
    List,
    /// Add an activity with a daily reminder
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// First day (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        start: Option<String>,
        /// Last day (YYYY-MM-DD). Omit for an ongoing activity.
        #[arg(long)]
        end: Option<String>,
        /// Reminder time (HH:MM). Defaults to the configured time.
        #[arg(long, value_name = "HH:MM")]
        at: Option<String>,
    },
    /// Mark an activity done
    Done {
        id: String,
        /// Day to mark (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete an activity and cancel its reminder
    Delete { id: String },
    /// Replace all reminders for activities active today
    Reschedule,
    /// Deliver due reminders
    Remind {
        /// Check once and exit
        #[arg(long)]
        once: bool,
    },
    /// Turn reminders on or off
    Notifications {
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return run_tui(cli.data, cli.verbose, cli.quiet);
    };

    logging::init_stderr(cli.verbose, cli.quiet)?;

    if let Commands::Init = command {
        let data_dir = match &cli.data {
            Some(dir) => ensure_data_dir(Some(dir))?,
            None => init_local_data_dir()?,
        };
        println!("Initialized habit directory: {}", data_dir.display());
        println!();
        println!("Habit will now use this directory for activities and reminders.");
        println!("Run 'habit' to start tracking.");
        return Ok(());
    }

    let data_dir = ensure_data_dir(cli.data.as_deref())?;
    let config_path = config_file(&data_dir);
    let mut config = load_config(&config_path)?;
    let mut app = commands::open_app(&data_dir, &config)?;
    debug!(data_dir = %data_dir.display(), "opened data directory");

    match command {
        Commands::Init => Ok(()),
        Commands::List => {
            commands::list(&app);
            Ok(())
        }
        Commands::Add {
            title,
            description,
            start,
            end,
            at,
        } => commands::add(
            &mut app,
            AddArgs {
                title,
                description,
                start,
                end,
                at,
            },
        )
        .map(|_| ()),
        Commands::Done { id, date } => commands::done(&mut app, &id, date.as_deref()),
        Commands::Delete { id } => commands::delete(&mut app, &id),
        Commands::Reschedule => commands::reschedule(&mut app),
        Commands::Remind { once } => {
            commands::remind(&mut app, once, config.reminder_check_interval())
        }
        Commands::Notifications { state } => commands::set_notifications(
            &mut app,
            &mut config,
            &config_path,
            matches!(state, Toggle::On),
        ),
    }
}

fn run_tui(data: Option<PathBuf>, verbose: u8, quiet: u8) -> Result<()> {
    let data_dir = ensure_data_dir(data.as_deref())?;
    logging::init_file(&log_file(&data_dir), verbose, quiet)?;

    // Show which directory we're using
    eprintln!("Using habit directory: {}", data_dir.display());

    let config = load_config(config_file(&data_dir))?;
    let mut app = commands::open_app(&data_dir, &config)?;
    info!(data_dir = %data_dir.display(), "starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, config.reminder_check_interval());

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Save on exit
    if let Err(e) = app.flush() {
        eprintln!("Error saving activities: {}", e);
    }

    if let Err(err) = result {
        eprintln!("Error: {}", err);
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    check_interval: Duration,
) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_check: Option<Instant> = None;

    loop {
        app.refresh_today();

        if last_check.map_or(true, |t| t.elapsed() >= check_interval) {
            for notification in commands::deliver_due(app) {
                app.set_status(format!("⏰ {}: {}", notification.title, notification.body));
            }
            last_check = Some(Instant::now());
        }

        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                // Only process key press events (ignore key release)
                if key.kind == KeyEventKind::Press {
                    if input::handle_key(app, key) {
                        return Ok(());
                    }

                    // Drop keys typed while the notification host was busy
                    if app.take_input_fence() {
                        let mut dropped = 0;
                        while event::poll(Duration::ZERO)? {
                            event::read()?;
                            dropped += 1;
                        }
                        if dropped > 0 {
                            debug!(dropped, "discarded input queued during reminder update");
                        }
                    }
                }
            }
        }

        // Retry a write that failed earlier
        if app.store.needs_save() {
            if let Err(e) = app.flush() {
                app.set_error(format!("Not saved to disk: {}", e));
            }
        }
    }
}
