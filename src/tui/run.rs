//! Terminal setup and teardown around the board.

use std::{io, sync::Arc};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};
use tracing::{info, warn};

use crate::{
    api::TaskService,
    config::Config,
    fields::{Filter, Priority, Status},
    orchestrator::{Context, Orchestrator, ThreadExecutor},
    store::TaskStore,
    tui::app::App,
};

/// Puts the terminal back into cooked mode on the main screen when dropped.
///
/// Created right after raw mode is enabled, so later setup failures and
/// unwinding panics still hand back a usable shell.
struct TerminalGuard;

impl TerminalGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

/// Restore the terminal before the default hook prints the panic message,
/// otherwise the message is drawn on the alternate screen and lost.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));
}

/// Initialise the terminal, run the board until the user quits, then restore it.
pub fn run_board(
    config: &Config,
    service: Arc<dyn TaskService>,
    status: Filter<Status>,
    priority: Filter<Priority>,
) -> io::Result<()> {
    let mut store = TaskStore::new(config.page_size);
    store.set_status_filter(status);
    store.set_priority_filter(priority);
    let ctx = Context::new(store, config.notice_lifetime());
    let orchestrator = Orchestrator::new(ThreadExecutor::new(service));
    let mut app = App::new(ctx, orchestrator, config.api_url.clone());

    let guard = TerminalGuard::enable()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    install_panic_hook();
    info!("terminal ready");

    let result = app.run(&mut terminal);

    drop(guard);
    if let Err(e) = terminal.show_cursor() {
        warn!(error = %e, "failed to show cursor");
    }
    info!("terminal restored");

    result
}
