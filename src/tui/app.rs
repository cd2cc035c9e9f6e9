//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which owns the session `Context`,
//! translates key and mouse events into orchestrator commands, and paints the
//! board, the task form, the details overlay and the delete confirmation.

use std::io;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};

use crate::{
    dates::{format_due_relative, to_input},
    error::ValidationError,
    fields::{format_priority, format_status, Status},
    orchestrator::{Command, Context, Executor, Orchestrator, SubmitState},
    render::{priority_badge, status_badge, truncate, BoardView},
    tui::{
        colors::{notice_color, tone_color, DARK_PURPLE, DARK_RED, GOLD},
        enums::AppState,
        modal::DeleteGate,
        notify::NoticeKind,
        task_form::{
            FormMode, DESCRIPTION_FIELD, DUE_FIELD, PRIORITY_FIELD, STATUS_FIELD, TITLE_FIELD,
        },
        utils::{centered_rect, contains},
    },
};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
/// Most notices shown at once; older ones stay queued until they expire.
const MAX_NOTICE_LINES: usize = 3;

/// Main application state for the terminal user interface.
pub struct App<E: Executor> {
    state: AppState,
    ctx: Context,
    orchestrator: Orchestrator<E>,
    api_url: String,
    task_list_state: TableState,
    selected_task: Option<u64>,
    /// Where the delete confirmation was last drawn, for click-outside.
    modal_area: Option<Rect>,
    spinner: usize,
}

impl<E: Executor> App<E> {
    /// Create the app and start the initial load and connectivity check.
    pub fn new(ctx: Context, orchestrator: Orchestrator<E>, api_url: String) -> Self {
        let mut app = App {
            state: AppState::TaskList,
            ctx,
            orchestrator,
            api_url,
            task_list_state: TableState::default(),
            selected_task: None,
            modal_area: None,
            spinner: 0,
        };
        app.command(Command::Refresh);
        app.command(Command::CheckHealth);
        app
    }

    fn command(&mut self, command: Command) {
        self.orchestrator.handle(&mut self.ctx, command);
    }

    /// Apply finished requests, expire notices and advance the spinner.
    pub fn tick(&mut self, now: Instant) {
        if self.orchestrator.pump(&mut self.ctx) > 0 {
            match self.ctx.submit {
                SubmitState::Saved { form_closed } => {
                    self.ctx.submit = SubmitState::Idle;
                    if form_closed && self.state == AppState::TaskForm {
                        self.state = AppState::TaskList;
                    }
                }
                SubmitState::Failed => self.ctx.submit = SubmitState::Idle,
                SubmitState::Idle | SubmitState::Saving => {}
            }
        }
        self.ctx.notices.expire(now);
        self.sync_selection();
        self.spinner = self.spinner.wrapping_add(1);
    }

    /// Ids of the rows currently on screen, in order.
    fn visible_ids(&self) -> Vec<u64> {
        if self.ctx.is_refreshing() {
            return Vec::new();
        }
        self.ctx.store.derive_view().iter().map(|t| t.id).collect()
    }

    /// Keep the highlighted row on the same task across reloads and filter changes.
    fn sync_selection(&mut self) {
        let ids = self.visible_ids();
        if ids.is_empty() {
            self.task_list_state.select(None);
            return;
        }
        let index = self
            .selected_task
            .and_then(|id| ids.iter().position(|&i| i == id))
            .unwrap_or_else(|| self.task_list_state.selected().unwrap_or(0).min(ids.len() - 1));
        self.task_list_state.select(Some(index));
        self.selected_task = Some(ids[index]);
    }

    fn move_selection(&mut self, delta: isize) {
        let ids = self.visible_ids();
        if ids.is_empty() {
            return;
        }
        let current = self.task_list_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, ids.len() as isize - 1) as usize;
        self.task_list_state.select(Some(next));
        self.selected_task = Some(ids[next]);
    }

    fn selected_id(&self) -> Option<u64> {
        let ids = self.visible_ids();
        self.task_list_state.selected().and_then(|i| ids.get(i).copied())
    }

    fn with_selected(&mut self, action: impl FnOnce(&mut Self, u64)) {
        match self.selected_id() {
            Some(id) => action(self, id),
            None => self.ctx.notices.notify("No task selected", NoticeKind::Info),
        }
    }

    fn open_editor(&mut self, id: u64) {
        self.command(Command::BeginEdit(id));
        if self.ctx.form.mode() == FormMode::Edit(id) {
            self.state = AppState::TaskForm;
        }
    }

    fn complete(&mut self, id: u64) {
        let done = self
            .ctx
            .store
            .get(id)
            .is_some_and(|t| t.is_completed || t.status == Status::Done);
        if done {
            self.ctx
                .notices
                .notify(format!("Task #{id} is already done"), NoticeKind::Info);
        } else {
            self.command(Command::Complete(id));
        }
    }

    /// Handle one terminal event. Returns true if the application should quit.
    pub fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                self.handle_key(key.code, key.modifiers)
            }
            Event::Mouse(mouse) => {
                self.handle_mouse(mouse);
                false
            }
            _ => false,
        }
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        if self.ctx.gate.is_open() {
            self.handle_confirm_input(key);
            return false;
        }
        if self.ctx.detail.is_some() {
            self.handle_detail_input(key);
            return false;
        }
        match self.state {
            AppState::TaskList => self.handle_task_list_input(key),
            AppState::TaskForm => {
                self.handle_form_input(key);
                false
            }
            AppState::Help => {
                self.handle_help_input(key);
                false
            }
        }
    }

    fn handle_task_list_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Home | KeyCode::Char('g') => self.move_selection(isize::MIN / 2),
            KeyCode::End | KeyCode::Char('G') => self.move_selection(isize::MAX / 2),
            KeyCode::Char('n') | KeyCode::Char('a') => {
                if self.ctx.form.mode() != FormMode::Create {
                    self.command(Command::CancelEdit);
                }
                self.state = AppState::TaskForm;
            }
            KeyCode::Char('e') => self.with_selected(Self::open_editor),
            KeyCode::Char('c') => self.with_selected(Self::complete),
            KeyCode::Char('d') => {
                self.with_selected(|app, id| app.command(Command::RequestDelete(id)))
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.with_selected(|app, id| app.command(Command::ShowDetails(id)))
            }
            KeyCode::Char('r') => self.command(Command::Refresh),
            KeyCode::Char('s') | KeyCode::Char('S') => {
                let next = self.ctx.store.status_filter().cycle(key == KeyCode::Char('s'));
                self.command(Command::SetStatusFilter(next));
            }
            KeyCode::Char('p') | KeyCode::Char('P') => {
                let next = self.ctx.store.priority_filter().cycle(key == KeyCode::Char('p'));
                self.command(Command::SetPriorityFilter(next));
            }
            KeyCode::Char('H') => self.command(Command::CheckHealth),
            KeyCode::Char('h') | KeyCode::Char('?') | KeyCode::F(1) => self.state = AppState::Help,
            _ => {}
        }
        self.sync_selection();
        false
    }

    fn handle_form_input(&mut self, key: KeyCode) {
        let form = &mut self.ctx.form;
        match key {
            KeyCode::Esc => {
                if form.mode() != FormMode::Create {
                    self.command(Command::CancelEdit);
                }
                self.state = AppState::TaskList;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Left => form.handle_left_right(false),
            KeyCode::Right => form.handle_left_right(true),
            KeyCode::Home => form.handle_home(),
            KeyCode::End => form.handle_end(),
            KeyCode::Backspace => form.handle_backspace(),
            KeyCode::Delete => form.handle_delete(),
            KeyCode::Enter => self.command(Command::Submit),
            KeyCode::Char(' ') if !form.is_text_field() => form.handle_left_right(true),
            KeyCode::Char(c) => form.handle_char(c),
            _ => {}
        }
    }

    fn handle_confirm_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.command(Command::ConfirmDelete)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.command(Command::CancelDelete)
            }
            _ => {}
        }
    }

    fn handle_detail_input(&mut self, key: KeyCode) {
        let Some(id) = self.ctx.detail.as_ref().map(|t| t.id) else {
            return;
        };
        match key {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => self.command(Command::CloseDetails),
            KeyCode::Char('e') => {
                self.command(Command::CloseDetails);
                self.open_editor(id);
            }
            KeyCode::Char('c') => self.complete(id),
            KeyCode::Char('d') => {
                self.command(Command::CloseDetails);
                self.command(Command::RequestDelete(id));
            }
            _ => {}
        }
    }

    fn handle_help_input(&mut self, key: KeyCode) {
        if matches!(key, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h')) {
            self.state = AppState::TaskList;
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if !matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
            return;
        }
        if let (true, Some(area)) = (self.ctx.gate.is_open(), self.modal_area) {
            if !contains(area, mouse.column, mouse.row) {
                self.command(Command::CancelDelete);
            }
        }
    }

    /// Poll for and handle terminal events.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            return Ok(self.handle_event(event::read()?));
        }
        Ok(false)
    }

    /// Render the header with the service address and active filters.
    fn render_header(&self, f: &mut Frame, area: Rect, view: &BoardView) {
        let context_display = format!(
            "Service: {}  Status: {}  Priority: {}",
            self.api_url, view.status_filter, view.priority_filter
        );
        let header_text = vec![Line::from(vec![
            Span::styled("TASKFLOW", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                context_display,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ])];

        let header_block = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header_block, area);
    }

    /// Render the task table, or the placeholder when there is nothing to list.
    fn render_task_list(&mut self, f: &mut Frame, area: Rect, view: &BoardView) {
        let title = format!(
            "Tasks ({} shown, {} loaded, {} on server) - Press 'h' for help",
            view.rows.len(),
            view.loaded,
            view.total
        );

        if let Some(placeholder) = view.placeholder {
            let message = Paragraph::new(vec![Line::from(""), Line::from(placeholder.message())])
                .block(Block::default().borders(Borders::ALL).title(title))
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray));
            f.render_widget(message, area);
            return;
        }

        let header_cells = ["ID", "Status", "Priority", "Due", "Title"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells)
            .style(Style::default().bg(GOLD).fg(Color::Rgb(20, 20, 20)))
            .height(1);

        let title_width = area.width.saturating_sub(4 + 13 + 10 + 18 + 10) as usize;
        let rows: Vec<Row> = view
            .rows
            .iter()
            .map(|row| {
                let due_cell = match &row.due {
                    Some(due) => {
                        let style = if due.overdue {
                            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
                        } else {
                            Style::default()
                        };
                        Cell::from(Span::styled(format!("{} ({})", due.relative, due.local.get(5..).unwrap_or(&due.local)), style))
                    }
                    None => Cell::from("-"),
                };

                let mut title_spans = vec![Span::raw(row.title.clone())];
                if let Some(description) = &row.description {
                    let room = title_width.saturating_sub(row.title.chars().count() + 3);
                    if room > 3 {
                        title_spans.push(Span::styled(
                            format!(" - {}", truncate(description, room)),
                            Style::default().fg(Color::DarkGray),
                        ));
                    }
                }

                let style = if row.completed {
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
                } else {
                    Style::default().fg(Color::White)
                };

                Row::new(vec![
                    Cell::from(row.id.to_string()),
                    Cell::from(Span::styled(
                        row.status.label,
                        Style::default().fg(tone_color(row.status.tone)),
                    )),
                    Cell::from(Span::styled(
                        row.priority.label,
                        Style::default().fg(tone_color(row.priority.tone)),
                    )),
                    due_cell,
                    Cell::from(Line::from(title_spans)),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(5),  // ID
            Constraint::Length(12), // Status
            Constraint::Length(9),  // Priority
            Constraint::Length(22), // Due
            Constraint::Min(20),    // Title
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut self.task_list_state);
    }

    /// Render the create/edit form with one box per field.
    fn render_task_form(&self, f: &mut Frame, area: Rect) {
        let form = &self.ctx.form;
        let editing = matches!(form.mode(), FormMode::Edit(_));
        let saving = self.ctx.submit == SubmitState::Saving;

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        let mut constraints = vec![
            Constraint::Length(3), // Title
            Constraint::Length(3), // Description
            Constraint::Length(3), // Priority
        ];
        if editing {
            constraints.push(Constraint::Length(3)); // Status
        }
        constraints.push(Constraint::Length(3)); // Due
        constraints.push(Constraint::Min(0));

        let heading = match form.mode() {
            FormMode::Create => "New Task".to_string(),
            FormMode::Edit(id) => format!("Edit Task #{id}"),
        };
        let outer = Block::default()
            .borders(Borders::ALL)
            .title(if saving { format!("{heading} (saving...)") } else { heading });
        let inner = outer.inner(main_chunks[0]);
        f.render_widget(outer, main_chunks[0]);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        let field_block = |field: usize, label: &str| {
            let (style, title) = if form.invalid_field == Some(field) {
                let reason = match field {
                    DUE_FIELD => ValidationError::InvalidDue,
                    _ => ValidationError::EmptyTitle,
                };
                (Style::default().fg(Color::Red), format!("{label} - {reason}"))
            } else if form.current_field == field {
                (Style::default().fg(GOLD), label.to_string())
            } else {
                (Style::default(), label.to_string())
            };
            Block::default().borders(Borders::ALL).title(title).border_style(style)
        };

        let mut slot = 0;
        let mut cursor_field = None;

        f.render_widget(
            Paragraph::new(form.title.value.as_str()).block(field_block(TITLE_FIELD, "Title *")),
            chunks[slot],
        );
        if form.current_field == TITLE_FIELD {
            cursor_field = Some((chunks[slot], form.title.cursor));
        }
        slot += 1;

        f.render_widget(
            Paragraph::new(form.description.value.as_str())
                .block(field_block(DESCRIPTION_FIELD, "Description")),
            chunks[slot],
        );
        if form.current_field == DESCRIPTION_FIELD {
            cursor_field = Some((chunks[slot], form.description.cursor));
        }
        slot += 1;

        let priority = form
            .selected_priority()
            .map(format_priority)
            .unwrap_or("(unchanged)");
        f.render_widget(
            Paragraph::new(format!("< {priority} >")).block(field_block(PRIORITY_FIELD, "Priority")),
            chunks[slot],
        );
        slot += 1;

        if editing {
            let status = form.selected_status().map(format_status).unwrap_or("(unchanged)");
            f.render_widget(
                Paragraph::new(format!("< {status} >")).block(field_block(STATUS_FIELD, "Status")),
                chunks[slot],
            );
            slot += 1;
        }

        f.render_widget(
            Paragraph::new(form.due.value.as_str())
                .block(field_block(DUE_FIELD, "Due (YYYY-MM-DD HH:MM, local)")),
            chunks[slot],
        );
        if form.current_field == DUE_FIELD {
            cursor_field = Some((chunks[slot], form.due.cursor));
        }

        let instructions = vec![
            Line::from(Span::styled("Keys", Style::default().add_modifier(Modifier::BOLD))),
            Line::from("  Tab/Down     Next field"),
            Line::from("  Shift+Tab/Up Previous field"),
            Line::from("  Left/Right   Move cursor or change selector"),
            Line::from("  Enter        Save"),
            Line::from(if editing { "  Esc          Cancel edit" } else { "  Esc          Back to list" }),
            Line::from(""),
            Line::from(Span::styled("Due dates", Style::default().add_modifier(Modifier::BOLD))),
            Line::from("  2025-12-31 17:00"),
            Line::from("  2025-12-31 (end of day)"),
            Line::from("  today, tomorrow, friday"),
            Line::from("  in 3d, in 2w, next monday"),
            Line::from("  leave empty for no due date"),
        ];
        f.render_widget(
            Paragraph::new(instructions)
                .block(Block::default().borders(Borders::ALL).title("Help"))
                .wrap(Wrap { trim: false }),
            main_chunks[1],
        );

        if let Some((chunk, cursor)) = cursor_field {
            f.set_cursor_position(field_cursor(chunk, cursor));
        }
    }

    /// Render the help screen with keyboard shortcuts.
    fn render_help(&self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(Span::styled("TaskFlow Help", bold)),
            Line::from(""),
            Line::from(Span::styled("Task List:", bold)),
            Line::from("  Up/k, Down/j  Move selection"),
            Line::from("  Enter/Space   View task details"),
            Line::from("  n             New task"),
            Line::from("  e             Edit selected task"),
            Line::from("  c             Mark selected task completed"),
            Line::from("  d             Delete selected task"),
            Line::from("  s / S         Cycle status filter"),
            Line::from("  p / P         Cycle priority filter"),
            Line::from("  r             Reload from the service"),
            Line::from("  H             Check the service connection"),
            Line::from("  h/F1          Show this help"),
            Line::from("  q/Esc/Ctrl+C  Quit"),
            Line::from(""),
            Line::from(Span::styled("Task Details:", bold)),
            Line::from("  e / c / d     Edit, complete, delete"),
            Line::from("  Esc/q         Close"),
            Line::from(""),
            Line::from(Span::styled("Delete Confirmation:", bold)),
            Line::from("  y/Enter       Delete"),
            Line::from("  n/Esc/click outside  Keep the task"),
        ];

        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help - Press Esc to return"),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    /// Render the details overlay for the last fetched task.
    fn render_detail(&self, f: &mut Frame, area: Rect) {
        let Some(task) = &self.ctx.detail else {
            return;
        };
        let today = Local::now().date_naive();
        let label = Style::default().add_modifier(Modifier::BOLD);
        let status = status_badge(task.status);
        let priority = priority_badge(task.priority);
        let due = match task.due_date {
            Some(due) => format!(
                "{} ({})",
                to_input(due, &Local),
                format_due_relative(due.with_timezone(&Local).date_naive(), today)
            ),
            None => "-".to_string(),
        };

        let text = vec![
            Line::from(vec![Span::styled("Title:       ", label), Span::raw(task.title.clone())]),
            Line::from(vec![
                Span::styled("Status:      ", label),
                Span::styled(status.label, Style::default().fg(tone_color(status.tone))),
            ]),
            Line::from(vec![
                Span::styled("Priority:    ", label),
                Span::styled(priority.label, Style::default().fg(tone_color(priority.tone))),
            ]),
            Line::from(vec![
                Span::styled("Completed:   ", label),
                Span::raw(if task.is_completed { "yes" } else { "no" }),
            ]),
            Line::from(vec![Span::styled("Due:         ", label), Span::raw(due)]),
            Line::from(vec![
                Span::styled("Created:     ", label),
                Span::raw(to_input(task.created_at, &Local)),
            ]),
            Line::from(vec![
                Span::styled("Updated:     ", label),
                Span::raw(to_input(task.updated_at, &Local)),
            ]),
            Line::from(""),
            Line::from(Span::styled("Description:", label)),
            Line::from(task.description.clone().unwrap_or_else(|| "-".to_string())),
        ];

        let area = centered_rect(70, 70, area);
        f.render_widget(Clear, area);
        let paragraph = Paragraph::new(text)
            .block(
                Block::default()
                    .title(format!("Task Details #{} - e edit, c complete, d delete, Esc close", task.id))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(DARK_PURPLE)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    /// Render the delete confirmation over the board.
    fn render_confirm(&mut self, f: &mut Frame, area: Rect) {
        let Some(id) = self.ctx.gate.target() else {
            self.modal_area = None;
            return;
        };
        let block = Block::default()
            .title("Confirm Delete")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));

        let area = centered_rect(50, 30, area);
        f.render_widget(Clear, area);
        self.modal_area = Some(area);

        let title = self
            .ctx
            .store
            .get(id)
            .map(|t| t.title.clone())
            .unwrap_or_default();
        let prompt = match self.ctx.gate {
            DeleteGate::Deleting(_) => "Deleting...",
            _ => "Press 'y' to confirm, 'n' to cancel",
        };
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("Delete task #{id}?"),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(title),
            Line::from(""),
            Line::from("This action cannot be undone."),
            Line::from(""),
            Line::from(prompt),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    /// Render the newest notices, one per line.
    fn render_notices(&self, f: &mut Frame, area: Rect) {
        let visible = self.ctx.notices.visible();
        let lines: Vec<Line> = visible
            .iter()
            .skip(visible.len().saturating_sub(MAX_NOTICE_LINES))
            .map(|n| {
                Line::from(Span::styled(
                    format!(" {} ", n.message),
                    Style::default().bg(notice_color(n.kind)).fg(Color::White),
                ))
            })
            .collect();
        f.render_widget(Paragraph::new(lines), area);
    }

    /// Render the status bar at the bottom of the screen.
    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let busy = if self.ctx.is_busy() {
            format!(
                "{} Working ({} pending) | ",
                SPINNER[self.spinner % SPINNER.len()],
                self.ctx.in_flight()
            )
        } else {
            String::new()
        };
        let hint = match self.state {
            AppState::TaskList if self.ctx.gate.is_open() => "Confirm delete: y / n",
            AppState::TaskList => "n new  e edit  c complete  d delete  r reload  s/p filter  h help  q quit",
            AppState::TaskForm => "Enter save  Esc back  Tab next field",
            AppState::Help => "Help",
        };
        let status = Paragraph::new(format!("{busy}{hint}"))
            .style(Style::default().bg(GOLD).fg(Color::Rgb(20, 20, 20)))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to the view renderers.
    fn render(&mut self, f: &mut Frame) {
        let notice_lines = self.ctx.notices.visible().len().min(MAX_NOTICE_LINES) as u16;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(notice_lines),
                Constraint::Length(1),
            ])
            .split(f.area());

        let view = self.ctx.view(&Local::now());
        self.render_header(f, chunks[0], &view);
        match self.state {
            AppState::TaskList => self.render_task_list(f, chunks[1], &view),
            AppState::TaskForm => self.render_task_form(f, chunks[1]),
            AppState::Help => self.render_help(f, chunks[1]),
        }
        self.render_detail(f, chunks[1]);
        self.render_confirm(f, chunks[1]);
        self.render_notices(f, chunks[2]);
        self.render_status_bar(f, chunks[3]);
    }

    /// Main event loop for the TUI application.
    ///
    /// Applies finished requests, redraws and processes input until the user exits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.tick(Instant::now());
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

/// Terminal cell for a text cursor inside a bordered field box.
///
/// Long input is not scrolled, so the cursor stops at the last inner column.
fn field_cursor(chunk: Rect, cursor: usize) -> (u16, u16) {
    let inner = chunk.width.saturating_sub(2);
    let offset = u16::try_from(cursor).unwrap_or(u16::MAX).min(inner.saturating_sub(1));
    (chunk.x.saturating_add(1).saturating_add(offset), chunk.y.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crossterm::event::KeyEvent;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::fields::{Filter, Priority};
    use crate::store::TaskStore;
    use crate::testing::{task, Call, FakeService, InlineExecutor, ManualExecutor};

    fn app_with(tasks: Vec<crate::task::Task>) -> (Arc<FakeService>, App<InlineExecutor>) {
        let service = Arc::new(FakeService::with_tasks(tasks));
        let ctx = Context::new(TaskStore::new(100), Duration::from_secs(3));
        let orchestrator = Orchestrator::new(InlineExecutor(Arc::clone(&service)));
        let mut app = App::new(ctx, orchestrator, "http://tasks.test".to_string());
        app.tick(Instant::now());
        (service, app)
    }

    fn board() -> Vec<crate::task::Task> {
        vec![
            task(5, "Write report", Status::Todo, Priority::High),
            task(1, "Water plants", Status::InProgress, Priority::Low),
        ]
    }

    fn press<E: Executor>(app: &mut App<E>, code: KeyCode) -> bool {
        app.handle_event(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn type_text<E: Executor>(app: &mut App<E>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn draw(app: &mut App<InlineExecutor>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut screen = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                screen.push_str(buffer[(x, y)].symbol());
            }
            screen.push('\n');
        }
        screen
    }

    #[test]
    fn initial_load_lists_tasks() {
        let (_service, mut app) = app_with(board());
        let screen = draw(&mut app);
        assert!(screen.contains("Write report"));
        assert!(screen.contains("Water plants"));
        assert!(screen.contains("Status: all"));
        assert!(screen.contains("Connected to TaskFlow service"));
        assert_eq!(app.selected_id(), Some(5));
    }

    #[test]
    fn empty_board_shows_placeholder() {
        let (_service, mut app) = app_with(Vec::new());
        assert!(draw(&mut app).contains("No tasks yet"));
    }

    #[test]
    fn delete_cancelled_by_key_sends_nothing() {
        let (service, mut app) = app_with(board());
        press(&mut app, KeyCode::Char('d'));
        assert!(draw(&mut app).contains("Delete task #5?"));

        press(&mut app, KeyCode::Char('n'));
        app.tick(Instant::now());
        assert_eq!(app.ctx.gate, DeleteGate::Idle);
        assert!(!service.calls().iter().any(|c| matches!(c, Call::Delete(_))));
    }

    #[test]
    fn escape_cancels_confirmation_without_quitting() {
        let (service, mut app) = app_with(board());
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.ctx.gate, DeleteGate::Confirming(5));

        assert!(!press(&mut app, KeyCode::Esc));
        assert_eq!(app.ctx.gate, DeleteGate::Idle);
        assert!(!draw(&mut app).contains("Delete task #5?"));
        assert!(!service.calls().iter().any(|c| matches!(c, Call::Delete(_))));
    }

    #[test]
    fn click_outside_confirmation_cancels() {
        let (service, mut app) = app_with(board());
        press(&mut app, KeyCode::Char('d'));
        draw(&mut app);

        app.handle_event(Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        }));
        assert_eq!(app.ctx.gate, DeleteGate::Idle);
        assert!(!service.calls().iter().any(|c| matches!(c, Call::Delete(_))));
    }

    #[test]
    fn confirmed_delete_removes_selected_task() {
        let (service, mut app) = app_with(board());
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('d'));
        // List keys are swallowed while the confirmation is open.
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Char('y'));
        app.tick(Instant::now());

        assert!(service.calls().contains(&Call::Delete(1)));
        assert!(app.ctx.store.get(1).is_none());
        assert_eq!(app.ctx.gate, DeleteGate::Idle);
        assert!(draw(&mut app).contains("Task deleted"));
    }

    #[test]
    fn new_task_form_creates_and_returns_to_list() {
        let (_service, mut app) = app_with(Vec::new());
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.state, AppState::TaskForm);
        assert!(draw(&mut app).contains("New Task"));

        type_text(&mut app, "Buy milk");
        press(&mut app, KeyCode::Enter);
        app.tick(Instant::now());

        assert_eq!(app.state, AppState::TaskList);
        let screen = draw(&mut app);
        assert!(screen.contains("Buy milk"));
        assert!(screen.contains("Task created"));
        assert!(app.ctx.form.title.value.is_empty());
    }

    #[test]
    fn late_create_leaves_a_newer_edit_open() {
        let service = Arc::new(FakeService::with_tasks(board()));
        let ctx = Context::new(TaskStore::new(100), Duration::from_secs(3));
        let orchestrator = Orchestrator::new(ManualExecutor::new(Arc::clone(&service)));
        let mut app = App::new(ctx, orchestrator, "http://tasks.test".to_string());
        app.orchestrator.executor().run_all();
        app.tick(Instant::now());

        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "New");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.orchestrator.executor().pending(), 1);
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "X");
        assert_eq!(app.ctx.form.mode(), FormMode::Edit(5));

        app.orchestrator.executor().run(0);
        app.tick(Instant::now());
        assert_eq!(app.state, AppState::TaskForm);
        assert_eq!(app.ctx.form.mode(), FormMode::Edit(5));
        assert_eq!(app.ctx.form.title.value, "Write reportX");
        assert_eq!(app.ctx.submit, SubmitState::Idle);

        app.orchestrator.executor().run_all();
        app.tick(Instant::now());
        assert_eq!(app.state, AppState::TaskForm);
        assert!(app.ctx.store.tasks().iter().any(|t| t.title == "New"));
    }

    #[test]
    fn cursor_stays_inside_the_field_box() {
        let chunk = Rect::new(2, 4, 10, 3);
        assert_eq!(field_cursor(chunk, 0), (3, 5));
        assert_eq!(field_cursor(chunk, 5), (8, 5));
        assert_eq!(field_cursor(chunk, 500), (10, 5));
        assert_eq!(field_cursor(chunk, usize::MAX), (10, 5));
    }

    #[test]
    fn empty_title_keeps_form_open() {
        let (service, mut app) = app_with(Vec::new());
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Enter);
        app.tick(Instant::now());

        assert_eq!(app.state, AppState::TaskForm);
        assert!(draw(&mut app).contains("Title is required"));
        assert!(!service.calls().iter().any(|c| matches!(c, Call::Create(_))));
    }

    #[test]
    fn edit_prefills_and_escape_cancels() {
        let (_service, mut app) = app_with(board());
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.state, AppState::TaskForm);
        assert_eq!(app.ctx.form.title.value, "Write report");
        assert!(draw(&mut app).contains("Edit Task #5"));

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::TaskList);
        assert_eq!(app.ctx.form.mode(), FormMode::Create);
    }

    #[test]
    fn filter_keys_cycle_without_fetching() {
        let (service, mut app) = app_with(board());
        let before = service.calls().len();
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.ctx.store.status_filter(), Filter::Only(Status::Todo));
        assert_eq!(app.ctx.store.priority_filter(), Filter::Only(Priority::Low));
        assert_eq!(service.calls().len(), before);

        let screen = draw(&mut app);
        assert!(screen.contains("Status: todo"));
        assert!(screen.contains("No tasks match the current filters."));
    }

    #[test]
    fn details_overlay_opens_and_closes() {
        let (_service, mut app) = app_with(board());
        press(&mut app, KeyCode::Enter);
        app.tick(Instant::now());
        assert!(draw(&mut app).contains("Task Details #5"));

        press(&mut app, KeyCode::Esc);
        assert!(app.ctx.detail.is_none());
    }

    #[test]
    fn complete_key_marks_task_done() {
        let (service, mut app) = app_with(board());
        press(&mut app, KeyCode::Char('c'));
        app.tick(Instant::now());
        assert!(service.calls().contains(&Call::Complete(5)));
        assert_eq!(app.ctx.store.get(5).map(|t| t.status), Some(Status::Done));
    }

    #[test]
    fn help_and_quit() {
        let (_service, mut app) = app_with(board());
        press(&mut app, KeyCode::Char('h'));
        assert!(draw(&mut app).contains("TaskFlow Help"));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::TaskList);
        assert!(press(&mut app, KeyCode::Char('q')));
    }
}
