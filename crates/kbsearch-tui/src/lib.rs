// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use kbsearch_app::{
    AppMode, CancelToken, ChunkSource, ColumnDescriptor, ColumnWidths, PageCommand, PageEvent,
    Preferences, Row as ResultRow, SearchPage, SearchRequest, SearchVariant, SummaryRequest,
    SummarySession, SummaryUpdate,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const WIDTH_STEP: i16 = 4;
const MAX_ROW_LINES: usize = 8;
const CHECKBOX_WIDTH: u16 = 3;
const INPUT_CURSOR: char = '|';

pub trait AppRuntime {
    fn search(&mut self, request: &SearchRequest) -> Result<Vec<ResultRow>>;
    fn open_summary(&mut self, request: &SummaryRequest) -> Result<Box<dyn ChunkSource + Send>>;
    fn save_preferences(&mut self, preferences: &Preferences) -> Result<()>;
    fn save_column_widths(&mut self, widths: &ColumnWidths) -> Result<()>;

    fn spawn_search(
        &mut self,
        request_id: u64,
        request: SearchRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self
            .search(&request)
            .map_err(|error| format!("{error:#}"));
        tx.send(InternalEvent::Search { request_id, result })
            .map_err(|_| anyhow!("search event channel closed"))?;
        Ok(())
    }

    fn spawn_summary(
        &mut self,
        request_id: u64,
        request: SummaryRequest,
        cancel: CancelToken,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        match self.open_summary(&request) {
            Ok(source) => {
                stream_summary(source, request, &cancel, request_id, &tx);
                Ok(())
            }
            Err(error) => {
                tracing::warn!(error = %format!("{error:#}"), "summary request failed");
                tx.send(InternalEvent::Summary {
                    request_id,
                    update: SummaryUpdate::Failed(format!("{error:#}")),
                })
                .map_err(|_| anyhow!("summary event channel closed"))?;
                Ok(())
            }
        }
    }
}

/// Drives one summary session to completion, forwarding every update.
pub fn stream_summary<S: ChunkSource>(
    mut source: S,
    request: SummaryRequest,
    cancel: &CancelToken,
    request_id: u64,
    tx: &Sender<InternalEvent>,
) {
    let mut session = SummarySession::new(request);
    session.run(&mut source, cancel, |update| {
        let _ = tx.send(InternalEvent::Summary { request_id, update });
    });
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    Search {
        request_id: u64,
        result: std::result::Result<Vec<ResultRow>, String>,
    },
    Summary {
        request_id: u64,
        update: SummaryUpdate,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PreferencesDraft {
    preferences: Preferences,
    cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    cursor_row: usize,
    cursor_col: usize,
    help_visible: bool,
    preferences_draft: Option<PreferencesDraft>,
    search_in_flight: Option<u64>,
    summary_in_flight: Option<u64>,
    next_request_id: u64,
    status_token: u64,
}

pub fn run_app<R: AppRuntime>(page: &mut SearchPage, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    let mut result = Ok(());
    loop {
        process_internal_events(page, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, page, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(page, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    page: &mut SearchPage,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                page.dispatch(PageCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Search { request_id, result } => {
                if view_data.search_in_flight != Some(request_id) {
                    tracing::debug!(request_id, "dropping stale search result");
                    continue;
                }
                view_data.search_in_flight = None;
                let events = page.finish_search(result.map_err(anyhow::Error::msg));
                view_data.cursor_row = 0;
                clamp_cursor(page, view_data);
                track_status(view_data, tx, &events);
            }
            InternalEvent::Summary { request_id, update } => {
                if view_data.summary_in_flight != Some(request_id) {
                    tracing::debug!(request_id, "dropping stale summary update");
                    continue;
                }
                if update.is_terminal() {
                    view_data.summary_in_flight = None;
                }
                let events = page.apply_summary_update(update);
                track_status(view_data, tx, &events);
            }
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn track_status(view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>, events: &[PageEvent]) {
    if events
        .iter()
        .any(|event| matches!(event, PageEvent::StatusUpdated(_)))
    {
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(internal_tx, view_data.status_token);
    }
}

fn dispatch(
    page: &mut SearchPage,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: PageCommand,
) -> Vec<PageEvent> {
    let events = page.dispatch(command);
    track_status(view_data, internal_tx, &events);
    events
}

fn emit_status(
    page: &mut SearchPage,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    dispatch(
        page,
        view_data,
        internal_tx,
        PageCommand::SetStatus(message.into()),
    );
}

fn persist_events<R: AppRuntime>(
    page: &mut SearchPage,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    events: &[PageEvent],
) {
    for event in events {
        let result = match event {
            PageEvent::PreferencesChanged(preferences) => runtime.save_preferences(preferences),
            PageEvent::ColumnWidthsChanged(widths) => runtime.save_column_widths(widths),
            _ => continue,
        };
        if let Err(error) = result {
            tracing::warn!(error = %format!("{error:#}"), "saving table settings failed");
            emit_status(
                page,
                view_data,
                internal_tx,
                format!("save failed: {error:#}"),
            );
        }
    }
}

fn next_request_id(view_data: &mut ViewData) -> u64 {
    view_data.next_request_id = view_data.next_request_id.saturating_add(1);
    view_data.next_request_id
}

fn clamp_cursor(page: &SearchPage, view_data: &mut ViewData) {
    let rows = page.collection.page_items().len();
    view_data.cursor_row = view_data.cursor_row.min(rows.saturating_sub(1));
    let columns = page.visible_columns().len();
    view_data.cursor_col = view_data.cursor_col.min(columns.saturating_sub(1));
}

fn handle_key_event<R: AppRuntime>(
    page: &mut SearchPage,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        stop_summary(page, view_data, internal_tx);
        return false;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
            emit_status(page, view_data, internal_tx, "help hidden");
        }
        return false;
    }

    if view_data.preferences_draft.is_some() {
        handle_preferences_key(page, runtime, view_data, internal_tx, key);
        return false;
    }

    match page.mode {
        AppMode::EditQuery | AppMode::EditProcessNumber | AppMode::EditFilter => {
            handle_input_key(page, runtime, view_data, internal_tx, key);
            false
        }
        AppMode::Nav | AppMode::Preferences => {
            handle_nav_key(page, runtime, view_data, internal_tx, key)
        }
    }
}

fn handle_nav_key<R: AppRuntime>(
    page: &mut SearchPage,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => {
            view_data.help_visible = true;
            emit_status(page, view_data, internal_tx, "help open");
        }
        KeyCode::Char('s') | KeyCode::Char('/') => {
            dispatch(
                page,
                view_data,
                internal_tx,
                PageCommand::EnterMode(AppMode::EditQuery),
            );
        }
        KeyCode::Char('p') => {
            if page.config.variant.requires_process_number() {
                dispatch(
                    page,
                    view_data,
                    internal_tx,
                    PageCommand::EnterMode(AppMode::EditProcessNumber),
                );
            } else {
                emit_status(page, view_data, internal_tx, "process number not used");
            }
        }
        KeyCode::Char('f') => {
            dispatch(
                page,
                view_data,
                internal_tx,
                PageCommand::EnterMode(AppMode::EditFilter),
            );
        }
        KeyCode::Enter => submit_search(page, runtime, view_data, internal_tx),
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.cursor_row = view_data.cursor_row.saturating_add(1);
            clamp_cursor(page, view_data);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.cursor_row = view_data.cursor_row.saturating_sub(1);
        }
        KeyCode::Char('l') | KeyCode::Right => {
            view_data.cursor_col = view_data.cursor_col.saturating_add(1);
            clamp_cursor(page, view_data);
        }
        KeyCode::Char('h') | KeyCode::Left => {
            view_data.cursor_col = view_data.cursor_col.saturating_sub(1);
        }
        KeyCode::Char(' ') => {
            let current = page
                .collection
                .page_items()
                .get(view_data.cursor_row)
                .map(|row| row.id().clone());
            if let Some(id) = current {
                dispatch(page, view_data, internal_tx, PageCommand::ToggleSelection(id));
            }
        }
        KeyCode::Char('a') => {
            let filtered = page.collection.filtered_count();
            let command = if filtered > 0 && page.collection.selected_count() >= filtered {
                PageCommand::ClearSelection
            } else {
                PageCommand::SelectAllFiltered
            };
            dispatch(page, view_data, internal_tx, command);
        }
        KeyCode::Char('o') => {
            let column = page
                .visible_columns()
                .get(view_data.cursor_col)
                .map(|column| column.descriptor.id.to_owned());
            match column {
                Some(column) => {
                    dispatch(page, view_data, internal_tx, PageCommand::SortBy(column));
                    view_data.cursor_row = 0;
                }
                None => emit_status(page, view_data, internal_tx, "sort unavailable"),
            }
        }
        KeyCode::Char('n') | KeyCode::PageDown => {
            if !dispatch(page, view_data, internal_tx, PageCommand::NextPage).is_empty() {
                view_data.cursor_row = 0;
            }
        }
        KeyCode::Char('N') | KeyCode::PageUp => {
            if !dispatch(page, view_data, internal_tx, PageCommand::PrevPage).is_empty() {
                view_data.cursor_row = 0;
            }
        }
        KeyCode::Char('i') => start_summary(page, runtime, view_data, internal_tx),
        KeyCode::Char('x') => stop_summary(page, view_data, internal_tx),
        KeyCode::Char('d') => {
            dispatch(page, view_data, internal_tx, PageCommand::DismissSummary);
        }
        KeyCode::Char('c') => {
            if page.collection.is_filtering() {
                dispatch(page, view_data, internal_tx, PageCommand::ClearFilter);
                clamp_cursor(page, view_data);
            }
        }
        KeyCode::Char(',') => {
            view_data.preferences_draft = Some(PreferencesDraft {
                preferences: page.preferences.clone(),
                cursor: 0,
            });
            dispatch(
                page,
                view_data,
                internal_tx,
                PageCommand::EnterMode(AppMode::Preferences),
            );
        }
        KeyCode::Char('<') | KeyCode::Char('>') => {
            let delta = if key.code == KeyCode::Char('>') {
                WIDTH_STEP
            } else {
                -WIDTH_STEP
            };
            let column = page
                .visible_columns()
                .get(view_data.cursor_col)
                .map(|column| column.descriptor.id.to_owned());
            if let Some(column) = column {
                let events = dispatch(
                    page,
                    view_data,
                    internal_tx,
                    PageCommand::ResizeColumn { column, delta },
                );
                persist_events(page, runtime, view_data, internal_tx, &events);
            }
        }
        _ => {}
    }
    false
}

fn handle_input_key<R: AppRuntime>(
    page: &mut SearchPage,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            dispatch(page, view_data, internal_tx, PageCommand::ExitToNav);
        }
        KeyCode::Enter => {
            let mode = page.mode;
            dispatch(page, view_data, internal_tx, PageCommand::ExitToNav);
            if mode != AppMode::EditFilter {
                submit_search(page, runtime, view_data, internal_tx);
            }
        }
        KeyCode::Backspace => {
            let mut text = current_input(page).to_owned();
            text.pop();
            set_input(page, view_data, internal_tx, text);
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let mut text = current_input(page).to_owned();
            text.push(ch);
            set_input(page, view_data, internal_tx, text);
        }
        _ => {}
    }
}

fn current_input(page: &SearchPage) -> &str {
    match page.mode {
        AppMode::EditProcessNumber => &page.process_number_input,
        AppMode::EditFilter => page.collection.filter_text(),
        _ => &page.query_input,
    }
}

fn set_input(
    page: &mut SearchPage,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    text: String,
) {
    let command = match page.mode {
        AppMode::EditProcessNumber => PageCommand::SetProcessNumberInput(text),
        AppMode::EditFilter => PageCommand::SetFilter(text),
        _ => PageCommand::SetQueryInput(text),
    };
    dispatch(page, view_data, internal_tx, command);
    clamp_cursor(page, view_data);
}

fn submit_search<R: AppRuntime>(
    page: &mut SearchPage,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let request = match page.begin_search() {
        Ok(request) => request,
        Err(error) => {
            emit_status(page, view_data, internal_tx, error.message());
            return;
        }
    };

    view_data.cursor_row = 0;
    let request_id = next_request_id(view_data);
    view_data.search_in_flight = Some(request_id);
    tracing::info!(request_id, "search submitted");
    emit_status(page, view_data, internal_tx, "searching...");

    if let Err(error) = runtime.spawn_search(request_id, request, internal_tx.clone()) {
        view_data.search_in_flight = None;
        let events = page.finish_search(Err(error));
        track_status(view_data, internal_tx, &events);
    }
}

fn start_summary<R: AppRuntime>(
    page: &mut SearchPage,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if page.can_stop_summary() {
        emit_status(
            page,
            view_data,
            internal_tx,
            "summary already running; press x to stop",
        );
        return;
    }

    let (request, cancel) = match page.begin_summary() {
        Ok(started) => started,
        Err(error) => {
            emit_status(page, view_data, internal_tx, error.message());
            return;
        }
    };

    let request_id = next_request_id(view_data);
    view_data.summary_in_flight = Some(request_id);
    tracing::info!(request_id, answers = request.answers.len(), "summary requested");

    if let Err(error) = runtime.spawn_summary(request_id, request, cancel, internal_tx.clone()) {
        view_data.summary_in_flight = None;
        let events = page.apply_summary_update(SummaryUpdate::Failed(format!("{error:#}")));
        track_status(view_data, internal_tx, &events);
    }
}

fn stop_summary(
    page: &mut SearchPage,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if dispatch(page, view_data, internal_tx, PageCommand::StopSummary).is_empty() {
        emit_status(page, view_data, internal_tx, "no summary running");
    }
}

fn handle_preferences_key<R: AppRuntime>(
    page: &mut SearchPage,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let columns = page.columns();
    let item_count = preference_item_count(columns);

    match key.code {
        KeyCode::Esc => {
            view_data.preferences_draft = None;
            dispatch(page, view_data, internal_tx, PageCommand::ExitToNav);
            emit_status(page, view_data, internal_tx, "preferences unchanged");
        }
        KeyCode::Enter => {
            let Some(draft) = view_data.preferences_draft.take() else {
                return;
            };
            let events = dispatch(
                page,
                view_data,
                internal_tx,
                PageCommand::ApplyPreferences(draft.preferences),
            );
            dispatch(page, view_data, internal_tx, PageCommand::ExitToNav);
            view_data.cursor_row = 0;
            clamp_cursor(page, view_data);
            emit_status(page, view_data, internal_tx, "preferences saved");
            persist_events(page, runtime, view_data, internal_tx, &events);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if let Some(draft) = view_data.preferences_draft.as_mut() {
                draft.cursor = (draft.cursor + 1).min(item_count.saturating_sub(1));
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if let Some(draft) = view_data.preferences_draft.as_mut() {
                draft.cursor = draft.cursor.saturating_sub(1);
            }
        }
        KeyCode::Char(' ') => {
            if let Some(draft) = view_data.preferences_draft.as_mut() {
                toggle_preference_item(&mut draft.preferences, columns, draft.cursor);
            }
        }
        _ => {}
    }
}

fn preference_item_count(columns: &[ColumnDescriptor]) -> usize {
    2 + columns.len()
}

fn toggle_preference_item(preferences: &mut Preferences, columns: &[ColumnDescriptor], index: usize) {
    match index {
        0 => preferences.page_size = preferences.page_size.next(),
        1 => preferences.wrap_lines = !preferences.wrap_lines,
        _ => {
            if let Some(column) = columns.get(index - 2) {
                preferences.toggle_column(column.id);
            }
        }
    }
}

fn render(frame: &mut ratatui::Frame<'_>, page: &SearchPage, view_data: &ViewData) {
    let header_height = if page.config.variant == SearchVariant::Extended {
        4
    } else {
        3
    };
    let summary_visible = !page.summary.text.is_empty() || page.summary.loading;

    let mut constraints = vec![Constraint::Length(header_height), Constraint::Length(3)];
    if summary_visible {
        constraints.push(Constraint::Length(8));
    }
    constraints.push(Constraint::Min(3));
    constraints.push(Constraint::Length(1));
    constraints.push(Constraint::Length(3));

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    let mut title = "search".to_owned();
    if page.loading {
        title.push_str(" (loading)");
    }
    let form = Paragraph::new(search_form_text(page))
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(form, layout[0]);

    let filter_style = if page.mode == AppMode::EditFilter {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let filter = Paragraph::new(filter_bar_text(page))
        .style(filter_style)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(filter, layout[1]);

    let mut next = 2;
    if summary_visible {
        let mut title = "Analyze result".to_owned();
        if page.summary.loading {
            title.push_str(" (streaming, x stop)");
        }
        title.push_str(" | d dismiss");
        let alert = Paragraph::new(summary_panel_text(page))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Green)),
            );
        frame.render_widget(alert, layout[next]);
        next += 1;
    }

    render_table(frame, layout[next], page, view_data);

    let footer = Paragraph::new(pagination_text(page)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, layout[next + 1]);

    let status = Paragraph::new(status_text(page, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[next + 2]);

    if let Some(draft) = &view_data.preferences_draft {
        let area = centered_rect(50, 60, frame.area());
        frame.render_widget(Clear, area);
        let dialog = Paragraph::new(preferences_dialog_text(draft, page.columns()))
            .block(Block::default().title("preferences").borders(Borders::ALL));
        frame.render_widget(dialog, area);
    }

    if view_data.help_visible {
        let area = centered_rect(80, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, page: &SearchPage, view_data: &ViewData) {
    let block = Block::default().title(table_title(page)).borders(Borders::ALL);
    if let Some(message) = empty_state_text(page) {
        let empty = Paragraph::new(message).block(block);
        frame.render_widget(empty, area);
        return;
    }

    let columns = page.visible_columns();
    let wrap_lines = page.preferences.wrap_lines;
    let sort = page.collection.sort();

    let mut widths = vec![Constraint::Length(CHECKBOX_WIDTH)];
    widths.extend(columns.iter().map(|column| Constraint::Length(column.width)));

    let mut header_cells = vec![Cell::from("")];
    header_cells.extend(columns.iter().map(|column| {
        let mut label = column.descriptor.label.to_owned();
        if let Some(sort) = sort
            && sort.column == column.descriptor.id
        {
            label.push_str(if sort.descending { " ▼" } else { " ▲" });
        }
        Cell::from(label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));
    let header = Row::new(header_cells);

    let rows = page
        .collection
        .page_items()
        .into_iter()
        .enumerate()
        .map(|(row_index, row)| {
            let cursor_row = row_index == view_data.cursor_row;
            let checkbox = if page.collection.is_selected(row.id()) {
                "[x]"
            } else {
                "[ ]"
            };

            let mut height = 1;
            let mut cells = vec![Cell::from(checkbox)];
            for (column_index, column) in columns.iter().enumerate() {
                let lines = cell_lines(
                    &column.descriptor.render(row, wrap_lines),
                    column.width,
                    wrap_lines,
                );
                height = height.max(lines.len());

                let mut style = Style::default();
                if cursor_row {
                    style = style.bg(Color::DarkGray);
                }
                if cursor_row && column_index == view_data.cursor_col {
                    style = Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD);
                }
                cells.push(Cell::from(lines.join("\n")).style(style));
            }

            Row::new(cells).height(u16::try_from(height).unwrap_or(1))
        });

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(block);
    frame.render_widget(table, area);
}

fn search_form_text(page: &SearchPage) -> String {
    let mut text = format!(
        "Question: {}",
        with_cursor(&page.query_input, page.mode == AppMode::EditQuery)
    );
    if page.config.variant.requires_process_number() {
        text.push_str(&format!(
            "\nProcess No.: {}",
            with_cursor(
                &page.process_number_input,
                page.mode == AppMode::EditProcessNumber
            )
        ));
    }
    text
}

fn with_cursor(text: &str, editing: bool) -> String {
    if editing {
        format!("{text}{INPUT_CURSOR}")
    } else {
        text.to_owned()
    }
}

fn counter_text(count: usize) -> String {
    if count == 1 {
        "1 match".to_owned()
    } else {
        format!("{count} matches")
    }
}

fn filter_bar_text(page: &SearchPage) -> String {
    let filter = with_cursor(
        page.collection.filter_text(),
        page.mode == AppMode::EditFilter,
    );
    let mut text = format!("Filter: {filter}");
    if page.collection.is_filtering() {
        text.push_str(&format!(
            " | {}",
            counter_text(page.collection.filtered_count())
        ));
    }
    text.push_str(" | i Insight");
    if page.can_stop_summary() {
        text.push_str(" | x Stop");
    }
    text
}

fn summary_panel_text(page: &SearchPage) -> String {
    if page.summary.text.is_empty() && page.summary.loading {
        return "waiting for the first words...".to_owned();
    }
    page.summary.text.clone()
}

fn table_title(page: &SearchPage) -> String {
    format!(
        "{} ({}/{})",
        page.config.source_name,
        page.collection.selected_count(),
        page.collection.items().len()
    )
}

fn empty_state_text(page: &SearchPage) -> Option<String> {
    if page.collection.is_no_match() {
        return Some("No matches\nWe can't find a match.\npress c to clear filter".to_owned());
    }
    if page.collection.is_empty() {
        if page.loading {
            return Some("Loading resources".to_owned());
        }
        return Some("No resources\nNo resources to display.".to_owned());
    }
    None
}

fn pagination_text(page: &SearchPage) -> String {
    let collection = &page.collection;
    let sort = collection
        .sort()
        .map(|sort| {
            let direction = if sort.descending { "desc" } else { "asc" };
            format!(" | sort {} {direction}", sort.column)
        })
        .unwrap_or_default();
    format!(
        "page {}/{} | {}{sort}",
        collection.current_page(),
        collection.page_count().max(1),
        collection.page_size().label()
    )
}

/// Splits cell text into display lines. With wrapping on, embedded newlines
/// break lines and long lines are cut at `width` characters.
fn cell_lines(text: &str, width: u16, wrap_lines: bool) -> Vec<String> {
    if !wrap_lines {
        return vec![text.to_owned()];
    }

    let width = usize::from(width.max(1));
    let mut lines = Vec::new();
    for line in text.lines() {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
            continue;
        }
        lines.extend(chars.chunks(width).map(|chunk| chunk.iter().collect::<String>()));
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines.truncate(MAX_ROW_LINES);
    lines
}

fn status_text(page: &SearchPage, view_data: &ViewData) -> String {
    if view_data.help_visible || view_data.preferences_draft.is_some() {
        return String::new();
    }

    let mode = match page.mode {
        AppMode::Nav => "NAV",
        AppMode::EditQuery => "QUERY",
        AppMode::EditProcessNumber => "PROCESS",
        AppMode::EditFilter => "FILTER",
        AppMode::Preferences => "PREFS",
    };
    let hints = match page.mode {
        AppMode::Nav if page.config.variant.requires_process_number() => {
            "s query | p process | enter search | f filter | space/a select | o sort | n/N page | i insight | , prefs | ? help | q quit"
        }
        AppMode::Nav | AppMode::Preferences => {
            "s query | enter search | f filter | space/a select | o sort | n/N page | i insight | , prefs | ? help | q quit"
        }
        _ => "type | enter done | esc cancel",
    };
    match &page.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn preferences_dialog_text(draft: &PreferencesDraft, columns: &[ColumnDescriptor]) -> String {
    let preferences = &draft.preferences;
    let mut items = vec![
        format!("Page size: {}", preferences.page_size.label()),
        format!(
            "Wrap lines: {}",
            if preferences.wrap_lines { "on" } else { "off" }
        ),
    ];
    items.extend(columns.iter().map(|column| {
        let mark = if preferences.is_visible(column.id) {
            "[x]"
        } else {
            "[ ]"
        };
        format!("{mark} {}", column.label)
    }));

    let mut out = String::new();
    for (index, item) in items.iter().enumerate() {
        out.push_str(if index == draft.cursor { "> " } else { "  " });
        out.push_str(item);
        out.push('\n');
    }
    out.push_str("\nj/k move | space toggle | enter confirm | esc cancel");
    out
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ctrl+c stop summary\n\
search: s question | p process number (extended) | enter search | esc back\n\
table: j/k rows | h/l columns | space select | a select all/none | o sort column\n\
table: n/N next/prev page | < > narrow/widen column | , preferences\n\
filter: f type filter | enter done | c clear filter\n\
insight: i summarize | x stop | d dismiss\n\
preferences: j/k move | space toggle | enter confirm | esc cancel"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, InternalEvent, ViewData, cell_lines, counter_text, empty_state_text,
        filter_bar_text, handle_key_event, help_overlay_text, pagination_text,
        preferences_dialog_text, process_internal_events, status_text, summary_panel_text,
        table_title,
    };
    use anyhow::{Result, anyhow};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use kbsearch_app::{
        AppMode, ChunkSource, ColumnWidths, PageConfig, PageSize, Preferences, Row, RowId,
        SearchPage, SearchRequest, SearchVariant, SummaryRequest,
    };
    use kbsearch_testkit::sample_rows;
    use std::collections::VecDeque;
    use std::sync::mpsc::{self, Receiver, Sender};

    struct ScriptedChunks {
        chunks: VecDeque<String>,
    }

    impl ChunkSource for ScriptedChunks {
        fn next_chunk(&mut self) -> Result<Option<String>> {
            Ok(self.chunks.pop_front())
        }

        fn abort(&mut self) {
            self.chunks.clear();
        }
    }

    #[derive(Default)]
    struct TestRuntime {
        rows: Vec<Row>,
        search_error: Option<String>,
        search_requests: Vec<SearchRequest>,
        summary_chunks: Vec<String>,
        summary_requests: Vec<SummaryRequest>,
        saved_preferences: Vec<Preferences>,
        saved_widths: Vec<ColumnWidths>,
    }

    impl AppRuntime for TestRuntime {
        fn search(&mut self, request: &SearchRequest) -> Result<Vec<Row>> {
            self.search_requests.push(request.clone());
            match &self.search_error {
                Some(error) => Err(anyhow!("{error}")),
                None => Ok(self.rows.clone()),
            }
        }

        fn open_summary(
            &mut self,
            request: &SummaryRequest,
        ) -> Result<Box<dyn ChunkSource + Send>> {
            self.summary_requests.push(request.clone());
            Ok(Box::new(ScriptedChunks {
                chunks: self.summary_chunks.iter().cloned().collect(),
            }))
        }

        fn save_preferences(&mut self, preferences: &Preferences) -> Result<()> {
            self.saved_preferences.push(preferences.clone());
            Ok(())
        }

        fn save_column_widths(&mut self, widths: &ColumnWidths) -> Result<()> {
            self.saved_widths.push(widths.clone());
            Ok(())
        }
    }

    struct Harness {
        page: SearchPage,
        runtime: TestRuntime,
        view_data: ViewData,
        tx: Sender<InternalEvent>,
        rx: Receiver<InternalEvent>,
    }

    impl Harness {
        fn new(variant: SearchVariant) -> Self {
            let (tx, rx) = mpsc::channel();
            Self {
                page: SearchPage::new(
                    PageConfig {
                        variant,
                        source_name: "Result".to_owned(),
                    },
                    variant.default_preferences(),
                    ColumnWidths::default(),
                ),
                runtime: TestRuntime {
                    rows: sample_rows(),
                    ..TestRuntime::default()
                },
                view_data: ViewData::default(),
                tx,
                rx,
            }
        }

        fn loaded() -> Self {
            let mut harness = Self::new(SearchVariant::Minimal);
            harness.press(KeyCode::Char('s'));
            harness.type_text("pump");
            harness.press(KeyCode::Enter);
            harness.pump();
            harness
        }

        fn key(&mut self, key: KeyEvent) -> bool {
            handle_key_event(
                &mut self.page,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                key,
            )
        }

        fn press(&mut self, code: KeyCode) -> bool {
            self.key(KeyEvent::new(code, KeyModifiers::NONE))
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.press(KeyCode::Char(ch));
            }
        }

        fn pump(&mut self) {
            process_internal_events(&mut self.page, &mut self.view_data, &self.tx, &self.rx);
        }

        fn status(&self) -> Option<&str> {
            self.page.status_line.as_deref()
        }
    }

    #[test]
    fn typed_query_runs_search_and_loads_rows() {
        let harness = Harness::loaded();
        assert_eq!(harness.runtime.search_requests.len(), 1);
        assert_eq!(harness.runtime.search_requests[0].search_words, "pump");
        assert_eq!(harness.runtime.search_requests[0].manufacturing_process_number, "");
        assert_eq!(harness.page.collection.items().len(), 3);
        assert_eq!(harness.page.collection.selected_count(), 3);
        assert!(!harness.page.loading);
        assert_eq!(harness.page.mode, AppMode::Nav);
        assert_eq!(harness.status(), Some("3 results"));
    }

    #[test]
    fn empty_query_prompts_without_request() {
        let mut harness = Harness::new(SearchVariant::Minimal);
        harness.press(KeyCode::Enter);
        assert_eq!(harness.status(), Some("Please input your question"));
        assert!(harness.runtime.search_requests.is_empty());
        assert!(harness.view_data.search_in_flight.is_none());
    }

    #[test]
    fn extended_search_requires_process_number() {
        let mut harness = Harness::new(SearchVariant::Extended);
        harness.press(KeyCode::Char('s'));
        harness.type_text("pump");
        harness.press(KeyCode::Enter);
        assert_eq!(
            harness.status(),
            Some("Please input the manufacturing process number")
        );
        assert!(harness.runtime.search_requests.is_empty());

        harness.press(KeyCode::Char('p'));
        harness.type_text("P-7");
        harness.press(KeyCode::Enter);
        assert_eq!(harness.runtime.search_requests.len(), 1);
        assert_eq!(
            harness.runtime.search_requests[0].manufacturing_process_number,
            "P-7"
        );
    }

    #[test]
    fn process_number_key_is_inert_in_minimal_variant() {
        let mut harness = Harness::new(SearchVariant::Minimal);
        harness.press(KeyCode::Char('p'));
        assert_eq!(harness.page.mode, AppMode::Nav);
        assert_eq!(harness.status(), Some("process number not used"));
    }

    #[test]
    fn only_latest_search_result_is_applied() {
        let mut harness = Harness::loaded();
        harness.press(KeyCode::Enter);
        harness.runtime.rows.truncate(1);
        harness.press(KeyCode::Enter);
        harness.pump();
        assert_eq!(harness.page.collection.items().len(), 1);
        assert!(harness.view_data.search_in_flight.is_none());
    }

    #[test]
    fn failed_search_reports_status_and_empties_table() {
        let mut harness = Harness::new(SearchVariant::Minimal);
        harness.runtime.search_error = Some("connection refused".to_owned());
        harness.press(KeyCode::Char('s'));
        harness.type_text("pump");
        harness.press(KeyCode::Enter);
        harness.pump();
        assert!(!harness.page.loading);
        assert!(harness.page.collection.is_empty());
        let status = harness.status().expect("status set");
        assert!(status.contains("connection refused"), "{status}");
    }

    #[test]
    fn insight_without_selection_prompts_and_sends_nothing() {
        let mut harness = Harness::loaded();
        harness.press(KeyCode::Char('a'));
        assert_eq!(harness.page.collection.selected_count(), 0);

        harness.press(KeyCode::Char('i'));
        assert_eq!(harness.status(), Some("Please select one or more data."));
        assert!(harness.runtime.summary_requests.is_empty());
        assert!(!harness.page.summary.loading);
    }

    #[test]
    fn insight_streams_summary_into_panel() {
        let mut harness = Harness::loaded();
        harness.runtime.summary_chunks = vec!["Hel".to_owned(), "lo".to_owned()];
        harness.press(KeyCode::Char('i'));
        assert!(harness.page.summary.loading);

        harness.pump();
        assert_eq!(harness.page.summary.text, "Hello");
        assert!(!harness.page.summary.loading);
        assert!(harness.view_data.summary_in_flight.is_none());

        let request = &harness.runtime.summary_requests[0];
        assert_eq!(request.question, "pump");
        assert_eq!(request.answers.len(), 3);
        assert_eq!(summary_panel_text(&harness.page), "Hello");
    }

    #[test]
    fn filter_counter_and_summary_source_follow_filter() {
        let mut harness = Harness::loaded();
        harness.press(KeyCode::Char('f'));
        harness.type_text("valve");
        assert_eq!(harness.page.collection.filtered_count(), 1);
        assert!(filter_bar_text(&harness.page).contains("1 match"));

        harness.press(KeyCode::Enter);
        assert_eq!(harness.page.mode, AppMode::Nav);
        assert_eq!(harness.runtime.search_requests.len(), 1);

        harness.press(KeyCode::Char(' '));
        harness.press(KeyCode::Char('i'));
        assert_eq!(
            harness.runtime.summary_requests[0].answers,
            vec!["Tighten bolts".to_owned()]
        );
    }

    #[test]
    fn select_all_key_covers_only_filtered_rows() {
        let mut harness = Harness::loaded();
        harness.press(KeyCode::Char('a'));
        assert_eq!(harness.page.collection.selected_count(), 0);

        harness.press(KeyCode::Char('f'));
        harness.type_text("valve");
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Char('a'));
        assert_eq!(harness.page.collection.selected_count(), 1);
        assert!(harness.page.collection.is_selected(&RowId::new("3")));
        assert!(!harness.page.collection.is_selected(&RowId::new("1")));

        harness.press(KeyCode::Char('c'));
        assert_eq!(table_title(&harness.page), "Result (1/3)");
        harness.press(KeyCode::Char('a'));
        assert_eq!(harness.page.collection.selected_count(), 3);

        harness.press(KeyCode::Char('a'));
        assert_eq!(harness.page.collection.selected_count(), 0);
    }

    #[test]
    fn no_match_state_offers_clear_action() {
        let mut harness = Harness::loaded();
        harness.press(KeyCode::Char('f'));
        harness.type_text("zzz");
        harness.press(KeyCode::Enter);

        let empty = empty_state_text(&harness.page).expect("no-match state");
        assert!(empty.starts_with("No matches"));
        assert!(filter_bar_text(&harness.page).contains("0 matches"));

        harness.press(KeyCode::Char('c'));
        assert_eq!(harness.page.collection.filter_text(), "");
        assert!(empty_state_text(&harness.page).is_none());
        assert_eq!(harness.status(), Some("filter cleared"));
    }

    #[test]
    fn backspace_edits_filter_live() {
        let mut harness = Harness::loaded();
        harness.press(KeyCode::Char('f'));
        harness.type_text("valvez");
        assert_eq!(harness.page.collection.filtered_count(), 0);
        harness.press(KeyCode::Backspace);
        assert_eq!(harness.page.collection.filter_text(), "valve");
        assert_eq!(harness.page.collection.filtered_count(), 1);
        harness.press(KeyCode::Esc);
        assert_eq!(harness.page.mode, AppMode::Nav);
    }

    #[test]
    fn empty_table_shows_no_resources() {
        let harness = Harness::new(SearchVariant::Minimal);
        let empty = empty_state_text(&harness.page).expect("empty state");
        assert!(empty.starts_with("No resources"));
        assert_eq!(table_title(&harness.page), "Result (0/0)");
    }

    #[test]
    fn space_toggles_row_under_cursor() {
        let mut harness = Harness::loaded();
        assert_eq!(table_title(&harness.page), "Result (3/3)");
        harness.press(KeyCode::Char('j'));
        harness.press(KeyCode::Char(' '));
        assert_eq!(harness.page.collection.selected_count(), 2);
        assert_eq!(table_title(&harness.page), "Result (2/3)");

        let toggled = harness.page.collection.page_items()[1].id().clone();
        assert!(!harness.page.collection.is_selected(&toggled));
    }

    #[test]
    fn sort_key_flips_direction_on_cursor_column() {
        let mut harness = Harness::loaded();
        let first = harness.page.collection.page_items()[0].text("question");
        assert_eq!(first, "Valve leak");

        harness.press(KeyCode::Char('o'));
        assert_eq!(harness.status(), Some("sort question asc"));
        let first = harness.page.collection.page_items()[0].text("question");
        assert_eq!(first, "Motor overheating");
        assert_eq!(
            pagination_text(&harness.page),
            "page 1/1 | 50 results | sort question asc"
        );
    }

    #[test]
    fn preferences_dialog_confirms_and_persists() {
        let mut harness = Harness::loaded();
        harness.press(KeyCode::Char(','));
        assert_eq!(harness.page.mode, AppMode::Preferences);
        assert!(status_text(&harness.page, &harness.view_data).is_empty());

        harness.press(KeyCode::Char(' '));
        harness.press(KeyCode::Char('j'));
        harness.press(KeyCode::Char(' '));
        harness.press(KeyCode::Char('j'));
        harness.press(KeyCode::Char(' '));

        let draft = harness
            .view_data
            .preferences_draft
            .clone()
            .expect("dialog open");
        let text = preferences_dialog_text(&draft, harness.page.columns());
        assert!(text.contains("> [x] ID"));
        assert!(text.contains("Wrap lines: off"));

        harness.press(KeyCode::Enter);
        assert_eq!(harness.page.mode, AppMode::Nav);
        assert_eq!(harness.page.preferences.page_size, PageSize::Ten);
        assert!(!harness.page.preferences.wrap_lines);
        assert!(harness.page.preferences.is_visible("id"));
        assert_eq!(harness.page.collection.page_size(), PageSize::Ten);
        assert_eq!(harness.runtime.saved_preferences.len(), 1);
        assert_eq!(harness.status(), Some("preferences saved"));
    }

    #[test]
    fn preferences_dialog_escape_discards_draft() {
        let mut harness = Harness::loaded();
        harness.press(KeyCode::Char(','));
        harness.press(KeyCode::Char(' '));
        harness.press(KeyCode::Esc);
        assert_eq!(harness.page.preferences.page_size, PageSize::Fifty);
        assert!(harness.runtime.saved_preferences.is_empty());
        assert!(harness.view_data.preferences_draft.is_none());
        assert_eq!(harness.page.mode, AppMode::Nav);
    }

    #[test]
    fn widening_column_persists_widths() {
        let mut harness = Harness::loaded();
        harness.press(KeyCode::Char('>'));
        assert_eq!(harness.page.column_widths.get("question"), Some(28));
        assert_eq!(harness.runtime.saved_widths.len(), 1);

        harness.press(KeyCode::Char('<'));
        harness.press(KeyCode::Char('<'));
        assert_eq!(harness.page.column_widths.get("question"), Some(24));
        assert_eq!(harness.runtime.saved_widths.len(), 2);
    }

    #[test]
    fn dismiss_clears_summary_panel() {
        let mut harness = Harness::loaded();
        harness.runtime.summary_chunks = vec!["done".to_owned()];
        harness.press(KeyCode::Char('i'));
        harness.pump();
        assert_eq!(harness.page.summary.text, "done");

        harness.press(KeyCode::Char('d'));
        assert!(harness.page.summary.text.is_empty());
        assert!(!harness.page.summary.loading);
    }

    #[test]
    fn stop_without_running_summary_reports_status() {
        let mut harness = Harness::loaded();
        harness.press(KeyCode::Char('x'));
        assert_eq!(harness.status(), Some("no summary running"));
    }

    #[test]
    fn stale_summary_updates_are_dropped() {
        let mut harness = Harness::loaded();
        harness
            .tx
            .send(InternalEvent::Summary {
                request_id: 42,
                update: kbsearch_app::SummaryUpdate::Partial("stray_".to_owned()),
            })
            .expect("channel open");
        harness.pump();
        assert!(harness.page.summary.text.is_empty());
    }

    #[test]
    fn status_clears_only_for_current_token() {
        let mut harness = Harness::loaded();
        let token = harness.view_data.status_token;
        harness
            .tx
            .send(InternalEvent::ClearStatus { token: token - 1 })
            .expect("channel open");
        harness.pump();
        assert!(harness.status().is_some());

        harness
            .tx
            .send(InternalEvent::ClearStatus { token })
            .expect("channel open");
        harness.pump();
        assert!(harness.status().is_none());
    }

    #[test]
    fn help_overlay_round_trip() {
        let mut harness = Harness::loaded();
        harness.press(KeyCode::Char('?'));
        assert!(harness.view_data.help_visible);
        assert_eq!(harness.status(), Some("help open"));

        harness.press(KeyCode::Char('i'));
        assert!(harness.runtime.summary_requests.is_empty());

        harness.press(KeyCode::Char('?'));
        assert!(!harness.view_data.help_visible);
        assert_eq!(harness.status(), Some("help hidden"));
        assert!(help_overlay_text().contains("i summarize"));
    }

    #[test]
    fn quit_keys() {
        let mut harness = Harness::new(SearchVariant::Minimal);
        assert!(harness.key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL)));
        assert!(harness.press(KeyCode::Char('q')));

        harness.press(KeyCode::Char('s'));
        assert!(!harness.press(KeyCode::Char('q')));
        assert_eq!(harness.page.query_input, "q");
    }

    #[test]
    fn status_text_shows_mode_and_hints() {
        let mut harness = Harness::new(SearchVariant::Minimal);
        let status = status_text(&harness.page, &harness.view_data);
        assert!(status.starts_with("NAV | "));
        assert!(!status.contains("p process"));

        harness.press(KeyCode::Char('f'));
        let status = status_text(&harness.page, &harness.view_data);
        assert!(status.starts_with("FILTER | "));
    }

    #[test]
    fn counter_text_pluralizes() {
        assert_eq!(counter_text(0), "0 matches");
        assert_eq!(counter_text(1), "1 match");
        assert_eq!(counter_text(12), "12 matches");
    }

    #[test]
    fn cell_lines_wrap_or_flatten() {
        assert_eq!(cell_lines("abcdef\ngh", 4, true), vec!["abcd", "ef", "gh"]);
        assert_eq!(cell_lines("", 4, true), vec![""]);
        assert_eq!(cell_lines("abcdef gh", 4, false), vec!["abcdef gh"]);
        let long = "x".repeat(100);
        assert_eq!(cell_lines(&long, 4, true).len(), 8);
    }
}
