// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::collection::{Collection, SortState};
use crate::model::{
    AppMode, ColumnDescriptor, ColumnWidths, MAX_COLUMN_WIDTH, Preferences, ResolvedColumn, Row,
    RowId, SearchVariant, resolve_columns,
};
use crate::search::{SearchRequest, clamp_query_input};
use crate::summary::{CancelToken, SummaryRequest, SummaryUpdate};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageConfig {
    pub variant: SearchVariant,
    pub source_name: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            variant: SearchVariant::Minimal,
            source_name: "Result".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MissingQuery,
    MissingProcessNumber,
    NothingSelected,
}

impl ValidationError {
    pub const fn message(self) -> &'static str {
        match self {
            Self::MissingQuery => "Please input your question",
            Self::MissingProcessNumber => "Please input the manufacturing process number",
            Self::NothingSelected => "Please select one or more data.",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, Default)]
pub struct SummaryView {
    pub text: String,
    pub loading: bool,
    cancel: Option<CancelToken>,
}

#[derive(Debug, Clone)]
pub struct SearchPage {
    pub config: PageConfig,
    pub mode: AppMode,
    pub query_input: String,
    pub process_number_input: String,
    pub query: String,
    pub loading: bool,
    pub collection: Collection,
    pub preferences: Preferences,
    pub column_widths: ColumnWidths,
    pub summary: SummaryView,
    pub status_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCommand {
    EnterMode(AppMode),
    ExitToNav,
    SetQueryInput(String),
    SetProcessNumberInput(String),
    SetFilter(String),
    ClearFilter,
    SortBy(String),
    NextPage,
    PrevPage,
    ToggleSelection(RowId),
    SelectAllFiltered,
    ClearSelection,
    ApplyPreferences(Preferences),
    ResizeColumn { column: String, delta: i16 },
    DismissSummary,
    StopSummary,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    ModeChanged(AppMode),
    InputChanged,
    FilterChanged(String),
    SortChanged(SortState),
    PageChanged(usize),
    SelectionChanged(usize),
    PreferencesChanged(Preferences),
    ColumnWidthsChanged(ColumnWidths),
    ResultsLoaded(usize),
    SummaryUpdated,
    SummaryDismissed,
    SummaryStopRequested,
    StatusUpdated(String),
    StatusCleared,
}

impl SearchPage {
    pub fn new(config: PageConfig, preferences: Preferences, column_widths: ColumnWidths) -> Self {
        let collection = Collection::new(config.variant.columns(), preferences.page_size);
        Self {
            config,
            mode: AppMode::Nav,
            query_input: String::new(),
            process_number_input: String::new(),
            query: String::new(),
            loading: false,
            collection,
            preferences,
            column_widths,
            summary: SummaryView::default(),
            status_line: None,
        }
    }

    pub fn columns(&self) -> &'static [ColumnDescriptor] {
        self.config.variant.columns()
    }

    pub fn visible_columns(&self) -> Vec<ResolvedColumn> {
        let visible = self.preferences.visible_columns(self.columns());
        resolve_columns(&visible, &self.column_widths)
    }

    pub fn dispatch(&mut self, command: PageCommand) -> Vec<PageEvent> {
        match command {
            PageCommand::EnterMode(mode) => {
                self.mode = mode;
                vec![PageEvent::ModeChanged(mode)]
            }
            PageCommand::ExitToNav => {
                self.mode = AppMode::Nav;
                vec![PageEvent::ModeChanged(AppMode::Nav)]
            }
            PageCommand::SetQueryInput(input) => {
                self.query_input = clamp_query_input(&input);
                vec![PageEvent::InputChanged]
            }
            PageCommand::SetProcessNumberInput(input) => {
                self.process_number_input = clamp_query_input(&input);
                vec![PageEvent::InputChanged]
            }
            PageCommand::SetFilter(text) => {
                self.collection.set_filter_text(&text);
                vec![PageEvent::FilterChanged(text)]
            }
            PageCommand::ClearFilter => {
                self.collection.clear_filter();
                vec![
                    PageEvent::FilterChanged(String::new()),
                    self.set_status("filter cleared"),
                ]
            }
            PageCommand::SortBy(column) => match self.collection.sort_by(&column).cloned() {
                Some(sort) => {
                    let direction = if sort.descending { "desc" } else { "asc" };
                    let status = self.set_status(&format!("sort {} {direction}", sort.column));
                    vec![PageEvent::SortChanged(sort), status]
                }
                None => vec![self.set_status("sort unavailable")],
            },
            PageCommand::NextPage => {
                if self.collection.next_page() {
                    vec![PageEvent::PageChanged(self.collection.current_page())]
                } else {
                    Vec::new()
                }
            }
            PageCommand::PrevPage => {
                if self.collection.prev_page() {
                    vec![PageEvent::PageChanged(self.collection.current_page())]
                } else {
                    Vec::new()
                }
            }
            PageCommand::ToggleSelection(id) => {
                self.collection.toggle_selection(&id);
                vec![PageEvent::SelectionChanged(self.collection.selected_count())]
            }
            PageCommand::SelectAllFiltered => {
                self.collection.select_all_filtered();
                vec![PageEvent::SelectionChanged(self.collection.selected_count())]
            }
            PageCommand::ClearSelection => {
                self.collection.clear_selection();
                vec![PageEvent::SelectionChanged(0)]
            }
            PageCommand::ApplyPreferences(preferences) => {
                self.collection.set_page_size(preferences.page_size);
                self.preferences = preferences.clone();
                vec![
                    PageEvent::PreferencesChanged(preferences),
                    PageEvent::PageChanged(self.collection.current_page()),
                ]
            }
            PageCommand::ResizeColumn { column, delta } => self.resize_column(&column, delta),
            PageCommand::DismissSummary => {
                self.summary.text.clear();
                self.summary.loading = false;
                vec![PageEvent::SummaryDismissed]
            }
            PageCommand::StopSummary => {
                if !self.summary.loading {
                    return Vec::new();
                }
                match &self.summary.cancel {
                    Some(cancel) => {
                        cancel.cancel();
                        vec![PageEvent::SummaryStopRequested, self.set_status("stopping")]
                    }
                    None => Vec::new(),
                }
            }
            PageCommand::SetStatus(message) => vec![self.set_status(&message)],
            PageCommand::ClearStatus => {
                self.status_line = None;
                vec![PageEvent::StatusCleared]
            }
        }
    }

    /// Validates the inputs and moves the page into its loading state. The
    /// previous rows, the filter and any summary text are cleared up front so
    /// stale data never shows while the request is out. Inputs are sent as
    /// typed; only an empty field is refused.
    pub fn begin_search(&mut self) -> Result<SearchRequest, ValidationError> {
        let search_words = self.query_input.clone();
        if search_words.is_empty() {
            return Err(ValidationError::MissingQuery);
        }

        let manufacturing_process_number = if self.config.variant.requires_process_number() {
            let number = self.process_number_input.clone();
            if number.is_empty() {
                return Err(ValidationError::MissingProcessNumber);
            }
            number
        } else {
            String::new()
        };

        self.loading = true;
        self.collection.clear_items();
        self.collection.clear_filter();
        self.summary.text.clear();
        self.query = search_words.clone();

        Ok(SearchRequest {
            search_words,
            manufacturing_process_number,
        })
    }

    pub fn finish_search(&mut self, outcome: anyhow::Result<Vec<Row>>) -> Vec<PageEvent> {
        self.loading = false;
        match outcome {
            Ok(rows) => {
                let count = rows.len();
                self.collection.replace_items(rows);
                let label = if count == 1 { "result" } else { "results" };
                vec![
                    PageEvent::ResultsLoaded(count),
                    self.set_status(&format!("{count} {label}")),
                ]
            }
            Err(error) => {
                tracing::error!(error = %format!("{error:#}"), "search request failed");
                self.collection.clear_items();
                vec![
                    PageEvent::ResultsLoaded(0),
                    self.set_status(&format!(
                        "search failed: {error:#}; check [api] settings and retry"
                    )),
                ]
            }
        }
    }

    pub fn can_summarize(&self) -> bool {
        self.collection.selected_count() > 0
    }

    pub fn can_stop_summary(&self) -> bool {
        self.summary.loading
    }

    /// Builds the summarize request and hands back the stop token the
    /// streaming worker must poll. A stream still running after a dismiss is
    /// stopped here so it cannot outlive its panel.
    pub fn begin_summary(&mut self) -> Result<(SummaryRequest, CancelToken), ValidationError> {
        if !self.can_summarize() {
            return Err(ValidationError::NothingSelected);
        }

        let sources = self.collection.summary_sources();
        let request = SummaryRequest::from_rows(&sources, &self.query);
        let cancel = CancelToken::new();
        if let Some(superseded) = self.summary.cancel.replace(cancel.clone()) {
            superseded.cancel();
        }
        self.summary.loading = true;
        Ok((request, cancel))
    }

    pub fn apply_summary_update(&mut self, update: SummaryUpdate) -> Vec<PageEvent> {
        match update {
            SummaryUpdate::Partial(text) => {
                self.summary.text = text;
                vec![PageEvent::SummaryUpdated]
            }
            SummaryUpdate::Finished(text) | SummaryUpdate::Cancelled(text) => {
                self.summary.text = text;
                self.summary.loading = false;
                self.summary.cancel = None;
                vec![PageEvent::SummaryUpdated]
            }
            SummaryUpdate::Failed(error) => {
                self.summary.loading = false;
                self.summary.cancel = None;
                vec![
                    PageEvent::SummaryUpdated,
                    self.set_status(&format!("summary failed: {error}")),
                ]
            }
        }
    }

    fn resize_column(&mut self, column_id: &str, delta: i16) -> Vec<PageEvent> {
        let all = resolve_columns(self.columns(), &self.column_widths);
        let Some(column) = all.iter().find(|column| column.descriptor.id == column_id) else {
            return vec![self.set_status("resize unavailable")];
        };

        let floor = column.descriptor.floor_width();
        let width = (i32::from(column.width) + i32::from(delta))
            .clamp(i32::from(floor), i32::from(MAX_COLUMN_WIDTH.max(floor)));
        let width = u16::try_from(width).unwrap_or(floor);
        if width == column.width {
            return Vec::new();
        }

        self.column_widths.set(column_id, width);
        vec![PageEvent::ColumnWidthsChanged(self.column_widths.clone())]
    }

    fn set_status(&mut self, message: &str) -> PageEvent {
        self.status_line = Some(message.to_owned());
        PageEvent::StatusUpdated(message.to_owned())
    }
}
