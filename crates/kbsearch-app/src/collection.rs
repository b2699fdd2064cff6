// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{ColumnDescriptor, ColumnKind, FieldValue, ID_FIELD, PageSize, Row, RowId};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// Column the table sorts by before the user asks for anything else.
pub const DEFAULT_SORT_COLUMN_INDEX: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub column: String,
    pub descending: bool,
}

/// Client-side view over one result set: filtering, sorting, paging and
/// multi-selection. Sorting reorders the owned rows in place; filtering and
/// paging are derived on every read.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    columns: Vec<ColumnDescriptor>,
    items: Vec<Row>,
    filter_text: String,
    page_size: PageSize,
    current_page: usize,
    sort: Option<SortState>,
    selection: BTreeSet<RowId>,
}

impl Collection {
    pub fn new(columns: &[ColumnDescriptor], page_size: PageSize) -> Self {
        let sort = columns
            .get(DEFAULT_SORT_COLUMN_INDEX)
            .filter(|column| column.sortable)
            .map(|column| SortState {
                column: column.id.to_owned(),
                descending: true,
            });
        Self {
            columns: columns.to_vec(),
            items: Vec::new(),
            filter_text: String::new(),
            page_size,
            current_page: 1,
            sort,
            selection: BTreeSet::new(),
        }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Swaps in a fresh result set. Selection is reseeded to every row.
    pub fn replace_items(&mut self, rows: Vec<Row>) {
        self.items = rows;
        self.apply_sort();
        self.selection = self.items.iter().map(|row| row.id().clone()).collect();
        self.current_page = 1;
    }

    pub fn clear_items(&mut self) {
        self.items.clear();
        self.selection.clear();
        self.current_page = 1;
    }

    pub fn items(&self) -> &[Row] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn is_filtering(&self) -> bool {
        !self.filter_text.is_empty()
    }

    pub fn set_filter_text(&mut self, text: &str) {
        if self.filter_text != text {
            self.filter_text = text.to_owned();
            self.current_page = 1;
        }
    }

    pub fn clear_filter(&mut self) {
        self.set_filter_text("");
    }

    pub fn filtered(&self) -> Vec<&Row> {
        self.items
            .iter()
            .filter(|row| row_matches_filter(row, &self.filter_text))
            .collect()
    }

    pub fn filtered_count(&self) -> usize {
        self.items
            .iter()
            .filter(|row| row_matches_filter(row, &self.filter_text))
            .count()
    }

    /// True when a filter is set and it hides every row.
    pub fn is_no_match(&self) -> bool {
        self.is_filtering() && !self.items.is_empty() && self.filtered_count() == 0
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
        self.current_page = 1;
    }

    pub fn page_count(&self) -> usize {
        self.filtered_count().div_ceil(self.page_size.get())
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn set_current_page(&mut self, page: usize) -> usize {
        self.current_page = page.clamp(1, self.page_count().max(1));
        self.current_page
    }

    pub fn next_page(&mut self) -> bool {
        let before = self.current_page;
        self.set_current_page(before + 1) != before
    }

    pub fn prev_page(&mut self) -> bool {
        let before = self.current_page;
        self.set_current_page(before.saturating_sub(1)) != before
    }

    pub fn page_items(&self) -> Vec<&Row> {
        let size = self.page_size.get();
        let page = self.current_page.clamp(1, self.page_count().max(1));
        self.filtered()
            .into_iter()
            .skip((page - 1) * size)
            .take(size)
            .collect()
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    /// Sorts by `column_id`, flipping the page-wide direction flag on every
    /// request. Returns `None` for unknown or unsortable columns.
    pub fn sort_by(&mut self, column_id: &str) -> Option<&SortState> {
        let column = self
            .columns
            .iter()
            .find(|column| column.id == column_id && column.sortable)?;
        let descending = !self
            .sort
            .as_ref()
            .map(|sort| sort.descending)
            .unwrap_or(false);
        self.sort = Some(SortState {
            column: column.id.to_owned(),
            descending,
        });
        self.apply_sort();
        self.sort.as_ref()
    }

    fn apply_sort(&mut self) {
        let Some(sort) = &self.sort else {
            return;
        };
        let Some(column) = self.columns.iter().find(|column| column.id == sort.column) else {
            return;
        };
        let descending = sort.descending;
        self.items.sort_by(|a, b| {
            let ordering = compare_rows(a, b, column);
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }

    pub fn is_selected(&self, id: &RowId) -> bool {
        self.selection.contains(id)
    }

    /// Flips one row's selection; returns whether it is now selected.
    pub fn toggle_selection(&mut self, id: &RowId) -> bool {
        if self.selection.remove(id) {
            return false;
        }
        if self.items.iter().any(|row| row.id() == id) {
            self.selection.insert(id.clone());
            return true;
        }
        false
    }

    pub fn select_all_filtered(&mut self) {
        let ids: Vec<RowId> = self
            .filtered()
            .into_iter()
            .map(|row| row.id().clone())
            .collect();
        self.selection.extend(ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    pub fn selected_rows(&self) -> Vec<&Row> {
        self.items
            .iter()
            .filter(|row| self.selection.contains(row.id()))
            .collect()
    }

    /// Rows a summary is built from: the whole filtered set while a filter
    /// is active, the explicit selection otherwise.
    pub fn summary_sources(&self) -> Vec<&Row> {
        if self.is_filtering() {
            self.filtered()
        } else {
            self.selected_rows()
        }
    }
}

/// A row matches when any whitespace-separated token is a case-insensitive
/// substring of any field. The empty filter matches everything.
pub fn row_matches_filter(row: &Row, filter_text: &str) -> bool {
    if filter_text.is_empty() {
        return true;
    }
    let tokens: Vec<String> = filter_text
        .split_whitespace()
        .map(str::to_uppercase)
        .collect();
    if tokens.is_empty() {
        return false;
    }
    row.searchable_texts().any(|value| {
        let value = value.to_uppercase();
        tokens.iter().any(|token| value.contains(token.as_str()))
    })
}

fn compare_rows(a: &Row, b: &Row, column: &ColumnDescriptor) -> Ordering {
    match column.kind {
        ColumnKind::Date => {
            parse_timestamp(&a.text(column.id)).cmp(&parse_timestamp(&b.text(column.id)))
        }
        ColumnKind::Text | ColumnKind::Multiline => {
            GenericKey::of(a, column.id).compare(&GenericKey::of(b, column.id))
        }
    }
}

/// Numeric when both sides parse as numbers, lexicographic otherwise.
/// Missing values sort first.
#[derive(Debug, Clone, PartialEq)]
enum GenericKey {
    Missing,
    Number(f64),
    Text(String),
}

impl GenericKey {
    fn of(row: &Row, field: &str) -> Self {
        if field == ID_FIELD {
            return Self::from_text(row.id().as_str());
        }
        match row.get(field) {
            None | Some(FieldValue::Null) => Self::Missing,
            Some(FieldValue::Number(value)) => Self::Number(*value),
            Some(FieldValue::Bool(value)) => Self::Number(f64::from(u8::from(*value))),
            Some(FieldValue::Text(text)) => Self::from_text(text),
        }
    }

    fn from_text(text: &str) -> Self {
        match text.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Number(value),
            _ => Self::Text(text.to_owned()),
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Parses the timestamp shapes search backends emit. Unparseable values
/// sort before every real date.
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(value);
    }
    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Some(value.assume_utc());
    }
    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(value.assume_utc());
    }
    if let Ok(value) = Date::parse(raw, &format_description!("[year]-[month]-[day]")) {
        return Some(value.midnight().assume_utc());
    }
    if let Ok(value) = Date::parse(raw, &format_description!("[year]/[month]/[day]")) {
        return Some(value.midnight().assume_utc());
    }
    None
}
