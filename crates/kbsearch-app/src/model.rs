// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const ID_FIELD: &str = "id";
pub const QUESTION_FIELD: &str = "question";
pub const ANSWERS_FIELD: &str = "answers";
pub const UPLOAD_DATE_FIELD: &str = "upload_date";

pub const MIN_COLUMN_WIDTH: u16 = 6;
pub const DEFAULT_COLUMN_WIDTH: u16 = 16;
pub const MAX_COLUMN_WIDTH: u16 = 120;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowId(String);

impl RowId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scalar carried by one row field. Search backends return mostly strings,
/// but numbers and booleans pass through untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl FieldValue {
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(value) => Self::Bool(*value),
            serde_json::Value::Number(number) => number
                .as_f64()
                .map(Self::Number)
                .unwrap_or_else(|| Self::Text(number.to_string())),
            serde_json::Value::String(text) => Self::Text(text.clone()),
            nested => Self::Text(nested.to_string()),
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(value) => format_number(*value),
            Self::Bool(value) => value.to_string(),
            Self::Null => String::new(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// One search hit. The id lives outside the field map so a `source` field
/// named `id` can never shadow it.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    id: RowId,
    fields: BTreeMap<String, FieldValue>,
}

impl Row {
    pub fn new(id: RowId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn id(&self) -> &RowId {
        &self.id
    }

    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) {
        if name == ID_FIELD {
            return;
        }
        self.fields.insert(name.to_owned(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Display text for a field; unknown fields render empty.
    pub fn text(&self, name: &str) -> String {
        if name == ID_FIELD {
            return self.id.to_string();
        }
        self.fields
            .get(name)
            .map(FieldValue::display)
            .unwrap_or_default()
    }

    /// String form of every value, id first, in the order filtering visits them.
    pub fn searchable_texts(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.id.to_string()).chain(self.fields.values().map(FieldValue::display))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Multiline,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub sortable: bool,
    pub min_width: Option<u16>,
    pub kind: ColumnKind,
}

impl ColumnDescriptor {
    const fn text(id: &'static str, label: &'static str) -> Self {
        Self {
            id,
            label,
            sortable: true,
            min_width: None,
            kind: ColumnKind::Text,
        }
    }

    const fn with_min_width(mut self, width: u16) -> Self {
        self.min_width = Some(width);
        self
    }

    const fn with_kind(mut self, kind: ColumnKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn render(&self, row: &Row, wrap_lines: bool) -> String {
        let text = row.text(self.id);
        match self.kind {
            ColumnKind::Multiline if !wrap_lines => text.replace("\r\n", " ").replace('\n', " "),
            _ => text,
        }
    }

    pub fn floor_width(&self) -> u16 {
        self.min_width.unwrap_or(MIN_COLUMN_WIDTH).max(MIN_COLUMN_WIDTH)
    }
}

pub const MINIMAL_COLUMNS: [ColumnDescriptor; 4] = [
    ColumnDescriptor::text(ID_FIELD, "ID"),
    ColumnDescriptor::text(QUESTION_FIELD, "Question").with_min_width(24),
    ColumnDescriptor::text(ANSWERS_FIELD, "Analysis and processing")
        .with_min_width(40)
        .with_kind(ColumnKind::Multiline),
    ColumnDescriptor::text(UPLOAD_DATE_FIELD, "Update time").with_kind(ColumnKind::Date),
];

pub const EXTENDED_COLUMNS: [ColumnDescriptor; 10] = [
    ColumnDescriptor::text(ID_FIELD, "ID"),
    ColumnDescriptor::text(QUESTION_FIELD, "Question").with_min_width(24),
    ColumnDescriptor::text(ANSWERS_FIELD, "Analysis and processing")
        .with_min_width(40)
        .with_kind(ColumnKind::Multiline),
    ColumnDescriptor::text(UPLOAD_DATE_FIELD, "Update time").with_kind(ColumnKind::Date),
    ColumnDescriptor::text("manufacturing_process_number", "Process No."),
    ColumnDescriptor::text("production_line", "Line"),
    ColumnDescriptor::text("device_code", "Device"),
    ColumnDescriptor::text("device_description", "Device description").with_min_width(20),
    ColumnDescriptor::text("cause_code", "Cause"),
    ColumnDescriptor::text("cause_description", "Cause description").with_min_width(20),
];

/// Deployment shape of the search page. The extended variant asks for a
/// manufacturing process number and shows the plant columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchVariant {
    Minimal,
    Extended,
}

impl SearchVariant {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Extended => "extended",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "minimal" => Some(Self::Minimal),
            "extended" => Some(Self::Extended),
            _ => None,
        }
    }

    pub const fn columns(self) -> &'static [ColumnDescriptor] {
        match self {
            Self::Minimal => &MINIMAL_COLUMNS,
            Self::Extended => &EXTENDED_COLUMNS,
        }
    }

    pub const fn requires_process_number(self) -> bool {
        matches!(self, Self::Extended)
    }

    pub fn default_preferences(self) -> Preferences {
        let mut visible_content = vec![QUESTION_FIELD.to_owned(), ANSWERS_FIELD.to_owned()];
        if self == Self::Extended {
            visible_content.push("device_description".to_owned());
            visible_content.push("cause_description".to_owned());
        }
        Preferences {
            page_size: PageSize::Fifty,
            visible_content,
            wrap_lines: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum PageSize {
    Ten,
    Thirty,
    Fifty,
}

impl PageSize {
    pub const ALL: [Self; 3] = [Self::Ten, Self::Thirty, Self::Fifty];

    pub const fn get(self) -> usize {
        match self {
            Self::Ten => 10,
            Self::Thirty => 30,
            Self::Fifty => 50,
        }
    }

    pub fn from_value(value: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|size| size.get() == value)
    }

    pub fn next(self) -> Self {
        match self {
            Self::Ten => Self::Thirty,
            Self::Thirty => Self::Fifty,
            Self::Fifty => Self::Ten,
        }
    }

    pub fn label(self) -> String {
        format!("{} results", self.get())
    }
}

impl TryFrom<usize> for PageSize {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::from_value(value).ok_or_else(|| format!("page size must be 10, 30 or 50, got {value}"))
    }
}

impl From<PageSize> for usize {
    fn from(value: PageSize) -> Self {
        value.get()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub page_size: PageSize,
    pub visible_content: Vec<String>,
    pub wrap_lines: bool,
}

impl Preferences {
    pub fn is_visible(&self, column_id: &str) -> bool {
        self.visible_content.iter().any(|id| id == column_id)
    }

    /// Visible columns in declaration order; ids with no descriptor are skipped.
    pub fn visible_columns(&self, columns: &[ColumnDescriptor]) -> Vec<ColumnDescriptor> {
        columns
            .iter()
            .filter(|column| self.is_visible(column.id))
            .copied()
            .collect()
    }

    pub fn toggle_column(&mut self, column_id: &str) {
        if let Some(index) = self.visible_content.iter().position(|id| id == column_id) {
            self.visible_content.remove(index);
        } else {
            self.visible_content.push(column_id.to_owned());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnWidths(BTreeMap<String, u16>);

impl ColumnWidths {
    pub fn get(&self, column_id: &str) -> Option<u16> {
        self.0.get(column_id).copied()
    }

    pub fn set(&mut self, column_id: &str, width: u16) {
        self.0.insert(column_id.to_owned(), width);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub descriptor: ColumnDescriptor,
    pub width: u16,
}

/// Merges persisted widths into the declared columns. The declared minimum
/// always wins over a narrower stored width.
pub fn resolve_columns(columns: &[ColumnDescriptor], widths: &ColumnWidths) -> Vec<ResolvedColumn> {
    columns
        .iter()
        .map(|descriptor| {
            let floor = descriptor.floor_width();
            let width = widths
                .get(descriptor.id)
                .unwrap_or_else(|| descriptor.min_width.unwrap_or(DEFAULT_COLUMN_WIDTH))
                .clamp(floor, MAX_COLUMN_WIDTH.max(floor));
            ResolvedColumn {
                descriptor: *descriptor,
                width,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Nav,
    EditQuery,
    EditProcessNumber,
    EditFilter,
    Preferences,
}
