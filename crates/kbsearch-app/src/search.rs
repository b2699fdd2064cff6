// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{FieldValue, ID_FIELD, Row, RowId, UPLOAD_DATE_FIELD};
use serde::Serialize;
use serde_json::Value;

pub const MAX_QUERY_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub search_words: String,
    pub manufacturing_process_number: String,
}

/// Caps typed input the way the search box does.
pub fn clamp_query_input(input: &str) -> String {
    input.chars().take(MAX_QUERY_CHARS).collect()
}

/// Turns a search response body into rows. Anything that is not an array
/// yields no rows; envelopes without a `source` object are dropped.
pub fn normalize_response(body: &Value) -> Vec<Row> {
    let Some(envelopes) = body.as_array() else {
        tracing::debug!("search response is not an array; treating as empty");
        return Vec::new();
    };

    envelopes
        .iter()
        .enumerate()
        .filter_map(|(index, envelope)| normalize_envelope(index, envelope))
        .collect()
}

fn normalize_envelope(index: usize, envelope: &Value) -> Option<Row> {
    let source = envelope.get("source")?.as_object()?;

    let id = match envelope.get(ID_FIELD) {
        Some(Value::String(id)) => RowId::new(id.as_str()),
        Some(Value::Number(id)) => RowId::new(id.to_string()),
        _ => RowId::new(format!("row-{index}")),
    };

    let mut row = Row::new(id);
    for (name, value) in source {
        row.set(name, FieldValue::from_json(value));
    }

    let upload_date = source
        .get(UPLOAD_DATE_FIELD)
        .map(FieldValue::from_json)
        .map(|value| latest_upload_date(&value.display()).to_owned())
        .unwrap_or_default();
    row.set(UPLOAD_DATE_FIELD, upload_date);

    Some(row)
}

/// `upload_date` lists every revision, comma separated; the last one is shown.
pub fn latest_upload_date(raw: &str) -> &str {
    raw.rsplit(',').next().unwrap_or_default().trim()
}

#[cfg(test)]
mod tests {
    use super::{clamp_query_input, latest_upload_date, normalize_response};
    use serde_json::json;

    #[test]
    fn envelope_source_fields_are_copied_and_last_date_kept() {
        let body = json!([
            {"id": "1", "source": {"question": "Q1", "answers": "A1", "upload_date": "2023-01-01,2023-02-01"}}
        ]);
        let rows = normalize_response(&body);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.text("id"), "1");
        assert_eq!(row.text("question"), "Q1");
        assert_eq!(row.text("answers"), "A1");
        assert_eq!(row.text("upload_date"), "2023-02-01");
    }

    #[test]
    fn envelopes_without_source_are_dropped() {
        let body = json!([
            {"id": "1"},
            {"id": "2", "source": null},
            {"id": "3", "source": {"question": "kept"}},
            42
        ]);
        let rows = normalize_response(&body);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("id"), "3");
    }

    #[test]
    fn envelope_id_overrides_source_id() {
        let body = json!([{"id": 17, "source": {"id": "shadow", "question": "Q"}}]);
        let rows = normalize_response(&body);
        assert_eq!(rows[0].text("id"), "17");
    }

    #[test]
    fn missing_upload_date_becomes_empty() {
        let body = json!([{"id": "1", "source": {"question": "Q"}}]);
        let rows = normalize_response(&body);
        assert_eq!(rows[0].text("upload_date"), "");
    }

    #[test]
    fn malformed_bodies_yield_empty_rows() {
        assert!(normalize_response(&json!(null)).is_empty());
        assert!(normalize_response(&json!({"hits": []})).is_empty());
        assert!(normalize_response(&json!("oops")).is_empty());
    }

    #[test]
    fn envelope_without_id_gets_positional_id() {
        let body = json!([{"source": {"question": "Q"}}]);
        let rows = normalize_response(&body);
        assert_eq!(rows[0].text("id"), "row-0");
    }

    #[test]
    fn latest_upload_date_takes_last_segment() {
        assert_eq!(latest_upload_date("2023-01-01"), "2023-01-01");
        assert_eq!(latest_upload_date("a, b ,c"), "c");
        assert_eq!(latest_upload_date(""), "");
    }

    #[test]
    fn query_input_is_capped() {
        let long = "x".repeat(250);
        assert_eq!(clamp_query_input(&long).chars().count(), 200);
        assert_eq!(clamp_query_input("pump fault"), "pump fault");
    }
}
