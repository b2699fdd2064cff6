// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use kbsearch_app::{Row, RowId};
use serde_json::{Value, json};
use std::path::PathBuf;

const SYMPTOMS: [&str; 10] = [
    "Pump vibration",
    "Motor overheating",
    "Valve leak",
    "Conveyor jam",
    "Sensor drift",
    "Bearing noise",
    "Pressure drop",
    "Weld porosity",
    "Spindle chatter",
    "Coolant foaming",
];

const REMEDIES: [&str; 10] = [
    "Replace the bearing",
    "Clean the cooling fan",
    "Tighten the flange bolts",
    "Realign the belt",
    "Recalibrate the sensor",
    "Regrease the housing",
    "Inspect the seals",
    "Adjust the shielding gas flow",
    "Balance the tool holder",
    "Top up the defoamer",
];

const LINES: [&str; 4] = ["L1", "L2", "L3", "L4"];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// One knowledge-base hit as the search service returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: String,
    pub question: String,
    pub answers: String,
    pub upload_date: String,
    pub production_line: String,
}

impl Entry {
    pub fn envelope(&self) -> Value {
        json!({
            "id": self.id,
            "source": {
                "question": self.question,
                "answers": self.answers,
                "upload_date": self.upload_date,
                "production_line": self.production_line,
            }
        })
    }

    pub fn row(&self) -> Row {
        let latest = self.upload_date.rsplit(',').next().unwrap_or_default().trim();
        Row::new(RowId::new(self.id.as_str()))
            .with_field("question", self.question.as_str())
            .with_field("answers", self.answers.as_str())
            .with_field("upload_date", latest)
            .with_field("production_line", self.production_line.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct EntryFaker {
    rng: DeterministicRng,
    next_id: u64,
}

impl EntryFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1,
        }
    }

    pub fn entry(&mut self) -> Entry {
        let id = self.next_id;
        self.next_id += 1;

        let symptom = self.pick(&SYMPTOMS);
        let remedy = self.pick(&REMEDIES);
        let first = self.date();
        let upload_date = if self.rng.int_n(3) == 0 {
            let second = self.date();
            format!("{first},{second}")
        } else {
            first
        };

        Entry {
            id: id.to_string(),
            question: format!("{symptom} on line {}", self.pick(&LINES)),
            answers: format!("{remedy}.\nVerify after restart."),
            upload_date,
            production_line: self.pick(&LINES).to_owned(),
        }
    }

    pub fn entries(&mut self, count: usize) -> Vec<Entry> {
        (0..count).map(|_| self.entry()).collect()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn date(&mut self) -> String {
        let year = 2020 + self.rng.int_n(5);
        let month = 1 + self.rng.int_n(12);
        let day = 1 + self.rng.int_n(28);
        format!("{year:04}-{month:02}-{day:02}")
    }
}

/// Search response body wrapping `entries`.
pub fn search_body(entries: &[Entry]) -> Value {
    Value::Array(entries.iter().map(Entry::envelope).collect())
}

/// Three fixed rows used across UI tests.
pub fn sample_rows() -> Vec<Row> {
    vec![
        Row::new(RowId::new("1"))
            .with_field("question", "Pump vibration")
            .with_field("answers", "Replace bearing")
            .with_field("upload_date", "2023-03-01"),
        Row::new(RowId::new("2"))
            .with_field("question", "Motor overheating")
            .with_field("answers", "Clean the fan")
            .with_field("upload_date", "2023-01-15"),
        Row::new(RowId::new("3"))
            .with_field("question", "Valve leak")
            .with_field("answers", "Tighten bolts")
            .with_field("upload_date", "2022-11-30"),
    ]
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("kbsearch.db");
    Ok((dir, db_path))
}
