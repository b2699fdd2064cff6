// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use kbsearch_api::Client;
use kbsearch_app::{
    CancelToken, ChunkSource, ColumnWidths, Preferences, Row, SearchRequest, SummaryRequest,
    SummaryUpdate,
};
use kbsearch_db::Store;
use kbsearch_tui::{InternalEvent, stream_summary};
use std::sync::mpsc::Sender;
use std::thread;

/// Live runtime: requests run on worker threads against the search service,
/// table settings go to the local store on the UI thread.
pub struct ApiRuntime<'a> {
    client: Client,
    store: &'a Store,
}

impl<'a> ApiRuntime<'a> {
    pub fn new(client: Client, store: &'a Store) -> Self {
        Self { client, store }
    }
}

impl kbsearch_tui::AppRuntime for ApiRuntime<'_> {
    fn search(&mut self, request: &SearchRequest) -> Result<Vec<Row>> {
        self.client.search(request)
    }

    fn open_summary(&mut self, request: &SummaryRequest) -> Result<Box<dyn ChunkSource + Send>> {
        Ok(Box::new(self.client.summarize(request)?))
    }

    fn save_preferences(&mut self, preferences: &Preferences) -> Result<()> {
        tracing::debug!(page_size = preferences.page_size.get(), "saving preferences");
        self.store.save_preferences(preferences)
    }

    fn save_column_widths(&mut self, widths: &ColumnWidths) -> Result<()> {
        tracing::debug!("saving column widths");
        self.store.save_column_widths(widths)
    }

    fn spawn_search(
        &mut self,
        request_id: u64,
        request: SearchRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name("kbsearch-search".to_owned())
            .spawn(move || {
                let result = client
                    .search(&request)
                    .map_err(|error| format!("{error:#}"));
                tracing::debug!(request_id, ok = result.is_ok(), "search finished");
                let _ = tx.send(InternalEvent::Search { request_id, result });
            })
            .context("spawn search worker")?;
        Ok(())
    }

    fn spawn_summary(
        &mut self,
        request_id: u64,
        request: SummaryRequest,
        cancel: CancelToken,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name("kbsearch-summary".to_owned())
            .spawn(move || match client.summarize(&request) {
                Ok(stream) => stream_summary(stream, request, &cancel, request_id, &tx),
                Err(error) => {
                    tracing::warn!(error = %format!("{error:#}"), "summary request failed");
                    let _ = tx.send(InternalEvent::Summary {
                        request_id,
                        update: SummaryUpdate::Failed(format!("{error:#}")),
                    });
                }
            })
            .context("spawn summary worker")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ApiRuntime;
    use anyhow::{Result, anyhow};
    use kbsearch_api::Client;
    use kbsearch_app::{
        CancelToken, ColumnWidths, PageSize, SearchRequest, SearchVariant, SummaryRequest,
        SummaryUpdate,
    };
    use kbsearch_db::Store;
    use kbsearch_testkit::{EntryFaker, search_body};
    use kbsearch_tui::{AppRuntime, InternalEvent};
    use std::sync::mpsc::{self, Receiver};
    use std::thread;
    use std::time::Duration;
    use tiny_http::{Response, Server};

    fn client_for(server: &Server) -> Result<Client> {
        let base = format!("http://{}", server.server_addr());
        Client::new(
            &format!("{base}/smart_search"),
            &format!("{base}/summarize"),
            Duration::from_secs(2),
            Duration::from_secs(5),
        )
    }

    fn recv(rx: &Receiver<InternalEvent>) -> Result<InternalEvent> {
        rx.recv_timeout(Duration::from_secs(5))
            .map_err(|error| anyhow!("worker event: {error}"))
    }

    #[test]
    fn spawned_search_delivers_rows() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let client = client_for(&server)?;
        let entries = EntryFaker::new(7).entries(4);
        let body = search_body(&entries).to_string();

        let handle = thread::spawn(move || {
            let request = server.recv().expect("request expected");
            request
                .respond(Response::from_string(body).with_status_code(200))
                .expect("response should succeed");
        });

        let store = Store::open_memory()?;
        store.bootstrap()?;
        let mut runtime = ApiRuntime::new(client, &store);
        let (tx, rx) = mpsc::channel();
        runtime.spawn_search(
            3,
            SearchRequest {
                search_words: "pump".to_owned(),
                manufacturing_process_number: String::new(),
            },
            tx,
        )?;

        match recv(&rx)? {
            InternalEvent::Search { request_id, result } => {
                assert_eq!(request_id, 3);
                let rows = result.map_err(|error| anyhow!(error))?;
                assert_eq!(rows.len(), 4);
                assert_eq!(rows[0].text("question"), entries[0].question);
            }
            other => panic!("expected search event, got {other:?}"),
        }

        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn spawned_summary_streams_to_finish() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let client = client_for(&server)?;

        let handle = thread::spawn(move || {
            let request = server.recv().expect("request expected");
            request
                .respond(Response::from_string("Check the bearing.").with_status_code(200))
                .expect("response should succeed");
        });

        let store = Store::open_memory()?;
        store.bootstrap()?;
        let mut runtime = ApiRuntime::new(client, &store);
        let (tx, rx) = mpsc::channel();
        runtime.spawn_summary(
            9,
            SummaryRequest {
                answers: vec!["Replace bearing".to_owned()],
                question: "pump".to_owned(),
            },
            CancelToken::new(),
            tx,
        )?;

        let last = loop {
            match recv(&rx)? {
                InternalEvent::Summary { request_id, update } => {
                    assert_eq!(request_id, 9);
                    if update.is_terminal() {
                        break update;
                    }
                }
                other => panic!("expected summary event, got {other:?}"),
            }
        };
        assert_eq!(last, SummaryUpdate::Finished("Check the bearing.".to_owned()));

        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn unreachable_summary_endpoint_reports_failure() -> Result<()> {
        let client = Client::new(
            "http://127.0.0.1:1/smart_search",
            "http://127.0.0.1:1/summarize",
            Duration::from_millis(200),
            Duration::from_millis(200),
        )?;
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let mut runtime = ApiRuntime::new(client, &store);
        let (tx, rx) = mpsc::channel();
        runtime.spawn_summary(
            1,
            SummaryRequest {
                answers: vec![String::new()],
                question: "q".to_owned(),
            },
            CancelToken::new(),
            tx,
        )?;

        match recv(&rx)? {
            InternalEvent::Summary {
                update: SummaryUpdate::Failed(message),
                ..
            } => assert!(message.contains("127.0.0.1:1/summarize"), "{message}"),
            other => panic!("expected summary failure, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn settings_are_written_to_store() -> Result<()> {
        let client = Client::new(
            "http://127.0.0.1:1/smart_search",
            "http://127.0.0.1:1/summarize",
            Duration::from_secs(1),
            Duration::from_secs(1),
        )?;
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let mut runtime = ApiRuntime::new(client, &store);

        let mut preferences = SearchVariant::Minimal.default_preferences();
        preferences.page_size = PageSize::Thirty;
        runtime.save_preferences(&preferences)?;

        let mut widths = ColumnWidths::default();
        widths.set("answers", 52);
        runtime.save_column_widths(&widths)?;

        assert_eq!(store.load_preferences(SearchVariant::Minimal)?, preferences);
        assert_eq!(store.load_column_widths(SearchVariant::Minimal)?, widths);
        Ok(())
    }
}
