//! Test harness wiring fakes into a `Pipeline`.

#![allow(dead_code)]

use std::sync::Arc;

use pigeonhunter::config::{Config, ConfigStore, MemoryConfigStore};
use pigeonhunter::db::Database;
use pigeonhunter::email::{EmailTracker, LedgerStore};
use pigeonhunter::{PassReport, Pipeline};

use super::fakes::{FakeMailSource, ScriptedExtractor, ScriptedTranslator};

/// Isolated pipeline with in-memory collaborators.
pub struct TestHarness {
    pub source: FakeMailSource,
    pub translator: Arc<ScriptedTranslator>,
    pub extractor: Arc<ScriptedExtractor>,
    pub store: Arc<MemoryConfigStore>,
    pub tracker: EmailTracker,
    pub pipeline: Pipeline,
}

impl TestHarness {
    pub fn new(
        config: Config,
        source: FakeMailSource,
        translator: ScriptedTranslator,
        extractor: ScriptedExtractor,
    ) -> Self {
        let ledger: Arc<dyn LedgerStore> =
            Arc::new(Database::open_in_memory().expect("Failed to open in-memory ledger"));
        Self::with_ledger(config, source, translator, extractor, ledger)
    }

    pub fn with_ledger(
        config: Config,
        source: FakeMailSource,
        translator: ScriptedTranslator,
        extractor: ScriptedExtractor,
        ledger: Arc<dyn LedgerStore>,
    ) -> Self {
        let store = Arc::new(MemoryConfigStore::new());
        Self::build(config, source, translator, extractor, ledger, store.clone(), store)
    }

    /// Wires a harness whose config saves go to `config_store`.
    pub fn with_config_store(
        config: Config,
        source: FakeMailSource,
        translator: ScriptedTranslator,
        config_store: Arc<dyn ConfigStore>,
    ) -> Self {
        let ledger: Arc<dyn LedgerStore> =
            Arc::new(Database::open_in_memory().expect("Failed to open in-memory ledger"));
        Self::build(
            config,
            source,
            translator,
            ScriptedExtractor::new(),
            ledger,
            Arc::new(MemoryConfigStore::new()),
            config_store,
        )
    }

    fn build(
        config: Config,
        source: FakeMailSource,
        translator: ScriptedTranslator,
        extractor: ScriptedExtractor,
        ledger: Arc<dyn LedgerStore>,
        store: Arc<MemoryConfigStore>,
        config_store: Arc<dyn ConfigStore>,
    ) -> Self {
        let translator = Arc::new(translator);
        let extractor = Arc::new(extractor);
        let tracker = EmailTracker::with_store(ledger);

        let pipeline = Pipeline::new(
            config,
            tracker.clone(),
            translator.clone(),
            extractor.clone(),
            config_store,
        );

        Self {
            source,
            translator,
            extractor,
            store,
            tracker,
            pipeline,
        }
    }

    /// Runs one pass against the fake mail source.
    pub async fn run_pass(&mut self) -> PassReport {
        self.pipeline.run_pass(&mut self.source).await
    }

    pub fn is_processed(&self, message_id: &str) -> bool {
        self.tracker.is_processed(message_id)
    }

    pub fn ledger_size(&self) -> u64 {
        self.tracker
            .stats()
            .map(|stats| stats.total_processed)
            .unwrap_or(0)
    }
}
