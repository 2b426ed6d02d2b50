//! End-to-end run: topic → URLs → scraped text → assignment → documents.
//!
//! One [`Orchestrator`] owns one output directory and allows one run at a
//! time. Each run executes on its own tokio task; callers follow progress
//! through the [`PipelineState`] watch channel.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, info_span, warn};

use assigngen_crawler::Scraper;
use assigngen_discovery::{DuckDuckGoProvider, SearchProvider};
use assigngen_shared::{
    AppConfig, AssignGenError, OutputFormat, Query, Result, RunId, expand_home,
};

use crate::aggregator;
use crate::composer;
use crate::output::{self, ManifestFile, PersistedFile, RunManifest};
use crate::render::{self, DocumentRenderer};
use crate::state::{InvalidTransition, PipelineState, Stage};
use crate::translate::{self, GoogleTranslator, Translator};

/// Per-run settings resolved from [`AppConfig`] plus CLI overrides.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory every output file is written to.
    pub output_dir: PathBuf,
    /// Maximum number of URLs to scrape.
    pub result_count: usize,
    pub format: OutputFormat,
    /// File name marker of the source-language document.
    pub source_marker: String,
    /// File name marker of the translated document.
    pub target_marker: String,
    /// Language code passed to the translator.
    pub target_language: String,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            output_dir: expand_home(&config.defaults.output_dir),
            result_count: config.defaults.result_count,
            format: config.defaults.format,
            source_marker: config.translation.source_marker.clone(),
            target_marker: config.translation.target_marker.clone(),
            target_language: config.translation.target_language.clone(),
        }
    }
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: RunId,
    pub topic: String,
    /// Resolved URLs in resolution order.
    pub urls: Vec<String>,
    pub source_document: PersistedFile,
    pub translated_document: PersistedFile,
    pub url_index: PersistedFile,
    pub manifest: PersistedFile,
    /// URLs that contributed text to the corpus.
    pub pages_with_content: usize,
    pub scrape_failures: usize,
    /// Blocks that kept their source text because translation failed.
    pub translation_fallbacks: usize,
    pub corpus_chars: usize,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Runs the pipeline on a background task and publishes its state.
///
/// Cloning is cheap; clones share the run guard and the state channel.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    config: PipelineConfig,
    search: Arc<dyn SearchProvider>,
    scraper: Scraper,
    renderer: Arc<dyn DocumentRenderer>,
    translator: Arc<dyn Translator>,
    running: AtomicBool,
    state: watch::Sender<PipelineState>,
}

impl Orchestrator {
    pub fn new(
        config: PipelineConfig,
        search: Arc<dyn SearchProvider>,
        scraper: Scraper,
        renderer: Arc<dyn DocumentRenderer>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        let (state, _) = watch::channel(PipelineState::Idle);
        Self {
            inner: Arc::new(Inner {
                config,
                search,
                scraper,
                renderer,
                translator,
                running: AtomicBool::new(false),
                state,
            }),
        }
    }

    /// Wire up the DuckDuckGo, HTTP scraper and Google backends from config.
    pub fn from_config(app: &AppConfig, config: PipelineConfig) -> Result<Self> {
        let search = Arc::new(DuckDuckGoProvider::new(&app.search)?);
        let scraper = Scraper::new(&app.scrape)?;
        let renderer = render::renderer_for(config.format);
        let translator = Arc::new(GoogleTranslator::new(&app.translation)?);

        Ok(Self::new(config, search, scraper, renderer, translator))
    }

    /// Receive every state change from now on.
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> PipelineState {
        self.inner.state.borrow().clone()
    }

    /// Validate `topic` and spawn a run for it.
    ///
    /// Fails with `Validation` for a blank topic and `Busy` while another run
    /// is in flight; in both cases the state is left as it was. Must be
    /// called from within a tokio runtime.
    pub fn start(&self, topic: &str) -> Result<JoinHandle<Result<RunSummary>>> {
        let query = Query::new(topic)?;

        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(topic = %query, "run rejected, another run is in progress");
            return Err(AssignGenError::Busy);
        }

        let guard = RunGuard {
            inner: Arc::clone(&self.inner),
        };
        self.inner.transition(|s| s.begin(query.as_str()));

        let inner = Arc::clone(&self.inner);
        let run_id = RunId::new();
        let span = info_span!("run", %run_id, topic = %query);

        Ok(tokio::spawn(
            async move {
                let _guard = guard;
                let result = inner.execute(&query, run_id).await;

                match &result {
                    Ok(summary) => {
                        info!(
                            elapsed_ms = summary.elapsed.as_millis() as u64,
                            urls = summary.urls.len(),
                            "run completed"
                        );
                        inner.transition(|s| s.complete(summary.clone()));
                    }
                    Err(e) => {
                        error!(error = %e, "run failed");
                        inner.transition(|s| s.fail(e.to_string()));
                    }
                }

                result
            }
            .instrument(span),
        ))
    }

    /// Run the pipeline for `topic` and wait for it to finish.
    pub async fn run(&self, topic: &str) -> Result<RunSummary> {
        self.start(topic)?
            .await
            .map_err(|e| AssignGenError::Worker(e.to_string()))?
    }
}

impl Inner {
    /// Apply a transition and publish it; invalid transitions are logged and dropped.
    fn transition<F>(&self, next: F)
    where
        F: FnOnce(&PipelineState) -> std::result::Result<PipelineState, InvalidTransition>,
    {
        self.state.send_if_modified(|state| match next(state) {
            Ok(new) => {
                *state = new;
                true
            }
            Err(e) => {
                warn!(error = %e, "ignored state transition");
                false
            }
        });
    }

    fn advance(&self, stage: Stage) {
        self.transition(|s| s.advance(stage));
    }

    async fn execute(&self, query: &Query, run_id: RunId) -> Result<RunSummary> {
        let start = Instant::now();
        let dir = &self.config.output_dir;

        info!(output_dir = %dir.display(), "starting pipeline");

        // --- Resolve ---
        self.advance(Stage::Resolving);
        let urls =
            assigngen_discovery::resolve(self.search.as_ref(), query, self.config.result_count)
                .await?;
        if urls.is_empty() {
            return Err(AssignGenError::NoResults {
                query: query.to_string(),
            });
        }

        // --- Scrape ---
        let documents = self
            .scraper
            .scrape_all(&urls, |current, total| {
                self.advance(Stage::Scraping { current, total })
            })
            .await;
        let scrape_failures = documents.iter().filter(|d| d.failure.is_some()).count();
        let pages_with_content = documents.iter().filter(|d| !d.is_empty()).count();

        // --- Compose ---
        self.advance(Stage::Composing);
        let corpus = aggregator::aggregate(&documents);
        let assignment = composer::compose(query, &corpus);

        // --- Render source document ---
        self.advance(Stage::Rendering);
        let source = render::build_document(&assignment);
        let source_document = output::write_document(
            dir,
            query,
            &self.config.source_marker,
            self.renderer.as_ref(),
            &source,
        )?;

        // --- Translate ---
        let report = translate::translate_document(
            &source,
            self.translator.as_ref(),
            &self.config.target_language,
            |current, total| self.advance(Stage::Translating { current, total }),
        )
        .await;
        let translated_document = output::write_document(
            dir,
            query,
            &self.config.target_marker,
            self.renderer.as_ref(),
            &report.document,
        )?;

        // --- Persist run records ---
        self.advance(Stage::Persisting);
        let url_index = output::write_url_index(dir, &urls)?;
        let url_strings: Vec<String> = urls.iter().map(|u| u.to_string()).collect();

        let manifest = output::write_manifest(
            dir,
            &RunManifest {
                run_id: run_id.clone(),
                topic: query.to_string(),
                urls: url_strings.clone(),
                files: [&source_document, &translated_document, &url_index]
                    .into_iter()
                    .map(ManifestFile::from)
                    .collect(),
                scrape_failures,
                translation_fallbacks: report.fallbacks.len(),
                corpus_chars: corpus.char_len(),
                completed_at: Utc::now(),
            },
        )?;

        Ok(RunSummary {
            run_id,
            topic: query.to_string(),
            urls: url_strings,
            source_document,
            translated_document,
            url_index,
            manifest,
            pages_with_content,
            scrape_failures,
            translation_fallbacks: report.fallbacks.len(),
            corpus_chars: corpus.char_len(),
            elapsed: start.elapsed(),
        })
    }
}

/// Releases the single-run flag when the run task ends, however it ends.
struct RunGuard {
    inner: Arc<Inner>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        // Still Processing here means the task panicked or was aborted.
        if self.inner.state.borrow().is_processing() {
            self.inner
                .transition(|s| s.fail("pipeline worker stopped unexpectedly"));
        }
        self.inner.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assigngen_shared::{ScrapeConfig, TranslationFailure};
    use async_trait::async_trait;
    use tokio::sync::Notify;

    const ALPHA: &str = "Solar panels convert sunlight directly into electricity using photovoltaic cells made of silicon.";
    const GAMMA: &str = "Grid-scale batteries store surplus solar output so that it can be used after the sun has set.";

    struct FixedProvider(Vec<String>);

    #[async_trait]
    impl SearchProvider for FixedProvider {
        async fn search(&self, _query: &Query, _limit: usize) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct OfflineProvider;

    #[async_trait]
    impl SearchProvider for OfflineProvider {
        async fn search(&self, _query: &Query, _limit: usize) -> Result<Vec<String>> {
            Err(AssignGenError::search("offline"))
        }
        fn name(&self) -> &str {
            "offline"
        }
    }

    /// Blocks until notified, then returns nothing.
    struct GatedProvider(Arc<Notify>);

    #[async_trait]
    impl SearchProvider for GatedProvider {
        async fn search(&self, _query: &Query, _limit: usize) -> Result<Vec<String>> {
            self.0.notified().await;
            Ok(Vec::new())
        }
        fn name(&self) -> &str {
            "gated"
        }
    }

    /// Prefixes with the target code; refuses the "Applications" heading.
    struct StubTranslator;

    #[async_trait]
    impl Translator for StubTranslator {
        async fn translate(
            &self,
            text: &str,
            target: &str,
        ) -> std::result::Result<String, TranslationFailure> {
            if text == "Applications" {
                return Err(TranslationFailure::Status(503));
            }
            Ok(format!("{target}:{text}"))
        }
        fn name(&self) -> &str {
            "stub"
        }
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("assigngen-pipeline-test-{}", uuid::Uuid::now_v7()))
    }

    fn orchestrator(dir: PathBuf, search: Arc<dyn SearchProvider>) -> Orchestrator {
        let scraper = Scraper::new(&ScrapeConfig {
            allow_private_hosts: true,
            ..ScrapeConfig::default()
        })
        .unwrap();

        Orchestrator::new(
            PipelineConfig {
                output_dir: dir,
                result_count: 10,
                format: OutputFormat::Markdown,
                source_marker: "English".into(),
                target_marker: "Urdu".into(),
                target_language: "ur".into(),
            },
            search,
            scraper,
            render::renderer_for(OutputFormat::Markdown),
            Arc::new(StubTranslator),
        )
    }

    async fn mock_pages() -> wiremock::MockServer {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/a"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string(format!("<html><body><p>{ALPHA}</p></body></html>")),
            )
            .mount(&server)
            .await;
        wiremock::Mock::given(wiremock::matchers::path("/b"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;
        wiremock::Mock::given(wiremock::matchers::path("/c"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string(format!("<html><body><p>{GAMMA}</p></body></html>")),
            )
            .mount(&server)
            .await;

        server
    }

    #[tokio::test]
    async fn full_run_writes_all_outputs() {
        let server = mock_pages().await;
        let base = server.uri();
        let dir = temp_dir();
        let provider = FixedProvider(vec![
            format!("{base}/a"),
            format!("{base}/b"),
            format!("{base}/c"),
            format!("{base}/a"),
        ]);
        let orch = orchestrator(dir.clone(), Arc::new(provider));

        let summary = orch.run("Solar Power").await.unwrap();

        assert_eq!(
            summary.urls,
            vec![format!("{base}/a"), format!("{base}/b"), format!("{base}/c")]
        );
        assert_eq!(summary.scrape_failures, 1);
        assert_eq!(summary.pages_with_content, 2);
        assert_eq!(summary.translation_fallbacks, 1);
        assert_eq!(orch.state(), PipelineState::Completed(summary.clone()));

        let urls = std::fs::read_to_string(dir.join(output::URL_INDEX_FILE)).unwrap();
        assert_eq!(urls, format!("{base}/a\n{base}/b\n{base}/c\n"));

        let source = std::fs::read_to_string(dir.join("Solar Power_English.md")).unwrap();
        assert!(source.contains("## Introduction to the Topic\n\nSolar panels convert"));
        assert!(source.contains("## Core Concepts\n\nGrid-scale batteries"));

        let translated = std::fs::read_to_string(&summary.translated_document.path).unwrap();
        assert!(translated.contains("## ur:Introduction\n"));
        assert!(translated.contains("## Applications\n"));
        assert!(translated.contains(&format!("ur:{ALPHA}")));

        let manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&summary.manifest.path).unwrap())
                .unwrap();
        assert_eq!(manifest["topic"], "Solar Power");
        assert_eq!(manifest["files"].as_array().unwrap().len(), 3);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn zero_results_is_no_results_error() {
        let dir = temp_dir();
        let orch = orchestrator(dir.clone(), Arc::new(FixedProvider(vec!["not a url".into()])));

        let err = orch.run("Quantum Gravity").await.unwrap_err();

        assert!(matches!(err, AssignGenError::NoResults { .. }));
        assert_eq!(
            orch.state(),
            PipelineState::Errored {
                topic: "Quantum Gravity".into(),
                message: "no URLs found for \"Quantum Gravity\"".into(),
            }
        );
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn search_failure_is_surfaced() {
        let dir = temp_dir();
        let orch = orchestrator(dir.clone(), Arc::new(OfflineProvider));

        let err = orch.run("Volcanoes").await.unwrap_err();

        assert!(matches!(err, AssignGenError::Search(_)));
        assert_eq!(orch.state().label(), "Errored");
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn blank_topic_is_rejected_without_state_change() {
        let orch = orchestrator(temp_dir(), Arc::new(OfflineProvider));

        let err = orch.run("   ").await.unwrap_err();

        assert!(matches!(err, AssignGenError::Validation { .. }));
        assert_eq!(orch.state(), PipelineState::Idle);
    }

    #[tokio::test]
    async fn overlapping_run_is_busy() {
        let gate = Arc::new(Notify::new());
        let orch = orchestrator(temp_dir(), Arc::new(GatedProvider(Arc::clone(&gate))));
        let mut status = orch.subscribe();

        let first = orch.start("Rivers").unwrap();
        assert!(orch.state().is_processing());
        assert!(matches!(orch.start("Lakes"), Err(AssignGenError::Busy)));

        gate.notify_one();
        let result = first.await.unwrap();
        assert!(matches!(result, Err(AssignGenError::NoResults { .. })));

        status.changed().await.unwrap();
        assert_eq!(status.borrow().label(), "Errored");

        // The guard is released once the first run has finished.
        let second = orch.start("Lakes").unwrap();
        gate.notify_one();
        assert!(second.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn unwritable_output_dir_is_persist_error() {
        let server = mock_pages().await;
        let root = temp_dir();
        std::fs::create_dir_all(&root).unwrap();
        let blocker = root.join("occupied");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let provider = FixedProvider(vec![format!("{}/a", server.uri())]);
        let orch = orchestrator(blocker, Arc::new(provider));

        let err = orch.run("Tides").await.unwrap_err();

        assert!(matches!(err, AssignGenError::Persist { .. }));
        assert_eq!(orch.state().label(), "Errored");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn config_from_app_config() {
        let mut app = AppConfig::default();
        app.defaults.output_dir = "/tmp/assignments".into();
        app.defaults.format = OutputFormat::Html;

        let config = PipelineConfig::from(&app);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/assignments"));
        assert_eq!(config.format, OutputFormat::Html);
        assert_eq!(config.target_language, "ur");
        assert_eq!(config.target_marker, "Urdu");
    }
}
