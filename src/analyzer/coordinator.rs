//! Pipeline orchestration
//!
//! Runs the two analysis stages in order:
//!
//! 1. **Prerequisite**: `parse_url` and `fetch_page` run concurrently on a pool
//!    of two workers with fail-fast enabled
//! 2. **Analysis**: six extraction tasks run over an immutable snapshot of the
//!    stage-1 outputs, on a pool sized to the host's parallelism
//!
//! No analysis task starts until both prerequisite tasks have reported
//! success. Each stage's collector receives typed [`TaskOutput`] values and
//! writes them into the [`ResultAccumulator`]; tasks never touch the
//! accumulator themselves.

use crate::analyzer::extract::{
    classify_links, collect_links, count_headings, detect_html_version, extract_title,
    has_login_form, LinkInfo,
};
use crate::analyzer::fetcher::{HttpWebClient, WebClient};
use crate::analyzer::parser::Document;
use crate::analyzer::reachability::LinkProbe;
use crate::analyzer::{TaskLabel, TaskOutput};
use crate::config::{AnalyzerConfig, Config};
use crate::pool::{PoolConfig, PoolError, TaskPool, WorkItem};
use crate::state::{AnalysisResult, PipelineStage, ResultAccumulator};
use crate::url::parse_base_url;
use crate::AnalyzerError;
use reqwest::Method;
use std::num::NonZeroUsize;
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;
use url::Url;

type StageItem = WorkItem<TaskLabel, TaskOutput, AnalyzerError>;

/// Final state of one analysis run
#[derive(Debug)]
pub struct AnalysisOutcome {
    /// Everything collected, partially populated after a failure
    pub result: AnalysisResult,

    /// `Done` or `Failed`
    pub stage: PipelineStage,

    /// The stage that was running when the run failed
    pub failed_in: Option<PipelineStage>,

    /// The failure, wrapped with the label of the task that produced it
    pub error: Option<AnalyzerError>,
}

impl AnalysisOutcome {
    /// Returns true if every task of both stages succeeded
    pub fn is_success(&self) -> bool {
        self.stage.is_success()
    }

    /// Converts the outcome into a plain `Result`, discarding partial results on failure
    pub fn into_result(self) -> Result<AnalysisResult, AnalyzerError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.result),
        }
    }
}

/// Stage-1 outputs shared read-only by every analysis task
struct PageInputs {
    base_url: Url,
    document: Arc<Document>,
    links: OnceLock<Vec<LinkInfo>>,
}

impl PageInputs {
    /// Takes the snapshot once the prerequisite barrier has passed
    fn from_accumulator(accumulator: &ResultAccumulator) -> Result<Self, AnalyzerError> {
        Ok(Self {
            base_url: accumulator
                .base_url()
                .ok_or(AnalyzerError::MissingInput("base URL"))?,
            document: accumulator
                .document()
                .ok_or(AnalyzerError::MissingInput("parsed document"))?,
            links: OnceLock::new(),
        })
    }

    /// Links on the page, collected by whichever task asks first
    fn links(&self) -> &[LinkInfo] {
        self.links
            .get_or_init(|| collect_links(&self.document, &self.base_url))
    }
}

/// Drives the two-stage analysis of a single page
///
/// # Example
///
/// ```no_run
/// use page_analyzer::{Analyzer, Config};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> page_analyzer::Result<()> {
/// let analyzer = Analyzer::from_config(&Config::default())?;
/// let token = CancellationToken::new();
/// let result = analyzer.analyze(&token, "https://example.com").await.into_result()?;
/// println!("{} internal links", result.internal_links);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Analyzer {
    client: Arc<dyn WebClient>,
    config: AnalyzerConfig,
}

impl Analyzer {
    /// Creates an analyzer that performs requests through `client`
    pub fn new(client: Arc<dyn WebClient>, config: AnalyzerConfig) -> Self {
        Self { client, config }
    }

    /// Creates an analyzer with a reqwest client built from `config`
    pub fn from_config(config: &Config) -> Result<Self, AnalyzerError> {
        let client = HttpWebClient::new(&config.client)?;
        Ok(Self::new(Arc::new(client), config.analyzer.clone()))
    }

    /// Number of workers used for the analysis stage
    pub fn analysis_workers(&self) -> usize {
        match self.config.analysis_workers {
            Some(workers) if workers > 0 => workers,
            _ => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }

    fn pool_config(&self, workers: usize) -> PoolConfig {
        let config = PoolConfig::new(workers, true);
        match self.config.queue_capacity {
            Some(capacity) => config.with_queue_capacity(capacity),
            None => config,
        }
    }

    /// Analyzes the page at `url`
    ///
    /// Never panics and always returns the accumulated result. On failure the
    /// outcome carries the error and the stage it happened in; fields written
    /// before the failure, including the status code of a rejected fetch, are
    /// kept.
    ///
    /// # Arguments
    ///
    /// * `token` - Parent lifetime; cancelling it cancels every pool and probe of the run
    /// * `url` - The page to analyze
    pub async fn analyze(&self, token: &CancellationToken, url: &str) -> AnalysisOutcome {
        tracing::info!("Starting analysis of {}", url);
        let accumulator = ResultAccumulator::new();
        let mut stage = PipelineStage::Prerequisite;

        let prerequisites = self.prerequisite_tasks(url);
        if let Err(e) = self
            .run_stage(token, self.pool_config(2), prerequisites, &accumulator)
            .await
        {
            tracing::error!("Prerequisite stage failed for {}: {}", url, e);
            return fail(accumulator, stage, e);
        }

        advance(&mut stage, PipelineStage::Analysis);

        let inputs = match PageInputs::from_accumulator(&accumulator) {
            Ok(inputs) => Arc::new(inputs),
            Err(e) => {
                tracing::error!("Analysis of {} cannot start: {}", url, e);
                return fail(accumulator, stage, e);
            }
        };

        let workers = self.analysis_workers();
        tracing::debug!("Running analysis stage with {} workers", workers);
        let tasks = self.analysis_tasks(inputs);
        if let Err(e) = self
            .run_stage(token, self.pool_config(workers), tasks, &accumulator)
            .await
        {
            tracing::error!("Analysis stage failed for {}: {}", url, e);
            return fail(accumulator, stage, e);
        }

        advance(&mut stage, PipelineStage::Done);
        tracing::info!("Finished analysis of {}", url);

        AnalysisOutcome {
            result: accumulator.into_result(),
            stage,
            failed_in: None,
            error: None,
        }
    }

    fn prerequisite_tasks(&self, url: &str) -> Vec<StageItem> {
        let parse_input = url.to_string();
        let fetch_input = url.to_string();
        let client = self.client.clone();

        vec![
            WorkItem::new(TaskLabel::ParseUrl, move |_token| async move {
                parse_base_url(&parse_input)
                    .map(TaskOutput::BaseUrl)
                    .map_err(AnalyzerError::from)
            }),
            WorkItem::new(TaskLabel::FetchPage, move |token| async move {
                fetch_page(client.as_ref(), &token, &fetch_input).await
            }),
        ]
    }

    fn analysis_tasks(&self, inputs: Arc<PageInputs>) -> Vec<StageItem> {
        let probe = LinkProbe::new(self.client.clone(), self.config.probe_concurrency);

        let version = inputs.clone();
        let title = inputs.clone();
        let headings = inputs.clone();
        let counts = inputs.clone();
        let reachability = inputs.clone();
        let login = inputs;

        vec![
            WorkItem::new(TaskLabel::HtmlVersion, move |_token| async move {
                Ok(TaskOutput::HtmlVersion(detect_html_version(&version.document)))
            }),
            WorkItem::new(TaskLabel::Title, move |_token| async move {
                Ok(TaskOutput::Title(extract_title(&title.document)))
            }),
            WorkItem::new(TaskLabel::Headings, move |_token| async move {
                Ok(TaskOutput::Headings(count_headings(&headings.document)))
            }),
            WorkItem::new(TaskLabel::LinkCounts, move |_token| async move {
                Ok(TaskOutput::LinkCounts(classify_links(counts.links())))
            }),
            WorkItem::new(TaskLabel::LinkAccessibility, move |token| async move {
                probe
                    .count_inaccessible(&token, reachability.links())
                    .await
                    .map(TaskOutput::InaccessibleLinks)
            }),
            WorkItem::new(TaskLabel::LoginForm, move |_token| async move {
                Ok(TaskOutput::LoginForm(has_login_form(&login.document)))
            }),
        ]
    }

    /// Runs one stage to completion on its own pool
    ///
    /// Submission and collection run concurrently, so a stage never stalls on
    /// a full queue or results channel. The first task error is returned
    /// wrapped with its label; a fetch error's status code is recorded before
    /// the error is returned.
    async fn run_stage(
        &self,
        token: &CancellationToken,
        config: PoolConfig,
        items: Vec<StageItem>,
        accumulator: &ResultAccumulator,
    ) -> Result<(), AnalyzerError> {
        let expected = items.len();
        let mut pool = TaskPool::new(token, config);
        let handle = pool.handle();

        let feed = async move {
            for item in items {
                match handle.submit_item(item).await {
                    Ok(()) => {}
                    // The collector observes the cancellation that closed the pool
                    Err(PoolError::Closed { .. }) => break,
                    Err(e) => {
                        handle.stop();
                        return Err(AnalyzerError::from(e));
                    }
                }
            }
            Ok(())
        };

        let collect = async {
            let mut received = 0;
            while received < expected {
                let Some(result) = pool.next_result().await else {
                    return Err(AnalyzerError::Cancelled);
                };
                received += 1;

                match result.outcome {
                    Ok(output) => {
                        tracing::debug!("Recording output of task {}", result.label);
                        output.apply(accumulator);
                    }
                    Err(e) => {
                        if let Some(status) = e.status_code() {
                            accumulator.set_status_code(status);
                        }
                        return Err(AnalyzerError::task(result.label, e));
                    }
                }
            }
            Ok(())
        };

        let (fed, collected) = tokio::join!(feed, collect);
        pool.shutdown().await;

        fed.and(collected)
    }
}

/// Fetches the page and parses it; any status other than 200 is a failure
async fn fetch_page(
    client: &dyn WebClient,
    token: &CancellationToken,
    url: &str,
) -> Result<TaskOutput, AnalyzerError> {
    let response = client.fetch(token, url, Method::GET).await?;

    if response.status != 200 {
        return Err(AnalyzerError::Fetch {
            url: url.to_string(),
            status: Some(response.status),
            message: format!("unexpected status code {}", response.status),
        });
    }

    let document = Document::parse(&response.body).map_err(|message| AnalyzerError::Parse {
        url: url.to_string(),
        message,
    })?;

    tracing::debug!(
        "Fetched {} ({} bytes, {} nodes)",
        url,
        response.body.len(),
        document.len()
    );

    Ok(TaskOutput::Page {
        status: response.status,
        body: Arc::from(response.body),
        document: Arc::new(document),
    })
}

fn advance(stage: &mut PipelineStage, next: PipelineStage) {
    if !stage.can_transition_to(next) {
        tracing::error!("Invalid pipeline transition {} -> {}", stage, next);
    }
    tracing::debug!("Pipeline stage {} -> {}", stage, next);
    *stage = next;
}

fn fail(
    accumulator: ResultAccumulator,
    stage: PipelineStage,
    error: AnalyzerError,
) -> AnalysisOutcome {
    let mut current = stage;
    advance(&mut current, PipelineStage::Failed);
    AnalysisOutcome {
        result: accumulator.into_result(),
        stage: current,
        failed_in: Some(stage),
        error: Some(error),
    }
}
