//! Sequential orchestration: planner → searches → filter/enrich → report.

use std::sync::Arc;

use quillpipe_core::{
    ChunkStream, ContentFetcher, LlmClient, Result, SearchProvider, SearchQuery, SearchResult,
};

use crate::{filter, planner, report};

/// Results requested per planned topic.
pub const SEARCH_RESULTS_PER_TOPIC: usize = 5;

/// Stage progress, for the host transport to render however it likes.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    PlanningStarted,
    TopicsPlanned { topics: Vec<String> },
    SearchStarted { topic: String },
    SearchCompleted { topic: String, results: usize },
    FilterStarted { candidates: usize },
    FilterCompleted { selected: usize },
    ReportStarted,
}

impl PipelineEvent {
    /// Short stage label, stable across event payload changes.
    pub fn stage_name(&self) -> &'static str {
        match self {
            Self::PlanningStarted | Self::TopicsPlanned { .. } => "Search Planner",
            Self::SearchStarted { .. } | Self::SearchCompleted { .. } => "Search",
            Self::FilterStarted { .. } | Self::FilterCompleted { .. } => {
                "Result Extraction & Relevancy Filter"
            }
            Self::ReportStarted => "Report Generation",
        }
    }
}

pub type EventCallback = Arc<dyn Fn(&PipelineEvent) + Send + Sync>;

/// One research request, end to end. Stages run strictly sequentially; every
/// stage prefers a degraded-but-nonempty result over failing the request. The
/// returned stream is the one place a failure still propagates.
pub struct Pipeline {
    llm: Arc<dyn LlmClient>,
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn ContentFetcher>,
    on_event: Option<EventCallback>,
}

impl Pipeline {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn ContentFetcher>,
    ) -> Self {
        Self {
            llm,
            search,
            fetcher,
            on_event: None,
        }
    }

    pub fn with_events(mut self, on_event: EventCallback) -> Self {
        self.on_event = Some(on_event);
        self
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(cb) = &self.on_event {
            cb(&event);
        }
    }

    /// Run the pipeline for `query` and return the report chunk stream.
    ///
    /// Only two things fail here: missing configuration surfaced earlier by
    /// the backend constructors, and the final streaming call itself.
    pub async fn run(&self, query: &str) -> Result<ChunkStream> {
        self.emit(PipelineEvent::PlanningStarted);
        let topics = planner::plan_topics(self.llm.as_ref(), query).await;
        self.emit(PipelineEvent::TopicsPlanned {
            topics: topics.clone(),
        });

        let mut all_results = Vec::new();
        for topic in &topics {
            self.emit(PipelineEvent::SearchStarted {
                topic: topic.clone(),
            });
            let results = search_stage(self.search.as_ref(), topic).await;
            self.emit(PipelineEvent::SearchCompleted {
                topic: topic.clone(),
                results: results.len(),
            });
            all_results.extend(results);
        }

        self.emit(PipelineEvent::FilterStarted {
            candidates: all_results.len(),
        });
        let filtered =
            filter::filter_and_enrich(self.llm.as_ref(), self.fetcher.as_ref(), all_results, query)
                .await;
        self.emit(PipelineEvent::FilterCompleted {
            selected: filtered.len(),
        });

        self.emit(PipelineEvent::ReportStarted);
        report::generate_report(self.llm.as_ref(), query, &filtered).await
    }
}

/// One topic's search, degraded: a provider failure is logged (status and
/// body ride along in the error) and contributes an empty sequence.
pub async fn search_stage(provider: &dyn SearchProvider, topic: &str) -> Vec<SearchResult> {
    let q = SearchQuery {
        query: topic.to_string(),
        max_results: SEARCH_RESULTS_PER_TOPIC,
    };
    match provider.search(&q).await {
        Ok(results) => results,
        Err(e) => {
            tracing::warn!(provider = provider.name(), topic, error = %e, "search failed, continuing with no results for this topic");
            Vec::new()
        }
    }
}
