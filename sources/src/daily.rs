//! The daily-content workflow.

use std::sync::Arc;

use dailyread_store::{keys, ContentSourceStore, Settings};
use dailyread_types::{ContentSource, DailyArticle, PollingAlgorithm};
use dailyread_utils::spans::source_attempt_span;
use tracing::Instrument;

use crate::normalize::normalize_article;
use crate::selection::{effective_algorithm, fallback_order};
use crate::{SourceError, SourceFetcher};

/// The source seeded into an empty deployment.
pub const DEFAULT_SOURCE_NAME: &str = "qhsou-one";
pub const DEFAULT_SOURCE_URL: &str = "https://api.qhsou.com/api/one.php";

/// A successful fetch and what it took to get there.
#[derive(Clone, Debug)]
pub struct DailyOutcome {
    pub article: DailyArticle,
    pub source: ContentSource,
    /// Sources that failed before `source` answered.
    pub failed_attempts: usize,
}

pub struct DailyContentService {
    sources: Arc<dyn ContentSourceStore>,
    settings: Settings,
    fetcher: Arc<dyn SourceFetcher>,
    default_algorithm: PollingAlgorithm,
}

impl DailyContentService {
    pub fn new(
        sources: Arc<dyn ContentSourceStore>,
        settings: Settings,
        fetcher: Arc<dyn SourceFetcher>,
        default_algorithm: PollingAlgorithm,
    ) -> Self {
        Self {
            sources,
            settings,
            fetcher,
            default_algorithm,
        }
    }

    fn configured_algorithm(&self) -> Option<PollingAlgorithm> {
        match self.settings.get_parsed(keys::SOURCE_POLLING_ALGORITHM) {
            Ok(algorithm) => algorithm,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable polling algorithm setting");
                None
            }
        }
    }

    /// Try each enabled source once, in fallback order, until one yields
    /// a JSON object.
    ///
    /// A source is never retried within one call; its failure only moves
    /// the loop to the next source.
    pub async fn fetch_daily_content(&self) -> Result<DailyOutcome, SourceError> {
        let sources = self.sources.list_sources()?;
        let algorithm = effective_algorithm(&sources, self.configured_algorithm(), self.default_algorithm);
        let order = {
            let mut rng = rand::thread_rng();
            fallback_order(&sources, algorithm, &mut rng)
        };
        if order.is_empty() {
            return Err(SourceError::NoEnabledSources);
        }

        let attempts = order.len();
        for (failed_attempts, source) in order.into_iter().enumerate() {
            let span = source_attempt_span(source.id, &source.name);
            let result = async {
                let body = self.fetcher.fetch(&source).await?;
                normalize_article(&body)
            }
            .instrument(span)
            .await;

            match result {
                Ok(article) => {
                    tracing::debug!(source_id = source.id, %algorithm, failed_attempts, "daily content fetched");
                    return Ok(DailyOutcome {
                        article,
                        source,
                        failed_attempts,
                    });
                }
                Err(e) => {
                    tracing::warn!(source_id = source.id, name = %source.name, error = %e, "content source failed");
                }
            }
        }

        tracing::error!(attempts, "every content source failed");
        Err(SourceError::AllSourcesExhausted { attempts })
    }
}
