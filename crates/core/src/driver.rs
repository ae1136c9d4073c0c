//! Aggregation driver.
//!
//! Sources are processed one at a time in declaration order. A source that
//! cannot be fetched or decoded is reported and skipped; a record that cannot
//! be converted is logged and dropped. Only a missing source list stops the
//! run.

use chrono::{DateTime, Utc};

use crate::body::{self, RawBody};
use crate::error::FeedError;
use crate::flatten::{flatten, unwrap_envelope};
use crate::model::{AggregateDocument, RawRecord, VehicleRecord};
use crate::reconcile::{reconcile_record, record_label};

/// Retrieves the raw body behind a source URL.
pub trait Fetcher {
    /// Transport failures and non-success statuses are [`FeedError::Fetch`].
    fn fetch(&self, url: &str) -> Result<RawBody, FeedError>;
}

/// Stores the finished document.
pub trait Persist {
    fn write(&self, document: &AggregateDocument) -> Result<(), FeedError>;
}

/// Turns one raw record into a canonical vehicle.
pub type Converter = fn(&RawRecord) -> Result<VehicleRecord, FeedError>;

fn default_converter(record: &RawRecord) -> Result<VehicleRecord, FeedError> {
    Ok(reconcile_record(record))
}

/// What happened to a single source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    Collected {
        url: String,
        records: usize,
        dropped: usize,
    },
    Failed {
        url: String,
        error: FeedError,
    },
}

impl SourceOutcome {
    pub fn url(&self) -> &str {
        match self {
            SourceOutcome::Collected { url, .. } | SourceOutcome::Failed { url, .. } => url,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SourceOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub document: AggregateDocument,
    pub sources: Vec<SourceOutcome>,
    /// Set by [`run`] when the document could not be stored.
    pub persist_error: Option<FeedError>,
}

impl RunReport {
    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.is_failed()).count()
    }
}

pub struct Aggregator<'a> {
    fetcher: &'a dyn Fetcher,
    convert: Converter,
}

impl<'a> Aggregator<'a> {
    pub fn new(fetcher: &'a dyn Fetcher) -> Self {
        Self {
            fetcher,
            convert: default_converter,
        }
    }

    /// Replace the per-record conversion step.
    pub fn with_converter(mut self, convert: Converter) -> Self {
        self.convert = convert;
        self
    }

    /// Fetch, flatten and reconcile every source into one document.
    ///
    /// Fails only with [`FeedError::Config`] when `sources` is empty; in that
    /// case nothing is fetched.
    pub fn aggregate(
        &self,
        sources: &[String],
        generated_at: DateTime<Utc>,
    ) -> Result<RunReport, FeedError> {
        if sources.is_empty() {
            return Err(FeedError::Config("no feed sources configured".to_string()));
        }

        let mut vehicles = Vec::new();
        let mut outcomes = Vec::with_capacity(sources.len());
        for url in sources {
            let outcome = self.collect_source(url, &mut vehicles);
            if let SourceOutcome::Failed { error, .. } = &outcome {
                log::warn!("source skipped: {error}");
            }
            outcomes.push(outcome);
        }

        log::info!(
            "aggregated {} vehicles from {} source(s)",
            vehicles.len(),
            sources.len()
        );
        Ok(RunReport {
            document: AggregateDocument::new(vehicles, generated_at),
            sources: outcomes,
            persist_error: None,
        })
    }

    fn collect_source(&self, url: &str, vehicles: &mut Vec<VehicleRecord>) -> SourceOutcome {
        log::info!("fetching {url}");
        let decoded = self
            .fetcher
            .fetch(url)
            .and_then(|raw| body::decode(url, &raw));
        let value = match decoded {
            Ok(value) => value,
            Err(error) => {
                return SourceOutcome::Failed {
                    url: url.to_string(),
                    error,
                }
            }
        };

        let records = flatten(unwrap_envelope(&value));
        log::debug!("{url}: {} candidate record(s)", records.len());

        let mut collected = 0;
        let mut dropped = 0;
        for record in &records {
            match (self.convert)(record) {
                Ok(vehicle) => {
                    vehicles.push(vehicle);
                    collected += 1;
                }
                Err(e) => {
                    log::warn!("dropping record '{}' from {url}: {e}", record_label(record));
                    dropped += 1;
                }
            }
        }

        SourceOutcome::Collected {
            url: url.to_string(),
            records: collected,
            dropped,
        }
    }
}

/// Aggregate and persist. Never fails: a fatal error becomes a document
/// with `error` set, and a persist failure is logged and recorded on the
/// report.
pub fn run(
    fetcher: &dyn Fetcher,
    persist: &dyn Persist,
    sources: &[String],
    generated_at: DateTime<Utc>,
) -> RunReport {
    let mut report = match Aggregator::new(fetcher).aggregate(sources, generated_at) {
        Ok(report) => report,
        Err(e) => {
            log::error!("{e}");
            RunReport {
                document: AggregateDocument::failed(e.to_string(), generated_at),
                sources: Vec::new(),
                persist_error: None,
            }
        }
    };

    if let Err(e) = persist.write(&report.document) {
        log::error!("{e}");
        report.persist_error = Some(e);
    }
    report
}
