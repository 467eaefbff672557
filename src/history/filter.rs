use chrono::{DateTime, Duration, Months, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::ai::TaskKind;
use crate::history::HistoryRecord;

/// Shown instead of a preview when a record has no items at all.
pub const EMPTY_PREVIEW: &str = "View full analysis";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// The last 7 days
    Week,
    /// The last calendar month
    Month,
}

impl Period {
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Period::Week => now - Duration::days(7),
            Period::Month => now
                .checked_sub_months(Months::new(1))
                .unwrap_or(now - Duration::days(30)),
        }
    }
}

pub fn preview_of(record: &HistoryRecord) -> &str {
    record.result.preview().unwrap_or(EMPTY_PREVIEW)
}

#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub kind: Option<TaskKind>,
    pub period: Option<Period>,
    pub query: Option<String>,
}

impl HistoryFilter {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.period.is_none() && self.normalized_query().is_none()
    }

    fn normalized_query(&self) -> Option<String> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, record: &HistoryRecord, now: DateTime<Utc>) -> bool {
        if let Some(kind) = self.kind {
            if record.task_kind != kind {
                return false;
            }
        }

        if let Some(period) = self.period {
            if record.created_at < period.cutoff(now) {
                return false;
            }
        }

        match self.normalized_query() {
            Some(query) => {
                record.input_text.to_lowercase().contains(&query)
                    || preview_of(record).to_lowercase().contains(&query)
            }
            None => true,
        }
    }

    /// Keeps matching records in their original order.
    pub fn apply(&self, records: Vec<HistoryRecord>, now: DateTime<Utc>) -> Vec<HistoryRecord> {
        records
            .into_iter()
            .filter(|record| self.matches(record, now))
            .collect()
    }
}
