//! Page and post insights.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use meta_graph_core::{GraphError, Paged};

use crate::client::PagesClient;

/// Aggregation period for page metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePeriod {
    Day,
    Week,
    Days28,
}

impl PagePeriod {
    /// Wire value of the period.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Days28 => "days_28",
        }
    }
}

/// One metric series from an insights query.
#[derive(Debug, Clone, Deserialize)]
pub struct Insight {
    pub name: String,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub values: Vec<InsightValue>,
}

/// One data point of a metric series.
#[derive(Debug, Clone, Deserialize)]
pub struct InsightValue {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub end_time: Option<String>,
}

impl PagesClient {
    /// Fetch page-level insight metrics over an optional time range.
    ///
    /// `since`/`until` are sent as unix seconds, matching the wire contract.
    pub async fn page_insights(
        &self,
        metrics: &[&str],
        period: PagePeriod,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Insight>, GraphError> {
        let metric = metrics.join(",");
        let since = since.map(|at| at.timestamp().to_string());
        let until = until.map(|at| at.timestamp().to_string());

        let mut params: Vec<(&str, &str)> = vec![
            ("metric", metric.as_str()),
            ("period", period.as_str()),
        ];
        if let Some(since) = since.as_deref() {
            params.push(("since", since));
        }
        if let Some(until) = until.as_deref() {
            params.push(("until", until));
        }

        let page: Paged<Insight> = self
            .http
            .get(&format!("/{}/insights", self.page_id), &params)
            .await?;
        Ok(page.data)
    }

    /// Fetch insight metrics for a single post.
    pub async fn post_insights(
        &self,
        post_id: &str,
        metrics: &[&str],
    ) -> Result<Vec<Insight>, GraphError> {
        let metric = metrics.join(",");
        let page: Paged<Insight> = self
            .http
            .get(
                &format!("/{post_id}/insights"),
                &[("metric", metric.as_str())],
            )
            .await?;
        Ok(page.data)
    }
}

#[cfg(test)]
#[path = "insights_tests.rs"]
mod tests;
