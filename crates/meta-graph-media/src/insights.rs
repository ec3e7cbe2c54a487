//! Account insights.

use serde_json::Value;

use meta_graph_core::{GraphError, Paged};

use crate::client::MediaClient;

/// Aggregation period for insight metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightPeriod {
    Day,
    Week,
    Days28,
    Lifetime,
}

impl InsightPeriod {
    /// Wire value of the period.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Days28 => "days_28",
            Self::Lifetime => "lifetime",
        }
    }
}

impl MediaClient {
    /// Fetch account-level insight metrics.
    ///
    /// Metric payloads pass through as JSON; the set of valid metric names
    /// is the platform's to define.
    pub async fn account_insights(
        &self,
        metrics: &[&str],
        period: InsightPeriod,
    ) -> Result<Vec<Value>, GraphError> {
        let metric = metrics.join(",");
        let page: Paged<Value> = self
            .http
            .get(
                &format!("/{}/insights", self.ig_user_id),
                &[("metric", metric.as_str()), ("period", period.as_str())],
            )
            .await?;
        Ok(page.data)
    }
}

#[cfg(test)]
#[path = "insights_tests.rs"]
mod tests;
