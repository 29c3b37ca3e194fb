//! Query parameters accepted by list endpoints.
//!
//! `ids` cannot be combined with ordering or filtering parameters, so
//! [`ListParams`] is either an id lookup or a filter, never both.
//!
//! ```
//! use billow_core::{ListParams, Order, SortField};
//!
//! let params = ListParams::filtered()
//!     .limit(50)
//!     .sort(SortField::UpdatedAt)
//!     .order(Order::Asc)
//!     .state("active");
//! let query = billow_core::to_query_string(&params).expect("serialize");
//! assert_eq!(query, "limit=50&order=asc&sort=updated_at&state=active");
//! ```

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// Largest page the service returns.
pub const MAX_LIMIT: u32 = 200;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    /// Oldest first.
    Asc,
    /// Newest first.
    ///
    /// With [`SortField::UpdatedAt`], records updated during iteration can
    /// move behind the cursor and be skipped.
    Desc,
}

/// Sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Creation time.
    CreatedAt,
    /// Last update time; the only sort with a stable cursor when ascending.
    UpdatedAt,
}

/// Parameters of a list call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ListParams {
    /// Fetch these IDs only; a single, non-cursored page.
    Ids(IdsParam),
    /// Ordering and filtering.
    Filtered(ListFilter),
}

/// The `ids` parameter, serialized comma-separated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdsParam {
    ids: Vec<String>,
}

impl IdsParam {
    /// The requested IDs.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

impl Serialize for IdsParam {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("IdsParam", 1)?;
        state.serialize_field("ids", &self.ids.join(","))?;
        state.end()
    }
}

impl Default for ListParams {
    fn default() -> Self {
        Self::Filtered(ListFilter::default())
    }
}

impl ListParams {
    /// Look up records by ID. Unknown IDs are silently dropped by the service.
    #[must_use]
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Ids(IdsParam {
            ids: ids.into_iter().map(Into::into).collect(),
        })
    }

    /// Start an ordering/filtering parameter set.
    #[must_use]
    pub fn filtered() -> ListFilter {
        ListFilter::default()
    }
}

impl From<ListFilter> for ListParams {
    fn from(filter: ListFilter) -> Self {
        Self::Filtered(filter)
    }
}

/// Ordering and filtering parameters.
///
/// Resource-specific filters are passed through verbatim; the service
/// ignores the ones a resource does not support.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ListFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<Order>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<SortField>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_time"
    )]
    begin_time: Option<DateTime<Utc>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_time"
    )]
    end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subscriber: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    past_due: Option<bool>,
}

#[allow(clippy::ref_option)]
fn serialize_time<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(time) => serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Secs, true)),
        None => serializer.serialize_none(),
    }
}

impl ListFilter {
    /// Records per page, clamped to `1..=200`.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit.clamp(1, MAX_LIMIT));
        self
    }

    /// Sort direction.
    #[must_use]
    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    /// Sort field.
    #[must_use]
    pub fn sort(mut self, sort: SortField) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Lower time bound for the sort field.
    #[must_use]
    pub fn begin_time(mut self, time: DateTime<Utc>) -> Self {
        self.begin_time = Some(time);
        self
    }

    /// Lower time bound given without a zone, taken as UTC.
    #[must_use]
    pub fn begin_time_naive(self, time: NaiveDateTime) -> Self {
        self.begin_time(time.and_utc())
    }

    /// Upper time bound for the sort field.
    #[must_use]
    pub fn end_time(mut self, time: DateTime<Utc>) -> Self {
        self.end_time = Some(time);
        self
    }

    /// Upper time bound given without a zone, taken as UTC.
    #[must_use]
    pub fn end_time_naive(self, time: NaiveDateTime) -> Self {
        self.end_time(time.and_utc())
    }

    /// Filter by state (e.g. `active`, `past_due`).
    #[must_use]
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Filter by type (e.g. `charge`, `credit`, `purchase`).
    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Filter transactions by success.
    #[must_use]
    pub fn success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    /// Filter accounts by subscription state (`active`, `canceled`, `future`).
    #[must_use]
    pub fn subscriber(mut self, subscriber: impl Into<String>) -> Self {
        self.subscriber = Some(subscriber.into());
        self
    }

    /// Filter accounts with a past-due invoice.
    #[must_use]
    pub fn past_due(mut self, past_due: bool) -> Self {
        self.past_due = Some(past_due);
        self
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;
    use chrono::{NaiveDate, TimeZone};

    use super::*;
    use crate::to_query_string;

    #[test]
    fn ids_are_comma_joined() {
        let query = to_query_string(&ListParams::ids(["h1at4d57xlmy", "gyqgg0d3v9n1"]))
            .expect("serialize");
        check!(query == "ids=h1at4d57xlmy%2Cgyqgg0d3v9n1");
    }

    #[test]
    fn default_params_are_empty() {
        check!(to_query_string(&ListParams::default()).expect("serialize").is_empty());
    }

    #[test]
    fn limit_is_clamped() {
        let query = |limit| {
            to_query_string(&ListParams::filtered().limit(limit)).expect("serialize")
        };
        check!(query(0) == "limit=1");
        check!(query(500) == "limit=200");
        check!(query(37) == "limit=37");
    }

    #[test]
    fn times_are_utc_iso8601() {
        let begin = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().expect("valid");
        let end = NaiveDate::from_ymd_opt(2024, 3, 31)
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .expect("valid");

        let filter = ListParams::filtered().begin_time(begin).end_time_naive(end);
        let pairs = crate::to_query_pairs(&filter).expect("serialize");

        check!(
            pairs
                == vec![
                    ("begin_time".to_string(), "2024-03-01T12:00:00Z".to_string()),
                    ("end_time".to_string(), "2024-03-31T23:59:59Z".to_string()),
                ]
        );
    }

    #[test]
    fn resource_filters() {
        let filter = ListParams::filtered()
            .kind("charge")
            .success(false)
            .subscriber("active")
            .past_due(true);
        let query = to_query_string(&ListParams::from(filter)).expect("serialize");
        check!(query == "type=charge&success=false&subscriber=active&past_due=true");
    }

    #[test]
    fn descending_sort_serializes() {
        let query = to_query_string(
            &ListParams::filtered()
                .sort(SortField::CreatedAt)
                .order(Order::Desc),
        )
        .expect("serialize");
        check!(query == "order=desc&sort=created_at");
    }
}
