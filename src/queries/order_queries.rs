use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, QuerySelect,
    Select,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::Query;
use crate::{
    db::DatabaseAccess,
    entities::{order, order_detail},
    errors::ServiceError,
};

/// Calendar-date spellings accepted by the date filters.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%d %b %Y",
    "%b %d %Y",
    "%B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Leading numeric prefix: sign, digits with `_` separators, fraction, exponent.
static NUMERIC_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:_\d+)*(?:\.\d+(?:_\d+)*)?|\.\d+(?:_\d+)*)(?:[eE][+-]?\d+)?")
        .unwrap()
});

/// Optional search criteria. Every field is free text exactly as submitted;
/// blank values are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderFilter {
    pub email: Option<String>,
    pub min_total_price: Option<String>,
    pub max_total_price: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl OrderFilter {
    pub fn is_empty(&self) -> bool {
        [
            &self.email,
            &self.min_total_price,
            &self.max_total_price,
            &self.start_date,
            &self.end_date,
        ]
        .iter()
        .all(|value| present(value.as_deref()).is_none())
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Converts text to a number the lenient way: the longest leading numeric
/// prefix counts, anything else is zero. `"12.5abc"` is 12.5, `"abc"` is 0.
pub fn coerce_price(input: &str) -> Decimal {
    let trimmed = input.trim_start();
    let prefix = NUMERIC_PREFIX
        .find(trimmed)
        .map(|m| m.as_str().replace('_', ""))
        .unwrap_or_default();

    if let Ok(exact) = Decimal::from_str(&prefix) {
        return exact;
    }
    if let Ok(scientific) = Decimal::from_scientific(&prefix) {
        return scientific;
    }

    match prefix.parse::<f64>() {
        // Past Decimal's range the bound saturates instead of collapsing to zero.
        Ok(value) => Decimal::from_f64(value).unwrap_or(if value >= 1.0 {
            Decimal::MAX
        } else if value <= -1.0 {
            Decimal::MIN
        } else {
            Decimal::ZERO
        }),
        Err(_) => Decimal::ZERO,
    }
}

/// Reads a calendar date out of free text. Timestamps are reduced to their
/// UTC date. Returns `None` when nothing matches.
pub fn parse_filter_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
    {
        return Some(date);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(input) {
        return Some(timestamp.with_timezone(&Utc).date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(|naive| naive.date())
}

/// 00:00:00 UTC on `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Upper bound for an end-date filter: one minute before the next midnight.
/// Records created during the last minute of the day fall outside it.
pub fn end_of_day_bound(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::minutes(1)
}

/// Search scopes over orders. Each one leaves the query untouched when its
/// input is blank, so they compose in any order.
pub trait OrderScopes: Sized {
    fn filter_by_email(self, email: Option<&str>) -> Self;
    fn filter_by_min_total_price(self, min: Option<&str>) -> Self;
    fn filter_by_max_total_price(self, max: Option<&str>) -> Self;
    fn filter_by_start_date(self, start: Option<&str>) -> Self;
    fn filter_by_end_date(self, end: Option<&str>) -> Self;
}

impl OrderScopes for Select<order::Entity> {
    fn filter_by_email(self, email: Option<&str>) -> Self {
        match present(email) {
            Some(email) => self.filter(order::Column::CustomerEmail.eq(email)),
            None => self,
        }
    }

    fn filter_by_min_total_price(self, min: Option<&str>) -> Self {
        match present(min) {
            Some(min) => self.filter(order::Column::TotalPrice.gte(coerce_price(min))),
            None => self,
        }
    }

    fn filter_by_max_total_price(self, max: Option<&str>) -> Self {
        match present(max) {
            Some(max) => self.filter(order::Column::TotalPrice.lte(coerce_price(max))),
            None => self,
        }
    }

    fn filter_by_start_date(self, start: Option<&str>) -> Self {
        let Some(raw) = present(start) else {
            return self;
        };
        match parse_filter_date(raw) {
            Some(date) => self.filter(order::Column::CreatedAt.gte(start_of_day(date))),
            None => {
                debug!(start_date = raw, "Ignoring unparseable start date");
                self
            }
        }
    }

    fn filter_by_end_date(self, end: Option<&str>) -> Self {
        let Some(raw) = present(end) else {
            return self;
        };
        match parse_filter_date(raw) {
            Some(date) => self.filter(order::Column::CreatedAt.lte(end_of_day_bound(date))),
            None => {
                debug!(end_date = raw, "Ignoring unparseable end date");
                self
            }
        }
    }
}

/// Narrows `base` by every criterion present in `filter`.
pub fn build_filtered_query(
    base: Select<order::Entity>,
    filter: &OrderFilter,
) -> Select<order::Entity> {
    base.filter_by_email(filter.email.as_deref())
        .filter_by_min_total_price(filter.min_total_price.as_deref())
        .filter_by_max_total_price(filter.max_total_price.as_deref())
        .filter_by_start_date(filter.start_date.as_deref())
        .filter_by_end_date(filter.end_date.as_deref())
}

/// An order together with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithDetails {
    #[serde(flatten)]
    pub order: order::Model,
    pub order_details: Vec<order_detail::Model>,
}

/// Loads the details of `order`, oldest first.
pub(crate) async fn load_with_details<C>(
    conn: &C,
    order: order::Model,
) -> Result<OrderWithDetails, ServiceError>
where
    C: ConnectionTrait,
{
    let order_details = order
        .find_related(order_detail::Entity)
        .order_by_asc(order_detail::Column::CreatedAt)
        .order_by_asc(order_detail::Column::Id)
        .all(conn)
        .await?;

    Ok(OrderWithDetails {
        order,
        order_details,
    })
}

/// Struct to get a specific order, with its details, by ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetOrderQuery {
    pub order_id: Uuid,
}

#[async_trait]
impl Query for GetOrderQuery {
    type Result = Option<OrderWithDetails>;

    #[instrument(skip(self, db), fields(order_id = %self.order_id))]
    async fn execute(&self, db: &DatabaseAccess) -> Result<Self::Result, ServiceError> {
        debug!("Executing GetOrderQuery");
        let pool = db.get_pool();

        match order::Entity::find_by_id(self.order_id).one(pool).await? {
            Some(order) => Ok(Some(load_with_details(pool, order).await?)),
            None => Ok(None),
        }
    }
}

/// Filtered search, newest first, with optional limit/offset.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SearchOrdersQuery {
    #[serde(default)]
    pub filter: OrderFilter,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SearchOrdersQuery {
    pub fn new(filter: OrderFilter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn page(mut self, limit: u64, offset: u64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    fn select(&self) -> Select<order::Entity> {
        build_filtered_query(order::Entity::find(), &self.filter)
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .limit(self.limit)
            .offset(self.offset)
    }
}

#[async_trait]
impl Query for SearchOrdersQuery {
    type Result = Vec<order::Model>;

    #[instrument(
        skip(self, db),
        fields(
            email = ?self.filter.email,
            min_total_price = ?self.filter.min_total_price,
            max_total_price = ?self.filter.max_total_price,
            start_date = ?self.filter.start_date,
            end_date = ?self.filter.end_date,
        )
    )]
    async fn execute(&self, db: &DatabaseAccess) -> Result<Self::Result, ServiceError> {
        debug!("Executing SearchOrdersQuery");
        let orders = self.select().all(db.get_pool()).await?;
        debug!(count = orders.len(), "Search finished");
        Ok(orders)
    }
}
