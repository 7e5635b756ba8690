use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::validation;

/// Order status, stored as its integer code.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum OrderStatus {
    #[sea_orm(num_value = 0)]
    New,
    #[sea_orm(num_value = 1)]
    Paid,
    #[sea_orm(num_value = 2)]
    Canceled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::New
    }
}

/// The `orders` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "String(StringLen::N(200))")]
    pub customer_name: String,

    pub customer_email: String,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_price: Decimal,

    pub status: OrderStatus,

    /// When the customer placed the order; defaults to construction time.
    pub order_date: DateTime<Utc>,

    /// Insertion time, assigned by the storage layer. Date-range searches use this column.
    pub created_at: DateTime<Utc>,

    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_detail::Entity")]
    OrderDetails,
}

impl Related<super::order_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderDetails.def()
    }
}

fn current<V>(value: &ActiveValue<V>) -> Option<&V>
where
    V: Into<sea_orm::Value>,
{
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Some(v),
        ActiveValue::NotSet => None,
    }
}

impl ActiveModel {
    /// True until the storage layer has assigned an id.
    pub fn is_new_record(&self) -> bool {
        matches!(self.id, ActiveValue::NotSet)
    }

    /// Fills `order_date` and `status` on a record that has not been persisted yet.
    ///
    /// Values that are already present are never overwritten, so calling this
    /// repeatedly has the same effect as calling it once.
    pub fn apply_defaults(&mut self) {
        if !self.is_new_record() {
            return;
        }
        if let ActiveValue::NotSet = self.order_date {
            self.order_date = Set(Utc::now());
        }
        if let ActiveValue::NotSet = self.status {
            self.status = Set(OrderStatus::New);
        }
    }
}

impl Validate for ActiveModel {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::collect(
            &mut errors,
            "customer_name",
            validation::validate_customer_name(current(&self.customer_name).map(String::as_str)),
        );
        validation::collect(
            &mut errors,
            "customer_email",
            validation::validate_customer_email(current(&self.customer_email).map(String::as_str)),
        );
        validation::collect(
            &mut errors,
            "total_price",
            validation::validate_total_price(current(&self.total_price)),
        );
        validation::into_result(errors)
    }
}

impl Validate for Model {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::collect(
            &mut errors,
            "customer_name",
            validation::validate_customer_name(Some(self.customer_name.as_str())),
        );
        validation::collect(
            &mut errors,
            "customer_email",
            validation::validate_customer_email(Some(self.customer_email.as_str())),
        );
        validation::collect(
            &mut errors,
            "total_price",
            validation::validate_total_price(Some(&self.total_price)),
        );
        validation::into_result(errors)
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// A freshly constructed, in-memory order.
    fn new() -> Self {
        let mut active_model = <Self as ActiveModelTrait>::default();
        active_model.apply_defaults();
        active_model
    }

    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            active_model.apply_defaults();
            if active_model.is_new_record() {
                active_model.id = Set(Uuid::new_v4());
            }
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
        }

        active_model.updated_at = Set(Some(now));

        if let Err(err) = active_model.validate() {
            return Err(DbErr::Custom(format!("Validation error: {}", err)));
        }

        Ok(active_model)
    }
}
