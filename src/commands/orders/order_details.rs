//! Nested line-item input submitted alongside an order.
//!
//! Submitted entries are first turned into a list of [`DetailChange`]s against
//! the order's current details, then validated, then applied inside the
//! caller's transaction.

use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue, ConnectionTrait, EntityTrait, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{entities::order_detail, errors::ServiceError, validation};

/// One submitted line item. Without an `id` it describes a new detail; with
/// one it targets an existing detail of the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetailAttributes {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(rename = "_destroy", default)]
    pub destroy: bool,
}

impl OrderDetailAttributes {
    pub fn new(product_name: impl Into<String>, quantity: i32, unit_price: Decimal) -> Self {
        Self {
            product_name: Some(product_name.into()),
            quantity: Some(quantity),
            unit_price: Some(unit_price),
            ..Default::default()
        }
    }

    pub fn existing(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn destroyed(mut self) -> Self {
        self.destroy = true;
        self
    }

    /// True when every attribute other than `_destroy` is missing or blank.
    pub fn is_all_blank(&self) -> bool {
        self.id.is_none()
            && self
                .product_name
                .as_deref()
                .map_or(true, validation::is_blank)
            && self.quantity.is_none()
            && self.unit_price.is_none()
    }

    fn assign_to(&self, detail: &mut order_detail::ActiveModel) {
        if let Some(name) = &self.product_name {
            detail.product_name = Set(name.clone());
        }
        if let Some(quantity) = self.quantity {
            detail.quantity = Set(quantity);
        }
        if let Some(unit_price) = self.unit_price {
            detail.unit_price = Set(unit_price);
        }
    }
}

/// What a nested save does to one line item.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailChange {
    Create(order_detail::ActiveModel),
    Update(order_detail::ActiveModel),
    Destroy(Uuid),
}

/// Matches `submitted` entries against the order's `existing` details.
///
/// * no id, all blank: dropped
/// * no id, flagged `_destroy`: dropped
/// * no id: created
/// * known id, flagged `_destroy`: destroyed
/// * known id: updated with the submitted attributes
/// * unknown id: `NotFound`
///
/// Existing details that are not mentioned stay as they are.
pub fn plan_detail_changes(
    existing: &[order_detail::Model],
    submitted: &[OrderDetailAttributes],
) -> Result<Vec<DetailChange>, ServiceError> {
    let mut changes = Vec::with_capacity(submitted.len());

    for attributes in submitted {
        match attributes.id {
            None if attributes.destroy || attributes.is_all_blank() => {
                debug!("Skipping blank or discarded new order detail");
            }
            None => {
                let mut detail = <order_detail::ActiveModel as ActiveModelTrait>::default();
                attributes.assign_to(&mut detail);
                changes.push(DetailChange::Create(detail));
            }
            Some(id) => {
                let current = existing.iter().find(|detail| detail.id == id).ok_or_else(|| {
                    ServiceError::NotFound(format!("Order detail {} not found for this order", id))
                })?;

                if attributes.destroy {
                    changes.push(DetailChange::Destroy(id));
                } else {
                    let mut detail = current.clone().into_active_model();
                    attributes.assign_to(&mut detail);
                    changes.push(DetailChange::Update(detail));
                }
            }
        }
    }

    Ok(changes)
}

/// Adds the failures of every created or updated detail to the order's own
/// result. Detail failures are reported under `order_details`, indexed by
/// position among the validated entries.
pub fn validate_with_details(
    order: Result<(), ValidationErrors>,
    changes: &[DetailChange],
) -> Result<(), ValidationErrors> {
    // merge_all only picks up child errors already nested under the list key.
    let children: Vec<Result<(), ValidationErrors>> = changes
        .iter()
        .filter_map(|change| match change {
            DetailChange::Create(detail) | DetailChange::Update(detail) => Some(detail.validate()),
            DetailChange::Destroy(_) => None,
        })
        .map(|result| ValidationErrors::merge(Ok(()), "order_details", result))
        .collect();

    ValidationErrors::merge_all(order, "order_details", children)
}

/// Writes the planned changes for `order_id` through `conn`.
pub async fn apply_detail_changes<C>(
    conn: &C,
    order_id: Uuid,
    changes: Vec<DetailChange>,
) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    for change in changes {
        match change {
            DetailChange::Create(mut detail) => {
                detail.order_id = Set(order_id);
                detail.insert(conn).await.map_err(|e| {
                    error!(order_id = %order_id, "Failed to create order detail: {}", e);
                    ServiceError::db_error(e)
                })?;
            }
            DetailChange::Update(detail) => {
                if let ActiveValue::Unchanged(id) | ActiveValue::Set(id) = detail.id {
                    debug!(order_id = %order_id, detail_id = %id, "Updating order detail");
                }
                detail.update(conn).await.map_err(|e| {
                    error!(order_id = %order_id, "Failed to update order detail: {}", e);
                    ServiceError::db_error(e)
                })?;
            }
            DetailChange::Destroy(id) => {
                order_detail::Entity::delete_by_id(id)
                    .exec(conn)
                    .await
                    .map_err(|e| {
                        error!(order_id = %order_id, detail_id = %id, "Failed to delete order detail: {}", e);
                        ServiceError::db_error(e)
                    })?;
            }
        }
    }

    Ok(())
}
