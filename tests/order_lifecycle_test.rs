mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use common::TestDb;
use order_records::{
    commands::{
        orders::{CreateOrderCommand, DeleteOrderCommand, OrderDetailAttributes, UpdateOrderCommand},
        Command,
    },
    entities::{order, order_detail, OrderStatus},
    errors::ServiceError,
};
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

#[tokio::test]
async fn valid_order_is_saved_with_generated_fields() {
    let db = TestDb::new().await;
    let before = Utc::now();

    let saved = db
        .create(CreateOrderCommand::new("Jane Doe", "jane@example.com", dec!(25.50)))
        .await
        .order;

    assert_ne!(saved.id, Uuid::nil());
    assert_eq!(saved.status, OrderStatus::New);
    assert_eq!(saved.customer_name, "Jane Doe");
    assert_eq!(saved.total_price, dec!(25.50));
    assert!(saved.created_at >= before - chrono::Duration::seconds(1));
    assert!(saved.order_date >= before - chrono::Duration::seconds(1));

    let stored = order::Entity::find_by_id(saved.id)
        .one(db.pool.as_ref())
        .await
        .unwrap()
        .expect("order persisted");
    assert_eq!(stored.status, OrderStatus::New);
    assert_eq!(stored.customer_email, "jane@example.com");
}

#[tokio::test]
async fn invalid_order_reports_every_field_and_is_not_saved() {
    let db = TestDb::new().await;

    let result = CreateOrderCommand::new("", "bad", dec!(0))
        .execute(db.pool.clone())
        .await;

    let errors = assert_matches!(result, Err(ServiceError::InvalidRecord(errors)) => errors);
    let fields = errors.field_errors();
    assert_eq!(fields.len(), 3);
    assert!(fields.contains_key("customer_name"));
    assert_eq!(
        fields["customer_email"][0].message.as_deref(),
        Some("invalid email format")
    );
    assert_eq!(
        fields["total_price"][0].message.as_deref(),
        Some("must be greater than or equal to 0.01")
    );

    assert_eq!(order::Entity::find().count(db.pool.as_ref()).await.unwrap(), 0);
}

#[tokio::test]
async fn missing_price_is_rejected() {
    let db = TestDb::new().await;
    let command = CreateOrderCommand {
        customer_name: Some("Jane Doe".into()),
        customer_email: Some("jane@example.com".into()),
        ..Default::default()
    };

    let result = command.execute(db.pool.clone()).await;
    let errors = assert_matches!(result, Err(ServiceError::InvalidRecord(errors)) => errors);
    assert!(errors.field_errors().contains_key("total_price"));
}

#[tokio::test]
async fn supplied_status_and_dates_are_kept() {
    let db = TestDb::new().await;
    let placed = common::utc(2023, 12, 24, 9, 30, 0);
    let imported = common::utc(2024, 1, 2, 8, 0, 0);

    let saved = db
        .create(CreateOrderCommand {
            status: Some(OrderStatus::Paid),
            order_date: Some(placed),
            created_at: Some(imported),
            ..CreateOrderCommand::new("Jane Doe", "jane@example.com", dec!(10))
        })
        .await
        .order;

    assert_eq!(saved.status, OrderStatus::Paid);
    assert_eq!(saved.order_date, placed);
    assert_eq!(saved.created_at, imported);
}

#[tokio::test]
async fn any_status_can_follow_any_other() {
    let db = TestDb::new().await;
    let service = db.service();
    let id = db
        .create(CreateOrderCommand::new("Jane Doe", "jane@example.com", dec!(10)))
        .await
        .order
        .id;

    for status in [
        OrderStatus::Canceled,
        OrderStatus::New,
        OrderStatus::Paid,
        OrderStatus::Canceled,
        OrderStatus::Paid,
    ] {
        let updated = service.update_order_status(id, status).await.unwrap();
        assert_eq!(updated.order.status, status);
    }
}

#[tokio::test]
async fn update_validates_before_writing() {
    let db = TestDb::new().await;
    let saved = db
        .create(CreateOrderCommand::new("Jane Doe", "jane@example.com", dec!(10)))
        .await
        .order;

    let command = UpdateOrderCommand {
        customer_email: Some("not-an-email".into()),
        ..UpdateOrderCommand::new(saved.id)
    };
    assert_matches!(
        command.execute(db.pool.clone()).await,
        Err(ServiceError::InvalidRecord(_))
    );

    let stored = db.service().find_order(saved.id).await.unwrap();
    assert_eq!(stored.order.customer_email, "jane@example.com");

    let command = UpdateOrderCommand {
        total_price: Some(dec!(99.50)),
        ..UpdateOrderCommand::new(saved.id)
    };
    let updated = command.execute(db.pool.clone()).await.unwrap();
    assert_eq!(updated.order.total_price, dec!(99.50));
    assert_eq!(updated.order.created_at, saved.created_at);
    assert!(updated.order.updated_at.is_some());
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let db = TestDb::new().await;
    let missing = Uuid::new_v4();

    assert!(db.service().get_order(missing).await.unwrap().is_none());
    assert_matches!(
        db.service().update_order_status(missing, OrderStatus::Paid).await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        DeleteOrderCommand { order_id: missing }
            .execute(db.pool.clone())
            .await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn deleting_an_order_removes_its_details() {
    let db = TestDb::new().await;
    let keep = db
        .create(
            CreateOrderCommand::new("Other", "other@example.com", dec!(5))
                .with_details(vec![OrderDetailAttributes::new("Spare", 1, dec!(5))]),
        )
        .await;
    let doomed = db
        .create(
            CreateOrderCommand::new("Jane Doe", "jane@example.com", dec!(30)).with_details(vec![
                OrderDetailAttributes::new("Widget", 2, dec!(10)),
                OrderDetailAttributes::new("Gadget", 1, dec!(10)),
            ]),
        )
        .await;
    assert_eq!(doomed.order_details.len(), 2);

    let deleted = db.service().delete_order(doomed.order.id).await.unwrap();
    assert_eq!(deleted.id, doomed.order.id);
    assert_eq!(deleted.deleted_details, 2);

    assert!(db.service().get_order(doomed.order.id).await.unwrap().is_none());
    let remaining = order_detail::Entity::find()
        .all(db.pool.as_ref())
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].order_id, keep.order.id);
}
