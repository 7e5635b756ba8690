mod common;

use assert_matches::assert_matches;
use common::TestDb;
use order_records::{
    commands::{
        orders::{CreateOrderCommand, OrderDetailAttributes, UpdateOrderCommand},
        Command,
    },
    entities::{order, order_detail},
    errors::ServiceError,
};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DbErr, EntityTrait, PaginatorTrait, Set};
use uuid::Uuid;
use validator::ValidationErrorsKind;

fn widget_order() -> CreateOrderCommand {
    CreateOrderCommand::new("Jane Doe", "jane@example.com", dec!(30)).with_details(vec![
        OrderDetailAttributes::new("Widget", 2, dec!(10)),
        OrderDetailAttributes::new("Gadget", 1, dec!(10)),
    ])
}

#[tokio::test]
async fn blank_and_discarded_new_details_are_skipped() {
    let db = TestDb::new().await;

    let saved = db
        .create(
            CreateOrderCommand::new("Jane Doe", "jane@example.com", dec!(10)).with_details(vec![
                OrderDetailAttributes::new("Widget", 1, dec!(10)),
                OrderDetailAttributes::default(),
                OrderDetailAttributes {
                    product_name: Some("   ".into()),
                    ..Default::default()
                },
                OrderDetailAttributes::new("Never", 1, dec!(1)).destroyed(),
            ]),
        )
        .await;

    assert_eq!(saved.order_details.len(), 1);
    assert_eq!(saved.order_details[0].product_name, "Widget");
    assert_eq!(saved.order_details[0].order_id, saved.order.id);
}

#[tokio::test]
async fn update_creates_changes_and_destroys_in_one_save() {
    let db = TestDb::new().await;
    let saved = db.create(widget_order()).await;
    let widget = saved
        .order_details
        .iter()
        .find(|d| d.product_name == "Widget")
        .unwrap()
        .clone();
    let gadget = saved
        .order_details
        .iter()
        .find(|d| d.product_name == "Gadget")
        .unwrap()
        .clone();

    let updated = UpdateOrderCommand {
        order_details: vec![
            OrderDetailAttributes {
                quantity: Some(5),
                ..OrderDetailAttributes::existing(widget.id)
            },
            OrderDetailAttributes::existing(gadget.id).destroyed(),
            OrderDetailAttributes::new("Gizmo", 3, dec!(2.50)),
        ],
        ..UpdateOrderCommand::new(saved.order.id)
    }
    .execute(db.pool.clone())
    .await
    .unwrap();

    assert_eq!(updated.order_details.len(), 2);
    let widget_now = updated
        .order_details
        .iter()
        .find(|d| d.id == widget.id)
        .expect("widget kept");
    assert_eq!(widget_now.quantity, 5);
    assert_eq!(widget_now.product_name, "Widget");
    assert!(updated.order_details.iter().all(|d| d.id != gadget.id));
    assert!(updated
        .order_details
        .iter()
        .any(|d| d.product_name == "Gizmo" && d.quantity == 3));
}

#[tokio::test]
async fn unmentioned_details_are_left_alone() {
    let db = TestDb::new().await;
    let saved = db.create(widget_order()).await;

    let updated = UpdateOrderCommand {
        customer_name: Some("Jane Smith".into()),
        ..UpdateOrderCommand::new(saved.order.id)
    }
    .execute(db.pool.clone())
    .await
    .unwrap();

    assert_eq!(updated.order.customer_name, "Jane Smith");
    let mut before: Vec<Uuid> = saved.order_details.iter().map(|d| d.id).collect();
    let mut after: Vec<Uuid> = updated.order_details.iter().map(|d| d.id).collect();
    before.sort();
    after.sort();
    assert_eq!(before, after);
}

#[tokio::test]
async fn detail_of_another_order_is_not_found_and_nothing_changes() {
    let db = TestDb::new().await;
    let mine = db.create(widget_order()).await;
    let theirs = db.create(widget_order()).await;

    let result = UpdateOrderCommand {
        total_price: Some(dec!(1)),
        order_details: vec![OrderDetailAttributes::existing(theirs.order_details[0].id).destroyed()],
        ..UpdateOrderCommand::new(mine.order.id)
    }
    .execute(db.pool.clone())
    .await;

    assert_matches!(result, Err(ServiceError::NotFound(_)));

    let stored = db.service().find_order(mine.order.id).await.unwrap();
    assert_eq!(stored.order.total_price, dec!(30));
    assert_eq!(
        order_detail::Entity::find().count(db.pool.as_ref()).await.unwrap(),
        4
    );
}

#[tokio::test]
async fn invalid_detail_blocks_the_whole_save() {
    let db = TestDb::new().await;

    let result = CreateOrderCommand::new("Jane Doe", "jane@example.com", dec!(10))
        .with_details(vec![
            OrderDetailAttributes::new("Widget", 1, dec!(10)),
            OrderDetailAttributes::new("", 0, dec!(-5)),
        ])
        .execute(db.pool.clone())
        .await;

    let errors = assert_matches!(result, Err(ServiceError::InvalidRecord(errors)) => errors);
    assert_matches!(
        errors.errors().get("order_details"),
        Some(ValidationErrorsKind::List(entries)) => {
            assert!(!entries.contains_key(&0));
            let fields = entries[&1].field_errors();
            assert!(fields.contains_key("product_name"));
            assert!(fields.contains_key("quantity"));
            assert!(fields.contains_key("unit_price"));
        }
    );
    assert_eq!(order::Entity::find().count(db.pool.as_ref()).await.unwrap(), 0);
    assert_eq!(
        order_detail::Entity::find().count(db.pool.as_ref()).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn invalid_detail_change_blocks_the_update() {
    let db = TestDb::new().await;
    let saved = db.create(widget_order()).await;
    let widget = saved
        .order_details
        .iter()
        .find(|d| d.product_name == "Widget")
        .unwrap()
        .clone();

    let result = UpdateOrderCommand {
        customer_name: Some("Jane Smith".into()),
        order_details: vec![OrderDetailAttributes {
            quantity: Some(0),
            ..OrderDetailAttributes::existing(widget.id)
        }],
        ..UpdateOrderCommand::new(saved.order.id)
    }
    .execute(db.pool.clone())
    .await;

    let errors = assert_matches!(result, Err(ServiceError::InvalidRecord(errors)) => errors);
    assert!(errors.errors().contains_key("order_details"));

    let stored = order_detail::Entity::find_by_id(widget.id)
        .one(db.pool.as_ref())
        .await
        .unwrap()
        .expect("detail still stored");
    assert_eq!(stored, widget);
    let order = db.service().find_order(saved.order.id).await.unwrap();
    assert_eq!(order.order.customer_name, "Jane Doe");
}

#[tokio::test]
async fn invalid_detail_cannot_be_inserted_directly() {
    let db = TestDb::new().await;
    let saved = db.create(widget_order()).await;

    let detail = order_detail::ActiveModel {
        order_id: Set(saved.order.id),
        product_name: Set(String::new()),
        quantity: Set(0),
        unit_price: Set(dec!(-5)),
        ..Default::default()
    };

    assert_matches!(detail.insert(db.pool.as_ref()).await, Err(DbErr::Custom(_)));
    assert_eq!(
        order_detail::Entity::find().count(db.pool.as_ref()).await.unwrap(),
        2
    );
}
