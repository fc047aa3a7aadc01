use serde_json::json;

use super::*;
use crate::records::{NavLink, SiteSettings};
use crate::store::Resource;

fn row(value: serde_json::Value) -> Row {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn nav_row(id: Uuid, order_index: i32, label: &str) -> Row {
    row(json!({ "id": id, "order_index": order_index, "label": label, "href": "#" }))
}

async fn seeded(count: i32) -> (MemoryBackend, Vec<Uuid>) {
    let backend = MemoryBackend::new();
    let mut ids = Vec::new();
    for index in 0..count {
        let id = Uuid::new_v4();
        backend.insert(&NavLink::TABLE, nav_row(id, index, &format!("L{index}"))).await.unwrap();
        ids.push(id);
    }
    (backend, ids)
}

async fn order_of(backend: &MemoryBackend) -> Vec<(Uuid, i64)> {
    backend
        .select_all(&NavLink::TABLE)
        .await
        .unwrap()
        .iter()
        .map(|r| (row_id(r).unwrap(), row_order(r).unwrap()))
        .collect()
}

#[tokio::test]
async fn select_all_sorts_by_order_index() {
    let backend = MemoryBackend::new();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    backend.insert(&NavLink::TABLE, nav_row(b, 1, "B")).await.unwrap();
    backend.insert(&NavLink::TABLE, nav_row(a, 0, "A")).await.unwrap();

    let ids: Vec<Uuid> = order_of(&backend).await.into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, [a, b]);
}

#[tokio::test]
async fn insert_rejects_taken_order_index() {
    let (backend, _) = seeded(2).await;
    let err = backend.insert(&NavLink::TABLE, nav_row(Uuid::new_v4(), 1, "X")).await.unwrap_err();
    assert!(matches!(err, BackendError::Rejected(_)));
}

#[tokio::test]
async fn insert_rejects_duplicate_id() {
    let (backend, ids) = seeded(1).await;
    let err = backend.insert(&NavLink::TABLE, nav_row(ids[0], 5, "X")).await.unwrap_err();
    assert!(matches!(err, BackendError::Rejected(_)));
}

#[tokio::test]
async fn insert_rejects_unknown_column() {
    let backend = MemoryBackend::new();
    let mut bad = nav_row(Uuid::new_v4(), 0, "X");
    bad.insert("colour".into(), json!("red"));
    assert!(matches!(backend.insert(&NavLink::TABLE, bad).await, Err(BackendError::Rejected(_))));
}

#[tokio::test]
async fn settings_rows_need_no_order_index() {
    let backend = MemoryBackend::new();
    let id = Uuid::new_v4();
    backend
        .insert(&SiteSettings::TABLE, row(json!({ "id": id, "brand_name": "Acme" })))
        .await
        .unwrap();
    let first = backend.select_first(&SiteSettings::TABLE).await.unwrap().unwrap();
    assert_eq!(row_id(&first), Some(id));
}

#[tokio::test]
async fn update_overwrites_payload_columns() {
    let (backend, ids) = seeded(1).await;
    backend.update(&NavLink::TABLE, ids[0], row(json!({ "label": "Home" }))).await.unwrap();
    let stored = backend.select_one(&NavLink::TABLE, ids[0]).await.unwrap().unwrap();
    assert_eq!(stored["label"], json!("Home"));
    assert_eq!(stored["href"], json!("#"));
}

#[tokio::test]
async fn update_refuses_order_index() {
    let (backend, ids) = seeded(1).await;
    let err = backend.update(&NavLink::TABLE, ids[0], row(json!({ "order_index": 4 }))).await.unwrap_err();
    assert!(matches!(err, BackendError::Rejected(_)));
}

#[tokio::test]
async fn update_missing_row_is_not_found() {
    let backend = MemoryBackend::new();
    let err = backend.update(&NavLink::TABLE, Uuid::nil(), row(json!({ "label": "x" }))).await.unwrap_err();
    assert!(matches!(err, BackendError::NotFound(_)));
}

#[tokio::test]
async fn delete_renumbers_remaining_rows() {
    let (backend, ids) = seeded(4).await;
    backend.delete(&NavLink::TABLE, ids[1]).await.unwrap();
    assert_eq!(order_of(&backend).await, vec![(ids[0], 0), (ids[2], 1), (ids[3], 2)]);
}

#[tokio::test]
async fn write_order_applies_whole_batch() {
    let (backend, ids) = seeded(3).await;
    backend
        .write_order(&NavLink::TABLE, &[(ids[0], 2), (ids[2], 0)])
        .await
        .unwrap();
    assert_eq!(order_of(&backend).await, vec![(ids[2], 0), (ids[1], 1), (ids[0], 2)]);
}

#[tokio::test]
async fn write_order_with_unknown_id_changes_nothing() {
    let (backend, ids) = seeded(2).await;
    let err = backend
        .write_order(&NavLink::TABLE, &[(ids[0], 1), (Uuid::new_v4(), 0)])
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::StaleOrder { expected: 2, matched: 1 }));
    assert_eq!(order_of(&backend).await, vec![(ids[0], 0), (ids[1], 1)]);
}

#[tokio::test]
async fn write_order_rejects_duplicate_indices() {
    let (backend, ids) = seeded(3).await;
    let err = backend.write_order(&NavLink::TABLE, &[(ids[0], 1)]).await.unwrap_err();
    assert!(matches!(err, BackendError::Rejected(_)));
    assert_eq!(order_of(&backend).await, vec![(ids[0], 0), (ids[1], 1), (ids[2], 2)]);
}

#[tokio::test]
async fn count_is_zero_for_untouched_table() {
    let backend = MemoryBackend::new();
    assert_eq!(backend.count(&NavLink::TABLE).await.unwrap(), 0);
}
