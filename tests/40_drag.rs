mod common;

use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use common::{loaded, Call};
use tour_admin::database::models::{FactDraft, Orderable, TourFact};
use tour_admin::drag::{DragConfig, Point, SortableList};

fn facts(tour_id: Uuid, texts: &[&str]) -> Vec<TourFact> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| TourFact::from_draft(Uuid::new_v4(), tour_id, i as i32 + 1, &FactDraft::new(*text)))
        .collect()
}

fn texts(list: &[TourFact]) -> Vec<String> {
    list.iter().map(|f| f.fact.clone()).collect()
}

#[tokio::test]
async fn pointer_drag_reorders_through_the_controller() -> Result<()> {
    let tour = Uuid::new_v4();
    let (controller, gateway, _log) = loaded(tour, facts(tour, &["one", "two", "three"])).await?;
    let controller = Arc::new(controller);
    let mut list = SortableList::new(controller.clone(), DragConfig::default(), controller.len().await);

    let session = list.session_mut();
    session.pointer_down(0, Point::new(5.0, 5.0));
    session.pointer_move(Point::new(5.0, 40.0));
    session.pointer_over(2);
    assert_eq!(session.preview(), vec![1, 2, 0]);
    // Nothing is committed while dragging
    assert!(gateway.writes().is_empty());

    list.pointer_up().await;

    assert_eq!(texts(&controller.items().await), vec!["two", "three", "one"]);
    assert_eq!(gateway.writes().len(), 3);
    Ok(())
}

#[tokio::test]
async fn click_without_travel_never_reaches_the_gateway() -> Result<()> {
    let tour = Uuid::new_v4();
    let (controller, gateway, _log) = loaded(tour, facts(tour, &["one", "two"])).await?;
    let controller = Arc::new(controller);
    let mut list = SortableList::new(controller.clone(), DragConfig::default(), 2);

    list.session_mut().pointer_down(1, Point::new(0.0, 0.0));
    list.session_mut().pointer_move(Point::new(3.0, 3.0));
    list.session_mut().pointer_over(0);

    assert_eq!(list.pointer_up().await, None);
    assert!(gateway.writes().is_empty());
    assert_eq!(texts(&controller.items().await), vec!["one", "two"]);
    Ok(())
}

#[tokio::test]
async fn keyboard_drag_has_the_same_effect() -> Result<()> {
    let tour = Uuid::new_v4();
    let items = facts(tour, &["one", "two", "three"]);
    let (controller, gateway, _log) = loaded(tour, items.clone()).await?;
    let controller = Arc::new(controller);
    let mut list = SortableList::new(controller.clone(), DragConfig::default(), 3);

    list.session_mut().key_pick(2);
    list.session_mut().key_up();
    list.key_drop().await;

    assert_eq!(texts(&controller.items().await), vec!["one", "three", "two"]);
    assert_eq!(
        gateway.writes(),
        vec![Call::UpdateOrder(items[2].id, 2), Call::UpdateOrder(items[1].id, 3)]
    );
    Ok(())
}
