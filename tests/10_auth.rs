use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use tour_admin::auth::{generate_jwt, Claims, Role, SessionContext};
use tour_admin::controller::{ListController, NoticeLog};
use tour_admin::database::models::Stop;
use tour_admin::database::MemoryGateway;
use tour_admin::error::ListError;

fn bearer(role: Role, tour: Option<Uuid>) -> Result<String> {
    let claims = Claims::new(Uuid::new_v4(), "someone@example.com".into(), role, tour);
    Ok(format!("Bearer {}", generate_jwt(&claims)?))
}

#[tokio::test]
async fn admin_token_pins_controller_to_its_tour() -> Result<()> {
    let tour = Uuid::new_v4();
    let session = SessionContext::from_token(&bearer(Role::Admin, Some(tour))?)?;

    let controller = ListController::<Stop, _>::new(
        session.clone(),
        None,
        MemoryGateway::<Stop>::new(),
        Arc::new(NoticeLog::new()),
    )?;
    assert_eq!(controller.tour_id(), tour);

    let elsewhere = ListController::<Stop, _>::new(
        session,
        Some(Uuid::new_v4()),
        MemoryGateway::<Stop>::new(),
        Arc::new(NoticeLog::new()),
    );
    assert!(matches!(elsewhere, Err(ListError::Auth(_))));
    Ok(())
}

#[tokio::test]
async fn super_admin_must_pick_a_tour() -> Result<()> {
    let session = SessionContext::from_token(&bearer(Role::SuperAdmin, None)?)?;
    assert!(session.is_super_admin());

    let unscoped = ListController::<Stop, _>::new(
        session.clone(),
        None,
        MemoryGateway::<Stop>::new(),
        Arc::new(NoticeLog::new()),
    );
    assert!(matches!(unscoped, Err(ListError::Auth(_))));

    let tour = Uuid::new_v4();
    let scoped = ListController::<Stop, _>::new(session, Some(tour), MemoryGateway::<Stop>::new(), Arc::new(NoticeLog::new()))?;
    assert_eq!(scoped.tour_id(), tour);
    Ok(())
}

#[tokio::test]
async fn tampered_token_is_rejected() -> Result<()> {
    let mut token = bearer(Role::Admin, Some(Uuid::new_v4()))?;
    token.push('x');
    assert!(SessionContext::from_token(&token).is_err());
    Ok(())
}
