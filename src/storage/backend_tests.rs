use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, Set};

use super::backend::SeaOrmBackend;
use super::entities::users;
use super::policy::{FixedRolePolicy, PromotingPolicy};
use super::repository::{UserRepository, VisitRepository};
use crate::errors::AppError;
use crate::models::Role;
use crate::test_support::setup_test_db;

fn promoting() -> Arc<PromotingPolicy> {
    Arc::new(PromotingPolicy {
        admin_username: Some("owner".into()),
        first_user_role: Role::Barber,
        default_role: Role::Customer,
    })
}

#[tokio::test]
async fn test_fetch_or_create_is_stable() {
    let backend = SeaOrmBackend::new(setup_test_db().await);

    let first = backend.fetch_or_create(1001, "alice").await.unwrap();
    let second = backend.fetch_or_create(1001, "alice").await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(backend.list_by_role(Role::Customer).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_promoting_policy_bootstrap() {
    let backend = SeaOrmBackend::new(setup_test_db().await).with_role_policy(promoting());

    let first = backend.fetch_or_create(1, "alice").await.unwrap();
    let owner = backend.fetch_or_create(2, "owner").await.unwrap();
    let third = backend.fetch_or_create(3, "carol").await.unwrap();

    assert_eq!(first.role(), Some(Role::Barber));
    assert_eq!(owner.role(), Some(Role::Admin));
    assert_eq!(third.role(), Some(Role::Customer));
    assert_eq!(first.invited_by, None);
}

#[tokio::test]
async fn test_fixed_policy_never_promotes() {
    let backend = SeaOrmBackend::new(setup_test_db().await)
        .with_role_policy(Arc::new(FixedRolePolicy(Role::Client)));

    let first = backend.fetch_or_create(1, "owner").await.unwrap();
    assert_eq!(first.role(), Some(Role::Client));
}

#[tokio::test]
async fn test_update_role() {
    let backend = SeaOrmBackend::new(setup_test_db().await);
    backend.fetch_or_create(77, "dave").await.unwrap();

    backend.update_role(77, Role::Barber).await.unwrap();
    let barbers = backend.list_by_role(Role::Barber).await.unwrap();
    assert_eq!(barbers.len(), 1);
    assert_eq!(barbers[0].telegram_id, 77);

    let err = backend.update_role(78, Role::Admin).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_update_role_rejects_placeholder_identity() {
    let backend = SeaOrmBackend::new(setup_test_db().await);
    let barber = backend.fetch_or_create(5005, "barber").await.unwrap();
    backend.create_invited("bob", barber.id).await.unwrap();
    backend.create_invited("carol", barber.id).await.unwrap();

    let err = backend.update_role(0, Role::Admin).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let clients = backend.list_clients_of(barber.id).await.unwrap();
    assert_eq!(clients.len(), 2);
    assert!(backend.list_by_role(Role::Admin).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_telegram_id_is_unique_except_placeholder() {
    let backend = SeaOrmBackend::new(setup_test_db().await);
    let barber = backend.fetch_or_create(5005, "barber").await.unwrap();

    // 多个未认领的邀请共用占位 id
    backend.create_invited("bob", barber.id).await.unwrap();
    backend.create_invited("carol", barber.id).await.unwrap();

    let duplicate = users::ActiveModel {
        telegram_id: Set(5005),
        username: Set("impostor".into()),
        role: Set(Role::Customer.as_str().into()),
        invited_by: Set(None),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(backend.db())
    .await;
    assert!(duplicate.is_err());
}

#[tokio::test]
async fn test_register_conflict_returns_existing_user() {
    let backend = SeaOrmBackend::new(setup_test_db().await);
    let first = backend.fetch_or_create(1001, "alice").await.unwrap();

    // 与另一个请求同时注册同一身份
    let second = backend.register(1001, "alice").await.unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(backend.list_by_role(Role::Customer).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invited_user_is_placeholder_client() {
    let backend = SeaOrmBackend::new(setup_test_db().await);
    let barber = backend.fetch_or_create(5005, "barber").await.unwrap();

    let bob = backend.create_invited("bob", barber.id).await.unwrap();
    assert_eq!(bob.role(), Some(Role::Client));
    assert_eq!(bob.invited_by, Some(barber.id));
    assert!(bob.is_placeholder());

    let clients = backend.list_clients_of(barber.id).await.unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].username, "bob");

    assert!(backend.find_client_of(barber.id, "bob").await.unwrap().is_some());
    assert!(backend.find_client_of(barber.id + 1, "bob").await.unwrap().is_none());
    assert_eq!(
        backend.find_by_username("bob").await.unwrap().map(|u| u.id),
        Some(bob.id)
    );
}

#[tokio::test]
async fn test_invited_user_without_reconciliation_gets_duplicate() {
    let backend = SeaOrmBackend::new(setup_test_db().await);
    let barber = backend.fetch_or_create(5005, "barber").await.unwrap();
    let invited = backend.create_invited("bob", barber.id).await.unwrap();

    let bob = backend.fetch_or_create(6006, "bob").await.unwrap();

    assert_ne!(bob.id, invited.id);
    assert_eq!(bob.invited_by, None);
    // 占位记录保持不变
    let clients = backend.list_clients_of(barber.id).await.unwrap();
    assert!(clients[0].is_placeholder());
}

#[tokio::test]
async fn test_claim_invitation() {
    let backend = SeaOrmBackend::new(setup_test_db().await);
    let barber = backend.fetch_or_create(5005, "barber").await.unwrap();
    let invited = backend.create_invited("bob", barber.id).await.unwrap();

    assert!(backend.claim_invitation(6006, "nobody").await.unwrap().is_none());

    let claimed = backend.claim_invitation(6006, "bob").await.unwrap().unwrap();
    assert_eq!(claimed.id, invited.id);
    assert_eq!(claimed.telegram_id, 6006);
    assert_eq!(claimed.invited_by, Some(barber.id));

    // 已被认领，不能再次认领
    assert!(backend.claim_invitation(7007, "bob").await.unwrap().is_none());
}

#[tokio::test]
async fn test_claim_refused_when_identity_already_registered() {
    let backend = SeaOrmBackend::new(setup_test_db().await);
    let barber = backend.fetch_or_create(5005, "barber").await.unwrap();
    let invited = backend.create_invited("bob", barber.id).await.unwrap();
    let bob = backend.fetch_or_create(7007, "bob").await.unwrap();

    assert!(backend.claim_invitation(7007, "bob").await.unwrap().is_none());

    // 占位记录保持未认领，身份仍然只对应一条记录
    let clients = backend.list_clients_of(barber.id).await.unwrap();
    assert_eq!(clients[0].id, invited.id);
    assert!(clients[0].is_placeholder());
    assert_eq!(backend.fetch_or_create(7007, "bob").await.unwrap().id, bob.id);
}

#[tokio::test]
async fn test_fetch_or_create_reconciles_when_enabled() {
    let backend = SeaOrmBackend::new(setup_test_db().await).with_invite_reconciliation(true);
    let barber = backend.fetch_or_create(5005, "barber").await.unwrap();
    let invited = backend.create_invited("bob", barber.id).await.unwrap();

    let bob = backend.fetch_or_create(6006, "bob").await.unwrap();
    assert_eq!(bob.id, invited.id);
    assert_eq!(bob.role(), Some(Role::Client));

    let again = backend.fetch_or_create(6006, "bob").await.unwrap();
    assert_eq!(again.id, invited.id);
}

#[tokio::test]
async fn test_visits_upcoming_and_latest() {
    let backend = SeaOrmBackend::new(setup_test_db().await);
    let barber = backend.fetch_or_create(5005, "barber").await.unwrap();
    let bob = backend.create_invited("bob", barber.id).await.unwrap();
    let now = Utc::now();

    assert!(backend.latest_scheduled_visit(bob.id).await.unwrap().is_none());

    backend.create_visit(bob.id, now - Duration::days(2)).await.unwrap();
    let soon = backend.create_visit(bob.id, now + Duration::days(1)).await.unwrap();
    let later = backend.create_visit(bob.id, now + Duration::days(7)).await.unwrap();
    assert_eq!(soon.status, "scheduled");

    let upcoming = backend.list_upcoming_visits(bob.id, now).await.unwrap();
    let ids: Vec<i32> = upcoming.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![soon.id, later.id]);

    let latest = backend.latest_scheduled_visit(bob.id).await.unwrap().unwrap();
    assert_eq!(latest.id, later.id);

    assert!(backend.list_upcoming_visits(barber.id, now).await.unwrap().is_empty());
}
