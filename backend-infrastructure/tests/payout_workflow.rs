mod common;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use backend_application::commands::payout_commands;
use backend_application::dtos::PayoutRequestInput;
use backend_application::AppError;
use backend_domain::ports::{PayoutRepository, TransferOutcome};
use backend_domain::{
    BankDetails,
    FeeSchedule,
    NotificationType,
    PayoutFailureKind,
    PayoutRequest,
    PayoutStatus,
};
use common::{organizer, staff_admin, super_admin, Harness, BUYER, ORGANIZER, SUPER_ADMIN};

fn payout_input() -> PayoutRequestInput {
    let now = Utc::now();
    PayoutRequestInput {
        period_start: now - Duration::days(30),
        period_end: now - Duration::hours(1),
        bank: BankDetails {
            bank_account: "0123456789".to_string(),
            bank_code: "058".to_string(),
            account_name: "Kunle Events Ltd".to_string(),
        },
    }
}

async fn harness_with_sales() -> Harness {
    let harness = Harness::new().await;
    let sold_at = Utc::now() - Duration::days(10);
    harness.paid_order("ord-1", BUYER, 30_000, sold_at).await;
    harness.paid_order("ord-2", BUYER, 20_000, sold_at).await;
    harness
}

#[tokio::test]
async fn approved_payout_completes_and_pays_net_amount() {
    let harness = harness_with_sales().await;
    let state = &harness.state;

    let payout = payout_commands::request_payout(state, Some(&organizer()), payout_input())
        .await
        .unwrap();
    assert_eq!(payout.status, PayoutStatus::Pending);
    assert_eq!(payout.amount, Decimal::from(50_000));
    assert_eq!(payout.platform_fee, Decimal::from(2_500));
    assert_eq!(payout.net_amount, Decimal::from(47_500));
    assert_eq!(
        harness
            .notifications_of_kind(SUPER_ADMIN, NotificationType::PayoutRequested)
            .await
            .len(),
        1
    );

    let completed = payout_commands::approve_payout(state, Some(&super_admin()), &payout.id)
        .await
        .unwrap();
    assert_eq!(completed.status, PayoutStatus::Completed);
    assert!(completed.processed_at.is_some());
    assert_eq!(completed.net_amount + completed.platform_fee, completed.amount);

    let received = harness
        .notifications_of_kind(ORGANIZER, NotificationType::PaymentReceived)
        .await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].metadata.payout_amount, Some(Decimal::from(47_500)));
    assert_eq!(
        received[0].message,
        "Your payout of ₦47,500 has been sent to your bank account."
    );
    assert!(harness
        .email
        .sent()
        .iter()
        .any(|mail| mail.to == "org-1@stagepass.test" && mail.subject == "[Stagepass] Payout completed"));
}

#[tokio::test]
async fn pending_transfer_waits_for_confirmation() {
    let harness = harness_with_sales().await;
    let state = &harness.state;
    harness.gateway.push(TransferOutcome::Pending {
        reference: "TRF_pending".to_string(),
    });

    let payout = payout_commands::request_payout(state, Some(&organizer()), payout_input())
        .await
        .unwrap();
    let processing = payout_commands::approve_payout(state, Some(&super_admin()), &payout.id)
        .await
        .unwrap();
    assert_eq!(processing.status, PayoutStatus::Processing);
    assert_eq!(processing.transfer_code.as_deref(), Some("TRF_pending"));
    assert!(processing.processed_at.is_none());

    let completed = payout_commands::confirm_transfer(state, "TRF_pending", true, None)
        .await
        .unwrap();
    assert_eq!(completed.status, PayoutStatus::Completed);
    assert_eq!(completed.transfer_code.as_deref(), Some("TRF_pending"));

    // Repeated webhook deliveries leave the payout as it is.
    let again = payout_commands::confirm_transfer(state, "TRF_pending", false, None)
        .await
        .unwrap();
    assert_eq!(again.status, PayoutStatus::Completed);
    assert_eq!(
        harness
            .notifications_of_kind(ORGANIZER, NotificationType::PaymentReceived)
            .await
            .len(),
        1
    );
}

#[tokio::test]
async fn approving_a_settled_payout_is_invalid_and_changes_nothing() {
    let harness = harness_with_sales().await;
    let state = &harness.state;
    let payout = payout_commands::request_payout(state, Some(&organizer()), payout_input())
        .await
        .unwrap();
    let completed = payout_commands::approve_payout(state, Some(&super_admin()), &payout.id)
        .await
        .unwrap();

    let err = payout_commands::approve_payout(state, Some(&super_admin()), &payout.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    let stored = harness.store.find_payout(&payout.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PayoutStatus::Completed);
    assert_eq!(stored.processed_at, completed.processed_at);
    assert_eq!(stored.transfer_code, completed.transfer_code);
    assert_eq!(harness.gateway.calls(), 1);
}

#[tokio::test]
async fn rejection_requires_a_reason_and_is_final() {
    let harness = harness_with_sales().await;
    let state = &harness.state;
    let payout = payout_commands::request_payout(state, Some(&organizer()), payout_input())
        .await
        .unwrap();

    let err = payout_commands::reject_payout(state, Some(&super_admin()), &payout.id, Some(String::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let untouched = harness.store.find_payout(&payout.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, PayoutStatus::Pending);

    let rejected = payout_commands::reject_payout(
        state,
        Some(&super_admin()),
        &payout.id,
        Some("fraud suspected".to_string()),
    )
    .await
    .unwrap();
    assert_eq!(rejected.status, PayoutStatus::Failed);
    assert_eq!(rejected.failure_reason.as_deref(), Some("fraud suspected"));
    assert_eq!(rejected.failure_kind, Some(PayoutFailureKind::Rejected));
    assert!(rejected.processed_at.is_some());

    let err = payout_commands::retry_payout(state, Some(&super_admin()), &payout.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
    assert_eq!(
        harness
            .notifications_of_kind(ORGANIZER, NotificationType::PayoutRejected)
            .await
            .len(),
        1
    );
}

#[tokio::test]
async fn failed_transfer_can_be_retried() {
    let harness = harness_with_sales().await;
    let state = &harness.state;
    harness.gateway.push(TransferOutcome::Failed {
        reason: "Insufficient balance".to_string(),
    });

    let payout = payout_commands::request_payout(state, Some(&organizer()), payout_input())
        .await
        .unwrap();
    let err = payout_commands::approve_payout(state, Some(&super_admin()), &payout.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ExternalFailure(_)));

    let failed = harness.store.find_payout(&payout.id).await.unwrap().unwrap();
    assert_eq!(failed.status, PayoutStatus::Failed);
    assert_eq!(failed.failure_reason.as_deref(), Some("Insufficient balance"));
    assert_eq!(failed.failure_kind, Some(PayoutFailureKind::Transfer));
    assert_eq!(
        harness
            .notifications_of_kind(ORGANIZER, NotificationType::PayoutFailed)
            .await
            .len(),
        1
    );

    let reopened = payout_commands::retry_payout(state, Some(&super_admin()), &payout.id)
        .await
        .unwrap();
    assert_eq!(reopened.status, PayoutStatus::Pending);
    assert!(reopened.failure_reason.is_none());

    let completed = payout_commands::approve_payout(state, Some(&super_admin()), &payout.id)
        .await
        .unwrap();
    assert_eq!(completed.status, PayoutStatus::Completed);
    assert_eq!(completed.platform_fee, payout.platform_fee);
}

#[tokio::test]
async fn transfer_failed_payout_keeps_its_period_reserved() {
    let harness = harness_with_sales().await;
    let state = &harness.state;
    harness.gateway.push(TransferOutcome::Failed {
        reason: "Account dormant".to_string(),
    });

    let first = payout_commands::request_payout(state, Some(&organizer()), payout_input())
        .await
        .unwrap();
    payout_commands::approve_payout(state, Some(&super_admin()), &first.id)
        .await
        .unwrap_err();

    let err = payout_commands::request_payout(state, Some(&organizer()), payout_input())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Seed a second live payout over the same period directly in storage.
    let input = payout_input();
    let amount = Decimal::from(50_000);
    let duplicate = PayoutRequest::new(
        ORGANIZER.to_string(),
        amount,
        FeeSchedule::new(Decimal::from(5)).split(amount),
        input.period_start,
        input.period_end,
        input.bank,
        Utc::now(),
    );
    harness.store.insert_payout(&duplicate).await.unwrap();

    let err = payout_commands::retry_payout(state, Some(&super_admin()), &first.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
    let stored = harness.store.find_payout(&first.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PayoutStatus::Failed);

    payout_commands::approve_payout(state, Some(&super_admin()), &duplicate.id)
        .await
        .unwrap();
    let completed = harness
        .store
        .list_organizer_payouts(ORGANIZER)
        .await
        .unwrap()
        .into_iter()
        .filter(|payout| payout.status == PayoutStatus::Completed)
        .count();
    assert_eq!(completed, 1);
}

#[tokio::test]
async fn gateway_errors_are_treated_as_transfer_failures() {
    let harness = harness_with_sales().await;
    let state = &harness.state;
    harness.gateway.push_error("connection reset");

    let payout = payout_commands::request_payout(state, Some(&organizer()), payout_input())
        .await
        .unwrap();
    let err = payout_commands::approve_payout(state, Some(&super_admin()), &payout.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ExternalFailure(_)));
    let stored = harness.store.find_payout(&payout.id).await.unwrap().unwrap();
    assert!(stored.is_retryable());
}

#[tokio::test]
async fn staff_admins_cannot_process_payouts() {
    let harness = harness_with_sales().await;
    let state = &harness.state;
    let payout = payout_commands::request_payout(state, Some(&organizer()), payout_input())
        .await
        .unwrap();
    let before = harness.notifications_for(ORGANIZER).await.len();

    let err = payout_commands::approve_payout(state, Some(&staff_admin()), &payout.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    let err = payout_commands::approve_payout(state, None, &payout.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthenticated));

    let stored = harness.store.find_payout(&payout.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PayoutStatus::Pending);
    assert_eq!(harness.notifications_for(ORGANIZER).await.len(), before);
    assert_eq!(harness.gateway.calls(), 0);
}

#[tokio::test]
async fn overlapping_or_empty_periods_are_refused() {
    let harness = harness_with_sales().await;
    let state = &harness.state;
    payout_commands::request_payout(state, Some(&organizer()), payout_input())
        .await
        .unwrap();

    let err = payout_commands::request_payout(state, Some(&organizer()), payout_input())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let now = Utc::now();
    let mut older = payout_input();
    older.period_start = now - Duration::days(90);
    older.period_end = now - Duration::days(60);
    let err = payout_commands::request_payout(state, Some(&organizer()), older)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn bulk_approval_reports_each_item() {
    let harness = harness_with_sales().await;
    let state = &harness.state;
    let payout = payout_commands::request_payout(state, Some(&organizer()), payout_input())
        .await
        .unwrap();

    let outcome = payout_commands::bulk_process_payouts(
        state,
        Some(&super_admin()),
        vec![payout.id.clone(), "missing".to_string(), payout.id.clone()],
        true,
        None,
    )
    .await
    .unwrap();
    assert_eq!(outcome.processed_count, 1);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].id, "missing");

    let err = payout_commands::bulk_process_payouts(state, Some(&super_admin()), vec![], true, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = payout_commands::bulk_process_payouts(
        state,
        Some(&super_admin()),
        vec![payout.id.clone()],
        false,
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}
