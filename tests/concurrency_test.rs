mod common;

use anyhow::Result;
use common::{seed_account, test_service_with_repo};
use teller::application::AppError;
use teller::domain::TransactionKind;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_withdrawals_cannot_overdraw() -> Result<()> {
    let (service, repo, _temp) = test_service_with_repo().await?;
    let account = seed_account(&repo, "alice", 10000).await?;
    let account_id = account.id;

    // Each fits the balance on its own, together they do not
    let first = tokio::spawn({
        let service = service.clone();
        async move { service.withdraw(account_id, 7000).await }
    });
    let second = tokio::spawn({
        let service = service.clone();
        async move { service.withdraw(account_id, 6000).await }
    });

    let outcomes = [first.await?, second.await?];

    let successes = outcomes.iter().filter(|r| r.is_ok()).count();
    let rejections = outcomes
        .iter()
        .filter(|r| matches!(r, Err(AppError::InsufficientFunds { .. })))
        .count();
    assert_eq!(successes, 1, "outcomes: {outcomes:?}");
    assert_eq!(rejections, 1, "outcomes: {outcomes:?}");

    let balance = service.get_account(account.id).await?.balance_cents;
    assert!(balance == 3000 || balance == 4000, "balance {balance}");
    assert_eq!(repo.count_transactions(account.id).await?, 1);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_mixed_operations_are_serialized() -> Result<()> {
    let (service, repo, _temp) = test_service_with_repo().await?;
    let account = seed_account(&repo, "bob", 0).await?;
    let account_id = account.id;

    let mut handles = Vec::new();
    for i in 0..20 {
        let service = service.clone();
        let kind = if i % 2 == 0 {
            TransactionKind::Deposit
        } else {
            TransactionKind::Withdraw
        };
        handles.push(tokio::spawn(async move {
            service.apply(account_id, kind, 100).await
        }));
    }

    let mut deposits = 0;
    let mut withdrawals = 0;
    for handle in handles {
        match handle.await? {
            Ok(result) => match result.transaction.kind {
                TransactionKind::Deposit => deposits += 1,
                TransactionKind::Withdraw => withdrawals += 1,
            },
            Err(AppError::InsufficientFunds { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(deposits, 10);
    let balance = service.get_account(account.id).await?.balance_cents;
    assert!(balance >= 0);
    assert_eq!(balance, (deposits - withdrawals) * 100);
    assert_eq!(
        repo.count_transactions(account.id).await?,
        deposits + withdrawals
    );

    Ok(())
}

#[tokio::test]
async fn test_accounts_do_not_interfere() -> Result<()> {
    let (service, repo, _temp) = test_service_with_repo().await?;
    let alice = seed_account(&repo, "alice", 5000).await?;
    let bob = seed_account(&repo, "bob", 5000).await?;

    let (a, b) = tokio::join!(
        service.withdraw(alice.id, 5000),
        service.withdraw(bob.id, 5000)
    );
    a?;
    b?;

    assert_eq!(service.get_account(alice.id).await?.balance_cents, 0);
    assert_eq!(service.get_account(bob.id).await?.balance_cents, 0);

    Ok(())
}
