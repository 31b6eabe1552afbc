#![cfg(feature = "async")]

use std::time::Duration;

use derby_game::{DriveOutcome, RaceConfig, RaceDriver, RaceSession, RaceStatus, Round};

fn driven(seed: u64) -> (RaceDriver, tokio::sync::watch::Receiver<derby_game::RaceSnapshot>) {
    let mut session = RaceSession::new(RaceConfig::default(), seed).unwrap();
    session.generate_program().unwrap();
    RaceDriver::new(session)
}

#[tokio::test(start_paused = true)]
async fn driven_round_settles_into_the_next_round() {
    let (driver, mut updates) = driven(21);
    let outcome = driver.run_round().await.unwrap();
    assert_eq!(
        outcome,
        DriveOutcome::Completed {
            round: Round::FIRST,
            next: Round::new(2).unwrap(),
        }
    );

    assert!(updates.has_changed().unwrap());
    let snapshot = updates.borrow_and_update().clone();
    assert_eq!(snapshot.round, Round::new(2).unwrap());
    assert_eq!(snapshot.status, RaceStatus::Idle);
    assert!(snapshot.results.is_empty());
    assert_eq!(snapshot.results_per_round[Round::FIRST].len(), 10);
}

#[tokio::test(start_paused = true)]
async fn pausing_cancels_the_drive_and_resume_finishes_it() {
    let (driver, _updates) = driven(22);
    let runner = driver.clone();
    let handle = tokio::spawn(async move { runner.run_round().await });

    tokio::time::sleep(Duration::from_millis(260)).await;
    assert!(driver.with_session(RaceSession::pause));
    assert_eq!(handle.await.unwrap(), Ok(DriveOutcome::Cancelled));

    let paused = driver.snapshot();
    assert_eq!(paused.status, RaceStatus::Paused);
    assert_eq!(paused.clock_ms, 250);
    assert!(paused.program.iter().all(|h| h.progress > 0.0));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(driver.snapshot().program, paused.program);

    let outcome = driver.run_round().await.unwrap();
    assert!(matches!(outcome, DriveOutcome::Completed { .. }));
}

#[tokio::test(start_paused = true)]
async fn regenerating_during_settle_supersedes_the_advance() {
    let (driver, mut updates) = driven(23);
    let runner = driver.clone();
    let handle = tokio::spawn(async move { runner.run_round().await });

    updates
        .wait_for(|snapshot| snapshot.status == RaceStatus::Finished)
        .await
        .unwrap();
    driver
        .with_session(|session| session.generate_program().map(|_| ()))
        .unwrap();

    assert_eq!(
        handle.await.unwrap(),
        Ok(DriveOutcome::Superseded {
            round: Round::FIRST
        })
    );
    let snapshot = driver.snapshot();
    assert_eq!(snapshot.round, Round::FIRST);
    assert_eq!(snapshot.status, RaceStatus::Idle);
}
