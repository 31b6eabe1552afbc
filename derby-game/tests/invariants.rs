use derby_game::{
    ClockToken, RaceConfig, RaceSession, RaceStatus, Round, SettleOutcome, TickOutcome,
};

const SEEDS: [u64; 6] = [0, 1, 42, 1337, 0xC0FFEE, u64::MAX];

fn started(seed: u64) -> (RaceSession, ClockToken) {
    let mut session = RaceSession::new(RaceConfig::default(), seed).unwrap();
    session.generate_program().unwrap();
    let token = session.start().unwrap();
    (session, token)
}

#[test]
fn progress_never_regresses_and_finish_latches() {
    for seed in SEEDS {
        let (mut session, token) = started(seed);
        let mut previous = session.program().to_vec();
        loop {
            let outcome = session.tick(token);
            let current = session.program();
            for (before, after) in previous.iter().zip(current) {
                assert_eq!(before.horse.id, after.horse.id);
                assert_eq!(before.lane, after.lane);
                assert!(after.progress >= before.progress, "seed {seed}");
                assert!(after.progress <= 100.0);
                if before.finished {
                    assert!(after.finished);
                    assert_eq!(after.progress, before.progress);
                }
                assert_eq!(after.finished, after.progress >= 100.0);
            }
            previous = current.to_vec();
            match outcome {
                TickOutcome::Advanced(_) => {}
                TickOutcome::RoundComplete { .. } => break,
                TickOutcome::Stale => panic!("seed {seed}: clock halted mid-round"),
            }
        }
    }
}

#[test]
fn ledger_tracks_finishers_in_crossing_order() {
    for seed in SEEDS {
        let (mut session, token) = started(seed);
        let mut seen = Vec::new();
        loop {
            let outcome = session.tick(token);
            let report = match &outcome {
                TickOutcome::Advanced(report) | TickOutcome::RoundComplete { report, .. } => report,
                TickOutcome::Stale => panic!("seed {seed}: clock halted mid-round"),
            };
            seen.extend(report.finishers.iter().cloned());

            let finished = session.program().iter().filter(|h| h.finished).count();
            assert_eq!(session.ledger().len(), finished, "seed {seed}");
            assert_eq!(session.ledger().entries(), seen.as_slice());
            if matches!(outcome, TickOutcome::RoundComplete { .. }) {
                break;
            }
        }
        let positions: Vec<u8> = seen.iter().map(|e| e.position).collect();
        assert_eq!(positions, (1..=10).collect::<Vec<u8>>());
    }
}

#[test]
fn round_completes_exactly_when_every_horse_is_home() {
    let (mut session, token) = started(99);
    loop {
        match session.tick(token) {
            TickOutcome::Advanced(report) => {
                assert!(!report.all_finished);
                assert!(session.program().iter().any(|h| !h.finished));
                assert_eq!(session.status(), RaceStatus::Running);
            }
            TickOutcome::RoundComplete { report, ticket } => {
                assert!(report.all_finished);
                assert!(session.program().iter().all(|h| h.finished));
                assert_eq!(session.status(), RaceStatus::Finished);
                assert_eq!(session.pending_settle(), Some(ticket));
                assert_eq!(ticket.due_ms(), session.clock_ms() + 1_000);
                break;
            }
            TickOutcome::Stale => panic!("clock halted mid-round"),
        }
    }
    // The completed clock never ticks again.
    assert_eq!(session.tick(token), TickOutcome::Stale);
    assert_eq!(session.status(), RaceStatus::Finished);
}

#[test]
fn pause_resume_cycles_preserve_the_field() {
    let (mut session, mut token) = started(2024);
    for cycle in 0..10 {
        for _ in 0..7 {
            if !matches!(session.tick(token), TickOutcome::Advanced(_)) {
                return;
            }
        }
        assert!(session.pause(), "cycle {cycle}");
        assert!(!session.pause());
        let frozen = session.program().to_vec();
        let ledger = session.ledger().entries().to_vec();
        let clock = session.clock_ms();

        assert_eq!(session.tick(token), TickOutcome::Stale);
        assert_eq!(session.advance_time(10_000).ticks, 0);
        assert_eq!(session.clock_ms(), clock);

        token = session.start().unwrap();
        assert_eq!(session.program(), frozen.as_slice());
        assert_eq!(session.ledger().entries(), ledger.as_slice());
    }
}

#[test]
fn stale_settle_after_reset_leaves_round_in_place() {
    let (mut session, token) = started(3);
    let ticket = loop {
        if let TickOutcome::RoundComplete { ticket, .. } = session.tick(token) {
            break ticket;
        }
    };
    session.reset();
    assert_eq!(session.settle(ticket), SettleOutcome::Stale);
    assert_eq!(session.round(), Round::FIRST);
    assert!(session.program().is_empty());
}

#[test]
fn rounds_wrap_after_the_last() {
    let mut session = RaceSession::new(RaceConfig::default(), 11).unwrap();
    let mut visited = Vec::new();
    for _ in 0..8 {
        visited.push(session.round().number());
        session.generate_program().unwrap();
        session.run_round().unwrap();
    }
    assert_eq!(visited, vec![1, 2, 3, 4, 5, 6, 1, 2]);
}
