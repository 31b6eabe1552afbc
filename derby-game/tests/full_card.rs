use derby_game::{RaceConfig, RaceSession, RaceStatus, Round};
use std::collections::{HashMap, HashSet};

#[test]
fn six_rounds_wrap_counter_and_compound_fatigue() {
    let mut session = RaceSession::new(RaceConfig::default(), 0xDEAD_BEEF).unwrap();
    assert_eq!(session.roster().len(), 20);

    let start: HashMap<u32, u8> = session
        .roster()
        .horses()
        .iter()
        .map(|h| (h.id, h.condition))
        .collect();
    let mut appearances: HashMap<u32, u32> = HashMap::new();
    let mut lost_per_horse: HashMap<u32, u32> = HashMap::new();

    for expected in Round::all() {
        assert_eq!(session.round(), expected);
        let program = session.generate_program().unwrap().to_vec();
        assert_eq!(program.len(), 10);
        let lanes: HashSet<u8> = program.iter().map(|h| h.lane).collect();
        assert_eq!(lanes, (1..=10).collect::<HashSet<u8>>());

        // Programs are drawn from the roster as it stands after earlier fatigue.
        for runner in &program {
            let roster_condition = session.roster().get(runner.horse.id).unwrap().condition;
            assert_eq!(runner.horse.condition, roster_condition);
            *appearances.entry(runner.horse.id).or_default() += 1;
        }

        let summary = session.run_round().unwrap();
        assert_eq!(summary.round, expected);
        let positions: Vec<u8> = summary.results.iter().map(|e| e.position).collect();
        assert_eq!(positions, (1..=10).collect::<Vec<u8>>());
        let finishers: HashSet<u32> = summary.results.iter().map(|e| e.horse_id).collect();
        assert_eq!(finishers.len(), 10);
        assert!(summary.condition_lost <= 90);

        for runner in session.program_for(expected) {
            let before = program
                .iter()
                .find(|h| h.horse.id == runner.horse.id)
                .unwrap()
                .horse
                .condition;
            let loss = u32::from(before - runner.horse.condition);
            assert!(loss <= 9);
            *lost_per_horse.entry(runner.horse.id).or_default() += loss;
        }
    }

    assert_eq!(session.round(), Round::FIRST);
    assert_eq!(session.status(), RaceStatus::Idle);

    for horse in session.roster().horses() {
        let initial = start[&horse.id];
        let raced = appearances.get(&horse.id).copied().unwrap_or(0);
        let lost = lost_per_horse.get(&horse.id).copied().unwrap_or(0);
        assert!(horse.condition <= initial);
        assert_eq!(u32::from(initial - horse.condition), lost);
        assert!(lost <= 9 * raced, "{} lost {lost} over {raced} rounds", horse.name);
        if raced == 0 {
            assert_eq!(horse.condition, initial);
        }
    }

    for round in Round::all() {
        assert_eq!(session.results_for(round).len(), 10);
    }
}

#[test]
fn second_lap_races_the_stored_program_on_current_conditions() {
    let mut session = RaceSession::new(RaceConfig::default(), 0).unwrap();
    for _ in Round::all() {
        session.generate_program().unwrap();
        session.run_round().unwrap();
    }
    assert_eq!(session.round(), Round::FIRST);

    let roster_before: HashMap<u32, u8> = session
        .roster()
        .horses()
        .iter()
        .map(|h| (h.id, h.condition))
        .collect();
    let field: Vec<u32> = session.program().iter().map(|h| h.horse.id).collect();
    assert_eq!(field.len(), 10);

    // Round 1 again, reusing the first-lap program.
    let summary = session.run_round().unwrap();
    assert_eq!(summary.round, Round::FIRST);
    assert_eq!(summary.results.len(), 10);

    let mut lost = 0u32;
    for horse in session.roster().horses() {
        let before = roster_before[&horse.id];
        assert!(horse.condition <= before);
        let loss = u32::from(before - horse.condition);
        if field.contains(&horse.id) {
            assert!(loss <= 9, "{} lost {loss}", horse.name);
        } else {
            assert_eq!(loss, 0, "{} did not race", horse.name);
        }
        lost += loss;
    }
    assert_eq!(summary.condition_lost, lost);

    // The rested program and the roster agree horse by horse.
    for runner in session.program_for(Round::FIRST) {
        let roster = session.roster().get(runner.horse.id).unwrap();
        assert_eq!(runner.horse.condition, roster.condition);
    }
}

#[test]
fn realistic_round_durations_scale_with_distance() {
    let mut session = RaceSession::new(RaceConfig::default(), 77).unwrap();
    let mut ticks = Vec::new();
    for _ in Round::all() {
        session.generate_program().unwrap();
        ticks.push(session.run_round().unwrap().ticks);
    }
    // Roughly 1.2k-2.2k meters at 0.3-1.2 percent per tick.
    assert!(ticks.iter().all(|&t| (80..=600).contains(&t)), "{ticks:?}");
    assert!(ticks[5] > ticks[0], "{ticks:?}");
}

#[test]
fn regenerating_the_roster_restores_fitness_and_clears_rounds() {
    let mut session = RaceSession::new(RaceConfig::default(), 5).unwrap();
    session.generate_program().unwrap();
    session.run_round().unwrap();
    assert!(!session.results_for(Round::FIRST).is_empty());

    session.regenerate_roster();
    assert_eq!(session.roster().len(), 20);
    assert!(session.results_for(Round::FIRST).is_empty());
    assert!(session.program().is_empty());
    assert!(
        session
            .roster()
            .horses()
            .iter()
            .all(|h| (60..=99).contains(&h.condition))
    );
}

#[test]
fn entropy_sessions_expose_their_seed_for_replay() {
    let mut first = RaceSession::with_entropy(RaceConfig::default()).unwrap();
    let mut replay = RaceSession::new(RaceConfig::default(), first.seed()).unwrap();
    assert_eq!(first.roster(), replay.roster());

    first.generate_program().unwrap();
    replay.generate_program().unwrap();
    assert_eq!(first.run_round().unwrap(), replay.run_round().unwrap());
}
