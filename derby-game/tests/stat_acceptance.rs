use derby_game::clock::random_factor;
use derby_game::{PaceConfig, RaceConfig, RaceSession, RngBundle, Roster};
use std::convert::TryFrom;

const SAMPLE_SIZE: usize = 5000;
const TOLERANCE: f64 = 0.02;

fn mean(total: f64, count: usize) -> f64 {
    total / f64::from(u32::try_from(count).expect("count fits u32"))
}

#[test]
fn pace_factor_centers_on_band_midpoint() {
    let pace = PaceConfig::default();
    let mut rng = RngBundle::from_user_seed(4242);
    let mut total = 0.0;
    for _ in 0..SAMPLE_SIZE {
        let factor = random_factor(&pace, rng.pace());
        assert!((0.7..1.2).contains(&factor), "factor {factor} out of band");
        total += factor;
    }
    let observed = mean(total, SAMPLE_SIZE);
    assert!(
        (observed - 0.95).abs() <= TOLERANCE,
        "pace factor drifted: observed {observed:.4}"
    );
}

#[test]
fn generated_conditions_average_near_band_midpoint() {
    let cfg = RaceConfig::default();
    let mut total = 0.0;
    let mut count = 0usize;
    for seed in 0..250u64 {
        let mut rng = RngBundle::from_user_seed(seed);
        let roster = Roster::generate(&cfg, rng.roster());
        for horse in roster.horses() {
            assert!((60..=99).contains(&horse.condition));
            total += f64::from(horse.condition);
            count += 1;
        }
    }
    let observed = mean(total, count);
    assert!(
        (observed - 79.5).abs() <= 1.0,
        "roster condition drifted: observed {observed:.3}"
    );
}

#[test]
fn fatigue_averages_four_and_a_half_points_per_runner() {
    let mut lost = 0.0;
    let mut runners = 0usize;
    for seed in 0..120u64 {
        let mut session = RaceSession::new(RaceConfig::default(), seed).unwrap();
        session.generate_program().unwrap();
        let summary = session.run_round().unwrap();
        lost += f64::from(summary.condition_lost);
        runners += summary.results.len();
    }
    let observed = mean(lost, runners);
    assert!(
        (observed - 4.5).abs() <= 0.35,
        "fatigue drifted: observed {observed:.3}"
    );
}
