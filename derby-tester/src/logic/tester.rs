use anyhow::Result;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::common::scenario::TestScenario;
use crate::logic::race_tester::{RacePlan, RaceSummary, RaceTester};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    pub mean_ticks_per_round: f64,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

/// Runs scenarios either on simulated time or on the real-time driver.
pub struct LogicTester {
    tester: RaceTester,
    realtime: bool,
    verbose: bool,
}

impl LogicTester {
    pub const fn new(tester: RaceTester, realtime: bool, verbose: bool) -> Self {
        Self {
            tester,
            realtime,
            verbose,
        }
    }

    pub async fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                let clock = if self.realtime { "realtime" } else { "simulated" };
                println!(
                    "🧪 Testing scenario: {} [{}] (clock: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.key,
                    clock,
                    seed
                );
            }

            results.push(self.run_single_scenario(scenario, seed, iterations).await);
        }

        results
    }

    async fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();
        let mut ticks = 0u64;
        let mut rounds = 0usize;

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let outcome = self.run_iteration(&scenario.plan, iteration_seed).await;
            let error = match &outcome {
                Ok(summary) => evaluate_expectations(&scenario.plan, summary),
                Err(err) => Some(format!("{err:#}")),
            };

            if let Some(err) = error {
                failures.push(format!(
                    "Iteration {} (seed {iteration_seed}): {err}",
                    i + 1
                ));
                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.red()
                    );
                }
                continue;
            }

            successes += 1;
            let duration = start_time.elapsed();
            performance_data.push(duration);
            if let Ok(summary) = &outcome {
                ticks += u64::from(summary.total_ticks());
                rounds += summary.rounds.len();
                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) seed:{} rounds:{} pauses:{} regenerations:{}",
                        i + 1,
                        iterations,
                        summary.seed,
                        summary.rounds.len(),
                        summary.pauses,
                        summary.regenerations
                    );
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            mean_ticks_per_round: mean_ticks(ticks, rounds),
            average_duration,
            performance_data,
        }
    }

    async fn run_iteration(&self, plan: &RacePlan, seed: u64) -> Result<RaceSummary> {
        if self.realtime {
            self.tester.run_plan_realtime(plan, seed).await
        } else {
            self.tester.run_plan(plan, seed)
        }
    }
}

fn evaluate_expectations(plan: &RacePlan, summary: &RaceSummary) -> Option<String> {
    if !summary.violations.is_empty() {
        let shown: Vec<&str> = summary
            .violations
            .iter()
            .take(3)
            .map(String::as_str)
            .collect();
        return Some(format!(
            "{} invariant violation(s): {}",
            summary.violations.len(),
            shown.join(" | ")
        ));
    }
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Some(err.to_string());
        }
    }
    None
}

fn mean_ticks(ticks: u64, rounds: usize) -> f64 {
    let (Ok(ticks), Ok(rounds)) = (u32::try_from(ticks), u32::try_from(rounds)) else {
        return 0.0;
    };
    if rounds == 0 {
        return 0.0;
    }
    f64::from(ticks) / f64::from(rounds)
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
