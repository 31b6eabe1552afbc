use crate::logic::RacePlan;

pub mod card;
pub mod interruptions;
pub mod smoke;

#[derive(Debug, Clone)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: &'static str,
    pub plan: RacePlan,
}

impl TestScenario {
    #[must_use]
    pub const fn new(key: &'static str, name: &'static str, plan: RacePlan) -> Self {
        Self { key, name, plan }
    }
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(smoke::smoke_scenario()),
        "full-card" | "card" => Some(card::full_card_scenario()),
        "replay" | "deterministic" => Some(card::replay_scenario()),
        "pause-resume" | "pause" => Some(interruptions::pause_resume_scenario()),
        "regenerate" | "regen" => Some(interruptions::regenerate_scenario()),
        _ => None,
    }
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Single Round Smoke Test"),
        ("full-card", "Full Six-Round Card"),
        ("replay", "Deterministic Replay"),
        ("pause-resume", "Pause/Resume Preservation"),
        ("regenerate", "Mid-Round Program Regeneration"),
    ]
}
