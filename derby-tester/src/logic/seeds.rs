use anyhow::{Result, bail};
use derby_game::RngBundle;
use std::collections::HashSet;

const DEFAULT_SEED: u64 = 1337;

/// Seed metadata for a tester run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    /// Drawn from entropy rather than typed on the command line.
    pub drawn: bool,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, drawn: false }
    }

    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            seed: RngBundle::from_entropy().seed(),
            drawn: true,
        }
    }
}

/// Resolve a list of CLI seed arguments into canonical seed metadata.
///
/// Supports decimal integers (negative values use their magnitude), `0x`
/// hexadecimal, and the keyword `random`, which draws a fresh seed that is
/// echoed so the run can be replayed.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if token.eq_ignore_ascii_case("random") {
            pending.push(SeedInfo::from_entropy());
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            && let Ok(value) = u64::from_str_radix(hex, 16)
        {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut seen = HashSet::new();
    pending.retain(|info| seen.insert(info.seed));

    if pending.is_empty() {
        pending.push(SeedInfo::from_numeric(DEFAULT_SEED));
    }

    Ok(pending)
}
