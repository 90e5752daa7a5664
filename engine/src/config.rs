use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Balance constants for combat resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CombatRules {
    /// Flee chance (percent) when the fleeing stat equals the opponents' average.
    pub flee_base_chance: i32,
    /// Percentage points gained per point of stat advantage.
    pub flee_chance_per_point: i32,
    pub flee_min_chance: i32,
    pub flee_max_chance: i32,
    /// Floor applied after mitigation on every damaging hit.
    pub min_damage: i32,
    /// Log entries included in `get_summary()`.
    pub recent_log_len: usize,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            flee_base_chance: 50,
            flee_chance_per_point: 5,
            flee_min_chance: 5,
            flee_max_chance: 95,
            min_damage: 1,
            recent_log_len: 10,
        }
    }
}

impl CombatRules {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let rules: Self = serde_json::from_str(text).context("failed to parse rules JSON")?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let rules: Self = serde_yaml::from_str(text).context("failed to parse rules YAML")?;
        rules.validate()?;
        Ok(rules)
    }

    /// Loads `.yaml`/`.yml` as YAML and anything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read rules file: {}", path.display()))?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        );
        let rules = if is_yaml {
            Self::from_yaml_str(&text)
        } else {
            Self::from_json_str(&text)
        };
        rules.with_context(|| format!("invalid rules file: {}", path.display()))
    }

    pub fn builtin(id: &str) -> Result<Self> {
        let presets = crate::content::builtin_rules();
        let text = presets
            .get(id)
            .ok_or_else(|| anyhow::anyhow!("unknown builtin rules '{}'", id))?;
        Self::from_yaml_str(text)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0..=100).contains(&self.flee_min_chance) || !(0..=100).contains(&self.flee_max_chance)
        {
            bail!("flee chance bounds must lie within 0..=100");
        }
        if self.flee_min_chance > self.flee_max_chance {
            bail!(
                "flee_min_chance {} exceeds flee_max_chance {}",
                self.flee_min_chance,
                self.flee_max_chance
            );
        }
        if self.min_damage < 0 {
            bail!("min_damage must not be negative");
        }
        Ok(())
    }

    /// Percent chance to flee for `own` against opponents averaging `sum / count`.
    pub fn flee_chance(&self, own: i32, opponent_sum: i64, opponent_count: usize) -> i32 {
        if opponent_count == 0 {
            return self.flee_max_chance;
        }
        let count = opponent_count as i64;
        let diff_scaled = i64::from(own) * count - opponent_sum;
        let chance = i64::from(self.flee_base_chance)
            + (diff_scaled * i64::from(self.flee_chance_per_point)).div_euclid(count);
        chance.clamp(
            i64::from(self.flee_min_chance),
            i64::from(self.flee_max_chance),
        ) as i32
    }
}
