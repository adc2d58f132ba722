//! # Skill Effect Resolver
//!
//! Looks up skill definitions by id and extracts the effect terms the
//! physics model consumes: passive stat modifiers, active speed buffs and
//! debuffs, duration base times, and effect-flag queries.
//!
//! The catalog is an explicit read-only context object constructed once and
//! passed by reference into the engine; there is no module-level cache.
//!
//! A skill with no definition or no condition groups resolves to all-zero
//! effects, never an error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SKILL_DURATION_SECS, SKILL_TIME_SCALE};
use crate::models::StatBonuses;

// Effect types as they appear in the decoded skill data.
pub const EFFECT_PASSIVE_SPEED: i32 = 1;
pub const EFFECT_PASSIVE_STAMINA: i32 = 2;
pub const EFFECT_PASSIVE_POWER: i32 = 3;
pub const EFFECT_PASSIVE_GUTS: i32 = 4;
pub const EFFECT_PASSIVE_WISDOM: i32 = 5;
pub const EFFECT_HP_RECOVERY: i32 = 9;
pub const EFFECT_SPEED_DEBUFF: i32 = 21;
pub const EFFECT_SPEED_BUFF: i32 = 27;
/// "Ignore deceleration while active".
pub const EFFECT_IGNORE_DECELERATION: i32 = 28;

/// Raw effect values are stored x10000.
pub const EFFECT_VALUE_SCALE: f64 = 10000.0;

/// Reserved id range for inherited (gene-linked) unique skills.
const INHERITED_UNIQUE_MIN: u32 = 900_000;
const INHERITED_UNIQUE_MAX: u32 = 1_000_000;
/// Inherited unique ids remap to their base unique id by this offset.
const INHERITED_UNIQUE_OFFSET: u32 = 800_000;

/// One effect inside a skill's condition group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillEffect {
    #[serde(rename = "type")]
    pub effect_type: i32,
    /// Scaled integer value (x10000).
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionGroup {
    #[serde(default)]
    pub effects: Vec<SkillEffect>,
    /// Raw duration base time, 0 when absent.
    #[serde(default)]
    pub base_time: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub id: u32,
    #[serde(default)]
    pub condition_groups: Vec<ConditionGroup>,
    /// Secondary definition used when the skill is inherited.
    #[serde(default)]
    pub gene_version: Option<Box<SkillDefinition>>,
}

/// Read-only skill-id -> definition index.
#[derive(Debug, Clone, Default)]
pub struct SkillCatalog {
    defs: HashMap<u32, SkillDefinition>,
}

impl SkillCatalog {
    pub fn new(defs: impl IntoIterator<Item = SkillDefinition>) -> Self {
        Self {
            defs: defs.into_iter().map(|d| (d.id, d)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Resolves a skill definition by id.
    ///
    /// Ids in the inherited-unique range (900000..999999) are remapped to
    /// their base id and, when the base carries a gene version
    /// sub-definition, effects are read from the sub-definition instead.
    pub fn definition(&self, skill_id: u32) -> Option<&SkillDefinition> {
        if let Some(def) = self.defs.get(&skill_id) {
            return Some(def);
        }
        if (INHERITED_UNIQUE_MIN..INHERITED_UNIQUE_MAX).contains(&skill_id) {
            let parent_id = skill_id - INHERITED_UNIQUE_OFFSET;
            if let Some(parent) = self.defs.get(&parent_id) {
                if let Some(gene) = parent.gene_version.as_deref() {
                    return Some(gene);
                }
            }
        }
        log::debug!("no skill definition for id {skill_id}");
        None
    }

    /// Sum of passive stat effects (types 1..=5) across all condition
    /// groups, scaled to stat points.
    pub fn passive_stat_modifiers(&self, skill_id: u32) -> StatBonuses {
        let mut mods = StatBonuses::default();
        let Some(def) = self.definition(skill_id) else {
            return mods;
        };
        for group in &def.condition_groups {
            for eff in &group.effects {
                let val = eff.value as f64 / EFFECT_VALUE_SCALE;
                match eff.effect_type {
                    EFFECT_PASSIVE_SPEED => mods.speed += val,
                    EFFECT_PASSIVE_STAMINA => mods.stamina += val,
                    EFFECT_PASSIVE_POWER => mods.power += val,
                    EFFECT_PASSIVE_GUTS => mods.guts += val,
                    EFFECT_PASSIVE_WISDOM => mods.wisdom += val,
                    _ => {}
                }
            }
        }
        mods
    }

    /// Active speed buff in m/s, summed over type-27 effects of the *first*
    /// condition group only. Condition evaluation is intentionally not
    /// modeled; reading group 0 is a documented approximation.
    pub fn active_speed_buff(&self, skill_id: u32) -> f64 {
        let Some(group) = self
            .definition(skill_id)
            .and_then(|d| d.condition_groups.first())
        else {
            return 0.0;
        };
        group
            .effects
            .iter()
            .filter(|e| e.effect_type == EFFECT_SPEED_BUFF)
            .map(|e| e.value as f64 / EFFECT_VALUE_SCALE)
            .sum()
    }

    /// Active speed debuff magnitude in m/s, absolute type-21 effects
    /// summed across all condition groups.
    pub fn active_speed_debuff(&self, skill_id: u32) -> f64 {
        let Some(def) = self.definition(skill_id) else {
            return 0.0;
        };
        def.condition_groups
            .iter()
            .flat_map(|g| &g.effects)
            .filter(|e| e.effect_type == EFFECT_SPEED_DEBUFF)
            .map(|e| (e.value as f64).abs() / EFFECT_VALUE_SCALE)
            .sum()
    }

    /// Whether any condition group carries an effect of the given type.
    pub fn has_effect(&self, skill_id: u32, effect_type: i32) -> bool {
        self.definition(skill_id).is_some_and(|def| {
            def.condition_groups
                .iter()
                .any(|g| g.effects.iter().any(|e| e.effect_type == effect_type))
        })
    }

    /// Raw duration base time from the first condition group, 0 when absent.
    pub fn base_duration_ticks(&self, skill_id: u32) -> i32 {
        self.definition(skill_id)
            .and_then(|d| d.condition_groups.first())
            .map_or(0, |g| g.base_time)
    }

    /// Skill duration in seconds, race-proportional:
    /// `(base_time / 10000) * (courseDistance / 1000)`.
    ///
    /// Falls back to the raw event ticks when the definition carries no
    /// base time, then to a flat 2 seconds as a last resort.
    pub fn skill_duration_secs(
        &self,
        skill_id: u32,
        course_distance: f64,
        fallback_ticks: Option<i32>,
    ) -> f64 {
        let base_time = self.base_duration_ticks(skill_id);
        if base_time > 0 {
            return (base_time as f64 / SKILL_TIME_SCALE) * (course_distance / 1000.0);
        }
        match fallback_ticks {
            Some(ticks) if ticks > 0 => ticks as f64 / SKILL_TIME_SCALE,
            _ => DEFAULT_SKILL_DURATION_SECS,
        }
    }

    /// First positive HP-recovery (type 9) effect value, if any. Negative
    /// values are drain debuffs and are ignored.
    pub fn recovery_value(&self, skill_id: u32) -> Option<i32> {
        self.definition(skill_id)?
            .condition_groups
            .iter()
            .flat_map(|g| &g.effects)
            .find(|e| e.effect_type == EFFECT_HP_RECOVERY && e.value > 0)
            .map(|e| e.value)
    }

    /// Aggregate passive bonuses over a set of activated skill ids.
    /// Adapter helper for `HorseProfile::passive_bonuses`.
    pub fn aggregate_passive_bonuses(&self, skill_ids: impl IntoIterator<Item = u32>) -> StatBonuses {
        let mut total = StatBonuses::default();
        for id in skill_ids {
            total.add(&self.passive_stat_modifiers(id));
        }
        total
    }
}
