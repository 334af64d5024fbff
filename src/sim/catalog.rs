//! Power-up catalog
//!
//! Each power-up grants effects and carries a drawback. Effects are a closed
//! set of typed variants; the catalog is validated once when it is built, so
//! lookups during play never deal with malformed data.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Power-up identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerUpId {
    Catnip,
    Bell,
    Thunder,
    FullMoon,
    Fish,
    CatToy,
}

impl PowerUpId {
    pub const ALL: [PowerUpId; 6] = [
        PowerUpId::Catnip,
        PowerUpId::Bell,
        PowerUpId::Thunder,
        PowerUpId::FullMoon,
        PowerUpId::Fish,
        PowerUpId::CatToy,
    ];

    /// Wire name, as stored in save data
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpId::Catnip => "catnip",
            PowerUpId::Bell => "bell",
            PowerUpId::Thunder => "thunder",
            PowerUpId::FullMoon => "fullMoon",
            PowerUpId::Fish => "fish",
            PowerUpId::CatToy => "catToy",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rarity {
    Common,
    Rare,
}

/// Multiplicative stat modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Multiplier {
    Speed,
    Drag,
    Score,
    Noise,
    Jump,
    Gravity,
    ComboTime,
}

impl Multiplier {
    pub fn key(self) -> EffectKey {
        match self {
            Multiplier::Speed => EffectKey::SpeedMultiplier,
            Multiplier::Drag => EffectKey::DragMultiplier,
            Multiplier::Score => EffectKey::ScoreMultiplier,
            Multiplier::Noise => EffectKey::NoiseMultiplier,
            Multiplier::Jump => EffectKey::JumpMultiplier,
            Multiplier::Gravity => EffectKey::GravityMultiplier,
            Multiplier::ComboTime => EffectKey::ComboTimeMultiplier,
        }
    }
}

/// Every queryable effect name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKey {
    SpeedMultiplier,
    DragMultiplier,
    ScoreMultiplier,
    NoiseMultiplier,
    JumpMultiplier,
    GravityMultiplier,
    ComboTimeMultiplier,
    SilentMode,
    SilentDuration,
    Cooldown,
    DoubleJump,
    NoiseHealOnBreak,
}

/// Value exposed under an effect key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffectValue {
    Number(f64),
    Flag(bool),
}

impl EffectValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            EffectValue::Number(n) => Some(*n),
            EffectValue::Flag(_) => None,
        }
    }
}

/// One typed effect entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    Multiplier(Multiplier, f64),
    /// Full noise suppression for a duration (seconds)
    Silence { duration_secs: f64 },
    /// Ability cooldown (seconds)
    Cooldown { secs: f64 },
    DoubleJump,
    /// Noise removed whenever an item breaks
    NoiseHealOnBreak(f64),
}

impl Effect {
    pub fn multiplier(&self, kind: Multiplier) -> Option<f64> {
        match *self {
            Effect::Multiplier(k, v) if k == kind => Some(v),
            _ => None,
        }
    }

    /// Value this effect exposes under `key`, if any
    pub fn value(&self, key: EffectKey) -> Option<EffectValue> {
        match (*self, key) {
            (Effect::Multiplier(kind, v), key) if kind.key() == key => Some(EffectValue::Number(v)),
            (Effect::Silence { .. }, EffectKey::SilentMode) => Some(EffectValue::Flag(true)),
            (Effect::Silence { duration_secs }, EffectKey::SilentDuration) => {
                Some(EffectValue::Number(duration_secs))
            }
            (Effect::Cooldown { secs }, EffectKey::Cooldown) => Some(EffectValue::Number(secs)),
            (Effect::DoubleJump, EffectKey::DoubleJump) => Some(EffectValue::Flag(true)),
            (Effect::NoiseHealOnBreak(v), EffectKey::NoiseHealOnBreak) => {
                Some(EffectValue::Number(v))
            }
            _ => None,
        }
    }
}

/// Immutable definition of a power-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpDefinition {
    pub id: PowerUpId,
    pub effect: Vec<Effect>,
    pub side_effect: Vec<Effect>,
    pub rarity: Rarity,
}

impl PowerUpDefinition {
    /// Product of the effect and side-effect factors for `kind` (1.0 if absent)
    pub fn multiplier_factor(&self, kind: Multiplier) -> f64 {
        self.effect
            .iter()
            .chain(&self.side_effect)
            .filter_map(|e| e.multiplier(kind))
            .product()
    }

    /// First value under `key`, effects before side effects
    pub fn value(&self, key: EffectKey) -> Option<EffectValue> {
        self.effect
            .iter()
            .chain(&self.side_effect)
            .find_map(|e| e.value(key))
    }

    fn validate(&self) -> Result<()> {
        let bad = |what: String| {
            Err(EngineError::InvalidCatalog(format!(
                "{}: {}",
                self.id.as_str(),
                what
            )))
        };
        let mut has_silence = false;
        let mut has_cooldown = false;
        for effect in self.effect.iter().chain(&self.side_effect) {
            match *effect {
                Effect::Multiplier(kind, v) if !(v.is_finite() && v > 0.0) => {
                    return bad(format!("{kind:?} multiplier must be positive, got {v}"));
                }
                Effect::Silence { duration_secs } => {
                    if !(duration_secs.is_finite() && duration_secs > 0.0) {
                        return bad(format!("silence duration must be positive, got {duration_secs}"));
                    }
                    has_silence = true;
                }
                Effect::Cooldown { secs } => {
                    if !(secs.is_finite() && secs >= 0.0) {
                        return bad(format!("cooldown must be non-negative, got {secs}"));
                    }
                    has_cooldown = true;
                }
                Effect::NoiseHealOnBreak(v) if !(v.is_finite() && v >= 0.0) => {
                    return bad(format!("heal amount must be non-negative, got {v}"));
                }
                _ => {}
            }
        }
        if has_silence && !has_cooldown {
            return bad("silence requires a cooldown".into());
        }
        Ok(())
    }
}

/// Validated registry of power-up definitions, in a stable order
#[derive(Debug, Clone)]
pub struct PowerUpCatalog {
    definitions: Vec<PowerUpDefinition>,
}

impl PowerUpCatalog {
    /// Validate and build a catalog
    pub fn from_definitions(definitions: Vec<PowerUpDefinition>) -> Result<Self> {
        for (i, def) in definitions.iter().enumerate() {
            if definitions[..i].iter().any(|d| d.id == def.id) {
                return Err(EngineError::InvalidCatalog(format!(
                    "duplicate id {}",
                    def.id.as_str()
                )));
            }
            def.validate()?;
        }
        Ok(Self { definitions })
    }

    /// The shipped power-up set
    pub fn standard() -> Result<Self> {
        Self::from_definitions(standard_definitions())
    }

    pub fn get(&self, id: PowerUpId) -> Option<&PowerUpDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn contains(&self, id: PowerUpId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = PowerUpId> + '_ {
        self.definitions.iter().map(|d| d.id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn standard_definitions() -> Vec<PowerUpDefinition> {
    vec![
        PowerUpDefinition {
            id: PowerUpId::Catnip,
            effect: vec![Effect::Multiplier(Multiplier::Speed, 1.5)],
            // Slippery
            side_effect: vec![Effect::Multiplier(Multiplier::Drag, 0.6)],
            rarity: Rarity::Common,
        },
        PowerUpDefinition {
            id: PowerUpId::Bell,
            effect: vec![Effect::Multiplier(Multiplier::Score, 2.0)],
            side_effect: vec![Effect::Multiplier(Multiplier::Noise, 2.0)],
            rarity: Rarity::Common,
        },
        PowerUpDefinition {
            id: PowerUpId::Thunder,
            effect: vec![Effect::Silence { duration_secs: 10.0 }],
            side_effect: vec![Effect::Cooldown { secs: 60.0 }],
            rarity: Rarity::Rare,
        },
        PowerUpDefinition {
            id: PowerUpId::FullMoon,
            effect: vec![Effect::Multiplier(Multiplier::Jump, 1.4), Effect::DoubleJump],
            // Floaty, harder to control
            side_effect: vec![Effect::Multiplier(Multiplier::Gravity, 0.8)],
            rarity: Rarity::Rare,
        },
        PowerUpDefinition {
            id: PowerUpId::Fish,
            effect: vec![Effect::NoiseHealOnBreak(5.0)],
            side_effect: vec![Effect::Multiplier(Multiplier::Speed, 0.9)],
            rarity: Rarity::Common,
        },
        PowerUpDefinition {
            id: PowerUpId::CatToy,
            effect: vec![Effect::Multiplier(Multiplier::ComboTime, 2.0)],
            side_effect: vec![Effect::Multiplier(Multiplier::Score, 0.9)],
            rarity: Rarity::Common,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_is_valid() {
        let catalog = PowerUpCatalog::standard().unwrap();
        assert_eq!(catalog.len(), 6);
        let ids: Vec<_> = catalog.ids().collect();
        assert_eq!(ids, PowerUpId::ALL.to_vec());
        assert_eq!(catalog.get(PowerUpId::Thunder).unwrap().rarity, Rarity::Rare);
    }

    #[test]
    fn test_definition_lookups() {
        let catalog = PowerUpCatalog::standard().unwrap();
        let thunder = catalog.get(PowerUpId::Thunder).unwrap();
        assert_eq!(thunder.value(EffectKey::SilentMode), Some(EffectValue::Flag(true)));
        assert_eq!(
            thunder.value(EffectKey::SilentDuration),
            Some(EffectValue::Number(10.0))
        );
        assert_eq!(thunder.value(EffectKey::Cooldown), Some(EffectValue::Number(60.0)));
        assert_eq!(thunder.multiplier_factor(Multiplier::Noise), 1.0);

        let bell = catalog.get(PowerUpId::Bell).unwrap();
        assert_eq!(bell.multiplier_factor(Multiplier::Score), 2.0);
        assert_eq!(bell.multiplier_factor(Multiplier::Noise), 2.0);
    }

    #[test]
    fn test_name_round_trip() {
        for id in PowerUpId::ALL {
            assert_eq!(PowerUpId::from_name(id.as_str()), Some(id));
        }
        assert_eq!(PowerUpId::from_name("laserPointer"), None);
        assert_eq!(serde_json::to_string(&PowerUpId::FullMoon).unwrap(), "\"fullMoon\"");
    }

    #[test]
    fn test_validation_rejects_bad_definitions() {
        let silence_only = PowerUpDefinition {
            id: PowerUpId::Thunder,
            effect: vec![Effect::Silence { duration_secs: 5.0 }],
            side_effect: vec![],
            rarity: Rarity::Rare,
        };
        assert!(matches!(
            PowerUpCatalog::from_definitions(vec![silence_only]),
            Err(EngineError::InvalidCatalog(_))
        ));

        let negative = PowerUpDefinition {
            id: PowerUpId::Bell,
            effect: vec![Effect::Multiplier(Multiplier::Score, -2.0)],
            side_effect: vec![],
            rarity: Rarity::Common,
        };
        assert!(PowerUpCatalog::from_definitions(vec![negative]).is_err());

        let mut defs = standard_definitions();
        defs.push(defs[0].clone());
        assert!(PowerUpCatalog::from_definitions(defs).is_err());
    }
}
