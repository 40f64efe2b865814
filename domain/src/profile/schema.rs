//! Per-relation schema: recognized keys, promotions and scoped config keys.

use super::promotion::{Promotion, PromotionInput, PromotionOutcome};
use crate::config::LocalConfig;
use crate::relation::fact::FactKind;
use crate::relation::registry::PeerFacts;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationSchema {
    pub name: &'static str,
    /// Keys pulled from the substrate on relation-changed.
    pub keys: Vec<(&'static str, FactKind)>,
    pub promotions: Vec<Promotion>,
    /// Local config keys derived from this relation, cleared when its last
    /// peer departs.
    pub scoped_keys: Vec<&'static str>,
}

impl RelationSchema {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            keys: Vec::new(),
            promotions: Vec::new(),
            scoped_keys: Vec::new(),
        }
    }

    pub fn key(mut self, key: &'static str, kind: FactKind) -> Self {
        self.keys.push((key, kind));
        self
    }

    /// Recognize `fact_key` and copy it into `config_key`; the config key is
    /// scoped to this relation.
    pub fn promote(
        mut self,
        fact_key: &'static str,
        kind: FactKind,
        config_key: &'static str,
    ) -> Self {
        self.keys.push((fact_key, kind));
        self.promotions.push(Promotion::Copy {
            fact_key,
            config_key,
        });
        self.scoped_keys.push(config_key);
        self
    }

    pub fn with_promotion(mut self, promotion: Promotion) -> Self {
        self.promotions.push(promotion);
        self
    }

    pub fn scoped(mut self, config_key: &'static str) -> Self {
        if !self.scoped_keys.contains(&config_key) {
            self.scoped_keys.push(config_key);
        }
        self
    }

    /// Declared kind of a key; unknown keys are opaque text.
    pub fn kind_of(&self, key: &str) -> FactKind {
        self.keys
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, kind)| *kind)
            .unwrap_or(FactKind::Text)
    }

    pub fn recognizes(&self, key: &str) -> bool {
        self.keys.iter().any(|(k, _)| *k == key)
    }

    /// Apply every promotion to one peer's stored facts.
    pub fn promote_facts(&self, facts: &PeerFacts, config: &mut LocalConfig) -> PromotionOutcome {
        let kind_of = |key: &str| self.kind_of(key);
        let input = PromotionInput {
            relation: self.name,
            facts,
            kind_of: &kind_of,
        };
        let mut outcome = PromotionOutcome::default();
        for promotion in &self.promotions {
            promotion.apply(&input, config, &mut outcome);
        }
        outcome
    }
}
