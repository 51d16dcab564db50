//! Wave catalogue per strategy

use gleaner_domain::{EntityType, Strategy, Wave};

/// People, organizations and places
pub const CORE_ENTITIES: &[EntityType] = &[
    EntityType::Person,
    EntityType::Organization,
    EntityType::Location,
];

/// Dates, money and percentages
pub const TEMPORAL_FINANCIAL: &[EntityType] = &[
    EntityType::Date,
    EntityType::MonetaryAmount,
    EntityType::Percentage,
];

/// Statutes, citations, courts and contracts
pub const LEGAL_REFERENCES: &[EntityType] = &[
    EntityType::Statute,
    EntityType::CaseCitation,
    EntityType::Court,
    EntityType::Contract,
];

/// Products and events
pub const SUPPLEMENTARY: &[EntityType] = &[EntityType::Product, EntityType::Event];

/// Waves executed by a strategy, in ordinal order
pub fn waves_for(strategy: Strategy) -> Vec<Wave> {
    match strategy {
        Strategy::SinglePass => vec![Wave::entities(1, "combined", &EntityType::ALL)],
        Strategy::MultiWave | Strategy::MultiWaveChunked => vec![
            Wave::entities(1, "core_entities", CORE_ENTITIES),
            Wave::entities(2, "temporal_financial", TEMPORAL_FINANCIAL),
            Wave::entities(3, "legal_references", LEGAL_REFERENCES),
            Wave::relationships(4, &[1, 2, 3]),
        ],
        // Strict total order: every wave waits for its predecessor
        Strategy::FallbackDeep => vec![
            Wave::entities(1, "core_entities", CORE_ENTITIES),
            Wave::entities(2, "temporal_financial", TEMPORAL_FINANCIAL).depending_on(1),
            Wave::entities(3, "legal_references", LEGAL_REFERENCES).depending_on(2),
            Wave::entities(4, "supplementary", SUPPLEMENTARY).depending_on(3),
            Wave::relationships(5, &[1, 2, 3, 4]),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_single_pass_covers_full_taxonomy() {
        let waves = waves_for(Strategy::SinglePass);
        assert_eq!(waves.len(), 1);
        assert_eq!(waves[0].target_types.len(), EntityType::ALL.len());
        assert!(waves[0].depends_on.is_empty());
    }

    #[test]
    fn test_multi_wave_relationships_depend_on_entity_waves() {
        let waves = waves_for(Strategy::MultiWave);
        assert_eq!(waves.len(), 4);
        assert!(waves[..3].iter().all(|w| w.depends_on.is_empty()));
        assert!(waves[3].is_relationship_wave());
        assert_eq!(waves[3].depends_on, vec![1, 2, 3]);
        assert_eq!(waves, waves_for(Strategy::MultiWaveChunked));
    }

    #[test]
    fn test_fallback_deep_is_totally_ordered() {
        let waves = waves_for(Strategy::FallbackDeep);
        assert_eq!(waves.len(), 5);
        for pair in waves.windows(2) {
            assert!(pair[1].depends_on.contains(&pair[0].ordinal));
        }
    }

    #[test]
    fn test_entity_waves_partition_taxonomy() {
        let waves = waves_for(Strategy::FallbackDeep);
        let mut seen = BTreeSet::new();
        for wave in waves.iter().filter(|w| !w.is_relationship_wave()) {
            for t in &wave.target_types {
                assert!(seen.insert(*t), "{} in two waves", t);
            }
        }
        assert_eq!(seen.len(), EntityType::ALL.len());
    }

    #[test]
    fn test_ordinals_are_sequential() {
        for strategy in [
            Strategy::SinglePass,
            Strategy::MultiWave,
            Strategy::MultiWaveChunked,
            Strategy::FallbackDeep,
        ] {
            let ordinals: Vec<u8> = waves_for(strategy).iter().map(|w| w.ordinal).collect();
            let expected: Vec<u8> = (1..=ordinals.len() as u8).collect();
            assert_eq!(ordinals, expected);
        }
    }
}
