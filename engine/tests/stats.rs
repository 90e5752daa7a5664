use combat_engine::stats::{
    Formula, Maxima, ModifierSource, SourceKind, StatCategory, StatKind, StatModifier, StatsError,
    proficiency_bonus,
};
use combat_engine::{AbilityScores, Attribute, DerivedStat, StatsAggregator};

fn aggregator(scores: AbilityScores, level: u32) -> StatsAggregator {
    StatsAggregator::new(scores, level).unwrap()
}

fn all_stats() -> Vec<StatKind> {
    Attribute::ALL
        .into_iter()
        .map(StatKind::from)
        .chain(DerivedStat::ALL.into_iter().map(StatKind::from))
        .collect()
}

#[test]
fn derived_table_for_average_scores() {
    let stats = aggregator(AbilityScores::default(), 1);
    assert_eq!(stats.derived(DerivedStat::MaxHealth), 12);
    assert_eq!(stats.derived(DerivedStat::MaxMana), 22);
    assert_eq!(stats.derived(DerivedStat::MaxStamina), 22);
    assert_eq!(stats.derived(DerivedStat::Initiative), 0);
    assert_eq!(stats.derived(DerivedStat::AttackBonus), 2);
    assert_eq!(stats.derived(DerivedStat::Defense), 10);
    assert_eq!(stats.derived(DerivedStat::DamageReduction), 0);
    assert_eq!(stats.derived(DerivedStat::CarryCapacity), 150);
}

#[test]
fn health_scales_with_constitution_and_level() {
    let tough = AbilityScores::default().with(Attribute::Constitution, 14);
    assert_eq!(aggregator(tough, 1).derived(DerivedStat::MaxHealth), 18);
    assert_eq!(aggregator(tough, 5).derived(DerivedStat::MaxHealth), 34);

    let frail = AbilityScores::default().with(Attribute::Constitution, 9);
    assert_eq!(aggregator(frail, 1).derived(DerivedStat::MaxHealth), 10);
    assert_eq!(aggregator(frail, 1).derived(DerivedStat::DamageReduction), 0);
}

#[test]
fn formula_inputs_are_declared() {
    let f: &Formula = DerivedStat::Initiative.formula();
    assert_eq!(f.inputs, &[Attribute::Dexterity]);
    assert!(!f.uses_level);
    assert!(DerivedStat::MaxHealth.formula().uses_level);
    assert_eq!(
        DerivedStat::MaxMana.formula().inputs,
        &[Attribute::Intelligence, Attribute::Wisdom]
    );
}

#[test]
fn proficiency_steps_every_four_levels() {
    assert_eq!(proficiency_bonus(1), 2);
    assert_eq!(proficiency_bonus(4), 2);
    assert_eq!(proficiency_bonus(5), 3);
    assert_eq!(proficiency_bonus(17), 6);
}

#[test]
fn categories_group_attributes() {
    assert_eq!(Attribute::Strength.category(), StatCategory::Physical);
    assert_eq!(Attribute::Wisdom.category(), StatCategory::Mental);
    assert_eq!(Attribute::Charisma.category(), StatCategory::Social);
    let stat = AbilityScores::default().stat(Attribute::Dexterity);
    assert_eq!(stat.base, 10);
    assert_eq!(stat.category(), StatCategory::Physical);
}

#[test]
fn rejects_out_of_range_scores_and_zero_level() {
    let bad = AbilityScores::default().with(Attribute::Strength, 31);
    assert_eq!(
        StatsAggregator::new(bad, 1),
        Err(StatsError::ScoreOutOfRange {
            attribute: Attribute::Strength,
            score: 31,
        })
    );
    assert_eq!(
        StatsAggregator::new(AbilityScores::default(), 0),
        Err(StatsError::ZeroLevel)
    );

    let mut stats = aggregator(AbilityScores::default(), 1);
    assert!(stats.set_base(Attribute::Wisdom, 0).is_err());
    assert_eq!(stats.attribute(Attribute::Wisdom), 10);
    stats.set_base(Attribute::Wisdom, 18).unwrap();
    assert_eq!(stats.derived(DerivedStat::MaxMana), 30);
}

#[test]
fn derived_stats_read_effective_primaries() {
    let mut stats = aggregator(AbilityScores::default(), 1);
    stats
        .add_modifier(StatModifier::flat(
            Attribute::Constitution,
            4,
            ModifierSource::new(SourceKind::Spell, "bear_endurance"),
        ))
        .unwrap();
    assert_eq!(stats.base(Attribute::Constitution.into()), 10);
    assert_eq!(stats.attribute(Attribute::Constitution), 14);
    assert_eq!(stats.base(DerivedStat::MaxHealth.into()), 18);
    assert_eq!(stats.derived(DerivedStat::DamageReduction), 2);
}

#[test]
fn level_up_reports_maxima_and_must_increase() {
    let tough = AbilityScores::default().with(Attribute::Constitution, 14);
    let mut stats = aggregator(tough, 1);
    let change = stats.level_up(3).unwrap();
    assert_eq!(change.from, 1);
    assert_eq!(change.to, 3);
    assert_eq!(
        change.before,
        Maxima {
            health: 18,
            mana: 22,
            stamina: 26,
        }
    );
    assert_eq!(change.after.health, 26);
    assert_eq!(stats.level(), 3);

    assert_eq!(
        stats.level_up(3),
        Err(StatsError::LevelNotIncreasing {
            current: 3,
            requested: 3,
        })
    );
}

#[test]
fn serde_round_trip_preserves_every_stat() {
    let scores = AbilityScores {
        strength: 15,
        dexterity: 13,
        constitution: 12,
        intelligence: 8,
        wisdom: 11,
        charisma: 17,
    };
    let mut stats = aggregator(scores, 4);
    stats
        .add_modifier(
            StatModifier::percent(
                DerivedStat::MaxHealth,
                25,
                ModifierSource::new(SourceKind::Class, "barbarian"),
            )
            .semi_permanent(),
        )
        .unwrap();
    stats
        .add_modifier(
            StatModifier::flat(
                Attribute::Strength,
                -2,
                ModifierSource::new(SourceKind::Status, "exhaustion"),
            )
            .for_rounds(3),
        )
        .unwrap();

    let json = serde_json::to_string(&stats).unwrap();
    let back: StatsAggregator = serde_json::from_str(&json).unwrap();
    assert_eq!(back, stats);
    for stat in all_stats() {
        assert_eq!(back.get(stat), stats.get(stat), "{stat}");
    }
}

#[test]
fn missing_scores_default_to_ten() {
    let scores: AbilityScores = serde_json::from_str(r#"{"strength": 16}"#).unwrap();
    assert_eq!(scores.strength, 16);
    assert_eq!(scores.wisdom, 10);
}

#[test]
fn derived_formulas_survive_extreme_primaries() {
    let clumsy = AbilityScores::default().with(Attribute::Dexterity, 5);
    let mut stats = aggregator(clumsy, 1);
    stats
        .add_modifier(StatModifier::flat(
            Attribute::Dexterity,
            i32::MIN,
            ModifierSource::new(SourceKind::Status, "petrified"),
        ))
        .unwrap();
    assert_eq!(stats.attribute(Attribute::Dexterity), i32::MIN + 5);
    assert!(stats.derived(DerivedStat::Defense) < 0);
    assert!(stats.derived(DerivedStat::Initiative) < 0);
}

#[test]
fn loading_checks_scores_and_level() {
    let stats = aggregator(AbilityScores::default(), 2);
    let mut json = serde_json::to_value(&stats).unwrap();
    assert!(serde_json::from_value::<StatsAggregator>(json.clone()).is_ok());

    json["level"] = serde_json::json!(0);
    assert!(serde_json::from_value::<StatsAggregator>(json.clone()).is_err());

    json["level"] = serde_json::json!(2);
    json["scores"]["strength"] = serde_json::json!(-500);
    let err = serde_json::from_value::<StatsAggregator>(json).unwrap_err();
    assert!(err.to_string().contains("outside 1..=30"));
}
