use combat_engine::stats::{ModifierSource, SourceKind, StatModifier};
use combat_engine::{
    AbilityScores, AdMode, Attribute, CheckInput, Dice, StatsAggregator, ability_mod, check,
};

#[test]
fn ability_mod_rounds_down() {
    assert_eq!(ability_mod(1), -5);
    assert_eq!(ability_mod(8), -1);
    assert_eq!(ability_mod(9), -1);
    assert_eq!(ability_mod(10), 0);
    assert_eq!(ability_mod(11), 0);
    assert_eq!(ability_mod(12), 1);
    assert_eq!(ability_mod(30), 10);
}

#[test]
fn deterministic_check_total_consistent() {
    let mut dice = Dice::from_seed(123);
    let res = check(
        &mut dice,
        CheckInput {
            dc: 13,
            modifier: 2,
            mode: AdMode::Normal,
        },
    );
    assert_eq!(res.passed, res.total >= res.dc);
    assert_eq!(res.total, res.roll + 2);
}

#[test]
fn advantage_keeps_higher_and_records_both() {
    let mut dice = Dice::from_scripted(vec![4, 17]);
    let res = check(
        &mut dice,
        CheckInput {
            dc: 15,
            modifier: 0,
            mode: AdMode::Advantage,
        },
    );
    assert_eq!(res.roll, 17);
    assert_eq!(res.raw, vec![4, 17]);
    assert!(res.passed);

    let mut dice = Dice::from_scripted(vec![4, 17]);
    let res = check(
        &mut dice,
        CheckInput {
            dc: 15,
            modifier: 0,
            mode: AdMode::Disadvantage,
        },
    );
    assert_eq!(res.roll, 4);
    assert!(!res.passed);
}

#[test]
fn attribute_check_uses_effective_score() {
    let scores = AbilityScores::default().with(Attribute::Dexterity, 16);
    let mut stats = StatsAggregator::new(scores, 1).unwrap();
    stats
        .add_modifier(StatModifier::flat(
            Attribute::Dexterity,
            2,
            ModifierSource::new(SourceKind::Equipment, "boots"),
        ))
        .unwrap();

    let mut dice = Dice::from_scripted(vec![10]);
    let res = stats.check(&mut dice, Attribute::Dexterity, 14, AdMode::Normal);
    assert_eq!(res.total, 14);
    assert!(res.passed);
}
