use combat_engine::stats::{AddOutcome, ModifierError, ModifierScope};
use combat_engine::{
    Attribute, DerivedStat, ModifierManager, ModifierSource, SourceKind, StatKind, StatModifier,
};

const STR: StatKind = StatKind::Primary(Attribute::Strength);

fn src(kind: SourceKind, id: &str) -> ModifierSource {
    ModifierSource::new(kind, id)
}

#[test]
fn same_source_refreshes_instead_of_stacking() {
    let mut mods = ModifierManager::new();
    let bless = src(SourceKind::Spell, "bless");
    assert_eq!(
        mods.add(StatModifier::flat(STR, 2, bless.clone()).for_rounds(2)),
        Ok(AddOutcome::Added)
    );
    let outcome = mods
        .add(StatModifier::flat(STR, 3, bless.clone()).for_rounds(5))
        .unwrap();
    assert!(matches!(outcome, AddOutcome::Refreshed(old) if old.value == 2));
    assert_eq!(mods.len(), 1);
    assert_eq!(mods.effective_value(STR, 10), 13);
    assert_eq!(mods.iter().next().unwrap().remaining_rounds(), Some(5));
}

#[test]
fn distinct_sources_stack_additively() {
    let mut mods = ModifierManager::new();
    mods.add(StatModifier::flat(STR, 2, src(SourceKind::Spell, "bless")))
        .unwrap();
    mods.add(StatModifier::flat(STR, 1, src(SourceKind::Equipment, "belt")))
        .unwrap();
    mods.add(StatModifier::flat(STR, -1, src(SourceKind::Status, "tired")))
        .unwrap();
    assert_eq!(mods.additive_total(STR), 2);
    assert_eq!(mods.effective_value(STR, 10), 12);
}

#[test]
fn same_source_on_other_stat_is_separate() {
    let mut mods = ModifierManager::new();
    let ring = src(SourceKind::Item, "ring");
    mods.add(StatModifier::flat(STR, 1, ring.clone())).unwrap();
    mods.add(StatModifier::flat(Attribute::Dexterity, 1, ring))
        .unwrap();
    assert_eq!(mods.len(), 2);
}

#[test]
fn percentages_sum_then_apply_to_subtotal() {
    let mut mods = ModifierManager::new();
    let health = StatKind::Derived(DerivedStat::MaxHealth);
    mods.add(StatModifier::flat(health, 10, src(SourceKind::Class, "fighter")))
        .unwrap();
    mods.add(StatModifier::percent(health, 20, src(SourceKind::Racial, "dwarf")))
        .unwrap();
    mods.add(StatModifier::percent(health, 30, src(SourceKind::Spell, "aid")))
        .unwrap();
    // (20 + 10) * 150 / 100
    assert_eq!(mods.effective_value(health, 20), 45);
}

#[test]
fn percentage_floor_and_zero_multiplier() {
    let mut mods = ModifierManager::new();
    mods.add(StatModifier::percent(STR, -150, src(SourceKind::Status, "drain")))
        .unwrap();
    assert_eq!(mods.effective_value(STR, 10), 0);

    let mut mods = ModifierManager::new();
    mods.add(StatModifier::percent(STR, 10, src(SourceKind::Spell, "x")))
        .unwrap();
    assert_eq!(mods.effective_value(STR, 15), 16);
}

#[test]
fn tick_expires_exactly_at_zero() {
    let mut mods = ModifierManager::new();
    mods.add(StatModifier::flat(STR, 4, src(SourceKind::Spell, "rage")).for_rounds(2))
        .unwrap();
    mods.add(StatModifier::flat(STR, 1, src(SourceKind::Equipment, "belt")))
        .unwrap();

    assert!(mods.tick().is_empty());
    assert_eq!(mods.effective_value(STR, 10), 15);

    let expired = mods.tick();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].source.id, "rage");
    assert_eq!(mods.effective_value(STR, 10), 11);
    assert!(mods.tick().is_empty());
}

#[test]
fn zero_duration_is_rejected() {
    let mut mods = ModifierManager::new();
    let err = mods
        .add(StatModifier::flat(STR, 1, src(SourceKind::Spell, "blink")).for_rounds(0))
        .unwrap_err();
    assert!(matches!(err, ModifierError::ZeroDuration { .. }));
    assert!(mods.is_empty());
}

#[test]
fn remove_all_from_source_is_bulk() {
    let mut mods = ModifierManager::new();
    let haste = src(SourceKind::Spell, "haste");
    mods.add(StatModifier::flat(Attribute::Dexterity, 2, haste.clone()))
        .unwrap();
    mods.add(StatModifier::flat(DerivedStat::Defense, 2, haste))
        .unwrap();
    mods.add(StatModifier::flat(STR, 2, src(SourceKind::Skill, "haste")))
        .unwrap();

    let removed = mods.remove_all_from_source(SourceKind::Spell, "haste");
    assert_eq!(removed.len(), 2);
    assert_eq!(mods.len(), 1);
    assert!(mods.remove_all_from_source(SourceKind::Spell, "haste").is_empty());
}

#[test]
fn semi_permanent_survives_ticks_until_cleared() {
    let mut mods = ModifierManager::new();
    mods.add(StatModifier::flat(STR, 2, src(SourceKind::Narrative, "oath")).semi_permanent())
        .unwrap();
    for _ in 0..10 {
        mods.tick();
    }
    assert_eq!(mods.effective_value(STR, 10), 12);
    let cleared = mods.clear_semi_permanent();
    assert_eq!(cleared.len(), 1);
    assert_eq!(cleared[0].scope, ModifierScope::SemiPermanent);
    assert_eq!(mods.effective_value(STR, 10), 10);
}

#[test]
fn modifier_json_shape() {
    let json = r#"{
        "target": {"derived": "defense"},
        "value": 2,
        "scope": {"kind": "temporary", "rounds": 3},
        "source": {"kind": "spell", "id": "shield_of_faith"}
    }"#;
    let m: StatModifier = serde_json::from_str(json).unwrap();
    assert_eq!(m.target, StatKind::Derived(DerivedStat::Defense));
    assert!(!m.is_percentage);
    assert_eq!(m.remaining_rounds(), Some(3));
    assert_eq!(m.source.to_string(), "spell:shield_of_faith");
}

#[test]
fn huge_totals_saturate() {
    let mut mods = ModifierManager::new();
    mods.add(StatModifier::flat(STR, i32::MAX, src(SourceKind::Item, "belt")))
        .unwrap();
    mods.add(StatModifier::flat(STR, 1, src(SourceKind::Spell, "bull"))).unwrap();
    assert_eq!(mods.additive_total(STR), i32::MAX);
    assert_eq!(mods.effective_value(STR, 10), i32::MAX);

    mods.add(StatModifier::flat(STR, i32::MIN, src(SourceKind::Status, "curse")))
        .unwrap();
    mods.add(StatModifier::flat(STR, i32::MIN, src(SourceKind::Narrative, "doom")))
        .unwrap();
    assert_eq!(mods.effective_value(STR, 0), i32::MIN);
}

#[test]
fn loading_rejects_what_add_would_reject() {
    let bless = StatModifier::flat(STR, 2, src(SourceKind::Spell, "bless")).for_rounds(2);
    let other = StatModifier::flat(STR, 1, src(SourceKind::Item, "ring"));

    let ok = serde_json::to_string(&vec![bless.clone(), other]).unwrap();
    let loaded: ModifierManager = serde_json::from_str(&ok).unwrap();
    assert_eq!(loaded.len(), 2);

    let twice = serde_json::to_string(&vec![bless.clone(), bless.clone()]).unwrap();
    assert!(serde_json::from_str::<ModifierManager>(&twice).is_err());
    assert!(matches!(
        ModifierManager::try_from(vec![bless.clone(), bless]),
        Err(ModifierError::DuplicateSlot { .. })
    ));
}
