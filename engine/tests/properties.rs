use std::collections::HashSet;

use proptest::prelude::*;

use combat_engine::combat::AttackOutcome;
use combat_engine::{
    AbilityScores, Attribute, CombatAction, CombatEntity, CombatEvent, CombatManager,
    CombatState, DerivedStat, Dice, ModifierManager, ModifierSource, Resource, Role, SourceKind,
    StatKind, StatModifier, StatsAggregator,
};

fn average(id: &str, role: Role) -> CombatEntity {
    let stats = StatsAggregator::new(AbilityScores::default(), 1).unwrap();
    CombatEntity::new(id, id, role, stats)
}

fn with_defense(defense: i32) -> CombatEntity {
    let mut target = average("target", Role::Enemy);
    target
        .add_modifier(StatModifier::flat(
            DerivedStat::Defense,
            defense - 10,
            ModifierSource::new(SourceKind::Equipment, "armor"),
        ))
        .unwrap();
    target
}

fn pools_in_bounds(entity: &CombatEntity) -> bool {
    Resource::ALL.iter().all(|r| {
        let pool = entity.pool(*r);
        0 <= pool.current() && pool.current() <= pool.max()
    })
}

fn attack_outcome(combat: &CombatManager) -> Option<AttackOutcome> {
    combat.log().entries().iter().find_map(|e| match &e.event {
        CombatEvent::Attack { outcome, .. } => Some(*outcome),
        _ => None,
    })
}

#[derive(Debug, Clone)]
enum PoolOp {
    Damage(i32),
    Heal(i32),
    Spend(Resource, i32),
    Buff(i32),
}

fn pool_op() -> impl Strategy<Value = PoolOp> {
    prop_oneof![
        (-5..40i32).prop_map(PoolOp::Damage),
        (-5..40i32).prop_map(PoolOp::Heal),
        (prop::sample::select(Resource::ALL.to_vec()), 0..30i32)
            .prop_map(|(r, n)| PoolOp::Spend(r, n)),
        (-30..30i32).prop_map(PoolOp::Buff),
    ]
}

proptest! {
    #[test]
    fn pools_stay_clamped(ops in prop::collection::vec(pool_op(), 1..40)) {
        let mut entity = average("hero", Role::Player);
        for (i, op) in ops.into_iter().enumerate() {
            match op {
                PoolOp::Damage(n) => { entity.apply_damage(n); }
                PoolOp::Heal(n) => { entity.heal(n); }
                PoolOp::Spend(r, n) => { let _ = entity.spend(r, n); }
                PoolOp::Buff(n) => {
                    let source = ModifierSource::new(SourceKind::Spell, format!("buff{i}"));
                    let target = match i % 3 {
                        0 => DerivedStat::MaxHealth,
                        1 => DerivedStat::MaxMana,
                        _ => DerivedStat::MaxStamina,
                    };
                    entity.add_modifier(StatModifier::flat(target, n, source).for_rounds(2)).unwrap();
                }
            }
            prop_assert!(pools_in_bounds(&entity));
            if i % 4 == 0 {
                entity.tick_round();
                prop_assert!(pools_in_bounds(&entity));
            }
        }
    }

    #[test]
    fn natural_twenty_always_crits(defense in -50i32..200) {
        let mut dice = Dice::from_scripted(vec![15, 5, 20, 3]);
        let mut combat = CombatManager::default();
        combat.start_combat(vec![average("hero", Role::Player), with_defense(defense)], &mut dice).unwrap();
        combat.perform_action(&CombatAction::attack("hero", "target", "1d4".parse().unwrap()), &mut dice).unwrap();
        prop_assert_eq!(attack_outcome(&combat), Some(AttackOutcome::Critical));
    }

    #[test]
    fn natural_one_always_misses(defense in -50i32..200) {
        let mut dice = Dice::from_scripted(vec![15, 5, 1]);
        let mut combat = CombatManager::default();
        combat.start_combat(vec![average("hero", Role::Player), with_defense(defense)], &mut dice).unwrap();
        combat.perform_action(&CombatAction::attack("hero", "target", "1d4".parse().unwrap()), &mut dice).unwrap();
        prop_assert_eq!(attack_outcome(&combat), Some(AttackOutcome::Fumble));
        let target = combat.entities().find(|e| e.id().as_str() == "target").unwrap();
        prop_assert_eq!(target.health().current(), target.health().max());
    }

    #[test]
    fn turn_order_is_a_permutation(seed in any::<u64>(), extra in 0usize..6) {
        let mut roster = vec![average("hero", Role::Player), average("boss", Role::Enemy)];
        for i in 0..extra {
            let role = if i % 2 == 0 { Role::Ally } else { Role::Creature };
            roster.push(average(&format!("e{i}"), role));
        }
        let ids: HashSet<String> = roster.iter().map(|e| e.id().to_string()).collect();
        let mut dice = Dice::from_seed(seed);
        let mut combat = CombatManager::default();
        combat.start_combat(roster, &mut dice).unwrap();

        let order: Vec<String> = combat.turn_order().iter().map(|id| id.to_string()).collect();
        let unique: HashSet<String> = order.iter().cloned().collect();
        prop_assert_eq!(order.len(), ids.len());
        prop_assert_eq!(unique, ids);
    }

    #[test]
    fn effective_value_matches_formula(
        base in -100i32..100,
        flats in prop::collection::vec(-20i32..20, 0..5),
        percents in prop::collection::vec(-80i32..80, 0..4),
    ) {
        let stat = StatKind::Primary(Attribute::Strength);
        let mut mods = ModifierManager::new();
        for (i, v) in flats.iter().enumerate() {
            mods.add(StatModifier::flat(stat, *v, ModifierSource::new(SourceKind::Item, format!("f{i}")))).unwrap();
        }
        for (i, v) in percents.iter().enumerate() {
            mods.add(StatModifier::percent(stat, *v, ModifierSource::new(SourceKind::Spell, format!("p{i}")))).unwrap();
        }
        let subtotal = i64::from(base) + flats.iter().map(|v| i64::from(*v)).sum::<i64>();
        let multiplier = (100 + percents.iter().map(|v| i64::from(*v)).sum::<i64>()).max(0);
        let expected = (subtotal * multiplier).div_euclid(100) as i32;
        prop_assert_eq!(mods.effective_value(stat, base), expected);
    }

    #[test]
    fn derived_stats_are_monotonic(
        low in 1i32..30,
        bump in 0i32..10,
        level in 1u32..20,
        level_bump in 0u32..5,
    ) {
        let high = (low + bump).min(30);
        let at = |attribute: Attribute, score: i32, level: u32, derived: DerivedStat| {
            StatsAggregator::new(AbilityScores::default().with(attribute, score), level)
                .unwrap()
                .derived(derived)
        };
        let cases = [
            (Attribute::Constitution, DerivedStat::MaxHealth),
            (Attribute::Intelligence, DerivedStat::MaxMana),
            (Attribute::Wisdom, DerivedStat::MaxMana),
            (Attribute::Dexterity, DerivedStat::Initiative),
            (Attribute::Strength, DerivedStat::CarryCapacity),
            (Attribute::Strength, DerivedStat::AttackBonus),
        ];
        for (attribute, derived) in cases {
            prop_assert!(at(attribute, low, level, derived) <= at(attribute, high, level, derived));
            prop_assert!(
                at(attribute, low, level, derived) <= at(attribute, low, level + level_bump, derived)
            );
        }
    }

    #[test]
    fn seeded_brawls_keep_invariants(seed in any::<u64>()) {
        let mut dice = Dice::from_seed(seed);
        let mut combat = CombatManager::default();
        combat.start_combat(
            vec![average("hero", Role::Player), average("ally", Role::Ally), average("orc", Role::Enemy)],
            &mut dice,
        ).unwrap();

        let mut last_round = combat.round();
        for _ in 0..300 {
            let Some(current) = combat.current_turn().cloned() else { break };
            let side = combat.entity(&current).unwrap().side();
            let target = combat
                .entities()
                .find(|e| !e.is_defeated() && side.opposes(e.side()))
                .map(|e| e.id().clone())
                .unwrap();
            let action = CombatAction::attack(current, target, "1d6+2".parse().unwrap());
            combat.perform_action(&action, &mut dice).unwrap();

            prop_assert!(combat.entities().all(pools_in_bounds));
            prop_assert!(combat.round() == last_round || combat.round() == last_round + 1);
            last_round = combat.round();
        }
        prop_assert!(combat.state() != CombatState::InProgress);
    }

    #[test]
    fn extreme_modifiers_saturate_instead_of_overflowing(
        values in prop::collection::vec(any::<i32>(), 1..6),
        percents in prop::collection::vec(any::<i32>(), 0..3),
        attribute in prop::sample::select(Attribute::ALL.to_vec()),
    ) {
        let mut stats = StatsAggregator::new(AbilityScores::default(), 1).unwrap();
        for (i, v) in values.iter().enumerate() {
            let source = ModifierSource::new(SourceKind::Item, format!("f{i}"));
            stats.add_modifier(StatModifier::flat(attribute, *v, source)).unwrap();
        }
        for (i, v) in percents.iter().enumerate() {
            let source = ModifierSource::new(SourceKind::Spell, format!("p{i}"));
            stats.add_modifier(StatModifier::percent(attribute, *v, source)).unwrap();
        }

        let sum: i64 = values.iter().map(|v| i64::from(*v)).sum::<i64>() + 10;
        let percent: i64 = 100 + percents.iter().map(|v| i64::from(*v)).sum::<i64>();
        let expected = sum.saturating_mul(percent.max(0)).div_euclid(100);
        let expected = expected.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        prop_assert_eq!(stats.get(StatKind::Primary(attribute)), expected);

        for derived in DerivedStat::ALL {
            let _ = stats.derived(derived);
        }
        let mut entity = CombatEntity::new("x", "X", Role::Player, stats);
        entity.refresh_maxima();
        prop_assert!(pools_in_bounds(&entity));
        let _ = entity.damage_reduction();
        let _ = entity.agility();
    }
}
