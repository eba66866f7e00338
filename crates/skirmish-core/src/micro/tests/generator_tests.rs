use std::sync::Arc;

use crate::{
    game::{
        command::{JointAction, UnitCommand},
        ids::{PlayerId, UnitId},
        path::GreedyPathFinder,
        snapshot::Snapshot,
        testing::{TestField, archer, soldier},
    },
    micro::{
        generator::{GeneratorError, JointActionGenerator},
        ledger::DamageLedger,
        script::{Portfolio, ScriptKind},
    },
};

fn portfolio(kinds: &[ScriptKind]) -> Portfolio<TestField> {
    Portfolio::from_kinds(kinds, Arc::new(GreedyPathFinder))
}

fn nokav_and_kiter() -> Portfolio<TestField> {
    portfolio(&[
        ScriptKind::Nokav,
        ScriptKind::Kiter {
            retreat_distance: 2,
        },
    ])
}

fn two_duels() -> TestField {
    TestField::new(10, 10)
        .with_unit(soldier(1, 0, 1, 1, 10))
        .with_unit(soldier(2, 0, 6, 6, 10))
        .with_unit(soldier(3, 1, 2, 1, 10))
        .with_unit(soldier(4, 1, 7, 6, 10))
}

/// Every joint action the generator hands out, with the kinds of the
/// abstract actions behind it.
fn drain(
    generator: &mut JointActionGenerator<TestField>,
) -> Vec<(JointAction, Vec<&'static str>)> {
    let mut seen = Vec::new();
    while let Some(action) = generator.next_action() {
        let kinds = generator
            .corresponding_abstract_actions(&action)
            .expect("sources are recorded")
            .values()
            .map(|source| source.kind())
            .collect();
        seen.push((action, kinds));
    }
    seen
}

#[test]
fn enumerates_exactly_the_action_count_without_conflicts() {
    let field = two_duels();
    let mut generator =
        JointActionGenerator::new(&field, nokav_and_kiter(), PlayerId::ZERO, &DamageLedger::new(), 3)
            .expect("player 0 has idle units");

    assert_eq!(generator.action_count(), 4);
    assert!(generator.has_more());
    let actions = drain(&mut generator);
    assert_eq!(actions.len() as u64, generator.action_count());
    assert!(!generator.has_more());
    assert_eq!(generator.next_action(), None);

    for (action, kinds) in &actions {
        assert_eq!(action.get(UnitId::from(1)), Some(&UnitCommand::Attack { x: 2, y: 1 }));
        assert_eq!(action.get(UnitId::from(2)), Some(&UnitCommand::Attack { x: 7, y: 6 }));
        assert_eq!(kinds.len(), 2);
    }
    let mut kinds: Vec<_> = actions.into_iter().map(|(_, kinds)| kinds).collect();
    kinds.sort();
    kinds.dedup();
    assert_eq!(kinds.len(), 4, "every script combination appears once");
}

#[test]
fn same_seed_yields_the_same_sequence() {
    let field = two_duels();
    let run = |seed| {
        let mut generator = JointActionGenerator::new(
            &field,
            nokav_and_kiter(),
            PlayerId::ZERO,
            &DamageLedger::new(),
            seed,
        )
        .expect("player 0 has idle units");
        drain(&mut generator)
    };

    assert_eq!(run(11), run(11));
}

#[test]
fn refuses_a_player_without_idle_units() {
    let mut field = two_duels();
    let mut busy = JointAction::new();
    busy.insert(UnitId::from(1), UnitCommand::Idle { duration: 5 });
    busy.insert(UnitId::from(2), UnitCommand::Idle { duration: 5 });
    assert!(field.issue(&busy));

    let result =
        JointActionGenerator::new(&field, nokav_and_kiter(), PlayerId::ZERO, &DamageLedger::new(), 0);
    assert!(matches!(
        result,
        Err(GeneratorError::NoAssignableUnits { player }) if player == PlayerId::ZERO
    ));
}

#[test]
fn busy_units_are_not_assignable() {
    let mut field = two_duels();
    let mut busy = JointAction::new();
    busy.insert(UnitId::from(2), UnitCommand::Idle { duration: 5 });
    assert!(field.issue(&busy));

    let generator =
        JointActionGenerator::new(&field, nokav_and_kiter(), PlayerId::ZERO, &DamageLedger::new(), 0)
            .expect("unit 1 is idle");
    assert_eq!(generator.assignable_units(), &[UnitId::from(1)]);
    assert_eq!(generator.action_count(), 2);
}

#[test]
fn random_action_attacks_in_a_nokav_duel() {
    let field = TestField::new(6, 6)
        .with_unit(soldier(1, 0, 2, 2, 10))
        .with_unit(soldier(2, 1, 3, 2, 10));

    for seed in 0..16 {
        for (player, target) in [(PlayerId::ZERO, (3, 2)), (PlayerId::ONE, (2, 2))] {
            let mut generator = JointActionGenerator::new(
                &field,
                portfolio(&[ScriptKind::Nokav]),
                player,
                &DamageLedger::new(),
                seed,
            )
            .expect("both sides have an idle unit");
            let action = generator.random_action();
            assert_eq!(action.len(), 1);
            let (_, command) = action.iter().next().expect("one command");
            assert_eq!(
                *command,
                UnitCommand::Attack {
                    x: target.0,
                    y: target.1
                }
            );
        }
    }
}

#[test]
fn doomed_targets_are_skipped() {
    let field = TestField::new(8, 8)
        .with_unit(archer(1, 0, 1, 1, 10))
        .with_unit(soldier(2, 1, 2, 1, 1))
        .with_unit(soldier(3, 1, 1, 3, 10));
    let mut prior = DamageLedger::new();
    prior.add(UnitId::from(2), 1);

    let mut generator =
        JointActionGenerator::new(&field, portfolio(&[ScriptKind::Nokav]), PlayerId::ZERO, &prior, 0)
            .expect("archer is idle");
    let action = generator.next_action().expect("one combination");
    assert_eq!(
        action.get(UnitId::from(1)),
        Some(&UnitCommand::Attack { x: 1, y: 3 })
    );
}

#[test]
fn falls_back_to_idling_without_targets() {
    let field = TestField::new(6, 6)
        .with_unit(soldier(1, 0, 2, 2, 10))
        .with_unit(soldier(2, 1, 3, 2, 1));
    let mut prior = DamageLedger::new();
    prior.add(UnitId::from(2), 2);

    let mut generator =
        JointActionGenerator::new(&field, nokav_and_kiter(), PlayerId::ZERO, &prior, 0)
            .expect("unit 1 is idle");
    let action = generator.random_action();
    assert_eq!(action.get(UnitId::from(1)), Some(&UnitCommand::none()));
    assert!(
        generator
            .corresponding_abstract_actions(&action)
            .is_some_and(|sources| sources.is_empty())
    );
}

#[test]
fn random_samples_share_one_ledger() {
    let field = TestField::new(6, 6)
        .with_unit(soldier(1, 0, 2, 2, 10))
        .with_unit(soldier(2, 1, 3, 2, 1));

    let mut generator = JointActionGenerator::new(
        &field,
        portfolio(&[ScriptKind::Nokav]),
        PlayerId::ZERO,
        &DamageLedger::new(),
        4,
    )
    .expect("unit 1 is idle");

    let first = generator.random_action();
    assert_eq!(
        first.get(UnitId::from(1)),
        Some(&UnitCommand::Attack { x: 3, y: 2 })
    );
    assert_eq!(generator.ledger().assigned(UnitId::from(2)), 2);

    let second = generator.random_action();
    assert_eq!(second.get(UnitId::from(1)), Some(&UnitCommand::none()));
}
