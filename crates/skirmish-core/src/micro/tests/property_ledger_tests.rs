use std::{
    collections::{BTreeSet, HashSet},
    sync::Arc,
};

use proptest::prelude::*;

use crate::{
    game::{
        command::UnitCommand,
        ids::PlayerId,
        path::GreedyPathFinder,
        snapshot::Snapshot,
        testing::{TestField, soldier},
    },
    micro::{
        generator::JointActionGenerator,
        ledger::DamageLedger,
        script::{Portfolio, ScriptKind},
    },
};

fn field_from(placements: &[(i32, i32, i32, bool)]) -> TestField {
    let mut field = TestField::new(6, 6);
    let mut taken = HashSet::new();
    for (index, (x, y, hp, second_side)) in placements.iter().enumerate() {
        if !taken.insert((*x, *y)) {
            continue;
        }
        let player = if *second_side { 1 } else { 0 };
        field = field.with_unit(soldier(index as u64 + 1, player, *x, *y, *hp));
    }
    field
}

proptest! {
    #[test]
    fn no_overkill_target_is_ever_already_doomed(
        placements in proptest::collection::vec((0i32..6, 0i32..6, 1i32..6, any::<bool>()), 2..7),
        seed in any::<u64>(),
    ) {
        let field = field_from(&placements);
        prop_assume!(field.can_act(PlayerId::ZERO));
        prop_assume!(field.units().iter().any(|u| u.player == PlayerId::ONE));

        let portfolio = Portfolio::from_kinds(
            &[ScriptKind::Nokav, ScriptKind::Kiter { retreat_distance: 2 }],
            Arc::new(GreedyPathFinder),
        );
        let mut generator = JointActionGenerator::new(
            &field,
            portfolio,
            PlayerId::ZERO,
            &DamageLedger::new(),
            seed,
        )
        .expect("player 0 has idle units");

        let mut returned = 0u64;
        while let Some(action) = generator.next_action() {
            returned += 1;
            let sources = generator
                .corresponding_abstract_actions(&action)
                .expect("sources are recorded");

            let mut running = DamageLedger::new();
            for (unit, source) in sources {
                let Some((target, amount)) = source.assigned_damage() else {
                    continue;
                };
                let hp = field.unit(target).map(|u| u.hp).expect("target exists");
                prop_assert!(
                    running.assigned(target) < hp,
                    "unit {} picked doomed target {}", unit, target
                );
                running.add(target, amount);
            }

            let mut destinations = BTreeSet::new();
            for (unit, command) in action.iter() {
                if let UnitCommand::Move { .. } = command {
                    let mover = field.unit(unit).expect("mover exists");
                    prop_assert!(destinations.insert(command.destination(mover)));
                }
            }
        }
        prop_assert!(returned <= generator.action_count());
    }
}
