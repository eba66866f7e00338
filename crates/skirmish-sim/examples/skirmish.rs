use std::{path::PathBuf, sync::Arc};

use skirmish_core::{
    Mcts, MctsVariant, Portfolio, RandomScriptedPlayer, ScriptKind, SharedPathFinder,
};
use skirmish_sim::{Battle, BfsPathFinder, play_match};

fn main() {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("crates/skirmish-sim/scenarios/two_squads.yaml"));
    let variant = match std::env::args().nth(2) {
        Some(name) => serde_yaml::from_str::<MctsVariant>(&name).expect("unknown variant name"),
        None => MctsVariant::Basic,
    };

    let battle = Battle::from_yaml_path(&path).expect("failed to load scenario YAML");
    let path_finder: SharedPathFinder<Battle> = Arc::new(BfsPathFinder);

    let mut searcher =
        Mcts::for_variant(variant, Arc::clone(&path_finder)).expect("preset should be valid");
    let mut opponent = RandomScriptedPlayer::new(
        Portfolio::from_kinds(
            &[
                ScriptKind::Nokav,
                ScriptKind::Kiter {
                    retreat_distance: 3,
                },
            ],
            path_finder,
        ),
        99,
    );

    let report = play_match(battle, &mut searcher, &mut opponent, 1_000).expect("match failed");

    println!("variant={variant} winner={:?} ticks={}", report.winner, report.ticks);
    println!(
        "remaining_hp={:?} decisions={:?}",
        report.remaining_hp, report.decisions
    );
}
