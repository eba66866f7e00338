use skirmish_core::{
    Direction, GreedyPathFinder, JointAction, PathFinder, PlayerId, Snapshot, UnitCommand, UnitId,
};
use skirmish_sim::{Battle, BfsPathFinder, ScenarioBuilder, ScenarioSpec, SimError};

fn scenario_path() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/two_squads.yaml")
}

fn issue_one(battle: &mut Battle, id: u64, command: UnitCommand) -> bool {
    let mut joint = JointAction::new();
    joint.insert(UnitId::from(id), command);
    battle.issue(&joint)
}

fn sparring() -> Battle {
    let mut builder = ScenarioBuilder::new(6, 6);
    builder
        .set_seed(3)
        .add_unit(1, 0, (2, 2), 20, (2, 4))
        .add_unit(2, 1, (3, 2), 500, (1, 1));
    builder.build().expect("scenario should be valid")
}

fn hp(battle: &Battle, id: u64) -> i32 {
    battle
        .unit(UnitId::from(id))
        .map(|u| u.hp)
        .expect("unit should be alive")
}

#[test]
fn damage_rolls_stay_in_range_and_replay_on_clones() {
    let mut battle = sparring();
    let mut replay = battle.clone();
    let mut rolls = Vec::new();

    for _ in 0..40 {
        let before = hp(&battle, 2);
        assert!(issue_one(&mut battle, 1, UnitCommand::Attack { x: 3, y: 2 }));
        battle.tick();
        rolls.push(before - hp(&battle, 2));
    }
    assert!(rolls.iter().all(|roll| (2..=4).contains(roll)), "{rolls:?}");
    assert!(rolls.iter().any(|roll| *roll != rolls[0]), "rolls should vary");

    for roll in &rolls {
        let before = hp(&replay, 2);
        assert!(issue_one(&mut replay, 1, UnitCommand::Attack { x: 3, y: 2 }));
        replay.tick();
        assert_eq!(before - hp(&replay, 2), *roll);
    }
}

#[test]
fn moves_reserve_their_destination_until_they_land() {
    let mut builder = ScenarioBuilder::new(5, 5);
    builder
        .add_unit(1, 0, (1, 1), 10, (1, 1))
        .add_unit(2, 0, (3, 1), 10, (1, 1))
        .add_unit(3, 1, (4, 4), 10, (1, 1));
    builder.set_durations(1, 1, 3).expect("unit 1 exists");
    let mut battle = builder.build().expect("scenario should be valid");

    let right = UnitCommand::Move {
        direction: Direction::Right,
    };
    let left = UnitCommand::Move {
        direction: Direction::Left,
    };
    assert!(issue_one(&mut battle, 1, right));
    assert!(battle.is_busy(UnitId::from(1)));
    assert!(!battle.is_free(2, 1));
    assert!(!issue_one(&mut battle, 2, left), "cell (2, 1) is reserved");

    battle.tick();
    battle.tick();
    assert_eq!(
        battle.unit(UnitId::from(1)).map(|u| u.position()),
        Some((1, 1))
    );
    battle.tick();
    assert_eq!(
        battle.unit(UnitId::from(1)).map(|u| u.position()),
        Some((2, 1))
    );
    assert!(!battle.is_busy(UnitId::from(1)));
}

#[test]
fn attacks_need_an_enemy_in_range() {
    let mut battle = sparring();
    assert!(!issue_one(&mut battle, 1, UnitCommand::Attack { x: 4, y: 2 }));
    assert!(!issue_one(&mut battle, 1, UnitCommand::Attack { x: 2, y: 2 }));
    assert!(!issue_one(&mut battle, 1, UnitCommand::Idle { duration: 0 }));
    assert!(issue_one(&mut battle, 1, UnitCommand::Attack { x: 3, y: 2 }));
}

#[test]
fn killing_the_last_enemy_ends_the_game() {
    let mut builder = ScenarioBuilder::new(4, 1);
    builder
        .add_unit(1, 0, (0, 0), 5, (3, 3))
        .add_unit(2, 1, (1, 0), 3, (1, 1));
    let mut battle = builder.build().expect("scenario should be valid");

    assert!(issue_one(&mut battle, 1, UnitCommand::Attack { x: 1, y: 0 }));
    assert!(battle.tick(), "the tick that kills the last enemy ends the game");
    assert!(battle.is_over());
    assert_eq!(battle.winner(), Some(PlayerId::ZERO));
    assert!(battle.unit(UnitId::from(2)).is_none());
}

#[test]
fn time_limit_decides_by_hit_points() {
    let mut builder = ScenarioBuilder::new(8, 1);
    builder
        .set_time_limit(2)
        .add_unit(1, 0, (0, 0), 5, (1, 1))
        .add_unit(2, 1, (7, 0), 9, (1, 1));
    let mut battle = builder.build().expect("scenario should be valid");

    assert_eq!(battle.winner(), None);
    battle.tick();
    assert!(!battle.is_over());
    battle.tick();
    assert!(battle.is_over());
    assert_eq!(battle.winner(), Some(PlayerId::ONE));

    let mut tied = ScenarioBuilder::new(8, 1);
    tied.set_time_limit(1)
        .add_unit(1, 0, (0, 0), 5, (1, 1))
        .add_unit(2, 1, (7, 0), 5, (1, 1));
    let mut tied = tied.build().expect("scenario should be valid");
    tied.tick();
    assert!(tied.is_over());
    assert_eq!(tied.winner(), None);
}

#[test]
fn bundled_scenario_loads() {
    let spec =
        ScenarioSpec::from_yaml_path(scenario_path()).expect("scenario YAML should parse");
    assert_eq!(spec.units.len(), 6);

    let battle = Battle::from_yaml_path(scenario_path()).expect("scenario should build");
    assert_eq!(battle.units().len(), 6);
    assert_eq!(battle.time_limit(), 400);
    let archer = battle.unit(UnitId::from(3)).expect("archer exists");
    assert_eq!(archer.attack_range, 3);
    assert_eq!(archer.max_hp, archer.hp);
    assert_eq!(battle.units_of(PlayerId::ONE).count(), 3);
}

#[test]
fn scenarios_round_trip_through_yaml_files() {
    let spec =
        ScenarioSpec::from_yaml_path(scenario_path()).expect("scenario YAML should parse");
    let path = std::env::temp_dir().join(format!(
        "skirmish-sim-roundtrip-{}.yaml",
        std::process::id()
    ));

    spec.to_yaml_path(&path).expect("scenario should be written");
    let reloaded = ScenarioSpec::from_yaml_path(&path).expect("written scenario should parse");
    std::fs::remove_file(&path).expect("temp file should be removable");

    assert_eq!(reloaded, spec);
}

const BASE: &str = "
width: 4
height: 4
time_limit: 10
units:
  - { id: 1, player: 0, x: 0, y: 0, hp: 5, min_damage: 1, max_damage: 2 }
  - { id: 2, player: 1, x: 3, y: 3, hp: 5, min_damage: 1, max_damage: 2 }
";

fn base() -> ScenarioSpec {
    ScenarioSpec::from_yaml_str(BASE).expect("base scenario should parse")
}

#[test]
fn validation_rejects_broken_scenarios() {
    let mut spec = base();
    spec.units[1].id = 1;
    assert!(matches!(
        spec.validate(),
        Err(SimError::DuplicateUnitId { id: 1 })
    ));

    let mut spec = base();
    spec.units[1].x = 4;
    assert!(matches!(
        spec.validate(),
        Err(SimError::UnitOutOfBounds { id: 2, .. })
    ));

    let mut spec = base();
    spec.units[1].x = 0;
    spec.units[1].y = 0;
    assert!(matches!(
        spec.validate(),
        Err(SimError::OverlappingUnits {
            first: 1,
            second: 2,
            ..
        })
    ));

    let mut spec = base();
    spec.units[0].player = 2;
    assert!(matches!(
        spec.validate(),
        Err(SimError::UnknownPlayer { id: 1, player: 2 })
    ));

    let mut spec = base();
    spec.units[0].max_damage = 0;
    assert!(matches!(
        spec.validate(),
        Err(SimError::InvalidStats {
            id: 1,
            field: "damage",
            ..
        })
    ));

    let mut spec = base();
    spec.units[0].attack_range = 0;
    assert!(matches!(
        spec.build(),
        Err(SimError::InvalidStats {
            field: "attack_range",
            ..
        })
    ));

    let mut spec = base();
    spec.time_limit = 0;
    assert!(matches!(spec.validate(), Err(SimError::ZeroTimeLimit)));

    let mut spec = base();
    spec.width = 0;
    assert!(matches!(
        spec.validate(),
        Err(SimError::InvalidMapSize { .. })
    ));
}

#[test]
fn missing_files_and_bad_yaml_are_reported() {
    let missing = ScenarioSpec::from_yaml_path("does/not/exist.yaml");
    assert!(matches!(missing, Err(SimError::Io(_))));

    let bad = ScenarioSpec::from_yaml_str("width: [1, 2]");
    assert!(matches!(bad, Err(SimError::Yaml(_))));

    let path = std::env::temp_dir().join(format!("skirmish-sim-bad-{}.yaml", std::process::id()));
    std::fs::write(&path, "width: nope\n").expect("temp file should be writable");
    let parsed = ScenarioSpec::from_yaml_path(&path);
    std::fs::remove_file(&path).expect("temp file should be removable");
    assert!(matches!(parsed, Err(SimError::Yaml(_))));
}

#[test]
fn builder_reports_unknown_units() {
    let mut builder = ScenarioBuilder::new(3, 3);
    builder.add_unit(1, 0, (0, 0), 5, (1, 1));
    assert!(matches!(
        builder.set_range(7, 2),
        Err(SimError::BuilderUnknownUnit { id: 7 })
    ));
}

fn walled() -> Battle {
    let mut builder = ScenarioBuilder::new(5, 3);
    builder
        .add_unit(1, 0, (1, 1), 5, (1, 1))
        .add_unit(2, 0, (2, 0), 5, (1, 1))
        .add_unit(3, 0, (2, 1), 5, (1, 1))
        .add_unit(4, 1, (4, 0), 5, (1, 1));
    builder.build().expect("scenario should be valid")
}

#[test]
fn bfs_walks_around_walls_where_greedy_gives_up() {
    let battle = walled();
    let unit = battle.unit(UnitId::from(1)).expect("unit exists").clone();

    assert_eq!(GreedyPathFinder.move_toward(&unit, 4, 1, &battle), None);

    let bfs = BfsPathFinder;
    assert_eq!(
        bfs.move_toward(&unit, 4, 1, &battle),
        Some(UnitCommand::Move {
            direction: Direction::Down
        })
    );
    assert_eq!(bfs.move_toward(&unit, 1, 1, &battle), None);
    assert_eq!(PathFinder::<Battle>::name(&bfs), "bfs");
}

#[test]
fn bfs_stops_once_inside_range() {
    let mut builder = ScenarioBuilder::new(8, 1);
    builder
        .add_unit(1, 0, (0, 0), 5, (1, 1))
        .add_unit(2, 1, (6, 0), 5, (1, 1));
    let battle = builder.build().expect("scenario should be valid");
    let unit = battle.unit(UnitId::from(1)).expect("unit exists").clone();

    assert_eq!(
        BfsPathFinder.move_within_range(&unit, 6, 0, 3, &battle),
        Some(UnitCommand::Move {
            direction: Direction::Right
        })
    );
    assert_eq!(BfsPathFinder.move_within_range(&unit, 2, 0, 3, &battle), None);
}
