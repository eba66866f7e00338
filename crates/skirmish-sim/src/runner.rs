use skirmish_core::{Agent, PlayerId, RunError, Snapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
/// How a match between two agents ended.
pub struct MatchReport {
    /// `None` on a draw or when `max_ticks` ran out first.
    pub winner: Option<PlayerId>,
    /// Clock of the final snapshot.
    pub ticks: u64,
    /// Remaining hit points of player 0 and player 1.
    pub remaining_hp: [i32; 2],
    /// Decisions each agent was asked for.
    pub decisions: [u64; 2],
}

/// Play `snapshot` to the end with `first` as player 0 and `second` as player 1.
///
/// Every tick, each player with an idle unit is asked for a joint action; both
/// are issued before time advances. Stops when the game is over or after
/// `max_ticks` ticks. Both agents are reset before the first decision.
pub fn play_match<S, A, B>(
    mut snapshot: S,
    first: &mut A,
    second: &mut B,
    max_ticks: u64,
) -> Result<MatchReport, RunError>
where
    S: Snapshot,
    A: Agent<S> + ?Sized,
    B: Agent<S> + ?Sized,
{
    first.reset();
    second.reset();
    let start = snapshot.clock();
    let mut decisions = [0u64; 2];

    while !snapshot.is_over() && snapshot.clock() < start.saturating_add(max_ticks) {
        let mut chosen = Vec::with_capacity(2);
        if snapshot.can_act(PlayerId::ZERO) {
            chosen.push(first.decide(PlayerId::ZERO, &snapshot)?);
            decisions[0] += 1;
        }
        if snapshot.can_act(PlayerId::ONE) {
            chosen.push(second.decide(PlayerId::ONE, &snapshot)?);
            decisions[1] += 1;
        }
        for action in &chosen {
            if !action.is_empty() {
                log::debug!("tick {}: {action}", snapshot.clock());
            }
            snapshot.issue(action);
        }
        snapshot.tick();
    }

    let report = MatchReport {
        winner: snapshot.winner(),
        ticks: snapshot.clock(),
        remaining_hp: [
            snapshot.hp_sum(PlayerId::ZERO),
            snapshot.hp_sum(PlayerId::ONE),
        ],
        decisions,
    };
    log::info!(
        "{} vs {} ended at tick {} with winner {:?}",
        first.name(),
        second.name(),
        report.ticks,
        report.winner
    );
    Ok(report)
}
