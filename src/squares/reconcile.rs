//! Live-score reconciliation: turn one scoreboard poll into the score write and any
//! quarter awards it makes due.
//!
//! Awards are decided on the cumulative score at the end of each quarter, never on
//! the score at poll time, since a poll can land well after a quarter ends. A quarter
//! that already has a winner is skipped, so re-running on every poll is harmless.

use super::award::award_for_score;
use super::{FINAL_QUARTER, GameState, Quarter, QuarterAward, Score, Teams};
use nfl_api::{Game, GameState as FeedState};

/// Pick the game to track: the configured matchup, else any game in progress, else
/// the last game listed.
pub fn select_game<'a>(games: &'a [Game], teams: &Teams) -> Option<&'a Game> {
    games
        .iter()
        .find(|g| g.involves(&teams.home.abbrev, &teams.away.abbrev))
        .or_else(|| games.iter().find(|g| g.is_live()))
        .or_else(|| games.last())
}

/// Feed status as a board quarter: 0 before kickoff, the period (capped at 4) during
/// play, 5 once final.
pub fn normalize_quarter(game: &Game) -> u8 {
    match game.state {
        FeedState::Scheduled => 0,
        FeedState::InProgress => game.period.min(4),
        FeedState::Final => FINAL_QUARTER,
    }
}

/// Running score as the feed reports it right now.
pub fn live_score(game: &Game) -> Score {
    Score::new(
        u32::from(game.home.score),
        u32::from(game.away.score),
        normalize_quarter(game),
    )
}

/// Score a quarter closed on, if the feed shows that quarter is over.
///
/// Q1–Q3 use the running sum of per-period points and need the game to have moved
/// past the quarter (or finished). Q4 waits for the final whistle and uses the final
/// totals, overtime included.
pub fn quarter_end_score(game: &Game, quarter: Quarter) -> Option<Score> {
    let q = usize::from(quarter.number());
    let reported = game.periods_reported();
    if q > reported {
        return None;
    }

    if quarter == Quarter::Q4 {
        if !game.is_final() {
            return None;
        }
        return Some(Score::new(
            u32::from(game.home.score),
            u32::from(game.away.score),
            quarter.number(),
        ));
    }

    if reported <= q && !game.is_final() {
        return None;
    }
    Some(Score::new(
        u32::from(game.home.score_through(q)?),
        u32::from(game.away.score_through(q)?),
        quarter.number(),
    ))
}

/// Writes owed after one poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Always written; the same feed data yields the same score.
    pub score: Score,
    /// Newly decided awards, in quarter order.
    pub awards: Vec<(Quarter, QuarterAward)>,
    /// Quarters a finished game left unawarded because the feed lacks their
    /// per-period scores. These need a manual award.
    pub stalled: Vec<Quarter>,
}

/// Plan the writes for one poll of `game` against the current snapshot.
pub fn reconcile(state: &GameState, game: &Game, teams: &Teams) -> ReconcilePlan {
    let mut plan = ReconcilePlan {
        score: live_score(game),
        ..Default::default()
    };

    let Some(board) = state.board.as_ref() else {
        return plan;
    };

    for quarter in Quarter::ALL {
        if state.awards.contains(quarter) {
            continue;
        }
        match quarter_end_score(game, quarter) {
            Some(score) => {
                if let Some(award) = award_for_score(board, score, teams) {
                    plan.awards.push((quarter, award));
                }
            }
            None if game.is_final() => plan.stalled.push(quarter),
            None => {}
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::squares::Board;
    use nfl_api::{Competitor, Team};

    fn team(abbrev: &str) -> Team {
        Team { id: String::new(), name: String::new(), abbrev: abbrev.into() }
    }

    fn game(state: FeedState, period: u8, home: &[u16], away: &[u16]) -> Game {
        Game {
            id: "1".into(),
            home: Competitor { team: team("NE"), score: home.iter().sum(), linescores: home.to_vec() },
            away: Competitor { team: team("SEA"), score: away.iter().sum(), linescores: away.to_vec() },
            state,
            period,
            ..Default::default()
        }
    }

    /// Board whose square (r, c) is owned by "r{r}c{c}" with identity labels, so the
    /// owner name spells out the digits it was resolved from.
    fn identity_board() -> Board {
        let grid = (0..10)
            .map(|r| (0..10).map(|c| format!("r{r}c{c}")).collect())
            .collect();
        let digits: Vec<u8> = (0..10).collect();
        Board::from_parts(grid, digits.clone(), digits).unwrap()
    }

    fn locked() -> GameState {
        GameState { board: Some(identity_board()), ..Default::default() }
    }

    #[test]
    fn test_selects_tracked_matchup_then_live_then_last() {
        let teams = Teams::default();
        let mut other_live = game(FeedState::InProgress, 2, &[7], &[0]);
        other_live.home.team = team("DAL");
        other_live.away.team = team("NYG");
        let mut other_final = other_live.clone();
        other_final.state = FeedState::Final;
        other_final.id = "last".into();
        let mut tracked = game(FeedState::Scheduled, 0, &[], &[]);
        tracked.id = "tracked".into();

        let games = vec![other_live.clone(), tracked, other_final.clone()];
        assert_eq!(select_game(&games, &teams).map(|g| g.id.as_str()), Some("tracked"));

        let mut live = other_live;
        live.id = "live".into();
        let games = vec![other_final.clone(), live];
        assert_eq!(select_game(&games, &teams).map(|g| g.id.as_str()), Some("live"));

        let games = vec![other_final.clone(), other_final];
        assert_eq!(select_game(&games, &teams).map(|g| g.id.as_str()), Some("last"));
        assert!(select_game(&[], &teams).is_none());
    }

    #[test]
    fn test_feed_status_normalizes_to_board_quarter() {
        assert_eq!(normalize_quarter(&game(FeedState::Scheduled, 0, &[], &[])), 0);
        assert_eq!(normalize_quarter(&game(FeedState::InProgress, 3, &[], &[])), 3);
        assert_eq!(normalize_quarter(&game(FeedState::InProgress, 5, &[], &[])), 4);
        assert_eq!(normalize_quarter(&game(FeedState::Final, 4, &[], &[])), 5);
    }

    #[test]
    fn test_finished_game_awards_quarter_one_from_its_own_score() {
        let g = game(FeedState::Final, 4, &[7, 10, 0, 7], &[3, 7, 0, 7]);
        assert_eq!((g.home.score, g.away.score), (24, 17));

        let plan = reconcile(&locked(), &g, &Teams::default());
        assert_eq!(plan.score, Score::new(24, 17, 5));

        let (q, first) = &plan.awards[0];
        assert_eq!(*q, Quarter::Q1);
        // home 7 -> column 7, away 3 -> row 3
        assert_eq!(first.winner, "r3c7");
        assert_eq!(first.score, "Seahawks 3 - Patriots 7");
    }

    #[test]
    fn test_finished_game_awards_every_open_quarter_with_cumulative_scores() {
        let g = game(FeedState::Final, 4, &[7, 10, 0, 7], &[3, 7, 0, 7]);
        let plan = reconcile(&locked(), &g, &Teams::default());

        let winners: Vec<(u8, &str)> = plan
            .awards
            .iter()
            .map(|(q, a)| (q.number(), a.winner.as_str()))
            .collect();
        assert_eq!(winners, vec![(1, "r3c7"), (2, "r0c7"), (3, "r0c7"), (4, "r7c4")]);
        assert!(plan.stalled.is_empty());
    }

    #[test]
    fn test_quarter_in_progress_is_not_awarded() {
        // Second quarter under way: Q1 is over, Q2 is not.
        let g = game(FeedState::InProgress, 2, &[7, 3], &[0, 0]);
        let plan = reconcile(&locked(), &g, &Teams::default());
        let quarters: Vec<Quarter> = plan.awards.iter().map(|(q, _)| *q).collect();
        assert_eq!(quarters, vec![Quarter::Q1]);
        assert_eq!(plan.score, Score::new(10, 0, 2));
    }

    #[test]
    fn test_fourth_quarter_waits_for_the_final_whistle() {
        let g = game(FeedState::InProgress, 4, &[7, 7, 7, 7], &[0, 0, 0, 3]);
        let plan = reconcile(&locked(), &g, &Teams::default());
        let quarters: Vec<Quarter> = plan.awards.iter().map(|(q, _)| *q).collect();
        assert_eq!(quarters, vec![Quarter::Q1, Quarter::Q2, Quarter::Q3]);
    }

    #[test]
    fn test_awarded_quarters_are_skipped() {
        let mut state = locked();
        let existing = QuarterAward { winner: "kept".into(), row: 9, col: 9, score: "x".into() };
        state.awards.insert(Quarter::Q1, existing.clone());

        let g = game(FeedState::Final, 4, &[7, 10, 0, 7], &[3, 7, 0, 7]);
        let plan = reconcile(&state, &g, &Teams::default());
        assert!(plan.awards.iter().all(|(q, _)| *q != Quarter::Q1));
        assert_eq!(plan.awards.len(), 3);
        assert_eq!(state.awards.get(Quarter::Q1), Some(&existing));
    }

    #[test]
    fn test_repeated_polls_plan_identical_writes() {
        let g = game(FeedState::InProgress, 3, &[7, 3, 0], &[0, 14, 0]);
        let state = locked();
        assert_eq!(
            reconcile(&state, &g, &Teams::default()),
            reconcile(&state, &g, &Teams::default())
        );
    }

    #[test]
    fn test_unlocked_board_only_writes_the_score() {
        let g = game(FeedState::Final, 4, &[7, 10, 0, 7], &[3, 7, 0, 7]);
        let plan = reconcile(&GameState::default(), &g, &Teams::default());
        assert_eq!(plan.score, Score::new(24, 17, 5));
        assert!(plan.awards.is_empty());
    }

    #[test]
    fn test_finished_game_without_linescores_stalls_instead_of_guessing() {
        let mut g = game(FeedState::Final, 4, &[], &[]);
        g.home.score = 24;
        g.away.score = 17;
        let plan = reconcile(&locked(), &g, &Teams::default());
        assert!(plan.awards.is_empty());
        assert_eq!(plan.stalled, Quarter::ALL.to_vec());
    }

    #[test]
    fn test_pregame_poll_writes_zero_score_and_no_awards() {
        let g = game(FeedState::Scheduled, 0, &[], &[]);
        let plan = reconcile(&locked(), &g, &Teams::default());
        assert_eq!(plan.score, Score::default());
        assert!(plan.awards.is_empty());
        assert!(plan.stalled.is_empty());
    }
}
