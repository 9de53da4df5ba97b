//! Replay recorded runs on a controller
//!
//! A journal holds the seed, difficulty and every accepted plan of a run.
//! Replaying it on a controller loaded with the same content rebuilds the
//! run day by day; comparing the rebuilt history with a recorded one shows
//! whether the engine is still deterministic for that run.

use crate::{Error, Result};
use guildedin_core::{DailyExpense, Journal, RunId};
use guildedin_hub::{Controller, GameRunSnapshot};
use log::{debug, warn};

/// State of the replayer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayState {
    /// No run started yet
    Idle,
    /// Run started, entries remaining
    Replaying,
    /// Every entry has been submitted
    Finished,
}

/// First point where a replay stopped matching the record
#[derive(Debug, Clone, PartialEq)]
pub struct Divergence {
    pub day: u32,
    /// The recorded settlement, if the record reaches this day
    pub expected: Option<DailyExpense>,
    /// The replayed settlement, if the plan was accepted
    pub actual: Option<DailyExpense>,
    pub reason: String,
}

/// Outcome of a verified replay
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    /// The rebuilt run as it stood when replay stopped
    pub run: GameRunSnapshot,
    pub days_replayed: usize,
    pub divergence: Option<Divergence>,
}

impl ReplayReport {
    /// True when every replayed day matched the record
    pub fn is_consistent(&self) -> bool {
        self.divergence.is_none()
    }
}

/// Replayer for a recorded journal
///
/// Provides control over rebuilding a run:
/// - Step one recorded day at a time
/// - Jump to a day
/// - Replay to the end, optionally checking against a recorded history
///
/// The rebuilt run is registered on the controller only while the replay is
/// in progress. [`Replayer::run_to_end`] and [`Replayer::verify`] unregister
/// it and hand back its final state; dropping the replayer unregisters it too.
pub struct Replayer<'a> {
    controller: &'a Controller,
    journal: &'a Journal,
    state: ReplayState,
    position: usize,
    run_id: Option<RunId>,
    registered: bool,
}

impl<'a> Replayer<'a> {
    /// Create a replayer; nothing happens until the first step
    pub fn new(controller: &'a Controller, journal: &'a Journal) -> Self {
        Self {
            controller,
            journal,
            state: ReplayState::Idle,
            position: 0,
            run_id: None,
            registered: false,
        }
    }

    /// Get the current state
    pub fn state(&self) -> ReplayState {
        self.state
    }

    /// Number of entries submitted so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Entries not yet submitted
    pub fn remaining(&self) -> usize {
        self.journal.len() - self.position
    }

    /// The rebuilt run's id on the controller, once started
    pub fn run_id(&self) -> Option<RunId> {
        self.run_id
    }

    /// Start the rebuilt run from the journal's seed and difficulty
    pub fn start(&mut self) -> Result<RunId> {
        if let Some(id) = self.run_id {
            return Ok(id);
        }
        let snapshot = self
            .controller
            .start_run_with_seed(self.journal.difficulty, self.journal.seed)?;
        let id = snapshot.id();
        debug!(
            "replaying {} as {} ({} entries)",
            self.journal.run_id,
            id,
            self.journal.len()
        );
        self.run_id = Some(id);
        self.registered = true;
        self.state = if self.journal.is_empty() {
            ReplayState::Finished
        } else {
            ReplayState::Replaying
        };
        Ok(id)
    }

    /// Submit the next recorded plan
    ///
    /// Returns `None` once the journal is exhausted. A recorded plan that is
    /// rejected, or that settles on a different day than recorded, is a
    /// divergence.
    pub fn step(&mut self) -> Result<Option<DailyExpense>> {
        let run_id = self.start()?;
        let Some(entry) = self.journal.entries().get(self.position) else {
            self.state = ReplayState::Finished;
            return Ok(None);
        };

        let expense = self
            .controller
            .submit_daily_plan(run_id, entry.plan.clone())
            .map_err(|err| Error::Divergence {
                day: entry.day,
                reason: format!("recorded plan rejected: {}", err),
            })?;
        if expense.day != entry.day {
            return Err(Error::Divergence {
                day: entry.day,
                reason: format!("plan settled on day {}", expense.day),
            });
        }

        self.position += 1;
        if self.position == self.journal.len() {
            self.state = ReplayState::Finished;
        }
        Ok(Some(expense))
    }

    /// Replay until the rebuilt run reaches `day`
    pub fn goto(&mut self, day: u32) -> Result<()> {
        let run_id = self.start()?;
        let last = self.journal.last_day().map_or(0, |d| d + 1);
        if day > last {
            return Err(Error::Replay(format!(
                "day {} is past the end of the journal (day {})",
                day, last
            )));
        }
        while self.controller.run_status(run_id)?.day() < day {
            if self.step()?.is_none() {
                break;
            }
        }
        Ok(())
    }

    /// Replay every remaining entry and return the rebuilt run
    pub fn run_to_end(&mut self) -> Result<GameRunSnapshot> {
        self.start()?;
        while self.step()?.is_some() {}
        self.release()
    }

    /// Unregister the rebuilt run and return its final state
    fn release(&mut self) -> Result<GameRunSnapshot> {
        let run_id = self.start()?;
        if !self.registered {
            return Err(Error::Replay(format!("{} was already released", run_id)));
        }
        self.registered = false;
        Ok(self.controller.remove_run(run_id)?)
    }

    /// Replay every remaining entry, comparing each day with `expected`
    ///
    /// Stops at the first mismatch and reports it instead of failing.
    pub fn verify(&mut self, expected: &[DailyExpense]) -> Result<ReplayReport> {
        self.start()?;
        let mut days_replayed = 0;
        let mut divergence = None;

        loop {
            let recorded_day = self.journal.entries().get(self.position).map(|e| e.day);
            let step = match self.step() {
                Ok(step) => step,
                Err(Error::Divergence { day, reason }) => {
                    divergence = Some(Divergence {
                        day,
                        expected: find_day(expected, day),
                        actual: None,
                        reason,
                    });
                    break;
                }
                Err(err) => return Err(err),
            };
            let Some(actual) = step else {
                break;
            };
            days_replayed += 1;

            let day = recorded_day.unwrap_or(actual.day);
            match find_day(expected, day) {
                Some(recorded) if same_settlement(&recorded, &actual) => {}
                Some(recorded) => {
                    divergence = Some(Divergence {
                        day,
                        reason: describe_mismatch(&recorded, &actual),
                        expected: Some(recorded),
                        actual: Some(actual),
                    });
                    break;
                }
                None => {
                    divergence = Some(Divergence {
                        day,
                        expected: None,
                        actual: Some(actual),
                        reason: "no recorded settlement for this day".to_string(),
                    });
                    break;
                }
            }
        }

        if let Some(d) = &divergence {
            warn!("replay of {} diverged on day {}: {}", self.journal.run_id, d.day, d.reason);
        }
        Ok(ReplayReport {
            run: self.release()?,
            days_replayed,
            divergence,
        })
    }
}

impl Drop for Replayer<'_> {
    fn drop(&mut self) {
        if let (true, Some(id)) = (self.registered, self.run_id) {
            if let Err(err) = self.controller.remove_run(id) {
                warn!("could not unregister replayed {}: {}", id, err);
            }
        }
    }
}

/// Replay a whole journal and check it against a recorded history
///
/// The controller's registry is left as it was found.
pub fn replay(
    controller: &Controller,
    journal: &Journal,
    expected: &[DailyExpense],
) -> Result<ReplayReport> {
    Replayer::new(controller, journal).verify(expected)
}

fn find_day(history: &[DailyExpense], day: u32) -> Option<DailyExpense> {
    history.iter().find(|e| e.day == day).cloned()
}

/// Equal apart from the run id, which differs between controllers
fn same_settlement(expected: &DailyExpense, actual: &DailyExpense) -> bool {
    let mut actual = actual.clone();
    actual.run_id = expected.run_id;
    *expected == actual
}

fn describe_mismatch(expected: &DailyExpense, actual: &DailyExpense) -> String {
    if expected.resulting_treasury != actual.resulting_treasury {
        format!(
            "treasury {} recorded, {} replayed",
            expected.resulting_treasury, actual.resulting_treasury
        )
    } else if expected.outcomes != actual.outcomes {
        "outcomes differ".to_string()
    } else if expected.lines != actual.lines {
        "ledger lines differ".to_string()
    } else {
        "settlement differs".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guildedin_core::{AdventurerId, DailyPlan, Difficulty, StatKind, SubAction};
    use guildedin_hub::{ControllerConfig, DifficultyTable};
    use guildedin_script::Loader;

    fn controller() -> Controller {
        let content = Loader::standard().unwrap();
        Controller::with_config(
            content.catalog,
            content.talent,
            content.difficulties,
            ControllerConfig::default(),
        )
        .unwrap()
    }

    fn plans() -> Vec<DailyPlan> {
        let train = |id, stat| {
            DailyPlan::partial(vec![SubAction::Train {
                adventurer: AdventurerId(id),
                stat,
            }])
        };
        vec![
            DailyPlan::expedition("coffee_run", vec![AdventurerId(1)]),
            train(2, StatKind::Synergy),
            DailyPlan::partial(vec![SubAction::Recruit]),
            DailyPlan::expedition("quarterly_review", vec![AdventurerId(2), AdventurerId(3)]),
            DailyPlan::idle(),
            train(1, StatKind::Optics),
            DailyPlan::expedition("coffee_run", vec![AdventurerId(1)]),
        ]
    }

    fn recorded() -> (Journal, Vec<DailyExpense>) {
        let controller = controller();
        let id = controller
            .start_run_with_seed(Difficulty::Associate, 2024)
            .unwrap()
            .id();
        for plan in plans() {
            let _ = controller.submit_daily_plan(id, plan);
        }
        let snapshot = controller.run_status(id).unwrap();
        (snapshot.journal.unwrap(), snapshot.run.history)
    }

    #[test]
    fn test_replay_matches_record() {
        let (journal, history) = recorded();
        assert!(!journal.is_empty());

        let controller = controller();
        let report = replay(&controller, &journal, &history).unwrap();
        assert!(report.is_consistent(), "{:?}", report.divergence);
        assert_eq!(report.days_replayed, journal.len());
        assert_eq!(report.run.history().len(), history.len());
        assert_eq!(report.run.treasury(), history.last().unwrap().resulting_treasury);
    }

    #[test]
    fn test_tampered_history_diverges() {
        let (journal, mut history) = recorded();
        history[1].resulting_treasury += 1;

        let controller = controller();
        let report = replay(&controller, &journal, &history).unwrap();
        let divergence = report.divergence.unwrap();
        assert_eq!(divergence.day, history[1].day);
        assert_eq!(report.days_replayed, 2);
        assert!(divergence.reason.contains("treasury"));
    }

    #[test]
    fn test_different_balance_diverges() {
        let (journal, history) = recorded();

        let content = Loader::standard().unwrap();
        let mut table: DifficultyTable = content.difficulties;
        let mut profile = table.profile(Difficulty::Associate);
        profile.starting_treasury += 500;
        table.set(Difficulty::Associate, profile);
        let controller = Controller::with_config(
            content.catalog,
            content.talent,
            table,
            ControllerConfig::default(),
        )
        .unwrap();

        let report = replay(&controller, &journal, &history).unwrap();
        assert_eq!(report.divergence.unwrap().day, 0);
    }

    #[test]
    fn test_step_and_goto() {
        let (journal, _) = recorded();
        let controller = controller();
        let mut replayer = Replayer::new(&controller, &journal);
        assert_eq!(replayer.state(), ReplayState::Idle);

        let first = replayer.step().unwrap().unwrap();
        assert_eq!(first.day, journal.entries()[0].day);
        assert_eq!(replayer.position(), 1);

        replayer.goto(3).unwrap();
        let run_id = replayer.run_id().unwrap();
        assert!(controller.run_status(run_id).unwrap().day() >= 3);

        let end = replayer.run_to_end().unwrap();
        assert_eq!(replayer.state(), ReplayState::Finished);
        assert_eq!(replayer.remaining(), 0);
        assert_eq!(end.history().len(), journal.len());
        assert!(replayer.step().unwrap().is_none());
        assert_eq!(controller.run_count(), 0);
    }

    #[test]
    fn test_replay_leaves_registry_unchanged() {
        let (journal, history) = recorded();
        let controller = controller();
        let own = controller
            .start_run_with_seed(Difficulty::Associate, 9)
            .unwrap()
            .id();

        for _ in 0..3 {
            let report = replay(&controller, &journal, &history).unwrap();
            assert!(report.is_consistent());
        }
        assert_eq!(controller.run_ids(), vec![own]);

        {
            let mut replayer = Replayer::new(&controller, &journal);
            replayer.step().unwrap();
            assert_eq!(controller.run_count(), 2);
        }
        assert_eq!(controller.run_ids(), vec![own]);
    }

    #[test]
    fn test_goto_past_end() {
        let (journal, _) = recorded();
        let controller = controller();
        let mut replayer = Replayer::new(&controller, &journal);
        assert!(matches!(replayer.goto(1_000), Err(Error::Replay(_))));
    }
}
