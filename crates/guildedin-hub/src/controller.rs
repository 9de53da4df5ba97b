//! Controller - owns every run and serializes access to each one
//!
//! The controller is the only code that mutates a `GameRun`. Each run lives
//! in its own slot behind a `Mutex`; the registry of slots sits behind a
//! `RwLock` that is only held long enough to look a slot up. Plans for the
//! same run are therefore applied one at a time, while plans for different
//! runs proceed in parallel with nothing shared but the read-only catalog
//! and talent pool.
//!
//! # Day flow
//!
//! ```text
//! submit_daily_plan
//!   -> lock run slot
//!   -> execute_day (validate, execute, settle; run only borrowed)
//!   -> commit onto a copy (apply deltas, advance calendar)
//!   -> evaluate Won / Lost on the copy
//!   -> swap the copy in, journal the plan
//! ```
//!
//! A plan that fails at any step leaves the run untouched and is not
//! journaled.
//!
//! # Example
//!
//! ```rust,ignore
//! use guildedin_core::{DailyPlan, Difficulty};
//! use guildedin_hub::Controller;
//!
//! let controller = Controller::new(catalog, talent)?;
//! let run = controller.start_run(Difficulty::Associate)?;
//! let expense = controller.submit_daily_plan(run.id(), DailyPlan::idle())?;
//! println!("day {} cost {}", expense.day, expense.total_expenses);
//! ```

use crate::commit::{commit, CommitResult};
use crate::config::{ControllerConfig, DifficultyTable};
use crate::snapshot::GameRunSnapshot;
use crate::{Error, Result};
use guildedin_core::economy::upkeep_total;
use guildedin_core::{
    compute_action_cost, compute_daily_upkeep, execute_day, preview_day, Catalog, DailyExpense,
    DailyPlan, DayContext, Difficulty, EconomyContext, GameRng, GameRun, Journal, PlanPreview,
    RunId, RunStatus, Settlement, SubAction, TalentPool,
};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// A run and its decision journal, locked together
struct RunSlot {
    run: GameRun,
    journal: Option<Journal>,
}

impl RunSlot {
    fn snapshot(&self) -> GameRunSnapshot {
        GameRunSnapshot::new(self.run.clone(), self.journal.clone())
    }
}

/// The game run controller
pub struct Controller {
    catalog: Arc<Catalog>,
    talent: Arc<dyn TalentPool>,
    difficulties: DifficultyTable,
    config: ControllerConfig,
    runs: RwLock<HashMap<RunId, Arc<Mutex<RunSlot>>>>,
    next_run_id: AtomicU64,
}

impl Controller {
    /// Create a controller with the default difficulty table and config
    ///
    /// Fails if the catalog's cross references don't resolve.
    pub fn new(catalog: Catalog, talent: impl TalentPool + 'static) -> Result<Self> {
        Self::with_config(
            catalog,
            talent,
            DifficultyTable::default(),
            ControllerConfig::default(),
        )
    }

    /// Create a controller with explicit difficulty balance and config
    pub fn with_config(
        catalog: Catalog,
        talent: impl TalentPool + 'static,
        difficulties: DifficultyTable,
        config: ControllerConfig,
    ) -> Result<Self> {
        if let Err(err) = catalog.validate() {
            error!("catalog rejected: {}", err);
            return Err(err.into());
        }
        Ok(Self {
            catalog: Arc::new(catalog),
            talent: Arc::new(talent),
            difficulties,
            config,
            runs: RwLock::new(HashMap::new()),
            next_run_id: AtomicU64::new(1),
        })
    }

    /// The content catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The talent pool
    pub fn talent(&self) -> &dyn TalentPool {
        self.talent.as_ref()
    }

    /// The difficulty table
    pub fn difficulties(&self) -> &DifficultyTable {
        &self.difficulties
    }

    /// Controller configuration
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Number of registered runs
    pub fn run_count(&self) -> usize {
        self.read_runs().len()
    }

    /// Ids of every registered run, ascending
    pub fn run_ids(&self) -> Vec<RunId> {
        let mut ids: Vec<RunId> = self.read_runs().keys().copied().collect();
        ids.sort();
        ids
    }

    // ========================================================================
    // Run lifecycle
    // ========================================================================

    /// Start a run with a seed derived from the run id and `seed_base`
    pub fn start_run(&self, difficulty: Difficulty) -> Result<GameRunSnapshot> {
        let id = self.allocate_id();
        let seed = GameRng::for_stream(self.config.seed_base, id.raw()).next_u64();
        self.register(id, difficulty, seed)
    }

    /// Start a run with an explicit seed
    pub fn start_run_with_seed(&self, difficulty: Difficulty, seed: u64) -> Result<GameRunSnapshot> {
        let id = self.allocate_id();
        self.register(id, difficulty, seed)
    }

    /// Register a previously saved run
    ///
    /// The snapshot is checked against this controller's catalog first. The
    /// run keeps its id; restoring over a live run is refused.
    pub fn restore_run(&self, snapshot: GameRunSnapshot) -> Result<RunId> {
        let id = snapshot.id();
        if let Err(err) = snapshot.validate_against(&self.catalog) {
            error!("{} restore rejected: {}", id, err);
            return Err(err.into());
        }

        let GameRunSnapshot { run, journal } = snapshot;
        let journal = if self.config.record_journal {
            journal
        } else {
            None
        };
        info!(
            "{} restored at day {} with treasury {} ({:?})",
            id,
            run.day(),
            run.treasury(),
            run.status
        );
        self.insert(id, RunSlot { run, journal })?;
        self.next_run_id.fetch_max(id.raw() + 1, Ordering::SeqCst);
        Ok(id)
    }

    /// Unregister a run, returning its final state
    pub fn remove_run(&self, run_id: RunId) -> Result<GameRunSnapshot> {
        let slot = self
            .runs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&run_id)
            .ok_or(Error::RunNotFound(run_id))?;
        let guard = slot.lock().map_err(|_| Error::LockPoisoned(run_id))?;
        debug!("{} removed at day {}", run_id, guard.run.day());
        Ok(guard.snapshot())
    }

    // ========================================================================
    // Day operations
    // ========================================================================

    /// Validate, resolve and settle one day for a run
    ///
    /// On success the run has advanced exactly one day and the returned
    /// expense is the last entry of its history. On any error the run and
    /// its journal are unchanged.
    pub fn submit_daily_plan(&self, run_id: RunId, plan: DailyPlan) -> Result<DailyExpense> {
        self.with_slot(run_id, |slot| self.settle_day(slot, plan))
    }

    /// Price a plan against a run's current state without changing it
    pub fn preview_plan(&self, run_id: RunId, plan: DailyPlan) -> Result<PlanPreview> {
        self.with_slot(run_id, |slot| {
            preview_day(&slot.run, plan, self.day_context()).map_err(|err| {
                report(run_id, &err);
                Error::from(err)
            })
        })
    }

    /// Submit plans for several runs at once
    ///
    /// Plans are split across `worker_count` scoped threads. Results come
    /// back in input order. Several plans for the same run are serialized by
    /// the run's lock but their relative order is not guaranteed.
    pub fn submit_batch(&self, plans: Vec<(RunId, DailyPlan)>) -> Vec<Result<DailyExpense>> {
        let workers = self.config.worker_count().min(plans.len()).max(1);
        if workers == 1 {
            return plans
                .into_iter()
                .map(|(run_id, plan)| self.submit_daily_plan(run_id, plan))
                .collect();
        }

        let chunk_size = plans.len().div_ceil(workers);
        debug!(
            "batch of {} plans on {} workers",
            plans.len(),
            workers
        );
        std::thread::scope(|scope| {
            let handles: Vec<_> = plans
                .chunks(chunk_size)
                .map(|chunk| {
                    let handle = scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|(run_id, plan)| self.submit_daily_plan(*run_id, plan.clone()))
                            .collect::<Vec<_>>()
                    });
                    (chunk, handle)
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|(chunk, handle)| match handle.join() {
                    Ok(results) => results,
                    Err(_) => chunk
                        .iter()
                        .map(|(run_id, _)| Err(Error::LockPoisoned(*run_id)))
                        .collect(),
                })
                .collect()
        })
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// A detached copy of a run
    pub fn run_status(&self, run_id: RunId) -> Result<GameRunSnapshot> {
        self.with_slot(run_id, |slot| Ok(slot.snapshot()))
    }

    /// The run's decision journal, if recording is enabled
    pub fn journal(&self, run_id: RunId) -> Result<Option<Journal>> {
        self.with_slot(run_id, |slot| Ok(slot.journal.clone()))
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn day_context(&self) -> DayContext<'_> {
        DayContext::new(&self.catalog, self.talent.as_ref())
    }

    fn allocate_id(&self) -> RunId {
        RunId(self.next_run_id.fetch_add(1, Ordering::SeqCst))
    }

    fn read_runs(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<RunId, Arc<Mutex<RunSlot>>>> {
        // Entries are inserted and removed whole; a poisoned map is still consistent
        self.runs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, id: RunId, difficulty: Difficulty, seed: u64) -> Result<GameRunSnapshot> {
        let profile = self.difficulties.profile(difficulty);
        let run = GameRun::start(id, seed, difficulty, profile, self.talent.as_ref());
        let journal = self
            .config
            .record_journal
            .then(|| Journal::new(id, seed, difficulty));

        info!(
            "{} started on {}: seed {:#018x}, treasury {}, roster {}",
            id,
            difficulty,
            seed,
            run.treasury(),
            run.roster.len()
        );

        let slot = RunSlot { run, journal };
        let snapshot = slot.snapshot();
        self.insert(id, slot)?;
        Ok(snapshot)
    }

    fn insert(&self, id: RunId, slot: RunSlot) -> Result<()> {
        let mut runs = self.runs.write().unwrap_or_else(PoisonError::into_inner);
        if runs.contains_key(&id) {
            return Err(Error::RunExists(id));
        }
        runs.insert(id, Arc::new(Mutex::new(slot)));
        Ok(())
    }

    fn with_slot<T>(&self, run_id: RunId, f: impl FnOnce(&mut RunSlot) -> Result<T>) -> Result<T> {
        let slot = self
            .read_runs()
            .get(&run_id)
            .cloned()
            .ok_or(Error::RunNotFound(run_id))?;
        let mut guard = slot.lock().map_err(|_| {
            error!("{} lock poisoned", run_id);
            Error::LockPoisoned(run_id)
        })?;
        f(&mut guard)
    }

    fn settle_day(&self, slot: &mut RunSlot, plan: DailyPlan) -> Result<DailyExpense> {
        let run_id = slot.run.id;
        let ctx = self.day_context();
        let recorded = slot.journal.as_ref().map(|_| plan.clone());

        let settlement = execute_day(&slot.run, plan, ctx).map_err(|err| {
            report(run_id, &err);
            Error::from(err)
        })?;
        let expense = settlement.expense.clone();

        let (next, result) = close_day(&slot.run, settlement, ctx)?;
        slot.run = next;
        if let (Some(journal), Some(plan)) = (slot.journal.as_mut(), recorded) {
            journal.record(result.day, plan);
        }

        info!(
            "{} day {} settled: net {}, treasury {}",
            run_id, expense.day, expense.net_delta, expense.resulting_treasury
        );
        if !result.hired.is_empty() {
            debug!("{} hired {:?}", run_id, result.hired);
        }
        if !result.recovered.is_empty() {
            debug!("{} recovered {:?}", run_id, result.recovered);
        }

        Ok(expense)
    }
}

/// Commit a settlement onto a copy of `run` and evaluate Won / Lost on it
///
/// The caller swaps the copy in only on success, so a failure at any step
/// leaves the registered run as it was.
fn close_day(
    run: &GameRun,
    settlement: Settlement,
    ctx: DayContext<'_>,
) -> Result<(GameRun, CommitResult)> {
    let run_id = run.id;
    let mut staged = run.clone();
    let result = commit(settlement, &mut staged).map_err(|err| {
        error!("{} commit failed: {}", run_id, err);
        err
    })?;

    let ending = evaluate_terminal(&staged, ctx).map_err(|err| {
        error!("{} terminal check failed: {}", run_id, err);
        Error::from(err)
    })?;
    if let Some((status, reason)) = ending {
        info!(
            "{} ended {:?} on day {}: {}",
            run_id,
            status,
            staged.day(),
            reason
        );
        staged.conclude(status, reason);
    }
    Ok((staged, result))
}

fn report(run_id: RunId, err: &guildedin_core::Error) {
    if err.is_recoverable() {
        warn!("{} plan rejected: {}", run_id, err);
    } else {
        error!("{} plan failed: {}", run_id, err);
    }
}

/// Decide whether a run has just been won or lost
///
/// Won is checked first: treasury and reputation both at their targets.
/// Lost when the calendar has passed the day limit, when the treasury can't
/// cover the coming day's upkeep, or when the roster is empty and the guild
/// can't afford upkeep plus a recruitment attempt.
pub fn evaluate_terminal(
    run: &GameRun,
    ctx: DayContext<'_>,
) -> guildedin_core::Result<Option<(RunStatus, String)>> {
    if run.status.is_terminal() {
        return Ok(None);
    }

    let profile = &run.profile;
    let treasury = run.treasury();
    if treasury >= profile.target_treasury && run.guild.reputation >= profile.target_reputation {
        return Ok(Some((
            RunStatus::Won,
            format!(
                "reached treasury {} and reputation {}",
                treasury, run.guild.reputation
            ),
        )));
    }

    if run.day() > profile.day_limit {
        return Ok(Some((
            RunStatus::Lost,
            format!("day limit {} exceeded", profile.day_limit),
        )));
    }

    let econ = EconomyContext::new(ctx.catalog, profile, run.calendar.modifiers());
    let upkeep = upkeep_total(&compute_daily_upkeep(&econ, &run.guild, &run.roster)?);
    if treasury < upkeep {
        return Ok(Some((
            RunStatus::Lost,
            format!("treasury {} cannot cover upkeep {}", treasury, upkeep),
        )));
    }

    if run.roster.is_empty() {
        if ctx.talent.candidates().is_empty() {
            return Ok(Some((
                RunStatus::Lost,
                "roster empty and no candidates to recruit".to_string(),
            )));
        }
        let fee = compute_action_cost(&econ, &run.guild, 0, &SubAction::Recruit)?.treasury;
        if treasury < upkeep.saturating_add(fee) {
            return Ok(Some((
                RunStatus::Lost,
                format!(
                    "roster empty and recruitment unaffordable ({} < {})",
                    treasury,
                    upkeep.saturating_add(fee)
                ),
            )));
        }
    }

    Ok(None)
}
