//! Guild Week Example
//!
//! Two guilds on different difficulties play two weeks side by side.
//! Each day a simple planner looks at the roster and picks a plan; the
//! controller settles both runs in one batch. At the end the first run is
//! audited, replayed from its journal and exported as CSV.
//!
//! Run with `RUST_LOG=debug` to see every settlement.

use guildedin_core::{Adventurer, AdventurerId, DailyPlan, Difficulty, StatKind, SubAction};
use guildedin_hub::{Controller, ControllerConfig, GameRunSnapshot};
use guildedin_journal::{replay, Auditor, ExportFormat, Exporter};
use guildedin_script::Loader;
use log::{info, warn};

const DAYS: u32 = 14;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== GuildedIn Guild Week Example ===\n");

    let content = Loader::standard()?;
    let controller = Controller::with_config(
        content.catalog,
        content.talent,
        content.difficulties,
        ControllerConfig::default(),
    )?;

    let runs = vec![
        controller.start_run_with_seed(Difficulty::Intern, 42)?.id(),
        controller.start_run_with_seed(Difficulty::Associate, 42)?.id(),
    ];
    for &id in &runs {
        print_run(&controller.run_status(id)?);
    }

    for _ in 0..DAYS {
        let mut batch = Vec::new();
        for &id in &runs {
            let snapshot = controller.run_status(id)?;
            if snapshot.status().is_terminal() {
                continue;
            }
            batch.push((id, plan_for(&snapshot)));
        }
        if batch.is_empty() {
            break;
        }

        let ids: Vec<_> = batch.iter().map(|(id, _)| *id).collect();
        for (id, result) in ids.into_iter().zip(controller.submit_batch(batch)) {
            match result {
                Ok(expense) => println!(
                    "{} day {:>2}: {:>6} -> {:>6} ({:+})",
                    id,
                    expense.day,
                    expense.treasury_before,
                    expense.resulting_treasury,
                    expense.net_delta
                ),
                Err(err) => {
                    warn!("{}: plan rejected ({}), idling instead", id, err);
                    if let Err(err) = controller.submit_daily_plan(id, DailyPlan::idle()) {
                        warn!("{}: idle day rejected too: {}", id, err);
                    }
                }
            }
        }
    }

    println!();
    for &id in &runs {
        print_run(&controller.run_status(id)?);
    }

    let snapshot = controller.run_status(runs[0])?;
    println!("\n{}", Auditor::new(snapshot.history()).generate_report());

    if let Some(journal) = &snapshot.journal {
        let report = replay(&controller, journal, snapshot.history())?;
        if report.is_consistent() {
            info!("replayed {} days with no divergence", report.days_replayed);
        } else {
            warn!("replay diverged: {:?}", report.divergence);
        }
    }

    println!("{}", Exporter::new(&snapshot).export(ExportFormat::Csv)?);
    Ok(())
}

/// Pick a plan from the roster's state
///
/// Recruit when the roster is thin, train every third day, otherwise send
/// the strongest ready members on an expedition. With nobody ready, rest someone.
fn plan_for(snapshot: &GameRunSnapshot) -> DailyPlan {
    let run = &snapshot.run;
    // Strongest first, so expeditions take the best available team
    let mut ready: Vec<&Adventurer> = run.ready_adventurers().collect();
    ready.sort_by_key(|a| std::cmp::Reverse(a.stats.total()));
    let ready: Vec<AdventurerId> = ready.into_iter().map(|a| a.id).collect();

    if run.roster.len() < 3 {
        return DailyPlan::partial(vec![SubAction::Recruit]);
    }

    if ready.is_empty() {
        return match run.roster.keys().next() {
            Some(&adventurer) => DailyPlan::partial(vec![SubAction::Rest { adventurer }]),
            None => DailyPlan::idle(),
        };
    }

    if snapshot.day() % 3 == 2 {
        let actions = ready
            .iter()
            .take(2)
            .filter_map(|id| run.roster.get(id))
            .filter_map(|adventurer| {
                StatKind::ALL
                    .into_iter()
                    .filter(|&stat| adventurer.stats.get(stat) < adventurer.stat_cap)
                    .min_by_key(|&stat| adventurer.stats.get(stat))
                    .map(|stat| SubAction::Train {
                        adventurer: adventurer.id,
                        stat,
                    })
            })
            .collect::<Vec<_>>();
        if !actions.is_empty() {
            return DailyPlan::partial(actions);
        }
    }

    if ready.len() >= 3 && snapshot.day() % 2 == 1 {
        DailyPlan::expedition("quarterly_review", ready.into_iter().take(3).collect())
    } else {
        DailyPlan::expedition("coffee_run", ready.into_iter().take(2).collect())
    }
}

fn print_run(snapshot: &GameRunSnapshot) {
    let run = &snapshot.run;
    println!(
        "{} [{}] day {} treasury {} reputation {} roster {} status {:?}",
        run.id,
        run.difficulty,
        snapshot.day(),
        snapshot.treasury(),
        run.guild.reputation,
        run.roster.len(),
        run.status
    );
    if let Some(reason) = &run.end_reason {
        println!("  ended: {}", reason);
    }
}
