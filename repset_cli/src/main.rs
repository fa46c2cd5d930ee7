use clap::{Parser, Subcommand};
use repset_core::stats::{
    estimate_one_rep_max, format_countdown, format_duration, format_hms, format_stopwatch,
    group_by_day, total_minutes,
};
use repset_core::*;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "repset")]
#[command(about = "Workout session tracker with interval timers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the workout history endpoint
    #[arg(long, global = true)]
    remote_url: Option<String>,

    /// Use this config file instead of the default one
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a new workout session (keeps the current one if it exists)
    Start,

    /// Start the session clock
    Clock,

    /// Add an exercise by catalog id
    Add {
        /// Catalog exercise id (see `repset catalog`)
        catalog_id: String,

        /// Free-text name; the catalog id is not checked when given
        #[arg(long)]
        name: Option<String>,
    },

    /// Remove an exercise from the session
    Remove { exercise_id: String },

    /// Add, remove or edit sets
    Set {
        #[command(subcommand)]
        command: SetCommands,
    },

    /// Show the current session
    Show,

    /// End the session and save it to history
    Finish,

    /// List past workouts
    History {
        /// Sync with the remote store first
        #[arg(long)]
        refresh: bool,
    },

    /// Upload workouts the backend is missing, then reload history from it
    Sync,

    /// List catalog exercises, or show one in detail
    Catalog {
        /// Show how to perform this exercise and what it works
        id: Option<String>,

        /// Only this category (chest, back, legs, shoulders, arms, core, cardio)
        #[arg(long, conflicts_with = "id")]
        category: Option<String>,
    },

    /// Run an interval timer or a stopwatch
    Timer {
        /// Template id (tabata, hiit_standard, emom_10, boxing or a custom one)
        template: Option<String>,

        #[arg(long, requires = "rounds")]
        work: Option<u32>,

        #[arg(long, default_value_t = 0)]
        rest: u32,

        #[arg(long)]
        rounds: Option<u32>,

        /// Count up instead of running intervals
        #[arg(long, conflicts_with_all = ["template", "work", "rounds"])]
        stopwatch: bool,

        /// Stop the stopwatch after this many seconds
        #[arg(long, requires = "stopwatch")]
        seconds: Option<u64>,

        /// List available templates and exit
        #[arg(long)]
        list: bool,
    },

    /// Show training totals and one-rep-max estimates
    Stats {
        /// Estimate the one-rep max for exercises matching this name
        #[arg(long)]
        exercise: Option<String>,
    },

    /// Export history to CSV, one row per set
    Export { path: PathBuf },

    /// Log or show body weight
    Weight {
        #[command(subcommand)]
        command: WeightCommands,
    },

    /// Log body measurements (free text, e.g. "84 cm")
    Measure {
        #[arg(long)]
        chest: Option<String>,

        #[arg(long)]
        waist: Option<String>,

        #[arg(long)]
        arms: Option<String>,

        #[arg(long)]
        legs: Option<String>,
    },

    /// Show the effective configuration
    Config {
        /// Write a default config file if none exists yet
        #[arg(long)]
        init: bool,
    },
}

#[derive(Subcommand)]
enum WeightCommands {
    /// Record today's body weight
    Log { weight: f64 },

    /// Show the latest weight and recent readings
    Show {
        /// How many readings to list
        #[arg(long, default_value_t = 10)]
        last: usize,
    },
}

#[derive(Subcommand)]
enum SetCommands {
    /// Append a set, copying the previous set's weight and reps
    Add { exercise_id: String },

    /// Remove a set
    Remove { exercise_id: String, set_id: String },

    /// Edit a set
    Update {
        exercise_id: String,
        set_id: String,

        #[arg(long)]
        weight: Option<String>,

        #[arg(long)]
        reps: Option<String>,

        /// Mark completed (true) or not completed (false)
        #[arg(long)]
        completed: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    repset_core::logging::init();

    let cli = Cli::parse();

    // A missing file means defaults, whether or not --config named it.
    let config_path = cli.config.unwrap_or_else(Config::default_config_path);
    let config = if config_path.exists() {
        Config::load_from(&config_path)?
    } else {
        tracing::debug!("No config file at {:?}, using defaults", config_path);
        Config::default()
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let remote_url = cli
        .remote_url
        .unwrap_or_else(|| config.remote.base_url.clone());

    let app = App {
        store: SessionStore::new(&data_dir),
        remote: Arc::new(HttpRemoteStore::new(remote_url, config.remote.timeout())?),
        config,
    };

    match cli.command {
        Commands::Start => app.cmd_start(),
        Commands::Clock => app.cmd_clock(),
        Commands::Add { catalog_id, name } => app.cmd_add(&catalog_id, name.as_deref()),
        Commands::Remove { exercise_id } => {
            app.mutate("No such exercise", |t| t.remove_exercise(&exercise_id))
        }
        Commands::Set { command } => app.cmd_set(command),
        Commands::Show => app.cmd_show(),
        Commands::Finish => app.cmd_finish().await,
        Commands::History { refresh } => app.cmd_history(refresh).await,
        Commands::Sync => app.cmd_sync().await,
        Commands::Catalog { id: Some(id), .. } => cmd_catalog_detail(&id),
        Commands::Catalog { id: None, category } => cmd_catalog(category),
        Commands::Timer {
            template,
            work,
            rest,
            rounds,
            stopwatch,
            seconds,
            list,
        } => {
            if list {
                app.cmd_timer_list();
                Ok(())
            } else if stopwatch {
                app.cmd_stopwatch(seconds).await
            } else {
                let config = app.interval_config(template, work, rest, rounds)?;
                app.cmd_interval(config).await
            }
        }
        Commands::Stats { exercise } => app.cmd_stats(exercise),
        Commands::Export { path } => app.cmd_export(&path),
        Commands::Weight { command } => app.cmd_weight(command),
        Commands::Measure {
            chest,
            waist,
            arms,
            legs,
        } => app.cmd_measure(BodyMeasurement {
            id: RandomIds.next_id(),
            date: SystemClock.now_ms(),
            chest: chest.unwrap_or_default(),
            waist: waist.unwrap_or_default(),
            arms: arms.unwrap_or_default(),
            legs: legs.unwrap_or_default(),
        }),
        Commands::Config { init } => cmd_config(&config_path, &app.config, init),
    }
}

struct App {
    store: SessionStore,
    remote: Arc<HttpRemoteStore>,
    config: Config,
}

impl App {
    /// Rebuild the tracker from the files in the data directory
    fn tracker(&self) -> Result<(Tracker, mpsc::UnboundedReceiver<SyncEvent>)> {
        let current = self.store.load_session()?;
        let history = self.store.load_history()?;
        Ok(Tracker::restore(
            Arc::new(SystemClock),
            Arc::new(RandomIds),
            self.remote.clone(),
            current,
            history,
        ))
    }

    fn save(&self, tracker: &Tracker) -> Result<()> {
        self.store.save_session(tracker.current().as_deref())?;
        self.store.save_history(tracker.history())
    }

    /// Apply one session change and persist it
    fn mutate<F>(&self, failure: &str, op: F) -> Result<()>
    where
        F: FnOnce(&mut Tracker) -> bool,
    {
        let (mut tracker, _events) = self.tracker()?;
        if tracker.current().is_none() {
            return Err(Error::State("No active session. Run `repset start` first.".into()));
        }
        if !op(&mut tracker) {
            return Err(Error::State(failure.into()));
        }
        self.store.save_session(tracker.current().as_deref())?;
        if let Some(workout) = tracker.current() {
            print_workout(&workout);
        }
        Ok(())
    }

    fn cmd_start(&self) -> Result<()> {
        let (mut tracker, _events) = self.tracker()?;
        let existed = tracker.current().is_some();
        let workout = tracker.start();
        self.store.save_session(Some(&workout))?;

        if existed {
            println!("Session {} is already open ({})", workout.id, workout.status);
        } else {
            println!("✓ Started session {}", workout.id);
            println!("  Add exercises with `repset add <catalog-id>`, then `repset clock`.");
        }
        Ok(())
    }

    fn cmd_clock(&self) -> Result<()> {
        let (mut tracker, _events) = self.tracker()?;
        if !tracker.start_clock() {
            return Err(Error::State(
                "The clock can only start on a session that is still preparing".into(),
            ));
        }
        self.store.save_session(tracker.current().as_deref())?;
        println!("✓ Clock started");
        Ok(())
    }

    fn cmd_add(&self, catalog_id: &str, name: Option<&str>) -> Result<()> {
        if name.is_none() && get_default_catalog().get(catalog_id).is_none() {
            return Err(Error::Validation(format!(
                "Unknown exercise '{}'. Use --name for a custom exercise.",
                catalog_id
            )));
        }
        self.mutate("Could not add exercise", |t| {
            match name {
                Some(name) => t.add_exercise(catalog_id, name),
                None => t.add_catalog_exercise(catalog_id),
            }
            .is_some()
        })
    }

    fn cmd_set(&self, command: SetCommands) -> Result<()> {
        match command {
            SetCommands::Add { exercise_id } => {
                self.mutate("No such exercise", |t| t.add_set(&exercise_id))
            }
            SetCommands::Remove {
                exercise_id,
                set_id,
            } => self.mutate("No such set", |t| t.remove_set(&exercise_id, &set_id)),
            SetCommands::Update {
                exercise_id,
                set_id,
                weight,
                reps,
                completed,
            } => {
                let updates: Vec<SetUpdate> = [
                    weight.map(SetUpdate::Weight),
                    reps.map(SetUpdate::Reps),
                    completed.map(SetUpdate::Completed),
                ]
                .into_iter()
                .flatten()
                .collect();
                if updates.is_empty() {
                    return Err(Error::Validation(
                        "Nothing to update: pass --weight, --reps or --completed".into(),
                    ));
                }
                self.mutate("No such set", |t| {
                    updates
                        .into_iter()
                        .all(|u| t.update_set(&exercise_id, &set_id, u))
                })
            }
        }
    }

    fn cmd_show(&self) -> Result<()> {
        let (tracker, _events) = self.tracker()?;
        match tracker.current() {
            Some(workout) => print_workout(&workout),
            None => println!("No active session."),
        }
        Ok(())
    }

    async fn cmd_finish(&self) -> Result<()> {
        let (mut tracker, mut events) = self.tracker()?;
        let Some(handle) = tracker.finish() else {
            println!("No active session.");
            return Ok(());
        };

        // History is saved before the upload result is known.
        self.save(&tracker)?;
        if let Some(workout) = tracker.history().first() {
            println!(
                "✓ Workout saved: {} exercises, {} sets, {}",
                workout.exercises.len(),
                workout.set_count(),
                format_duration(workout)
            );
        }

        let _ = handle.outcome().await;
        match events.recv().await {
            Some(SyncEvent::Saved { server_id, .. }) => {
                println!("✓ Synced to backend ({})", server_id);
            }
            Some(SyncEvent::Warning { message, .. }) => {
                eprintln!("⚠ Could not save workout to backend: {}", message);
                eprintln!("  The workout is kept in local history.");
            }
            None => {}
        }
        Ok(())
    }

    /// Reconcile local history with the backend and save the merged list
    async fn sync(&self, tracker: &mut Tracker) -> Result<Option<SyncReport>> {
        match tracker.sync().await {
            Ok(report) => {
                self.store.save_history(tracker.history())?;
                Ok(Some(report))
            }
            Err(e) => {
                tracing::warn!("Sync failed: {}", e);
                Ok(None)
            }
        }
    }

    async fn cmd_sync(&self) -> Result<()> {
        let (mut tracker, _events) = self.tracker()?;
        let Some(report) = self.sync(&mut tracker).await? else {
            eprintln!("⚠ Could not reach backend; local history is unchanged.");
            return Ok(());
        };

        println!(
            "✓ Synced: {} uploaded, {} workouts in history",
            report.uploaded, report.total
        );
        if report.failed > 0 {
            eprintln!(
                "⚠ {} workouts could not be uploaded and stay in local history.",
                report.failed
            );
        }
        Ok(())
    }

    async fn cmd_history(&self, refresh: bool) -> Result<()> {
        let (mut tracker, _events) = self.tracker()?;
        if refresh && self.sync(&mut tracker).await?.is_none() {
            eprintln!("⚠ Could not reach backend; showing local history.");
        }

        let history = tracker.history();
        if history.is_empty() {
            println!("No workouts yet.");
            return Ok(());
        }

        for (day, workouts) in group_by_day(history, &chrono::Local) {
            println!("{}", day.format("%a %d %b %Y"));
            for w in workouts {
                let names: Vec<&str> = w.exercises.iter().map(|e| e.name.as_str()).collect();
                println!(
                    "  {:<10} {:>3} sets  {}",
                    format_duration(w),
                    w.set_count(),
                    names.join(", ")
                );
            }
        }
        Ok(())
    }

    fn cmd_timer_list(&self) {
        for t in self.config.timer.all_templates() {
            println!(
                "{:<15} {:<20} work {}s  rest {}s  x{}",
                t.id, t.name, t.work, t.rest, t.rounds
            );
        }
    }

    fn interval_config(
        &self,
        template: Option<String>,
        work: Option<u32>,
        rest: u32,
        rounds: Option<u32>,
    ) -> Result<IntervalConfig> {
        let config = match (template, work, rounds) {
            (Some(id), _, _) => {
                let t = self
                    .config
                    .timer
                    .template(&id)
                    .ok_or_else(|| Error::Validation(format!("Unknown timer template '{}'", id)))?;
                IntervalConfig::from(&t)
            }
            (None, Some(work), Some(rounds)) => IntervalConfig::new(work, rest, rounds),
            _ => return Err(Error::Validation(
                "Pass a template id, or --work and --rounds".into(),
            )),
        };
        if config.work_seconds == 0 || config.rounds == 0 {
            return Err(Error::Validation(
                "Work seconds and rounds must be positive".into(),
            ));
        }
        Ok(config)
    }

    async fn cmd_interval(&self, config: IntervalConfig) -> Result<()> {
        let timer = IntervalTimer::with_period(config, self.config.timer.tick_period());
        let mut controller = TimerController::new(timer);
        let mut updates = controller.subscribe();

        println!(
            "Intervals: work {}s, rest {}s, {} rounds ({} total)",
            config.work_seconds,
            config.rest_seconds,
            config.rounds,
            format_hms(config.total_seconds() as i64 * 1_000)
        );
        controller.toggle();

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = updates.borrow_and_update().state;
                    if state.finished {
                        println!("✓ Done: {} rounds", config.rounds);
                        break;
                    }
                    println!(
                        "Round {}/{} {:<4} {}",
                        state.round,
                        config.rounds,
                        phase_label(state.phase),
                        format_countdown(state.seconds_remaining)
                    );
                }
                _ = &mut ctrl_c => {
                    controller.reset();
                    println!("Stopped.");
                    break;
                }
            }
        }
        Ok(())
    }

    async fn cmd_stopwatch(&self, seconds: Option<u64>) -> Result<()> {
        let refresh = self.config.timer.stopwatch_refresh();
        let mut controller = TimerController::new(Stopwatch::new(Arc::new(SystemClock), refresh));
        let mut updates = controller.subscribe();
        controller.toggle();

        let limit = tokio::time::sleep(Duration::from_secs(seconds.unwrap_or(0)));
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(limit, ctrl_c);

        loop {
            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snap = *updates.borrow_and_update();
                    print!("\r{}", format_stopwatch(snap.elapsed_ms));
                    io::stdout().flush()?;
                }
                _ = &mut limit, if seconds.is_some() => break,
                _ = &mut ctrl_c => break,
            }
        }

        controller.toggle();
        println!("\r{}", format_stopwatch(controller.snapshot().elapsed_ms));
        Ok(())
    }

    fn cmd_stats(&self, exercise: Option<String>) -> Result<()> {
        let history = self.store.load_history()?;
        let finished = history.iter().filter(|w| w.is_finished()).count();

        println!("Workouts: {}", finished);
        println!("Total time: {} min", total_minutes(&history));
        if let Some(weight) = self.store.load_progress()?.latest_weight() {
            println!("Latest weight: {} kg", weight);
        }

        if let Some(query) = exercise {
            match estimate_one_rep_max(&history, &query) {
                Some(orm) => println!("Estimated 1RM for '{}': {}", query, orm),
                None => println!("No usable sets for '{}'", query),
            }
        }
        Ok(())
    }

    fn cmd_export(&self, path: &std::path::Path) -> Result<()> {
        let history = self.store.load_history()?;
        let rows = repset_core::csv_export::export_history(&history, path)?;
        println!("✓ Exported {} rows to {}", rows, path.display());
        Ok(())
    }

    fn cmd_weight(&self, command: WeightCommands) -> Result<()> {
        let mut progress = self.store.load_progress()?;
        match command {
            WeightCommands::Log { weight } => {
                progress.log_weight(RandomIds.next_id(), SystemClock.now_ms(), weight)?;
                self.store.save_progress(&progress)?;
                println!("✓ Logged {} kg", weight);
            }
            WeightCommands::Show { last } => {
                let Some(latest) = progress.latest_weight() else {
                    println!("No weight logged yet.");
                    return Ok(());
                };
                println!("Latest weight: {} kg", latest);
                if let Some(change) = progress.weight_change() {
                    println!("Change since first entry: {:+.1} kg", change);
                }

                let skip = progress.weight_logs.len().saturating_sub(last);
                for log in progress.weight_logs.iter().skip(skip).rev() {
                    println!("  {}  {} kg", format_date(log.date), log.weight);
                }
            }
        }
        Ok(())
    }

    fn cmd_measure(&self, measurement: BodyMeasurement) -> Result<()> {
        let mut progress = self.store.load_progress()?;
        progress.log_measurement(measurement)?;
        self.store.save_progress(&progress)?;

        if let Some(m) = progress.latest_measurement() {
            println!("✓ Measurements logged {}", format_date(m.date));
            for (label, value) in [
                ("Chest", &m.chest),
                ("Waist", &m.waist),
                ("Arms", &m.arms),
                ("Legs", &m.legs),
            ] {
                if !value.is_empty() {
                    println!("  {:<6} {}", label, value);
                }
            }
        }
        Ok(())
    }
}

fn cmd_config(path: &std::path::Path, config: &Config, init: bool) -> Result<()> {
    if init {
        if path.exists() {
            return Err(Error::Config(format!(
                "{} already exists; not overwriting it",
                path.display()
            )));
        }
        Config::default().save_to(path)?;
        println!("✓ Wrote default config to {}", path.display());
        return Ok(());
    }

    if !path.exists() {
        println!("# {} (not found, showing defaults)", path.display());
    } else {
        println!("# {}", path.display());
    }
    print!("{}", config.to_toml()?);
    Ok(())
}

fn format_date(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%a %d %b %Y")
                .to_string()
        })
        .unwrap_or_else(|| "-".into())
}

fn cmd_catalog(category: Option<String>) -> Result<()> {
    let catalog = get_default_catalog();
    let entries: Vec<&ExerciseDefinition> = match category {
        Some(c) => catalog.by_category(c.parse()?),
        None => catalog.exercises.iter().collect(),
    };

    for def in entries {
        println!(
            "{:<24} {:<26} {:<11} {:?}",
            def.id, def.name, def.muscle, def.difficulty
        );
    }
    Ok(())
}

fn cmd_catalog_detail(id: &str) -> Result<()> {
    let def = get_default_catalog()
        .get(id)
        .ok_or_else(|| Error::Validation(format!("Unknown exercise '{}'", id)))?;

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", def.name.to_uppercase());
    println!("╰─────────────────────────────────────────╯");
    println!("  {:?} · {:?} · {}", def.category, def.difficulty, def.muscle);
    println!();
    println!("  Primary:   {}", def.primary_muscles.join(", "));
    if !def.secondary_muscles.is_empty() {
        println!("  Secondary: {}", def.secondary_muscles.join(", "));
    }
    println!();
    println!("  {}", def.description);
    println!();
    println!("  Benefits:");
    for benefit in &def.benefits {
        println!("    • {}", benefit);
    }
    println!();
    Ok(())
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Work => "WORK",
        Phase::Rest => "REST",
    }
}

fn print_workout(workout: &Workout) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  SESSION {} ({})", workout.id, workout.status);
    println!("╰─────────────────────────────────────────╯");

    if workout.status == WorkoutStatus::Active {
        let now = SystemClock.now_ms();
        println!("  Elapsed: {}", format_hms(now - workout.start_time));
    }

    if workout.exercises.is_empty() {
        println!("  No exercises yet.");
    }
    for exercise in &workout.exercises {
        println!();
        println!("  {} [{}]", exercise.name, exercise.id);
        if exercise.sets.is_empty() {
            println!("    (no sets)");
        }
        for (i, set) in exercise.sets.iter().enumerate() {
            println!(
                "    {}. {:>6} x {:<4} {} [{}]",
                i + 1,
                if set.weight.is_empty() { "-" } else { &set.weight },
                if set.reps.is_empty() { "-" } else { &set.reps },
                if set.completed { "✓" } else { " " },
                set.id
            );
        }
    }
    println!();
}
