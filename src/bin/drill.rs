//! `drill`: audio-first spaced repetition in the terminal.

use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Duration, Local, Utc};
use clap::{Args, Parser, Subcommand};
use log::{LevelFilter, info};
use srs_drill::{
    Added, BackgroundWriter, CommandPlayer, Config, Dataset, JsonStore, ReviewReport, Session,
    Stats, Store, Terminal, key_queue, spawn_key_reader,
};

#[derive(Parser)]
#[command(name = "drill")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Spaced repetition drills for audio vocabulary, sentences and dialogs")]
struct Cli {
    /// Directory holding db.json, config.toml, drill.log and the files/ tree
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Log debug output to drill.log
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Review due items (default)
    Practice(PracticeArgs),
    /// Add word items for audio files, then ask for their texts
    AddWords { files: Vec<PathBuf> },
    /// Add word items taking the text from each file name, e.g. "03 good morning.mp3"
    AddWordsWithText { files: Vec<PathBuf> },
    /// Add one sentence item per audio file
    AddSentences { files: Vec<PathBuf> },
    /// Add one dialog item per audio file
    AddDialogs { files: Vec<PathBuf> },
    /// Ask for the text of every word that has none
    Complete,
    /// Show successful reviews per day
    History,
    /// Show item counts per variant
    Stats,
}

#[derive(Args, Default)]
struct PracticeArgs {
    /// Overrides the total weight budget
    #[arg(long)]
    max_total_weight: Option<u32>,
    /// Overrides the review weight budget
    #[arg(long)]
    max_review_weight: Option<u32>,
    /// Overrides the new item weight budget
    #[arg(long)]
    max_new_weight: Option<u32>,
    /// Fixes the tie-break order
    #[arg(long, hide = true)]
    seed: Option<u64>,
}

fn setup_logger(path: &Path, verbose: bool) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {} {}: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .chain(fern::log_file(path)?)
        .apply()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let data_dir = cli.data_dir;
    fs::create_dir_all(&data_dir)?;
    setup_logger(&data_dir.join("drill.log"), cli.verbose)?;

    let config = Config::load(&data_dir.join("config.toml"))?;
    let store = JsonStore::new(data_dir.join("db.json"));
    let mut dataset = store.load()?;
    let files_root = data_dir.join("files");
    println!(
        "{} items, {} words",
        dataset.items().len(),
        dataset.words().len()
    );

    match cli.command.unwrap_or(Command::Practice(PracticeArgs::default())) {
        Command::Practice(args) => practice(&mut dataset, &store, config, &files_root, args)?,
        Command::AddWords { files } => {
            let report = srs_drill::add_words(&mut dataset, &files_root, &files, Utc::now())?;
            print_added(&report);
            store.save(&dataset)?;
            complete(&mut dataset, &store, &config, &files_root)?;
        }
        Command::AddWordsWithText { files } => {
            let report = srs_drill::add_words_with_text(
                &mut dataset,
                &files_root,
                &files,
                &config.audio_extensions,
                Utc::now(),
            )?;
            print_added(&report);
            store.save(&dataset)?;
        }
        Command::AddSentences { files } => {
            let report = srs_drill::add_sentences(&mut dataset, &files_root, &files, Utc::now())?;
            print_added(&report);
            store.save(&dataset)?;
        }
        Command::AddDialogs { files } => {
            let report = srs_drill::add_dialogs(&mut dataset, &files_root, &files, Utc::now())?;
            print_added(&report);
            store.save(&dataset)?;
        }
        Command::Complete => complete(&mut dataset, &store, &config, &files_root)?,
        Command::History => {
            let report = ReviewReport::collect(dataset.items().iter().map(|i| &i.history), &Local);
            for (day, count) in &report.days {
                println!("{day} {count}");
            }
            let time = report.estimated_time(Duration::seconds(5));
            println!(
                "total {} reviews, about {} minutes",
                report.total,
                time.num_minutes()
            );
        }
        Command::Stats => {
            print!(
                "{}",
                Stats::collect(&dataset, &config.due_model(), Utc::now())
            );
        }
    }
    Ok(())
}

fn practice(
    dataset: &mut Dataset,
    store: &JsonStore,
    mut config: Config,
    files_root: &Path,
    args: PracticeArgs,
) -> Result<(), Box<dyn Error>> {
    let budget = &mut config.budget;
    budget.max_total_weight = args.max_total_weight.unwrap_or(budget.max_total_weight);
    budget.max_review_weight = args.max_review_weight.unwrap_or(budget.max_review_weight);
    budget.max_new_weight = args.max_new_weight.unwrap_or(budget.max_new_weight);
    config.validate()?;

    let selection = srs_drill::plan_session(dataset, &config, Utc::now(), args.seed);
    println!(
        "{} entries to review, {} reviews and {} new selected",
        selection.due_reviews, selection.review_count, selection.new_count
    );
    if selection.items.is_empty() {
        return Ok(());
    }

    let player = CommandPlayer::new(config.player.clone(), files_root);
    let (sender, receiver) = key_queue();
    let terminal = Terminal::enter()?;
    spawn_key_reader(sender, config.keys.quit);
    let summary = Session::new(
        dataset,
        selection.items,
        config.keys,
        terminal,
        player,
        receiver,
        BackgroundWriter::spawn(store.clone()),
    )
    .run()?;

    store.save(dataset)?;
    println!(
        "{} presented, {} leveled up, {} reset",
        summary.presented, summary.leveled_up, summary.reset
    );
    Ok(())
}

fn complete(
    dataset: &mut Dataset,
    store: &JsonStore,
    config: &Config,
    files_root: &Path,
) -> Result<(), Box<dyn Error>> {
    let mut player = CommandPlayer::new(config.player.clone(), files_root);
    let done = srs_drill::complete(
        dataset,
        &mut player,
        io::stdin().lock(),
        io::stdout(),
        |d| store.save(d),
    )?;
    info!("completed {done} words");
    Ok(())
}

fn print_added(report: &[Added]) {
    for added in report {
        let verb = if added.added { "added" } else { "skip" };
        println!("{verb} {} {}", added.variant, added.audio.display());
    }
}
