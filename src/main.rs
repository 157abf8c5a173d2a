use anyhow::Result;
use clap::{Parser, Subcommand};
use contact_letor::config::{GeneratorConfig, RunConfig};
use contact_letor::data::edgelist::load_edge_list;
use contact_letor::data::preprocessing::remove_self_loops;
use contact_letor::letor::combiner::{self, parse_selection};
use contact_letor::letor::format::load_instances;
use contact_letor::letor::ranking::{load_predictions, RUN_NAME};
use contact_letor::letor::{
    generate_files, train_and_predict, CommandTrainer, GenerationPaths, InstanceSet, Normalization, PredictionRanker,
};
use contact_letor::storage;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[clap(
    name = "contact-letor",
    about = "Learning-to-rank feature generation for contact recommendation"
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0", global = true)]
    threads: usize,

    /// Verbose logging
    #[clap(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate training and test instance sets
    Generate {
        /// JSON file with the algorithms and samplers
        #[clap(long)]
        config: PathBuf,

        /// Edge list the training features are computed on
        #[clap(long)]
        train_instances: PathBuf,

        /// Edge list labeling the training pairs
        #[clap(long)]
        train_classes: PathBuf,

        /// Edge list the test features are computed on
        #[clap(long)]
        test_instances: PathBuf,

        /// Edge list labeling the test pairs
        #[clap(long)]
        test_classes: PathBuf,

        /// Output directory for results
        #[clap(long, default_value = "letor_results")]
        output_dir: PathBuf,

        /// Treat the graphs as undirected
        #[clap(long)]
        undirected: bool,

        /// Read edge weights of the sampling graph
        #[clap(long)]
        weighted_sampling: bool,

        /// Read edge weights of the graph the features are computed on
        #[clap(long)]
        weighted_features: bool,

        /// Per-query normalization: none, ranksim, minmax or zscore
        #[clap(long, default_value = "none")]
        normalization: Normalization,

        /// Keep candidates that already link to the query
        #[clap(long)]
        keep_reciprocal: bool,

        /// Remove self-loops from the input graphs
        #[clap(long)]
        remove_self_loops: bool,

        /// Seed of the random filler
        #[clap(long, default_value = "0")]
        seed: u64,

        /// Only generate the test set
        #[clap(long)]
        only_test: bool,
    },

    /// Merge the feature columns of two instance sets
    Combine {
        first: PathBuf,
        second: PathBuf,

        /// Comma separated 0-based columns of the first set (-1 = all)
        #[clap(long, default_value = "-1", allow_hyphen_values = true)]
        first_features: String,

        /// Comma separated 0-based columns of the second set (-1 = all)
        #[clap(long, default_value = "-1", allow_hyphen_values = true)]
        second_features: String,

        #[clap(long)]
        output: PathBuf,

        /// Where to describe the combined features
        #[clap(long)]
        description: Option<PathBuf>,
    },

    /// Train a ranking model with an external trainer and rank contacts for the test users
    Rank {
        #[clap(long)]
        train: PathBuf,
        #[clap(long)]
        valid: PathBuf,
        #[clap(long)]
        test: PathBuf,

        /// Edge list the test features were computed on; its links are never recommended
        #[clap(long)]
        graph: PathBuf,

        /// Treat the graph as undirected
        #[clap(long)]
        undirected: bool,

        /// Trainer executable
        #[clap(long)]
        trainer: PathBuf,

        /// Trainer configuration file
        #[clap(long)]
        trainer_config: Option<PathBuf>,

        /// Directory holding intermediate files, model and predictions
        #[clap(long, default_value = "rank_work")]
        work_dir: PathBuf,

        /// TREC run with the rankings of the full feature set
        #[clap(long, default_value = "ranking.txt")]
        output: PathBuf,

        /// Contacts kept per user
        #[clap(long, default_value = "100")]
        cutoff: usize,

        /// Keep candidates that already link to the user
        #[clap(long)]
        keep_reciprocal: bool,

        /// Also rank with every prefix of the feature columns, each in its own subdirectory
        #[clap(long)]
        prefix_sweep: bool,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    // Set number of threads
    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        // If threads = 0, use all available cores
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    match args.command {
        Commands::Generate {
            config,
            train_instances,
            train_classes,
            test_instances,
            test_classes,
            output_dir,
            undirected,
            weighted_sampling,
            weighted_features,
            normalization,
            keep_reciprocal,
            remove_self_loops,
            seed,
            only_test,
        } => {
            let run = RunConfig::load(&config)?;
            let generator = GeneratorConfig {
                directed: !undirected,
                weighted_sampling,
                weighted_features,
                normalization,
                exclude_reciprocal: !keep_reciprocal,
                filler_seed: seed,
                remove_self_loops,
                only_test,
            };
            let paths = GenerationPaths {
                train_instances,
                train_classes,
                test_instances,
                test_classes,
                train_output: output_dir.join("train.letor"),
                test_output: output_dir.join("test.letor"),
                feature_info: output_dir.join("features.txt"),
                summary: Some(output_dir.join("summary.json")),
            };

            log::info!("Starting feature generation");
            let splits = generate_files(&run, &generator, &paths)?;
            for split in &splits {
                log::info!(
                    "{}: {} instances written to {}",
                    split.name,
                    split.stats.instances,
                    split.output.display()
                );
            }
            log::info!("Generation complete. Results saved to {}", output_dir.display());
        }

        Commands::Combine {
            first,
            second,
            first_features,
            second_features,
            output,
            description,
        } => {
            let first_selection = parse_selection(&first_features)?;
            let second_selection = parse_selection(&second_features)?;
            let first_set = load_instances(&first)?;
            let second_set = load_instances(&second)?;

            let combined = combiner::combine(
                &first_set,
                first_selection.as_deref(),
                &second_set,
                second_selection.as_deref(),
            )?;
            storage::save_instances(&combined, &output)?;
            if let Some(description) = description {
                storage::save_combined_description(combined.info(), &first, &second, description)?;
            }
        }

        Commands::Rank {
            train,
            valid,
            test,
            graph,
            undirected,
            trainer,
            trainer_config,
            work_dir,
            output,
            cutoff,
            keep_reciprocal,
            prefix_sweep,
        } => {
            let train_set = load_instances(&train)?;
            let valid_set = load_instances(&valid)?;
            let test_set = load_instances(&test)?;
            let graph = remove_self_loops(&load_edge_list(&graph, !undirected, false)?);
            let ranker = PredictionRanker::new(&graph, !keep_reciprocal, cutoff);

            let full = CommandTrainer::new(&trainer, trainer_config.clone(), &work_dir);
            rank_with(&full, &ranker, &train_set, &valid_set, &test_set, &output)?;

            if prefix_sweep {
                for count in 2..train_set.info().len() {
                    log::info!("Starting experiment with the top {} features", count);
                    let dir = work_dir.join(format!("top{count}"));
                    let prefix = CommandTrainer::new(&trainer, trainer_config.clone(), &dir);
                    rank_with(
                        &prefix,
                        &ranker,
                        &train_set.prefix(count),
                        &valid_set.prefix(count),
                        &test_set.prefix(count),
                        &dir.join("ranking.txt"),
                    )?;
                }
            }
            log::info!("Rankings written to {}", output.display());
        }
    }

    Ok(())
}

/// Trains inside the trainer's directory and saves the filtered rankings of the test users
fn rank_with(
    trainer: &CommandTrainer,
    ranker: &PredictionRanker,
    train: &InstanceSet,
    valid: &InstanceSet,
    test: &InstanceSet,
    output: &Path,
) -> Result<()> {
    let predictions = train_and_predict(trainer, train, valid, test)?;
    let scores = load_predictions(&predictions)?;
    let rankings = ranker.rank(test, &scores)?;
    storage::save_ranking(&rankings, RUN_NAME, output)
}
