use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use pso_workflow_scheduler::domain::experiment::{ComparisonRecord, ExperimentRunner};
use pso_workflow_scheduler::domain::utils::statistics::{write_fitness_history, write_records};
use pso_workflow_scheduler::domain::workflow::workflow::Workflow;
use pso_workflow_scheduler::{load_experiment_config, load_workflow, logger, save_workflow};

/// Workflow scheduling with a CPOP list scheduler and a particle swarm optimizer.
#[derive(Debug, Parser)]
#[command(name = "pso_workflow_scheduler", version, about, long_about = None)]
struct Cli {
    /// Experiment configuration (JSON). Defaults are used when omitted.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a random workflow and store it as JSON.
    Generate {
        #[arg(long, value_name = "N")]
        tasks: usize,

        /// Overrides the generator seed of the configuration.
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, value_name = "PATH")]
        output: String,
    },

    /// Schedule one workflow and report the simulated metrics.
    Run {
        /// Workflow file to schedule.
        #[arg(long, value_name = "PATH", conflicts_with = "tasks", required_unless_present = "tasks")]
        workflow: Option<String>,

        /// Generate a workflow of this size instead of loading one.
        #[arg(long, value_name = "N")]
        tasks: Option<usize>,

        #[arg(long, value_name = "V")]
        vms: usize,

        #[arg(long, value_enum, default_value = "both")]
        algorithm: AlgorithmArg,

        /// Write the PSO fitness history to this CSV file.
        #[arg(long, value_name = "PATH")]
        history: Option<String>,
    },

    /// Compare CPOP and PSO over a grid of workflow and pool sizes.
    Batch {
        #[arg(long, value_delimiter = ',', required = true)]
        tasks: Vec<usize>,

        #[arg(long, value_delimiter = ',', required = true)]
        vms: Vec<usize>,

        #[arg(long, value_name = "PATH", default_value = "results.csv")]
        output: String,

        /// Write the fitness histories of all PSO runs to this CSV file.
        #[arg(long, value_name = "PATH")]
        history: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AlgorithmArg {
    Cpop,
    Pso,
    Both,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init();

    let mut config = load_experiment_config(cli.config.as_deref()).context("Failed to load the experiment configuration")?;

    match cli.command {
        Command::Generate { tasks, seed, output } => {
            if seed.is_some() {
                config.generator.seed = seed;
            }
            let runner = ExperimentRunner::new(config);
            let workflow = runner.generator().generate(tasks)?;
            save_workflow(&output, &workflow).with_context(|| format!("Failed to write workflow to '{}'", output))?;
            println!("{} {} tasks, {} dependencies -> {}", "Generated".green().bold(), workflow.len(), workflow.edge_count(), output);
        }
        Command::Run { workflow, tasks, vms, algorithm, history } => {
            let runner = ExperimentRunner::new(config);
            let workflow = match (workflow, tasks) {
                (Some(path), _) => load_workflow(&path).with_context(|| format!("Failed to load workflow '{}'", path))?,
                (None, Some(n)) => runner.generator().generate(n)?,
                (None, None) => bail!("either --workflow or --tasks is required"),
            };
            run_single(&runner, &workflow, vms, algorithm, history.as_deref())?;
        }
        Command::Batch { tasks, vms, output, history } => {
            let runner = ExperimentRunner::new(config);
            let result = runner.run_batch(&tasks, &vms)?;

            print_records(&result.records);
            write_records(&output, &result.records).with_context(|| format!("Failed to write results to '{}'", output))?;
            if let Some(path) = history {
                write_records(&path, &result.histories).with_context(|| format!("Failed to write fitness histories to '{}'", path))?;
            }
            println!("{} {}", "Results written to".green().bold(), output);
        }
    }

    Ok(())
}

fn run_single(runner: &ExperimentRunner, workflow: &Workflow, vms: usize, algorithm: AlgorithmArg, history: Option<&str>) -> anyhow::Result<()> {
    let mut records = Vec::new();

    if algorithm != AlgorithmArg::Pso {
        records.push(runner.run_cpop(workflow, vms)?);
    }
    if algorithm != AlgorithmArg::Cpop {
        let (record, outcome) = runner.run_pso(workflow, vms)?;
        records.push(record);

        if let Some(path) = history {
            write_fitness_history(path, &outcome.fitness_history).with_context(|| format!("Failed to write fitness history to '{}'", path))?;
        }
    }

    print_records(&records);
    Ok(())
}

fn print_records(records: &[ComparisonRecord]) {
    println!(
        "{}",
        format!("{:<6} {:>6} {:>4} {:>12} {:>12} {:>14} {:>8} {:>8}", "ALG", "TASKS", "VMS", "MAKESPAN", "EXEC TIME", "ENERGY", "MISSED", "QOS").bold()
    );
    for record in records {
        println!(
            "{:<6} {:>6} {:>4} {:>12.2} {:>12.2} {:>14.2} {:>7.1}% {:>7.1}%",
            record.algorithm.to_string().cyan(),
            record.task_count,
            record.vm_count,
            record.makespan,
            record.total_execution_time,
            record.energy,
            record.deadline_miss_ratio * 100.0,
            record.qos_score * 100.0
        );
    }
}
