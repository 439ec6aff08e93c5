use crate::infra::{parse_criterion, parse_kind, parse_override};
use capsule_core::config::AppConfig;
use capsule_core::decision::{
    validate_value, CriterionId, DecisionError, DecisionMechanism, RankedAlgorithm,
    ScenarioController, ScenarioId, START_SCENARIO_ID,
};
use capsule_core::encapsulation::{
    AlgorithmRegistry, CarrierTrailer, Dataset, DatasetKind, DirectoryBag, EncapsulationAlgorithm,
    EncapsulationOutcome, Encapsulator,
};
use capsule_core::error::AppError;
use capsule_core::telemetry;
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Criterion adjustments applied to the start scenario before ranking.
#[derive(Args, Debug, Default)]
pub(crate) struct ScenarioOverrides {
    /// Set a criterion value between 0 and 100, e.g. --set velocity=80
    #[arg(long = "set", value_name = "CRITERION=VALUE", value_parser = parse_override)]
    pub(crate) set: Vec<(CriterionId, i64)>,
    /// Leave a criterion out of the score
    #[arg(long, value_name = "CRITERION", value_parser = parse_criterion)]
    pub(crate) disable: Vec<CriterionId>,
}

impl ScenarioOverrides {
    fn apply(
        &self,
        controller: &ScenarioController,
        scenario: &ScenarioId,
    ) -> Result<(), DecisionError> {
        for (criterion, raw) in &self.set {
            let value = validate_value(*raw)?;
            controller.set_criterion_value(scenario, criterion, value)?;
        }
        for criterion in &self.disable {
            controller.criterion_activation_change(scenario, criterion, false)?;
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub(crate) struct RankArgs {
    #[command(flatten)]
    pub(crate) overrides: ScenarioOverrides,
    /// Only list algorithms able to process this dataset kind
    #[arg(long, value_parser = parse_kind)]
    pub(crate) kind: Option<DatasetKind>,
    /// Write the ranking to stdout as CSV
    #[arg(long)]
    pub(crate) csv: bool,
}

#[derive(Args, Debug)]
pub(crate) struct EncapsulateArgs {
    /// Carrier file the payloads are packaged with
    #[arg(long)]
    pub(crate) carrier: PathBuf,
    /// Payload file, may be repeated
    #[arg(long = "payload")]
    pub(crate) payloads: Vec<PathBuf>,
    /// Use this algorithm instead of the highest ranked applicable one
    #[arg(long)]
    pub(crate) algorithm: Option<String>,
    /// Override the dataset kind derived from the carrier extension
    #[arg(long, value_parser = parse_kind)]
    pub(crate) kind: Option<DatasetKind>,
    /// Artifact directory (defaults to CAPSULE_OUTPUT_DIR)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) overrides: ScenarioOverrides,
}

#[derive(Args, Debug)]
pub(crate) struct RestoreArgs {
    /// Artifact produced by `encapsulate`
    #[arg(long)]
    pub(crate) artifact: PathBuf,
    /// Algorithm that produced the artifact (inferred when omitted)
    #[arg(long)]
    pub(crate) algorithm: Option<String>,
    /// Directory receiving the restored files
    #[arg(long)]
    pub(crate) output: PathBuf,
}

#[derive(Debug, Serialize)]
struct RankingRow<'a> {
    rank: usize,
    algorithm_id: &'a str,
    algorithm_name: &'a str,
    score: u64,
    normalized: f64,
    supported_kinds: String,
}

pub(crate) fn run_rank(args: RankArgs) -> Result<(), AppError> {
    let registry = AlgorithmRegistry::standard();
    let mut ranking = rank_start_scenario(&args.overrides, &registry)?;
    if let Some(kind) = args.kind {
        ranking.retain(|ranked| ranked.algorithm.supports(kind));
    }

    if args.csv {
        write_ranking_csv(io::stdout().lock(), &ranking)?;
    } else {
        render_ranking(&ranking, args.kind);
    }
    Ok(())
}

pub(crate) fn run_encapsulate(args: EncapsulateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.storage.output_dir.clone());
    let registry = AlgorithmRegistry::standard();
    let outcome = encapsulate_dataset(&args, &Encapsulator::new(output), &registry)?;

    println!("{}", outcome.summary());
    Ok(())
}

pub(crate) fn run_restore(args: RestoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let registry = AlgorithmRegistry::standard();
    let encapsulator = Encapsulator::new(config.storage.output_dir);
    let restored = restore_artifact(&args, &encapsulator, &registry)?;

    println!("Restored {} file(s) into {}", restored.len(), args.output.display());
    for path in restored {
        println!("- {}", path.display());
    }
    Ok(())
}

fn rank_start_scenario(
    overrides: &ScenarioOverrides,
    registry: &AlgorithmRegistry,
) -> Result<Vec<RankedAlgorithm>, AppError> {
    let controller = ScenarioController::new(DecisionMechanism::new());
    let start = ScenarioId::new(START_SCENARIO_ID);
    overrides.apply(&controller, &start)?;
    Ok(controller.rank(&start, registry)?)
}

fn encapsulate_dataset(
    args: &EncapsulateArgs,
    encapsulator: &Encapsulator,
    registry: &AlgorithmRegistry,
) -> Result<EncapsulationOutcome, AppError> {
    let mut dataset = Dataset::new(args.carrier.clone(), args.payloads.clone());
    if let Some(kind) = args.kind {
        dataset = dataset.with_kind(kind);
    }

    let outcome = match &args.algorithm {
        Some(id) => {
            let algorithm = lookup_algorithm(registry, id)?;
            encapsulator.encapsulate(&dataset, algorithm.as_ref())?
        }
        None => {
            let ranking = rank_start_scenario(&args.overrides, registry)?;
            encapsulator.encapsulate_ranked(&dataset, &ranking)?
        }
    };
    Ok(outcome)
}

fn restore_artifact(
    args: &RestoreArgs,
    encapsulator: &Encapsulator,
    registry: &AlgorithmRegistry,
) -> Result<Vec<PathBuf>, AppError> {
    let id = match &args.algorithm {
        Some(id) => id.as_str(),
        None => infer_algorithm(&args.artifact),
    };
    let algorithm = lookup_algorithm(registry, id)?;
    Ok(encapsulator.decapsulate(&args.artifact, algorithm.as_ref(), &args.output)?)
}

/// Bags are directories; everything else is taken to carry a trailer.
fn infer_algorithm(artifact: &Path) -> &'static str {
    if artifact.is_dir() {
        DirectoryBag::ID
    } else {
        CarrierTrailer::ID
    }
}

fn lookup_algorithm(
    registry: &AlgorithmRegistry,
    id: &str,
) -> Result<Arc<dyn EncapsulationAlgorithm>, AppError> {
    registry.get(id).cloned().ok_or_else(|| {
        let known: Vec<&str> = registry.algorithms().iter().map(|a| a.id()).collect();
        AppError::Usage(format!(
            "unknown algorithm '{id}' (expected one of {})",
            known.join(", ")
        ))
    })
}

fn write_ranking_csv<W: Write>(writer: W, ranking: &[RankedAlgorithm]) -> Result<(), AppError> {
    let mut csv = csv::Writer::from_writer(writer);
    for (index, ranked) in ranking.iter().enumerate() {
        let kinds: Vec<&str> = ranked
            .algorithm
            .supported_kinds()
            .iter()
            .map(|kind| kind.label())
            .collect();
        csv.serialize(RankingRow {
            rank: index + 1,
            algorithm_id: ranked.algorithm.id(),
            algorithm_name: ranked.algorithm.name(),
            score: ranked.score.total,
            normalized: ranked.score.normalized(),
            supported_kinds: kinds.join(";"),
        })
        .map_err(io::Error::from)?;
    }
    csv.flush()?;
    Ok(())
}

fn render_ranking(ranking: &[RankedAlgorithm], kind: Option<DatasetKind>) {
    match kind {
        Some(kind) => println!("Algorithm ranking for {kind} datasets"),
        None => println!("Algorithm ranking"),
    }

    if ranking.is_empty() {
        println!("- no applicable algorithms");
        return;
    }

    for (index, ranked) in ranking.iter().enumerate() {
        println!(
            "{}. {} ({}) score {} ({:.1}%)",
            index + 1,
            ranked.algorithm.name(),
            ranked.algorithm.id(),
            ranked.score.total,
            ranked.score.normalized() * 100.0
        );
        for component in &ranked.score.components {
            println!(
                "   {}: {} x {} = {}",
                component.criterion, component.value, component.suitability, component.contribution
            );
        }
    }
}
