//! mesh-kernel CLI
//!
//! Exit codes: 0 on success or idempotent skip; 1 on validation failure,
//! path-safety violation, or I/O error, with a message on stderr.

use anyhow::{bail, Context};
use clap::{Arg, ArgAction, Command};
use mesh_kernel::{KernelConfig, Pipeline, PipelineOutcome};
use mesh_ledger::{IdempotencyKey, Ledger};
use mesh_routing::{
    decide_route_for_path, Complexity, CostSensitivity, IntentRouter, LaneSelector, Op, Source,
    WorkOrderBuilder, WorkOrderRequest, ZoneClassifier,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn cli() -> Command {
    Command::new("mesh-kernel")
        .version("0.1.0")
        .about("Task-routing and idempotent patch-execution core")
        .arg_required_else_help(true)
        .arg(
            Arg::new("base")
                .long("base")
                .global(true)
                .default_value(".")
                .help("Directory to discover the managed repository root from"),
        )
        .subcommand(
            Command::new("apply")
                .about("Apply a patch spec idempotently")
                .arg(
                    Arg::new("spec")
                        .long("spec")
                        .required(true)
                        .help("Path to the YAML/JSON patch spec"),
                ),
        )
        .subcommand(
            Command::new("route")
                .about("Route an intent and print the decision and work order")
                .arg(Arg::new("intent").long("intent").required(true).help("Intent name"))
                .arg(
                    Arg::new("source")
                        .long("source")
                        .default_value("interactive")
                        .help("Request source (interactive, background, ...)"),
                )
                .arg(Arg::new("path").long("path").required(true).help("Target path, relative to the managed root"))
                .arg(
                    Arg::new("op")
                        .long("op")
                        .default_value("read")
                        .help("Operation class: read, write, or delete"),
                )
                .arg(
                    Arg::new("locked")
                        .long("locked")
                        .action(ArgAction::SetTrue)
                        .help("Mark the payload as touching a locked zone"),
                )
                .arg(
                    Arg::new("impact-zone")
                        .long("impact-zone")
                        .action(ArgAction::Append)
                        .help("Declared impact zone (repeatable)"),
                )
                .arg(
                    Arg::new("instructions")
                        .long("instructions")
                        .default_value("")
                        .help("Instructions carried into the work order"),
                ),
        )
        .subcommand(
            Command::new("lane")
                .about("Choose the dev lane for a source")
                .arg(Arg::new("source").long("source").required(true).help("Work source"))
                .arg(
                    Arg::new("complexity")
                        .long("complexity")
                        .default_value("simple")
                        .help("simple, moderate, or complex"),
                )
                .arg(
                    Arg::new("cost")
                        .long("cost")
                        .default_value("normal")
                        .help("Cost sensitivity: low, normal, or high"),
                ),
        )
        .subcommand(
            Command::new("ledger")
                .about("Query the idempotency ledger")
                .subcommand(
                    Command::new("find")
                        .about("Report whether a success entry exists for a key")
                        .arg(Arg::new("key").long("key").required(true).help("Idempotency key (hex)")),
                ),
        )
}

fn run() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let base = matches.get_one::<String>("base").expect("has default");
    let config = KernelConfig::discover(base);

    match matches.subcommand() {
        Some(("apply", sub)) => {
            let spec = sub.get_one::<String>("spec").expect("required");
            let pipeline = Pipeline::new(config);
            match pipeline.apply_spec(spec)? {
                PipelineOutcome::Applied { key, summary } => {
                    let out = serde_json::json!({
                        "status": "applied",
                        "idempotency_key": key.to_hex(),
                        "summary": summary,
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
                PipelineOutcome::Skipped { key, entry } => {
                    let out = serde_json::json!({
                        "status": "skipped",
                        "idempotency_key": key.to_hex(),
                        "recorded": entry,
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
            }
            Ok(())
        }
        Some(("route", sub)) => {
            let intent = sub.get_one::<String>("intent").expect("required");
            let source = Source::parse(sub.get_one::<String>("source").expect("has default"));
            let path = sub.get_one::<String>("path").expect("required");
            let op = parse_op(sub.get_one::<String>("op").expect("has default"))?;

            let classifier = ZoneClassifier::with_default_zones(&config.base_dir);
            let decision = decide_route_for_path(&classifier, &source, path, op);

            let impact_zones: Vec<String> = sub
                .get_many::<String>("impact-zone")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            let request = WorkOrderRequest {
                instructions: sub.get_one::<String>("instructions").expect("has default").clone(),
                target_files: vec![path.clone()],
                impact_zone: if impact_zones.is_empty() {
                    None
                } else {
                    Some(serde_json::json!(impact_zones))
                },
                locked_zone: sub.get_flag("locked"),
                ..WorkOrderRequest::default()
            };
            let builder =
                WorkOrderBuilder::new(IntentRouter::with_default_intents(classifier));
            let order = builder.build(intent, request);

            let out = serde_json::json!({"decision": decision, "work_order": order});
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        Some(("lane", sub)) => {
            let source = sub.get_one::<String>("source").expect("required");
            let complexity = parse_complexity(sub.get_one::<String>("complexity").expect("has default"))?;
            let cost = parse_cost(sub.get_one::<String>("cost").expect("has default"))?;

            let selector = LaneSelector::from_yaml_file(&config.lane_config_path);
            let lane = selector.choose_dev_lane(source, complexity, cost);
            println!("{}", serde_json::json!({"lane": lane}));
            Ok(())
        }
        Some(("ledger", sub)) => match sub.subcommand() {
            Some(("find", find)) => {
                let raw = find.get_one::<String>("key").expect("required");
                let key: IdempotencyKey =
                    raw.parse().context("invalid idempotency key")?;
                let ledger = Ledger::new(&config.ledger_path);
                let entry = ledger.find_success(&key)?;
                let out = serde_json::json!({"found": entry.is_some(), "entry": entry});
                println!("{}", serde_json::to_string_pretty(&out)?);
                Ok(())
            }
            _ => bail!("unknown ledger subcommand"),
        },
        _ => bail!("unknown subcommand"),
    }
}

fn parse_op(raw: &str) -> anyhow::Result<Op> {
    match raw {
        "read" => Ok(Op::Read),
        "write" => Ok(Op::Write),
        "delete" => Ok(Op::Delete),
        other => bail!("invalid op '{other}' (expected read, write, or delete)"),
    }
}

fn parse_complexity(raw: &str) -> anyhow::Result<Complexity> {
    match raw {
        "simple" => Ok(Complexity::Simple),
        "moderate" => Ok(Complexity::Moderate),
        "complex" => Ok(Complexity::Complex),
        other => bail!("invalid complexity '{other}'"),
    }
}

fn parse_cost(raw: &str) -> anyhow::Result<CostSensitivity> {
    match raw {
        "low" => Ok(CostSensitivity::Low),
        "normal" => Ok(CostSensitivity::Normal),
        "high" => Ok(CostSensitivity::High),
        other => bail!("invalid cost sensitivity '{other}'"),
    }
}
