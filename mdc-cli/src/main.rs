use clap::{value_parser, Arg, ArgAction, Command};
use mdc_core::Pipeline;
use mdc_test_utils::scenarios::{self, Scenario};

/// One row of the `scenarios` table: the name passed to `compile --scenario`
/// alongside a one-line description of the worked example it builds.
const SCENARIOS: &[(&str, fn() -> Scenario, &str)] = &[
    (
        "two-cleanings-in-sequence",
        scenarios::two_cleanings_in_sequence,
        "A forAll-Achieve goal with a SEQ annotation cleans two rooms strictly in order",
    ),
    (
        "parallel-independent-tasks",
        scenarios::parallel_independent_tasks,
        "Two independent primitive tasks joined by PAR, no constraint between them",
    ),
    (
        "context-dependency-forces-order",
        scenarios::context_dependency_forces_order,
        "A goal's creation condition on an earlier task's effect promotes PAR to SEQ",
    ),
    (
        "achieve-condition-filter",
        scenarios::achieve_condition_filter,
        "Two methods for one abstract task, one reaching the achieve condition",
    ),
    (
        "or-decomposition-multiple-missions",
        scenarios::or_decomposition_multiple_missions,
        "An OR decomposition between two primitive tasks yields two missions",
    ),
    (
        "non-group-scope-forces-exclusion",
        scenarios::non_group_scope_forces_exclusion,
        "A group=false scope over a shared robot argument emits an EXEC-EXCLUSIVE constraint",
    ),
];

fn lookup(name: &str) -> Option<Scenario> {
    SCENARIOS.iter().find(|(n, _, _)| *n == name).map(|(_, build, _)| build())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Command::new("mdc")
        .version(mdc_core::VERSION)
        .about("Mission Decomposition Compiler")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("compile")
                .about("Compile a built-in fixture scenario and report its missions")
                .arg(
                    Arg::new("scenario")
                        .long("scenario")
                        .required(true)
                        .value_parser(value_parser!(String))
                        .help("Scenario name, see `mdc scenarios`"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the report as JSON instead of text"),
                ),
        )
        .subcommand(Command::new("scenarios").about("List the built-in fixture scenario names"));

    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("compile", args)) => {
            let name = args.get_one::<String>("scenario").expect("required");
            let json = args.get_flag("json");
            run_compile(name, json);
        }
        Some(("scenarios", _)) => {
            for (name, _, description) in SCENARIOS {
                println!("{name:<36} {description}");
            }
        }
        _ => {}
    }
}

fn run_compile(name: &str, json: bool) {
    tracing::info!(scenario = name, "building fixture scenario");
    let Some(scenario) = lookup(name) else {
        eprintln!("unknown scenario '{name}', see `mdc scenarios`");
        std::process::exit(2);
    };

    let compiled = match Pipeline::compile(&scenario.registry, &scenario.goal_model, &scenario.kb, &scenario.config, &scenario.world) {
        Ok(compiled) => compiled,
        Err(err) => {
            eprintln!("compilation failed: {err}");
            std::process::exit(1);
        }
    };

    let instance_ids: Vec<String> = compiled.instances.instances.keys().map(ToString::to_string).collect();
    let missions: Vec<Vec<String>> = compiled
        .missions
        .iter()
        .map(|m| m.decompositions.iter().map(ToString::to_string).collect())
        .collect();

    if json {
        let report = serde_json::json!({
            "scenario": name,
            "task_instances": instance_ids,
            "constraints": compiled.constraints,
            "missions": missions,
        });
        println!("{}", serde_json::to_string_pretty(&report).expect("report serializes"));
        return;
    }

    println!("Scenario: {name}");
    println!();
    println!("Task instances ({}):", instance_ids.len());
    for id in &instance_ids {
        println!("  {id}");
    }
    println!();
    println!("Constraints ({}):", compiled.constraints.len());
    for c in &compiled.constraints {
        println!("  {:?} {} -> {}", c.kind, c.a, c.b);
    }
    println!();
    println!("Missions ({}):", missions.len());
    for (i, mission) in missions.iter().enumerate() {
        println!("  mission {i}: {}", mission.join(", "));
    }
}
