extern crate clap;
extern crate pbr;
extern crate env_logger;
extern crate rand;
#[macro_use] extern crate log;

use blossom_primal::util::*;
use blossom_primal::visualize::*;
use blossom_primal::mwpm_solver::*;
use pbr::ProgressBar;


fn create_clap_parser<'a>(color_choice: clap::ColorChoice) -> clap::Command<'a> {
    clap::Command::new("Blossom Primal")
        .version(env!("CARGO_PKG_VERSION"))
        .author(clap::crate_authors!(", "))
        .about("Blossom V primal engine for minimum-weight perfect matching on general graphs")
        .color(color_choice)
        .propagate_version(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(clap::Command::new("solve")
            .about("solve a graph given as a JSON file of `{\"vertex_num\": n, \"weighted_edges\": [[i, j, w], ..]}`")
            .arg(clap::Arg::new("file").required(true).help("path to the graph file"))
            .arg(clap::Arg::new("solver_config").long("solver-config").takes_value(true).default_value("{}")
                .help("solver options in JSON, e.g. {\"recursive_grow\": false}"))
            .arg(clap::Arg::new("visualizer").long("visualizer").takes_value(true).help("record every step to this file")))
        .subcommand(clap::Command::new("test")
            .about("testing features")
            .subcommand_required(true)
            .arg_required_else_help(true)
            .subcommand(clap::Command::new("random").about("compare against exhaustive search on random graphs")
                .arg(clap::Arg::new("rounds").short('r').long("rounds").takes_value(true).default_value("1000"))
                .arg(clap::Arg::new("vertex_num").short('n').long("vertex-num").takes_value(true).default_value("12"))
                .arg(clap::Arg::new("edge_probability").short('p').long("edge-probability").takes_value(true).default_value("0.4"))
                .arg(clap::Arg::new("max_weight").long("max-weight").takes_value(true).default_value("30"))
                .arg(clap::Arg::new("seed").long("seed").takes_value(true).help("first seed, random by default"))
                .arg(clap::Arg::new("solver_config").long("solver-config").takes_value(true).default_value("{\"sanity_check\": true}"))
                .arg(clap::Arg::new("enable_visualizer").long("enable_visualizer").help("record the last round to the default visualizer file")))
        )
}

fn parse_value<T: std::str::FromStr>(matches: &clap::ArgMatches, name: &str) -> T where T::Err: std::fmt::Debug {
    matches.value_of(name).expect("argument has a default value").parse::<T>().unwrap_or_else(|error| {
        panic!("invalid value of {}: {:?}", name, error)
    })
}

fn parse_solver_config(matches: &clap::ArgMatches) -> SolverOptions {
    let solver_config = matches.value_of("solver_config").expect("argument has a default value");
    serde_json::from_str(solver_config).unwrap_or_else(|error| panic!("invalid solver config: {}", error))
}

pub fn main() {

    env_logger::init();
    let matches = create_clap_parser(clap::ColorChoice::Auto).get_matches();

    match matches.subcommand() {
        Some(("solve", matches)) => {
            let filename = matches.value_of("file").expect("required argument");
            let content = std::fs::read_to_string(filename).unwrap_or_else(|error| panic!("cannot read {}: {}", filename, error));
            let initializer: SolverInitializer = serde_json::from_str(&content).unwrap_or_else(|error| panic!("invalid graph file: {}", error));
            let options = parse_solver_config(matches);
            let mut visualizer = matches.value_of("visualizer").map(|filename| {
                Visualizer::new(Some(filename.to_string())).unwrap_or_else(|error| panic!("cannot create {}: {}", filename, error))
            });
            match BlossomSolver::mwpm_solve_visualizer(&initializer, options, visualizer.as_mut()) {
                Ok(perfect_matching) => println!("{}", serde_json::to_string(&perfect_matching).expect("serializable")),
                Err(error) => {
                    eprintln!("{}", error);
                    std::process::exit(1);
                },
            }
        },
        Some(("test", matches)) => {
            match matches.subcommand() {
                Some(("random", matches)) => {
                    let rounds: u64 = parse_value(matches, "rounds");
                    let vertex_num: VertexNum = parse_value(matches, "vertex_num");
                    let edge_probability: f64 = parse_value(matches, "edge_probability");
                    let max_weight: u32 = parse_value(matches, "max_weight");
                    let first_seed: u64 = match matches.value_of("seed") {
                        Some(seed) => seed.parse().unwrap_or_else(|error| panic!("invalid seed: {:?}", error)),
                        None => rand::random(),
                    };
                    let options = parse_solver_config(matches);
                    let enable_visualizer = matches.is_present("enable_visualizer");
                    info!("random test from seed {} with {:?}", first_seed, options);
                    let mut pb = ProgressBar::on(std::io::stderr(), rounds);
                    pb.message(format!("n={vertex_num} p={edge_probability} ").as_str());
                    let mut total_statistics = vec![];
                    for round in 0..rounds {
                        pb.set(round);
                        let seed = first_seed.wrapping_add(round);
                        let initializer = random_graph(vertex_num, edge_probability, max_weight, true, seed);
                        let mut visualizer = None;
                        if enable_visualizer && round + 1 == rounds {
                            std::fs::create_dir_all(visualize_data_folder()).expect("cannot create visualizer folder");
                            let filename = visualize_data_folder() + auto_visualize_data_filename().as_str();
                            println!("visualizer file: {}", filename);
                            visualizer = Some(Visualizer::new(Some(filename)).expect("cannot create visualizer file"));
                        }
                        let mut solver = BlossomSolver::new(&initializer, options.clone()).expect("random graphs are valid");
                        let perfect_matching = solver.solve_visualizer(visualizer.as_mut())
                            .unwrap_or_else(|error| panic!("seed {}: {}", seed, error));
                        if let Err(message) = solver.verify_certificate(&perfect_matching) {
                            panic!("seed {}: {}", seed, message);
                        }
                        if vertex_num <= 20 {
                            assert_eq!(Some(perfect_matching.weight), brute_force_min_weight(&initializer), "seed {}: not optimal", seed);
                        }
                        total_statistics.push(solver.statistics().clone());
                    }
                    pb.finish();
                    println!();
                    let shrink_num: usize = total_statistics.iter().map(|statistics| statistics.shrink_num).sum();
                    let expand_num: usize = total_statistics.iter().map(|statistics| statistics.expand_num).sum();
                    println!("{} rounds passed, {} shrinks, {} expands", rounds, shrink_num, expand_num);
                },
                _ => unreachable!()
            }
        },
        _ => unreachable!()
    }

}
