// Headless driver for the garden.
//
// Populates a random garden, then runs it frame by frame with the light
// source on its day/night orbit, printing each event's status line and a
// final per-plant report. Geometry is published to a counting scene graph
// and meshed at the end so the whole pipeline is exercised.
//
// Usage:
//   garden [OPTIONS]
//     --seed <N>           PRNG seed (default: 42)
//     --plants <N>         Number of pots (default: from config)
//     --seconds <S>        Simulated seconds to run (default: 120)
//     --fps <N>            Frames per simulated second (default: 30)
//     --config <PATH>      Load a GardenConfig JSON file
//     --water-every <S>    Water every pot each S seconds (default: 20, 0 = never)
//     --force-growth       Every growth roll succeeds
//     --json               Print events as JSON lines instead of text
//
// Logging goes through `tracing`; set `RUST_LOG=debug` for per-plant detail.

use std::collections::BTreeMap;

use verdant_sim::command::SimCommand;
use verdant_sim::config::GardenConfig;
use verdant_sim::environment::SunOrbit;
use verdant_sim::mesh::{MeshConfig, build_plant_mesh};
use verdant_sim::plant::PlantGeometry;
use verdant_sim::scene::{InMemoryAssets, SceneGraph, publish_events};
use verdant_sim::scheduler::GrowthRoll;
use verdant_sim::sim::{SimState, TickInput};
use verdant_sim::types::PlantId;

struct Options {
    seed: u64,
    plants: Option<u32>,
    seconds: f64,
    fps: u32,
    config_path: Option<String>,
    water_every: f64,
    force_growth: bool,
    json: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            seed: 42,
            plants: None,
            seconds: 120.0,
            fps: 30,
            config_path: None,
            water_every: 20.0,
            force_growth: false,
            json: false,
        }
    }
}

/// Scene graph that keeps the latest geometry per plant.
#[derive(Default)]
struct HeadlessScene {
    attached: BTreeMap<PlantId, PlantGeometry>,
    replacements: usize,
}

impl SceneGraph for HeadlessScene {
    fn attach_geometry(&mut self, plant: PlantId, geometry: &PlantGeometry) {
        self.attached.insert(plant, geometry.clone());
    }

    fn detach_geometry(&mut self, plant: PlantId) {
        if self.attached.remove(&plant).is_some() {
            self.replacements += 1;
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let options = parse_args();

    let mut config = match &options.config_path {
        Some(path) => match GardenConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {e}");
                std::process::exit(1);
            }
        },
        None => GardenConfig::default(),
    };
    if let Some(plants) = options.plants {
        config.layout.plant_count = plants;
    }
    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {e}");
        std::process::exit(1);
    }

    let orbit = SunOrbit::from_params(&config.sun);
    let mut state = SimState::with_config(options.seed, config);
    if options.force_growth {
        state.growth_roll = GrowthRoll::AlwaysSucceed;
    }

    let mut assets = InMemoryAssets::default();
    let setup = match state.populate(&mut assets) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Failed to set up garden: {e}");
            std::process::exit(1);
        }
    };
    let mut scene = HeadlessScene::default();
    for event in &setup.events {
        print_event(event, options.json);
    }

    let fps = options.fps.max(1);
    let dt = 1.0 / fps as f64;
    let frames = (options.seconds * fps as f64).round() as u64;
    let water_frames = (options.water_every * fps as f64).round() as u64;

    for frame in 1..=frames {
        let elapsed = frame as f64 * dt;
        let commands = if water_frames > 0 && frame % water_frames == 0 {
            vec![SimCommand::WaterAll]
        } else {
            Vec::new()
        };
        let result = state.step(&commands, TickInput::new(dt, orbit.position_at(elapsed)));
        publish_events(&result.events, &state, &mut scene);
        for event in &result.events {
            print_event(event, options.json);
        }
    }

    println!();
    println!(
        "Garden after {:.0}s ({}):",
        state.clock_ms / 1000.0,
        state.day_phase()
    );
    for status in state.status_report() {
        println!("  {status}");
    }

    let mesh_config = MeshConfig::default();
    let (vertices, triangles) = scene
        .attached
        .values()
        .map(|geometry| build_plant_mesh(geometry, &mesh_config))
        .fold((0, 0), |(v, t), mesh| {
            (v + mesh.vertex_count(), t + mesh.triangle_count())
        });
    println!(
        "Scene: {} plants published, {} geometry replacements",
        scene.attached.len(),
        scene.replacements,
    );
    println!("Mesh: {vertices} vertices, {triangles} triangles");
}

fn print_event(event: &verdant_sim::event::SimEvent, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => eprintln!("Failed to encode event: {e}"),
        }
    } else {
        println!("{event}");
    }
}

/// Parse command-line arguments. Uses simple `std::env::args()` matching.
fn parse_args() -> Options {
    let mut options = Options::default();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    fn value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
        args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
            eprintln!("{flag} requires a valid value");
            std::process::exit(1);
        })
    }

    while i < args.len() {
        match args[i].as_str() {
            "--seed" => {
                i += 1;
                options.seed = value(&args, i, "--seed");
            }
            "--plants" => {
                i += 1;
                options.plants = Some(value(&args, i, "--plants"));
            }
            "--seconds" => {
                i += 1;
                options.seconds = value(&args, i, "--seconds");
            }
            "--fps" => {
                i += 1;
                options.fps = value(&args, i, "--fps");
            }
            "--config" => {
                i += 1;
                options.config_path = Some(value(&args, i, "--config"));
            }
            "--water-every" => {
                i += 1;
                options.water_every = value(&args, i, "--water-every");
            }
            "--force-growth" => options.force_growth = true,
            "--json" => options.json = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    options
}

fn print_usage() {
    println!("Usage: garden [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --seed <N>           PRNG seed (default: 42)");
    println!("  --plants <N>         Number of pots (default: from config)");
    println!("  --seconds <S>        Simulated seconds to run (default: 120)");
    println!("  --fps <N>            Frames per simulated second (default: 30)");
    println!("  --config <PATH>      Load a GardenConfig JSON file");
    println!("  --water-every <S>    Water every pot each S seconds (default: 20, 0 = never)");
    println!("  --force-growth       Every growth roll succeeds");
    println!("  --json               Print events as JSON lines instead of text");
    println!("  --help, -h           Show this help");
}
