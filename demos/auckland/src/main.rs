//! auckland — end-to-end demo for the rn road-network engine.
//!
//! ```text
//! auckland [DATA_DIR] [CONFIG_JSON]
//! ```
//!
//! With no arguments, loads a small synthetic dataset of central Auckland.
//! With `DATA_DIR`, loads the tab files found there instead.  `CONFIG_JSON`
//! overrides `EngineConfig` fields; missing fields keep their defaults.
//!
//! Set `RUST_LOG=debug` to see per-query logging from the library.

mod network;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use log::info;

use rn_core::{EngineConfig, NodeId};
use rn_network::{CostMode, Engine, LightPolicy};

use network::{build_dataset, BRITOMART, PONSONBY_ROAD};

const SEARCH_PREFIXES: [&str; 3] = ["Qu", "K", "Unnamed"];

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let data_dir = args.next().map(PathBuf::from);
    let config = match args.next() {
        Some(path) => {
            let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str::<EngineConfig>(&text).with_context(|| format!("parsing {path}"))?
        }
        None => EngineConfig::default(),
    };

    println!("=== auckland — rn road-network engine ===");
    println!();

    // 1. Load.
    let mut engine = Engine::new(config)?;
    let t0 = Instant::now();
    match &data_dir {
        Some(dir) => engine.load_dir(dir).with_context(|| format!("loading {}", dir.display()))?,
        None => engine.load(&build_dataset())?,
    }
    let graph = engine.graph();
    println!(
        "Loaded {} nodes, {} segments, {} roads in {:.3} s",
        graph.node_count(),
        graph.segment_count(),
        graph.road_count(),
        t0.elapsed().as_secs_f64(),
    );

    // 2. Endpoints: the synthetic pair, or the lowest and highest node ids.
    let (from, to) = match data_dir {
        None => (BRITOMART, PONSONBY_ROAD),
        Some(_) => match (graph.nodes.first(), graph.nodes.last()) {
            (Some(a), Some(b)) => (a.id, b.id),
            _ => {
                println!("Dataset is empty; nothing to query.");
                return Ok(());
            }
        },
    };

    // 3. Click near the start.
    if let Some(start) = graph.node_by_id(from) {
        let click = start.location.offset(0.003, -0.002);
        match engine.nearest_to_click(click) {
            Some(hit) => println!(
                "Click at {click} → {} [{}]",
                hit.id,
                engine.road_labels_at(hit.id)?.join(", "),
            ),
            None => println!("Click at {click} → nothing within {} km", engine.config().click_radius),
        }
    }
    println!();

    // 4. Route under every cost model.
    println!("{:<10} {:<10} {:>6} {:>10} {:>10}", "Mode", "Lights", "Nodes", "Cost", "Km");
    println!("{}", "-".repeat(50));
    for mode in [CostMode::Distance, CostMode::Speed] {
        for lights in [LightPolicy::Ignore, LightPolicy::PreferLit] {
            let route = engine.route(from, to, mode, lights)?;
            println!(
                "{:<10} {:<10} {:>6} {:>10.4} {:>10.3}",
                format!("{mode:?}"),
                format!("{lights:?}"),
                route.nodes.len(),
                route.total_cost,
                route.length(engine.graph()),
            );
        }
    }
    println!();

    let route = engine.route(from, to, CostMode::Speed, LightPolicy::PreferLit)?;
    if route.is_empty() {
        println!("No route from {from} to {to}.");
    } else {
        println!("Directions {from} → {to}:");
        for leg in route.legs(engine.graph()) {
            println!("  {:<24} {:>7.3} km", leg.label, leg.length);
        }
        info!("route json: {}", serde_json::to_string(&route)?);
    }
    println!();

    // 5. Road search.
    for prefix in SEARCH_PREFIXES {
        let labels = engine.search(prefix);
        println!(
            "Search {prefix:?}: {} label(s), {} segment(s) highlighted  {:?}",
            labels.len(),
            engine.highlight(prefix).len(),
            labels,
        );
    }
    println!();

    // 6. Cut points.
    let points = engine.articulation_points();
    let shown: Vec<NodeId> = points.iter().copied().take(10).collect();
    println!("Articulation points: {} {:?}{}", points.len(), shown, if points.len() > 10 { " …" } else { "" });

    Ok(())
}
