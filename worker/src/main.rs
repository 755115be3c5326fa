mod delivery;
mod worker;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use common::{apps, protocol, MapReduce};
use tracing::info;

use crate::delivery::HttpDelivery;
use crate::worker::Worker;

#[derive(Parser)]
#[command(name = "worker")]
#[command(about = "worker del ejecutor MapReduce")]
struct Cli {
    /// Nombre de la aplicación map/reduce registrada (ej: wordcount)
    #[arg(value_name = "APP")]
    app: String,

    /// Directorio de datos donde viven mr-map-* y mr-out-*
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Segundos de espera cuando el coordinator responde SNOOZE
    #[arg(long, default_value_t = 1)]
    snooze_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter("worker=debug,common=debug,reqwest=info")
        .init();

    let Some((mapf, reducef)) = apps::lookup(&cli.app) else {
        eprintln!("aplicación desconocida: {}", cli.app);
        std::process::exit(1);
    };

    // Nombre de host (solo para info)
    let hostname_str = hostname::get()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let base_url = protocol::coordinator_base_url();
    info!("worker en {} contra {}", hostname_str, base_url);

    let engine = MapReduce::new(mapf, reducef).with_dir(cli.dir);
    let worker = Worker::new(engine, HttpDelivery::new(base_url))
        .with_snooze(Duration::from_secs(cli.snooze_secs));

    worker.run().await
}
