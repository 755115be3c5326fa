mod handlers;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use common::Coordinator;
use glob::glob;
use tokio::net::TcpListener;
use tokio::time::sleep;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "coordinator")]
#[command(about = "coordinator del ejecutor MapReduce")]
struct Cli {
    /// Archivos de entrada (o patrones glob): una tarea MAP por archivo
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<String>,

    /// Cantidad R de particiones reduce
    #[arg(long, default_value_t = 10)]
    n_reduce: u32,

    /// Segundos antes de reasignar una tarea sin ack
    #[arg(long, default_value_t = 10)]
    task_timeout_secs: u64,

    /// Dirección de escucha del servidor HTTP
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: String,
}

/// Expande cada argumento como glob; un patrón sin matches pasa tal cual
/// (el worker reportará el error de lectura si el archivo no existe).
fn expand_inputs(patterns: &[String]) -> Vec<String> {
    let mut files = Vec::new();
    for pattern in patterns {
        let mut matched = false;
        if let Ok(paths) = glob(pattern) {
            for path in paths.flatten() {
                if path.is_file() {
                    files.push(path.to_string_lossy().to_string());
                    matched = true;
                }
            }
        }
        if !matched {
            files.push(pattern.clone());
        }
    }
    files
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
        .with_env_filter("coordinator=debug,common=debug,axum=info")
        .init();

    let files = expand_inputs(&cli.inputs);
    info!(
        "{} archivos de entrada, n_reduce={}, timeout={}s",
        files.len(),
        cli.n_reduce,
        cli.task_timeout_secs
    );

    let coordinator = Coordinator::new(files, cli.n_reduce)
        .with_timeout(Duration::from_secs(cli.task_timeout_secs));

    let app = handlers::build_router(coordinator.clone());
    let listener = TcpListener::bind(&cli.bind).await?;
    info!("coordinator escuchando en {}", listener.local_addr()?);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("error sirviendo http: {e}");
        }
    });

    while !coordinator.done() {
        sleep(Duration::from_secs(1)).await;
    }

    // un segundo de gracia para que los workers pendientes reciban ABORT
    sleep(Duration::from_secs(1)).await;
    info!("todas las tareas retiradas, apagando");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_inputs_globs_and_passes_literals() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        std::fs::write(dir.path().join("b.txt"), "y").unwrap();

        let pattern = dir.path().join("*.txt").to_string_lossy().to_string();
        let mut expanded = expand_inputs(&[pattern]);
        expanded.sort();
        assert_eq!(expanded.len(), 2);
        assert!(expanded[0].ends_with("a.txt"));
        assert!(expanded[1].ends_with("b.txt"));

        // sin matches: el argumento pasa tal cual
        let literal = expand_inputs(&["no-existe.txt".to_string()]);
        assert_eq!(literal, vec!["no-existe.txt".to_string()]);
    }
}
