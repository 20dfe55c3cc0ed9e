use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hole_center::{pick_center_with_sink, AnnotationSink, Cli, FileSink, NoopSink};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = cli.config();

    // Diagnostic images land in the working directory
    let mut file_sink = FileSink::new(".");
    let mut noop = NoopSink;
    let sink: &mut dyn AnnotationSink = if cli.no_annotate {
        &mut noop
    } else {
        &mut file_sink
    };

    let offset = pick_center_with_sink(&cli.image, &config, sink)
        .with_context(|| format!("Failed to locate a hole in {:?}", cli.image))?;

    println!("Move right from origin(mm): {:.4}", offset.rel_x);
    println!("Move up from origin(mm): {:.4}", offset.rel_y);

    Ok(())
}
