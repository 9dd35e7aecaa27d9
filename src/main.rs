use std::{
    fs::File,
    io::{self, Read},
};

use anyhow::{Context, Result};
use clap::Parser;
use timed_bufwriter::{BufferedWriter, Sink};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod args;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("timed_bufwriter=info".parse()?),
        )
        .init();

    let args = args::Args::parse();
    let config = args.writer_config()?;

    let sink: Box<dyn Sink> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };

    let writer = BufferedWriter::builder()
        .sink(sink)
        .config(&config)
        .on_flush_error(|e| error!("periodic flush failed: {e}"))
        .build()?;
    info!("{writer}");

    let mut stdin = io::stdin().lock();
    let mut chunk = vec![0; args.chunk.max(1)];
    let mut total = 0;
    loop {
        let n = match stdin.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("reading stdin"),
        };

        writer.write(&chunk[..n]).context("writing to sink")?;
        total += n;
    }

    // Close doesn't flush on its own
    writer.try_flush().context("final flush")?;
    writer.close().context("closing sink")?;
    info!(bytes = total, "done");

    Ok(())
}
