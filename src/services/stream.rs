//! Sample streaming: the station end of the telemetry pipeline.
//!
//! Connects to a plot server, reads its greeting, then ships one encoded
//! sample per tick until the source runs dry or the limit is reached.

use core::fmt::Debug;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::config::NetConfig;
use crate::traits::SampleSource;

/// Streams samples from `source` to the plot server in `config`.
///
/// Pulls one sample per `config.interval_ms` tick. With `limit` set,
/// stops after that many samples (handy for tests and one-shot runs);
/// with `None` it streams until sampling or the connection fails.
///
/// Returns the number of samples sent.
pub async fn stream_samples<S>(
    source: &mut S,
    config: &NetConfig,
    limit: Option<usize>,
) -> anyhow::Result<usize>
where
    S: SampleSource,
    S::Error: Debug,
{
    let addr = format!("{}:{}", config.host, config.port);
    let stream = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("connecting to plot server at {addr}"))?;
    let mut stream = BufReader::new(stream);

    let mut greeting = String::new();
    stream
        .read_line(&mut greeting)
        .await
        .context("reading server greeting")?;
    println!("[Stream] Server says: {}", greeting.trim_end());

    let mut sent = 0usize;
    loop {
        if let Some(limit) = limit {
            if sent >= limit {
                break;
            }
        }

        let sample = source
            .sample()
            .map_err(|e| anyhow::anyhow!("sampling failed: {e:?}"))?;
        let line = sample
            .encode_line()
            .map_err(|e| anyhow::anyhow!("encoding sample failed: {e:?}"))?;
        stream
            .get_mut()
            .write_all(line.as_bytes())
            .await
            .context("sending sample")?;
        sent += 1;

        if config.interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(u64::from(config.interval_ms))).await;
        }
    }

    println!("[Stream] Done, {sent} sample(s) sent");
    Ok(sent)
}
