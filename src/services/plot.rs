//! Plot server: the PC end of the telemetry pipeline.
//!
//! Listens for a station, sends the greeting line, then parses every
//! received line into a [`Sample`] and hands it to a callback (which
//! would feed a live plot, a CSV writer, or just a test assertion).
//! Malformed lines are counted and skipped rather than killing the
//! connection; flaky WiFi produces torn lines in practice.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::config::NetConfig;
use crate::telemetry::Sample;

/// Per-connection statistics returned when a station disconnects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClientStats {
    /// Lines that parsed into a sample.
    pub samples: usize,
    /// Lines that did not parse.
    pub malformed: usize,
}

/// Telemetry receiver for plot-server lines.
pub struct PlotServer {
    listener: TcpListener,
    greeting: String,
}

impl PlotServer {
    /// Binds to `config.host:config.port`.
    pub async fn bind(config: &NetConfig) -> anyhow::Result<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("binding plot server to {addr}"))?;
        println!("[Plot] Listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            greeting: config.greeting.as_str().to_owned(),
        })
    }

    /// The address the server actually bound to (useful with port 0).
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts one station and serves it until it disconnects.
    ///
    /// Every parsed sample goes to `on_sample`. Returns the connection's
    /// statistics once the station hangs up.
    pub async fn accept_client<F>(&mut self, on_sample: F) -> anyhow::Result<ClientStats>
    where
        F: FnMut(Sample),
    {
        let (stream, peer) = self.listener.accept().await.context("accepting station")?;
        println!("[Plot] Station connected: {peer}");
        let stats = self.serve(stream, on_sample).await?;
        println!(
            "[Plot] Station {peer} disconnected ({} samples, {} malformed)",
            stats.samples, stats.malformed
        );
        Ok(stats)
    }

    /// Serves stations forever, one at a time.
    pub async fn run<F>(&mut self, mut on_sample: F) -> anyhow::Result<()>
    where
        F: FnMut(Sample),
    {
        loop {
            self.accept_client(&mut on_sample).await?;
        }
    }

    async fn serve<F>(&self, stream: TcpStream, mut on_sample: F) -> anyhow::Result<ClientStats>
    where
        F: FnMut(Sample),
    {
        let mut stream = stream;
        stream
            .write_all(format!("{}\r\n", self.greeting).as_bytes())
            .await
            .context("sending greeting")?;

        let mut stats = ClientStats::default();
        let mut lines = BufReader::new(stream).lines();
        while let Some(line) = lines.next_line().await? {
            match Sample::parse_line(&line) {
                Ok(sample) => {
                    stats.samples += 1;
                    on_sample(sample);
                }
                Err(e) => {
                    stats.malformed += 1;
                    println!("[Plot] Skipping malformed line {:?}: {:?}", line, e);
                }
            }
        }
        Ok(stats)
    }
}
