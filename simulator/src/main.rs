mod status;

use clap::Parser;
use status::generate_status;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Posts random device status readings to a running status API.
#[derive(Debug, Parser)]
#[command(name = "simulator", version)]
struct Args {
    /// Base URL of the status API
    #[arg(long, env = "STATUS_API_URL", default_value = "http://127.0.0.1:8000")]
    url: String,

    /// Shared secret sent as `x-api-key`
    #[arg(long, env = "API_KEY")]
    api_key: Option<String>,

    /// Requests per second
    #[arg(long, env = "RATE", default_value_t = 10)]
    rate: u64,

    /// Number of simulated devices
    #[arg(long, env = "DEVICES", default_value_t = 20)]
    devices: usize,

    /// Stop after this many readings (runs until Ctrl-C when omitted)
    #[arg(long, env = "COUNT")]
    count: Option<u64>,
}

const BURST_SIZE: u64 = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    anyhow::ensure!(args.rate > 0, "rate must be greater than zero");
    anyhow::ensure!(args.devices > 0, "devices must be greater than zero");

    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting device status simulator");
    info!(
        "Target: {}, Rate: {} req/s, Devices: {}",
        args.url, args.rate, args.devices
    );

    let run_id = Uuid::new_v4().simple().to_string();
    let device_ids: Vec<String> = (0..args.devices)
        .map(|i| format!("sim-{}-{}", &run_id[..8], i))
        .collect();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    let endpoint = format!("{}/status/", args.url.trim_end_matches('/'));

    let burst = BURST_SIZE.min(args.rate);
    let burst_interval = Duration::from_millis((burst * 1000) / args.rate);
    info!("Posting in bursts of {} requests every {:?}", burst, burst_interval);

    let mut rng = rand::thread_rng();
    let mut sent = 0u64;
    let mut failed = 0u64;

    let run = async {
        loop {
            let burst_start = std::time::Instant::now();

            for _ in 0..burst {
                if args.count.is_some_and(|count| sent + failed >= count) {
                    return;
                }

                let index = ((sent + failed) % args.devices as u64) as usize;
                let status = generate_status(&mut rng, device_ids[index].clone());

                let mut request = client.post(&endpoint).json(&status);
                if let Some(key) = &args.api_key {
                    request = request.header("x-api-key", key);
                }

                match request.send().await {
                    Ok(response) if response.status().is_success() => sent += 1,
                    Ok(response) => {
                        failed += 1;
                        warn!(
                            "Status for {} rejected with {}",
                            status.device_id,
                            response.status()
                        );
                    }
                    Err(e) => {
                        failed += 1;
                        error!("Failed to post status: {}", e);
                    }
                }
            }

            if sent > 0 && sent % 1000 == 0 {
                info!("Posted {} readings", sent);
            }

            let elapsed = burst_start.elapsed();
            if elapsed < burst_interval {
                tokio::time::sleep(burst_interval - elapsed).await;
            } else if elapsed > burst_interval * 2 {
                warn!(
                    "Burst took {:?}, target was {:?} - server may be overloaded",
                    elapsed, burst_interval
                );
            }
        }
    };

    tokio::select! {
        _ = run => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Simulator stopped: {} posted, {} failed", sent, failed);
    Ok(())
}
