//! Scan one page and dump the raw records

use std::fs::File;
use std::io::Write;

use anyhow::Context;
use bro2::{Device, OptionId, OptionValue};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let ip = std::env::var("SCANNER_IP").unwrap_or_else(|_| "192.168.1.20".to_string());
    let out = std::env::var("SCAN_OUT").unwrap_or_else(|_| "scan.raw".to_string());

    let mut device = Device::new(ip, bro2::DEFAULT_PORT);
    device.set_option(OptionId::XResolution, OptionValue::Int(200))?;
    device.set_option(OptionId::YResolution, OptionValue::Int(200))?;

    device.connect().await.context("scanner did not accept the session")?;

    let params = device.start().await?;
    println!("Scanning: {}", params);

    let mut file = File::create(&out).with_context(|| format!("cannot create {}", out))?;
    let mut total = 0usize;

    loop {
        match device.read_record().await {
            Ok(Some(record)) => {
                total += record.payload.len();
                file.write_all(&record.payload)?;
            }
            Ok(None) => continue,
            Err(bro2::Error::Disconnected) => break,
            Err(e) => return Err(e.into()),
        }
    }

    println!("Wrote {} bytes to {}", total, out);
    Ok(())
}
