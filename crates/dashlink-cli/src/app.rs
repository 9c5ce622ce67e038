//! Wires a transport into a terminal gauge readout
//!
//! The receiver prints every relayed sample as a gauge line; the sender
//! streams synthetic readings through the same sensor math the real app
//! applies to its accelerometer, so the receiving side sees realistic
//! motion.

use std::time::Duration;

use dashlink_ble::BleSensorLink;
use dashlink_core::{sensor, PeerDevice, SensorLink, SensorSample};
use dashlink_wifi::WifiSensorLink;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};
use tracing::{info, warn};

use crate::cli::{Cli, RoleArg, TransportArg};
use crate::config::AppConfig;
use crate::error::{CliError, Result};

// ----------------------------------------------------------------------------
// Entry
// ----------------------------------------------------------------------------

pub async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    match (cli.transport, cli.role) {
        (TransportArg::Wifi, RoleArg::Receiver) => wifi_receiver(&cli, &config).await,
        (TransportArg::Wifi, RoleArg::Sender) => wifi_sender(&cli, &config).await,
        (TransportArg::Ble, RoleArg::Receiver) => ble_receiver(&config).await,
        (TransportArg::Ble, RoleArg::Sender) => ble_sender(&cli, &config).await,
    }
}

// ----------------------------------------------------------------------------
// Receiver Roles
// ----------------------------------------------------------------------------

async fn wifi_receiver(cli: &Cli, config: &AppConfig) -> Result<()> {
    let ip = cli.ip.as_deref().ok_or(CliError::MissingServerAddress)?;

    let mut link = WifiSensorLink::new(config.wifi.clone());
    install_gauge_callbacks(&mut link);

    link.connect_to_server(ip).await?;
    wait_for_shutdown().await;
    link.destroy().await;
    Ok(())
}

async fn ble_receiver(config: &AppConfig) -> Result<()> {
    let mut link = BleSensorLink::new(config.ble.clone());
    install_gauge_callbacks(&mut link);
    link.initialize().await?;

    // surface discovered peers and connect to the first one
    let (found_tx, mut found_rx) = mpsc::unbounded_channel::<PeerDevice>();
    link.start_scanning(Box::new(move |device| {
        let _ = found_tx.send(device);
    }))
    .await?;

    let device = timeout(config.ble.scan_timeout, found_rx.recv())
        .await
        .ok()
        .flatten()
        .ok_or(CliError::NoDeviceFound)?;
    info!(name = %device.name, "connecting to discovered sensor");
    link.connect(&device).await?;

    wait_for_shutdown().await;
    link.destroy().await;
    Ok(())
}

// ----------------------------------------------------------------------------
// Sender Roles
// ----------------------------------------------------------------------------

async fn wifi_sender(cli: &Cli, config: &AppConfig) -> Result<()> {
    let mut link = WifiSensorLink::new(config.wifi.clone());
    install_gauge_callbacks(&mut link);

    let addr = link.start_server().await?;
    info!(%addr, "waiting for a receiver; point it at this address");

    stream_demo_samples(&mut link, cli, config).await;
    link.destroy().await;
    Ok(())
}

async fn ble_sender(cli: &Cli, config: &AppConfig) -> Result<()> {
    let mut link = BleSensorLink::new(config.ble.clone());
    install_gauge_callbacks(&mut link);
    link.initialize().await?;
    link.start_advertising().await?;
    info!("advertising; waiting for a receiver to subscribe");

    stream_demo_samples(&mut link, cli, config).await;
    link.destroy().await;
    Ok(())
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

fn install_gauge_callbacks(link: &mut dyn SensorLink) {
    link.set_on_data_received(Box::new(|sample| {
        info!(
            "pitch {:+6.1}°  roll {:+6.1}°  alt {}  speed {}",
            sample.pitch,
            sample.roll,
            sample
                .altitude
                .map_or_else(|| "   --".to_string(), |a| format!("{a:5.0} m")),
            sample
                .speed
                .map_or_else(|| "  --".to_string(), |s| format!("{s:4.0} km/h")),
        );
    }));
    link.set_on_connection_change(Box::new(|up, name| {
        if up {
            info!(peer = name.as_deref().unwrap_or("unknown"), "link up");
        } else {
            warn!("link down");
        }
    }));
}

/// Stream synthetic samples until interrupted; sends while the link has a
/// receiver and stays quiet otherwise.
async fn stream_demo_samples(link: &mut dyn SensorLink, cli: &Cli, config: &AppConfig) {
    let cadence = cli.interval_ms.unwrap_or(config.demo.interval_ms);
    let mut ticker = interval(Duration::from_millis(cadence.max(10)));
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tick += 1;
                if !link.is_connected() {
                    continue;
                }
                let sample = demo_sample(tick, &config.demo);
                if let Err(e) = link.send_sample(&sample).await {
                    warn!("send failed: {e}");
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
}

async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}

/// One synthetic reading: a gentle sweep through the gauge range, derived
/// from a simulated accelerometer vector like the real sender would do.
fn demo_sample(tick: u64, demo: &crate::config::DemoConfig) -> SensorSample {
    let phase = tick as f64 / 50.0;
    let x = phase.sin() * 2.0;
    let y = (phase * 0.7).cos() * 1.5;
    let z = 9.81;
    sensor::sample_from_accel(x, y, z)
        .with_altitude(demo.base_altitude + (phase * 0.2).sin() * 15.0)
        .with_speed(sensor::speed_kmh(
            demo.base_speed_mps + 3.0 * (phase * 0.3).sin(),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DemoConfig;

    #[test]
    fn demo_samples_are_always_wire_safe() {
        let demo = DemoConfig::default();
        for tick in 0..500 {
            let sample = demo_sample(tick, &demo);
            assert!(sample.is_finite());
            assert!(sample.pitch.abs() <= 90.0);
            assert!(sample.roll.abs() <= 90.0);
        }
    }
}
