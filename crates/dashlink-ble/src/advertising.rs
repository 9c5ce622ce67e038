//! Sender-side BLE advertising and GATT service hosting
//!
//! A sender phone advertises the dashboard service and hosts the sensor
//! characteristic so receivers can find it by name, connect, and subscribe.
//! BlueZ makes this possible on Linux; other platforms get a fallback that
//! reports the capability as unavailable instead of failing silently.

#[cfg(target_os = "linux")]
pub use linux::BleAdvertiser;

#[cfg(not(target_os = "linux"))]
pub use fallback::BleAdvertiser;

// ----------------------------------------------------------------------------
// Linux Implementation (BlueZ)
// ----------------------------------------------------------------------------

#[cfg(target_os = "linux")]
mod linux {
    use std::sync::Arc;

    use bluer::adv::{Advertisement, AdvertisementHandle, Type};
    use bluer::gatt::local::{
        characteristic_control, Application, ApplicationHandle, Characteristic,
        CharacteristicControlEvent, CharacteristicNotify, CharacteristicNotifyMethod,
        CharacteristicWrite, CharacteristicWriteMethod, Service,
    };
    use bluer::gatt::CharacteristicWriter;
    use dashlink_core::{codec, LinkError, LinkRole, Result, SensorSample, SharedSession};
    use futures::StreamExt;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::Mutex;
    use tokio::task::JoinHandle;
    use tracing::{debug, info, warn};

    use crate::config::BleLinkConfig;
    use crate::error::BleLinkError;
    use crate::protocol::{SENSOR_DATA_CHARACTERISTIC_UUID, SENSOR_SERVICE_UUID};

    /// Advertises the dashboard service and serves its characteristic
    pub struct BleAdvertiser {
        config: BleLinkConfig,
        session: Option<bluer::Session>,
        adapter: Option<bluer::Adapter>,
        adv_handle: Option<AdvertisementHandle>,
        app_handle: Option<ApplicationHandle>,
        control_task: Option<JoinHandle<()>>,
        notifier: Arc<Mutex<Option<CharacteristicWriter>>>,
        link_session: Option<SharedSession>,
    }

    impl BleAdvertiser {
        pub fn new(config: BleLinkConfig) -> Self {
            Self {
                config,
                session: None,
                adapter: None,
                adv_handle: None,
                app_handle: None,
                control_task: None,
                notifier: Arc::new(Mutex::new(None)),
                link_session: None,
            }
        }

        pub fn is_advertising(&self) -> bool {
            self.adv_handle.is_some()
        }

        async fn initialize(&mut self) -> Result<()> {
            if self.session.is_some() {
                return Ok(());
            }
            let session = bluer::Session::new()
                .await
                .map_err(|e| BleLinkError::Advertising(e.to_string()))?;
            let adapter = session
                .default_adapter()
                .await
                .map_err(|e| BleLinkError::Advertising(e.to_string()))?;
            adapter
                .set_powered(true)
                .await
                .map_err(|_| BleLinkError::PoweredOff)?;
            self.session = Some(session);
            self.adapter = Some(adapter);
            Ok(())
        }

        /// Advertise the service and start accepting subscribers/writers.
        ///
        /// The link counts as connected once a central acquires the notify
        /// or write handle; the connection callback fires accordingly.
        pub async fn start(&mut self, link_session: SharedSession) -> Result<()> {
            if self.is_advertising() {
                return Ok(());
            }
            self.initialize().await?;
            let adapter = self.adapter.as_ref().unwrap();

            let advertisement = Advertisement {
                advertisement_type: Type::Peripheral,
                service_uuids: vec![SENSOR_SERVICE_UUID].into_iter().collect(),
                discoverable: Some(true),
                local_name: Some(self.config.local_name.clone()),
                ..Default::default()
            };
            let adv_handle = adapter
                .advertise(advertisement)
                .await
                .map_err(|e| BleLinkError::Advertising(e.to_string()))?;

            let (mut control, control_handle) = characteristic_control();
            let application = Application {
                services: vec![Service {
                    uuid: SENSOR_SERVICE_UUID,
                    primary: true,
                    characteristics: vec![Characteristic {
                        uuid: SENSOR_DATA_CHARACTERISTIC_UUID,
                        write: Some(CharacteristicWrite {
                            write: true,
                            method: CharacteristicWriteMethod::Io,
                            ..Default::default()
                        }),
                        notify: Some(CharacteristicNotify {
                            notify: true,
                            method: CharacteristicNotifyMethod::Io,
                            ..Default::default()
                        }),
                        control_handle,
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            };
            let app_handle = adapter
                .serve_gatt_application(application)
                .await
                .map_err(|e| BleLinkError::Advertising(e.to_string()))?;

            info!(name = %self.config.local_name, "advertising dashboard sensor service");

            let session = link_session.clone();
            let notifier = Arc::clone(&self.notifier);
            self.control_task = Some(tokio::spawn(async move {
                while let Some(event) = control.next().await {
                    match event {
                        CharacteristicControlEvent::Write(request) => match request.accept() {
                            Ok(mut reader) => {
                                info!("central acquired the sensor write handle");
                                {
                                    let mut link = session.lock().unwrap();
                                    if !link.is_connected() {
                                        let _ = link.begin_connect(LinkRole::Receiver);
                                        let _ = link.complete_connect("central");
                                    }
                                }
                                let read_session = session.clone();
                                tokio::spawn(async move {
                                    let mut buf = vec![0u8; 512];
                                    loop {
                                        match reader.read(&mut buf).await {
                                            Ok(0) | Err(_) => break,
                                            Ok(n) => match codec::decode_ble(&buf[..n]) {
                                                Some(sample) => {
                                                    read_session.lock().unwrap().deliver(sample);
                                                }
                                                None => {
                                                    read_session.lock().unwrap().note_dropped()
                                                }
                                            },
                                        }
                                    }
                                    debug!("sensor write handle closed");
                                    read_session.lock().unwrap().mark_disconnected();
                                });
                            }
                            Err(e) => warn!("rejecting sensor write handle: {e}"),
                        },
                        CharacteristicControlEvent::Notify(writer) => {
                            info!("central subscribed to sensor notifications");
                            {
                                let mut link = session.lock().unwrap();
                                if !link.is_connected() {
                                    let _ = link.begin_connect(LinkRole::Sender);
                                    let _ = link.complete_connect("central");
                                }
                            }
                            *notifier.lock().await = Some(writer);
                        }
                    }
                }
                debug!("characteristic control stream ended");
            }));

            self.adv_handle = Some(adv_handle);
            self.app_handle = Some(app_handle);
            self.link_session = Some(link_session);
            Ok(())
        }

        /// Push one sample to the subscribed central
        pub async fn notify_sample(&mut self, sample: &SensorSample) -> Result<()> {
            let payload = codec::encode_ble(sample)?;
            let mut slot = self.notifier.lock().await;
            let writer = slot.as_mut().ok_or(LinkError::NotConnected)?;
            if let Err(e) = writer.write_all(payload.as_bytes()).await {
                // the subscriber went away; the link is down
                *slot = None;
                drop(slot);
                if let Some(link) = &self.link_session {
                    link.lock().unwrap().mark_disconnected();
                }
                return Err(LinkError::write_failed(e.to_string()));
            }
            Ok(())
        }

        /// Stop advertising and release the GATT application. Dropping the
        /// handles unregisters both from BlueZ.
        pub async fn stop(&mut self) {
            if let Some(task) = self.control_task.take() {
                task.abort();
            }
            *self.notifier.lock().await = None;
            self.adv_handle.take();
            self.app_handle.take();
            if let Some(link) = self.link_session.take() {
                link.lock().unwrap().mark_disconnected();
            }
            self.adapter = None;
            self.session = None;
        }
    }
}

// ----------------------------------------------------------------------------
// Fallback (no peripheral support)
// ----------------------------------------------------------------------------

#[cfg(not(target_os = "linux"))]
mod fallback {
    use dashlink_core::{LinkError, Result, SensorSample, SharedSession};
    use tracing::warn;

    use crate::config::BleLinkConfig;

    /// Placeholder advertiser for platforms without GATT server support
    pub struct BleAdvertiser;

    impl BleAdvertiser {
        pub fn new(_config: BleLinkConfig) -> Self {
            Self
        }

        pub fn is_advertising(&self) -> bool {
            false
        }

        pub async fn start(&mut self, _link_session: SharedSession) -> Result<()> {
            warn!("BLE advertising requires BlueZ; not supported on this platform");
            Err(LinkError::adapter_unavailable(
                "BLE advertising is only supported on Linux",
            ))
        }

        pub async fn notify_sample(&mut self, _sample: &SensorSample) -> Result<()> {
            Err(LinkError::NotConnected)
        }

        pub async fn stop(&mut self) {}
    }
}
