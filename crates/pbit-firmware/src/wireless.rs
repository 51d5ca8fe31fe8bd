//! BLE peripheral carrying sensor notifications to one connected peer.
//!
//! [`LinkPublisher`] runs inside the sampler task and only hands the latest
//! encoded [`NotifyPayload`] over a signal. [`run`] owns the radio: it
//! advertises the device name, serves the sensor characteristic and keeps
//! [`PEER_CONNECTED`] in step with the connection so the power manager
//! never sleeps under a live link.

use core::sync::atomic::{AtomicBool, Ordering};

use bt_hci::controller::ExternalController;
use embassy_futures::join::join;
use embassy_futures::select::select;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use esp_radio::ble::controller::BleConnector;
use log::{debug, info, warn};
use pbit_core::reading::SensorReading;
use pbit_core::wireless::{NotifyPayload, WirelessPublisher};
use trouble_host::prelude::*;

/// Set by the link task on connect, cleared on disconnect.
pub static PEER_CONNECTED: AtomicBool = AtomicBool::new(false);

/// One notification; fits the default 23-byte ATT MTU.
pub const FRAME_LEN: usize = 20;
pub type Frame = [u8; FRAME_LEN];

/// Latest frame from the sampler. Older frames are overwritten.
static FRAMES: Signal<CriticalSectionRawMutex, Frame> = Signal::new();

/// HCI transport to the on-chip controller
pub type RadioController = ExternalController<BleConnector<'static>, 20>;

const CONNECTIONS_MAX: usize = 1;
const L2CAP_CHANNELS_MAX: usize = 2;
const ADVERTISE_RETRY_SECS: u64 = 1;

/// `4fafc201-1fb5-459e-8fcc-c5c9c331914b`, little endian as it goes on air
const SERVICE_UUID_LE: [u8; 16] = [
    0x4b, 0x91, 0x31, 0xc3, 0xc9, 0xc5, 0xcc, 0x8f, 0x9e, 0x45, 0xb5, 0x1f, 0x01, 0xc2, 0xaf, 0x4f,
];

#[gatt_server]
struct PbitServer {
    sensors: SensorService,
}

#[gatt_service(uuid = "4fafc201-1fb5-459e-8fcc-c5c9c331914b")]
struct SensorService {
    /// Postcard-encoded [`NotifyPayload`], zero padded
    #[characteristic(uuid = "beb5483e-36e1-4688-b7f5-ea07361b26a8", read, notify)]
    reading: [u8; FRAME_LEN],
}

#[derive(Debug, Default)]
pub struct LinkPublisher;

impl WirelessPublisher for LinkPublisher {
    async fn publish(&mut self, reading: &SensorReading) {
        let payload = NotifyPayload::from_reading(reading);
        let mut frame = [0u8; FRAME_LEN];
        match postcard::to_slice(&payload, &mut frame) {
            Ok(bytes) => {
                debug!(" Notify payload: {} bytes", bytes.len());
                FRAMES.signal(frame);
            }
            Err(e) => warn!(" Failed to encode notify payload: {:?}", e),
        }
    }

    fn is_peer_connected(&self) -> bool {
        PEER_CONNECTED.load(Ordering::Relaxed)
    }
}

/// Static random address derived from the Bluetooth MAC.
fn random_address(mac: [u8; 6]) -> Address {
    let mut bytes = mac;
    bytes.reverse();
    // Static random addresses have both top bits set
    bytes[5] |= 0xC0;
    Address::random(bytes)
}

/// Bring up the host stack and serve peers one at a time, forever.
pub async fn run(controller: RadioController, mac: [u8; 6], name: &'static str) {
    let mut resources: HostResources<DefaultPacketPool, CONNECTIONS_MAX, L2CAP_CHANNELS_MAX> =
        HostResources::new();
    let stack =
        trouble_host::new(controller, &mut resources).set_random_address(random_address(mac));
    let Host {
        mut peripheral,
        runner,
        ..
    } = stack.build();

    let server = match PbitServer::new_with_config(GapConfig::Peripheral(PeripheralConfig {
        name,
        appearance: &appearance::sensor::GENERIC_SENSOR,
    })) {
        Ok(server) => server,
        Err(e) => {
            warn!(" GATT server setup failed: {}", e);
            return;
        }
    };

    info!(" Advertising as {}", name);
    join(host_task(runner), async {
        loop {
            match advertise(name, &mut peripheral, &server).await {
                Ok(conn) => {
                    PEER_CONNECTED.store(true, Ordering::Relaxed);
                    info!(" Peer connected");
                    serve(&server, &conn).await;
                    PEER_CONNECTED.store(false, Ordering::Relaxed);
                }
                Err(e) => {
                    warn!(" Advertising failed: {:?}", e);
                    Timer::after_secs(ADVERTISE_RETRY_SECS).await;
                }
            }
        }
    })
    .await;
}

async fn host_task(mut runner: Runner<'_, RadioController, DefaultPacketPool>) {
    loop {
        if let Err(e) = runner.run().await {
            warn!(" BLE host stopped: {:?}", e);
        }
    }
}

/// Service UUID in the advertisement, name in the scan response.
async fn advertise<'values, 'server, C: Controller>(
    name: &'values str,
    peripheral: &mut Peripheral<'values, C, DefaultPacketPool>,
    server: &'server PbitServer<'values>,
) -> Result<GattConnection<'values, 'server, DefaultPacketPool>, BleHostError<C::Error>> {
    let mut adv_data = [0; 31];
    let adv_len = AdStructure::encode_slice(
        &[
            AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED),
            AdStructure::ServiceUuids128(&[SERVICE_UUID_LE]),
        ],
        &mut adv_data[..],
    )?;
    let mut scan_data = [0; 31];
    let scan_len = AdStructure::encode_slice(
        &[AdStructure::CompleteLocalName(name.as_bytes())],
        &mut scan_data[..],
    )?;

    let advertiser = peripheral
        .advertise(
            &Default::default(),
            Advertisement::ConnectableScannableUndirected {
                adv_data: &adv_data[..adv_len],
                scan_data: &scan_data[..scan_len],
            },
        )
        .await?;
    let conn = advertiser.accept().await?.with_attribute_server(server)?;
    Ok(conn)
}

/// Answer GATT requests and forward sampler frames until the peer leaves.
async fn serve(server: &PbitServer<'_>, conn: &GattConnection<'_, '_, DefaultPacketPool>) {
    let reading = server.sensors.reading;

    let events = async {
        loop {
            match conn.next().await {
                GattConnectionEvent::Disconnected { reason } => {
                    info!(" Peer disconnected: {:?}", reason);
                    break;
                }
                GattConnectionEvent::Gatt { event } => match event.accept() {
                    Ok(reply) => reply.send().await,
                    Err(e) => warn!(" GATT reply failed: {:?}", e),
                },
                _ => {}
            }
        }
    };

    let notify = async {
        loop {
            let frame = FRAMES.wait().await;
            if let Err(e) = reading.notify(conn, &frame).await {
                warn!(" Notify failed: {:?}", e);
                break;
            }
        }
    };

    select(events, notify).await;
}
