#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use bt_hci::controller::ExternalController;
use embassy_executor::Spawner;
use esp_hal::Blocking;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Flex, Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::rtc_cntl::Rtc;
use esp_hal::system::SleepSource;
use esp_hal::timer::timg::TimerGroup;
use esp_radio::ble::controller::BleConnector;
use log::info;
use rtt_target::rprintln;
use static_cell::StaticCell;

// Display-LCD panel specific imports
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use esp_hal::spi::master::{Config, Spi};
use mipidsi::interface::SpiInterface;
use mipidsi::options::{Orientation, Rotation};
use mipidsi::{Builder as MipidsiBuilder, Display, models::ST7735s};

use pbit_core::app_state::SharedState;
use pbit_core::boot::{bootstrap, play_splash};
use pbit_core::config::PbitConfig;
use pbit_core::display::{DeviceName, SharedDisplay};
use pbit_core::hal::{Clock, WakeCause};
use pbit_core::tasks::{InputChannel, control_loop, display_loop, sampler_loop};
use pbit_core::wireless::device_name;
use pbit_firmware::board::{BoardHal, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use pbit_firmware::clock::SleepClock;
use pbit_firmware::controls::Controls;
use pbit_firmware::dht11::Dht11;
use pbit_firmware::onewire::Ds18b20;
use pbit_firmware::prefs::RtcPreferenceStore;
use pbit_firmware::sensors::BoardSensors;
use pbit_firmware::wireless::{self, LinkPublisher, RadioController};

type PanelSpi = ExclusiveDevice<Spi<'static, Blocking>, Output<'static>, NoDelay>;
type PanelInterface = SpiInterface<'static, PanelSpi, Output<'static>>;
type PanelDisplay = Display<PanelInterface, ST7735s, Output<'static>>;

static STATE: SharedState = SharedState::new();
static INPUT: InputChannel = InputChannel::new();
static CLOCK: SleepClock = SleepClock::new();

static CONFIG: StaticCell<PbitConfig> = StaticCell::new();
static NAME: StaticCell<DeviceName> = StaticCell::new();
static SPI_BUFFER: StaticCell<[u8; 512]> = StaticCell::new();
static DISPLAY: StaticCell<SharedDisplay<PanelDisplay>> = StaticCell::new();
static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[embassy_executor::task]
async fn display_task(
    config: &'static PbitConfig,
    name: &'static DeviceName,
    display: &'static SharedDisplay<PanelDisplay>,
) {
    display_loop(config, name, &STATE, display, &CLOCK).await;
}

#[embassy_executor::task]
async fn sampler_task(config: &'static PbitConfig, mut sensors: BoardSensors) {
    let mut publisher = LinkPublisher;
    sampler_loop(config, &STATE, &mut sensors, &mut publisher, &CLOCK).await;
}

#[embassy_executor::task]
async fn controls_task(mut controls: Controls) {
    controls.run(&STATE, INPUT.sender(), &CLOCK).await;
}

#[embassy_executor::task]
async fn link_task(controller: RadioController, mac: [u8; 6], name: &'static DeviceName) {
    wireless::run(controller, mac, name.as_str()).await;
}

/// Bluetooth MAC, which the ESP32 derives from the factory base MAC.
fn bluetooth_mac() -> [u8; 6] {
    let mut mac = esp_hal::efuse::Efuse::mac_address();
    mac[5] = mac[5].wrapping_add(2);
    mac
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config: &'static PbitConfig = CONFIG.init(PbitConfig::default());
    config.validate().expect("Invalid power thresholds");

    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    let cause = match esp_hal::rtc_cntl::wakeup_cause() {
        SleepSource::Ext0 => WakeCause::ButtonWake,
        _ => WakeCause::ColdBoot,
    };

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    rprintln!("Embassy initialized!");

    // Configure and initialize the display

    // 1. Configure SPI bus
    let spi_bus = Spi::new(peripherals.SPI2, Config::default())
        .expect("Failed to configure SPI bus")
        .with_sck(peripherals.GPIO25)
        .with_mosi(peripherals.GPIO19);

    // 2. Chip select, driven by the bus wrapper
    let cs = Output::new(peripherals.GPIO23, Level::High, OutputConfig::default());

    // 3. Wrap the SPI bus as a SPI device (required by embedded-hal traits)
    let spi_device =
        ExclusiveDevice::new_no_delay(spi_bus, cs).expect("Failed to create SPI device");

    // 4. Data/Command and reset lines
    let dc = Output::new(peripherals.GPIO22, Level::Low, OutputConfig::default());
    let rst = Output::new(peripherals.GPIO21, Level::High, OutputConfig::default());

    // 5. Buffer for SPI batching (larger = faster, uses more RAM)
    let spi_buffer = SPI_BUFFER.init([0u8; 512]);

    // 6. Create display interface
    let di = SpiInterface::new(spi_device, dc, spi_buffer);

    // 7. Build and initialize the display driver, landscape
    let panel = MipidsiBuilder::new(ST7735s, di)
        .reset_pin(rst)
        .display_size(DISPLAY_WIDTH, DISPLAY_HEIGHT)
        .orientation(Orientation::new().rotate(Rotation::Deg90))
        .init(&mut embassy_time::Delay)
        .expect("Failed to initialize display");
    let display: &'static SharedDisplay<PanelDisplay> =
        DISPLAY.init(SharedDisplay::new(panel));

    rprintln!("Display initialized!");

    // Indicator, buzzer and sleep control
    let red = Output::new(peripherals.GPIO5, Level::High, OutputConfig::default());
    let green = Output::new(peripherals.GPIO17, Level::High, OutputConfig::default());
    let blue = Output::new(peripherals.GPIO16, Level::High, OutputConfig::default());
    let buzzer = Output::new(peripherals.GPIO18, Level::Low, OutputConfig::default());
    let rtc = Rtc::new(peripherals.LPWR);
    let mut hal = BoardHal::new(red, green, blue, buzzer, rtc, &CLOCK);

    // Encoder and push button, all active low
    let pull_up = InputConfig::default().with_pull(Pull::Up);
    let encoder_a = Input::new(peripherals.GPIO14, pull_up);
    let encoder_b = Input::new(peripherals.GPIO12, pull_up);
    let button = Input::new(peripherals.GPIO13, pull_up);
    let controls = Controls::new(
        encoder_a,
        encoder_b,
        button,
        config.input.debounce(),
        cause == WakeCause::ButtonWake,
    );

    let dht = Dht11::new(Flex::new(peripherals.GPIO4));
    let external = Ds18b20::new(Flex::new(peripherals.GPIO33));
    let sensors = BoardSensors::new(
        peripherals.ADC1,
        peripherals.GPIO39,
        peripherals.GPIO36,
        peripherals.GPIO35,
        dht,
        external,
    );

    // SAFETY: the only preference store on the device.
    let mut prefs = unsafe { RtcPreferenceStore::take() };
    let mac = bluetooth_mac();
    let name: &'static DeviceName = NAME.init(device_name(mac));
    info!(" Device name {}", name.as_str());

    // BLE controller on the radio
    let radio = RADIO.init(esp_radio::init().expect("Failed to initialize radio"));
    let connector = BleConnector::new(radio, peripherals.BT, Default::default())
        .expect("Failed to open BLE controller");
    let controller: RadioController = ExternalController::new(connector);

    bootstrap(cause, &mut prefs, &STATE, CLOCK.now());

    spawner
        .spawn(display_task(config, name, display))
        .expect("Failed to spawn display task");
    spawner
        .spawn(sampler_task(config, sensors))
        .expect("Failed to spawn sampler task");
    spawner
        .spawn(controls_task(controls))
        .expect("Failed to spawn controls task");
    spawner
        .spawn(link_task(controller, mac, name))
        .expect("Failed to spawn link task");

    play_splash(&STATE, &mut hal, config.display.splash(), &CLOCK).await;

    control_loop(
        config,
        &STATE,
        display,
        INPUT.receiver(),
        &mut prefs,
        &mut hal,
        &CLOCK,
    )
    .await;

    esp_hal::system::software_reset()
}
