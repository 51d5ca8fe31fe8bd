//! Display strings for every supported language.
//!
//! Screens never hold literal text; they ask for a [`TextKey`] in the
//! language currently stored in the shared state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Language {
    #[default]
    Spanish = 0,
    Catalan = 1,
    English = 2,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Spanish, Language::Catalan, Language::English];

    pub fn from_u8(raw: u8) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TextKey {
    TitleTemperature,
    TitleHumidity,
    TitleLight,
    TitleSound,
    TitleSoil,
    TitleThermometer,
    TitleSystem,
    TitleTimer,

    SoundSilent,
    SoundQuiet,
    SoundNormal,
    SoundLoud,
    SoundVeryLoud,

    LightDark,
    LightDim,
    LightIndoor,
    LightBright,
    LightSunlight,

    SoilDry,
    SoilOptimal,
    SoilMoist,
    SoilSaturated,

    HumidityMoldRisk,
    HumidityTooDry,

    LinkDisconnected,
    LinkConnected,

    SoundFooterOn,
    SoundFooterOff,

    PushForFahrenheit,
    PushForCelsius,

    NoSensor,

    TimerReady,
    TimerRunning,
    TimerPaused,

    PushToStart,
    PushToPause,
    HoldToReset,

    SleepImminent,
    FactoryReset,
}

impl TextKey {
    const COUNT: usize = TextKey::FactoryReset as usize + 1;
}

//                         ES                        CAT                      EN
const STRINGS: [[&str; 3]; TextKey::COUNT] = [
    ["Temperatura",         "Temperatura",          "Temperature"],
    ["Humedad",             "Humitat",              "Humidity"],
    ["Luz",                 "Llum",                 "Light"],
    ["Sonido",              "Soroll",               "Sound"],
    ["Suelo",               "Sòl",                  "Soil"],
    ["Termómetro",          "Termòmetre",           "Thermometer"],
    ["Info Sistema",        "Info Sistema",         "System Info"],
    ["Temporizador",        "Temporitzador",        "Timer"],

    ["SILENCIO",            "SILENCI",              "SILENT"],
    ["TRANQUILO",           "TRANQUIL",             "QUIET"],
    ["NORMAL",              "NORMAL",               "NORMAL"],
    ["RUIDOSO",             "FORT",                 "LOUD"],
    ["MUY RUIDOSO",         "MOLT FORT",            "VERY LOUD"],

    ["OSCURO",              "FOSC",                 "DARK"],
    ["TENUE",               "PENOMBRA",             "DIM"],
    ["INTERIOR",            "INTERIOR",             "INDOOR"],
    ["BRILLANTE",           "BRILLANT",             "BRIGHT"],
    ["LUZ SOLAR",           "LLUM SOLAR",           "SUNLIGHT"],

    ["SECO",                "SEC",                  "DRY"],
    ["ÓPTIMO",              "ÒPTIM",                "OPTIMAL"],
    ["HÚMEDO",              "HUMIT",                "MOIST"],
    ["SATURADO",            "SATURAT",              "SATURATED"],

    ["Riesgo Moho",         "Risc Floridura",       "Mold Risk"],
    ["Muy Seco",            "Massa Sec",            "Too Dry"],

    ["DESCONECTADO",        "DESCONNECTAT",         "DISCONNECTED"],
    ["CONECTADO",           "CONNECTAT",            "CONNECTED"],

    ["Sonido: ON (Pulsa)",  "Soroll: ON (Prem)",    "Sound: ON (Push)"],
    ["Sonido: OFF (Pulsa)", "Soroll: OFF (Prem)",   "Sound: OFF (Push)"],

    ["Pulsa > F",           "Prem > F",             "Push > F"],
    ["Pulsa > C",           "Prem > C",             "Push > C"],

    ["Sin sensor",          "Sense sensor",         "No sensor"],

    ["LISTO",               "LLEST",                "READY"],
    ["CORRIENDO",           "EN CURS",              "RUNNING"],
    ["PAUSADO",             "PAUSAT",               "PAUSED"],

    ["Pulsa-Iniciar",       "Prem-Iniciar",         "Push-Start"],
    ["Pulsa-Pausar",        "Prem-Pausar",          "Push-Pause"],
    ["Mant>Rst|Pulsa>Ini",  "Mant>Rst|Prem>Ini",    "Hold-Rst|Push-Run"],

    ["A dormir...",         "A dormir...",          "Going to sleep..."],
    ["Restableciendo...",   "Restablint...",        "Factory reset..."],
];

pub fn text(language: Language, key: TextKey) -> &'static str {
    STRINGS[key as usize][language as usize]
}
