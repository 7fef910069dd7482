// src/channels.rs
// Channels polled on every run, in polling order.

pub const DEFAULT_CHANNELS: &[&str] = &[
    "UCcQ18ScARDXR0hf-OMQofsw",
    "UCSYuOoOUKFA3eZ0L8sRXSTQ",
    "UCJadYQZAbzhNweKK621hVQg",
    "UCYXrKtLb_uC8vlvalVgef3Q",
    "UCgDBOyrroHE07kPmeA-Ukyw",
    "UCSn-PqF7wU5gXJRpck4ZQIA",
    "UCiLjzcRKUqk0IMxhzyyYFyQ",
    "UCpCLsVt-9LhvDKvEzE7Kw7A",
    "UCtH7B4OprU9bUYA0xknelng",
    "UCCfKlFlKYBxZ-UU2dWc17IQ",
    "UCuj-Tt5acrmGbujvRxVv9Fg",
    "UC77xNOzWNYsS8dP2HSkjEEw",
    "UCQR0MYr5hvRlWIkrRNZ_mLg",
    "UCYwi1YamkmM9zsm_k27iC_Q",
    "UCtjYtFpwvLoy9gt1GDK2klg",
    "UCEr55381WIqO1w_IzgcI5DQ",
    "UCV4uuw1QDPhoiyweotfA5rw",
    "UC82rNcKjcMnllk_P2cxheJw",
    "UCb9A6uotqUiuVCvVp4GMqOg",
    "UCwmGHKwW6AE_NBQ3CNcO9-A",
    "UCD5Bq1i3pZPKIw4bJ856yZg",
    "UC24QmKMD73AwOYyCciq3pjA",
    "UCdgHLEnxO50MI4yB6MYSlbQ",
    "UCfsmz7-5_Gw2UlPmCn1LMjQ",
    "UCgrdZm9Nx3rCj8WenIoSIqw",
    "UCW33L17SyCw3-W4uFBLMjgQ",
    "UCq5hJ7CjhJLRWlcykcZqq1A",
    "UCBGbTTcgn8AVEsEWdT3tI3Q",
    "UCQBzn-XGeA4sq9kB8Gl8iHg",
    "UCBdDCfMX_NaRYLejRJHZZ1A",
    "UCFrpmAojFL9HlgBPU5p6Nog",
    "UCMh3v4KOrtoDKziO9d2qAHg",
    "UCdX5KXiCTPYWYZscfphgQ4g",
    "UCc0ulU8V23Fp-s9MGdo4pfg",
    "UC4sQeLmtseXrdWUNI8LHINg",
    "UC_apha4piyJCHSuYZbSi8uA",
    "UCH8x9zAJbpfipmHosNuwu_A",
    "UCUvYDuZ2dwhYib7k7WneIRA",
    "UC2HJGHpNnoWvLBey9xNrEPg",
    "UCRS2sBiQZjLO6NJaYwHKeYg",
];

pub fn default_channels() -> Vec<String> {
    DEFAULT_CHANNELS.iter().map(|c| c.to_string()).collect()
}
