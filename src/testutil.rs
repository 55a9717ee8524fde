//! Fixtures shared by the unit tests.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::process::{RawFile, QUARTER_HOURS_PER_DAY};

pub fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,qhtranspose=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// One day of readings, `"0,00"`, `"0,25"`, ... so that the `i`-th is `i * 0.25`.
pub fn qh_values() -> Vec<String> {
    (0..QUARTER_HOURS_PER_DAY)
        .map(|i| format!("{},{:02}", i / 4, (i % 4) * 25))
        .collect()
}

/// A UTF-8 export with three banner lines followed by one data row per
/// `(date, direction)`: date, OBIS code, energy type, direction, 96 readings.
pub fn named_meter_file(name: &str, rows: &[(&str, &str)]) -> RawFile {
    let mut text = String::from(
        "Zählpunkt;DE0001234567890000000000000000001\n\
         Zeitraum;01.01.2024 - 31.12.2024\n\
         Datum;Kennzahl;Einheit;Richtung;Werte\n",
    );
    let values = qh_values().join(";");
    for (date, direction) in rows {
        text.push_str(&format!("{date};1-1:1.29.0;KWT;{direction};{values}\n"));
    }
    RawFile::new(name, text)
}

pub fn meter_file(rows: &[(&str, &str)]) -> RawFile {
    named_meter_file("meter.csv", rows)
}
