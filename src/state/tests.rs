use super::*;
use crate::config::ZoneConfig;
use crate::reading::{PollutantKind, ReadingBundle, ZoneId};
use crate::status::{FleetLevel, Level};
use crate::threshold::{SharedThresholds, ThresholdConfig, ThresholdTable};
use chrono::{Duration, TimeZone, Utc};

fn zones() -> Vec<ZoneConfig> {
    vec![
        ZoneConfig::new("Cuisine"),
        ZoneConfig::new("Cabine"),
        ZoneConfig::new("Salle des Machines"),
    ]
}

fn engine() -> MonitorEngine {
    MonitorEngine::new(&zones(), SharedThresholds::default(), 20)
}

fn zone_batch(zone: &str, co2: f64, voc: f64, temperature: f64) -> Vec<ReadingBundle> {
    vec![
        ReadingBundle::new(zone, PollutantKind::Co2, co2),
        ReadingBundle::new(zone, PollutantKind::Voc, voc),
        ReadingBundle::new(zone, PollutantKind::Temperature, temperature),
    ]
}

fn calm_batch() -> Vec<ReadingBundle> {
    let mut batch = zone_batch("Cuisine", 600.0, 80.0, 24.0);
    batch.extend(zone_batch("Cabine", 550.0, 60.0, 22.0));
    batch.extend(zone_batch("Salle des Machines", 700.0, 90.0, 30.0));
    batch
}

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
}

#[test]
fn test_initial_snapshot_is_unknown() {
    let engine = engine();
    let snapshot = engine.snapshot();

    assert_eq!(snapshot.tick, 0);
    assert_eq!(snapshot.fleet.level, FleetLevel::Unknown);
    assert_eq!(snapshot.fan_speed, 0);
    assert_eq!(snapshot.zones.len(), 3);
    assert!(snapshot.zones.iter().all(|z| z.status.is_none()));
    assert!(snapshot
        .zones
        .iter()
        .all(|z| z.freshness == Freshness::Unavailable));
}

#[test]
fn test_complete_tick_evaluates_every_zone() {
    let engine = engine();

    let mut batch = zone_batch("Cuisine", 1100.0, 100.0, 24.0);
    batch.extend(zone_batch("Cabine", 550.0, 60.0, 22.0));
    batch.extend(zone_batch("Salle des Machines", 700.0, 90.0, 36.0));

    let snapshot = engine.apply_tick(TickInput::Batch(batch), t0());

    assert_eq!(snapshot.tick, 1);
    assert_eq!(snapshot.fleet.level, FleetLevel::Critical);
    assert_eq!(snapshot.fleet.zones(Level::Critical), &[ZoneId::from("Cuisine")]);
    assert_eq!(
        snapshot.fleet.zones(Level::Vigilance),
        &[ZoneId::from("Salle des Machines")]
    );
    assert_eq!(snapshot.fleet.zones(Level::Normal), &[ZoneId::from("Cabine")]);
    assert_eq!(snapshot.headline, "Zone(s) en alerte rouge : Cuisine");

    let cuisine = snapshot.zone(&ZoneId::from("Cuisine")).unwrap();
    assert_eq!(cuisine.freshness, Freshness::Fresh);
    assert_eq!(cuisine.level(), Some(Level::Critical));
    assert!(cuisine
        .status
        .as_ref()
        .unwrap()
        .breached_pollutants
        .contains(&PollutantKind::Co2));
    assert_eq!(cuisine.readings.len(), 3);
    assert_eq!(cuisine.last_evaluated, Some(t0()));

    // 1100 / 1000 ppm is past the ramp ceiling
    assert_eq!(snapshot.fan_speed, 100);
}

#[test]
fn test_calm_fleet_keeps_fans_off() {
    let engine = engine();
    let snapshot = engine.apply_tick(TickInput::Batch(calm_batch()), t0());

    assert_eq!(snapshot.fleet.level, FleetLevel::Normal);
    assert_eq!(snapshot.headline, "Tous les seuils sont sous contrôle");
    // Engine room at 30 / 38 °C is the most stressed reading
    assert_eq!(snapshot.fan_speed, 57);
}

#[test]
fn test_source_failure_carries_previous_state() {
    let engine = engine();
    let first = engine.apply_tick(TickInput::Batch(calm_batch()), t0());

    let second = engine.apply_tick(
        TickInput::Unavailable("connection refused".to_string()),
        t0() + Duration::seconds(3),
    );

    assert_eq!(second.tick, 2);
    assert_eq!(second.fleet.level, FleetLevel::Unknown);
    assert_eq!(second.headline, "Données capteurs indisponibles");
    for zone in &second.zones {
        assert_eq!(zone.freshness, Freshness::Unavailable);
        assert_eq!(zone.level(), Some(Level::Normal));
        assert_eq!(zone.last_evaluated, Some(t0()));
    }
    assert_eq!(second.fan_speed, first.fan_speed);

    // No samples fabricated for the failed tick
    assert_eq!(
        engine
            .history_window(&ZoneId::from("Cuisine"), PollutantKind::Co2)
            .len(),
        1
    );
}

#[test]
fn test_incomplete_zone_keeps_previous_status() {
    let engine = engine();
    engine.apply_tick(TickInput::Batch(calm_batch()), t0());

    // Cuisine only reports CO2, well above danger
    let mut batch = vec![ReadingBundle::new("Cuisine", PollutantKind::Co2, 1500.0)];
    batch.extend(zone_batch("Cabine", 550.0, 60.0, 22.0));
    batch.extend(zone_batch("Salle des Machines", 700.0, 90.0, 30.0));

    let snapshot = engine.apply_tick(TickInput::Batch(batch), t0() + Duration::seconds(3));

    let cuisine = snapshot.zone(&ZoneId::from("Cuisine")).unwrap();
    assert_eq!(cuisine.freshness, Freshness::Incomplete);
    assert_eq!(cuisine.level(), Some(Level::Normal));
    assert_eq!(cuisine.last_evaluated, Some(t0()));
    assert_eq!(snapshot.fleet.level, FleetLevel::Normal);

    // The reading that did arrive is still recorded
    let window = engine.history_window(&ZoneId::from("Cuisine"), PollutantKind::Co2);
    assert_eq!(window.len(), 2);
    assert_eq!(window[1].value, 1500.0);
    assert_eq!(
        engine
            .history_window(&ZoneId::from("Cuisine"), PollutantKind::Voc)
            .len(),
        1
    );
}

#[test]
fn test_zone_missing_from_batch_is_unavailable() {
    let engine = engine();

    let mut batch = zone_batch("Cuisine", 900.0, 80.0, 24.0);
    batch.extend(zone_batch("Cabine", 550.0, 60.0, 22.0));

    let snapshot = engine.apply_tick(TickInput::Batch(batch), t0());

    let machines = snapshot.zone(&ZoneId::from("Salle des Machines")).unwrap();
    assert_eq!(machines.freshness, Freshness::Unavailable);
    assert!(machines.status.is_none());

    assert_eq!(snapshot.fleet.level, FleetLevel::Vigilance);
    assert_eq!(snapshot.headline, "Zone(s) en vigilance : Cuisine");
}

#[test]
fn test_inline_threshold_overrides_table() {
    let engine = engine();

    let mut batch = vec![
        ReadingBundle::new("Cuisine", PollutantKind::Co2, 900.0).with_threshold(850.0),
        ReadingBundle::new("Cuisine", PollutantKind::Voc, 80.0),
        ReadingBundle::new("Cuisine", PollutantKind::Temperature, 24.0),
    ];
    batch.extend(zone_batch("Cabine", 900.0, 60.0, 22.0));

    let snapshot = engine.apply_tick(TickInput::Batch(batch), t0());

    let cuisine = snapshot.zone(&ZoneId::from("Cuisine")).unwrap();
    assert_eq!(cuisine.level(), Some(Level::Critical));
    let co2 = cuisine
        .readings
        .iter()
        .find(|r| r.pollutant == PollutantKind::Co2)
        .unwrap();
    assert_eq!(co2.danger, 850.0);
    assert_eq!(co2.warning, 800.0);

    // The same value without an override is only a warning
    let cabine = snapshot.zone(&ZoneId::from("Cabine")).unwrap();
    assert_eq!(cabine.level(), Some(Level::Vigilance));
}

#[test]
fn test_unconfigured_pollutant_is_skipped_but_recorded() {
    let config: ThresholdConfig = toml::from_str(
        r#"
        [defaults]
        co2 = { warning = 800.0, danger = 1000.0 }
        temperature = { warning = 35.0, danger = 38.0 }
        "#,
    )
    .unwrap();
    let thresholds = SharedThresholds::new(ThresholdTable::from_config(&config).unwrap());
    let engine = MonitorEngine::new(&[ZoneConfig::new("Cuisine")], thresholds, 20);

    let snapshot = engine.apply_tick(
        TickInput::Batch(zone_batch("Cuisine", 600.0, 400.0, 24.0)),
        t0(),
    );

    let cuisine = snapshot.zone(&ZoneId::from("Cuisine")).unwrap();
    // VOC 400 would be critical, but it cannot be judged without limits
    assert_eq!(cuisine.level(), Some(Level::Normal));
    assert_eq!(cuisine.unconfigured, vec![PollutantKind::Voc]);
    assert_eq!(cuisine.readings.len(), 2);
    assert_eq!(
        engine
            .history_window(&ZoneId::from("Cuisine"), PollutantKind::Voc)
            .len(),
        1
    );
}

#[test]
fn test_zone_without_any_thresholds_has_no_status() {
    let engine = MonitorEngine::new(
        &[ZoneConfig::new("Cuisine"), ZoneConfig::new("Cabine")],
        SharedThresholds::new(ThresholdTable::empty()),
        20,
    );

    let mut batch = zone_batch("Cuisine", 600.0, 80.0, 24.0);
    batch.extend(zone_batch("Cabine", 550.0, 60.0, 22.0));
    let snapshot = engine.apply_tick(TickInput::Batch(batch), t0());

    assert!(snapshot.zones.iter().all(|z| z.status.is_none()));
    assert!(snapshot.zones.iter().all(|z| z.freshness == Freshness::Fresh));
    assert_eq!(snapshot.fleet.level, FleetLevel::Unknown);
    assert_eq!(snapshot.fan_speed, 0);
}

#[test]
fn test_threshold_swap_applies_on_next_tick() {
    let engine = engine();
    let before = engine.apply_tick(TickInput::Batch(calm_batch()), t0());
    assert_eq!(before.fleet.level, FleetLevel::Normal);

    let config: ThresholdConfig = toml::from_str(
        r#"
        [defaults]
        co2 = { warning = 500.0, danger = 650.0 }
        voc = { warning = 150.0, danger = 250.0 }
        temperature = { warning = 35.0, danger = 38.0 }
        "#,
    )
    .unwrap();
    engine
        .thresholds()
        .replace(ThresholdTable::from_config(&config).unwrap());

    let after = engine.apply_tick(TickInput::Batch(calm_batch()), t0() + Duration::seconds(3));
    assert_eq!(after.fleet.level, FleetLevel::Critical);
    assert_eq!(
        after.fleet.zones(Level::Critical),
        &[ZoneId::from("Salle des Machines")]
    );
    assert_eq!(
        after.fleet.zones(Level::Vigilance),
        &[ZoneId::from("Cuisine"), ZoneId::from("Cabine")]
    );
}

#[test]
fn test_invalid_bundles_are_discarded() {
    let engine = MonitorEngine::new(&[ZoneConfig::new("Cuisine")], SharedThresholds::default(), 20);

    let mut batch = zone_batch("Cuisine", 600.0, 80.0, 24.0);
    batch[1].value = f64::NAN;
    batch.push(ReadingBundle {
        zone: "Cuisine".to_string(),
        pollutant: "ozone".to_string(),
        value: 12.0,
        unit: None,
        threshold: None,
        captured_at: None,
    });

    let snapshot = engine.apply_tick(TickInput::Batch(batch), t0());

    let cuisine = snapshot.zone(&ZoneId::from("Cuisine")).unwrap();
    assert_eq!(cuisine.freshness, Freshness::Incomplete);
    assert!(engine
        .history_window(&ZoneId::from("Cuisine"), PollutantKind::Voc)
        .is_empty());
}

#[test]
fn test_unknown_zone_readings_are_ignored() {
    let engine = engine();

    let mut batch = calm_batch();
    batch.extend(zone_batch("Passerelle", 2000.0, 900.0, 50.0));

    let snapshot = engine.apply_tick(TickInput::Batch(batch), t0());

    assert_eq!(snapshot.zones.len(), 3);
    assert_eq!(snapshot.fleet.level, FleetLevel::Normal);
    assert!(engine
        .history_window(&ZoneId::from("Passerelle"), PollutantKind::Co2)
        .is_empty());
}

#[test]
fn test_duplicate_reading_last_one_wins() {
    let engine = MonitorEngine::new(&[ZoneConfig::new("Cuisine")], SharedThresholds::default(), 20);

    let mut batch = zone_batch("Cuisine", 1200.0, 80.0, 24.0);
    batch.push(ReadingBundle::new("Cuisine", PollutantKind::Co2, 600.0));

    let snapshot = engine.apply_tick(TickInput::Batch(batch), t0());

    assert_eq!(
        snapshot.zone(&ZoneId::from("Cuisine")).unwrap().level(),
        Some(Level::Normal)
    );
}

#[test]
fn test_history_window_is_bounded() {
    let engine = MonitorEngine::new(&[ZoneConfig::new("Cuisine")], SharedThresholds::default(), 20);

    for i in 0..25 {
        engine.apply_tick(
            TickInput::Batch(zone_batch("Cuisine", 500.0 + i as f64, 80.0, 24.0)),
            t0() + Duration::seconds(3 * i),
        );
    }

    let cuisine = ZoneId::from("Cuisine");
    let window = engine.history_window(&cuisine, PollutantKind::Co2);
    assert_eq!(window.len(), 20);
    assert_eq!(window[0].value, 505.0);
    assert_eq!(window[19].value, 524.0);
    assert_eq!(engine.history_capacity(), 20);

    let sample = engine.history_value_at(&cuisine, PollutantKind::Co2, 0).unwrap();
    assert_eq!(sample.timestamp, t0() + Duration::seconds(15));
    assert!(engine
        .history_value_at(&cuisine, PollutantKind::Co2, 20)
        .is_none());
}

#[test]
fn test_report_flags_danger_rows() {
    let engine = MonitorEngine::new(&[ZoneConfig::new("Cuisine")], SharedThresholds::default(), 20);

    engine.apply_tick(TickInput::Batch(zone_batch("Cuisine", 600.0, 80.0, 24.0)), t0());
    engine.apply_tick(
        TickInput::Batch(zone_batch("Cuisine", 1050.0, 80.0, 24.0)),
        t0() + Duration::seconds(3),
    );

    let report = engine.report(&ZoneId::from("Cuisine"));
    assert_eq!(report.rows.len(), 2);
    assert!(!report.rows[0].danger);
    assert!(report.rows[1].danger);
    assert_eq!(report.danger_rows, 1);
}

#[test]
fn test_report_rows_survive_incomplete_tick() {
    let engine = MonitorEngine::new(&[ZoneConfig::new("Cuisine")], SharedThresholds::default(), 20);

    engine.apply_tick(TickInput::Batch(zone_batch("Cuisine", 600.0, 100.0, 24.0)), t0());
    engine.apply_tick(
        TickInput::Batch(vec![
            ReadingBundle::new("Cuisine", PollutantKind::Co2, 610.0),
            ReadingBundle::new("Cuisine", PollutantKind::Temperature, 24.0),
        ]),
        t0() + Duration::seconds(3),
    );
    engine.apply_tick(
        TickInput::Batch(zone_batch("Cuisine", 620.0, 300.0, 24.0)),
        t0() + Duration::seconds(6),
    );

    let report = engine.report(&ZoneId::from("Cuisine"));
    assert_eq!(report.rows.len(), 3);

    let quiet = &report.rows[1];
    assert_eq!(quiet.timestamp, t0() + Duration::seconds(3));
    assert_eq!(quiet.voc, None);
    assert!(!quiet.danger);

    let spike = &report.rows[2];
    assert_eq!(spike.timestamp, t0() + Duration::seconds(6));
    assert_eq!(spike.co2, Some(620.0));
    assert_eq!(spike.voc, Some(300.0));
    assert!(spike.danger);
}

#[tokio::test]
async fn test_subscribers_receive_each_tick() {
    let engine = engine();
    let mut rx = engine.subscribe();

    engine.apply_tick(TickInput::Batch(calm_batch()), t0());
    engine.apply_tick(TickInput::Unavailable("timeout".to_string()), t0());

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!(first.tick, 1);
    assert_eq!(second.tick, 2);
    assert_ne!(first.tick_id, second.tick_id);
    assert_eq!(engine.snapshot(), second);
}

#[tokio::test]
async fn test_sampler_ticks_until_shutdown() {
    use crate::source::SyntheticSource;
    use std::sync::Arc;
    use tokio::sync::watch;

    let engine = Arc::new(engine());
    let source = Arc::new(SyntheticSource::new(&zones(), Some(1)));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut rx = engine.subscribe();

    let handle = tokio::spawn(run_sampler(
        Arc::clone(&engine),
        source,
        std::time::Duration::from_millis(10),
        shutdown_rx,
    ));

    let snapshot = rx.recv().await.unwrap();
    assert_eq!(snapshot.tick, 1);
    assert!(snapshot.zones.iter().all(|z| z.freshness == Freshness::Fresh));

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
}

struct StalledSource;

#[async_trait::async_trait]
impl crate::source::ReadingSource for StalledSource {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn fetch(&self) -> anyhow::Result<Vec<ReadingBundle>> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_sampler_shutdown_interrupts_pending_fetch() {
    use std::sync::Arc;
    use tokio::sync::watch;

    let engine = Arc::new(engine());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(run_sampler(
        Arc::clone(&engine),
        Arc::new(StalledSource),
        std::time::Duration::from_millis(10),
        shutdown_rx,
    ));

    // Let the first tick start its fetch
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    shutdown_tx.send(true).unwrap();

    tokio::time::timeout(std::time::Duration::from_secs(1), handle)
        .await
        .expect("sampler kept waiting on the source")
        .unwrap();
    assert_eq!(engine.snapshot().tick, 0);
}
