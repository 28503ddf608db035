/// Integration tests for the full charge-planning run
/// Uses mock Octopus and Growatt servers to exercise the real HTTP clients.

use chrono::{DateTime, Duration, TimeZone, Utc};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};

use cheapcharge::growatt::GrowattClient;
use cheapcharge::octopus::OctopusClient;
use cheapcharge::orchestrator::{run, RunOutcome, RunSettings};
use cheapcharge::schedule::{ChargeSettings, SlotKind};

const RATES_PATH: &str = "/v1/products/AGILE-18-02-21/electricity-tariffs/E-1R-AGILE-18-02-21-C/standard-unit-rates/";
const SERIAL: &str = "ABC1234567";

fn run_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 13, 17, 0, 0).unwrap()
}

fn rate(from: DateTime<Utc>, exc: f64, inc: f64) -> Value {
    json!({
        "value_exc_vat": exc,
        "value_inc_vat": inc,
        "valid_from": from.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        "valid_to": (from + Duration::minutes(30)).format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        "payment_method": null
    })
}

/// Every half hour of 2023-01-14 plus the tail of the 13th, newest first like the real feed.
/// The six cheapest slots on the 14th are 02:00, 03:30, 04:00, 13:00, 14:30 and 23:30.
fn agile_body() -> String {
    let cheap: [((u32, u32), f64, f64); 6] = [
        ((2, 0), 1.0, 1.05),
        ((3, 30), 2.0, 2.1),
        ((4, 0), 3.0, 3.15),
        ((13, 0), 4.0, 4.2),
        ((14, 30), 5.0, 5.25),
        ((23, 30), 26.0, 27.3),
    ];

    let mut results = Vec::new();
    for slot in (0..48).rev() {
        let (hour, minute) = (slot / 2, (slot % 2) * 30);
        let from = Utc.with_ymd_and_hms(2023, 1, 14, hour, minute, 0).unwrap();
        let (exc, inc) = cheap
            .iter()
            .find(|(hm, _, _)| *hm == (hour, minute))
            .map(|(_, e, i)| (*e, *i))
            .unwrap_or((30.0 + f64::from(slot), 31.5 + f64::from(slot)));
        results.push(rate(from, exc, inc));
    }
    // Yesterday's slots are the cheapest of all but must not be picked
    for hour in 18..24 {
        let from = Utc.with_ymd_and_hms(2023, 1, 13, hour, 0, 0).unwrap();
        results.push(rate(from, -1.0, -1.05));
    }

    json!({ "count": results.len(), "next": null, "previous": null, "results": results }).to_string()
}

fn encoded(fields: &[(&str, &str)]) -> Matcher {
    Matcher::AllOf(
        fields
            .iter()
            .map(|(k, v)| Matcher::UrlEncoded(k.to_string(), v.to_string()))
            .collect(),
    )
}

fn settings() -> RunSettings {
    RunSettings {
        cost_threshold_pence: 25.0,
        charge: ChargeSettings::default(),
    }
}

async fn mock_login(server: &mut ServerGuard, hits: usize) -> Mock {
    server
        .mock("POST", "/login")
        .match_body(encoded(&[("userName", "me@example.com"), ("password", "secret")]))
        .with_status(200)
        .with_header("set-cookie", "JSESSIONID=abc123; Path=/; HttpOnly")
        .with_header("set-cookie", "SERVERID=srv1; Path=/")
        .with_body(r#"{"result":1}"#)
        .expect(hits)
        .create_async()
        .await
}

#[tokio::test]
async fn test_full_run_programs_both_slots() {
    let mut octopus = Server::new_async().await;
    let rates = octopus
        .mock("GET", RATES_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(agile_body())
        .create_async()
        .await;

    let mut growatt = Server::new_async().await;
    let login = mock_login(&mut growatt, 1).await;
    let primary = growatt
        .mock("POST", "/tcpSet.do")
        .match_header("cookie", "JSESSIONID=abc123; SERVERID=srv1;")
        .match_body(encoded(&[
            ("action", "mixSet"),
            ("serialNum", SERIAL),
            ("type", "mix_ac_charge_time_period"),
            ("param1", "100"),
            ("param2", "100"),
            ("param3", "1"),
            ("param4", "02"),
            ("param5", "00"),
            ("param6", "02"),
            ("param7", "30"),
            ("param8", "1"),
            ("param9", "03"),
            ("param10", "30"),
            ("param14", "04"),
            ("param18", "1"),
        ]))
        .with_status(200)
        .with_body(r#"{"success":true,"msg":""}"#)
        .expect(1)
        .create_async()
        .await;
    let secondary = growatt
        .mock("POST", "/tcpSet.do")
        .match_header("cookie", "JSESSIONID=abc123; SERVERID=srv1;")
        .match_body(encoded(&[
            ("type", "mix_ac_charge_time_multi_1"),
            ("param1", "13"),
            ("param2", "00"),
            ("param3", "13"),
            ("param4", "30"),
            ("param5", "1"),
            ("param6", "14"),
            ("param11", "23"),
            ("param12", "30"),
            ("param13", "00"),
            ("param14", "00"),
            ("param15", "0"),
        ]))
        .with_status(200)
        .with_body(r#"{"success":true,"msg":""}"#)
        .expect(1)
        .create_async()
        .await;

    let feed = OctopusClient::new(format!("{}{}", octopus.url(), RATES_PATH));
    let device = GrowattClient::new(growatt.url(), "me@example.com", "secret", SERIAL);

    let outcome = run(run_instant(), &feed, &device, &settings())
        .await
        .expect("run should succeed");

    let RunOutcome::Scheduled(plan) = outcome else {
        panic!("expected both slots to be written");
    };
    assert_eq!(plan.selection.len(), 6);
    assert!(!plan.daylight_saving);
    assert_eq!(plan.primary.slot, SlotKind::Primary);
    assert_eq!(plan.primary.params.len(), 3 + 3 * 5);
    assert_eq!(plan.secondary.params.len(), 3 * 5);
    assert_eq!(plan.enabled_windows(), 5);

    rates.assert_async().await;
    login.assert_async().await;
    primary.assert_async().await;
    secondary.assert_async().await;
}

#[tokio::test]
async fn test_no_tariffs_for_tomorrow_never_logs_in() {
    let mut octopus = Server::new_async().await;
    let _rates = octopus
        .mock("GET", RATES_PATH)
        .with_status(200)
        .with_body(json!({ "results": [rate(run_instant(), 1.0, 1.05)] }).to_string())
        .create_async()
        .await;

    let mut growatt = Server::new_async().await;
    let login = mock_login(&mut growatt, 0).await;

    let feed = OctopusClient::new(format!("{}{}", octopus.url(), RATES_PATH));
    let device = GrowattClient::new(growatt.url(), "me@example.com", "secret", SERIAL);

    let outcome = run(run_instant(), &feed, &device, &settings()).await.unwrap();

    assert_eq!(outcome, RunOutcome::NoTariffs);
    login.assert_async().await;
}

#[tokio::test]
async fn test_malformed_feed_aborts_before_login() {
    let mut octopus = Server::new_async().await;
    let _rates = octopus
        .mock("GET", RATES_PATH)
        .with_status(200)
        .with_body(r#"{"results": [{"valid_from": 12}]}"#)
        .create_async()
        .await;

    let mut growatt = Server::new_async().await;
    let login = mock_login(&mut growatt, 0).await;

    let feed = OctopusClient::new(format!("{}{}", octopus.url(), RATES_PATH));
    let device = GrowattClient::new(growatt.url(), "me@example.com", "secret", SERIAL);

    let err = run(run_instant(), &feed, &device, &settings()).await.unwrap_err();

    assert!(format!("{:#}", err).contains("could not be decoded"), "error: {:#}", err);
    login.assert_async().await;
}

#[tokio::test]
async fn test_rejected_primary_skips_secondary() {
    let mut octopus = Server::new_async().await;
    let _rates = octopus
        .mock("GET", RATES_PATH)
        .with_status(200)
        .with_body(agile_body())
        .create_async()
        .await;

    let mut growatt = Server::new_async().await;
    let _login = mock_login(&mut growatt, 1).await;
    let _primary = growatt
        .mock("POST", "/tcpSet.do")
        .match_body(Matcher::UrlEncoded("type".into(), "mix_ac_charge_time_period".into()))
        .with_status(200)
        .with_body(r#"{"success":false,"msg":"inverter offline"}"#)
        .create_async()
        .await;
    let secondary = growatt
        .mock("POST", "/tcpSet.do")
        .match_body(Matcher::UrlEncoded("type".into(), "mix_ac_charge_time_multi_1".into()))
        .with_status(200)
        .expect(0)
        .create_async()
        .await;

    let feed = OctopusClient::new(format!("{}{}", octopus.url(), RATES_PATH));
    let device = GrowattClient::new(growatt.url(), "me@example.com", "secret", SERIAL);

    let err = run(run_instant(), &feed, &device, &settings()).await.unwrap_err();

    assert!(format!("{:#}", err).contains("inverter offline"), "error: {:#}", err);
    secondary.assert_async().await;
}

#[tokio::test]
async fn test_summer_run_shifts_hours() {
    let now = Utc.with_ymd_and_hms(2023, 7, 1, 17, 0, 0).unwrap();
    let from = Utc.with_ymd_and_hms(2023, 7, 2, 23, 0, 0).unwrap();

    let mut octopus = Server::new_async().await;
    let _rates = octopus
        .mock("GET", RATES_PATH)
        .with_status(200)
        .with_body(json!({ "results": [rate(from, 4.0, 4.2)] }).to_string())
        .create_async()
        .await;

    let mut growatt = Server::new_async().await;
    let _login = mock_login(&mut growatt, 1).await;
    let primary = growatt
        .mock("POST", "/tcpSet.do")
        .match_body(encoded(&[
            ("type", "mix_ac_charge_time_period"),
            ("param4", "24"),
            ("param5", "00"),
            ("param6", "24"),
            ("param7", "30"),
        ]))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let _secondary = growatt
        .mock("POST", "/tcpSet.do")
        .match_body(Matcher::UrlEncoded("type".into(), "mix_ac_charge_time_multi_1".into()))
        .with_status(200)
        .create_async()
        .await;

    let feed = OctopusClient::new(format!("{}{}", octopus.url(), RATES_PATH));
    let device = GrowattClient::new(growatt.url(), "me@example.com", "secret", SERIAL);

    let outcome = run(now, &feed, &device, &settings()).await.unwrap();

    assert!(matches!(outcome, RunOutcome::Scheduled(ref plan) if plan.daylight_saving));
    primary.assert_async().await;
}
