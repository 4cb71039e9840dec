//! End-to-end template rendering tests
//!
//! These tests drive the public simulator API the way a payload form does:
//! one `RenderState` per form, rendered repeatedly.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};

use mqtt_payload_simulator::simulator::{render, Clock, RenderState, TemplateEngine};

struct FixedClock(DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

fn engine_at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> TemplateEngine {
    let now = Local.with_ymd_and_hms(y, m, d, h, min, s).unwrap();
    TemplateEngine::with_clock(Arc::new(FixedClock(now)))
}

#[test]
fn test_sensor_payload_sequence() {
    let engine = engine_at(2024, 3, 9, 14, 5, 7);
    let mut state = RenderState::new();
    let template = r#"{"id": [自增ID sensor 1 1], "at": "[日期格式 YYYY-MM-DD HH:mm:ss]", "energy": [累计值 0 1-1]}"#;

    let outputs: Vec<serde_json::Value> = (0..3)
        .map(|_| serde_json::from_str(&engine.render(template, &mut state)).unwrap())
        .collect();

    for (i, payload) in outputs.iter().enumerate() {
        assert_eq!(payload["id"], (i + 1) as i64);
        assert_eq!(payload["at"], "2024-03-09 14:05:07");
        assert_eq!(payload["energy"].as_f64().unwrap(), (i + 1) as f64);
    }
}

#[test]
fn test_random_values_stay_in_range() {
    let mut state = RenderState::new();
    for _ in 0..200 {
        let out = render("[随机数 -5-5]|[随机浮点数 0.5-1.5 3]", &mut state);
        let (int, float) = out.split_once('|').unwrap();

        let int: i64 = int.parse().unwrap();
        assert!((-5..=5).contains(&int), "integer out of range: {int}");

        let (_, decimals) = float.split_once('.').unwrap();
        assert_eq!(decimals.len(), 3);
        let float: f64 = float.parse().unwrap();
        assert!((0.5..=1.5).contains(&float), "float out of range: {float}");
    }
    assert!(state.is_empty());
}

#[test]
fn test_timestamp_matches_clock() {
    let engine = engine_at(2024, 1, 1, 0, 0, 0);
    let expected = Local
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .unwrap()
        .timestamp();
    let mut state = RenderState::new();

    let out = engine.render("[当前时间戳-秒] [当前时间戳-毫秒]", &mut state);
    assert_eq!(out, format!("{} {}", expected, expected * 1000));
}

#[test]
fn test_counters_are_keyed_independently() {
    let mut state = RenderState::new();
    let template = "[自增ID a 1 1]-[自增ID b 100 10]";

    assert_eq!(render(template, &mut state), "1-100");
    assert_eq!(render(template, &mut state), "2-110");
    assert_eq!(state.counter("a").unwrap().value, 2);
    assert_eq!(state.counter("b").unwrap().value, 110);
}

#[test]
fn test_changed_counter_parameters_restart_sequence() {
    let mut state = RenderState::new();
    render("[自增ID k 1 1]", &mut state);
    render("[自增ID k 1 1]", &mut state);

    assert_eq!(render("[自增ID k 50 1]", &mut state), "50");
    assert_eq!(render("[自增ID k 50 1]", &mut state), "51");
}

#[test]
fn test_separate_states_do_not_share_counters() {
    let mut form_a = RenderState::new();
    let mut form_b = RenderState::new();

    render("[自增ID n 1 1]", &mut form_a);
    render("[自增ID n 1 1]", &mut form_a);

    assert_eq!(render("[自增ID n 1 1]", &mut form_b), "1");
    assert_eq!(render("[自增ID n 1 1]", &mut form_a), "3");
}

#[test]
fn test_state_survives_serialization() {
    let mut state = RenderState::new();
    render("[自增ID n 7 2] [累计值 10 1-1]", &mut state);

    let json = serde_json::to_string(&state).unwrap();
    let mut restored: RenderState = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, state);

    assert_eq!(
        render("[自增ID n 7 2] [累计值 10 1-1]", &mut restored),
        "9 12.00"
    );
}

#[test]
fn test_malformed_expressions_left_verbatim() {
    let mut state = RenderState::new();
    let template = "[随机数 10] [随机浮点数 a-b] [日期格式] [自增ID] [累计值 1] [hello]";
    assert_eq!(render(template, &mut state), template);
    assert!(state.is_empty());
}
