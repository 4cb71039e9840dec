//! One resolver per expression family.
//!
//! Each resolver returns `Ok(None)` when the expression is not its own (or its
//! arguments are malformed), `Ok(Some(text))` with the replacement, or an
//! error for failures that must abort the whole render.

use chrono::{DateTime, Local};
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use thiserror::Error;

use super::date_format::format_datetime;
use super::state::{accumulator_key, CallCache, CounterState, RenderState};

pub const TIMESTAMP_SECONDS: &str = "当前时间戳-秒";
pub const TIMESTAMP_MILLIS: &str = "当前时间戳-毫秒";
pub const RANDOM_INTEGER: &str = "随机数";
pub const RANDOM_FLOAT: &str = "随机浮点数";
pub const DATE_FORMAT: &str = "日期格式";
pub const AUTO_INCREMENT: &str = "自增ID";
pub const ACCUMULATOR: &str = "累计值";

/// Decimal digits used when a random float omits its precision
pub const DEFAULT_FLOAT_PRECISION: usize = 2;

/// Largest precision a random float expression may ask for
pub const MAX_FLOAT_PRECISION: usize = 100;

const ACCUMULATOR_PRECISION: usize = 2;
const DEFAULT_COUNTER_START: i64 = 1;
const DEFAULT_COUNTER_STEP: i64 = 1;

lazy_static! {
    // Each side may carry its own leading minus sign
    static ref INTEGER_RANGE: Regex = Regex::new(r"^(-?[0-9]+)-(-?[0-9]+)$").unwrap();
    static ref FLOAT_RANGE: Regex =
        Regex::new(r"^(-?[0-9]*\.?[0-9]+)-(-?[0-9]*\.?[0-9]+)$").unwrap();
    static ref LEADING_INTEGER: Regex = Regex::new(r"^[+-]?[0-9]+").unwrap();
}

/// Failures that abort a render call.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("auto-increment counter '{key}' overflowed")]
    CounterOverflow { key: String },

    #[error("accumulated value '{key}' is no longer finite")]
    NonFiniteAccumulator { key: String },
}

/// Everything a resolver may read or mutate during one render call.
pub(crate) struct ResolveContext<'a, R: Rng + ?Sized> {
    pub now: DateTime<Local>,
    pub state: &'a mut RenderState,
    pub cache: &'a mut CallCache,
    pub rng: &'a mut R,
}

/// Expression families, in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionKind {
    Timestamp,
    RandomInteger,
    RandomFloat,
    DateFormat,
    AutoIncrement,
    Accumulator,
}

impl ExpressionKind {
    /// Resolvers are tried in this order; the first to accept wins.
    pub const DISPATCH_ORDER: [ExpressionKind; 6] = [
        ExpressionKind::Timestamp,
        ExpressionKind::RandomInteger,
        ExpressionKind::RandomFloat,
        ExpressionKind::DateFormat,
        ExpressionKind::AutoIncrement,
        ExpressionKind::Accumulator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpressionKind::Timestamp => "timestamp",
            ExpressionKind::RandomInteger => "random_integer",
            ExpressionKind::RandomFloat => "random_float",
            ExpressionKind::DateFormat => "date_format",
            ExpressionKind::AutoIncrement => "auto_increment",
            ExpressionKind::Accumulator => "accumulator",
        }
    }

    pub(crate) fn resolve<R: Rng + ?Sized>(
        self,
        expression: &str,
        ctx: &mut ResolveContext<'_, R>,
    ) -> Result<Option<String>, ResolveError> {
        match self {
            ExpressionKind::Timestamp => Ok(resolve_timestamp(expression, &ctx.now)),
            ExpressionKind::RandomInteger => {
                Ok(resolve_random_integer(expression, &mut *ctx.rng))
            }
            ExpressionKind::RandomFloat => Ok(resolve_random_float(expression, &mut *ctx.rng)),
            ExpressionKind::DateFormat => Ok(resolve_date_format(expression, &ctx.now)),
            ExpressionKind::AutoIncrement => {
                resolve_auto_increment(expression, &mut *ctx.state, &mut *ctx.cache)
            }
            ExpressionKind::Accumulator => {
                resolve_accumulator(expression, &mut *ctx.state, &mut *ctx.rng)
            }
        }
    }
}

/// Run `expression` through every resolver in priority order.
pub(crate) fn resolve_expression<R: Rng + ?Sized>(
    expression: &str,
    ctx: &mut ResolveContext<'_, R>,
) -> Result<Option<(ExpressionKind, String)>, ResolveError> {
    for kind in ExpressionKind::DISPATCH_ORDER {
        if let Some(replacement) = kind.resolve(expression, ctx)? {
            return Ok(Some((kind, replacement)));
        }
    }
    Ok(None)
}

/// `[当前时间戳-秒]` / `[当前时间戳-毫秒]`
pub fn resolve_timestamp(expression: &str, now: &DateTime<Local>) -> Option<String> {
    match expression {
        TIMESTAMP_SECONDS => Some(now.timestamp().to_string()),
        TIMESTAMP_MILLIS => Some(now.timestamp_millis().to_string()),
        _ => None,
    }
}

/// `[随机数 a-b]`, inclusive on both ends, in either order.
pub fn resolve_random_integer<R: Rng + ?Sized>(expression: &str, rng: &mut R) -> Option<String> {
    let params = strip_keyword(expression, RANDOM_INTEGER)?;
    let (min, max) = parse_integer_range(params)?;
    Some(rng.random_range(min..=max).to_string())
}

/// `[随机浮点数 a-b precision]`
pub fn resolve_random_float<R: Rng + ?Sized>(expression: &str, rng: &mut R) -> Option<String> {
    let params = strip_keyword(expression, RANDOM_FLOAT)?;
    let mut parts = params.split_whitespace();
    let range = parts.next()?;
    let precision = match parts.next() {
        Some(raw) => match raw.parse::<usize>() {
            Ok(p) if p <= MAX_FLOAT_PRECISION => p,
            _ => {
                tracing::debug!(precision = raw, "Rejecting random float precision");
                return None;
            }
        },
        None => DEFAULT_FLOAT_PRECISION,
    };

    let (min, max) = parse_float_range(range)?;
    let value = uniform_between(rng, min, max);
    Some(format!("{:.*}", precision, value))
}

/// `[日期格式 format]`, formatted in local time.
pub fn resolve_date_format(expression: &str, now: &DateTime<Local>) -> Option<String> {
    let format = strip_keyword(expression, DATE_FORMAT)?;
    Some(format_datetime(&now.naive_local(), format))
}

/// `[自增ID key start step]`
///
/// A new sequence (or a changed start) hands out `start`. Otherwise the stored
/// step is added to the stored value, and this expression's step is recorded
/// for the next advance. Repeats of the same `(key, start, step)` inside one
/// render call reuse the first value.
pub(crate) fn resolve_auto_increment(
    expression: &str,
    state: &mut RenderState,
    cache: &mut CallCache,
) -> Result<Option<String>, ResolveError> {
    let Some(params) = strip_keyword(expression, AUTO_INCREMENT) else {
        return Ok(None);
    };
    let mut parts = params.split_whitespace();
    let Some(key) = parts.next() else {
        return Ok(None);
    };
    let start = parse_counter_arg(parts.next(), DEFAULT_COUNTER_START);
    let step = parse_counter_arg(parts.next(), DEFAULT_COUNTER_STEP);

    if let Some(value) = cache.auto_increment(key, start, step) {
        return Ok(Some(value.to_string()));
    }

    let value = match state.counters.get(key) {
        Some(counter) if counter.initial_start == start => counter
            .value
            .checked_add(counter.step)
            .ok_or_else(|| ResolveError::CounterOverflow {
                key: key.to_string(),
            })?,
        _ => start,
    };

    state.counters.insert(
        key.to_string(),
        CounterState {
            value,
            step,
            initial_start: start,
        },
    );
    cache.remember_auto_increment(key, start, step, value);

    Ok(Some(value.to_string()))
}

/// `[累计值 start min-max]`
///
/// Every occurrence adds a fresh random step, including repeats in the same
/// render call.
pub(crate) fn resolve_accumulator<R: Rng + ?Sized>(
    expression: &str,
    state: &mut RenderState,
    rng: &mut R,
) -> Result<Option<String>, ResolveError> {
    let Some(params) = strip_keyword(expression, ACCUMULATOR) else {
        return Ok(None);
    };
    let parts: Vec<&str> = params.split_whitespace().collect();
    let [start, range] = parts.as_slice() else {
        return Ok(None);
    };
    let Some(start) = parse_finite(start) else {
        return Ok(None);
    };
    let Some((min_step, max_step)) = parse_float_range(range) else {
        return Ok(None);
    };

    let key = accumulator_key(start, min_step, max_step);
    let step = uniform_between(rng, min_step, max_step);
    let total = state.accumulators.entry(key.clone()).or_insert(start);
    *total += step;

    if !total.is_finite() {
        return Err(ResolveError::NonFiniteAccumulator { key });
    }

    Ok(Some(format!("{:.*}", ACCUMULATOR_PRECISION, total)))
}

/// Strip `keyword` plus the whitespace after it, returning the trimmed rest.
fn strip_keyword<'a>(expression: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = expression.strip_prefix(keyword)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}

/// Leading integer of `raw` (`"100.5"` reads as 100). Missing, unparsable
/// and zero values all fall back to `default`.
fn parse_counter_arg(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|s| LEADING_INTEGER.find(s))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .filter(|&v| v != 0)
        .unwrap_or(default)
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_integer_range(text: &str) -> Option<(i64, i64)> {
    let caps = INTEGER_RANGE.captures(text)?;
    let a = caps[1].parse::<i64>().ok()?;
    let b = caps[2].parse::<i64>().ok()?;
    Some((a.min(b), a.max(b)))
}

fn parse_float_range(text: &str) -> Option<(f64, f64)> {
    let caps = FLOAT_RANGE.captures(text)?;
    let a = parse_finite(&caps[1])?;
    let b = parse_finite(&caps[2])?;
    let (min, max) = (a.min(b), a.max(b));
    (max - min).is_finite().then_some((min, max))
}

fn uniform_between<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    min + rng.random::<f64>() * (max - min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_timestamp_seconds_and_millis() {
        let now = Local.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            resolve_timestamp(TIMESTAMP_SECONDS, &now).as_deref(),
            Some("1700000000")
        );
        assert_eq!(
            resolve_timestamp(TIMESTAMP_MILLIS, &now).as_deref(),
            Some("1700000000123")
        );
        assert_eq!(resolve_timestamp("当前时间戳", &now), None);
        assert_eq!(resolve_timestamp("当前时间戳-秒 ", &now), None);
    }

    #[test]
    fn test_random_integer_stays_in_range_both_orders() {
        let mut rng = rng();
        for (a, b) in [(1, 6), (6, 1), (-10, 20), (20, -10), (-5, -1), (-1, -5), (3, 3)] {
            for expr in [
                format!("随机数 {}-{}", a, b),
                format!("随机数 {}-{}", b, a),
            ] {
                for _ in 0..200 {
                    let value: i64 = resolve_random_integer(&expr, &mut rng)
                        .unwrap()
                        .parse()
                        .unwrap();
                    assert!(value >= a.min(b) && value <= a.max(b), "{expr} -> {value}");
                }
            }
        }
    }

    #[test]
    fn test_random_integer_hits_both_bounds() {
        let mut rng = rng();
        let seen: std::collections::HashSet<String> = (0..500)
            .filter_map(|_| resolve_random_integer("随机数 0-1", &mut rng))
            .collect();
        assert!(seen.contains("0"));
        assert!(seen.contains("1"));
    }

    #[test]
    fn test_random_integer_rejects_malformed() {
        let mut rng = rng();
        for expr in [
            "随机数",
            "随机数 ",
            "随机数 5",
            "随机数 1.5-3",
            "随机数 a-b",
            "随机数 1--",
            "随机数 1-2-3",
            "随机数1-2",
            "随机数 99999999999999999999-1",
        ] {
            assert_eq!(resolve_random_integer(expr, &mut rng), None, "{expr}");
        }
    }

    #[test]
    fn test_random_float_precision_and_range() {
        let mut rng = rng();
        for (expr, min, max, precision) in [
            ("随机浮点数 0-1 3", 0.0, 1.0, 3),
            ("随机浮点数 -5.5-10.8", -5.5, 10.8, 2),
            ("随机浮点数 10-2 0", 2.0, 10.0, 0),
            ("随机浮点数 -3--1 4", -3.0, -1.0, 4),
        ] {
            for _ in 0..200 {
                let out = resolve_random_float(expr, &mut rng).unwrap();
                let decimals = out.split('.').nth(1).map_or(0, str::len);
                assert_eq!(decimals, precision, "{expr} -> {out}");
                let value: f64 = out.parse().unwrap();
                assert!(value >= min && value <= max, "{expr} -> {out}");
            }
        }
    }

    #[test]
    fn test_random_float_rejects_bad_precision() {
        let mut rng = rng();
        assert_eq!(resolve_random_float("随机浮点数 0-1 -1", &mut rng), None);
        assert_eq!(resolve_random_float("随机浮点数 0-1 x", &mut rng), None);
        assert_eq!(resolve_random_float("随机浮点数 0-1 101", &mut rng), None);
        assert!(resolve_random_float("随机浮点数 0-1 100", &mut rng).is_some());
    }

    #[test]
    fn test_random_float_rejects_bad_range() {
        let mut rng = rng();
        assert_eq!(resolve_random_float("随机浮点数 1", &mut rng), None);
        assert_eq!(resolve_random_float("随机浮点数 1.-2", &mut rng), None);
        assert_eq!(resolve_random_float("随机浮点数 inf-2", &mut rng), None);
    }

    #[test]
    fn test_integer_keyword_does_not_claim_float_expression() {
        let mut rng = rng();
        assert_eq!(resolve_random_integer("随机浮点数 0-1", &mut rng), None);
    }

    #[test]
    fn test_date_format_requires_format() {
        let now = Local.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
        assert_eq!(
            resolve_date_format("日期格式 YYYY-MM-DD", &now).as_deref(),
            Some("2024-01-05")
        );
        assert_eq!(
            resolve_date_format("日期格式   HH:mm", &now).as_deref(),
            Some("00:00")
        );
        assert_eq!(resolve_date_format("日期格式", &now), None);
        assert_eq!(resolve_date_format("日期格式 ", &now), None);
    }

    #[test]
    fn test_auto_increment_sequence() {
        let mut state = RenderState::new();

        let mut cache = CallCache::default();
        let first = resolve_auto_increment("自增ID x 10 5", &mut state, &mut cache).unwrap();
        let repeat = resolve_auto_increment("自增ID x 10 5", &mut state, &mut cache).unwrap();
        assert_eq!(first.as_deref(), Some("10"));
        assert_eq!(repeat.as_deref(), Some("10"));

        let mut cache = CallCache::default();
        let next = resolve_auto_increment("自增ID x 10 5", &mut state, &mut cache).unwrap();
        assert_eq!(next.as_deref(), Some("15"));
        assert_eq!(
            state.counter("x"),
            Some(&CounterState {
                value: 15,
                step: 5,
                initial_start: 10
            })
        );
    }

    #[test]
    fn test_auto_increment_defaults() {
        let mut state = RenderState::new();
        let mut cache = CallCache::default();
        let out = resolve_auto_increment("自增ID user", &mut state, &mut cache).unwrap();
        assert_eq!(out.as_deref(), Some("1"));

        let mut cache = CallCache::default();
        let out = resolve_auto_increment("自增ID user abc def", &mut state, &mut cache).unwrap();
        assert_eq!(out.as_deref(), Some("2"));
    }

    #[test]
    fn test_auto_increment_step_change_applies_to_next_advance() {
        let mut state = RenderState::new();
        let advance = |state: &mut RenderState, expr: &str| {
            let mut cache = CallCache::default();
            resolve_auto_increment(expr, state, &mut cache)
                .unwrap()
                .unwrap()
        };

        assert_eq!(advance(&mut state, "自增ID k 5 1"), "5");
        assert_eq!(advance(&mut state, "自增ID k 5 10"), "6");
        assert_eq!(advance(&mut state, "自增ID k 5 10"), "16");
    }

    #[test]
    fn test_auto_increment_reads_leading_integer() {
        let mut state = RenderState::new();
        let out = resolve_auto_increment("自增ID k 100.5 2x", &mut state, &mut CallCache::default())
            .unwrap();
        assert_eq!(out.as_deref(), Some("100"));

        let out = resolve_auto_increment("自增ID k 100.5 2x", &mut state, &mut CallCache::default())
            .unwrap();
        assert_eq!(out.as_deref(), Some("102"));

        let out = resolve_auto_increment("自增ID n -3 -1", &mut state, &mut CallCache::default())
            .unwrap();
        assert_eq!(out.as_deref(), Some("-3"));
    }

    #[test]
    fn test_auto_increment_zero_falls_back_to_one() {
        let mut state = RenderState::new();
        let advance = |state: &mut RenderState| {
            resolve_auto_increment("自增ID z 0 0", state, &mut CallCache::default())
                .unwrap()
                .unwrap()
        };

        assert_eq!(advance(&mut state), "1");
        assert_eq!(advance(&mut state), "2");
        assert_eq!(
            state.counter("z"),
            Some(&CounterState {
                value: 2,
                step: 1,
                initial_start: 1
            })
        );
    }

    #[test]
    fn test_auto_increment_changed_start_resets() {
        let mut state = RenderState::new();
        let mut cache = CallCache::default();
        resolve_auto_increment("自增ID x 10 5", &mut state, &mut cache).unwrap();

        let mut cache = CallCache::default();
        let out = resolve_auto_increment("自增ID x 20 1", &mut state, &mut cache).unwrap();
        assert_eq!(out.as_deref(), Some("20"));
    }

    #[test]
    fn test_auto_increment_overflow_is_an_error() {
        let mut state = RenderState::new();
        let expr = format!("自增ID big {} 1", i64::MAX);
        resolve_auto_increment(&expr, &mut state, &mut CallCache::default()).unwrap();

        let err = resolve_auto_increment(&expr, &mut state, &mut CallCache::default());
        assert!(matches!(err, Err(ResolveError::CounterOverflow { .. })));
    }

    #[test]
    fn test_auto_increment_requires_key() {
        let mut state = RenderState::new();
        let mut cache = CallCache::default();
        assert_eq!(
            resolve_auto_increment("自增ID", &mut state, &mut cache).unwrap(),
            None
        );
        assert!(state.is_empty());
    }

    #[test]
    fn test_accumulator_advances_every_time() {
        let mut state = RenderState::new();
        let mut rng = rng();
        let a = resolve_accumulator("累计值 100 1-1", &mut state, &mut rng).unwrap();
        let b = resolve_accumulator("累计值 100 1-1", &mut state, &mut rng).unwrap();
        assert_eq!(a.as_deref(), Some("101.00"));
        assert_eq!(b.as_deref(), Some("102.00"));
    }

    #[test]
    fn test_accumulator_step_order_is_normalized() {
        let mut state = RenderState::new();
        let mut rng = rng();
        resolve_accumulator("累计值 0 5-1", &mut state, &mut rng).unwrap();
        resolve_accumulator("累计值 0 1-5", &mut state, &mut rng).unwrap();
        assert_eq!(state.accumulators().len(), 1);

        let total = state.accumulators()["0_1_5"];
        assert!((2.0..=10.0).contains(&total));
    }

    #[test]
    fn test_accumulator_rejects_malformed() {
        let mut state = RenderState::new();
        let mut rng = rng();
        for expr in [
            "累计值",
            "累计值 100",
            "累计值 100 1",
            "累计值 abc 1-2",
            "累计值 100 1-2 3",
            "累计值 NaN 1-2",
        ] {
            assert_eq!(
                resolve_accumulator(expr, &mut state, &mut rng).unwrap(),
                None,
                "{expr}"
            );
        }
        assert!(state.is_empty());
    }

    #[test]
    fn test_dispatch_order_picks_first_acceptor() {
        let mut state = RenderState::new();
        let mut cache = CallCache::default();
        let mut rng = rng();
        let mut ctx = ResolveContext {
            now: Local::now(),
            state: &mut state,
            cache: &mut cache,
            rng: &mut rng,
        };

        let (kind, _) = resolve_expression("随机数 1-2", &mut ctx).unwrap().unwrap();
        assert_eq!(kind, ExpressionKind::RandomInteger);
        let (kind, _) = resolve_expression("自增ID a", &mut ctx).unwrap().unwrap();
        assert_eq!(kind, ExpressionKind::AutoIncrement);
        assert!(resolve_expression("unknown", &mut ctx).unwrap().is_none());
    }
}
