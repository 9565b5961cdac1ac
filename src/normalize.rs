//! 원시 레코드를 정규화된 Bar 시리즈로 변환합니다.
//!
//! 입력은 JSON 객체 배열이며, 키 이름은 대소문자를 구분하지 않고 별칭으로 매칭됩니다.
//! 잘못된 레코드는 0으로 채우지 않고 버립니다.

use crate::model::Bar;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, trace};
use serde_json::{Map, Value};

/// 이 값보다 큰 숫자 타임스탬프는 밀리초로 간주
const MILLIS_THRESHOLD: f64 = 1e12;

const TIME_KEYS: [&str; 3] = ["time", "timestamp", "date"];
const OHLC_KEYS: [&str; 4] = ["open", "high", "low", "close"];
const VALUE_KEYS: [&str; 5] = ["close", "value", "index", "yield", "price"];
const VOLUME_KEY: &str = "volume";

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// 원시 레코드 배열을 시간 오름차순의 Bar 시리즈로 정규화
///
/// - 같은 시각의 레코드가 여러 개면 배열에서 나중에 나온 레코드가 남습니다.
/// - 빈 입력이나 전부 잘못된 입력이면 빈 벡터를 반환합니다.
///
/// # Arguments
/// * `raw` - JSON 레코드 배열
///
/// # Returns
/// * `Vec<Bar>` - 정규화된 Bar 시리즈
pub fn normalize_bars(raw: &[Value]) -> Vec<Bar> {
    let mut bars: Vec<Bar> = raw.iter().filter_map(normalize_record).collect();
    let dropped = raw.len() - bars.len();

    // 안정 정렬이므로 같은 시각끼리는 원래 배열 순서가 유지됨
    bars.sort_by_key(|bar| bar.time);

    let mut normalized: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match normalized.last_mut() {
            Some(last) if last.time == bar.time => *last = bar,
            _ => normalized.push(bar),
        }
    }

    debug!(
        "Bar 정규화 완료: 입력 {}, 제거 {}, 중복 병합 후 {}",
        raw.len(),
        dropped,
        normalized.len()
    );
    normalized
}

/// JSON 배열 값(`Value::Array`)을 정규화합니다. 배열이 아니면 빈 시리즈입니다.
pub fn normalize_value(raw: &Value) -> Vec<Bar> {
    match raw {
        Value::Array(items) => normalize_bars(items),
        _ => {
            debug!("정규화 입력이 배열이 아님");
            Vec::new()
        }
    }
}

fn normalize_record(record: &Value) -> Option<Bar> {
    let Some(fields) = record.as_object() else {
        trace!("객체가 아닌 레코드 제거: {}", record);
        return None;
    };

    let Some(time) = TIME_KEYS
        .iter()
        .find_map(|alias| field(fields, alias).and_then(coerce_time))
    else {
        trace!("타임스탬프가 없거나 잘못된 레코드 제거: {}", record);
        return None;
    };

    let ohlc: Vec<f64> = OHLC_KEYS
        .iter()
        .filter_map(|key| field(fields, key).and_then(coerce_number))
        .collect();
    let has_candle_keys = OHLC_KEYS[..3].iter().any(|key| field(fields, key).is_some());

    let mut bar = if let [open, high, low, close] = ohlc[..] {
        Bar::new(time, open, high, low, close)
    } else if has_candle_keys {
        // 일부만 있는 OHLC를 종가 하나로 평탄화하지 않음
        trace!("OHLC가 불완전한 레코드 제거: {}", record);
        return None;
    } else if let Some(value) = VALUE_KEYS
        .iter()
        .find_map(|alias| field(fields, alias).and_then(coerce_number))
    {
        Bar::synthetic(time, value)
    } else {
        trace!("가격 필드가 없는 레코드 제거: {}", record);
        return None;
    };

    if let Some(volume) = field(fields, VOLUME_KEY).and_then(coerce_number) {
        bar = bar.with_volume(volume);
    }

    Some(bar)
}

/// 대소문자 무시 키 조회
fn field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, value)| value)
}

fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn coerce_time(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => numeric_time(n.as_f64()?),
        Value::String(s) => {
            let s = s.trim();
            parse_calendar_date(s).or_else(|| s.parse::<f64>().ok().and_then(numeric_time))
        }
        _ => None,
    }
}

fn numeric_time(value: f64) -> Option<i64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    if value > MILLIS_THRESHOLD {
        Some((value / 1000.0).floor() as i64)
    } else {
        Some(value.floor() as i64)
    }
}

/// 달력 날짜 문자열을 유닉스 초로 변환 (시간대 없는 값은 UTC로 간주)
fn parse_calendar_date(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc().timestamp());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date_to_unix(date);
        }
    }

    // YYYYMMDD
    if s.len() == 8 && s.chars().all(|c| c.is_ascii_digit()) {
        let year = s[0..4].parse().ok()?;
        let month = s[4..6].parse().ok()?;
        let day = s[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day).and_then(date_to_unix);
    }

    // YYYY-MM (월간 거시지표)
    if s.len() == 7 {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d") {
            return date_to_unix(date);
        }
    }

    None
}

fn date_to_unix(date: NaiveDate) -> Option<i64> {
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp())
}
