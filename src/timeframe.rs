use crate::config_loader::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// 샘플링 단위 (타임프레임)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Timeframe {
    /// n분봉
    Minute(u32),
    /// n시간봉
    Hour(u32),
    /// 일봉
    Day,
    /// 주봉
    Week,
    /// 월봉
    Month,
}

/// 기본 지표 파라미터를 고르기 위한 타임프레임 계열
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeframeFamily {
    Intraday,
    Daily,
    Weekly,
    Monthly,
}

impl Timeframe {
    pub fn family(&self) -> TimeframeFamily {
        match self {
            Timeframe::Minute(_) | Timeframe::Hour(_) => TimeframeFamily::Intraday,
            Timeframe::Day => TimeframeFamily::Daily,
            Timeframe::Week => TimeframeFamily::Weekly,
            Timeframe::Month => TimeframeFamily::Monthly,
        }
    }
}

impl Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timeframe::Minute(n) => write!(f, "{}m", n),
            Timeframe::Hour(n) => write!(f, "{}h", n),
            Timeframe::Day => write!(f, "1d"),
            Timeframe::Week => write!(f, "1w"),
            Timeframe::Month => write!(f, "1M"),
        }
    }
}

impl FromStr for Timeframe {
    type Err = ConfigError;

    /// `"15m"`, `"2h"`, `"1d"`, `"1w"`, `"1M"` 형식을 파싱합니다.
    ///
    /// 대문자 `M`은 월, 소문자 `m`은 분입니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "daily" | "day" => return Ok(Timeframe::Day),
            "weekly" | "week" => return Ok(Timeframe::Week),
            "monthly" | "month" => return Ok(Timeframe::Month),
            _ => {}
        }

        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| ConfigError::ParseError(format!("타임프레임 단위 없음: {}", s)))?;
        let (count, unit) = s.split_at(split);
        let count: u32 = if count.is_empty() {
            1
        } else {
            count
                .parse()
                .map_err(|e| ConfigError::ParseError(format!("타임프레임 숫자 오류: {} ({})", s, e)))?
        };
        if count == 0 {
            return Err(ConfigError::ValidationError(format!(
                "타임프레임 값은 0보다 커야 합니다: {}",
                s
            )));
        }

        match unit {
            "m" | "min" => Ok(Timeframe::Minute(count)),
            "h" | "H" => Ok(Timeframe::Hour(count)),
            "d" | "D" if count == 1 => Ok(Timeframe::Day),
            "w" | "W" if count == 1 => Ok(Timeframe::Week),
            "M" | "mo" if count == 1 => Ok(Timeframe::Month),
            _ => Err(ConfigError::ParseError(format!(
                "지원되지 않는 타임프레임: {}",
                s
            ))),
        }
    }
}

impl TryFrom<String> for Timeframe {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(value: Timeframe) -> Self {
        value.to_string()
    }
}
