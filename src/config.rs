//! 프리셋 설정
//!
//! 프리셋마다 복사-붙여넣기하던 동기화/오버레이 설정을 하나의 구조체로 모읍니다.
//! 타임프레임 계열별 기본 지표 파라미터는 [`DEFAULT_INDICATOR_PARAMS`] 테이블에 있습니다.

use crate::config_loader::{ConfigError, ConfigResult, ConfigValidation};
use crate::indicator::ma::MAType;
use crate::indicator::{CrossStyle, IndicatorKind, MACDParams};
use crate::timeframe::{Timeframe, TimeframeFamily};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 이동평균 오실레이터 파라미터
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaOscillatorParams {
    pub fast_period: usize,
    pub slow_period: usize,
}

/// 한 보조 차트의 지표 파라미터
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorParams {
    pub ma_oscillator: MaOscillatorParams,
    pub rsi_period: usize,
    pub macd: MACDParams,
    pub disparity_period: usize,
}

/// 타임프레임 계열별 기본 지표 파라미터
///
/// 같은 툴바 버튼이라도 일봉 차트는 MAOSC(20,60), 2시간봉 차트는 MAOSC(60,240)처럼
/// 계열마다 다른 파라미터로 그립니다.
pub static DEFAULT_INDICATOR_PARAMS: Lazy<HashMap<TimeframeFamily, IndicatorParams>> =
    Lazy::new(|| {
        let params = |fast, slow, rsi_period, disparity_period| IndicatorParams {
            ma_oscillator: MaOscillatorParams {
                fast_period: fast,
                slow_period: slow,
            },
            rsi_period,
            macd: MACDParams::default(),
            disparity_period,
        };

        HashMap::from([
            (TimeframeFamily::Intraday, params(60, 240, 14, 60)),
            (TimeframeFamily::Daily, params(20, 60, 14, 20)),
            (TimeframeFamily::Weekly, params(10, 30, 14, 13)),
            (TimeframeFamily::Monthly, params(6, 12, 14, 12)),
        ])
    });

impl IndicatorParams {
    /// 타임프레임 계열의 기본 파라미터
    pub fn for_family(family: TimeframeFamily) -> Self {
        DEFAULT_INDICATOR_PARAMS
            .get(&family)
            .copied()
            .unwrap_or_default()
    }

    pub fn for_timeframe(timeframe: Timeframe) -> Self {
        Self::for_family(timeframe.family())
    }
}

impl Default for IndicatorParams {
    /// 일봉 기본값
    fn default() -> Self {
        IndicatorParams {
            ma_oscillator: MaOscillatorParams {
                fast_period: 20,
                slow_period: 60,
            },
            rsi_period: 14,
            macd: MACDParams::default(),
            disparity_period: 20,
        }
    }
}

impl ConfigValidation for IndicatorParams {
    fn validate(&self) -> ConfigResult<()> {
        let osc = &self.ma_oscillator;
        if osc.fast_period == 0 || osc.fast_period >= osc.slow_period {
            return Err(ConfigError::ValidationError(format!(
                "MA 오실레이터 기간이 잘못되었습니다: {}, {}",
                osc.fast_period, osc.slow_period
            )));
        }
        let macd = &self.macd;
        if macd.fast_period == 0 || macd.signal_period == 0 || macd.fast_period >= macd.slow_period
        {
            return Err(ConfigError::ValidationError(format!(
                "MACD 기간이 잘못되었습니다: {}",
                macd
            )));
        }
        if self.rsi_period == 0 || self.disparity_period == 0 {
            return Err(ConfigError::ValidationError(
                "RSI/이격도 기간은 0보다 커야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}

/// 보조 차트별 파라미터 덮어쓰기 (지정한 항목만 적용)
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct IndicatorOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ma_oscillator: Option<MaOscillatorParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi_period: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<MACDParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disparity_period: Option<usize>,
}

impl IndicatorOverrides {
    pub fn apply(&self, base: IndicatorParams) -> IndicatorParams {
        IndicatorParams {
            ma_oscillator: self.ma_oscillator.unwrap_or(base.ma_oscillator),
            rsi_period: self.rsi_period.unwrap_or(base.rsi_period),
            macd: self.macd.unwrap_or(base.macd),
            disparity_period: self.disparity_period.unwrap_or(base.disparity_period),
        }
    }
}

/// 툴바 동작 설정
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ToolbarBehavior {
    /// 이 시간 안에 두 번째 클릭이 오면 더블 클릭 (ms)
    pub double_click_window_ms: u64,
    /// 크로스 마커 허용 오차
    pub cross_epsilon: f64,
    /// 생명선/추세선 깜빡임 주기 (ms)
    pub blink_interval_ms: u64,
}

impl Default for ToolbarBehavior {
    fn default() -> Self {
        ToolbarBehavior {
            double_click_window_ms: 220,
            cross_epsilon: crate::indicator::DEFAULT_CROSS_EPSILON,
            blink_interval_ms: 1500,
        }
    }
}

/// 색상 팔레트
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Palette {
    pub golden_cross: String,
    pub dead_cross: String,
    pub histogram_positive: String,
    pub histogram_negative: String,
    pub oscillator: String,
    pub rsi: String,
    pub macd: String,
    pub signal: String,
    pub disparity: String,
    pub fear_greed: String,
    /// 깜빡임 시 교대로 칠할 색상
    pub blink: String,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            golden_cross: "#26a69a".to_owned(),
            dead_cross: "#ef5350".to_owned(),
            histogram_positive: "#26a69a".to_owned(),
            histogram_negative: "#ef5350".to_owned(),
            oscillator: "#2962ff".to_owned(),
            rsi: "#7e57c2".to_owned(),
            macd: "#2962ff".to_owned(),
            signal: "#ff6d00".to_owned(),
            disparity: "#00897b".to_owned(),
            fear_greed: "#f9a825".to_owned(),
            blink: "#ffffff".to_owned(),
        }
    }
}

/// 메인 차트에 항상 그려지는 이동평균선
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MaLineSpec {
    pub period: usize,
    #[serde(default)]
    pub ma_type: MAType,
    pub color: String,
}

fn default_ma_lines() -> Vec<MaLineSpec> {
    vec![
        MaLineSpec {
            period: 20,
            ma_type: MAType::SMA,
            color: "#ff9800".to_owned(),
        },
        MaLineSpec {
            period: 60,
            ma_type: MAType::SMA,
            color: "#4caf50".to_owned(),
        },
    ]
}

/// 생명선/추세선 깜빡임 대상
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct BlinkTargets {
    /// 생명선 이동평균 기간
    pub lifeline_period: usize,
    /// 추세선 이동평균 기간
    pub trendline_period: usize,
}

impl Default for BlinkTargets {
    fn default() -> Self {
        BlinkTargets {
            lifeline_period: 20,
            trendline_period: 60,
        }
    }
}

/// 보조 차트 역할
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SubPaneRole {
    /// 주 보조 차트 (더블 클릭의 영향을 받지 않음)
    Primary,
    /// 보조/팔로워 차트 (더블 클릭 대상)
    Secondary,
}

fn default_true() -> bool {
    true
}

/// 보조 차트 설정
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubPaneConfig {
    pub role: SubPaneRole,
    pub timeframe: Timeframe,
    #[serde(default)]
    pub overrides: IndicatorOverrides,
    /// 메인 차트의 가시 범위를 따라갈지 여부
    /// (독립 타임프레임 차트는 보통 false)
    #[serde(default = "default_true")]
    pub link_viewport: bool,
}

impl SubPaneConfig {
    /// 타임프레임 기본값에 덮어쓰기를 적용한 최종 파라미터
    pub fn indicator_params(&self) -> IndicatorParams {
        self.overrides
            .apply(IndicatorParams::for_timeframe(self.timeframe))
    }
}

/// 프리셋 설정 (한 개의 차트 그룹)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PresetConfig {
    pub name: String,
    pub symbol: String,
    pub exchange: String,
    /// 메인 차트 타임프레임
    pub timeframe: Timeframe,
    pub sub_panes: Vec<SubPaneConfig>,
    /// 마운트 직후 표시할 지표
    #[serde(default)]
    pub initial_overlay: Option<IndicatorKind>,
    /// 공포/탐욕 지수 심볼 (없으면 FG_INDEX 비활성)
    #[serde(default)]
    pub fear_greed_symbol: Option<String>,
    #[serde(default = "default_ma_lines")]
    pub ma_lines: Vec<MaLineSpec>,
    #[serde(default)]
    pub blink: BlinkTargets,
    #[serde(default)]
    pub toolbar: ToolbarBehavior,
    #[serde(default)]
    pub palette: Palette,
}

impl PresetConfig {
    /// 최소 설정으로 프리셋 생성 (나머지는 기본값)
    pub fn new(name: &str, symbol: &str, exchange: &str, timeframe: Timeframe) -> Self {
        PresetConfig {
            name: name.to_owned(),
            symbol: symbol.to_owned(),
            exchange: exchange.to_owned(),
            timeframe,
            sub_panes: Vec::new(),
            initial_overlay: None,
            fear_greed_symbol: None,
            ma_lines: default_ma_lines(),
            blink: BlinkTargets::default(),
            toolbar: ToolbarBehavior::default(),
            palette: Palette::default(),
        }
    }

    /// 보조 차트 추가
    pub fn with_sub_pane(mut self, role: SubPaneRole, timeframe: Timeframe) -> Self {
        self.sub_panes.push(SubPaneConfig {
            role,
            timeframe,
            overrides: IndicatorOverrides::default(),
            link_viewport: true,
        });
        self
    }

    pub fn cross_style(&self) -> CrossStyle {
        CrossStyle {
            up_color: self.palette.golden_cross.clone(),
            down_color: self.palette.dead_cross.clone(),
            epsilon: self.toolbar.cross_epsilon,
        }
    }

    /// 지정된 기간의 메인 이동평균선 설정
    pub fn ma_line(&self, period: usize) -> Option<&MaLineSpec> {
        self.ma_lines.iter().find(|line| line.period == period)
    }
}

impl ConfigValidation for PresetConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.sub_panes.is_empty() || self.sub_panes.len() > 3 {
            return Err(ConfigError::ValidationError(format!(
                "보조 차트는 1~3개여야 합니다: {}",
                self.sub_panes.len()
            )));
        }

        let primaries = self
            .sub_panes
            .iter()
            .filter(|pane| pane.role == SubPaneRole::Primary)
            .count();
        if primaries > 1 {
            return Err(ConfigError::ValidationError(
                "주 보조 차트는 하나만 있을 수 있습니다".to_string(),
            ));
        }

        for pane in &self.sub_panes {
            pane.indicator_params().validate()?;
        }

        if self.ma_lines.iter().any(|line| line.period == 0) {
            return Err(ConfigError::ValidationError(
                "이동평균선 기간은 0보다 커야 합니다".to_string(),
            ));
        }

        if !self.toolbar.cross_epsilon.is_finite() || self.toolbar.cross_epsilon < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "크로스 허용 오차가 잘못되었습니다: {}",
                self.toolbar.cross_epsilon
            )));
        }
        if self.toolbar.blink_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "깜빡임 주기는 0보다 커야 합니다".to_string(),
            ));
        }

        Ok(())
    }
}
