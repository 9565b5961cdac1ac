//! 보조 차트 오버레이 상태 머신
//!
//! 보조 차트마다 표시 중인 지표는 최대 하나이며(`None` 포함),
//! 공용 툴바의 단일/더블 클릭으로 그룹 전체 또는 보조 차트만 전환합니다.
//! 생명선/추세선 깜빡임은 지표 상태와 독립적으로 메인 차트의 이동평균선에 적용됩니다.

pub mod blink;
pub mod controller;
pub mod pane;

use crate::indicator::IndicatorKind;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

pub use blink::{BlinkLine, BlinkToggle};
pub use controller::OverlayController;
pub use pane::SubPane;

/// 깜빡임 대상 이동평균선
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BlinkTarget {
    /// 생명선
    Lifeline,
    /// 추세선
    Trendline,
}

impl BlinkTarget {
    pub fn key(&self) -> &'static str {
        match self {
            BlinkTarget::Lifeline => "lifeline",
            BlinkTarget::Trendline => "trendline",
        }
    }

    /// 서로 배타적인 다른 쪽 대상
    pub fn other(&self) -> BlinkTarget {
        match self {
            BlinkTarget::Lifeline => BlinkTarget::Trendline,
            BlinkTarget::Trendline => BlinkTarget::Lifeline,
        }
    }
}

/// 툴바 버튼 액션
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolbarAction {
    /// 보조 차트 지표 전환
    Indicator(IndicatorKind),
    /// 메인 이동평균선 깜빡임 토글
    Blink(BlinkTarget),
}

impl ToolbarAction {
    /// 툴바에 존재하는 모든 액션 (버튼 순서)
    pub const ALL: [ToolbarAction; 7] = [
        ToolbarAction::Indicator(IndicatorKind::MaOscillator),
        ToolbarAction::Indicator(IndicatorKind::Rsi),
        ToolbarAction::Indicator(IndicatorKind::Macd),
        ToolbarAction::Indicator(IndicatorKind::Disparity),
        ToolbarAction::Indicator(IndicatorKind::FearGreed),
        ToolbarAction::Blink(BlinkTarget::Lifeline),
        ToolbarAction::Blink(BlinkTarget::Trendline),
    ];

    /// 툴바 버튼 키
    pub fn key(&self) -> &'static str {
        match self {
            ToolbarAction::Indicator(kind) => kind.key(),
            ToolbarAction::Blink(target) => target.key(),
        }
    }
}

impl Display for ToolbarAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for ToolbarAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolbarAction::ALL
            .iter()
            .copied()
            .find(|action| action.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("알 수 없는 툴바 액션: {}", s))
    }
}
