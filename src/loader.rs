//! 시리즈 데이터 로더
//!
//! 네트워크 수집/캐싱 계층은 외부 협력자이며, 이 모듈은 그 경계만 정의합니다.
//! 로더가 실패해도 차트 그룹은 빈 시리즈로 마운트되어 "데이터 없음"으로 표시됩니다.

use crate::config::PresetConfig;
use crate::model::Bar;
use crate::normalize::normalize_value;
use crate::pane_group::PaneData;
use crate::timeframe::Timeframe;
use async_trait::async_trait;
use log::{debug, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};

/// 로드 오류
#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    /// 파일/네트워크 입출력 오류
    Io(String),
    /// 응답 파싱 오류
    Parse(String),
    /// 요청한 시리즈가 없음
    NotFound(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(msg) => write!(f, "데이터 읽기 오류: {}", msg),
            LoadError::Parse(msg) => write!(f, "데이터 파싱 오류: {}", msg),
            LoadError::NotFound(msg) => write!(f, "데이터 없음: {}", msg),
        }
    }
}

impl std::error::Error for LoadError {}

pub type LoadResult<T> = Result<T, LoadError>;

/// 시리즈 로더
#[async_trait]
pub trait DataLoader: Send + Sync {
    /// 심볼/타임프레임/거래소의 정규화된 Bar 시리즈 로드
    async fn fetch(&self, symbol: &str, timeframe: Timeframe, exchange: &str)
    -> LoadResult<Vec<Bar>>;
}

/// 로드 실패를 빈 시리즈로 낮춤
pub async fn load_or_empty(
    loader: &dyn DataLoader,
    symbol: &str,
    timeframe: Timeframe,
    exchange: &str,
) -> Vec<Bar> {
    match loader.fetch(symbol, timeframe, exchange).await {
        Ok(bars) => bars,
        Err(e) => {
            warn!("{} {} {} 로드 실패, 빈 시리즈 사용: {}", exchange, symbol, timeframe, e);
            Vec::new()
        }
    }
}

/// 프리셋이 필요로 하는 모든 시리즈 로드 (메인, 보조 차트별, 공포/탐욕 지수)
pub async fn load_preset_data(loader: &dyn DataLoader, preset: &PresetConfig) -> PaneData {
    let main = load_or_empty(loader, &preset.symbol, preset.timeframe, &preset.exchange).await;

    let mut sub_panes = Vec::with_capacity(preset.sub_panes.len());
    for pane in &preset.sub_panes {
        let bars = if pane.timeframe == preset.timeframe {
            main.clone()
        } else {
            load_or_empty(loader, &preset.symbol, pane.timeframe, &preset.exchange).await
        };
        sub_panes.push(bars);
    }

    let fear_greed = match &preset.fear_greed_symbol {
        Some(symbol) => Some(load_or_empty(loader, symbol, Timeframe::Day, &preset.exchange).await),
        None => None,
    };

    PaneData {
        main,
        sub_panes,
        fear_greed,
    }
}

/// 로컬 JSON 파일 로더
///
/// `<root>/<exchange>/<symbol>_<timeframe>.json` 파일의 레코드 배열을 읽어 정규화합니다.
#[derive(Debug, Clone)]
pub struct JsonFileLoader {
    root: PathBuf,
}

impl JsonFileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        JsonFileLoader { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 시리즈 파일 경로
    pub fn path_for(&self, symbol: &str, timeframe: Timeframe, exchange: &str) -> PathBuf {
        self.root
            .join(exchange)
            .join(format!("{}_{}.json", symbol, timeframe))
    }

    /// 동기 로드 (비동기 런타임이 없는 바이너리용)
    pub fn read(&self, symbol: &str, timeframe: Timeframe, exchange: &str) -> LoadResult<Vec<Bar>> {
        let path = self.path_for(symbol, timeframe, exchange);
        debug!("시리즈 파일 로드: {}", path.display());

        if !path.exists() {
            return Err(LoadError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| LoadError::Io(format!("{}: {}", path.display(), e)))?;
        let raw: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| LoadError::Parse(format!("{}: {}", path.display(), e)))?;

        let bars = normalize_value(&raw);
        info!("{} 로드 완료: {}개", path.display(), bars.len());
        Ok(bars)
    }

    /// 동기 버전의 [`load_preset_data`]
    pub fn read_preset_data(&self, preset: &PresetConfig) -> PaneData {
        let read_or_empty = |symbol: &str, timeframe: Timeframe| {
            self.read(symbol, timeframe, &preset.exchange)
                .unwrap_or_else(|e| {
                    warn!("{} {} 로드 실패, 빈 시리즈 사용: {}", symbol, timeframe, e);
                    Vec::new()
                })
        };

        let main = read_or_empty(&preset.symbol, preset.timeframe);
        let sub_panes = preset
            .sub_panes
            .iter()
            .map(|pane| {
                if pane.timeframe == preset.timeframe {
                    main.clone()
                } else {
                    read_or_empty(&preset.symbol, pane.timeframe)
                }
            })
            .collect();
        let fear_greed = preset
            .fear_greed_symbol
            .as_deref()
            .map(|symbol| read_or_empty(symbol, Timeframe::Day));

        PaneData {
            main,
            sub_panes,
            fear_greed,
        }
    }
}

#[async_trait]
impl DataLoader for JsonFileLoader {
    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        exchange: &str,
    ) -> LoadResult<Vec<Bar>> {
        self.read(symbol, timeframe, exchange)
    }
}
