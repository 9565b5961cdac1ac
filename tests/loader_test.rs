mod common_test_utils;

use async_trait::async_trait;
use chart_pane_core::loader::{
    DataLoader, JsonFileLoader, LoadError, LoadResult, load_or_empty, load_preset_data,
};
use chart_pane_core::model::Bar;
use chart_pane_core::timeframe::Timeframe;
use common_test_utils::daily_preset;
use std::sync::Mutex;
use tempfile::tempdir;

/// 요청을 기록하고, 등록되지 않은 시리즈는 실패하는 로더
#[derive(Default)]
struct RecordingLoader {
    series: Vec<(String, Timeframe, Vec<Bar>)>,
    requests: Mutex<Vec<(String, Timeframe)>>,
}

impl RecordingLoader {
    fn with(mut self, symbol: &str, timeframe: Timeframe, bars: Vec<Bar>) -> Self {
        self.series.push((symbol.to_string(), timeframe, bars));
        self
    }
}

#[async_trait]
impl DataLoader for RecordingLoader {
    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        _exchange: &str,
    ) -> LoadResult<Vec<Bar>> {
        self.requests
            .lock()
            .unwrap()
            .push((symbol.to_string(), timeframe));
        self.series
            .iter()
            .find(|(s, tf, _)| s == symbol && *tf == timeframe)
            .map(|(_, _, bars)| bars.clone())
            .ok_or_else(|| LoadError::NotFound(format!("{} {}", symbol, timeframe)))
    }
}

fn bars(count: i64, step: i64) -> Vec<Bar> {
    (1..=count).map(|i| Bar::synthetic(i * step, i as f64)).collect()
}

#[tokio::test]
async fn test_failure_degrades_to_empty_series() {
    let loader = RecordingLoader::default();
    let result = load_or_empty(&loader, "MISSING", Timeframe::Day, "krx").await;
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_preset_data_reuses_main_timeframe() {
    let loader = RecordingLoader::default()
        .with("005930", Timeframe::Day, bars(30, 86_400))
        .with("005930", Timeframe::Hour(2), bars(50, 7_200));

    let data = load_preset_data(&loader, &daily_preset()).await;
    assert_eq!(data.main.len(), 30);
    assert_eq!(data.sub_panes.len(), 2);
    assert_eq!(data.sub_panes[0], data.main);
    assert_eq!(data.sub_panes[1].len(), 50);
    assert!(data.fear_greed.is_none());

    // 메인과 같은 타임프레임의 보조 차트는 다시 요청하지 않음
    let requests = loader.requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec![
            ("005930".to_string(), Timeframe::Day),
            ("005930".to_string(), Timeframe::Hour(2)),
        ]
    );
}

#[tokio::test]
async fn test_fear_greed_is_loaded_daily() {
    let mut preset = daily_preset();
    preset.fear_greed_symbol = Some("FGI".to_string());
    let loader = RecordingLoader::default().with("FGI", Timeframe::Day, bars(10, 86_400));

    let data = load_preset_data(&loader, &preset).await;
    assert!(data.main.is_empty());
    assert_eq!(data.fear_greed.map(|series| series.len()), Some(10));
}

#[tokio::test]
async fn test_json_file_loader_through_trait() {
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("krx")).unwrap();
    std::fs::write(
        dir.path().join("krx/005930_1d.json"),
        r#"[
            {"Date": "2024-01-03", "Open": 3, "High": 4, "Low": 2, "Close": 3.5},
            {"Date": "2024-01-02", "Open": 1, "High": 2, "Low": 1, "Close": 1.5},
            {"Date": "2024-01-02", "Open": 1, "High": 2, "Low": 1, "Close": 1.8},
            {"Date": "not a date", "Close": 9}
        ]"#,
    )
    .unwrap();

    let loader = JsonFileLoader::new(dir.path());
    let data = load_preset_data(&loader, &daily_preset()).await;

    assert_eq!(data.main.len(), 2);
    assert_eq!(data.main[0].close, 1.8);
    assert_eq!(data.main[1].close, 3.5);
    // 2시간봉 파일이 없으므로 빈 시리즈
    assert!(data.sub_panes[1].is_empty());
    assert_eq!(loader.read_preset_data(&daily_preset()).main, data.main);
}
