use chart_pane_core::config::PresetConfig;
use chart_pane_core::config_loader::{ConfigFormat, ConfigLoader};
use chart_pane_core::loader::JsonFileLoader;
use chart_pane_core::overlay::ToolbarAction;
use chart_pane_core::pane_group::PaneGroup;
use chart_pane_core::scheduler::ManualScheduler;
use chart_pane_core::surface::{HeadlessChart, HeadlessContainer, HeadlessToolbar, PaneHandles};
use log::{debug, error, info};
use std::env;
use std::path::PathBuf;
use std::rc::Rc;

/// 헤드리스 차트 하나와 그 컨테이너
struct HeadlessPane {
    chart: Rc<HeadlessChart>,
    container: Rc<HeadlessContainer>,
}

impl HeadlessPane {
    fn new(name: &str) -> Self {
        HeadlessPane {
            chart: Rc::new(HeadlessChart::new(name)),
            container: Rc::new(HeadlessContainer::new()),
        }
    }

    fn handles(&self) -> PaneHandles {
        PaneHandles::new(self.chart.clone(), self.container.clone())
    }
}

fn main() {
    // 로그 초기화
    env_logger::init();

    info!("프리셋 리포트 시작");
    let args: Vec<String> = env::args().collect();
    debug!("커맨드 라인 인수: {:?}", args);

    if args.len() < 3 {
        error!("인수가 충분하지 않습니다. 프리셋 파일과 데이터 디렉터리가 필요합니다.");
        println!("사용법: {} <프리셋_파일> <데이터_디렉터리> [액션...]", args[0]);
        println!("액션: ma_oscillator, rsi, macd, disparity, fg_index, lifeline, trendline");
        println!("      지표 액션 뒤에 ':double'을 붙이면 더블 클릭 (예: rsi:double)");
        return;
    }

    let preset_path = PathBuf::from(&args[1]);
    let data_dir = PathBuf::from(&args[2]);

    let preset: PresetConfig = match ConfigLoader::load_from_file(&preset_path, ConfigFormat::Auto)
    {
        Ok(preset) => preset,
        Err(err) => {
            error!("프리셋 로드 실패: {}", err);
            println!("프리셋 로드 실패: {}", err);
            if let chart_pane_core::config_loader::ConfigError::ValidationError(_) = err {
                println!("해결 방법: 보조 차트 수(1~3)와 지표 기간을 확인하세요.");
            }
            return;
        }
    };

    // 액션 파싱
    let mut actions = Vec::new();
    for arg in &args[3..] {
        let (key, double) = match arg.strip_suffix(":double") {
            Some(key) => (key, true),
            None => (arg.as_str(), false),
        };
        match key.parse::<ToolbarAction>() {
            Ok(action) => actions.push((action, double)),
            Err(err) => {
                error!("{}", err);
                println!("{}", err);
                return;
            }
        }
    }

    let loader = JsonFileLoader::new(&data_dir);
    let data = loader.read_preset_data(&preset);

    let main = HeadlessPane::new("main");
    let subs: Vec<HeadlessPane> = (0..preset.sub_panes.len())
        .map(|idx| HeadlessPane::new(&format!("sub{}", idx)))
        .collect();
    let toolbar = Rc::new(HeadlessToolbar::new());
    let scheduler = Rc::new(ManualScheduler::new());

    let group = match PaneGroup::mount(
        &preset,
        main.handles(),
        subs.iter().map(HeadlessPane::handles).collect(),
        data,
        toolbar.clone(),
        scheduler.clone(),
    ) {
        Ok(group) => group,
        Err(err) => {
            error!("차트 그룹 마운트 실패: {}", err);
            println!("차트 그룹 마운트 실패: {}", err);
            return;
        }
    };

    let window = preset.toolbar.double_click_window_ms;
    for (action, double) in actions {
        info!("액션 실행: {}{}", action, if double { " (더블)" } else { "" });
        toolbar.press(action.key());
        if double {
            toolbar.press(action.key());
        }
        scheduler.advance(window + 1);
    }

    println!("{}", group);
    println!("프리셋: {} ({} {} {})", preset.name, preset.exchange, preset.symbol, preset.timeframe);
    println!("메인 차트 시리즈: {}개", main.chart.series_count());

    for (idx, (pane, headless)) in group.sub_panes().iter().zip(&subs).enumerate() {
        let state = pane
            .state()
            .map(|kind| kind.to_string())
            .unwrap_or_else(|| "none".to_owned());
        println!(
            "보조 차트 {} [{:?}]: 상태={}, 시리즈={}개, 범례={}, 거터={:.1}px",
            idx,
            pane.role(),
            state,
            headless.chart.series_count(),
            headless.container.legend().unwrap_or_else(|| "-".to_owned()),
            headless.container.spacer()
        );
        if let Some(pulse) = headless.container.pulse() {
            println!("  펄스: ({:.1}, {:.1}) {}", pulse.x, pulse.y, pulse.color);
        }
    }

    println!("활성 버튼: {:?}", toolbar.active_keys());

    group.dispose();
    info!("프리셋 리포트 종료");
}
