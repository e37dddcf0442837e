use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Clear, Dataset, GraphType,
    Paragraph, Row, Table,
};
use tracing_subscriber::EnvFilter;

use injury_impact::aggregate::{AgeRecoveryPoint, CategoryCount, MatchOutcomeTally};
use injury_impact::config::Config;
use injury_impact::export;
use injury_impact::pipeline::Pipeline;
use injury_impact::record::InjuryRecord;
use injury_impact::state::{AppState, FilterFocus, Screen};

const SCATTER_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Green,
    Color::LightRed,
    Color::LightBlue,
];

struct App {
    state: AppState,
    config: Config,
    should_quit: bool,
}

impl App {
    fn new(state: AppState, config: Config) -> Self {
        Self {
            state,
            config,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.state.toggle_focus(),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char(' ') | KeyCode::Enter => self.state.toggle_under_cursor(),
            KeyCode::Char('a') => self.state.select_all_focused(),
            KeyCode::Char('c') => self.state.clear_focused(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.state.toggle_raw_data(),
            KeyCode::Char('e') | KeyCode::Char('E') => self.export(),
            KeyCode::Esc => self.state.screen = Screen::Dashboard,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn export(&mut self) {
        let path = self.config.export_path.clone();
        let columns = self.state.result_column_names();
        match export::export_dashboard(&path, &self.state.view, &columns) {
            Ok(report) => self
                .state
                .push_log(format!("[INFO] {}", report.describe(&path))),
            Err(err) => self.state.push_log(format!("[WARN] Export failed: {err:#}")),
        }
    }
}

fn main() -> io::Result<()> {
    let config = Config::from_env();
    init_tracing(&config);

    let pipeline = match Pipeline::open(&config.data_path) {
        Ok(pipeline) => pipeline.with_histogram_bins(config.histogram_bins),
        Err(err) => {
            eprintln!("Error: {err}");
            if err.is_not_found() {
                if let Ok(cwd) = std::env::current_dir() {
                    eprintln!("Looked in: {}", cwd.display());
                }
            }
            std::process::exit(1);
        }
    };
    let state = AppState::new(pipeline, config.default_team_count);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(state, config);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

// The terminal owns stdout, so tracing only goes to a file when one is configured.
fn init_tracing(config: &Config) {
    let Some(path) = config.log_file.as_ref() else {
        return;
    };
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "injury_impact=info".into()),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);

    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Dashboard => render_dashboard(frame, chunks[1], &app.state),
        Screen::RawData => render_raw_data(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let screen = match state.screen {
        Screen::Dashboard => "DASHBOARD",
        Screen::RawData => "RAW DATA",
    };
    let line1 = format!("  Player Injuries Impact | {screen}");
    let line2 = format!(
        "  Teams: {} | Positions: {}",
        selection_label(state.criteria.teams.iter()),
        selection_label(state.criteria.positions.iter())
    );
    format!("{line1}\n{line2}")
}

fn selection_label<'a>(values: impl Iterator<Item = &'a String>) -> String {
    let values: Vec<&str> = values.map(String::as_str).collect();
    match values.len() {
        0 => "all".to_string(),
        1..=3 => values.join(", "),
        n => format!("{n} selected"),
    }
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Dashboard => {
            "Tab Focus | j/k/↑/↓ Move | Space Toggle | a All | c Clear | r Raw data | e Export | ? Help | q Quit".to_string()
        }
        Screen::RawData => "j/k/↑/↓ Scroll | r/Esc Back | e Export | ? Help | q Quit".to_string(),
    }
}

fn render_dashboard(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(40)])
        .split(area);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(columns[0]);
    render_filter_list(frame, sidebar[0], state, FilterFocus::Teams);
    render_filter_list(frame, sidebar[1], state, FilterFocus::Positions);

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Percentage(40),
            Constraint::Percentage(40),
            Constraint::Min(6),
        ])
        .split(columns[1]);

    render_kpis(frame, main[0], state);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main[1]);
    render_counts(
        frame,
        top[0],
        "1. Injury Count by Team",
        &state.view.summary.by_team,
        Color::LightBlue,
    );
    render_counts(
        frame,
        top[1],
        "2. Injuries by Position",
        &state.view.summary.by_position,
        Color::LightMagenta,
    );

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main[2]);
    render_histogram(frame, middle[0], state);
    render_scatter(frame, middle[1], &state.view.summary.age_vs_recovery);

    render_outcomes(frame, main[3], &state.view.summary.match_outcomes);
}

fn render_filter_list(frame: &mut Frame, area: Rect, state: &AppState, focus: FilterFocus) {
    let (title, values, cursor) = match focus {
        FilterFocus::Teams => ("Select Team(s)", &state.teams, state.team_cursor),
        FilterFocus::Positions => ("Select Position(s)", &state.positions, state.position_cursor),
    };
    let focused = state.focus == focus;
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if values.is_empty() {
        let empty = Paragraph::new("No values").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let visible = inner.height as usize;
    let (start, end) = visible_range(cursor, values.len(), visible);
    let lines: Vec<Line> = (start..end)
        .map(|idx| {
            let value = &values[idx];
            let mark = if state.is_selected(focus, value) { "[x]" } else { "[ ]" };
            let style = if focused && idx == cursor {
                Style::default().fg(Color::White).bg(Color::DarkGray)
            } else {
                Style::default()
            };
            Line::styled(format!("{mark} {value}"), style)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_kpis(frame: &mut Frame, area: Rect, state: &AppState) {
    let kpis = &state.view.summary.kpis;
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(30),
            Constraint::Percentage(20),
        ])
        .split(area);

    let cells = [
        ("Total Injuries Recorded", kpis.total_injuries.to_string()),
        ("Avg. Recovery Time", kpis.mean_recovery_label()),
        ("Most Common Injury", kpis.most_common_injury.clone()),
        ("Return < Injury", kpis.inverted_date_records.to_string()),
    ];
    for (idx, (title, value)) in cells.into_iter().enumerate() {
        let style = if idx == 3 && kpis.inverted_date_records > 0 {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let widget = Paragraph::new(value)
            .style(style)
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(widget, cols[idx]);
    }
}

fn render_counts(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    counts: &[CategoryCount],
    color: Color,
) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    if counts.is_empty() {
        let empty = Paragraph::new("No data for current selection")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let bars: Vec<Bar> = counts
        .iter()
        .map(|c| {
            Bar::default()
                .value(c.count as u64)
                .label(Line::from(c.category.clone()))
                .style(Style::default().fg(color))
        })
        .collect();
    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0);
    frame.render_widget(chart, area);
}

fn render_histogram(frame: &mut Frame, area: Rect, state: &AppState) {
    let bins = &state.view.summary.recovery_histogram;
    let block = Block::default()
        .title("3. Recovery Time Analysis (days)")
        .borders(Borders::ALL);
    if bins.is_empty() {
        let empty = Paragraph::new("No data for current selection")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let bars: Vec<Bar> = bins
        .iter()
        .map(|bin| {
            Bar::default()
                .value(bin.count as u64)
                .label(Line::from(format!("{:.0}", bin.lower)))
                .style(Style::default().fg(Color::LightRed))
        })
        .collect();
    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(3)
        .bar_gap(1);
    frame.render_widget(chart, area);
}

fn render_scatter(frame: &mut Frame, area: Rect, points: &[AgeRecoveryPoint]) {
    let block = Block::default()
        .title("4. Age vs. Recovery Duration")
        .borders(Borders::ALL);

    let mut by_injury: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();
    for p in points {
        let Some(age) = p.age else {
            continue;
        };
        let injury = p.injury.clone().unwrap_or_else(|| "Unknown".to_string());
        by_injury
            .entry(injury)
            .or_default()
            .push((age as f64, p.recovery_days as f64));
    }
    if by_injury.is_empty() {
        let empty = Paragraph::new("No data for current selection")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    // Fold the long tail of injury types into one series so colours stay distinct.
    let mut series: Vec<(String, Vec<(f64, f64)>)> = by_injury.into_iter().collect();
    series.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));
    if series.len() > SCATTER_COLORS.len() {
        let rest: Vec<(f64, f64)> = series
            .split_off(SCATTER_COLORS.len() - 1)
            .into_iter()
            .flat_map(|(_, pts)| pts)
            .collect();
        series.push(("Other".to_string(), rest));
    }

    let all = series.iter().flat_map(|(_, pts)| pts.iter());
    let (mut x_min, mut x_max, mut y_min, mut y_max) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
    for (x, y) in all {
        x_min = x_min.min(*x);
        x_max = x_max.max(*x);
        y_min = y_min.min(*y);
        y_max = y_max.max(*y);
    }
    let x_bounds = padded_bounds(x_min, x_max);
    let y_bounds = padded_bounds(y_min, y_max);

    let datasets: Vec<Dataset> = series
        .iter()
        .zip(SCATTER_COLORS)
        .map(|((name, pts), color)| {
            Dataset::default()
                .name(name.clone())
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(color))
                .data(pts)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("Age")
                .bounds(x_bounds)
                .labels(axis_labels(x_bounds)),
        )
        .y_axis(
            Axis::default()
                .title("Days")
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds)),
        );
    frame.render_widget(chart, area);
}

fn padded_bounds(min: f64, max: f64) -> [f64; 2] {
    if (max - min).abs() < f64::EPSILON {
        return [min - 1.0, max + 1.0];
    }
    [min, max]
}

fn axis_labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .iter()
        .map(|v| Span::raw(format!("{v:.0}")))
        .collect()
}

fn render_outcomes(frame: &mut Frame, area: Rect, tally: &MatchOutcomeTally) {
    let block = Block::default()
        .title("5. Team Performance During Player Absence")
        .borders(Borders::ALL);
    let counts = match tally {
        MatchOutcomeTally::NoData => {
            let info = Paragraph::new("No missed match data available for current selection.")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(info, area);
            return;
        }
        MatchOutcomeTally::Counts(counts) => counts,
    };

    let bars: Vec<Bar> = counts
        .iter()
        .map(|c| {
            Bar::default()
                .value(c.count as u64)
                .label(Line::from(c.category.clone()))
                .style(Style::default().fg(outcome_color(&c.category)))
        })
        .collect();
    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(8)
        .bar_gap(2);
    frame.render_widget(chart, area);
}

fn outcome_color(outcome: &str) -> Color {
    match outcome {
        "win" => Color::Green,
        "lose" | "loss" => Color::Red,
        "draw" => Color::Gray,
        _ => Color::Blue,
    }
}

fn render_raw_data(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title(format!("Raw Data ({} rows)", state.view.records.len()))
        .borders(Borders::ALL);
    if state.view.records.is_empty() {
        let empty = Paragraph::new("No records for current selection")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(vec![
        "Name", "Team", "Pos", "Age", "FIFA", "Injury", "Injured", "Returned", "Days", "Missed",
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = state
        .view
        .records
        .iter()
        .skip(state.raw_scroll as usize)
        .map(raw_row)
        .collect();

    let widths = [
        Constraint::Min(18),
        Constraint::Length(16),
        Constraint::Length(6),
        Constraint::Length(4),
        Constraint::Length(5),
        Constraint::Min(14),
        Constraint::Length(13),
        Constraint::Length(13),
        Constraint::Length(5),
        Constraint::Min(10),
    ];
    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

fn raw_row(record: &InjuryRecord) -> Row<'static> {
    let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    let num = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());
    let rating = record
        .fifa_rating
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".to_string());
    let missed = record
        .missed_match_results
        .iter()
        .map(|v| v.as_deref().unwrap_or("-"))
        .collect::<Vec<_>>()
        .join(" ");
    let days_style = if record.has_inverted_dates() {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    Row::new(vec![
        Cell::from(opt(&record.name)),
        Cell::from(opt(&record.team_name)),
        Cell::from(opt(&record.position)),
        Cell::from(num(record.age)),
        Cell::from(rating),
        Cell::from(opt(&record.injury)),
        Cell::from(opt(&record.date_of_injury)),
        Cell::from(opt(&record.date_of_return)),
        Cell::from(
            record
                .recovery_days()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
        )
        .style(days_style),
        Cell::from(missed),
    ])
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 || visible == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Player Injuries Impact - Help",
        "",
        "Filters:",
        "  Tab          Switch team/position list",
        "  j/k or ↑/↓   Move cursor",
        "  Space/Enter  Toggle value",
        "  a            Select all in list",
        "  c            Clear list (no restriction)",
        "",
        "Views:",
        "  r            Raw data table",
        "  e            Export workbook",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
