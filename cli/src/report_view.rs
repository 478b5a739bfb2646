use std::{io, time::Duration};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Bar, BarChart, BarGroup, Block, BorderType, Borders, Padding, Paragraph},
};
use charity_core::{
    model::period::Period,
    report::{Field, Granularity, ReportViewModel},
    repository::RecordRepository,
    usecase::report::ReportUseCase,
    Config,
};

// --- THEME ---
struct Theme {
    primary: Color,
    muted: Color,
    text: Color,
    income: Color,
    expenses: Color,
}

const THEME: Theme = Theme {
    primary: Color::Cyan,
    muted: Color::DarkGray,
    text: Color::White,
    income: Color::Green,
    expenses: Color::Red,
};

/// Period browser state. `periods` is most recent first, so moving left
/// (older) increases `index`.
pub struct ReportApp<'a, R: RecordRepository> {
    usecase: ReportUseCase<'a, R>,
    pub periods: Vec<Period>,
    pub index: usize,
    pub granularity: Granularity,
    pub report: ReportViewModel,
}

impl<'a, R: RecordRepository> ReportApp<'a, R> {
    /// Opens on `start`; a month without data is slotted into `periods` so
    /// the browser shows what was asked for.
    pub fn new(repo: &'a R, mut periods: Vec<Period>, start: Period, granularity: Granularity) -> Result<Self> {
        let usecase = ReportUseCase::new(repo);
        let index = match periods.iter().position(|p| *p <= start) {
            Some(i) if periods[i] == start => i,
            Some(i) => {
                periods.insert(i, start);
                i
            }
            None => {
                periods.push(start);
                periods.len() - 1
            }
        };
        let report = usecase.report(start, granularity)?;
        Ok(Self {
            usecase,
            periods,
            index,
            granularity,
            report,
        })
    }

    fn reload(&mut self) -> Result<()> {
        if let Some(period) = self.periods.get(self.index) {
            self.report = self.usecase.report(*period, self.granularity)?;
        }
        Ok(())
    }

    pub fn older(&mut self) -> Result<()> {
        if self.index + 1 < self.periods.len() {
            self.index += 1;
            self.reload()?;
        }
        Ok(())
    }

    pub fn newer(&mut self) -> Result<()> {
        if self.index > 0 {
            self.index -= 1;
            self.reload()?;
        }
        Ok(())
    }

    pub fn cycle_granularity(&mut self) -> Result<()> {
        self.granularity = self.granularity.next();
        self.reload()
    }

    fn has_older(&self) -> bool {
        self.index + 1 < self.periods.len()
    }

    fn has_newer(&self) -> bool {
        self.index > 0
    }
}

pub fn run<R: RecordRepository>(app: &mut ReportApp<'_, R>, config: &Config) -> Result<()> {
    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, app, config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop<R: RecordRepository>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut ReportApp<'_, R>,
    config: &Config,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app, config))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                        KeyCode::Left | KeyCode::Char('h') => app.older()?,
                        KeyCode::Right | KeyCode::Char('l') => app.newer()?,
                        KeyCode::Char('g') => app.cycle_granularity()?,
                        _ => {}
                    }
                }
            }
        }
    }
}

fn ui<R: RecordRepository>(frame: &mut Frame, app: &ReportApp<'_, R>, config: &Config) {
    let size = frame.area();

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Chart + summary
            Constraint::Length(1), // Footer
        ])
        .split(size);

    let report = &app.report;

    // --- Header ---
    let header_block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(THEME.muted));
    let header_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(24),
            Constraint::Min(1),
            Constraint::Length(40),
        ])
        .split(main_layout[0]);

    let app_title = Paragraph::new(Span::styled(
        "CHARITY LEDGER",
        Style::default().fg(THEME.primary).add_modifier(Modifier::BOLD),
    ))
    .block(Block::default().padding(Padding::new(0, 0, 1, 0)));
    frame.render_widget(app_title, header_layout[0]);

    let title = format!(" {} · {} ", report.period.label(), report.granularity);
    let nav_text = Line::from(vec![
        Span::styled(" < ", Style::default().fg(if app.has_older() { THEME.text } else { THEME.muted })),
        Span::styled(title, Style::default().fg(THEME.text).add_modifier(Modifier::BOLD)),
        Span::styled(" > ", Style::default().fg(if app.has_newer() { THEME.text } else { THEME.muted })),
    ]);
    let nav = Paragraph::new(nav_text)
        .alignment(Alignment::Right)
        .block(Block::default().padding(Padding::new(0, 0, 1, 0)));
    frame.render_widget(nav, header_layout[2]);
    frame.render_widget(header_block, main_layout[0]);

    // --- Main content ---
    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(65),
            Constraint::Length(1),
            Constraint::Percentage(35),
        ])
        .split(main_layout[1]);

    draw_chart(frame, report, content_chunks[0]);
    draw_summary(frame, report, config, content_chunks[2]);

    // --- Footer ---
    let help = Line::from(vec![
        Span::styled("PERIOD: ", Style::default().fg(THEME.muted)),
        Span::styled("←/→ ", Style::default().fg(THEME.text)),
        Span::raw("  "),
        Span::styled("GRANULARITY: ", Style::default().fg(THEME.muted)),
        Span::styled("g ", Style::default().fg(THEME.text)),
        Span::raw("  "),
        Span::styled("QUIT: ", Style::default().fg(THEME.muted)),
        Span::styled("q", Style::default().fg(THEME.text)),
    ]);
    let footer = Paragraph::new(help)
        .alignment(Alignment::Center)
        .style(Style::default().fg(THEME.muted));
    frame.render_widget(footer, main_layout[2]);
}

fn draw_chart(frame: &mut Frame, report: &ReportViewModel, area: Rect) {
    let chart_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(THEME.muted))
        .title(" Income vs Expenses ");

    if report.trend.is_empty() {
        let empty = Paragraph::new("No sales or expenses this period")
            .alignment(Alignment::Center)
            .block(chart_block);
        frame.render_widget(empty, area);
        return;
    }

    // Bar values are whole cents
    let bar = |value: f64, color: Color| {
        Bar::default()
            .value((value.max(0.0) * 100.0).round() as u64)
            .style(Style::default().fg(color))
            .text_value(if value > 0.0 { format!("{:.0}", value) } else { String::new() })
    };

    let mut chart = BarChart::default()
        .block(chart_block)
        .bar_width(4)
        .bar_gap(0)
        .group_gap(2);
    for bucket in &report.trend {
        let bars = [
            bar(bucket.get(Field::Income), THEME.income),
            bar(bucket.get(Field::Expenses), THEME.expenses),
        ];
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(bucket.label.clone()))
                .bars(&bars),
        );
    }

    frame.render_widget(chart, area);
}

fn draw_summary(frame: &mut Frame, report: &ReportViewModel, config: &Config, area: Rect) {
    let totals = &report.totals;
    let balance_color = if totals.net_balance < 0.0 { THEME.expenses } else { THEME.income };
    let label = |text: &'static str| Span::styled(text, Style::default().fg(THEME.muted));

    let mut lines = vec![
        Line::from(vec![Span::styled("Money", Style::default().add_modifier(Modifier::BOLD))]),
        Line::from(vec![
            label("Income:    "),
            Span::styled(config.format_amount(totals.total_income), Style::default().fg(THEME.income)),
        ]),
        Line::from(vec![
            label("Expenses:  "),
            Span::styled(config.format_amount(totals.total_expenses), Style::default().fg(THEME.expenses)),
        ]),
        Line::from(vec![
            label("Net:       "),
            Span::styled(
                config.format_amount(totals.net_balance),
                Style::default().fg(balance_color).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled("Activity", Style::default().add_modifier(Modifier::BOLD))]),
        Line::from(vec![
            label("Volunteers: "),
            Span::raw(format!(
                "{:.1}h / {} sessions",
                report.volunteers.hours, report.volunteers.sessions
            )),
        ]),
        Line::from(vec![
            label("Trash:      "),
            Span::raw(format!(
                "{}B {}Y {}T",
                report.trash.blue_bags, report.trash.yellow_bags, report.trash.trips_to_landfill
            )),
        ]),
        Line::from(vec![
            label("Lending:    "),
            Span::raw(format!("{} out / {} back", report.lending.on_loan, report.lending.returned)),
        ]),
        Line::from(vec![
            label("Gifted:     "),
            Span::raw(format!("{} items", report.gifted.items)),
        ]),
    ];

    if !totals.expenses_by_category.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![Span::styled(
            "Expenses by category",
            Style::default().add_modifier(Modifier::BOLD),
        )]));
        for (category, amount) in &totals.expenses_by_category {
            lines.push(Line::from(vec![
                Span::styled(format!("{:<12}", category), Style::default().fg(THEME.muted)),
                Span::raw(config.format_amount(*amount)),
            ]));
        }
    }

    let summary = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(THEME.muted))
            .title(" Summary "),
    );
    frame.render_widget(summary, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use charity_core::model::record::{Record, Sale};
    use charity_core::FileRecordRepository;
    use chrono::{NaiveDate, Utc};
    use tempfile::TempDir;
    use uuid::Uuid;

    fn sale(y: i32, m: u32, d: u32, amount: f64) -> Record {
        Record::Sale(Sale {
            id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            item_name: "Mirror".to_string(),
            amount,
            created_at: Utc::now(),
        })
    }

    #[test]
    fn test_navigation_stays_within_available_periods() {
        let dir = TempDir::new().unwrap();
        let repo = FileRecordRepository::new(dir.path().to_path_buf()).unwrap();
        repo.insert(sale(2024, 1, 5, 10.0)).unwrap();
        repo.insert(sale(2024, 2, 5, 20.0)).unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let periods = ReportUseCase::new(&repo).periods(today).unwrap();
        let latest = periods[0];
        let mut app = ReportApp::new(&repo, periods, latest, Granularity::Monthly).unwrap();
        assert_eq!(app.report.totals.total_income, 20.0);

        app.newer().unwrap();
        assert_eq!(app.index, 0);

        app.older().unwrap();
        assert_eq!(app.report.period, Period::new(2024, 1).unwrap());
        assert_eq!(app.report.totals.total_income, 10.0);

        app.older().unwrap();
        assert_eq!(app.index, 1);

        app.cycle_granularity().unwrap();
        assert_eq!(app.report.granularity, Granularity::Daily);
        assert_eq!(app.report.trend[0].label, "2024-01-05");
    }

    #[test]
    fn test_opens_on_requested_month_without_data() {
        let dir = TempDir::new().unwrap();
        let repo = FileRecordRepository::new(dir.path().to_path_buf()).unwrap();
        repo.insert(sale(2024, 2, 5, 20.0)).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let periods = ReportUseCase::new(&repo).periods(today).unwrap();

        let requested = Period::new(2023, 6).unwrap();
        let mut app = ReportApp::new(&repo, periods.clone(), requested, Granularity::Monthly).unwrap();
        assert_eq!(app.report.period, requested);
        assert_eq!(app.periods, vec![Period::new(2024, 2).unwrap(), requested]);
        assert!(app.report.is_empty());

        app.newer().unwrap();
        assert_eq!(app.report.period, Period::new(2024, 2).unwrap());

        let between = Period::new(2025, 1).unwrap();
        let app = ReportApp::new(&repo, periods, between, Granularity::Monthly).unwrap();
        assert_eq!(app.index, 0);
        assert_eq!(app.periods[1], Period::new(2024, 2).unwrap());
    }
}
