use crate::app::App;
use crate::speedtest::TestPhase;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

// Color Palette - Elegant & Minimal
const ACCENT: Color = Color::Rgb(100, 149, 237);      // Cornflower blue
const SUCCESS: Color = Color::Rgb(134, 194, 156);     // Soft green
const SUCCESS_DIM: Color = Color::Rgb(80, 120, 90);
const INFO: Color = Color::Rgb(147, 180, 220);        // Soft blue
const INFO_DIM: Color = Color::Rgb(90, 110, 140);
const WARN: Color = Color::Rgb(220, 180, 130);        // Soft amber
const WARN_DIM: Color = Color::Rgb(130, 110, 80);
const TEXT_PRIMARY: Color = Color::Rgb(230, 230, 230);
const TEXT_SECONDARY: Color = Color::Rgb(160, 160, 160);
const TEXT_MUTED: Color = Color::Rgb(100, 100, 100);
const BORDER: Color = Color::Rgb(60, 60, 65);
const BORDER_ACTIVE: Color = Color::Rgb(100, 100, 110);

/// Scale and labelling of one gauge.
#[derive(Debug, Clone, Copy)]
pub struct GaugeSpec {
    pub phase: TestPhase,
    pub label: &'static str,
    pub unit: &'static str,
    pub max_value: u32,
    color: Color,
    dim_color: Color,
}

pub const PING_GAUGE: GaugeSpec = GaugeSpec {
    phase: TestPhase::Ping,
    label: "Ping Speed",
    unit: "ms",
    max_value: 3000,
    color: WARN,
    dim_color: WARN_DIM,
};

pub const DOWNLOAD_GAUGE: GaugeSpec = GaugeSpec {
    phase: TestPhase::Download,
    label: "Download Speed",
    unit: "Mbps",
    max_value: 1000,
    color: SUCCESS,
    dim_color: SUCCESS_DIM,
};

pub const UPLOAD_GAUGE: GaugeSpec = GaugeSpec {
    phase: TestPhase::Upload,
    label: "Upload Speed",
    unit: "Mbps",
    max_value: 1000,
    color: INFO,
    dim_color: INFO_DIM,
};

pub fn draw_ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(9),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .split(frame.area());

    draw_header(frame, chunks[0], app);
    draw_intro(frame, chunks[1]);
    draw_gauges(frame, chunks[2], app);
    draw_start_button(frame, chunks[3], app);
    draw_help(frame, chunks[4], app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(BORDER));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::horizontal([
        Constraint::Length(12),
        Constraint::Min(10),
        Constraint::Length(20),
    ])
    .split(inner);

    let title = Paragraph::new("speedgauge")
        .style(Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD));
    frame.render_widget(title, chunks[0]);

    let (status, color) = match app.session.phase {
        TestPhase::Idle => ("Ready", TEXT_MUTED),
        TestPhase::Ping => ("Measuring latency...", WARN),
        TestPhase::Download => ("Testing download...", SUCCESS),
        TestPhase::Upload => ("Testing upload...", INFO),
    };

    frame.render_widget(
        Paragraph::new(status)
            .style(Style::default().fg(color))
            .alignment(Alignment::Center),
        chunks[1],
    );

    frame.render_widget(
        Paragraph::new(create_phase_text(app.session.phase)).alignment(Alignment::Right),
        chunks[2],
    );
}

fn create_phase_text(phase: TestPhase) -> Line<'static> {
    let phases = [
        (TestPhase::Ping, "ping"),
        (TestPhase::Download, "down"),
        (TestPhase::Upload, "up"),
    ];

    let mut spans = Vec::new();

    for (i, (p, label)) in phases.iter().enumerate() {
        let is_active = phase == *p;
        let is_complete = match phase {
            TestPhase::Download => *p == TestPhase::Ping,
            TestPhase::Upload => *p == TestPhase::Ping || *p == TestPhase::Download,
            _ => false,
        };

        let style = if is_active {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else if is_complete {
            Style::default().fg(TEXT_SECONDARY)
        } else {
            Style::default().fg(TEXT_MUTED)
        };

        spans.push(Span::styled(*label, style));

        if i < phases.len() - 1 {
            spans.push(Span::styled(" / ", Style::default().fg(TEXT_MUTED)));
        }
    }

    Line::from(spans)
}

fn draw_intro(frame: &mut Frame, area: Rect) {
    let text = vec![
        Line::styled(
            "Test Your Internet Speed",
            Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD),
        ),
        Line::styled(
            "Ping time in milliseconds, download and upload speed in Megabits per second (Mbps)",
            Style::default().fg(TEXT_SECONDARY),
        ),
    ];

    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_gauges(frame: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::vertical([
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
    ])
    .split(area);

    let session = &app.session;
    let readings = [
        (&PING_GAUGE, session.ping_ms),
        (&DOWNLOAD_GAUGE, session.download_mbps),
        (&UPLOAD_GAUGE, session.upload_mbps),
    ];

    for (row, (spec, value)) in rows.iter().zip(readings) {
        draw_gauge(frame, *row, spec, value, app.is_active(spec.phase));
    }
}

fn draw_gauge(frame: &mut Frame, area: Rect, spec: &GaugeSpec, value: u32, active: bool) {
    let border_color = if active { BORDER_ACTIVE } else { BORDER };
    let title_style = if active {
        Style::default().fg(spec.color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(TEXT_SECONDARY)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled(format!(" {} ", spec.label), title_style));

    let fill = if active { spec.color } else { spec.dim_color };
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(fill).bg(Color::Reset))
        .use_unicode(true)
        .ratio(gauge_ratio(value, spec.max_value))
        .label(Span::styled(
            format_reading(value, spec.unit),
            Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD),
        ));

    frame.render_widget(gauge, area);
}

fn draw_start_button(frame: &mut Frame, area: Rect, app: &App) {
    let style = if app.session.is_running {
        Style::default().fg(TEXT_MUTED)
    } else {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.session.is_running { BORDER } else { BORDER_ACTIVE }));

    let width = area.width.min(24);
    let button_area = Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    };

    frame.render_widget(
        Paragraph::new(app.start_label())
            .style(style)
            .alignment(Alignment::Center)
            .block(block),
        button_area,
    );
}

fn draw_help(frame: &mut Frame, area: Rect, app: &App) {
    let help = if app.session.is_running {
        "q quit"
    } else {
        "enter start · q quit"
    };

    frame.render_widget(
        Paragraph::new(help)
            .style(Style::default().fg(TEXT_MUTED))
            .alignment(Alignment::Center),
        area,
    );
}

// Helpers
pub fn gauge_ratio(value: u32, max_value: u32) -> f64 {
    if max_value == 0 {
        return 0.0;
    }
    (value as f64 / max_value as f64).clamp(0.0, 1.0)
}

fn format_reading(value: u32, unit: &str) -> String {
    format!("{} {}", value, unit)
}
