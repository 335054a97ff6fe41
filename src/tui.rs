use crate::activity::ActivityClock;
use crate::app::{App, Flow};
use crate::notify::Notice;
use crate::tracker::MonitorState;
use anyhow::Result;
use chrono::{Duration, Local};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread;
use std::time::{Duration as StdDuration, Instant};

const BUTTON_WIDTH: u16 = 20;
const NOTICE_MIN_WIDTH: u16 = 30;
const NOTICE_MAX_WIDTH: u16 = 60;
const NOTICE_MIN_HEIGHT: u16 = 6;
const NOTICE_MAX_HEIGHT: u16 = 16;
const NOTICE_MARGIN: u16 = 1;

/// Signals fed into the event loop from outside the terminal.
pub struct Inputs {
    pub clock: Arc<ActivityClock>,
    pub listener_errors: Receiver<String>,
    pub close_requested: Arc<AtomicBool>,
}

pub fn run_tui(app: &mut App, inputs: &Inputs) -> Result<Flow> {
    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_loop(&mut terminal, app, inputs);

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    inputs: &Inputs,
) -> Result<Flow> {
    let mut next_tick = Instant::now();

    loop {
        terminal.draw(|f| draw(f, app))?;

        if event::poll(StdDuration::from_millis(100))? {
            let area = terminal.size()?;
            handle_event(app, event::read()?, area, &inputs.clock, Instant::now());
        }

        let now = Instant::now();
        apply_inputs(app, inputs, now);
        app.on_activity(inputs.clock.last());
        app.presenter.expire(now);

        if now >= next_tick {
            next_tick += app.config.tick;
            if app.on_tick(now, inputs.clock.last()) == Flow::Shutdown {
                terminal.draw(|f| draw(f, app))?;
                thread::sleep(app.config.final_pause);
                return Ok(Flow::Shutdown);
            }
        }
    }
}

/// Picks up SIGINT close requests and input hook failures.
fn apply_inputs(app: &mut App, inputs: &Inputs, now: Instant) {
    if inputs.close_requested.swap(false, Ordering::Relaxed) {
        app.request_close();
    }
    if let Ok(reason) = inputs.listener_errors.try_recv() {
        app.report_listener_failure(&reason, now);
    }
}

pub fn handle_event(app: &mut App, event: Event, area: Rect, clock: &ActivityClock, now: Instant) {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            clock.touch_at(now);
            if app.close_warning {
                app.acknowledge_warning();
                return;
            }
            match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => app.confirm_active(now),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    app.request_close()
                }
                KeyCode::Char('q') | KeyCode::Esc => app.request_close(),
                _ => {}
            }
        }
        Event::Mouse(mouse) => {
            clock.touch_at(now);
            if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
                return;
            }
            if app.close_warning {
                app.acknowledge_warning();
                return;
            }
            let on_notice = app
                .presenter
                .current()
                .is_some_and(|n| hit(notice_rect(area, n), mouse.column, mouse.row));
            if on_notice {
                app.presenter.dismiss();
            } else if hit(screen_layout(area).button, mouse.column, mouse.row) {
                app.confirm_active(now);
            }
        }
        _ => {}
    }
}

fn hit(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.right() && row >= rect.y && row < rect.bottom()
}

struct Screen {
    header: Rect,
    instructions: Rect,
    countdown: Rect,
    button: Rect,
    status: Rect,
    footer: Rect,
}

fn screen_layout(area: Rect) -> Screen {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(6), // Instructions
            Constraint::Length(3), // Countdown
            Constraint::Length(3), // Button
            Constraint::Length(3), // Status
            Constraint::Min(0),
            Constraint::Length(3), // Footer
        ])
        .split(area);

    let row = chunks[3];
    let width = BUTTON_WIDTH.min(row.width);
    let button = Rect::new(row.x + (row.width - width) / 2, row.y, width, row.height);

    Screen {
        header: chunks[0],
        instructions: chunks[1],
        countdown: chunks[2],
        button,
        status: chunks[4],
        footer: chunks[6],
    }
}

pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.size();
    let screen = screen_layout(area);

    draw_header(frame, screen.header, app);
    draw_instructions(frame, screen.instructions, app);
    draw_countdown(frame, screen.countdown, app);
    draw_button(frame, screen.button, app);
    draw_status(frame, screen.status, app);
    draw_footer(frame, screen.footer);

    if let Some(notice) = app.presenter.current() {
        draw_notice(frame, area, notice);
    }
    if app.close_warning {
        draw_close_warning(frame, area);
    }
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let status = match app.tracker.state() {
        MonitorState::Active => Span::styled(
            "ACTIVE",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        MonitorState::CountingDown { .. } => Span::styled(
            "COUNTING DOWN",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        MonitorState::ShuttingDown => Span::styled(
            "SHUTTING DOWN",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
        ),
    };

    let now_local = Local::now();
    let mut header_spans = vec![
        Span::styled(
            " Idle Shutdown ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        status,
        Span::raw(" | "),
        Span::raw(now_local.format("%Y-%m-%d %H:%M:%S").to_string()),
    ];

    if let Some(deadline) = app.tracker.deadline() {
        let left = deadline.saturating_duration_since(Instant::now());
        let at = now_local + Duration::from_std(left).unwrap_or_else(|_| Duration::zero());
        header_spans.push(Span::raw(" | Shutdown at: "));
        header_spans.push(Span::styled(
            at.format("%H:%M:%S").to_string(),
            Style::default().fg(Color::Magenta),
        ));
    }

    let header = Paragraph::new(Line::from(header_spans))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn draw_instructions(frame: &mut Frame, area: Rect, app: &App) {
    let text = format!(
        "This program will shut down your computer if no mouse or keyboard \
         activity is detected for {}, followed by no button click for {}. \
         Click the button below to prevent shutdown.",
        humantime::format_duration(app.config.inactivity_threshold),
        humantime::format_duration(app.config.shutdown_grace),
    );
    let block = Block::default()
        .title(Span::styled(
            " Inactivity Shutdown Controller ",
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    let para = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(para, area);
}

fn draw_countdown(frame: &mut Frame, area: Rect, app: &App) {
    let color = if app.remaining.is_some() {
        Color::Red
    } else {
        Color::Green
    };
    let para = Paragraph::new(Span::styled(
        app.countdown_text(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(para, area);
}

fn draw_button(frame: &mut Frame, area: Rect, app: &App) {
    let style = if app.button_enabled() {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let button = Paragraph::new("I'm Active!")
        .style(style)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(style));
    frame.render_widget(button, area);
}

fn draw_status(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        app.status_text(),
        match app.tracker.state() {
            MonitorState::Active => Style::default(),
            MonitorState::CountingDown { .. } => Style::default().fg(Color::Yellow),
            MonitorState::ShuttingDown => Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        },
    )];
    if app.listener_failed {
        spans.push(Span::styled(
            " (global input hook unavailable)",
            Style::default().fg(Color::Red),
        ));
    }
    let para = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    frame.render_widget(para, area);
}

fn draw_footer(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new("Enter/Space or click: I'm Active! | This window cannot be closed")
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(help, area);
}

/// Top-right placement sized to the message, kept inside `area`.
pub fn notice_rect(area: Rect, notice: &Notice) -> Rect {
    let longest = notice
        .message
        .lines()
        .map(|l| l.chars().count())
        .chain(std::iter::once(notice.title.chars().count()))
        .max()
        .unwrap_or(0);
    let wanted = (longest as u16).saturating_add(4);
    let width = wanted
        .clamp(NOTICE_MIN_WIDTH, NOTICE_MAX_WIDTH)
        .min(area.width);

    let inner_width = width.saturating_sub(2).max(1) as usize;
    let wrapped: usize = notice
        .message
        .lines()
        .map(|l| l.chars().count().div_ceil(inner_width).max(1))
        .sum();
    // borders, blank line, dismiss hint
    let wanted = (wrapped as u16).saturating_add(4);
    let height = wanted
        .clamp(NOTICE_MIN_HEIGHT, NOTICE_MAX_HEIGHT)
        .min(area.height);

    let x = area
        .right()
        .saturating_sub(width + NOTICE_MARGIN)
        .max(area.x);
    let y = (area.y + NOTICE_MARGIN).min(area.bottom().saturating_sub(height));
    Rect::new(x, y, width, height)
}

fn draw_notice(frame: &mut Frame, area: Rect, notice: &Notice) {
    let palette = notice.severity.palette();
    let rect = notice_rect(area, notice);
    let body = Style::default().fg(palette.foreground).bg(palette.background);

    let mut lines: Vec<Line> = notice.message.lines().map(Line::raw).collect();
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "[ click to dismiss ]",
        body.add_modifier(Modifier::BOLD),
    ));

    let block = Block::default()
        .title(Span::styled(
            notice.title.as_str(),
            body.add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border).bg(palette.background))
        .style(body);
    let para = Paragraph::new(lines)
        .block(block)
        .style(body)
        .wrap(Wrap { trim: false });

    frame.render_widget(Clear, rect);
    frame.render_widget(para, rect);
}

fn draw_close_warning(frame: &mut Frame, area: Rect) {
    let width = 64.min(area.width);
    let height = 10.min(area.height);
    let rect = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );

    let text = vec![
        Line::raw("This program is designed to prevent accidental shutdowns."),
        Line::raw("It cannot be closed through the window controls."),
        Line::raw(""),
        Line::raw("To terminate the program, use your system's process manager"),
        Line::raw("or kill the process from another terminal."),
        Line::raw(""),
        Line::styled(
            "Press any key to continue",
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];
    let block = Block::default()
        .title(Span::styled(
            " Cannot Close ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let para = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(Clear, rect);
    frame.render_widget(para, rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::notify::{Presenter, Severity};
    use crossterm::event::{KeyEvent, MouseEvent};
    use ratatui::backend::TestBackend;
    use std::sync::mpsc;
    use std::time::Duration;

    fn setup_app() -> App {
        App::new(Config::default(), Presenter::new(Duration::from_secs(5)))
    }

    fn counting_app(t0: Instant) -> App {
        let mut app = setup_app();
        app.on_tick(t0 + Duration::from_secs(60), t0);
        app
    }

    fn rendered(app: &App) -> String {
        let backend = TestBackend::new(100, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn click(column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn area() -> Rect {
        Rect::new(0, 0, 100, 40)
    }

    #[test]
    fn test_draw_active() {
        let screen = rendered(&setup_app());
        assert!(screen.contains("System active"));
        assert!(screen.contains("I'm Active!"));
        assert!(screen.contains("Monitoring for inactivity..."));
        assert!(screen.contains("Inactivity Shutdown Controller"));
    }

    #[test]
    fn test_draw_countdown() {
        let t0 = Instant::now();
        let mut app = counting_app(t0);
        assert!(rendered(&app).contains("Inactivity Alert"));

        app.presenter.dismiss();
        let screen = rendered(&app);
        assert!(screen.contains("Time until shutdown: 03:00"));
        assert!(screen.contains("COUNTING DOWN"));
    }

    #[test]
    fn test_draw_close_warning() {
        let mut app = setup_app();
        app.request_close();
        assert!(rendered(&app).contains("Cannot Close"));
    }

    #[test]
    fn test_enter_confirms_activity() {
        let t0 = Instant::now();
        let mut app = counting_app(t0);
        let clock = ActivityClock::new(t0);
        let now = t0 + Duration::from_secs(70);

        handle_event(&mut app, key(KeyCode::Enter), area(), &clock, now);

        assert!(!app.button_enabled());
        assert_eq!(clock.last(), now);
        assert_eq!(
            app.presenter.current().map(|n| n.severity),
            Some(Severity::Success)
        );
    }

    #[test]
    fn test_close_keys_open_warning() {
        let clock = ActivityClock::new(Instant::now());
        let now = Instant::now();

        for event in [
            key(KeyCode::Char('q')),
            key(KeyCode::Esc),
            Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        ] {
            let mut app = setup_app();
            handle_event(&mut app, event, area(), &clock, now);
            assert!(app.close_warning);

            // Any key only dismisses the warning.
            handle_event(&mut app, key(KeyCode::Char('q')), area(), &clock, now);
            assert!(!app.close_warning);
        }
    }

    #[test]
    fn test_click_on_button_confirms() {
        let t0 = Instant::now();
        let mut app = counting_app(t0);
        app.presenter.dismiss();
        let clock = ActivityClock::new(t0);
        let button = screen_layout(area()).button;

        handle_event(
            &mut app,
            click(button.x + 1, button.y + 1),
            area(),
            &clock,
            t0 + Duration::from_secs(70),
        );

        assert!(!app.button_enabled());
        let notice = app.presenter.current().unwrap();
        assert_eq!(notice.title, "Activity Confirmed");
        assert_eq!(notice.severity, Severity::Success);
    }

    #[test]
    fn test_draw_final_shutdown_frame() {
        let t0 = Instant::now();
        let mut app = counting_app(t0);

        assert_eq!(app.on_tick(t0 + Duration::from_secs(240), t0), Flow::Shutdown);
        assert!(rendered(&app).contains("SYSTEM SHUTDOWN"));

        // Look under the final notice as well.
        app.presenter.dismiss();
        let screen = rendered(&app);
        assert!(screen.contains("Time until shutdown: 00:00"));
        assert!(screen.contains("Shutting down now due to inactivity."));
        assert!(screen.contains("SHUTTING DOWN"));
        assert!(!screen.contains("System active"));
        assert!(!screen.contains("Monitoring for inactivity"));

        let countdown = screen_layout(area()).countdown;
        let backend = TestBackend::new(100, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        let buffer = terminal.backend().buffer();
        let red = (countdown.x..countdown.right())
            .any(|x| buffer.get(x, countdown.y + 1).fg == Color::Red);
        assert!(red);
    }

    fn inputs() -> (Inputs, mpsc::Sender<String>) {
        let (tx, rx) = mpsc::channel();
        let inputs = Inputs {
            clock: Arc::new(ActivityClock::new(Instant::now())),
            listener_errors: rx,
            close_requested: Arc::new(AtomicBool::new(false)),
        };
        (inputs, tx)
    }

    #[test]
    fn test_apply_inputs_interrupt_opens_warning_once() {
        let mut app = setup_app();
        let (inputs, _tx) = inputs();
        let now = Instant::now();

        apply_inputs(&mut app, &inputs, now);
        assert!(!app.close_warning);

        inputs.close_requested.store(true, Ordering::Relaxed);
        apply_inputs(&mut app, &inputs, now);
        assert!(app.close_warning);
        assert!(!inputs.close_requested.load(Ordering::Relaxed));

        app.acknowledge_warning();
        apply_inputs(&mut app, &inputs, now);
        assert!(!app.close_warning);
    }

    #[test]
    fn test_apply_inputs_reports_listener_failure() {
        let mut app = setup_app();
        let (inputs, tx) = inputs();
        let now = Instant::now();

        tx.send("XOpenDisplay failed".to_string()).unwrap();
        apply_inputs(&mut app, &inputs, now);

        assert!(app.listener_failed);
        let notice = app.presenter.current().unwrap();
        assert_eq!(notice.title, "Input Monitor Failed");
        assert!(notice.message.contains("XOpenDisplay failed"));
        assert!(rendered(&app).contains("(global input hook unavailable)"));
    }

    #[test]
    fn test_click_on_notice_dismisses() {
        let t0 = Instant::now();
        let mut app = counting_app(t0);
        let clock = ActivityClock::new(t0);
        let rect = notice_rect(area(), app.presenter.current().unwrap());

        handle_event(&mut app, click(rect.x + 1, rect.y + 1), area(), &clock, t0);

        assert!(app.presenter.current().is_none());
        assert!(app.button_enabled());
    }

    #[test]
    fn test_notice_rect_fits_screen() {
        let notice = Notice {
            title: "URGENT".to_string(),
            message: "x".repeat(1000),
            severity: Severity::Urgent,
            expires_at: Instant::now(),
        };

        for area in [area(), Rect::new(0, 0, 20, 5), Rect::new(3, 2, 45, 12)] {
            let rect = notice_rect(area, &notice);
            assert!(rect.x >= area.x && rect.right() <= area.right());
            assert!(rect.y >= area.y && rect.bottom() <= area.bottom());
        }

        let rect = notice_rect(area(), &notice);
        assert_eq!(rect.width, NOTICE_MAX_WIDTH);
        assert_eq!(rect.height, NOTICE_MAX_HEIGHT);
        assert_eq!(rect.right(), area().right() - NOTICE_MARGIN);
    }

    #[test]
    fn test_notice_rect_grows_with_message() {
        let short = Notice {
            title: "Hi".to_string(),
            message: "ok".to_string(),
            severity: Severity::Info,
            expires_at: Instant::now(),
        };
        let long = Notice {
            message: "a somewhat longer line of text\n\nand a second paragraph".to_string(),
            ..short.clone()
        };

        let small = notice_rect(area(), &short);
        let big = notice_rect(area(), &long);
        assert_eq!(small.width, NOTICE_MIN_WIDTH);
        assert_eq!(small.height, NOTICE_MIN_HEIGHT);
        assert!(big.width > small.width);
        assert!(big.height > small.height);
    }
}
