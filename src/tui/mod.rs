//! Headless terminal UI (TUI) onboarding wizard.
//!
//! - Centered "wizard window" frame titled "LendBridge Onboarding"
//! - Left banner panel with ASCII logo
//! - Main content panel with one page per wizard step
//! - Bottom button row: [ Back ] [ Next ] [ Cancel ]
//! - Modal confirmations (Cancel, BVN record comparison)
//!
//! Note: Logging is file-only in TUI mode (stdout logging is disabled) to
//! avoid corrupting the terminal UI.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use log::info;
use ratatui::backend::{CrosstermBackend, TestBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::models::fields::Field;
use crate::models::state::Channel;
use crate::persistence::WizardStore;
use crate::wizard::engine::BvnComparison;
use crate::wizard::{Step, StepOutcome, WizardEngine, WizardError};

const ASCII_LOGO: &str = r#" _                   _ ____       _     _
| |    ___ _ __   __| | __ ) _ __(_) __| | __ _  ___
| |   / _ \ '_ \ / _` |  _ \| '__| |/ _` |/ _` |/ _ \
| |__|  __/ | | | (_| | |_) | |  | | (_| | (_| |  __/
|_____\___|_| |_|\__,_|____/|_|  |_|\__,_|\__, |\___|
                                          |___/      "#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Welcome,
    Form(Step),
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Inputs,
    Back,
    Next,
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
enum Modal {
    ConfirmCancel,
    Message { title: String, body: String },
    BvnCompare(BvnComparison),
}

#[derive(Debug, Clone)]
struct InputField {
    label: String,
    value: String,
    /// Checkbox-style input toggled with Space.
    toggle: bool,
    field: Option<Field>,
}

struct UiState {
    page: Page,
    inputs: Vec<InputField>,
    selected: usize,
    focus: Focus,
    /// Some while an OTP challenge is pending for the current page.
    otp_input: Option<String>,
    banner: Option<String>,
    modal: Option<Modal>,
    busy: bool,
    completed_count: usize,
    quit: bool,
}

impl UiState {
    fn new(page: Page, inputs: Vec<InputField>) -> Self {
        Self {
            page,
            inputs,
            selected: 0,
            focus: Focus::Inputs,
            otp_input: None,
            banner: None,
            modal: None,
            busy: false,
            completed_count: 0,
            quit: false,
        }
    }
}

fn input_for(field: Field, value: String) -> InputField {
    InputField {
        label: field.label().to_string(),
        value,
        toggle: matches!(field, Field::TermsAccepted),
        field: Some(field),
    }
}

/// Build the input list for a step from the live field values. The selfie
/// page takes an image file path instead of the raw data URI.
fn build_inputs(step: Step, engine: &WizardEngine<ApiClient>) -> Vec<InputField> {
    if step == Step::Selfie {
        let status = if engine.state().fields.selfie_data_uri.is_empty() {
            String::new()
        } else {
            "(captured)".to_string()
        };
        return vec![InputField {
            label: "Selfie image file (JPEG/PNG path)".to_string(),
            value: status,
            toggle: false,
            field: None,
        }];
    }
    step.fields()
        .iter()
        .map(|&f| input_for(f, engine.state().fields.get(f)))
        .collect()
}

fn page_for(engine: &WizardEngine<ApiClient>) -> Page {
    Page::Form(engine.current_step())
}

// =========================
// Entry points
// =========================

/// Interactive wizard loop.
pub fn run(config: &AppConfig) -> Result<()> {
    let api = ApiClient::new(&config.api)?;
    let store = WizardStore::open_default()?;
    let loan_bounds = (config.loan.min_amount, config.loan.max_amount);
    let mut engine = WizardEngine::new(api, store, loan_bounds)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut terminal = setup_terminal()?;
    let result = run_loop(&mut terminal, &mut engine, &rt);
    restore_terminal(&mut terminal)?;
    result
}

/// Non-interactive smoke mode: render a single frame for one page on an
/// in-memory backend so CI/tooling can exercise the draw path without a
/// real terminal.
pub fn smoke(target: &str) -> Result<()> {
    info!(
        "[PHASE: tui] [STEP: smoke] Rendering single-frame TUI smoke target={}",
        target
    );

    let t = target.trim().to_ascii_lowercase();
    let state = smoke_state(t.as_str());

    let backend = TestBackend::new(100, 32);
    let mut terminal = Terminal::new(backend)?;
    terminal.draw(|f| draw(f, &state))?;
    Ok(())
}

fn smoke_state(target: &str) -> UiState {
    let sample = |step: Step| -> Vec<InputField> {
        step.fields()
            .iter()
            .map(|&f| {
                let value = match f {
                    Field::FirstName => "Ada".to_string(),
                    Field::LastName => "Obi".to_string(),
                    Field::PhoneNumber => "08031234567".to_string(),
                    Field::Email => "ada@example.com".to_string(),
                    Field::LoanAmount => "100000".to_string(),
                    Field::LoanTenureMonths => "6".to_string(),
                    _ => String::new(),
                };
                input_for(f, value)
            })
            .collect()
    };

    let mut state = match target {
        "welcome" => UiState::new(Page::Welcome, vec![]),
        "personal" => UiState::new(Page::Form(Step::Personal), sample(Step::Personal)),
        "phone" => {
            let mut s = UiState::new(Page::Form(Step::Phone), sample(Step::Phone));
            s.otp_input = Some("123".to_string());
            s
        }
        "email" => UiState::new(Page::Form(Step::Email), sample(Step::Email)),
        "identity" => UiState::new(Page::Form(Step::Identity), sample(Step::Identity)),
        "address" => UiState::new(Page::Form(Step::Address), sample(Step::Address)),
        "bvn" => UiState::new(Page::Form(Step::Bvn), sample(Step::Bvn)),
        "banking" => UiState::new(Page::Form(Step::Banking), sample(Step::Banking)),
        "employment" => UiState::new(Page::Form(Step::Employment), sample(Step::Employment)),
        "selfie" => UiState::new(Page::Form(Step::Selfie), sample(Step::Selfie)),
        "loan" => UiState::new(Page::Form(Step::Loan), sample(Step::Loan)),
        "complete" => UiState::new(Page::Complete, vec![]),
        _ => UiState::new(Page::Welcome, vec![]),
    };
    state.completed_count = 3;
    state
}

// =========================
// Terminal plumbing
// =========================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    engine: &mut WizardEngine<ApiClient>,
    rt: &tokio::runtime::Runtime,
) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let resumed = engine.state().completed_steps.len();
    let mut state = if resumed > 0 {
        let mut s = UiState::new(page_for(engine), build_inputs(engine.current_step(), engine));
        s.banner = Some("Resumed a saved session.".to_string());
        s
    } else {
        UiState::new(Page::Welcome, vec![])
    };
    state.completed_count = resumed;

    while !state.quit {
        terminal.draw(|f| draw(f, &state))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_millis(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut state, engine, rt, key.code);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
    Ok(())
}

// =========================
// Input handling
// =========================

fn handle_key(
    state: &mut UiState,
    engine: &mut WizardEngine<ApiClient>,
    rt: &tokio::runtime::Runtime,
    code: KeyCode,
) {
    if state.modal.is_some() {
        handle_modal_key(state, engine, code);
        return;
    }

    match state.page {
        Page::Welcome => match code {
            KeyCode::Enter => {
                state.page = page_for(engine);
                state.inputs = build_inputs(engine.current_step(), engine);
                state.selected = 0;
                state.focus = Focus::Inputs;
            }
            KeyCode::Esc => state.modal = Some(Modal::ConfirmCancel),
            _ => {}
        },
        Page::Complete => {
            if matches!(code, KeyCode::Enter | KeyCode::Esc) {
                state.quit = true;
            }
        }
        Page::Form(step) => handle_form_key(state, engine, rt, step, code),
    }
}

fn handle_form_key(
    state: &mut UiState,
    engine: &mut WizardEngine<ApiClient>,
    rt: &tokio::runtime::Runtime,
    step: Step,
    code: KeyCode,
) {
    // OTP entry takes over the keyboard while a challenge is pending.
    if let Some(otp) = state.otp_input.as_mut() {
        match code {
            KeyCode::Char(c) if c.is_ascii_digit() && otp.len() < 6 => {
                otp.push(c);
                state.banner = None;
            }
            KeyCode::Backspace => {
                otp.pop();
            }
            KeyCode::Enter => {
                let entered = otp.clone();
                match engine.submit_otp(&entered) {
                    Ok(StepOutcome::Advanced) => {
                        state.otp_input = None;
                        sync_page(state, engine);
                    }
                    Ok(_) => {}
                    Err(e) => state.banner = Some(e.to_string()),
                }
            }
            KeyCode::Esc => {
                // Abandon the challenge; the step stays unverified.
                state.otp_input = None;
            }
            _ => {}
        }
        return;
    }

    match code {
        KeyCode::Esc => state.modal = Some(Modal::ConfirmCancel),
        KeyCode::Tab => {
            state.focus = match state.focus {
                Focus::Inputs => Focus::Back,
                Focus::Back => Focus::Next,
                Focus::Next => Focus::Cancel,
                Focus::Cancel => Focus::Inputs,
            };
        }
        KeyCode::Up if state.focus == Focus::Inputs => {
            state.selected = state.selected.saturating_sub(1);
        }
        KeyCode::Down if state.focus == Focus::Inputs => {
            if state.selected + 1 < state.inputs.len() {
                state.selected += 1;
            }
        }
        KeyCode::Left if state.focus != Focus::Inputs => {
            state.focus = match state.focus {
                Focus::Next => Focus::Back,
                Focus::Cancel => Focus::Next,
                other => other,
            };
        }
        KeyCode::Right if state.focus != Focus::Inputs => {
            state.focus = match state.focus {
                Focus::Back => Focus::Next,
                Focus::Next => Focus::Cancel,
                other => other,
            };
        }
        KeyCode::Enter => match state.focus {
            Focus::Back => do_back(state, engine),
            Focus::Next | Focus::Inputs => do_next(state, engine, rt, step),
            Focus::Cancel => state.modal = Some(Modal::ConfirmCancel),
        },
        KeyCode::Char(' ') if state.focus == Focus::Inputs => {
            if let Some(input) = state.inputs.get_mut(state.selected) {
                if input.toggle {
                    let next = if input.value == "true" { "false" } else { "true" };
                    input.value = next.to_string();
                    write_input(state, engine);
                } else {
                    push_char(state, engine, ' ');
                }
            }
        }
        KeyCode::Char(c) if state.focus == Focus::Inputs => push_char(state, engine, c),
        KeyCode::Backspace if state.focus == Focus::Inputs => {
            if let Some(input) = state.inputs.get_mut(state.selected) {
                if !input.toggle {
                    input.value.pop();
                    write_input(state, engine);
                }
            }
        }
        _ => {}
    }
}

fn push_char(state: &mut UiState, engine: &mut WizardEngine<ApiClient>, c: char) {
    if let Some(input) = state.inputs.get_mut(state.selected) {
        if input.toggle {
            return;
        }
        input.value.push(c);
        state.banner = None;
        write_input(state, engine);
    }
}

/// Mirror the selected input into the engine (which persists on change).
/// The selfie path input is local to the UI until Next converts it.
fn write_input(state: &mut UiState, engine: &mut WizardEngine<ApiClient>) {
    if let Some(input) = state.inputs.get(state.selected) {
        if let Some(field) = input.field {
            if let Err(e) = engine.set_field(field, &input.value) {
                state.banner = Some(e.to_string());
            }
        }
    }
}

fn do_back(state: &mut UiState, engine: &mut WizardEngine<ApiClient>) {
    if engine.current_step() == Step::Personal {
        state.page = Page::Welcome;
        return;
    }
    if let Err(e) = engine.handle_back() {
        state.banner = Some(e.to_string());
        return;
    }
    sync_page(state, engine);
}

fn do_next(
    state: &mut UiState,
    engine: &mut WizardEngine<ApiClient>,
    rt: &tokio::runtime::Runtime,
    step: Step,
) {
    if state.busy {
        return;
    }

    // Convert the selfie file path into the stored data URI before dispatch.
    if step == Step::Selfie {
        if let Some(input) = state.inputs.first() {
            let path = input.value.trim();
            if !path.is_empty() && path != "(captured)" {
                match std::fs::read(path) {
                    Ok(bytes) => {
                        let mime = if path.to_ascii_lowercase().ends_with(".png") {
                            "image/png"
                        } else {
                            "image/jpeg"
                        };
                        let uri = crate::utils::data_uri::encode(mime, &bytes);
                        if let Err(e) = engine.set_field(Field::SelfieDataUri, &uri) {
                            state.banner = Some(e.to_string());
                            return;
                        }
                    }
                    Err(e) => {
                        state.banner = Some(format!("Could not read image file: {}", e));
                        return;
                    }
                }
            }
        }
    }

    state.busy = true;
    let outcome = rt.block_on(engine.handle_next());
    state.busy = false;

    match outcome {
        Ok(StepOutcome::Advanced) => sync_page(state, engine),
        Ok(StepOutcome::AwaitingOtp(channel)) => {
            state.otp_input = Some(String::new());
            state.banner = Some(format!(
                "We sent a 6-digit code to your {}",
                match channel {
                    Channel::Phone => "phone",
                    Channel::Email => "email address",
                    Channel::Bvn => "record",
                }
            ));
        }
        Ok(StepOutcome::BvnMismatch(cmp)) => {
            state.modal = Some(Modal::BvnCompare(cmp));
        }
        Ok(StepOutcome::Finished) => {
            state.page = Page::Complete;
            state.inputs.clear();
        }
        Err(WizardError::Validation(errors)) => {
            state.banner = errors.first().map(|e| e.message.clone());
        }
        Err(e @ WizardError::Duplicate(_)) => {
            state.modal = Some(Modal::Message {
                title: "Already registered".to_string(),
                body: format!(
                    "{}\n\nIf this is your account, please contact support\ninstead of registering again.\n\nPress Enter to continue.",
                    e
                ),
            });
        }
        Err(e) => state.banner = Some(e.to_string()),
    }
}

fn sync_page(state: &mut UiState, engine: &mut WizardEngine<ApiClient>) {
    state.page = page_for(engine);
    state.inputs = build_inputs(engine.current_step(), engine);
    state.selected = 0;
    state.focus = Focus::Inputs;
    state.banner = None;
    state.completed_count = engine.state().completed_steps.len();
}

fn handle_modal_key(state: &mut UiState, engine: &mut WizardEngine<ApiClient>, code: KeyCode) {
    let modal = state.modal.clone();
    match modal {
        Some(Modal::ConfirmCancel) => match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                state.quit = true;
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                // Explicit reset: wipe the saved session before leaving.
                if let Err(e) = engine.reset() {
                    state.banner = Some(e.to_string());
                }
                state.quit = true;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => state.modal = None,
            _ => {}
        },
        Some(Modal::Message { .. }) => {
            if matches!(code, KeyCode::Enter | KeyCode::Esc) {
                state.modal = None;
            }
        }
        Some(Modal::BvnCompare(_)) => {
            if matches!(code, KeyCode::Enter | KeyCode::Esc) {
                state.modal = None;
                // The engine already routed back to the personal details
                // step; reflect that in the UI.
                sync_page(state, engine);
            }
        }
        None => {}
    }
}

// =========================
// Rendering
// =========================

fn draw(f: &mut Frame, state: &UiState) {
    let area = f.size();
    let window = centered_rect(area, 96, 30);

    let outer = Block::default()
        .title(" LendBridge Onboarding ")
        .borders(Borders::ALL);
    f.render_widget(outer, window);

    let inner = shrink(window, 1);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(40)])
        .split(inner);

    draw_banner(f, columns[0], state);
    draw_content(f, columns[1], state);

    if let Some(modal) = &state.modal {
        draw_modal(f, area, modal);
    }
}

fn draw_banner(f: &mut Frame, area: Rect, state: &UiState) {
    let mut lines: Vec<Line> = ASCII_LOGO.lines().map(Line::from).collect();
    lines.push(Line::from(""));
    lines.push(Line::from(format!(
        "Progress: {}/{} steps",
        state.completed_count,
        Step::COUNT
    )));
    let banner = Paragraph::new(lines)
        .block(Block::default().borders(Borders::RIGHT))
        .wrap(Wrap { trim: false });
    f.render_widget(banner, area);
}

fn draw_content(f: &mut Frame, area: Rect, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(6),
            Constraint::Length(2),
            Constraint::Length(1),
        ])
        .split(area);

    let title = match state.page {
        Page::Welcome => "Welcome".to_string(),
        Page::Complete => "Application submitted".to_string(),
        Page::Form(step) => format!("Step {} of {}: {}", step.index(), Step::COUNT, step.title()),
    };
    f.render_widget(
        Paragraph::new(title).style(Style::default().add_modifier(Modifier::BOLD)),
        rows[0],
    );

    match state.page {
        Page::Welcome => {
            let body = Paragraph::new(
                "This wizard guides you through opening a microloan account:\n\
                 identity, contact verification, BVN check, banking and\n\
                 employment details, a selfie, and your loan request.\n\n\
                 Your progress is saved after every answer; you can close\n\
                 this window and resume later.\n\n\
                 Press Enter to begin.",
            )
            .wrap(Wrap { trim: false });
            f.render_widget(body, rows[1]);
        }
        Page::Complete => {
            let body = Paragraph::new(
                "Your loan application has been submitted.\n\n\
                 You will be contacted once a decision has been made.\n\
                 Press Enter to close.",
            )
            .wrap(Wrap { trim: false });
            f.render_widget(body, rows[1]);
        }
        Page::Form(_) => draw_inputs(f, rows[1], state),
    }

    if let Some(banner) = &state.banner {
        f.render_widget(
            Paragraph::new(banner.as_str()).style(Style::default().fg(Color::Red)),
            rows[2],
        );
    } else if state.busy {
        f.render_widget(
            Paragraph::new("Working...").style(Style::default().fg(Color::Yellow)),
            rows[2],
        );
    }

    if matches!(state.page, Page::Form(_)) {
        draw_buttons(f, rows[3], state);
    }
}

fn draw_inputs(f: &mut Frame, area: Rect, state: &UiState) {
    let mut lines: Vec<Line> = Vec::new();

    for (i, input) in state.inputs.iter().enumerate() {
        let marker = if state.focus == Focus::Inputs && i == state.selected {
            "> "
        } else {
            "  "
        };
        let rendered = if input.toggle {
            let mark = if input.value == "true" { "x" } else { " " };
            format!("{}[{}] {}", marker, mark, input.label)
        } else {
            format!("{}{}: {}", marker, input.label, input.value)
        };
        let style = if state.focus == Focus::Inputs && i == state.selected {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::styled(rendered, style));
    }

    if let Some(otp) = &state.otp_input {
        lines.push(Line::from(""));
        lines.push(Line::styled(
            format!("Enter the 6-digit code: {}", otp),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
        lines.push(Line::from("(Enter to confirm, Esc to go back)"));
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn draw_buttons(f: &mut Frame, area: Rect, state: &UiState) {
    let button = |label: &str, focused: bool| {
        if focused {
            format!("[ {} ]", label.to_uppercase())
        } else {
            format!("[ {} ]", label)
        }
    };
    let row = format!(
        "{}   {}   {}",
        button("Back", state.focus == Focus::Back),
        button("Next", state.focus == Focus::Next),
        button("Cancel", state.focus == Focus::Cancel),
    );
    f.render_widget(Paragraph::new(row).alignment(Alignment::Center), area);
}

fn draw_modal(f: &mut Frame, area: Rect, modal: &Modal) {
    let (title, body) = match modal {
        Modal::ConfirmCancel => (
            " Leave the wizard? ".to_string(),
            "Your progress is saved and will resume next time.\n\n\
             [Y] leave   [R] reset and leave   [N] stay"
                .to_string(),
        ),
        Modal::Message { title, body } => (format!(" {} ", title), body.clone()),
        Modal::BvnCompare(cmp) => {
            let row = |label: &str, c: &crate::wizard::engine::FieldComparison| {
                format!(
                    "{:<14} you: {:<20} record: {:<20} {}",
                    label,
                    c.entered,
                    c.authoritative,
                    if c.matches { "match" } else { "MISMATCH" }
                )
            };
            (
                " BVN record does not match ".to_string(),
                format!(
                    "{}\n{}\n{}\n{}\n\n\
                     Your name must match the BVN record. You have been\n\
                     taken back to step 1 to correct your details.\n\n\
                     Press Enter to continue.",
                    row("First name", &cmp.first_name),
                    row("Last name", &cmp.last_name),
                    row("Phone", &cmp.phone_number),
                    row("Date of birth", &cmp.date_of_birth),
                ),
            )
        }
    };

    let popup = centered_rect(area, 80, 14);
    f.render_widget(Clear, popup);
    let block = Block::default().title(title).borders(Borders::ALL);
    f.render_widget(
        Paragraph::new(body)
            .block(block)
            .wrap(Wrap { trim: false }),
        popup,
    );
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(w)) / 2,
        y: area.y + (area.height.saturating_sub(h)) / 2,
        width: w,
        height: h,
    }
}

fn shrink(area: Rect, by: u16) -> Rect {
    Rect {
        x: area.x + by,
        y: area.y + by,
        width: area.width.saturating_sub(by * 2),
        height: area.height.saturating_sub(by * 2),
    }
}
