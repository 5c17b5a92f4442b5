// LendBridge onboarding wizard
// Headless terminal wizard for microloan customer onboarding.

pub mod api;
pub mod config;
pub mod models;
pub mod persistence;
pub mod tui;
pub mod utils;
pub mod wizard;

use log::{error, info};
use std::path::Path;

/// Initialize logging system with dual format (JSON + human-readable)
fn init_logging(with_stdout: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = utils::path_resolver::resolve_log_folder()?;
    std::fs::create_dir_all(&log_dir)?;

    let timestamp = chrono::Utc::now().format("%Y-%m-%d-%H%M%S");

    // JSON log file for structured parsing
    let json_log_file = log_dir.join(format!("onboarding-{}.log", timestamp));

    // Human-readable log file (.txt)
    let txt_log_file = log_dir.join(format!("onboarding-{}.txt", timestamp));

    // Configure dual-format logging:
    // - JSON format to .log file
    // - Human-readable format to .txt file
    // - Optional: human-readable to stdout (disabled for TUI to avoid corrupting the terminal UI)
    let mut dispatch = fern::Dispatch::new().level(log::LevelFilter::Debug);

    if with_stdout {
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}", txt_line));
                })
                .chain(std::io::stdout()),
        );
    }

    dispatch = dispatch
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_utc = chrono::Utc::now().to_rfc3339();
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let json_line = utils::logging::format_json_log(
                        &timestamp_utc,
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}\n", json_line));
                })
                .chain(fern::log_file(json_log_file)?),
        )
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}\n", txt_line));
                })
                .chain(fern::log_file(txt_log_file)?),
        );

    dispatch.apply()?;

    log::info!(
        "[PHASE: initialization] Logging initialized, log directory: {:?}",
        log_dir
    );
    Ok(())
}

/// Headless terminal UI wizard.
pub fn run_tui() {
    // Initialize logging (no stdout to avoid corrupting the TUI)
    if let Err(e) = init_logging(false) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!(
        "[PHASE: initialization] Onboarding TUI starting at {}",
        chrono::Utc::now()
    );

    let config = match config::AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!(
                "[PHASE: initialization] [STEP: config] Failed to load configuration: {:?}",
                e
            );
            eprintln!("Onboarding error: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "[PHASE: initialization] [STEP: config] API base: {}",
        config.api.base_url
    );

    if let Err(e) = tui::run(&config) {
        error!("[PHASE: tui] [STEP: fatal] TUI exited with error: {:?}", e);
        eprintln!("Onboarding error: {}", e);
    }
}

/// Non-interactive TUI smoke mode (for automated checks).
/// Renders a single frame for one page on an in-memory backend and exits 0/1.
pub fn run_tui_smoke(target: Option<String>) {
    // Initialize logging (no stdout to avoid corrupting the terminal)
    if let Err(e) = init_logging(false) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!(
        "[PHASE: initialization] Headless TUI smoke starting at {}",
        chrono::Utc::now()
    );

    let target = target.as_deref().unwrap_or("welcome");
    if let Err(e) = tui::smoke(target) {
        error!(
            "[PHASE: tui] [STEP: smoke] TUI smoke exited with error: {:?}",
            e
        );
        eprintln!("Onboarding error: {}", e);
        std::process::exit(1);
    }
}

/// Deterministic wizard contract proof runner (for automated verification / log capture).
/// Writes `wizard_contract_smoke_transcript.log` under the log folder and exits 0/1.
pub fn run_wizard_contract_smoke() {
    if let Err(e) = init_logging(false) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!(
        "[PHASE: initialization] Wizard contract smoke starting at {}",
        chrono::Utc::now()
    );

    let log_dir = match utils::path_resolver::resolve_log_folder() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to resolve log folder: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = wizard_contract_smoke(&log_dir) {
        error!(
            "[PHASE: contract] [STEP: smoke] Smoke exited with error: {:?}",
            e
        );
        eprintln!("Onboarding error: {}", e);
        std::process::exit(1);
    }
}

/// Offline proof of the wizard's deterministic contracts: loan economics,
/// per-step validation scoping, step sequencing, save/reload, and
/// verification invalidation. No network access.
fn wizard_contract_smoke(log_dir: &Path) -> anyhow::Result<()> {
    use models::fields::{Field, RegistrationFields};
    use models::state::{Channel, WizardState};
    use wizard::sequencer::{JumpOutcome, Sequencer};
    use wizard::steps::Step;
    use wizard::{quote, validator};

    let mut transcript: Vec<String> = Vec::new();
    let mut check = |name: &str, ok: bool, detail: String| -> anyhow::Result<()> {
        let line = format!("{} - {}: {}", if ok { "OK" } else { "FAIL" }, name, detail);
        info!("[PHASE: contract] [STEP: {}] {}", name, line);
        transcript.push(line);
        if ok {
            Ok(())
        } else {
            Err(anyhow::anyhow!("contract check failed: {}", name))
        }
    };

    // Loan economics reference figures.
    let q = quote::compute(100_000.0, 0.5, 6);
    check(
        "loan_quote",
        q.total_amount == 190_000.0 && q.installment == 31_666.67,
        format!("total={} installment={}", q.total_amount, q.installment),
    )?;

    // Validation is scoped to the declared fields of a step.
    let mut fields = RegistrationFields::default();
    fields.phone_number = "08031234567".to_string();
    let bounds = (10_000.0, 5_000_000.0);
    let errors = validator::validate_fields(Step::Phone.fields(), &fields, bounds);
    check(
        "validator_scope",
        errors.is_empty(),
        format!("phone step errors={}", errors.len()),
    )?;
    let errors = validator::validate_fields(Step::Personal.fields(), &fields, bounds);
    check(
        "validator_required",
        errors.len() == Step::Personal.fields().len(),
        format!("personal step errors={}", errors.len()),
    )?;

    // Sequencing: forward jumps over unfinished work are gated.
    let mut seq = Sequencer::new(Step::COUNT);
    seq.advance();
    let gated = seq.jump_to(5) == JumpOutcome::NeedsCurrentStep;
    let free_back = {
        seq.advance();
        seq.jump_to(1) == JumpOutcome::Moved
    };
    check(
        "sequencer_gating",
        gated && free_back,
        format!("gated={} free_back={}", gated, free_back),
    )?;

    // Persistence round-trip in a scratch directory.
    let scratch = std::env::temp_dir().join(format!("onboarding-contract-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&scratch)?;
    let store = persistence::WizardStore::new(scratch.clone());
    let mut state = WizardState::new();
    state.fields.first_name = "Ada".to_string();
    state.current_step = 3;
    state.completed_steps.insert(1);
    state.completed_steps.insert(2);
    state
        .verification
        .channel_mut(Channel::Phone)
        .mark_verified("08031234567");
    store.save(&state)?;
    let restored = store.load()?;
    let round_trip = restored.as_ref() == Some(&state);
    store.clear()?;
    let cleared = store.load()?.is_none();
    std::fs::remove_dir_all(&scratch)?;
    check(
        "persistence_round_trip",
        round_trip && cleared,
        format!("round_trip={} cleared={}", round_trip, cleared),
    )?;

    // Changing a verified contact value voids its verification.
    let mut state = WizardState::new();
    state.fields.phone_number = "08031234567".to_string();
    state
        .verification
        .channel_mut(Channel::Phone)
        .mark_verified("08031234567");
    state.apply_field_change(Field::PhoneNumber, "08099999999", Some(Step::Phone.index()));
    let invalidated = !state.verification.channel(Channel::Phone).verified;
    check(
        "verification_invalidation",
        invalidated,
        format!("invalidated={}", invalidated),
    )?;

    std::fs::create_dir_all(log_dir)?;
    let transcript_path = log_dir.join("wizard_contract_smoke_transcript.log");
    std::fs::write(&transcript_path, transcript.join("\n") + "\n")?;
    info!(
        "[PHASE: contract] [STEP: transcript] Wrote {:?}",
        transcript_path
    );
    Ok(())
}
