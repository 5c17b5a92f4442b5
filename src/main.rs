fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Deterministic wizard contract proof mode (for automated verification).
    // Writes `wizard_contract_smoke_transcript.log` under the log folder and exits 0/1.
    if args.iter().any(|a| a == "--wizard-contract-smoke") {
        onboarding_wizard::run_wizard_contract_smoke();
        return;
    }

    // Non-interactive TUI smoke test mode (for automated checks).
    // Renders a single frame for a specific page and exits 0.
    // Usage: --tui-smoke or --tui-smoke=welcome|personal|phone|email|identity|address|bvn|banking|employment|selfie|loan|complete
    if let Some(arg) = args
        .iter()
        .find(|a| a.as_str() == "--tui-smoke" || a.starts_with("--tui-smoke="))
    {
        let target = arg
            .split_once('=')
            .map(|(_, v)| v.to_string())
            .filter(|v| !v.trim().is_empty());
        onboarding_wizard::run_tui_smoke(target);
        return;
    }

    onboarding_wizard::run_tui();
}
