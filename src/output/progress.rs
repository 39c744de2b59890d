use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_red, bright_yellow};

/// Progress tracking for the three harvest phases
pub struct PhaseProgress {
    pb: ProgressBar,
}

impl PhaseProgress {
    pub fn start_phase_1() -> Self {
        eprintln!("{}  {}", bright("⚙️"), bright("Phases").underlined());
        let pb = create_spinner(bright_yellow("Phase 1/3: Discovering workflow runs").to_string());
        Self { pb }
    }

    pub fn finish_phase_1_start_phase_2(self, run_count: usize) -> Self {
        self.pb.finish_with_message(
            bright_green(format!("Phase 1/3: Discovered {run_count} runs ✓")).to_string(),
        );
        let pb = create_spinner(bright_yellow("Phase 2/3: Enumerating jobs").to_string());
        Self { pb }
    }

    pub fn finish_phase_2_start_phase_3(self, job_count: usize) -> Self {
        self.pb.finish_with_message(
            bright_green(format!("Phase 2/3: Enumerated {job_count} jobs ✓")).to_string(),
        );
        let pb = create_spinner(bright_yellow("Phase 3/3: Downloading logs").to_string());
        Self { pb }
    }

    pub fn finish_phase_3(self, saved: usize) {
        self.pb.finish_with_message(
            bright_green(format!("Phase 3/3: Saved {saved} logs ✓")).to_string(),
        );
        eprintln!("\n");
    }

    /// Stops the current phase early.
    pub fn abandon(self, reason: &str) {
        self.pb.abandon_with_message(bright_red(reason).to_string());
        eprintln!("\n");
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
