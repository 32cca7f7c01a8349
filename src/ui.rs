//! Terminal output helpers — spinner and colored status lines.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::marketplace::{Job, JobStatus};

/// Visual progress for a settlement exchange in the terminal.
pub struct SettlementProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl SettlementProgress {
    pub fn start(job_title: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(format!("settling payment: {job_title}"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow().bold(),
        }
    }

    pub fn settled(&self, transaction: &str) {
        self.pb.finish_with_message(format!(
            "{} payment settled ({transaction})",
            self.green.apply_to("✔")
        ));
    }

    pub fn payment_required(&self) {
        self.pb.finish_with_message(format!(
            "{} payment required — challenge issued",
            self.yellow.apply_to("…")
        ));
    }

    pub fn failed(&self, reason: &str) {
        self.pb
            .finish_with_message(format!("{} {reason}", self.red.apply_to("✘")));
    }
}

/// One colored line per job for the status listing.
pub fn job_line(job: &Job) -> String {
    let style = match job.status {
        JobStatus::Open => Style::new().cyan(),
        JobStatus::Claimed | JobStatus::Delivered => Style::new().yellow(),
        JobStatus::Approved => Style::new().magenta(),
        JobStatus::Paid => Style::new().green(),
        JobStatus::Disputed => Style::new().red(),
    };
    format!(
        "[{}] {} — {} (poster {}{})",
        style.apply_to(job.status),
        job.title,
        job.reward,
        job.poster,
        job.worker
            .as_deref()
            .map(|w| format!(", worker {w}"))
            .unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn job_line_includes_status_title_and_reward() {
        let now = Utc::now();
        let job = Job {
            id: None,
            title: "Design a logo".into(),
            description: String::new(),
            reward: "25 USDT".into(),
            poster: "@bob".into(),
            poster_address: None,
            worker: Some("@alice".into()),
            worker_address: None,
            status: JobStatus::Claimed,
            tags: vec![],
            source_url: None,
            delivery_proof: None,
            created_at: now,
            updated_at: now,
            payment_tx: None,
            paid_by: None,
        };
        let line = job_line(&job);
        assert!(line.contains("claimed"));
        assert!(line.contains("Design a logo"));
        assert!(line.contains("25 USDT"));
        assert!(line.contains("worker @alice"));
    }
}
