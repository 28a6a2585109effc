//! Console output for benchmark runs

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mmlu_eval_metrics::{RunSummary, SubjectResult};
use mmlu_eval_workflow::{format_subject_line, format_summary_lines};
use std::io::Write;

/// Progress bar over the subjects of a run.
pub struct SubjectProgress {
    bar: ProgressBar,
}

impl SubjectProgress {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Self { bar }
    }

    /// Print the subject line above the bar and advance it.
    pub fn subject_done(&self, result: &SubjectResult) {
        self.report(&mut std::io::stdout(), result);
    }

    /// The line is written even when the bar is hidden.
    fn report<W: Write>(&self, out: &mut W, result: &SubjectResult) {
        self.bar.suspend(|| {
            if let Err(e) = writeln!(out, "{}", format_subject_line(result)) {
                tracing::warn!(error = %e, "Failed to print subject line");
            }
        });
        self.bar.set_message(result.subject.clone());
        self.bar.inc(1);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

pub fn print_summary(summary: &RunSummary) {
    for line in format_summary_lines(summary) {
        match line.split_once(": ") {
            Some((label, value)) => println!("{} {}", format!("{}:", label).bold(), value),
            None => println!("{}", line),
        }
    }
}
