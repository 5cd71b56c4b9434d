//! Run-local decision trace
//!
//! Every line is kept in order for the final report and mirrored to `tracing`.

use tracing::{debug, warn};

#[derive(Debug, Default, Clone)]
pub struct SimulationLog {
    lines: Vec<String>,
}

impl SimulationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, depth: usize, message: impl Into<String>) {
        let line = indent(depth, message.into());
        debug!(target: "prun_planner::trace", "{}", line.trim_start());
        self.lines.push(line);
    }

    pub fn warn(&mut self, depth: usize, message: impl Into<String>) {
        let line = indent(depth, format!("WARNING: {}", message.into()));
        warn!(target: "prun_planner::trace", "{}", line.trim_start());
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

fn indent(depth: usize, message: String) -> String {
    if depth == 0 {
        message
    } else {
        format!("{}{}", "  ".repeat(depth), message)
    }
}
