use crate::constants::SECONDS_PER_YEAR;
use crate::diffusion_solver::DiffusionSolver;
use crate::sim::RunnerState;
use crate::sim::sim_op::{SavePoint, SimOp, SimOpHandle};
use colored::Colorize;

/// Console Reporter Operator
///
/// Prints a progress line every `report_interval` save points with the
/// simulation time and the temperatures of the recorded monitors.
#[derive(Debug, Clone)]
pub struct ConsoleReporterOp {
    pub name: String,
    pub report_interval: usize, // Report every N save points
    pub show_monitors: bool,
}

impl ConsoleReporterOp {
    pub fn new(report_interval: usize) -> Self {
        Self {
            name: "ConsoleReporterOp".to_string(),
            report_interval: report_interval.max(1),
            show_monitors: true,
        }
    }

    pub fn handle(report_interval: usize) -> SimOpHandle {
        SimOpHandle::new(Box::new(Self::new(report_interval)))
    }

    fn should_report(&self, point: &SavePoint) -> bool {
        (point.index + 1) % self.report_interval == 0 || point.index + 1 == point.total
    }

    fn format_monitors(&self, solver: &DiffusionSolver) -> String {
        solver
            .history()
            .iter()
            .filter_map(|p| {
                p.latest()
                    .map(|(_, t)| format!("({},{},{}) {:.1}°C", p.index[0], p.index[1], p.index[2], t))
            })
            .collect::<Vec<_>>()
            .join("  ")
    }
}

impl SimOp for ConsoleReporterOp {
    fn name(&self) -> &str {
        &self.name
    }

    fn init_sim(&mut self, solver: &DiffusionSolver) {
        let (nx, ny, nz) = solver.domain().shape();
        println!(
            "{} {}x{}x{} grid, κ = {:.2e} m²/s, center {:.1}°C",
            "▶ starting run:".bold(),
            nx,
            ny,
            nz,
            solver.properties().diffusivity_m2_s,
            solver.center_temperature()
        );
    }

    fn update_sim(&mut self, solver: &DiffusionSolver, point: &SavePoint) {
        if !self.should_report(point) {
            return;
        }
        let years = point.time / SECONDS_PER_YEAR;
        let line = format!(
            "[{:>3}%] t = {:.3e} s ({:.2} yr)  center {:.1}°C",
            point.progress,
            point.time,
            years,
            solver.center_temperature()
        );
        println!("{}", line.cyan());
        if self.show_monitors && !solver.history().is_empty() {
            println!("       {}", self.format_monitors(solver).dimmed());
        }
    }

    fn after_sim(&mut self, solver: &DiffusionSolver, state: RunnerState) {
        let summary = format!("{:?} at t = {:.3e} s", state, solver.current_time());
        match state {
            RunnerState::Completed => println!("✅ {}", summary.green()),
            RunnerState::Failed => println!("❌ {}", summary.red()),
            _ => println!("⏹  {}", summary.yellow()),
        }
    }
}
