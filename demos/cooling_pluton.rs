// Cools a pluton with latent heat and a convection cell on a worker thread,
// printing progress from the notification channel.

use geotherm_rust::config::SimulationConfig;
use geotherm_rust::sim::sim_op::{ConsoleReporterOp, SliceRecorderOp};
use geotherm_rust::sim::{Notification, SimulationRunner};
use geotherm_rust::grid::Axis;
use geotherm_rust::GeothermResult;

const CONFIG: &str = r#"{
    "domain": { "nx": 40, "ny": 40, "nz": 40, "dx": 10.0, "dy": 10.0, "dz": 10.0 },
    "material": {
        "background_temp_c": 20.0,
        "magma_temp_c": 1200.0,
        "use_latent_heat": true,
        "latent_heat": { "solidus_c": 700.0, "liquidus_c": 1200.0, "latent_heat_j_kg": 400000.0 }
    },
    "intrusion": { "kind": "pluton", "radius": 80.0 },
    "flow": { "kind": "convection_cell", "max_velocity": 1e-8 },
    "boundary": "background",
    "time": { "duration": 3.0e9, "save_interval": 3.0e8 }
}"#;

fn main() -> GeothermResult<()> {
    env_logger::init();

    let config = SimulationConfig::from_json_str(CONFIG)?;
    let [cx, _, _] = config.domain.center_index();
    let (recorder, frames) = SliceRecorderOp::handle(Axis::X, cx);

    let handle = SimulationRunner::from_config(&config)?
        .with_op(ConsoleReporterOp::handle(2))
        .with_op(recorder)
        .spawn()?;

    while let Ok(notification) = handle.notifications().recv() {
        match notification {
            Notification::Progress(p) => print!("{}% ", p),
            Notification::Temperature(t) => println!("(center {:.1} °C)", t),
            Notification::Completed(times) => {
                println!("done, {} recorded times", times.len());
                break;
            }
            Notification::Failed { message, .. } => {
                println!("failed: {}", message);
                break;
            }
        }
    }

    let outcome = handle.join()?;
    println!("\n🔥 monitor histories");
    for point in &outcome.history {
        let (t, temp) = point.latest().unwrap_or((0.0, f64::NAN));
        println!(
            "   {:?}: {} samples, last {:.1} °C at {:.2e} s",
            point.index,
            point.len(),
            temp,
            t
        );
    }
    println!("   {} x-slices recorded at i = {}", frames.len(), cx);
    Ok(())
}
