// Evaluates the three closed-form bodies stored in a parameter store and
// prints a short summary of each profile.

use geotherm_rust::analytical::{AnalyticalGeometry, AnalyticalParams, Profile, solve};
use geotherm_rust::constants::SECONDS_PER_YEAR;
use geotherm_rust::parameter_store::ParameterStore;
use geotherm_rust::GeothermResult;

fn main() -> GeothermResult<()> {
    env_logger::init();

    let times: Vec<f64> = [1.0, 10.0, 100.0, 1000.0].iter().map(|y| y * SECONDS_PER_YEAR).collect();
    let mut store = ParameterStore::new();

    let mut sill = AnalyticalParams::new(AnalyticalGeometry::Tabular, 1150.0, 25.0, times.clone());
    sill.gradient = 0.03;
    sill.depth = 2000.0;
    store.add_or_update("sill", sill);

    let mut pluton = AnalyticalParams::new(AnalyticalGeometry::Spherical, 900.0, 500.0, times.clone());
    pluton.magma_conductivity = 2.0;
    pluton.magma_diffusivity = 8e-7;
    pluton.gradient = 0.025;
    pluton.depth = 5000.0;
    store.add_or_update("pluton", pluton);

    let mut plug = AnalyticalParams::new(AnalyticalGeometry::Plug, 1100.0, 50.0, times);
    plug.d2 = Some(120.0);
    store.add_or_update("plug", plug);

    for id in store.ids() {
        let Some(params) = store.params_for_plot(id) else {
            continue;
        };
        let result = solve(&params)?;
        println!("🪨 {} ({}), Tbg = {:.1} °C", id, result.geometry.label(), result.background_temperature);
        if let Some(tc) = result.contact_temperature {
            println!("   initial contact temperature {:.1} °C", tc);
        }
        for entry in &result.profiles {
            let samples = match &entry.profile {
                Profile::Line { x, .. } => x.len(),
                Profile::Surface { temperature, .. } => temperature.len(),
            };
            println!(
                "   {:>7.0} yr: max {:>7.1} °C, min {:>6.1} °C over {} samples",
                entry.time / SECONDS_PER_YEAR,
                entry.profile.max_temperature(),
                entry.profile.min_temperature(),
                samples
            );
        }
    }

    println!("\n{}", store.to_json()?);
    Ok(())
}
