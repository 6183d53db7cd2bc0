//! Example: Headless Session
//!
//! Demonstrates: the calculator page driven without a browser, against a
//! local Python worker (needs `python3` with SymPy and NumPy)
//!
//! Run with: `cargo run --example headless_session [config.yaml]`

use symcalc::logging;
use symcalc::prelude::*;
use symcalc::ui::page::ids;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => CalculatorConfig::from_yaml_str(&std::fs::read_to_string(path)?)?,
        None => CalculatorConfig::default(),
    };
    logging::init(config.verbosity);

    println!("=== Headless Session Example ===\n");

    let charter = RecordingCharter::new();
    let presenter = Presenter::new(RecordingTypesetter::new(), charter.clone(), config.locale);
    let engine = ProcessEngine::new(config.python.clone());
    let controller = Controller::new(MockDom::calculator_page(), engine, presenter, config);

    println!("1. Starting engine session...");
    controller.start().await?;
    println!("   ready: {}", controller.is_ready());

    println!("\n2. Integrating x**2 over [0, 2]...");
    controller.dispatch(DomEvent::input(ids::INTEGRAND, "x**2")).await;
    controller.dispatch(DomEvent::input(ids::LOWER_BOUND, "0")).await;
    controller.dispatch(DomEvent::input(ids::UPPER_BOUND, "2")).await;
    let outcome = controller.dispatch(DomEvent::click(ids::CALCULATE)).await;
    report(&controller, &charter, outcome);

    println!("\n3. Differentiating sin(x)*x...");
    controller
        .dispatch(DomEvent::select_mode(CalculationMode::Differentiation))
        .await;
    controller.dispatch(DomEvent::input(ids::DERIVAND, "sin(x)*x")).await;
    let outcome = controller.dispatch(DomEvent::click(ids::CALCULATE)).await;
    report(&controller, &charter, outcome);

    Ok(())
}

fn report(
    controller: &Controller<MockDom>,
    charter: &RecordingCharter,
    outcome: Option<TriggerOutcome>,
) {
    println!("   outcome: {outcome:?}");
    println!(
        "   result:  {}",
        controller
            .page()
            .get_inner_html(ids::RESULT)
            .unwrap_or_default()
    );
    for series in charter.current_plot().unwrap_or_default() {
        println!("   series {:<6} {} points", series.name, series.len());
    }
}
