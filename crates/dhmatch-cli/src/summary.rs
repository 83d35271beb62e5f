use console::Style;
use dhmatch_core::config::{CorrelatorMethod, MatchConfig, SubpixelMethod};
use dhmatch_core::matcher::Displacement;

struct Styles {
    title: Style,
    label: Style,
    value: Style,
    method: Style,
    good: Style,
    bad: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            good: Style::new().green(),
            bad: Style::new().red(),
        }
    }
}

pub fn print_config_summary(config: &MatchConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("dhmatch"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(7)));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Correlator"),
        s.method.apply_to(&config.correlator)
    );
    print_correlator_params(&s, &config.correlator);
    println!(
        "  {:<14}{}",
        s.label.apply_to("Sub-pixel"),
        s.method.apply_to(&config.subpixel)
    );
    if let SubpixelMethod::Surface(refiner) = &config.subpixel {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Radius"),
            s.value.apply_to(refiner.radius())
        );
    }
    println!();
}

fn print_correlator_params(s: &Styles, method: &CorrelatorMethod) {
    let param = |name: &str, value: String| {
        println!("    {:<12}{}", s.label.apply_to(name), s.value.apply_to(value));
    };
    match method {
        CorrelatorMethod::AmplitudeCompensated(c) => param("Cutoff", format!("{}", c.cutoff)),
        CorrelatorMethod::RobustCorrelation(c) => param("Exponents", format!("{:?}", c.exponents)),
        CorrelatorMethod::GaussianTransformedPhase(c) => param("Sigma", format!("{}", c.sigma)),
        CorrelatorMethod::CosiCorr(c) => {
            param(
                "Beta",
                format!("{} / {}", c.beta_reference, c.beta_search),
            );
            param("Threshold", format!("{}", c.threshold));
            param("Passes", format!("{}", c.passes));
        }
        _ => {}
    }
}

pub fn print_displacement(d: &Displacement) {
    let s = Styles::new();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Displacement"),
        s.value.apply_to(format!("di = {:+.4}  dj = {:+.4}", d.di, d.dj))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Integer peak"),
        s.value.apply_to(format!("({}, {})", d.integer.0, d.integer.1))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Score"),
        s.value.apply_to(format!("{:.4}  (SNR {:.2})", d.score, d.snr))
    );
}

/// Styled error magnitude: green below `tolerance`, red above.
pub fn styled_error(error: f64, tolerance: f64) -> String {
    let s = Styles::new();
    let text = format!("{:.4}", error);
    if error <= tolerance {
        s.good.apply_to(text).to_string()
    } else {
        s.bad.apply_to(text).to_string()
    }
}
