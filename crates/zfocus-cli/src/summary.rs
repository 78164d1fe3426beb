use console::Style;
use zfocus_core::autofocus::{AutofocusConfig, Evaluation, FocusOutcome, StrategyReport};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    warning: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            warning: Style::new().bold().yellow(),
        }
    }
}

/// Shape and z layout of the stack served by the simulator.
pub struct StackInfo {
    pub slices: usize,
    pub width: usize,
    pub height: usize,
    pub z_first: f64,
    pub z_step: f64,
}

impl StackInfo {
    pub fn z_last(&self) -> f64 {
        self.z_first + self.z_step * self.slices.saturating_sub(1) as f64
    }

    pub fn center_z(&self) -> f64 {
        (self.z_first + self.z_last()) / 2.0
    }
}

pub fn print_focus_summary(config: &AutofocusConfig, stack: &StackInfo, start_z: f64) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("zfocus Autofocus"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(16)));
    println!();

    println!("  {}", s.header.apply_to("Stack"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Slices"),
        s.value.apply_to(format!("{} x {}x{}", stack.slices, stack.width, stack.height))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("z range"),
        s.value.apply_to(format!(
            "{:.3} .. {:.3} um (step {} um)",
            stack.z_first,
            stack.z_last(),
            stack.z_step
        ))
    );
    println!();

    println!("  {}", s.header.apply_to("Search"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Metric"),
        s.method.apply_to(config.metric)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Strategy"),
        s.method.apply_to(config.strategy)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Crop"),
        s.value.apply_to(format!("{:.0}%", config.crop_factor * 100.0))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Start z"),
        s.value.apply_to(format!("{start_z:.3} um"))
    );
    println!();
}

pub fn print_outcome(outcome: &FocusOutcome) {
    let s = Styles::new();

    println!("  {}", s.header.apply_to("Result"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Best z"),
        s.value.apply_to(format!("{:.3} um", outcome.best_z))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Score"),
        s.value.apply_to(format!("{:.6}", outcome.best_score))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Images"),
        s.value.apply_to(outcome.image_count())
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Time"),
        s.value.apply_to(format!("{:.2?}", outcome.elapsed))
    );

    let (mean, rel_std) = outcome.score_spread();
    println!(
        "    {:<12}{}",
        s.label.apply_to("Spread"),
        s.value.apply_to(format!("mean {mean:.4}, rel. std {:.2}%", rel_std * 100.0))
    );

    match &outcome.report {
        StrategyReport::Grid(g) => {
            if g.at_boundary {
                println!(
                    "    {:<12}{}",
                    s.label.apply_to("Note"),
                    s.warning.apply_to("best z is at the edge of the fine scan")
                );
            }
        }
        StrategyReport::Brent(b) => {
            println!(
                "    {:<12}{}",
                s.label.apply_to("Iterations"),
                s.value.apply_to(b.iterations)
            );
        }
    }

    if !outcome.confident {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Confidence"),
            s.warning.apply_to("low, no clear focus peak found")
        );
    }
    println!();
}

pub fn print_evaluations(evaluations: &[Evaluation]) {
    println!(
        "{:>5}  {:>10}  {:>14}  {:>10}  {:>10}  {:>10}",
        "#", "z (um)", "Score", "Move", "Capture", "Score t"
    );
    println!("{}", "-".repeat(70));
    for e in evaluations {
        println!(
            "{:>5}  {:>10.3}  {:>14.6}  {:>10.2?}  {:>10.2?}  {:>10.2?}",
            e.sequence, e.z, e.score, e.move_time, e.capture_time, e.score_time
        );
    }
}
