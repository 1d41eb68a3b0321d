use crate::pointer::{SharedPointer, StdShared};
use crate::tracked::Tracked;
use anyhow::{ensure, Context, Result};
use shared_handle::SharedHandle;
use tracing::{debug, info, info_span};

type Run = fn() -> Result<()>;

/// One scenario from the manual drivers, instantiated for both pointers.
pub struct Scenario {
    pub name: &'static str,
    pub about: &'static str,
    shared: Run,
    std: Run,
}

/// Which implementation a run exercises.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Target {
    Shared,
    Std,
    Both,
}

macro_rules! scenario {
    ($name:literal, $f:ident, $about:literal) => {
        Scenario {
            name: $name,
            about: $about,
            shared: $f::<SharedHandle<Tracked>>,
            std: $f::<StdShared<Tracked>>,
        }
    };
}

pub static SCENARIOS: &[Scenario] = &[
    scenario!("basic", basic, "construct, access and mutate through the pointer"),
    scenario!("copy", copy, "copies share the count and the value"),
    scenario!("reset", reset, "reset to a new value, then to null"),
    scenario!("swap", swap, "swap exchanges values, counts unchanged"),
    scenario!("assign", assign, "assignment shares and drops the overwritten value"),
    scenario!("self-assign", self_assign, "assigning from the same binding changes nothing"),
    scenario!("null-construct", null_construct, "a null pointer counts 0"),
    scenario!("null-copy", null_copy, "copies of null count 0"),
    scenario!("assign-null-over-owned", assign_null_over_owned, "owned value dropped, target null"),
    scenario!("reset-null", reset_null, "reset to null from owned"),
    scenario!("assign-owned-over-null", assign_owned_over_null, "null target starts sharing"),
    scenario!("assign-null-over-null", assign_null_over_null, "both stay at 0"),
    scenario!("end-to-end", end_to_end, "copy, scope exit, reset to value, reset to null"),
];

pub fn find(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.name == name)
}

/// Runs `scenario` against the selected pointers. Each run must leave as many
/// `Tracked` instances alive as it found.
pub fn run(scenario: &Scenario, target: Target) -> Result<()> {
    if target != Target::Std {
        checked(
            scenario.name,
            <SharedHandle<Tracked> as SharedPointer<Tracked>>::NAME,
            scenario.shared,
        )?;
    }
    if target != Target::Shared {
        checked(
            scenario.name,
            <StdShared<Tracked> as SharedPointer<Tracked>>::NAME,
            scenario.std,
        )?;
    }
    Ok(())
}

fn checked(name: &str, pointer: &str, run: Run) -> Result<()> {
    let span = info_span!("scenario", name, pointer);
    let _enter = span.enter();
    let baseline = Tracked::live();
    run().with_context(|| format!("scenario `{}` failed on {}", name, pointer))?;
    let leaked = Tracked::live() - baseline;
    ensure!(
        leaked == 0,
        "scenario `{}` on {} left {} Tracked instances alive",
        name,
        pointer,
        leaked
    );
    info!("passed");
    Ok(())
}

fn expect_count<P: SharedPointer<Tracked>>(p: &P, label: &str, want: usize) -> Result<()> {
    let got = p.use_count();
    debug!(label, got, "use_count");
    ensure!(got == want, "{} use_count is {}, expected {}", label, got, want);
    Ok(())
}

fn expect_value<P: SharedPointer<Tracked>>(p: &P, label: &str, want: i32) -> Result<()> {
    ensure!(p.is_some(), "{} is null, expected value {}", label, want);
    let got = p.value();
    debug!(label, got, "value");
    ensure!(got == want, "{} value is {}, expected {}", label, got, want);
    Ok(())
}

fn expect_null<P: SharedPointer<Tracked>>(p: &P, label: &str) -> Result<()> {
    ensure!(!p.is_some(), "{} still owns value {}", label, p.value());
    expect_count(p, label, 0)
}

fn expect_live(want: isize) -> Result<()> {
    let got = Tracked::live();
    ensure!(got == want, "{} Tracked instances alive, expected {}", got, want);
    Ok(())
}

fn basic<P: SharedPointer<Tracked>>() -> Result<()> {
    let p = P::new(Tracked::new(1));
    info!(value = p.value(), count = p.use_count(), "constructed");
    expect_count(&p, "p", 1)?;
    p.set_value(10);
    expect_value(&p, "p", 10)
}

fn copy<P: SharedPointer<Tracked>>() -> Result<()> {
    let p1 = P::new(Tracked::new(3));
    {
        let p2 = p1.clone();
        info!(count = p1.use_count(), "copied");
        expect_count(&p1, "p1", 2)?;
        expect_count(&p2, "p2", 2)?;
        p2.set_value(30);
        expect_value(&p1, "p1", 30)?;
    }
    info!(count = p1.use_count(), "copy out of scope");
    expect_count(&p1, "p1", 1)
}

fn reset<P: SharedPointer<Tracked>>() -> Result<()> {
    let base = Tracked::live();
    let mut p = P::new(Tracked::new(5));
    p.reset_to(Tracked::new(50));
    info!(value = p.value(), count = p.use_count(), "reset to value");
    expect_value(&p, "p", 50)?;
    expect_count(&p, "p", 1)?;
    expect_live(base + 1)?;
    p.reset();
    info!(is_some = p.is_some(), "reset to null");
    expect_null(&p, "p")?;
    expect_live(base)
}

fn swap<P: SharedPointer<Tracked>>() -> Result<()> {
    let mut p1 = P::new(Tracked::new(7));
    let mut p2 = P::new(Tracked::new(8));
    info!(p1 = p1.value(), p2 = p2.value(), "before swap");
    p1.swap(&mut p2);
    info!(p1 = p1.value(), p2 = p2.value(), "after swap");
    expect_value(&p1, "p1", 8)?;
    expect_value(&p2, "p2", 7)?;
    expect_count(&p1, "p1", 1)?;
    expect_count(&p2, "p2", 1)
}

fn assign<P: SharedPointer<Tracked>>() -> Result<()> {
    let mut p1 = P::new(Tracked::new(11));
    let p2 = P::new(Tracked::new(12));
    let base = Tracked::live();
    info!(p1 = p1.use_count(), p2 = p2.use_count(), "counts before assign");
    p1.clone_from(&p2);
    info!(p1 = p1.use_count(), p2 = p2.use_count(), "counts after assign");
    expect_count(&p1, "p1", 2)?;
    expect_count(&p2, "p2", 2)?;
    expect_value(&p1, "p1", 12)?;
    expect_live(base - 1)
}

fn self_assign<P: SharedPointer<Tracked>>() -> Result<()> {
    let mut p = P::new(Tracked::new(15));
    info!(count = p.use_count(), "count before self-assign");
    let alias = p.clone();
    p.clone_from(&alias);
    drop(alias);
    info!(count = p.use_count(), "count after self-assign");
    expect_count(&p, "p", 1)?;
    expect_value(&p, "p", 15)
}

fn null_construct<P: SharedPointer<Tracked>>() -> Result<()> {
    let p = P::null();
    info!(count = p.use_count(), is_some = p.is_some(), "constructed from null");
    expect_null(&p, "p")
}

fn null_copy<P: SharedPointer<Tracked>>() -> Result<()> {
    let p1 = P::null();
    let p2 = p1.clone();
    info!(count = p1.use_count(), "null copied");
    expect_null(&p1, "p1")?;
    expect_null(&p2, "p2")
}

fn assign_null_over_owned<P: SharedPointer<Tracked>>() -> Result<()> {
    let mut p = P::new(Tracked::new(1));
    info!(count = p.use_count(), "count before assign");
    let null = P::null();
    let base = Tracked::live();
    p.clone_from(&null);
    info!(count = p.use_count(), is_some = p.is_some(), "count after assign");
    expect_null(&p, "p")?;
    expect_null(&null, "null")?;
    expect_live(base - 1)
}

fn reset_null<P: SharedPointer<Tracked>>() -> Result<()> {
    let mut p = P::new(Tracked::new(3));
    info!(count = p.use_count(), "count before reset");
    p.reset();
    info!(count = p.use_count(), is_some = p.is_some(), "count after reset");
    expect_null(&p, "p")
}

fn assign_owned_over_null<P: SharedPointer<Tracked>>() -> Result<()> {
    let mut p = P::null();
    info!(count = p.use_count(), "count before assign");
    let normal = P::new(Tracked::new(5));
    p.clone_from(&normal);
    info!(count = p.use_count(), "count after assign");
    expect_count(&p, "p", 2)?;
    expect_count(&normal, "normal", 2)?;
    expect_value(&p, "p", 5)
}

fn assign_null_over_null<P: SharedPointer<Tracked>>() -> Result<()> {
    let mut p1 = P::null();
    let p2 = P::null();
    p1.clone_from(&p2);
    info!(p1 = p1.use_count(), p2 = p2.use_count(), "counts after assign");
    expect_null(&p1, "p1")?;
    expect_null(&p2, "p2")
}

fn end_to_end<P: SharedPointer<Tracked>>() -> Result<()> {
    let base = Tracked::live();
    let mut a = P::new(Tracked::new(5));
    expect_count(&a, "a", 1)?;
    {
        let b = a.clone();
        expect_count(&a, "a", 2)?;
        expect_count(&b, "b", 2)?;
    }
    expect_count(&a, "a", 1)?;
    a.reset_to(Tracked::new(50));
    expect_value(&a, "a", 50)?;
    expect_count(&a, "a", 1)?;
    expect_live(base + 1)?;
    a.reset();
    expect_null(&a, "a")?;
    expect_live(base)
}
