use std::{cell::RefCell, ffi::OsStr, str::FromStr};

/// Tick budget for `run` when neither `--ticks` nor `HACK_MAX_TICKS` is given.
pub const DEFAULT_MAX_TICKS: usize = 1_000_000;

#[derive(Clone, Copy)]
struct Env {
    trace: bool,
    max_ticks: usize,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

pub fn init() {
    let value = Env {
        trace: var_is("HACK_TRACE", "1"),
        max_ticks: var_parse("HACK_MAX_TICKS").unwrap_or(DEFAULT_MAX_TICKS),
    };
    set_env(value);
}

/// Print every tick of a run.
pub fn is_trace_enabled() -> bool {
    with_env(|env| env.trace)
}

pub fn max_ticks() -> usize {
    with_env(|env| env.max_ticks)
}

fn set_env(value: Env) {
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(&env)
    })
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}

fn var_parse<T: FromStr>(name: impl AsRef<OsStr>) -> Option<T> {
    std::env::var(name.as_ref()).ok()?.trim().parse().ok()
}
