use std::cell::RefCell;

/// Settings taken from the process environment at start-up.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Env {
    /// `LS8_TRACE=1`: log machine state before every instruction
    trace: bool,
    /// `LS8_LOG`: `tracing` filter directives
    log: Option<String>,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

pub fn init() {
    set_env(Env::from_lookup(|name| std::env::var(name).ok()));
}

pub fn is_trace_enabled() -> bool {
    with_env(|env| env.trace)
}

pub fn log_filter() -> Option<String> {
    with_env(|env| env.log.clone())
}

impl Env {
    fn from_lookup<F>(lookup: F) -> Env
    where
        F: Fn(&str) -> Option<String>,
    {
        Env {
            trace: lookup("LS8_TRACE").is_some_and(|v| v == "1"),
            log: lookup("LS8_LOG").filter(|v| !v.trim().is_empty()),
        }
    }
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
        let env = env.as_ref().unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(env)
    })
}
