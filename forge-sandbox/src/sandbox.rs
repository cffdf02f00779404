//! Single-shot handler execution under a wall-clock budget.

use std::time::{Duration, Instant};

use rhai::{Dynamic, EvalAltResult, Scope};
use serde_json::Value;
use tokio::{task, time};
use tracing::debug;

use crate::capabilities::build_engine;
use crate::{SandboxError, SandboxResult};

/// Name the wrapped handler function is compiled under.
const HANDLER_FN: &str = "handler";

/// Default execution budget applied when none is configured.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the execution sandbox.
#[derive(Clone, Copy, Debug)]
pub struct SandboxConfig {
    timeout: Duration,
}

impl SandboxConfig {
    /// Creates a configuration with the default five-second budget.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the wall-clock budget applied to every execution.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured budget.
    #[must_use]
    pub const fn timeout(self) -> Duration {
        self.timeout
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Executes untrusted handler source against caller-supplied parameters.
///
/// The sandbox owns no state: every call compiles the handler into a freshly
/// built engine, so nothing persists from one execution to the next. One
/// timeout value applies to all calls; there is no per-call override.
#[derive(Debug)]
pub struct Sandbox {
    timeout: Duration,
}

impl Sandbox {
    /// Creates a sandbox from the supplied configuration.
    #[must_use]
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            timeout: config.timeout(),
        }
    }

    /// Returns the wall-clock budget applied to each execution.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs `handler_code` as a single-parameter function over `params`.
    ///
    /// Parameters are assumed already schema-checked by the caller. The
    /// outcome is exactly one of a result value or an execution failure:
    /// compile errors, runtime errors, budget expiry, and worker faults all
    /// surface as [`SandboxError::Execution`] with a descriptive reason.
    ///
    /// The budget is enforced twice: the engine interrupts script execution
    /// once the deadline passes, and the worker as a whole is raced against
    /// an independently scheduled timer of the same budget. The second timer
    /// matters because the engine interrupt only observes script progress;
    /// a handler wedged inside a native call would otherwise hold the caller
    /// past the budget. Whichever settles first wins; the losing worker is
    /// detached and its thread reclaimed when the interrupt fires.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Execution`] for every failure mode.
    pub async fn execute(&self, handler_code: &str, params: Value) -> SandboxResult<Value> {
        let script = wrap_handler(handler_code);
        let budget = self.timeout;

        let worker = task::spawn_blocking(move || evaluate(&script, params, budget));
        let outcome = match time::timeout(budget, worker).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join)) => Err(SandboxError::execution(format!(
                "execution worker failed: {join}"
            ))),
            Err(_) => Err(SandboxError::execution(format!(
                "execution timed out after {}ms",
                budget.as_millis()
            ))),
        };

        match &outcome {
            Ok(_) => debug!("handler execution completed"),
            Err(err) => debug!(reason = err.reason(), "handler execution failed"),
        }
        outcome
    }
}

/// Wraps a handler body into a named single-parameter function.
///
/// Function scoping in the engine is strict: the body sees `params` and its
/// own locals, nothing else.
fn wrap_handler(handler_code: &str) -> String {
    format!("fn {HANDLER_FN}(params) {{\n{handler_code}\n}}")
}

fn evaluate(script: &str, params: Value, budget: Duration) -> SandboxResult<Value> {
    let deadline = Instant::now() + budget;
    let engine = build_engine(deadline);

    let ast = engine
        .compile(script)
        .map_err(|err| SandboxError::execution(format!("handler failed to compile: {err}")))?;

    let params = rhai::serde::to_dynamic(params)
        .map_err(|err| SandboxError::execution(format!("parameters are not representable: {err}")))?;

    let mut scope = Scope::new();
    let result = engine
        .call_fn::<Dynamic>(&mut scope, &ast, HANDLER_FN, (params,))
        .map_err(normalize)?;

    rhai::serde::from_dynamic(&result).map_err(|err| {
        SandboxError::execution(format!("handler returned an unsupported value: {err}"))
    })
}

fn normalize(err: Box<EvalAltResult>) -> SandboxError {
    match *err {
        EvalAltResult::ErrorTerminated(token, _) => {
            SandboxError::execution(format!("execution timed out: {token}"))
        }
        other => SandboxError::execution(other.to_string()),
    }
}
