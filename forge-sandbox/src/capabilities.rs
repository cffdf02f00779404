//! Construction of the allow-listed execution engine.
//!
//! The engine starts from [`Engine::new_raw`], which has no built-in
//! capabilities at all, and every capability a handler may reach is
//! registered explicitly below. There is no filesystem, network, process,
//! or environment surface to remove because none is ever added.

use std::time::Instant;

use rhai::packages::{
    ArithmeticPackage, BasicArrayPackage, BasicFnPackage, BasicIteratorPackage, BasicMapPackage,
    BasicMathPackage, BasicStringPackage, BasicTimePackage, LanguageCorePackage, LogicPackage,
    MoreStringPackage, Package,
};
use rhai::{Dynamic, Engine, EvalAltResult};

/// Upper bound on nested function calls inside a handler.
const MAX_CALL_LEVELS: usize = 64;
/// Upper bound on strings a handler may build, in bytes.
const MAX_STRING_SIZE: usize = 1_000_000;
/// Upper bound on array lengths a handler may build.
const MAX_ARRAY_SIZE: usize = 100_000;
/// Upper bound on object map sizes a handler may build.
const MAX_MAP_SIZE: usize = 100_000;

/// Builds a fresh engine carrying exactly the allowed capability set and a
/// wall-clock interrupt at `deadline`.
///
/// Allowed: language core, arithmetic, logic, math, string, array, object
/// map, iterator, and time primitives, JSON encode/decode helpers, regex
/// helpers, and no-op logging stubs. `eval` is disabled as a symbol, and
/// unknown variables fail at compile time.
pub(crate) fn build_engine(deadline: Instant) -> Engine {
    let mut engine = Engine::new_raw();

    engine.register_global_module(LanguageCorePackage::new().as_shared_module());
    engine.register_global_module(ArithmeticPackage::new().as_shared_module());
    engine.register_global_module(LogicPackage::new().as_shared_module());
    engine.register_global_module(BasicMathPackage::new().as_shared_module());
    engine.register_global_module(BasicStringPackage::new().as_shared_module());
    engine.register_global_module(MoreStringPackage::new().as_shared_module());
    engine.register_global_module(BasicArrayPackage::new().as_shared_module());
    engine.register_global_module(BasicMapPackage::new().as_shared_module());
    engine.register_global_module(BasicIteratorPackage::new().as_shared_module());
    engine.register_global_module(BasicFnPackage::new().as_shared_module());
    engine.register_global_module(BasicTimePackage::new().as_shared_module());

    register_json_helpers(&mut engine);
    register_regex_helpers(&mut engine);
    register_logging_stubs(&mut engine);

    engine.disable_symbol("eval");
    engine.set_strict_variables(true);
    engine.set_max_call_levels(MAX_CALL_LEVELS);
    engine.set_max_string_size(MAX_STRING_SIZE);
    engine.set_max_array_size(MAX_ARRAY_SIZE);
    engine.set_max_map_size(MAX_MAP_SIZE);

    engine.on_progress(move |_operations| {
        if Instant::now() >= deadline {
            Some(Dynamic::from("wall-clock budget exhausted"))
        } else {
            None
        }
    });

    engine
}

fn register_json_helpers(engine: &mut Engine) {
    engine.register_fn(
        "parse_json",
        |text: &str| -> Result<Dynamic, Box<EvalAltResult>> {
            let value: serde_json::Value = serde_json::from_str(text)
                .map_err(|err| -> Box<EvalAltResult> { format!("invalid JSON: {err}").into() })?;
            rhai::serde::to_dynamic(value)
        },
    );

    engine.register_fn(
        "to_json",
        |value: Dynamic| -> Result<String, Box<EvalAltResult>> {
            let value: serde_json::Value = rhai::serde::from_dynamic(&value)?;
            serde_json::to_string(&value).map_err(|err| -> Box<EvalAltResult> {
                format!("value is not JSON-representable: {err}").into()
            })
        },
    );
}

fn register_regex_helpers(engine: &mut Engine) {
    engine.register_fn(
        "regex_is_match",
        |pattern: &str, text: &str| -> Result<bool, Box<EvalAltResult>> {
            Ok(compile_pattern(pattern)?.is_match(text))
        },
    );

    engine.register_fn(
        "regex_find",
        |pattern: &str, text: &str| -> Result<Dynamic, Box<EvalAltResult>> {
            Ok(compile_pattern(pattern)?
                .find(text)
                .map_or(Dynamic::UNIT, |found| found.as_str().into()))
        },
    );

    engine.register_fn(
        "regex_replace",
        |pattern: &str, text: &str, replacement: &str| -> Result<String, Box<EvalAltResult>> {
            Ok(compile_pattern(pattern)?
                .replace_all(text, replacement)
                .into_owned())
        },
    );
}

fn compile_pattern(pattern: &str) -> Result<regex::Regex, Box<EvalAltResult>> {
    regex::Regex::new(pattern)
        .map_err(|err| -> Box<EvalAltResult> { format!("invalid regex pattern: {err}").into() })
}

/// Handlers may call `log`/`warn`/`error`; output is discarded.
fn register_logging_stubs(engine: &mut Engine) {
    engine.register_fn("log", |_message: Dynamic| {});
    engine.register_fn("warn", |_message: Dynamic| {});
    engine.register_fn("error", |_message: Dynamic| {});
    engine.on_print(|_| {});
    engine.on_debug(|_, _, _| {});
}
