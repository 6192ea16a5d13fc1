//! Test harness for running fixture cases through the engine

use std::rc::Rc;

use tagloom_core::{
    EngineConfig, EngineError, EventCollector, ProcessingContext, ProcessorTemplateHandler,
    ScopedVariables, TemplateHandler, Value,
};

use crate::common::dialect::{self, Fragments};
use crate::common::markup;
use crate::common::{Gen, TestCase};

pub type Engine = ProcessorTemplateHandler<EventCollector>;

/// Result of running a test
#[derive(Debug)]
pub struct TestResult {
    pub passed: bool,
    pub template: String,
    pub expected: String,
    pub actual: String,
    pub seed: u64,
    pub errors: Vec<String>,
}

/// Build an engine over the test dialect with the given globals and fragments.
pub fn build_engine(
    config: EngineConfig,
    variables: impl IntoIterator<Item = (String, Value)>,
    fragments: Fragments,
) -> Engine {
    let mut scoped = ScopedVariables::new();
    for (name, value) in variables {
        scoped.insert_global(name, value);
    }
    let context = ProcessingContext::builder()
        .config(config)
        .registry(Rc::new(dialect::registry()))
        .variables(scoped)
        .expression_objects(fragments)
        .build()
        .expect("test context must build");
    ProcessorTemplateHandler::new(context, EventCollector::new())
}

/// Engine for a fixture case
pub fn engine_for(case: &TestCase, extra: Vec<(String, Value)>) -> Engine {
    let fragments = Fragments(case.fragments.clone().into_iter().collect());
    build_engine(
        EngineConfig::default(),
        case.variables().chain(extra),
        fragments,
    )
}

/// Feed one document through the engine and render what reached the sink.
pub fn process(engine: &mut Engine, template: &str) -> Result<String, EngineError> {
    let events = markup::tokenize(template, engine.context().registry());
    engine.next_mut().clear();
    engine.handle_document_start()?;
    for event in events {
        engine.handle_event(event)?;
    }
    engine.handle_document_end()?;
    Ok(markup::render(engine.next().events()))
}

/// Engine bookkeeping must be back to rest after a well-formed document.
pub fn check_at_rest(engine: &Engine, errors: &mut Vec<String>) {
    if engine.markup_level() != 0 {
        errors.push(format!("markup level {} after document end", engine.markup_level()));
    }
    if engine.exec_level() != 0 {
        errors.push(format!("exec level {} after document end", engine.exec_level()));
    }
    if engine.is_suspended() {
        errors.push("engine still suspended".to_string());
    }
    if engine.is_gathering() {
        errors.push("engine still gathering".to_string());
    }
    let scope = engine
        .context()
        .local_variables()
        .map_or(0, |variables| variables.level());
    if scope != 0 {
        errors.push(format!("variable scope level {} after document end", scope));
    }
    let sink = engine.next();
    if sink.document_starts != 1 || sink.document_ends != 1 {
        errors.push(format!(
            "document bracket forwarded {}/{} times",
            sink.document_starts, sink.document_ends
        ));
    }
}

fn run(engine: &mut Engine, template: String, expected: String, seed: u64) -> TestResult {
    let mut errors = Vec::new();
    let actual = match process(engine, &template) {
        Ok(actual) => {
            if actual != expected {
                errors.push("output mismatch".to_string());
            }
            check_at_rest(engine, &mut errors);
            actual
        }
        Err(err) => {
            errors.push(format!("engine error: {}", err));
            String::new()
        }
    };
    TestResult {
        passed: errors.is_empty(),
        template,
        expected,
        actual,
        seed,
        errors,
    }
}

/// Run a single test case (canonical, no variations)
pub fn run_test(case: &TestCase) -> TestResult {
    let mut engine = engine_for(case, Vec::new());
    run(&mut engine, case.template.clone(), case.expected.clone(), 0)
}

/// Run test with stochastic variations
///
/// Applies independent variations:
/// - processor-free markup before and after the case
/// - geometric nesting inside plain wrapper elements
/// - unrelated global variables
/// - 30% chance the engine first processes a different document
pub fn run_with_variations(case: &TestCase, gen: &mut Gen) -> TestResult {
    let mut prefix = gen.markup_fragment(2);
    let mut suffix = String::new();
    for name in gen.wrappers() {
        prefix.push_str(&format!("<{}>", name));
        suffix = format!("</{}>{}", name, suffix);
    }
    suffix.push_str(&gen.markup_fragment(2));

    let extra = (0..gen.geometric(0.5))
        .map(|i| (format!("zz_{}_{}", gen.name(), i), Value::Integer(gen.integer())))
        .collect();
    let mut engine = engine_for(case, extra);

    if gen.chance(0.3) {
        let warmup = gen.markup_fragment(3);
        let result = run(&mut engine, warmup.clone(), warmup, gen.seed);
        if !result.passed {
            return result;
        }
    }

    let template = format!("{}{}{}", prefix, case.template, suffix);
    let expected = format!("{}{}{}", prefix, case.expected, suffix);
    run(&mut engine, template, expected, gen.seed)
}

impl TestResult {
    /// Print detailed failure info
    pub fn print_failure(&self, case_id: &str) {
        eprintln!("\n=== FAILED: {} ===", case_id);
        eprintln!("Seed: {} (set TAGLOOM_TEST_SEED={} to reproduce)", self.seed, self.seed);
        eprintln!("\nTemplate:\n{}", self.template);
        eprintln!("\nExpected:\n{}", self.expected);
        eprintln!("\nActual:\n{}", self.actual);
        eprintln!("\nErrors:");
        for e in &self.errors {
            eprintln!("  - {}", e);
        }
    }
}
