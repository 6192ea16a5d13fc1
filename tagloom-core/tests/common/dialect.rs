//! A small `t:` attribute dialect used by the tests
//!
//! | attribute     | precedence | effect                                        |
//! |---------------|------------|-----------------------------------------------|
//! | `t:each`      | 200        | `item[, stat] : ${expr}` - iterate            |
//! | `t:if`        | 300        | remove element unless truthy                  |
//! | `t:with`      | 600        | `name=expr` - local variable                  |
//! | `t:class`     | 1000       | set the `class` attribute                     |
//! | `t:text`      | 1300       | body := text                                  |
//! | `t:include`   | 1300       | body := named fragment, processed             |
//! | `t:replace`   | 1400       | element := text                               |
//! | `t:remove`    | 1600       | `all` / `tag` / `body`                        |
//! | `<t:block>`   | 100000     | remove tag, keep body                         |
//! | `t:fragment`  | 100        | node processor (cannot run on elements)       |
//!
//! Expressions: `${var.prop.prop}`, `'literal'`, integers, `true`/`false`/`null`.

use std::collections::HashMap;

use tagloom_core::{
    ActionRequest, ElementProcessor, ElementTag, EventQueue, FnProcessor, Matcher,
    NodeProcessor, ProcessingContext, Processor, ProcessorError, ProcessorRegistry, Value,
    VariablesMap,
};

use super::markup;

/// Named markup fragments for `t:include`, installed as expression objects.
#[derive(Debug, Clone, Default)]
pub struct Fragments(pub HashMap<String, String>);

pub fn evaluate(variables: &dyn VariablesMap, expr: &str) -> Result<Value, ProcessorError> {
    let expr = expr.trim();
    if let Some(path) = expr.strip_prefix("${").and_then(|e| e.strip_suffix('}')) {
        let mut segments = path.trim().split('.');
        let root = segments.next().unwrap_or_default();
        let mut value = variables.get(root).cloned().unwrap_or(Value::Null);
        for segment in segments {
            value = value.property(segment).unwrap_or(Value::Null);
        }
        return Ok(value);
    }
    if let Some(literal) = expr.strip_prefix('\'').and_then(|e| e.strip_suffix('\'')) {
        return Ok(Value::from(literal));
    }
    if let Ok(int) = expr.parse::<i64>() {
        return Ok(Value::Integer(int));
    }
    match expr {
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        "null" => Ok(Value::Null),
        _ => Err(ProcessorError::new(format!("cannot evaluate '{}'", expr))),
    }
}

/// Remove the attribute from the tag, returning its value.
fn take_attribute(tag: &mut ElementTag, name: &str) -> String {
    let value = tag.attributes.get(name).unwrap_or_default().to_string();
    tag.attributes.remove(name);
    value
}

struct Each;

impl ElementProcessor for Each {
    fn name(&self) -> &str {
        "t:each"
    }

    fn process(
        &self,
        context: &ProcessingContext,
        tag: &mut ElementTag,
        actions: &mut ActionRequest,
    ) -> Result<(), ProcessorError> {
        let spec = take_attribute(tag, "t:each");
        let (names, expr) = spec
            .split_once(':')
            .ok_or_else(|| ProcessorError::new(format!("malformed t:each '{}'", spec)))?;
        let mut names = names.split(',').map(str::trim);
        let item = names
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ProcessorError::new(format!("t:each '{}' names no item", spec)))?;
        let status = names.next().map(str::to_string);
        actions.iterate_element(item, status, evaluate(context.variables(), expr)?);
        Ok(())
    }
}

struct Text;

impl ElementProcessor for Text {
    fn name(&self) -> &str {
        "t:text"
    }

    fn process(
        &self,
        context: &ProcessingContext,
        tag: &mut ElementTag,
        actions: &mut ActionRequest,
    ) -> Result<(), ProcessorError> {
        let expr = take_attribute(tag, "t:text");
        let value = evaluate(context.variables(), &expr)?;
        actions.set_body_text(value.to_string(), false);
        Ok(())
    }
}

pub struct FragmentModel;

impl NodeProcessor for FragmentModel {
    fn name(&self) -> &str {
        "t:fragment"
    }
}

type ProcessFn = fn(&ProcessingContext, &mut ElementTag, &mut ActionRequest) -> Result<(), ProcessorError>;

fn attribute_processor(name: &'static str, func: ProcessFn) -> Processor {
    Processor::element(FnProcessor::new(name, func))
}

fn process_if(ctx: &ProcessingContext, tag: &mut ElementTag, actions: &mut ActionRequest) -> Result<(), ProcessorError> {
    let expr = take_attribute(tag, "t:if");
    if !evaluate(ctx.variables(), &expr)?.is_truthy() {
        actions.remove_element();
    }
    Ok(())
}

fn process_with(ctx: &ProcessingContext, tag: &mut ElementTag, actions: &mut ActionRequest) -> Result<(), ProcessorError> {
    let spec = take_attribute(tag, "t:with");
    let (name, expr) = spec
        .split_once('=')
        .ok_or_else(|| ProcessorError::new(format!("malformed t:with '{}'", spec)))?;
    actions.set_local_variable(name.trim(), evaluate(ctx.variables(), expr)?);
    Ok(())
}

fn process_class(ctx: &ProcessingContext, tag: &mut ElementTag, _: &mut ActionRequest) -> Result<(), ProcessorError> {
    let expr = take_attribute(tag, "t:class");
    let value = evaluate(ctx.variables(), &expr)?;
    tag.attributes.set("class", value.to_string());
    Ok(())
}

fn process_include(ctx: &ProcessingContext, tag: &mut ElementTag, actions: &mut ActionRequest) -> Result<(), ProcessorError> {
    let name = take_attribute(tag, "t:include");
    let fragments = ctx
        .expression_objects::<Fragments>()
        .ok_or_else(|| ProcessorError::new("no fragments installed"))?;
    let source = fragments
        .0
        .get(&name)
        .ok_or_else(|| ProcessorError::new(format!("unknown fragment '{}'", name)))?;
    let queue: EventQueue = markup::tokenize(source, ctx.registry()).into_iter().collect();
    actions.set_body_queue(queue, true);
    Ok(())
}

fn process_replace(ctx: &ProcessingContext, tag: &mut ElementTag, actions: &mut ActionRequest) -> Result<(), ProcessorError> {
    let expr = take_attribute(tag, "t:replace");
    let value = evaluate(ctx.variables(), &expr)?;
    actions.replace_with_text(value.to_string(), false);
    Ok(())
}

fn process_remove(_: &ProcessingContext, tag: &mut ElementTag, actions: &mut ActionRequest) -> Result<(), ProcessorError> {
    match take_attribute(tag, "t:remove").as_str() {
        "all" => actions.remove_element(),
        "tag" => actions.remove_tag(),
        "body" => actions.set_body_queue(EventQueue::new(), false),
        other => return Err(ProcessorError::new(format!("unknown t:remove mode '{}'", other))),
    }
    Ok(())
}

fn process_block(_: &ProcessingContext, _: &mut ElementTag, actions: &mut ActionRequest) -> Result<(), ProcessorError> {
    actions.remove_tag();
    Ok(())
}

/// Registry with the whole dialect.
pub fn registry() -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();
    registry.register(Matcher::attribute("t:fragment"), 100, Processor::node(FragmentModel));
    registry.register(Matcher::attribute("t:each"), 200, Processor::element(Each));
    registry.register(Matcher::attribute("t:if"), 300, attribute_processor("t:if", process_if));
    registry.register(Matcher::attribute("t:with"), 600, attribute_processor("t:with", process_with));
    registry.register(Matcher::attribute("t:class"), 1000, attribute_processor("t:class", process_class));
    registry.register(Matcher::attribute("t:text"), 1300, Processor::element(Text));
    registry.register(Matcher::attribute("t:include"), 1300, attribute_processor("t:include", process_include));
    registry.register(Matcher::attribute("t:replace"), 1400, attribute_processor("t:replace", process_replace));
    registry.register(Matcher::attribute("t:remove"), 1600, attribute_processor("t:remove", process_remove));
    registry.register(Matcher::element("t:block"), 100_000, attribute_processor("t:block", process_block));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagloom_core::ScopedVariables;

    #[test]
    fn test_evaluate() {
        let vars = ScopedVariables::new()
            .with("name", "Ada")
            .with("list", vec![1, 2]);
        assert_eq!(evaluate(&vars, "${name}").unwrap(), Value::from("Ada"));
        assert_eq!(evaluate(&vars, " 'lit' ").unwrap(), Value::from("lit"));
        assert_eq!(evaluate(&vars, "42").unwrap(), Value::Integer(42));
        assert_eq!(evaluate(&vars, "${missing.deep}").unwrap(), Value::Null);
        assert!(evaluate(&vars, "name +").is_err());
    }
}
