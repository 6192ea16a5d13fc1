//! Processing context: everything processors can see.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::config::{EngineConfig, TemplateMode};
use crate::error::{EngineError, Result};
use crate::registry::ProcessorRegistry;
use crate::variables::{LocalVariablesMap, VariablesMap};

/// Configuration, processors and variables for one template run.
///
/// Processors get shared access. Variables are only changed by the engine,
/// on behalf of processors, through the action requests they return.
pub struct ProcessingContext {
    config: EngineConfig,
    registry: Rc<ProcessorRegistry>,
    variables: Box<dyn VariablesMap>,
    expression_objects: Option<Rc<dyn Any>>,
}

impl ProcessingContext {
    pub fn builder() -> ProcessingContextBuilder {
        ProcessingContextBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn template_mode(&self) -> TemplateMode {
        self.config.template_mode
    }

    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    pub fn variables(&self) -> &dyn VariablesMap {
        self.variables.as_ref()
    }

    /// Local-scope view of the variables, if the map supports it.
    pub fn local_variables(&self) -> Option<&dyn LocalVariablesMap> {
        self.variables.as_local()
    }

    pub(crate) fn local_variables_mut(&mut self) -> Option<&mut dyn LocalVariablesMap> {
        self.variables.as_local_mut()
    }

    pub fn has_local_variables(&self) -> bool {
        self.variables.as_local().is_some()
    }

    /// Opaque expression support objects, downcast to the type the dialect installed.
    pub fn expression_objects<T: Any>(&self) -> Option<&T> {
        self.expression_objects
            .as_deref()
            .and_then(|objects| objects.downcast_ref::<T>())
    }
}

impl fmt::Debug for ProcessingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingContext")
            .field("config", &self.config)
            .field("processors", &self.registry.len())
            .field("local_variables", &self.has_local_variables())
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct ProcessingContextBuilder {
    config: Option<EngineConfig>,
    registry: Option<Rc<ProcessorRegistry>>,
    variables: Option<Box<dyn VariablesMap>>,
    expression_objects: Option<Rc<dyn Any>>,
}

impl ProcessingContextBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn registry(mut self, registry: Rc<ProcessorRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn variables(mut self, variables: impl VariablesMap + 'static) -> Self {
        self.variables = Some(Box::new(variables));
        self
    }

    pub fn expression_objects(mut self, objects: impl Any) -> Self {
        self.expression_objects = Some(Rc::new(objects));
        self
    }

    pub fn build(self) -> Result<ProcessingContext> {
        let config = self
            .config
            .ok_or_else(|| missing("engine configuration"))?;
        config.validate()?;
        let registry = self.registry.ok_or_else(|| missing("processor registry"))?;
        let variables = self.variables.ok_or_else(|| missing("variables map"))?;
        Ok(ProcessingContext {
            config,
            registry,
            variables,
            expression_objects: self.expression_objects,
        })
    }
}

fn missing(what: &str) -> EngineError {
    EngineError::Configuration(format!("{} must be provided", what))
}
