//! The pipeline: plugin registry, process table and runners.
//!
//! A run resolves the request's process into stages and executes them in
//! order. Within a stage every plugin's `prepare` hook runs first, then every
//! plugin's `run` hook, both in registration order. Failures either abort the
//! run (`throwExceptions`) or are collected on the response.

use std::collections::BTreeMap;

use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::error::ArgdownError;
use crate::logger::Logger;
use crate::plugin::{AsyncPlugin, Plugin, PluginHandle};
use crate::request::{ProcessSpec, Request};
use crate::response::Response;
use crate::stage::Stage;

#[derive(Debug)]
struct StageEntry {
    stage: Stage,
    plugins: Vec<PluginHandle>,
}

/// Plugin registry plus named processes.
///
/// Populated once at startup and read-only afterwards; independent runs may
/// share one application across threads.
#[derive(Debug, Default)]
pub struct Application {
    stages: Vec<StageEntry>,
    processes: BTreeMap<String, Vec<Stage>>,
}

impl Application {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Registration ---

    /// Register a plugin for a stage. Plugins of a stage run in registration order.
    pub fn add_plugin(&mut self, plugin: impl Plugin + 'static, stage: impl Into<Stage>) {
        self.register(PluginHandle::Sync(Box::new(plugin)), stage.into());
    }

    pub fn add_async_plugin(&mut self, plugin: impl AsyncPlugin + 'static, stage: impl Into<Stage>) {
        self.register(PluginHandle::Async(Box::new(plugin)), stage.into());
    }

    fn register(&mut self, handle: PluginHandle, stage: Stage) {
        match self.stages.iter_mut().find(|e| e.stage == stage) {
            Some(entry) => entry.plugins.push(handle),
            None => self.stages.push(StageEntry {
                stage,
                plugins: vec![handle],
            }),
        }
    }

    /// Remove a plugin by name from a stage. Returns whether one was removed.
    pub fn remove_plugin(&mut self, name: &str, stage: impl Into<Stage>) -> bool {
        let stage = stage.into();
        let Some(entry) = self.stages.iter_mut().find(|e| e.stage == stage) else {
            return false;
        };
        let before = entry.plugins.len();
        entry.plugins.retain(|p| p.name() != name);
        before != entry.plugins.len()
    }

    pub fn plugins(&self, stage: &Stage) -> &[PluginHandle] {
        self.stages
            .iter()
            .find(|e| &e.stage == stage)
            .map(|e| e.plugins.as_slice())
            .unwrap_or_default()
    }

    /// Stages with at least one registered plugin, in registration order.
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages
            .iter()
            .filter(|e| !e.plugins.is_empty())
            .map(|e| &e.stage)
    }

    // --- Processes ---

    pub fn define_process<I, S>(&mut self, name: &str, stages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<Stage>,
    {
        self.processes
            .insert(name.to_string(), stages.into_iter().map(Into::into).collect());
    }

    pub fn process(&self, name: &str) -> Option<&[Stage]> {
        self.processes.get(name).map(Vec::as_slice)
    }

    /// Stages the request asks for. Request-defined processes shadow the
    /// application's; every stage must have a registered plugin.
    pub fn resolve_process(&self, request: &Request) -> Result<Vec<Stage>, ArgdownError> {
        let stages: Vec<Stage> = match &request.process {
            None => {
                return Err(ArgdownError::UnknownProcess {
                    name: String::new(),
                })
            }
            Some(ProcessSpec::Stages(names)) => names.iter().map(|n| Stage::parse(n)).collect(),
            Some(ProcessSpec::Named(name)) => {
                if let Some(names) = request.processes.get(name) {
                    names.iter().map(|n| Stage::parse(n)).collect()
                } else if let Some(stages) = self.processes.get(name) {
                    stages.clone()
                } else {
                    return Err(ArgdownError::UnknownProcess { name: name.clone() });
                }
            }
        };

        if let Some(stage) = stages.iter().find(|s| self.plugins(s).is_empty()) {
            return Err(ArgdownError::UnknownStage {
                name: stage.to_string(),
            });
        }
        Ok(stages)
    }

    // --- Execution ---

    /// Run the request's process synchronously. Async-only plugins fail with
    /// the `async-plugin` code.
    pub fn run(&self, mut request: Request) -> Result<Response, ArgdownError> {
        let stages = self.resolve_process(&request)?;
        let run_id = Uuid::new_v4();
        let _run = info_span!("argdown_run", %run_id).entered();
        info!(stages = stages.len(), "starting run");

        let mut response = Response::new(run_id);

        for stage in &stages {
            let _stage = info_span!("stage", name = %stage).entered();
            let plugins = self.begin_stage(stage, &request)?;
            let runnable = prepare_stage(plugins, &mut request, &mut response)?;
            // Prepare hooks may have changed the level, e.g. through front matter.
            let logger = Logger::new(request.log_level);

            for (plugin, runnable) in plugins.iter().zip(runnable) {
                if !runnable {
                    continue;
                }
                let plugin_logger = logger.for_plugin(plugin.name());
                let result = match plugin.check_required(&response) {
                    Err(e) => Err(e),
                    Ok(()) => match plugin {
                        PluginHandle::Sync(p) => p.run(&request, &mut response, &plugin_logger),
                        PluginHandle::Async(p) => Err(ArgdownError::plugin(
                            p.name(),
                            "async-plugin",
                            "asynchronous plugin cannot run in a synchronous run",
                        )),
                    },
                };
                if let Err(e) = result {
                    handle_failure(&request, &mut response, plugin.name(), e)?;
                }
            }
        }

        info!(exceptions = response.exceptions.len(), "run finished");
        Ok(response)
    }

    /// Run the request's process, awaiting each plugin before the next.
    pub async fn run_async(&self, mut request: Request) -> Result<Response, ArgdownError> {
        let stages = self.resolve_process(&request)?;
        let run_id = Uuid::new_v4();
        let span = info_span!("argdown_run", %run_id);

        async move {
            info!(stages = stages.len(), "starting async run");
            let mut response = Response::new(run_id);

            for stage in &stages {
                let plugins = self.begin_stage(stage, &request)?;
                let runnable = prepare_stage(plugins, &mut request, &mut response)?;
                let logger = Logger::new(request.log_level);

                for (plugin, runnable) in plugins.iter().zip(runnable) {
                    if !runnable {
                        continue;
                    }
                    let plugin_logger = logger.for_plugin(plugin.name());
                    let result = match plugin.check_required(&response) {
                        Err(e) => Err(e),
                        Ok(()) => match plugin {
                            PluginHandle::Sync(p) => p.run(&request, &mut response, &plugin_logger),
                            PluginHandle::Async(p) => {
                                p.run_async(&request, &mut response, &plugin_logger)
                                    .instrument(info_span!("stage", name = %stage))
                                    .await
                            }
                        },
                    };
                    if let Err(e) = result {
                        handle_failure(&request, &mut response, plugin.name(), e)?;
                    }
                }
            }

            info!(exceptions = response.exceptions.len(), "run finished");
            Ok::<_, ArgdownError>(response)
        }
        .instrument(span)
        .await
    }

    fn begin_stage(&self, stage: &Stage, request: &Request) -> Result<&[PluginHandle], ArgdownError> {
        if request.cancel.is_cancelled() {
            info!(stage = %stage, "run cancelled");
            return Err(ArgdownError::Cancelled {
                stage: stage.to_string(),
            });
        }
        let plugins = self.plugins(stage);
        debug!(stage = %stage, plugins = plugins.len(), "entering stage");
        Ok(plugins)
    }
}

/// Call every prepare hook of a stage. Returns which plugins may still run.
fn prepare_stage(
    plugins: &[PluginHandle],
    request: &mut Request,
    response: &mut Response,
) -> Result<Vec<bool>, ArgdownError> {
    let mut runnable = Vec::with_capacity(plugins.len());
    for plugin in plugins {
        let capabilities = plugin.capabilities();
        let mut ok = capabilities.run;
        if capabilities.prepare {
            Logger::new(request.log_level)
                .for_plugin(plugin.name())
                .verbose("preparing");
            if let Err(e) = plugin.prepare(request, response) {
                handle_failure(request, response, plugin.name(), e)?;
                ok = false;
            }
        }
        runnable.push(ok);
    }
    Ok(runnable)
}

fn handle_failure(
    request: &Request,
    response: &mut Response,
    plugin: &str,
    error: ArgdownError,
) -> Result<(), ArgdownError> {
    if request.throw_exceptions {
        return Err(error);
    }
    if request.log_exceptions {
        error!(plugin, code = error.code(), "{error}");
    }
    response.exceptions.push(error);
    Ok(())
}
