//! Plugin traits.

use std::fmt;

use async_trait::async_trait;

use crate::error::ArgdownError;
use crate::logger::Logger;
use crate::request::Request;
use crate::response::{Response, ResponseField};

/// Which hooks a plugin implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub prepare: bool,
    pub run: bool,
}

impl Capabilities {
    pub const RUN: Capabilities = Capabilities {
        prepare: false,
        run: true,
    };
    pub const PREPARE: Capabilities = Capabilities {
        prepare: true,
        run: false,
    };
    pub const PREPARE_AND_RUN: Capabilities = Capabilities {
        prepare: true,
        run: true,
    };
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities::RUN
    }
}

/// A synchronous pipeline plugin.
///
/// Object-safe so plugins can be stored as `Box<dyn Plugin>`.
pub trait Plugin: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities {
        Capabilities::RUN
    }

    /// Response fields that must exist before [`Plugin::run`] is called.
    fn required_fields(&self) -> Vec<ResponseField> {
        Vec::new()
    }

    /// Normalize configuration before any plugin of the stage runs.
    fn prepare(&self, _request: &mut Request, _response: &Response) -> Result<(), ArgdownError> {
        Ok(())
    }

    fn run(
        &self,
        request: &Request,
        response: &mut Response,
        logger: &Logger,
    ) -> Result<(), ArgdownError>;
}

/// A plugin whose run hook may suspend, e.g. on an external layout service.
#[async_trait]
pub trait AsyncPlugin: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities {
        Capabilities::RUN
    }

    fn required_fields(&self) -> Vec<ResponseField> {
        Vec::new()
    }

    fn prepare(&self, _request: &mut Request, _response: &Response) -> Result<(), ArgdownError> {
        Ok(())
    }

    async fn run_async(
        &self,
        request: &Request,
        response: &mut Response,
        logger: &Logger,
    ) -> Result<(), ArgdownError>;
}

/// A registered plugin of either flavor.
#[derive(Debug)]
pub enum PluginHandle {
    Sync(Box<dyn Plugin>),
    Async(Box<dyn AsyncPlugin>),
}

impl PluginHandle {
    pub fn name(&self) -> &str {
        match self {
            PluginHandle::Sync(p) => p.name(),
            PluginHandle::Async(p) => p.name(),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            PluginHandle::Sync(p) => p.capabilities(),
            PluginHandle::Async(p) => p.capabilities(),
        }
    }

    pub fn required_fields(&self) -> Vec<ResponseField> {
        match self {
            PluginHandle::Sync(p) => p.required_fields(),
            PluginHandle::Async(p) => p.required_fields(),
        }
    }

    pub fn prepare(&self, request: &mut Request, response: &Response) -> Result<(), ArgdownError> {
        match self {
            PluginHandle::Sync(p) => p.prepare(request, response),
            PluginHandle::Async(p) => p.prepare(request, response),
        }
    }

    /// First required field missing on `response`, as an error.
    pub fn check_required(&self, response: &Response) -> Result<(), ArgdownError> {
        match self.required_fields().into_iter().find(|f| !response.has(f)) {
            Some(field) => Err(ArgdownError::MissingDependency {
                plugin: self.name().to_string(),
                field: field.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NeedsMap;

    impl Plugin for NeedsMap {
        fn name(&self) -> &str {
            "needs-map"
        }

        fn required_fields(&self) -> Vec<ResponseField> {
            vec![ResponseField::Model, ResponseField::Map]
        }

        fn run(&self, _: &Request, _: &mut Response, _: &Logger) -> Result<(), ArgdownError> {
            Ok(())
        }
    }

    #[test]
    fn missing_field_is_reported() {
        let handle = PluginHandle::Sync(Box::new(NeedsMap));
        let err = handle.check_required(&Response::default()).unwrap_err();
        assert_eq!(
            err,
            ArgdownError::MissingDependency {
                plugin: "needs-map".into(),
                field: "model".into()
            }
        );
        assert_eq!(handle.capabilities(), Capabilities::RUN);
    }
}
