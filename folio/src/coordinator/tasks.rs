//! Initialization tasks.

use super::{InitContext, InitCtx};
use crate::options::DeferredFeature;
use crate::pipeline::{PipelineTask, TaskStatus, panic_message};
use crate::registry::InitializerRole;
use async_trait::async_trait;
use folio_shared::errors::{FolioError, FolioResult};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;

/// Look up `role` and run it if registered.
///
/// Errors and panics are converted into `FolioError::Initializer`.
async fn invoke(ctx: &InitContext, role: InitializerRole) -> FolioResult<TaskStatus> {
    let Some(initializer) = ctx.registry.get(role) else {
        tracing::debug!(role = %role, "Initializer not registered, skipping");
        return Ok(TaskStatus::Skipped);
    };

    ctx.invoked.lock().push(role);
    tracing::debug!(role = %role, "Running initializer");

    match AssertUnwindSafe(initializer.init(&ctx.view)).catch_unwind().await {
        Ok(Ok(())) => Ok(TaskStatus::Completed),
        Ok(Err(e)) => Err(FolioError::Initializer {
            role: role.to_string(),
            reason: e.to_string(),
        }),
        Err(payload) => Err(FolioError::Initializer {
            role: role.to_string(),
            reason: format!("panicked: {}", panic_message(payload.as_ref())),
        }),
    }
}

/// Runs one always-planned initializer.
pub(super) struct InitializerTask {
    role: InitializerRole,
}

impl InitializerTask {
    pub(super) fn new(role: InitializerRole) -> Self {
        Self { role }
    }
}

#[async_trait]
impl PipelineTask<InitCtx> for InitializerTask {
    async fn run(self: Box<Self>, ctx: InitCtx) -> FolioResult<TaskStatus> {
        invoke(&ctx, self.role).await
    }

    fn name(&self) -> &str {
        self.role.global_name()
    }
}

/// Loads a present feature's module, then runs its initializer.
pub(super) struct DeferredFeatureTask {
    feature: DeferredFeature,
}

impl DeferredFeatureTask {
    pub(super) fn new(feature: DeferredFeature) -> Self {
        Self { feature }
    }
}

#[async_trait]
impl PipelineTask<InitCtx> for DeferredFeatureTask {
    async fn run(self: Box<Self>, ctx: InitCtx) -> FolioResult<TaskStatus> {
        let module = &self.feature.module;

        match ctx.module_timeout {
            Some(timeout) => ctx.modules.ensure_loaded_within(module, timeout).await?,
            None => ctx.modules.ensure_loaded(module).await?,
        }

        if !ctx.registry.contains(self.feature.role) {
            tracing::warn!(
                role = %self.feature.role,
                module = %module,
                "Module loaded but registered no initializer"
            );
        }

        invoke(&ctx, self.feature.role).await
    }

    fn name(&self) -> &str {
        self.feature.role.global_name()
    }
}
