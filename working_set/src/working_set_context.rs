//! Context module for working set runs. Holds the `DataFusion` runtime shared between runs
//! so memory limits and registered stores are owned by the caller rather than the process.
/*
* Copyright 2022-2025 Crown Copyright
*
* Licensed under the Apache License, Version 2.0 (the "License");
* you may not use this file except in compliance with the License.
* You may obtain a copy of the License at
*
*     http://www.apache.org/licenses/LICENSE-2.0
*
* Unless required by applicable law or agreed to in writing, software
* distributed under the License is distributed on an "AS IS" BASIS,
* WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
* See the License for the specific language governing permissions and
* limitations under the License.
*/
use datafusion::execution::{config::SessionConfig, runtime_env::RuntimeEnv};
use std::sync::Arc;

/// Engine state passed by reference to each run.
///
/// The runtime (memory pool, disk manager and object store registry) is shared by every
/// run using this context. Each run starts its session from a copy of the session
/// configuration.
#[derive(Debug, Clone)]
pub struct WorkingSetContext {
    runtime: Arc<RuntimeEnv>,
    session_config: SessionConfig,
}

impl Default for WorkingSetContext {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkingSetContext {
    /// Create a context with a default runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::with_runtime(Arc::new(RuntimeEnv::default()))
    }

    /// Create a context sharing an existing runtime.
    #[must_use]
    pub fn with_runtime(runtime: Arc<RuntimeEnv>) -> Self {
        Self {
            runtime,
            session_config: SessionConfig::new(),
        }
    }

    /// Replace the session configuration each run starts from.
    #[must_use]
    pub fn with_session_config(mut self, session_config: SessionConfig) -> Self {
        self.session_config = session_config;
        self
    }

    #[must_use]
    pub fn runtime(&self) -> Arc<RuntimeEnv> {
        self.runtime.clone()
    }

    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        self.session_config.clone()
    }
}
