mod config;

use crate::{HealthProbe, ProbeOutcome};

use std::env;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

/// RAII guard for environment variables - automatically restores on drop
pub(crate) struct EnvGuard {
    key: &'static str,
    original: Option<String>,
}

impl EnvGuard {
    pub(crate) fn set(key: &'static str, value: &str) -> Self {
        unsafe {
            let original = env::var(key).ok();
            env::set_var(key, value);
            Self { key, original }
        }
    }

    pub(crate) fn remove(key: &'static str) -> Self {
        unsafe {
            let original = env::var(key).ok();
            env::remove_var(key);
            Self { key, original }
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        unsafe {
            match &self.original {
                Some(val) => env::set_var(self.key, val),
                None => env::remove_var(self.key),
            }
        }
    }
}

/// Clear every MOLE_SHELL_* override for the lifetime of the guards
pub(crate) fn clear_overrides() -> Vec<EnvGuard> {
    vec![
        EnvGuard::remove(crate::ENV_CONFIG_DIR),
        EnvGuard::remove(crate::ENV_BINARY),
        EnvGuard::remove(crate::ENV_PORT),
        EnvGuard::remove(crate::ENV_TEMPLATES),
    ]
}

/// Probe that answers from a script, then repeats its last answer
pub(crate) struct ScriptedProbe {
    script: Mutex<Vec<ProbeOutcome>>,
    calls: AtomicU32,
}

impl ScriptedProbe {
    pub(crate) fn new(script: Vec<ProbeOutcome>) -> Self {
        Self {
            script: Mutex::new(script),
            calls: AtomicU32::new(0),
        }
    }

    pub(crate) fn healthy_on(attempt: u32) -> Self {
        let mut script = vec![ProbeOutcome::Unhealthy { status: 503 }; attempt as usize - 1];
        script.push(ProbeOutcome::Healthy);
        Self::new(script)
    }

    pub(crate) fn never_healthy() -> Self {
        Self::new(vec![ProbeOutcome::Unreachable {
            error: "connection refused".into(),
        }])
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn probe(&self) -> ProbeOutcome {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        let script = self.script.lock().unwrap();
        script
            .get(call)
            .or_else(|| script.last())
            .cloned()
            .unwrap_or(ProbeOutcome::Healthy)
    }
}
