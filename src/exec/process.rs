// src/exec/process.rs

//! Shell command construction and the environment handed to children.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::config::{keys, EnvSnapshot};

/// Used when the snapshot carries no `PATH`.
const FALLBACK_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

/// Environment for the tap and target processes.
///
/// Children do not inherit the harness environment (which holds secrets and
/// config blobs). They get `PATH`, `PYTHONPATH` and, when resolved,
/// `GOOGLE_APPLICATION_CREDENTIALS`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessEnv {
    vars: Vec<(String, String)>,
}

impl ProcessEnv {
    pub fn build(env: &EnvSnapshot, search_path: &str, credentials: Option<&Path>) -> Self {
        let path = env.get_non_empty(keys::PATH).unwrap_or(FALLBACK_PATH);
        let mut vars = vec![
            (keys::PATH.to_string(), path.to_string()),
            (keys::PYTHONPATH.to_string(), search_path.to_string()),
        ];
        if let Some(credentials) = credentials {
            vars.push((
                keys::GOOGLE_CREDENTIALS.to_string(),
                credentials.display().to_string(),
            ));
        }
        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Build a shell command appropriate for the platform, with a clean
/// environment and the given working directory. Stdio is left to the caller.
pub fn shell_command(script: &str, env: &ProcessEnv, work_dir: &Path) -> Command {
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(script);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(script);
        c
    };

    cmd.env_clear()
        .envs(env.iter())
        .current_dir(work_dir)
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn only_whitelisted_variables_are_passed() {
        let env = EnvSnapshot::from_pairs([
            ("PATH", "/custom/bin"),
            ("google_client_secret", "{}"),
            ("tap_config", "{}"),
        ]);
        let creds = PathBuf::from("/w/.env/client_secret.json");
        let penv = ProcessEnv::build(&env, "/app", Some(&creds));

        assert_eq!(penv.get("PATH"), Some("/custom/bin"));
        assert_eq!(penv.get("PYTHONPATH"), Some("/app"));
        assert_eq!(
            penv.get("GOOGLE_APPLICATION_CREDENTIALS"),
            Some("/w/.env/client_secret.json")
        );
        assert_eq!(penv.get("google_client_secret"), None);
        assert_eq!(penv.iter().count(), 3);
    }

    #[test]
    fn missing_path_falls_back() {
        let penv = ProcessEnv::build(&EnvSnapshot::default(), "/app", None);
        assert_eq!(penv.get("PATH"), Some(FALLBACK_PATH));
        assert_eq!(penv.get("GOOGLE_APPLICATION_CREDENTIALS"), None);
    }
}
