//! Failures of the `ambient` binary and the exit status each one maps to.
//!
//! | status | meaning                                         |
//! |--------|-------------------------------------------------|
//! | 2      | rejected by clap before any subcommand runs     |
//! | 10     | the scene refused to build or run               |
//! | 11     | a config, state or PNG file failed to load/save |
//! | 12     | a flag value did not make sense                 |
//! | 13     | `--json` output could not be encoded            |

use ambient_core::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("scene: {0}")]
    Scene(EngineError),
    #[error("file: {0}")]
    File(String),
    #[error("bad argument: {0}")]
    BadArgument(String),
    #[error("json output: {0}")]
    Output(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Scene(_) => 10,
            CliError::File(_) => 11,
            CliError::BadArgument(_) => 12,
            CliError::Output(_) => 13,
        }
    }
}

/// File failures and unknown mode names are reported as what the user
/// touched, not as scene failures.
impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Io(msg) => CliError::File(msg),
            EngineError::UnknownMode(name) => {
                CliError::BadArgument(format!("no mode named {name:?}"))
            }
            other => CliError::Scene(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_kind_has_its_own_status() {
        let codes = [
            CliError::Scene(EngineError::InvalidConfig("dt".into())).exit_code(),
            CliError::File("state.json".into()).exit_code(),
            CliError::BadArgument("--pointer".into()).exit_code(),
            CliError::Output("json".into()).exit_code(),
        ];
        assert_eq!(codes, [10, 11, 12, 13]);
    }

    #[test]
    fn engine_io_becomes_a_file_error() {
        let err = CliError::from(EngineError::Io("disk full".into()));
        assert_eq!(err.exit_code(), 11);
        assert_eq!(err.to_string(), "file: disk full");
    }

    #[test]
    fn storage_failure_stays_a_scene_error() {
        let err = CliError::from(EngineError::Storage("locked".into()));
        assert!(matches!(err, CliError::Scene(EngineError::Storage(_))));
        assert!(err.to_string().starts_with("scene: "));
    }

    #[test]
    fn unknown_mode_is_a_bad_argument() {
        let err = CliError::from(EngineError::UnknownMode("warp".into()));
        assert_eq!(err.exit_code(), 12);
        assert_eq!(err.to_string(), "bad argument: no mode named \"warp\"");
    }

    #[test]
    fn json_failures_are_output_errors() {
        let bad = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        assert!(matches!(CliError::from(bad), CliError::Output(_)));
    }
}
