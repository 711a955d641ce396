//! `timeblock://` control URLs.
//!
//! Launchers and scripts drive a running engine with URLs such as
//! `timeblock://skip`. The host names the command; scheme and host are
//! matched case-insensitively.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::ControlError;

pub const URL_SCHEME: &str = "timeblock";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Start the first block when idle, otherwise pause or resume.
    StartStop,
    Pause,
    Resume,
    Skip,
}

impl ControlCommand {
    /// Parse a control URL.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is malformed, uses another scheme or
    /// names an unknown command.
    pub fn from_url(input: &str) -> Result<Self, ControlError> {
        let url = Url::parse(input.trim()).map_err(|e| ControlError::Malformed {
            url: input.to_string(),
            message: e.to_string(),
        })?;
        if !url.scheme().eq_ignore_ascii_case(URL_SCHEME) {
            return Err(ControlError::UnknownScheme(url.scheme().to_string()));
        }
        let host = url.host_str().ok_or_else(|| ControlError::Malformed {
            url: input.to_string(),
            message: "missing command".to_string(),
        })?;
        host.parse()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ControlCommand::StartStop => "startstop",
            ControlCommand::Pause => "pause",
            ControlCommand::Resume => "resume",
            ControlCommand::Skip => "skip",
        }
    }
}

impl FromStr for ControlCommand {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "startstop" => Ok(ControlCommand::StartStop),
            "pause" => Ok(ControlCommand::Pause),
            "resume" => Ok(ControlCommand::Resume),
            "skip" => Ok(ControlCommand::Skip),
            _ => Err(ControlError::UnknownCommand(s.to_string())),
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{URL_SCHEME}://{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command() {
        assert_eq!(ControlCommand::from_url("timeblock://startstop").unwrap(), ControlCommand::StartStop);
        assert_eq!(ControlCommand::from_url("timeblock://pause").unwrap(), ControlCommand::Pause);
        assert_eq!(ControlCommand::from_url("timeblock://resume").unwrap(), ControlCommand::Resume);
        assert_eq!(ControlCommand::from_url("timeblock://skip").unwrap(), ControlCommand::Skip);
    }

    #[test]
    fn scheme_and_command_ignore_case() {
        assert_eq!(ControlCommand::from_url("TimeBlock://SKIP").unwrap(), ControlCommand::Skip);
        assert_eq!(ControlCommand::from_url(" timeblock://pause/\n").unwrap(), ControlCommand::Pause);
    }

    #[test]
    fn unknown_command_rejected() {
        assert!(matches!(
            ControlCommand::from_url("timeblock://snooze"),
            Err(ControlError::UnknownCommand(cmd)) if cmd == "snooze"
        ));
    }

    #[test]
    fn wrong_scheme_rejected() {
        assert!(matches!(
            ControlCommand::from_url("https://skip"),
            Err(ControlError::UnknownScheme(scheme)) if scheme == "https"
        ));
        assert!(matches!(ControlCommand::from_url("skip"), Err(ControlError::Malformed { .. })));
        assert!(matches!(ControlCommand::from_url("timeblock:skip"), Err(ControlError::Malformed { .. })));
    }

    #[test]
    fn display_round_trips() {
        for command in [ControlCommand::StartStop, ControlCommand::Pause, ControlCommand::Resume, ControlCommand::Skip] {
            assert_eq!(ControlCommand::from_url(&command.to_string()).unwrap(), command);
        }
    }
}
