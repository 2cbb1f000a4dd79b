//! Transport kinds

use crate::error::PolicyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire mechanism boilerplate is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// go-kit HTTP request/response handlers
    Http,
    /// go-kit gRPC handlers
    Grpc,
}

impl Transport {
    /// Every supported transport
    pub const ALL: [Transport; 2] = [Transport::Http, Transport::Grpc];

    /// Lowercase name used on the command line
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Transport::Http => "http",
            Transport::Grpc => "grpc",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transport {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PolicyError::UnsupportedTransport(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_kinds() {
        assert_eq!("http".parse::<Transport>().unwrap(), Transport::Http);
        assert_eq!("grpc".parse::<Transport>().unwrap(), Transport::Grpc);
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = "thrift".parse::<Transport>().unwrap_err();
        assert_eq!(err, PolicyError::UnsupportedTransport("thrift".into()));
        assert_eq!(err.to_string(), "transport `thrift` not supported");
    }
}
