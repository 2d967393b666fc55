//! Illustrative per-pattern defaults. Deadlines are sized to exceed the sum of
//! pacing delays of a pattern, they are not derived from payload sizes.

use std::time::Duration;

/// Environment variable with the host clients dial. Defaults to `localhost`
pub const HOST_ENV: &str = "DUPLEX_HOST";

const DEFAULT_HOST: &str = "localhost";

/// Endpoint and timing settings of a single call pattern
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternConfig {
    /// Verbose pattern name
    pub name: &'static str,
    /// Port the server listens on
    pub port: u16,
    /// Deadline of a single call
    pub deadline: Duration,
    /// Delay between two consecutive records sent by the pacing side
    pub pacing: Duration,
}

pub const HELLO: PatternConfig = PatternConfig {
    name: "hello",
    port: 50051,
    deadline: Duration::from_secs(1),
    pacing: Duration::ZERO,
};

pub const NUMBERS: PatternConfig = PatternConfig {
    name: "numbers",
    port: 50052,
    deadline: Duration::from_secs(10),
    pacing: Duration::from_millis(500),
};

pub const AVERAGE: PatternConfig = PatternConfig {
    name: "average",
    port: 50053,
    deadline: Duration::from_secs(10),
    pacing: Duration::from_millis(500),
};

pub const CHAT: PatternConfig = PatternConfig {
    name: "chat",
    port: 50054,
    deadline: Duration::from_secs(10),
    pacing: Duration::from_secs(1),
};

impl PatternConfig {
    /// Address the server binds to
    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Address clients dial, host is taken from [HOST_ENV]
    pub fn dial_addr(&self) -> String {
        self.dial_addr_on(&host())
    }

    pub fn dial_addr_on(&self, host: &str) -> String {
        format!("{host}:{}", self.port)
    }
}

/// Host clients dial
pub fn host() -> String {
    std::env::var(HOST_ENV).unwrap_or_else(|_| DEFAULT_HOST.to_owned())
}
