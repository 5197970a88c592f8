//! Council configuration container.
//!
//! [`CouncilConfig`] groups the runtime knobs of the services and use cases.
//! It is built by the infrastructure config loader from file/env layers and
//! handed to the services at construction time; nothing here is mutated
//! afterwards.

use std::time::Duration;

/// Event broker settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerParams {
    /// Longest the consumer loop waits for an event before re-checking
    /// cancellation.
    pub idle_wait: Duration,
}

impl Default for BrokerParams {
    fn default() -> Self {
        Self {
            idle_wait: Duration::from_secs(1),
        }
    }
}

impl BrokerParams {
    pub fn with_idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait = idle_wait;
        self
    }
}

/// Turn-taking settings for a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    /// Rounds to run before the session driver stops the run.
    pub rounds: u32,
    /// Pause between two turns.
    pub turn_delay: Duration,
    /// Upper bound for a single agent invocation. `None` waits forever.
    pub agent_timeout: Option<Duration>,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            rounds: 1,
            turn_delay: Duration::ZERO,
            agent_timeout: Some(Duration::from_secs(120)),
        }
    }
}

impl SessionParams {
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_turn_delay(mut self, turn_delay: Duration) -> Self {
        self.turn_delay = turn_delay;
        self
    }

    pub fn with_agent_timeout(mut self, agent_timeout: Option<Duration>) -> Self {
        self.agent_timeout = agent_timeout;
        self
    }
}

/// Configuration container for the council services.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CouncilConfig {
    broker: BrokerParams,
    session: SessionParams,
}

impl CouncilConfig {
    pub fn new(broker: BrokerParams, session: SessionParams) -> Self {
        Self { broker, session }
    }

    // ==================== Accessors ====================

    pub fn broker(&self) -> &BrokerParams {
        &self.broker
    }

    pub fn session(&self) -> &SessionParams {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CouncilConfig::default();
        assert_eq!(config.broker().idle_wait, Duration::from_secs(1));
        assert_eq!(config.session().rounds, 1);
        assert_eq!(config.session().turn_delay, Duration::ZERO);
    }

    #[test]
    fn test_builders() {
        let config = CouncilConfig::new(
            BrokerParams::default().with_idle_wait(Duration::from_millis(250)),
            SessionParams::default()
                .with_rounds(3)
                .with_agent_timeout(None),
        );
        assert_eq!(config.broker().idle_wait, Duration::from_millis(250));
        assert_eq!(config.session().rounds, 3);
        assert_eq!(config.session().agent_timeout, None);
    }
}
