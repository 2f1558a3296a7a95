//! Session state tracking for the scan protocol
//!
//! A session moves through:
//!
//! ```text
//! Disconnected → Connected → StatusChecked → Negotiated → Configured → Streaming
//!                                                                       │
//!                         Cancelled ←── (any state)        Closed ←─────┘
//!
//! Errored is reachable from every non-terminal state and absorbs all
//! further protocol steps until a fresh connect.
//! ```
//!
//! The tracker is owned by a single device handle; it has no interior
//! mutability.

use tracing::trace;

use crate::error::{Error, Result};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transport connection
    Disconnected,

    /// Transport connected, status line not read yet
    Connected,

    /// Device reported ready
    StatusChecked,

    /// Device capabilities received
    Negotiated,

    /// Scan parameters committed, device armed
    Configured,

    /// Scan data is being read
    Streaming,

    /// Scan aborted by the host
    Cancelled,

    /// Device closed the stream
    Closed,

    /// A protocol step failed
    Errored,
}

impl SessionState {
    /// Check if a transport connection is held in this state
    pub fn has_connection(self) -> bool {
        matches!(
            self,
            Self::Connected
                | Self::StatusChecked
                | Self::Negotiated
                | Self::Configured
                | Self::Streaming
        )
    }

    /// Check if a fresh connect may start from this state
    pub fn can_connect(self) -> bool {
        matches!(
            self,
            Self::Disconnected | Self::Cancelled | Self::Closed | Self::Errored
        )
    }
}

/// Session state tracker
#[derive(Debug)]
pub struct Session {
    state: SessionState,
}

impl Session {
    /// Create a new disconnected session
    pub fn new() -> Self {
        Self {
            state: SessionState::Disconnected,
        }
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.state.has_connection()
    }

    /// Check if scan data may be read
    pub fn is_armed(&self) -> bool {
        matches!(self.state, SessionState::Configured | SessionState::Streaming)
    }

    /// Fail with [`Error::InvalidSessionState`] unless in one of `allowed`
    pub fn expect(&self, allowed: &[SessionState], action: &'static str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::InvalidSessionState {
                state: self.state,
                action,
            })
        }
    }

    /// Transport connected
    pub fn connected(&mut self) -> Result<()> {
        if !self.state.can_connect() {
            return Err(Error::InvalidSessionState {
                state: self.state,
                action: "connect",
            });
        }
        self.set(SessionState::Connected);
        Ok(())
    }

    /// Status line reported ready
    pub fn status_checked(&mut self) -> Result<()> {
        self.advance(SessionState::Connected, SessionState::StatusChecked, "check status")
    }

    /// Negotiate exchange completed
    pub fn negotiated(&mut self) -> Result<()> {
        self.advance(SessionState::StatusChecked, SessionState::Negotiated, "negotiate")
    }

    /// Configure command sent
    pub fn configured(&mut self) -> Result<()> {
        self.advance(SessionState::Negotiated, SessionState::Configured, "configure")
    }

    /// First scan-data read
    pub fn streaming(&mut self) -> Result<()> {
        match self.state {
            SessionState::Streaming => Ok(()),
            _ => self.advance(SessionState::Configured, SessionState::Streaming, "read"),
        }
    }

    /// Scan cancelled by the host
    pub fn cancel(&mut self) {
        self.set(SessionState::Cancelled);
    }

    /// Device ended the stream
    pub fn close(&mut self) {
        self.set(SessionState::Closed);
    }

    /// Back to the initial state (connection released without error)
    pub fn reset(&mut self) {
        self.set(SessionState::Disconnected);
    }

    /// A protocol step failed
    pub fn fail(&mut self) {
        if self.state != SessionState::Errored {
            self.set(SessionState::Errored);
        }
    }

    fn advance(
        &mut self,
        from: SessionState,
        to: SessionState,
        action: &'static str,
    ) -> Result<()> {
        if self.state != from {
            return Err(Error::InvalidSessionState {
                state: self.state,
                action,
            });
        }
        self.set(to);
        Ok(())
    }

    fn set(&mut self, next: SessionState) {
        trace!(from = ?self.state, to = ?next, "Session transition");
        self.state = next;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
