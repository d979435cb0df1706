//! # Actuator Client
//!
//! Publishes the drive demands computed each cycle. The actuation side subscribes to the
//! demands, so the client binds its socket and never waits on a subscriber.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::act::DriveDems,
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetError, NetParams, SocketOptions},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct ActClient {
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ActClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send demands: {0}")]
    SendError(NetError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ActClient {
    /// Create a new instance of the ActClient, binding the demands publisher.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, ActClientError> {
        let socket_options = SocketOptions {
            bind: true,
            linger: 100,
            send_timeout: 10,
            send_hwm: 10,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::PUB, socket_options, &params.act_endpoint)
            .map_err(ActClientError::SocketError)?;

        Ok(Self { socket })
    }

    /// Publish the demands.
    pub fn send_demands(&self, dems: &DriveDems) -> Result<(), ActClientError> {
        self.socket
            .send_json(dems)
            .map_err(ActClientError::SendError)
    }
}
