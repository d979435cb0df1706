//! # Network Module
//!
//! This module provides networking abstractions over ZMQ. Sensor data reaches the drive
//! executable on a SUB socket, drive demands leave it on a PUB socket, both carrying JSON.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread,
};
use zmq::{Context, Socket, SocketEvent, SocketType};

// Export zmq
pub use zmq;

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

macro_rules! set_sockopts {
    ($socket:expr, $(($opt:ident, $val:expr)),+) => {
        $(
            $socket.$opt($val)
                .map_err(|e| MonitoredSocketError::SocketOptionError(stringify!($opt).into(), e))?;
        )+
    };
}

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Receive timeout of the monitor socket, bounds how long dropping a socket can take.
const MONITOR_RECV_TIMEOUT_MS: i32 = 100;

// ------------------------------------------------------------------------------------------------
// STATICS
// ------------------------------------------------------------------------------------------------

/// Number of monitors that are registered. Used to provide unique IDs for each mointor endpoint.
static NUM_MONITORS: AtomicUsize = AtomicUsize::new(0);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network endpoints, loaded from `net.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetParams {
    /// Endpoint on which the sensor side publishes [`crate::eqpt::SensorMsg`]s.
    pub sensor_endpoint: String,

    /// Endpoint to which the drive executable binds its demands publisher.
    pub act_endpoint: String,
}

/// A zmq socket which is monitored providing additional information.
///
/// A background thread is run in order to monitor activity on the socket and update visible
/// information to the user. Currently this is only whether or not the socket is connected.
pub struct MonitoredSocket {
    socket: Socket,

    join_handle: Option<thread::JoinHandle<()>>,

    shutdown: Arc<AtomicBool>,

    connected: Arc<AtomicBool>,
}

/// Represents options which can be set on a monitored socket.
///
/// Most options here correspond to those found in the
/// [`zmq_setsockopt`](http://api.zeromq.org/4-2:zmq-setsockopt) documentation.
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Indicates if the socket should bind itself to the endpoint. Publishers should have this
    /// value set as `true`, subscribers should have it set as `false`.
    ///
    /// The default value is `false`.
    pub bind: bool,

    /// If true the `MonitoredSocket::new()` function will block until the socket is connected, or
    /// until the connect_timeout elapses.
    ///
    /// The default value is `false`, sensors may come up after the drive executable.
    pub block_on_first_connect: bool,

    /// Topics to subscribe to on SUB sockets. An empty topic subscribes to everything.
    pub subscribe: Vec<Vec<u8>>,

    /// `ZMQ_LINGER`: Set linger period for socket shutdown
    pub linger: i32,

    /// `ZMQ_RECONNECT_IVL`: Set reconnection interval
    pub reconnect_ivl: i32,

    /// `ZMQ_CONNECT_TIMEOUT`: Set `connect()` timeout
    pub connect_timeout: i32,

    /// `ZMQ_RCVTIMEO`: Maximum time before a recv operation returns with `EAGAIN`
    pub recv_timeout: i32,

    /// `ZMQ_SNDTIMEO`: Maximum time before a send operation returns with `EAGAIN`
    pub send_timeout: i32,

    /// `ZMQ_RCVHWM`: High water mark for inbound messages
    pub recv_hwm: i32,

    /// `ZMQ_SNDHWM`: High water mark for outbound messages
    pub send_hwm: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum MonitoredSocketError {
    #[error("Error creating the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Error enabling monitoring for the socket: {0}")]
    MonitoringEnableError(zmq::Error),

    #[error("Could not connect the socket: {0:?}")]
    CouldNotConnect(Option<zmq::Error>),

    #[error("Could not read event from monitor socket: {0}")]
    EventReadError(zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(String, zmq::Error),
}

/// Errors from sending or receiving JSON messages.
#[derive(thiserror::Error, Debug)]
pub enum NetError {
    #[error("Could not send the message: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a message: {0}")]
    RecvError(zmq::Error),

    #[error("Recieved a message which is not valid UTF-8")]
    NotUtf8,

    #[error("Could not serialize the message: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the message: {0}")]
    DeserializeError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MonitoredSocket {
    /// Create a new monitored socket.
    ///
    /// ## Arguments
    /// - `ctx`: the zmq context which will be used to create the socket
    /// - `socket_type`: the type of zmq socket to create
    /// - `socket_options`: a [`SocketOptions`] struct specifying how to configure the socket
    /// - `endpoint`: a zmq endpoint string, such as `"tcp://localhost:4000"`
    pub fn new(
        ctx: &Context,
        socket_type: SocketType,
        socket_options: SocketOptions,
        endpoint: &str,
    ) -> Result<Self, MonitoredSocketError> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let connected = Arc::new(AtomicBool::new(false));

        let socket = ctx
            .socket(socket_type)
            .map_err(MonitoredSocketError::CreateSocketError)?;

        // Enable, create, and connect monitor
        let monitor_endpoint = format!(
            "inproc://monitor_{}",
            NUM_MONITORS.fetch_add(1, Ordering::Relaxed)
        );
        socket
            .monitor(&monitor_endpoint, SocketEvent::ALL as i32)
            .map_err(MonitoredSocketError::MonitoringEnableError)?;
        let monitor = ctx
            .socket(zmq::PAIR)
            .map_err(MonitoredSocketError::CreateSocketError)?;
        monitor
            .set_rcvtimeo(MONITOR_RECV_TIMEOUT_MS)
            .map_err(|e| MonitoredSocketError::SocketOptionError("set_rcvtimeo".into(), e))?;
        monitor
            .connect(&monitor_endpoint)
            .map_err(|e| MonitoredSocketError::CouldNotConnect(Some(e)))?;

        socket_options.set(&socket)?;

        match socket_options.bind {
            false => socket.connect(endpoint),
            true => socket.bind(endpoint),
        }
        .map_err(|e| MonitoredSocketError::CouldNotConnect(Some(e)))?;

        // A bound socket is "connected" as far as its owner is concerned
        if socket_options.bind {
            connected.store(true, Ordering::Relaxed);
        } else if socket_options.block_on_first_connect {
            loop {
                match read_event(&monitor) {
                    Ok(SocketEvent::CONNECTED) => break,
                    Ok(SocketEvent::CONNECT_DELAYED) => continue,
                    Ok(_) => return Err(MonitoredSocketError::CouldNotConnect(None)),
                    Err(zmq::Error::EAGAIN) => continue,
                    Err(e) => return Err(MonitoredSocketError::EventReadError(e)),
                }
            }

            connected.store(true, Ordering::Relaxed);
        }

        let shutdown_clone = shutdown.clone();
        let connected_clone = connected.clone();
        let watch_connection = !socket_options.bind;

        let join_handle = thread::spawn(move || {
            monitor_socket(
                monitor,
                monitor_endpoint,
                shutdown_clone,
                connected_clone,
                watch_connection,
            )
        });

        Ok(Self {
            socket,
            join_handle: Some(join_handle),
            shutdown,
            connected,
        })
    }

    /// Return if the socket is connected or not.
    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Serialize the value to JSON and send it as a single frame.
    pub fn send_json<T: Serialize>(&self, value: &T) -> Result<(), NetError> {
        let s = serde_json::to_string(value).map_err(NetError::SerializationError)?;

        self.socket.send(&s, 0).map_err(NetError::SendError)
    }

    /// Receive one frame and deserialize it from JSON.
    ///
    /// Returns `Ok(None)` if the receive timed out.
    pub fn recv_json<T: DeserializeOwned>(&self) -> Result<Option<T>, NetError> {
        let msg = match self.socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => return Err(NetError::NotUtf8),
            Err(zmq::Error::EAGAIN) => return Ok(None),
            Err(e) => return Err(NetError::RecvError(e)),
        };

        serde_json::from_str(&msg)
            .map(Some)
            .map_err(NetError::DeserializeError)
    }
}

impl Drop for MonitoredSocket {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // The monitor's receive timeout guarantees the thread notices the shutdown
        if let Some(jh) = self.join_handle.take() {
            jh.join().ok();
        }
    }
}

impl std::ops::Deref for MonitoredSocket {
    type Target = Socket;

    fn deref(&self) -> &Self::Target {
        &self.socket
    }
}

impl std::ops::DerefMut for MonitoredSocket {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.socket
    }
}

impl SocketOptions {
    /// Set these options on the given socket.
    pub fn set(&self, socket: &Socket) -> Result<(), MonitoredSocketError> {
        set_sockopts!(
            socket,
            (set_connect_timeout, self.connect_timeout),
            (set_linger, self.linger),
            (set_reconnect_ivl, self.reconnect_ivl),
            (set_rcvtimeo, self.recv_timeout),
            (set_sndtimeo, self.send_timeout),
            (set_rcvhwm, self.recv_hwm),
            (set_sndhwm, self.send_hwm)
        );

        if let Ok(SocketType::SUB) = socket.get_socket_type() {
            for topic in self.subscribe.iter() {
                socket
                    .set_subscribe(topic)
                    .map_err(|e| MonitoredSocketError::SocketOptionError("set_subscribe".into(), e))?;
            }
        }

        Ok(())
    }
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            bind: false,
            block_on_first_connect: false,
            subscribe: vec![Vec::new()],
            connect_timeout: 0,
            linger: 0,
            reconnect_ivl: 100,
            recv_timeout: -1,
            send_timeout: 0,
            recv_hwm: 1000,
            send_hwm: 1000,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Read an event from a socket.
fn read_event(socket: &Socket) -> Result<SocketEvent, zmq::Error> {
    let msg = socket.recv_msg(0)?;

    let event = u16::from_ne_bytes([msg[0], msg[1]]);

    // The second frame is the address, we'll ignore it
    if socket.get_rcvmore()? {
        let _ = socket.recv_msg(0)?;
    }

    Ok(SocketEvent::from_raw(event))
}

fn monitor_socket(
    monitor: Socket,
    monitor_endpoint: String,
    shutdown: Arc<AtomicBool>,
    connected: Arc<AtomicBool>,
    watch_connection: bool,
) {
    while !shutdown.load(Ordering::Relaxed) {
        let event = match read_event(&monitor) {
            Ok(e) => e,
            Err(zmq::Error::EAGAIN) => continue,
            Err(e) => {
                warn!("Monitor {} stopped: {}", monitor_endpoint, e);
                break;
            }
        };

        if !watch_connection {
            continue;
        }

        match event {
            SocketEvent::CONNECTED => connected.store(true, Ordering::Relaxed),
            SocketEvent::DISCONNECTED => connected.store(false, Ordering::Relaxed),
            _ => (),
        }
    }
}
