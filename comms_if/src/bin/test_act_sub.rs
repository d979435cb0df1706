//! Subscribes to the drive demands published by the drive executable and prints them.

use comms_if::{
    eqpt::act::DriveDems,
    net::{MonitoredSocket, SocketOptions},
};

const ENDPOINT: &str = "tcp://localhost:5021";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = zmq::Context::new();

    let socket = MonitoredSocket::new(
        &ctx,
        zmq::SUB,
        SocketOptions {
            recv_timeout: 1000,
            ..Default::default()
        },
        ENDPOINT,
    )?;

    println!("Listening for drive demands on {}", ENDPOINT);

    loop {
        match socket.recv_json::<DriveDems>() {
            Ok(Some(dems)) => println!("steer: {:4}, speed: {:4}", dems.steer, dems.speed),
            Ok(None) => {
                if !socket.connected() {
                    println!("Not connected")
                }
            }
            Err(e) => println!("Failed to recieve demands: {}", e),
        }
    }
}
