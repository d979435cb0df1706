//! Publishes synthetic sensor data for bench testing the drive executable.
//!
//! The mask shows a straight lane with edges at x = 250 and x = 380, the ranging scan sees
//! nothing closer than 3 m and the ultrasonic array reports open space on every channel.

use chrono::Utc;
use comms_if::{
    eqpt::{
        lane_cam::{CueFlags, MaskFrame, MaskImage},
        range::{LandmarkReport, RangingScan, UltrasonicArray, NUM_ULTRASONIC},
        SensorMsg,
    },
    net::{MonitoredSocket, SocketOptions},
};
use image::{GrayImage, Luma};

const ENDPOINT: &str = "tcp://*:5020";
const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;
const LEFT_EDGE: u32 = 250;
const RIGHT_EDGE: u32 = 380;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = zmq::Context::new();

    let socket = MonitoredSocket::new(
        &ctx,
        zmq::PUB,
        SocketOptions {
            bind: true,
            ..Default::default()
        },
        ENDPOINT,
    )?;

    println!("Sensor publisher open on {}", ENDPOINT);

    let mut image = GrayImage::new(WIDTH, HEIGHT);
    for y in 0..HEIGHT {
        for x in &[LEFT_EDGE, LEFT_EDGE + 1, RIGHT_EDGE, RIGHT_EDGE + 1] {
            image.put_pixel(*x, y, Luma([255]));
        }
    }

    let mut cycle: u64 = 0;

    loop {
        let now = Utc::now();

        let mask = MaskFrame::from(&MaskImage {
            timestamp: now,
            image: image.clone(),
        });

        let msgs = vec![
            SensorMsg::Frame {
                mask,
                cues: CueFlags::default(),
            },
            SensorMsg::Ranging(RangingScan {
                timestamp: now,
                ranges_m: vec![3.0; 505],
            }),
            SensorMsg::Ultrasonic(UltrasonicArray {
                timestamp: now,
                dist: [200; NUM_ULTRASONIC],
            }),
            SensorMsg::Landmark(LandmarkReport {
                timestamp: now,
                detections: Vec::new(),
            }),
        ];

        for msg in msgs.iter() {
            if let Err(e) = socket.send_json(msg) {
                println!("Failed to send {} message: {}", msg.source(), e);
            }
        }

        cycle += 1;
        if cycle % 100 == 0 {
            println!("Sent {} cycles", cycle);
        }

        std::thread::sleep(std::time::Duration::from_millis(100));
    }
}
