//! In-process Modbus TCP controller for integration tests.
//!
//! Listens on an ephemeral port, serves every connection on its own thread and
//! records each request PDU. Coil state persists across connections.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use htcpcp_gateway::utils::pack_coils;
use htcpcp_gateway::{ActuatorDriver, ClientConfig, DriverConfig};

pub const COIL_ADDRESS: u16 = 8225;
pub const UNIT_ID: u8 = 1;

/// How the mock answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Echo writes and serve reads from the coil table.
    Normal,
    /// Answer Write Single Coil with a server device failure exception.
    RejectWrites,
    /// Accept writes, answer Read Coils with an illegal data address exception.
    RejectReads,
}

/// A request seen by the mock controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub unit_id: u8,
    pub function: u8,
    pub address: u16,
    pub value: u16,
}

#[derive(Debug, Default)]
struct Shared {
    coils: HashMap<u16, bool>,
    requests: Vec<SeenRequest>,
    connections: usize,
}

pub struct MockController {
    addr: SocketAddr,
    shared: Arc<Mutex<Shared>>,
}

impl MockController {
    pub fn start(behaviour: Behaviour) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let shared = Arc::new(Mutex::new(Shared::default()));

        let accept_shared = Arc::clone(&shared);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let conn_shared = Arc::clone(&accept_shared);
                conn_shared.lock().unwrap().connections += 1;
                thread::spawn(move || serve(stream, behaviour, &conn_shared));
            }
        });

        Self { addr, shared }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.shared.lock().unwrap().requests.clone()
    }

    pub fn connections(&self) -> usize {
        self.shared.lock().unwrap().connections
    }

    pub fn coil(&self, address: u16) -> bool {
        self.shared
            .lock()
            .unwrap()
            .coils
            .get(&address)
            .copied()
            .unwrap_or(false)
    }

    pub fn driver(&self) -> ActuatorDriver {
        let client = ClientConfig::new(Ipv4Addr::LOCALHOST, UNIT_ID)
            .with_port(self.addr.port())
            .with_timeout(Some(Duration::from_secs(2)));
        ActuatorDriver::new(DriverConfig::new(client).with_coil_address(COIL_ADDRESS))
    }
}

fn serve(mut stream: TcpStream, behaviour: Behaviour, shared: &Mutex<Shared>) {
    loop {
        let mut header = [0u8; 7];
        if stream.read_exact(&mut header).is_err() {
            return;
        }
        let length = usize::from(u16::from_be_bytes([header[4], header[5]]));
        let mut pdu = vec![0u8; length - 1];
        if stream.read_exact(&mut pdu).is_err() {
            return;
        }

        let function = pdu[0];
        let address = u16::from_be_bytes([pdu[1], pdu[2]]);
        let value = u16::from_be_bytes([pdu[3], pdu[4]]);
        let reply_pdu = {
            let mut shared = shared.lock().unwrap();
            shared.requests.push(SeenRequest {
                unit_id: header[6],
                function,
                address,
                value,
            });
            answer(&mut shared.coils, behaviour, &pdu)
        };

        let mut frame = Vec::with_capacity(7 + reply_pdu.len());
        frame.extend_from_slice(&header[..4]);
        frame.extend_from_slice(&((reply_pdu.len() + 1) as u16).to_be_bytes());
        frame.push(header[6]);
        frame.extend_from_slice(&reply_pdu);
        if stream.write_all(&frame).is_err() {
            return;
        }
    }
}

fn answer(coils: &mut HashMap<u16, bool>, behaviour: Behaviour, pdu: &[u8]) -> Vec<u8> {
    let function = pdu[0];
    let address = u16::from_be_bytes([pdu[1], pdu[2]]);
    let operand = u16::from_be_bytes([pdu[3], pdu[4]]);

    match (function, behaviour) {
        (0x05, Behaviour::RejectWrites) => vec![0x85, 0x04],
        (0x05, _) => {
            coils.insert(address, operand == 0xFF00);
            pdu.to_vec()
        }
        (0x01, Behaviour::RejectReads) => vec![0x81, 0x02],
        (0x01, _) => {
            let states: Vec<bool> = (0..operand)
                .map(|offset| coils.get(&(address + offset)).copied().unwrap_or(false))
                .collect();
            let packed = pack_coils(&states);
            let mut reply = vec![0x01, packed.len() as u8];
            reply.extend_from_slice(&packed);
            reply
        }
        _ => vec![function | 0x80, 0x01],
    }
}

/// The example header block sent by the enterprise-zone client.
pub const BREW_HEADER: &str =
    "HTTP/1.1 BREW\r\nAccept-Additions: 0\r\nContent-Type: application/coffee-pot-command\r\n\r\n";

pub fn brew_request(body: &str) -> Vec<u8> {
    format!("{BREW_HEADER}{body}").into_bytes()
}
