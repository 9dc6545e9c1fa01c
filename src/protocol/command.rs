//! Outbound control datagrams.

use serde::{Deserialize, Serialize};

use super::strings::{StringEncoding, write_string};

const SUBSCRIBE_UPDATE: u8 = 200;
const SUBSCRIBE_SPOT: u8 = 201;
const GET_CAR_INFO: u8 = 210;
const GET_SESSION_INFO: u8 = 211;
const SEND_CHAT: u8 = 220;
const BROADCAST_CHAT: u8 = 221;

/// A fire-and-forget request to the server plugin interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Request periodic realtime car updates.
    SubscribeUpdate,
    /// Request spot/incident packets.
    SubscribeSpot,
    /// Request a NEW_SESSION-shaped response.
    GetSessionInfo,
    GetCarInfo { car_id: u8 },
    /// Private chat message to one car.
    SendChat { car_id: u8, message: String },
    /// Chat message to every connected car.
    BroadcastChat { message: String },
}

impl Command {
    pub fn tag(&self) -> u8 {
        match self {
            Command::SubscribeUpdate => SUBSCRIBE_UPDATE,
            Command::SubscribeSpot => SUBSCRIBE_SPOT,
            Command::GetSessionInfo => GET_SESSION_INFO,
            Command::GetCarInfo { .. } => GET_CAR_INFO,
            Command::SendChat { .. } => SEND_CHAT,
            Command::BroadcastChat { .. } => BROADCAST_CHAT,
        }
    }

    /// Encode as a single datagram payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(8);
        buffer.push(self.tag());
        match self {
            Command::SubscribeUpdate | Command::SubscribeSpot | Command::GetSessionInfo => {}
            Command::GetCarInfo { car_id } => buffer.push(*car_id),
            Command::SendChat { car_id, message } => {
                buffer.push(*car_id);
                write_string(&mut buffer, message, StringEncoding::Wide);
            }
            Command::BroadcastChat { message } => {
                write_string(&mut buffer, message, StringEncoding::Wide);
            }
        }
        buffer
    }
}
