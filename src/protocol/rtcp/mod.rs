//! SAT>IP RTCP APP packet parsing

mod app;

pub use app::{first_app_packet, RtcpAppPacket, RtcpError};
