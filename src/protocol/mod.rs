//! Wire protocol support for the SAT>IP client

pub mod rtcp;
pub mod rtsp;
