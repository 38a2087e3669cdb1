//! courier — delivers inbound SMS broadcasts to a long-lived background
//! engine over a named, one-way invocation channel.
//!
//! The engine is expensive to boot, so it boots once, on the first
//! message, and stays cached for the life of the process. Everything
//! that can go wrong on the way stops inside [`receiver::SmsReceiver`];
//! the platform callback driving it never sees a failure.

pub mod bridge;
pub mod channel;
pub mod consts;
pub mod engine;
pub mod error;
pub mod message;
pub mod receiver;
