//! Project-wide constants.

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Identifier of the one background engine this process ever boots.
pub const ENGINE_ID: &str = "background_engine";

/// Event tag the platform stamps on an SMS broadcast. Anything else
/// is ignored by the receiver.
pub const SMS_RECEIVED: &str = "sms.received";

/// Name of the invocation channel every engine exposes for inbound SMS.
pub const SMS_CHANNEL: &str = "courier/sms";

/// Method invoked engine-side for each delivered message.
pub const METHOD_MESSAGE_RECEIVED: &str = "messageReceived";

/// Argument keys for [`METHOD_MESSAGE_RECEIVED`].
pub const ARG_SENDER: &str = "sender";
pub const ARG_MESSAGE: &str = "message";

/// Invocations a channel parks before submission starts failing fast.
pub const INVOCATION_BUFFER: usize = 64;
