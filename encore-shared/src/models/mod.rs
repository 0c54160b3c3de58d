pub mod conversation;
pub mod errors;
pub mod events;
pub mod message;
pub mod presence;
pub mod timestamp;
pub mod typing;

pub use conversation::{
    ConversationListResponse, ConversationSummary, OpenConversationRequest,
};
pub use errors::ErrorResponse;
pub use events::InboxStreamEvent;
pub use message::{
    CustomerMessageRequest, Message, MessageKind, MessageListResponse, ReplyRequest,
    ReplyResponse,
};
pub use presence::{PresenceHeartbeatRequest, PresenceSnapshot, PresenceStatus};
pub use timestamp::Timestamp;
pub use typing::{SUPPORT_USER_ID, TypingRequest, TypingStatusResponse};
