//! Well-known node names and blob directory prefixes.
//!
//! These values are part of the persisted layout and must not change
//! while any store written with them is still in use.

/// Document node holding the flat `{name, email}` contact directory.
pub const USERS_NODE: &str = "users";

/// Node name under a conversation holding its message sequence.
pub const MESSAGES_NODE: &str = "messages";

/// Prefix of every conversation id.
pub const CONVERSATION_ID_PREFIX: &str = "conversation_";

/// Blob directory for profile pictures.
pub const PROFILE_IMAGE_DIR: &str = "images";

/// Blob directory for photos attached to messages.
pub const MESSAGE_IMAGE_DIR: &str = "message_images";

/// Blob directory for videos attached to messages.
pub const MESSAGE_VIDEO_DIR: &str = "message_videos";

/// Suffix of a user's profile picture file name.
pub const PROFILE_PICTURE_SUFFIX: &str = "_profile_picture.png";
