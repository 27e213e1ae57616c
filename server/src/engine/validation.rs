/// Maximum display-name length.
pub const MAX_USER_NAME_LENGTH: usize = 32;

/// Maximum topic length.
pub const MAX_TOPIC_LENGTH: usize = 200;

/// Maximum room title length.
pub const MAX_TITLE_LENGTH: usize = 100;

/// Maximum room description length.
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Maximum message content length (bytes).
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Validate a session identifier. Opaque client token, must be non-empty
/// and bounded.
pub fn validate_session_id(session_id: &str) -> Result<(), String> {
    if session_id.trim().is_empty() {
        return Err("Session ID cannot be empty".into());
    }
    if session_id.len() > 128 {
        return Err("Session ID too long (max 128 characters)".into());
    }
    Ok(())
}

/// Validate a display name. Must be 1-32 chars after trimming.
pub fn validate_user_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("User name cannot be empty".into());
    }
    if name.len() > MAX_USER_NAME_LENGTH {
        return Err(format!(
            "User name too long (max {} characters)",
            MAX_USER_NAME_LENGTH
        ));
    }
    Ok(())
}

/// Validate a debate topic. Must be non-empty and under the length limit.
pub fn validate_topic(topic: &str) -> Result<(), String> {
    if topic.trim().is_empty() {
        return Err("Topic cannot be empty".into());
    }
    if topic.len() > MAX_TOPIC_LENGTH {
        return Err(format!(
            "Topic too long (max {} characters)",
            MAX_TOPIC_LENGTH
        ));
    }
    Ok(())
}

/// Validate a room title. Must be non-empty and under the length limit.
pub fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title cannot be empty".into());
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(format!(
            "Title too long (max {} characters)",
            MAX_TITLE_LENGTH
        ));
    }
    Ok(())
}

/// Validate a room description. Can be empty but has a length limit.
pub fn validate_description(description: &str) -> Result<(), String> {
    if description.len() > MAX_DESCRIPTION_LENGTH {
        return Err(format!(
            "Description too long (max {} characters)",
            MAX_DESCRIPTION_LENGTH
        ));
    }
    Ok(())
}

/// Validate message content. Must be non-empty and under the length limit.
pub fn validate_message(content: &str) -> Result<(), String> {
    if content.trim().is_empty() {
        return Err("Message cannot be empty".into());
    }
    if content.len() > MAX_MESSAGE_LENGTH {
        return Err(format!(
            "Message too long (max {} characters)",
            MAX_MESSAGE_LENGTH
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_inputs() {
        assert!(validate_session_id("f3f2c6de-1b9a").is_ok());
        assert!(validate_user_name("Alice").is_ok());
        assert!(validate_topic("Pineapple belongs on pizza").is_ok());
        assert!(validate_title("Friday debate").is_ok());
        assert!(validate_description("").is_ok());
        assert!(validate_message("Opening statement").is_ok());
    }

    #[test]
    fn test_empty_required_fields_rejected() {
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("   ").is_err());
        assert!(validate_user_name("").is_err());
        assert!(validate_user_name(" \t ").is_err());
        assert!(validate_topic("").is_err());
        assert!(validate_title("").is_err());
        assert!(validate_message("   ").is_err());
    }

    #[test]
    fn test_length_limits() {
        assert!(validate_user_name(&"x".repeat(MAX_USER_NAME_LENGTH)).is_ok());
        assert!(validate_user_name(&"x".repeat(MAX_USER_NAME_LENGTH + 1)).is_err());
        assert!(validate_topic(&"x".repeat(MAX_TOPIC_LENGTH + 1)).is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LENGTH + 1)).is_err());
        assert!(validate_description(&"x".repeat(MAX_DESCRIPTION_LENGTH + 1)).is_err());
        assert!(validate_message(&"x".repeat(MAX_MESSAGE_LENGTH + 1)).is_err());
        assert!(validate_session_id(&"x".repeat(129)).is_err());
    }
}
