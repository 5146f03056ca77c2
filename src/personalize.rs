//! Placeholder substitution for outgoing replies.

/// Replace `%name%` with the recipient's first name.
pub fn personalize(message: &str, first_name: &str) -> String {
    message.replace("%name%", first_name)
}

/// Replace `%keyword%` with the matched keyword token.
pub fn substitute_keyword(message: &str, token: &str) -> String {
    message.replace("%keyword%", token)
}

/// Replace `%s` with the first name captured by a "name" command.
pub fn substitute_name(message: &str, first_name: &str) -> String {
    message.replace("%s", first_name)
}
