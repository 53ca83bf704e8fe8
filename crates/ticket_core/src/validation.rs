//! Field validators. Each returns the first failing rule's message, or an empty
//! string when the value is acceptable.

use shared::domain::{TextField, ALLOWED_AVATAR_MIME_TYPES, MAX_AVATAR_BYTES};

use crate::avatar::AvatarFile;

pub const NAME_TOO_SHORT: &str = "Name must be at least 2 characters long";
pub const NAME_TOO_LONG: &str = "Name must be less than 50 characters";
pub const NAME_INVALID_CHARS: &str = "Name can only contain letters and spaces";
pub const EMAIL_INVALID: &str = "Please enter a valid email address";
pub const GITHUB_INVALID: &str = "Invalid GitHub username format";
pub const GITHUB_REQUIRED: &str = "GitHub username is required";
pub const AVATAR_REQUIRED: &str = "Avatar is required";
pub const AVATAR_TOO_LARGE: &str = "File size must be less than 500KB";
pub const AVATAR_WRONG_TYPE: &str = "Only JPG and PNG files are allowed";
pub const AVATAR_UNREADABLE: &str = "Could not read the selected file";

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 50;

pub fn validate_full_name(name: &str) -> String {
    let length = name.chars().count();
    if length < NAME_MIN_CHARS {
        return NAME_TOO_SHORT.to_string();
    }
    if length > NAME_MAX_CHARS {
        return NAME_TOO_LONG.to_string();
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c.is_whitespace())
    {
        return NAME_INVALID_CHARS.to_string();
    }
    String::new()
}

/// Accepts `local@domain.tld`: no whitespace, exactly one `@`, and a dot in the
/// domain with at least one character on each side of it.
pub fn validate_email(email: &str) -> String {
    if is_plausible_email(email) {
        String::new()
    } else {
        EMAIL_INVALID.to_string()
    }
}

fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(idx, c)| c == '.' && idx > 0 && idx + 1 < domain.len())
}

pub fn validate_github_username(username: &str) -> String {
    let trimmed = username.trim();
    let handle = trimmed.strip_prefix('@').unwrap_or(trimmed);
    if handle.is_empty() {
        return GITHUB_REQUIRED.to_string();
    }
    // Surrounding whitespace is not part of a valid handle.
    let well_formed = trimmed.len() == username.len()
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !well_formed {
        return GITHUB_INVALID.to_string();
    }
    String::new()
}

/// `required == false` lets an absent avatar through; a present one is always
/// checked for size and type.
pub fn validate_avatar(file: Option<&AvatarFile>, required: bool) -> String {
    let Some(file) = file else {
        return if required {
            AVATAR_REQUIRED.to_string()
        } else {
            String::new()
        };
    };
    if file.size_bytes() > MAX_AVATAR_BYTES {
        return AVATAR_TOO_LARGE.to_string();
    }
    if !ALLOWED_AVATAR_MIME_TYPES.contains(&file.mime_type()) {
        return AVATAR_WRONG_TYPE.to_string();
    }
    String::new()
}

pub fn validate_text_field(field: TextField, value: &str) -> String {
    match field {
        TextField::FullName => validate_full_name(value),
        TextField::Email => validate_email(value),
        TextField::GithubUsername => validate_github_username(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_letter_and_space_names_within_bounds() {
        let longest = "a".repeat(50);
        for name in ["Al", "Ada Lovelace", "  Grace  Hopper ", longest.as_str()] {
            assert_eq!(validate_full_name(name), "", "{name:?} should pass");
        }
    }

    #[test]
    fn name_rules_short_circuit_in_order() {
        assert_eq!(validate_full_name(""), NAME_TOO_SHORT);
        assert_eq!(validate_full_name("1"), NAME_TOO_SHORT);
        assert_eq!(validate_full_name(&"a".repeat(51)), NAME_TOO_LONG);
        assert_eq!(validate_full_name(&"1".repeat(51)), NAME_TOO_LONG);
        assert_eq!(validate_full_name("R2 D2"), NAME_INVALID_CHARS);
        assert_eq!(validate_full_name("O'Brien"), NAME_INVALID_CHARS);
        assert_eq!(validate_full_name("Zoë"), NAME_INVALID_CHARS);
    }

    #[test]
    fn email_requires_single_at_and_inner_dot() {
        assert_eq!(validate_email("a@b.com"), "");
        assert_eq!(validate_email("first.last@sub.example.org"), "");

        for bad in [
            "",
            "plain",
            "a@b",
            "a@.com",
            "a@b.",
            "@b.com",
            "a@@b.com",
            "a@b@c.com",
            "a b@c.com",
            "a@b .com",
        ] {
            assert_eq!(validate_email(bad), EMAIL_INVALID, "{bad:?} should fail");
        }
    }

    #[test]
    fn github_handles_allow_optional_at_prefix() {
        assert_eq!(validate_github_username("@octocat"), "");
        assert_eq!(validate_github_username("octocat"), "");
        assert_eq!(validate_github_username("octo-cat-42"), "");
    }

    #[test]
    fn github_rejects_malformed_handles() {
        assert_eq!(validate_github_username("octo cat"), GITHUB_INVALID);
        assert_eq!(validate_github_username("@@octocat"), GITHUB_INVALID);
        assert_eq!(validate_github_username("octo_cat"), GITHUB_INVALID);
        assert_eq!(validate_github_username(" octocat"), GITHUB_INVALID);
    }

    #[test]
    fn github_empty_after_stripping_is_required() {
        assert_eq!(validate_github_username(""), GITHUB_REQUIRED);
        assert_eq!(validate_github_username("@"), GITHUB_REQUIRED);
        assert_eq!(validate_github_username("   "), GITHUB_REQUIRED);
    }

    #[test]
    fn avatar_checks_presence_then_size_then_type() {
        let big_jpeg = AvatarFile::from_bytes("big.jpg", "image/jpeg", vec![0u8; 600 * 1024]);
        let small_gif = AvatarFile::from_bytes("anim.gif", "image/gif", vec![0u8; 10 * 1024]);
        let small_png = AvatarFile::from_bytes("me.png", "image/png", vec![0u8; 10 * 1024]);
        let big_gif = AvatarFile::from_bytes("big.gif", "image/gif", vec![0u8; 600 * 1024]);
        let exact_limit = AvatarFile::from_bytes("edge.png", "image/png", vec![0u8; 500 * 1024]);

        assert_eq!(validate_avatar(None, true), AVATAR_REQUIRED);
        assert_eq!(validate_avatar(None, false), "");
        assert_eq!(validate_avatar(Some(&big_jpeg), true), AVATAR_TOO_LARGE);
        assert_eq!(validate_avatar(Some(&small_gif), true), AVATAR_WRONG_TYPE);
        assert_eq!(validate_avatar(Some(&big_gif), true), AVATAR_TOO_LARGE);
        assert_eq!(validate_avatar(Some(&small_png), true), "");
        assert_eq!(validate_avatar(Some(&exact_limit), true), "");
    }

    #[test]
    fn dispatches_by_text_field() {
        assert_eq!(validate_text_field(TextField::Email, "nope"), EMAIL_INVALID);
        assert_eq!(validate_text_field(TextField::FullName, "Ada"), "");
        assert_eq!(validate_text_field(TextField::GithubUsername, ""), GITHUB_REQUIRED);
    }
}
