use sha2::{Digest, Sha256};

/// Chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a sent message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

const SLUG_MAX_LEN: usize = 32;
const DIGEST_HEX_LEN: usize = 12;

/// Identifies one group's notepad.
///
/// The raw key may be anything the host hands us (a chat title, a numeric id).
/// It never reaches the filesystem directly; see [`GroupKey::storage_key`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroupKey(pub String);

impl GroupKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe key: a readable slug plus a digest of the raw key.
    ///
    /// The digest keeps distinct keys apart even when their slugs collide
    /// (`"a/b"` and `"a_b"`).
    pub fn storage_key(&self) -> String {
        let slug = slugify(&self.0);
        let digest = hex_prefix(&Sha256::digest(self.0.as_bytes()), DIGEST_HEX_LEN);
        if slug.is_empty() {
            digest
        } else {
            format!("{slug}-{digest}")
        }
    }
}

/// A group as seen by the handler: where its notes live and what to call it.
#[derive(Clone, Debug)]
pub struct GroupContext {
    pub key: GroupKey,
    pub display_name: String,
}

impl GroupContext {
    pub fn new(key: GroupKey, display_name: impl Into<String>) -> Self {
        Self {
            key,
            display_name: display_name.into(),
        }
    }
}

fn slugify(raw: &str) -> String {
    let mapped: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    mapped
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(SLUG_MAX_LEN)
        .collect()
}

fn hex_prefix(bytes: &[u8], len: usize) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(len);
    for b in bytes {
        let _ = write!(&mut out, "{:02x}", b);
        if out.len() >= len {
            out.truncate(len);
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_key_strips_path_characters() {
        let key = GroupKey::new("../../etc/passwd").storage_key();
        assert!(!key.contains('/'));
        assert!(!key.contains(".."));
        assert!(key.starts_with("etc_passwd-"));
    }

    #[test]
    fn storage_key_separates_colliding_slugs() {
        let a = GroupKey::new("a/b").storage_key();
        let b = GroupKey::new("a_b").storage_key();
        assert_ne!(a, b);
    }

    #[test]
    fn storage_key_is_stable_for_numeric_ids() {
        let k1 = GroupKey::new("-1001234567").storage_key();
        let k2 = GroupKey::new("-1001234567").storage_key();
        assert_eq!(k1, k2);
        assert!(k1.starts_with("-1001234567-"));
    }

    #[test]
    fn non_ascii_names_fall_back_to_digest() {
        let key = GroupKey::new("猎人小队").storage_key();
        assert_eq!(key.len(), DIGEST_HEX_LEN);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
