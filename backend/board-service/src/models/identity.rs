use serde::Serialize;

/// Display identity attached to an activity item.
///
/// Both fields serialize even when empty, so clients always see the
/// `{name, avatar}` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

impl Identity {
    pub fn new(name: Option<String>, avatar_reference: Option<String>) -> Self {
        Self {
            name,
            avatar: avatar_reference.as_deref().and_then(avatar_url),
        }
    }
}

/// Turn a stored image reference into a client-usable URL.
///
/// Absolute URLs pass through; bare references are served from the root.
pub fn avatar_url(reference: &str) -> Option<String> {
    if reference.is_empty() {
        None
    } else if reference.starts_with("http") {
        Some(reference.to_string())
    } else {
        Some(format!("/{}", reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_url() {
        assert_eq!(
            avatar_url("https://cdn.example.com/a.png").as_deref(),
            Some("https://cdn.example.com/a.png")
        );
        assert_eq!(avatar_url("villain.png").as_deref(), Some("/villain.png"));
        assert_eq!(avatar_url(""), None);
    }

    #[test]
    fn test_identity_without_avatar() {
        let identity = Identity::new(Some("Old Time-y Anon".to_string()), None);
        assert_eq!(identity.avatar, None);
        assert_eq!(
            serde_json::to_value(Identity::new(None, None)).unwrap(),
            serde_json::json!({"name": null, "avatar": null})
        );
    }
}
