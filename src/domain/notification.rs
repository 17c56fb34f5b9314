//! Account notifications sent on registration and login.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Registration,
    Login,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub to: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn new(to: &str, kind: NotificationKind) -> Self {
        Notification {
            to: to.to_string(),
            kind,
        }
    }

    pub fn subject(&self) -> &'static str {
        match self.kind {
            NotificationKind::Registration => "Welcome to Stockfolio!",
            NotificationKind::Login => "Login Successful",
        }
    }

    pub fn text(&self) -> &'static str {
        match self.kind {
            NotificationKind::Registration => {
                "Thank you for joining Stockfolio. Your account has been successfully created."
            }
            NotificationKind::Login => "You have successfully logged into your Stockfolio account.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subjects_differ_by_kind() {
        let welcome = Notification::new("a@x.com", NotificationKind::Registration);
        let login = Notification::new("a@x.com", NotificationKind::Login);
        assert_ne!(welcome.subject(), login.subject());
        assert!(welcome.text().contains("created"));
    }
}
