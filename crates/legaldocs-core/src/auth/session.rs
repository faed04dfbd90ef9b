use serde::{Deserialize, Serialize};

/// Substring that marks an email address as belonging to an administrator.
/// Placeholder rule used by the demo authenticator only.
const ADMIN_MARKER: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Admin,
    // Records written by the web client use "user"
    #[serde(alias = "user")]
    StandardUser,
}

impl Role {
    /// Derive a role from an email address.
    ///
    /// Any address containing `admin` (case-sensitive, anywhere) is an admin.
    /// This is a stand-in until roles come from a trusted issuer.
    pub fn from_email(email_address: &str) -> Self {
        if email_address.contains(ADMIN_MARKER) {
            Role::Admin
        } else {
            Role::StandardUser
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::StandardUser => "standard-user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The currently authenticated identity.
///
/// Serialized as `{ "id", "emailAddress", "role", "displayName"? }`, the same
/// record shape the credential store holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    #[serde(alias = "email")]
    pub email_address: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "name")]
    pub display_name: Option<String>,
}

impl Session {
    /// Build a session, filling in the display name from the email's local
    /// part when none (or a blank one) is supplied. A non-blank name is kept
    /// as given.
    pub fn new(
        id: impl Into<String>,
        email_address: impl Into<String>,
        role: Role,
        display_name: Option<&str>,
    ) -> Self {
        let email_address = email_address.into();
        let display_name = display_name
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| local_part(&email_address).to_string());

        Self {
            id: id.into(),
            email_address,
            role,
            display_name: Some(display_name),
        }
    }

    /// Name shown in navigation: display name if present, otherwise the email.
    pub fn display_label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.email_address)
    }

    pub fn to_record(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_record(record: &str) -> serde_json::Result<Self> {
        serde_json::from_str(record)
    }
}

/// Everything before the first `@`, or the whole address if there is none.
pub fn local_part(email_address: &str) -> &str {
    email_address
        .split_once('@')
        .map(|(local, _)| local)
        .unwrap_or(email_address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_email() {
        assert_eq!(Role::from_email("admin@example.com"), Role::Admin);
        assert_eq!(Role::from_email("sysadmin@corp.io"), Role::Admin);
        assert_eq!(Role::from_email("jane@admin.example.com"), Role::Admin);
        assert_eq!(Role::from_email("sarah@example.com"), Role::StandardUser);
        // Case-sensitive
        assert_eq!(Role::from_email("ADMIN@example.com"), Role::StandardUser);
        assert_eq!(Role::from_email("Admin@example.com"), Role::StandardUser);
        assert_eq!(Role::from_email(""), Role::StandardUser);
    }

    #[test]
    fn test_local_part() {
        assert_eq!(local_part("sarah@example.com"), "sarah");
        assert_eq!(local_part("a@b@c"), "a");
        assert_eq!(local_part("no-at-sign"), "no-at-sign");
        assert_eq!(local_part("@example.com"), "");
    }

    #[test]
    fn test_session_new_defaults_display_name() {
        let session = Session::new("1", "admin@example.com", Role::Admin, None);
        assert_eq!(session.display_name.as_deref(), Some("admin"));

        let session = Session::new("2", "sarah@example.com", Role::StandardUser, Some("  "));
        assert_eq!(session.display_name.as_deref(), Some("sarah"));

        let session = Session::new("2", "sarah@example.com", Role::StandardUser, Some("Sarah K"));
        assert_eq!(session.display_name.as_deref(), Some("Sarah K"));

        // Kept exactly as given once it is not blank
        let session = Session::new("2", "sarah@example.com", Role::StandardUser, Some("  Sarah "));
        assert_eq!(session.display_name.as_deref(), Some("  Sarah "));
    }

    #[test]
    fn test_display_label_falls_back_to_email() {
        let mut session = Session::new("1", "sarah@example.com", Role::StandardUser, None);
        assert_eq!(session.display_label(), "sarah");
        session.display_name = None;
        assert_eq!(session.display_label(), "sarah@example.com");
        session.display_name = Some(String::new());
        assert_eq!(session.display_label(), "sarah@example.com");
    }

    #[test]
    fn test_record_field_names() {
        let session = Session::new("1", "admin@example.com", Role::Admin, None);
        let value: serde_json::Value = serde_json::from_str(&session.to_record().unwrap()).unwrap();
        assert_eq!(value["id"], "1");
        assert_eq!(value["emailAddress"], "admin@example.com");
        assert_eq!(value["role"], "admin");
        assert_eq!(value["displayName"], "admin");
    }

    #[test]
    fn test_record_accepts_web_client_shape() {
        let record = r#"{"id":"2","email":"sarah@example.com","role":"user","name":"sarah"}"#;
        let session = Session::from_record(record).unwrap();
        assert_eq!(session.email_address, "sarah@example.com");
        assert_eq!(session.role, Role::StandardUser);
        assert_eq!(session.display_name.as_deref(), Some("sarah"));
    }

    #[test]
    fn test_record_without_display_name() {
        let record = r#"{"id":"x","emailAddress":"a@b.c","role":"standard-user"}"#;
        let session = Session::from_record(record).unwrap();
        assert_eq!(session.display_name, None);
        assert!(!session.to_record().unwrap().contains("displayName"));
    }

    #[test]
    fn test_record_rejects_garbage() {
        assert!(Session::from_record("not json").is_err());
        assert!(Session::from_record(r#"{"id":"1"}"#).is_err());
        assert!(Session::from_record(r#"{"id":"1","emailAddress":"a","role":"root"}"#).is_err());
    }
}
