use serde::{Deserialize, Serialize};

use crate::domain::{UserField, UserFields, UserId, UserRecord};

pub const USERS_PATH: &str = "/users";

pub fn user_path(id: &UserId) -> String {
    format!("{USERS_PATH}/{}", id.as_str())
}

/// Body of a create request: every editable field, no id.
pub type NewUser = UserFields;

/// Partial update body. Absent fields are left untouched by the server and
/// are never serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl UserPatch {
    pub fn get(&self, field: UserField) -> Option<&str> {
        match field {
            UserField::Name => self.name.as_deref(),
            UserField::Email => self.email.as_deref(),
            UserField::Phone => self.phone.as_deref(),
        }
    }

    pub fn set(&mut self, field: UserField, value: impl Into<String>) {
        let slot = match field {
            UserField::Name => &mut self.name,
            UserField::Email => &mut self.email,
            UserField::Phone => &mut self.phone,
        };
        *slot = Some(value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none()
    }

    /// Present keys in field order.
    pub fn entries(&self) -> impl Iterator<Item = (UserField, &str)> + '_ {
        UserField::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|value| (field, value)))
    }

    pub fn apply_to(&self, record: &mut UserRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(email) = &self.email {
            record.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            record.phone = phone.clone();
        }
    }
}

impl From<UserFields> for UserPatch {
    fn from(value: UserFields) -> Self {
        Self {
            name: Some(value.name),
            email: Some(value.email),
            phone: Some(value.phone),
        }
    }
}

impl From<&UserRecord> for UserPatch {
    fn from(value: &UserRecord) -> Self {
        value.fields().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_serializes_only_present_fields() {
        let mut patch = UserPatch::default();
        patch.set(UserField::Email, "a@b.com");

        let json = serde_json::to_value(&patch).expect("json");
        assert_eq!(json, serde_json::json!({ "email": "a@b.com" }));
    }

    #[test]
    fn record_uses_flat_wire_shape() {
        let record: UserRecord = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "name": "Alice",
            "email": "a@b.com",
            "phone": "555"
        }))
        .expect("record");

        assert_eq!(record.id, UserId::new("u1"));
        assert_eq!(record.get(UserField::Phone), "555");
    }

    #[test]
    fn apply_patch_leaves_absent_fields_untouched() {
        let mut record = UserRecord::new("u1", UserFields::new("Alice", "a@b.com", "555"));
        let patch = UserPatch {
            phone: Some("777".into()),
            ..UserPatch::default()
        };

        patch.apply_to(&mut record);

        assert_eq!(record.name, "Alice");
        assert_eq!(record.phone, "777");
    }
}
