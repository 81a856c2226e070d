//! Group member models matching the frontend GroupMember interface.

use serde::{Deserialize, Deserializer, Serialize};

/// Prefix for client-side identities assigned to members that have not been persisted.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Provisional identity for an unsaved member, derived from its phone number.
pub fn temp_member_id(phone_number: &str) -> String {
    format!("{}{}", TEMP_ID_PREFIX, phone_number)
}

/// Whether an id was issued by the client rather than the store.
pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

/// Role a member holds within the group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum MemberRole {
    #[default]
    #[serde(rename = "member")]
    Member,
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "chair")]
    Chair,
    #[serde(rename = "deputy chair")]
    DeputyChair,
    #[serde(rename = "treasurer")]
    Treasurer,
    #[serde(rename = "secretary")]
    Secretary,
}

impl MemberRole {
    pub const ALL: [MemberRole; 6] = [
        MemberRole::Member,
        MemberRole::Admin,
        MemberRole::Chair,
        MemberRole::DeputyChair,
        MemberRole::Treasurer,
        MemberRole::Secretary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Member => "member",
            MemberRole::Admin => "admin",
            MemberRole::Chair => "chair",
            MemberRole::DeputyChair => "deputy chair",
            MemberRole::Treasurer => "treasurer",
            MemberRole::Secretary => "secretary",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == s)
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every field of a member record, used for sorting, diffing and field-scoped errors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum MemberField {
    Id,
    FullName,
    NationalId,
    Role,
    PhoneNumber,
    IdFrontUrl,
    IdBackUrl,
}

impl MemberField {
    pub const ALL: [MemberField; 7] = [
        MemberField::Id,
        MemberField::FullName,
        MemberField::NationalId,
        MemberField::Role,
        MemberField::PhoneNumber,
        MemberField::IdFrontUrl,
        MemberField::IdBackUrl,
    ];

    /// Name used on the wire and in query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberField::Id => "id",
            MemberField::FullName => "fullName",
            MemberField::NationalId => "nationalId",
            MemberField::Role => "role",
            MemberField::PhoneNumber => "phoneNumber",
            MemberField::IdFrontUrl => "idFrontUrl",
            MemberField::IdBackUrl => "idBackUrl",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == s)
    }

    /// Column backing this field in the `group_members` table.
    pub fn column(&self) -> &'static str {
        match self {
            MemberField::Id => "id",
            MemberField::FullName => "full_name",
            MemberField::NationalId => "national_id",
            MemberField::Role => "role",
            MemberField::PhoneNumber => "phone_number",
            MemberField::IdFrontUrl => "id_front_url",
            MemberField::IdBackUrl => "id_back_url",
        }
    }
}

impl std::fmt::Display for MemberField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member of an investment group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub national_id: String,
    #[serde(default)]
    pub role: MemberRole,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_front_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_back_url: Option<String>,
}

impl GroupMember {
    /// Build a member from unsaved data and an identity.
    pub fn from_new(id: impl Into<String>, data: NewMemberData) -> Self {
        Self {
            id: id.into(),
            full_name: data.full_name,
            national_id: data.national_id,
            role: data.role,
            phone_number: data.phone_number,
            id_front_url: data.id_front_url,
            id_back_url: data.id_back_url,
        }
    }

    /// Provisional member for data that has no server identity yet.
    pub fn provisional(data: NewMemberData) -> Self {
        Self::from_new(temp_member_id(&data.phone_number), data)
    }

    /// Textual value of a field; `None` for absent optional fields.
    pub fn field_value(&self, field: MemberField) -> Option<&str> {
        match field {
            MemberField::Id => Some(&self.id),
            MemberField::FullName => Some(&self.full_name),
            MemberField::NationalId => Some(&self.national_id),
            MemberField::Role => Some(self.role.as_str()),
            MemberField::PhoneNumber => Some(&self.phone_number),
            MemberField::IdFrontUrl => self.id_front_url.as_deref(),
            MemberField::IdBackUrl => self.id_back_url.as_deref(),
        }
    }

    pub fn to_new(&self) -> NewMemberData {
        NewMemberData {
            full_name: self.full_name.clone(),
            national_id: self.national_id.clone(),
            role: self.role,
            phone_number: self.phone_number.clone(),
            id_front_url: self.id_front_url.clone(),
            id_back_url: self.id_back_url.clone(),
        }
    }
}

/// Member data without an identity, as entered before the member is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewMemberData {
    pub full_name: String,
    #[serde(default)]
    pub national_id: String,
    #[serde(default)]
    pub role: MemberRole,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_front_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_back_url: Option<String>,
}

/// Field-level changes to a persisted member.
///
/// Photo URLs are nullable, so they use a double option: `None` leaves the
/// field untouched while `Some(None)` clears it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MemberPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MemberRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub id_front_url: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub id_back_url: Option<Option<String>>,
}

impl MemberPatch {
    pub fn is_empty(&self) -> bool {
        *self == MemberPatch::default()
    }

    /// Fields touched by this patch.
    pub fn fields(&self) -> Vec<MemberField> {
        let mut fields = Vec::new();
        if self.full_name.is_some() {
            fields.push(MemberField::FullName);
        }
        if self.national_id.is_some() {
            fields.push(MemberField::NationalId);
        }
        if self.role.is_some() {
            fields.push(MemberField::Role);
        }
        if self.phone_number.is_some() {
            fields.push(MemberField::PhoneNumber);
        }
        if self.id_front_url.is_some() {
            fields.push(MemberField::IdFrontUrl);
        }
        if self.id_back_url.is_some() {
            fields.push(MemberField::IdBackUrl);
        }
        fields
    }

    /// Overlay `later` onto this patch, last write wins per field.
    pub fn merge(&mut self, later: MemberPatch) {
        if later.full_name.is_some() {
            self.full_name = later.full_name;
        }
        if later.national_id.is_some() {
            self.national_id = later.national_id;
        }
        if later.role.is_some() {
            self.role = later.role;
        }
        if later.phone_number.is_some() {
            self.phone_number = later.phone_number;
        }
        if later.id_front_url.is_some() {
            self.id_front_url = later.id_front_url;
        }
        if later.id_back_url.is_some() {
            self.id_back_url = later.id_back_url;
        }
    }

    /// Clear every field whose value already equals `member`'s.
    pub fn prune_unchanged(&mut self, member: &GroupMember) {
        if self.full_name.as_ref() == Some(&member.full_name) {
            self.full_name = None;
        }
        if self.national_id.as_ref() == Some(&member.national_id) {
            self.national_id = None;
        }
        if self.role == Some(member.role) {
            self.role = None;
        }
        if self.phone_number.as_ref() == Some(&member.phone_number) {
            self.phone_number = None;
        }
        if self.id_front_url.as_ref() == Some(&member.id_front_url) {
            self.id_front_url = None;
        }
        if self.id_back_url.as_ref() == Some(&member.id_back_url) {
            self.id_back_url = None;
        }
    }

    pub fn apply_to(&self, member: &mut GroupMember) {
        if let Some(full_name) = &self.full_name {
            member.full_name = full_name.clone();
        }
        if let Some(national_id) = &self.national_id {
            member.national_id = national_id.clone();
        }
        if let Some(role) = self.role {
            member.role = role;
        }
        if let Some(phone_number) = &self.phone_number {
            member.phone_number = phone_number.clone();
        }
        if let Some(url) = &self.id_front_url {
            member.id_front_url = url.clone();
        }
        if let Some(url) = &self.id_back_url {
            member.id_back_url = url.clone();
        }
    }
}

/// A key that is present maps to `Some`, even when its value is `null`.
fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// A pending mutation of the member set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOperation {
    Add(NewMemberData),
    Remove(String),
    Update(String, MemberPatch),
}
