//! Required-field and phone uniqueness checks run before an add or edit.

use crate::errors::FieldError;
use crate::models::{GroupMember, MemberField, NewMemberData};

/// Whether `candidate` is already held by one of `members`.
///
/// `exclude_id` names the member being edited so its own number never
/// counts as a duplicate.
pub fn is_phone_number_taken<'a, I>(members: I, candidate: &str, exclude_id: Option<&str>) -> bool
where
    I: IntoIterator<Item = &'a GroupMember>,
{
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return false;
    }
    members
        .into_iter()
        .filter(|member| Some(member.id.as_str()) != exclude_id)
        .any(|member| member.phone_number.trim() == candidate)
}

/// Fields that must be filled in. The national ID is collected but optional.
pub fn missing_fields(data: &NewMemberData) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if data.full_name.trim().is_empty() {
        errors.push(FieldError::required(MemberField::FullName));
    }
    if data.phone_number.trim().is_empty() {
        errors.push(FieldError::required(MemberField::PhoneNumber));
    }
    errors
}

/// All checks for one add or edit. Returns every failing field.
pub fn validate_member<'a, I>(
    data: &NewMemberData,
    members: I,
    exclude_id: Option<&str>,
) -> Result<(), Vec<FieldError>>
where
    I: IntoIterator<Item = &'a GroupMember>,
{
    let mut errors = missing_fields(data);
    if is_phone_number_taken(members, &data.phone_number, exclude_id) {
        errors.push(FieldError::duplicate_phone());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
