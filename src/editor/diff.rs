//! Field-level diff between an edited member and its original.

use crate::models::{GroupMember, MemberField, MemberPatch};

/// Fields of `edited` that differ from `original`, skipping `identity_key`.
///
/// An empty patch means the edit changed nothing and must not be recorded.
pub fn compute_changes(
    original: &GroupMember,
    edited: &GroupMember,
    identity_key: MemberField,
) -> MemberPatch {
    let mut patch = MemberPatch::default();

    for field in MemberField::ALL {
        if field == identity_key || field == MemberField::Id {
            continue;
        }
        match field {
            MemberField::FullName if edited.full_name != original.full_name => {
                patch.full_name = Some(edited.full_name.clone());
            }
            MemberField::NationalId if edited.national_id != original.national_id => {
                patch.national_id = Some(edited.national_id.clone());
            }
            MemberField::Role if edited.role != original.role => {
                patch.role = Some(edited.role);
            }
            MemberField::PhoneNumber if edited.phone_number != original.phone_number => {
                patch.phone_number = Some(edited.phone_number.clone());
            }
            MemberField::IdFrontUrl if edited.id_front_url != original.id_front_url => {
                patch.id_front_url = Some(edited.id_front_url.clone());
            }
            MemberField::IdBackUrl if edited.id_back_url != original.id_back_url => {
                patch.id_back_url = Some(edited.id_back_url.clone());
            }
            _ => {}
        }
    }

    patch
}
