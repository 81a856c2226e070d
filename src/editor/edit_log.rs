//! Pending member mutations for a group being edited.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{temp_member_id, EditOperation, GroupMember, MemberPatch, NewMemberData};

/// Id-keyed record of additions, updates and removals not yet submitted.
///
/// Updates to the same member coalesce into one patch. Additions keep their
/// insertion order and are addressed by their provisional `temp-` id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditLog {
    added: Vec<NewMemberData>,
    updated: BTreeMap<String, MemberPatch>,
    deleted: BTreeSet<String>,
}

impl EditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn added(&self) -> &[NewMemberData] {
        &self.added
    }

    pub fn updated(&self) -> &BTreeMap<String, MemberPatch> {
        &self.updated
    }

    pub fn deleted(&self) -> &BTreeSet<String> {
        &self.deleted
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    pub fn is_deleted(&self, id: &str) -> bool {
        self.deleted.contains(id)
    }

    /// Position of the pending addition whose provisional id is `id`.
    pub fn added_position(&self, id: &str) -> Option<usize> {
        self.added
            .iter()
            .position(|member| temp_member_id(&member.phone_number) == id)
    }

    /// Pending additions in the full member shape, newest last.
    pub fn added_members(&self) -> impl Iterator<Item = GroupMember> + '_ {
        self.added
            .iter()
            .cloned()
            .map(GroupMember::provisional)
    }

    /// Record one operation.
    pub fn apply(&mut self, op: EditOperation) {
        match op {
            EditOperation::Add(data) => self.added.push(data),
            EditOperation::Update(id, patch) => {
                if patch.is_empty() {
                    return;
                }
                if let Some(pos) = self.added_position(&id) {
                    let mut member = GroupMember::provisional(self.added[pos].clone());
                    patch.apply_to(&mut member);
                    self.added[pos] = member.to_new();
                } else {
                    self.updated.entry(id).or_default().merge(patch);
                }
            }
            EditOperation::Remove(id) => {
                if let Some(pos) = self.added_position(&id) {
                    self.added.remove(pos);
                } else {
                    // Nothing left to update once the member is gone
                    self.updated.remove(&id);
                    self.deleted.insert(id);
                }
            }
        }
    }

    /// Drop the fields of `id`'s pending update that match `persisted`.
    pub fn prune_update(&mut self, id: &str, persisted: &GroupMember) {
        if let Some(patch) = self.updated.get_mut(id) {
            patch.prune_unchanged(persisted);
            if patch.is_empty() {
                self.updated.remove(id);
            }
        }
    }

    /// Copy with `op` applied, for committing through the history.
    pub fn with(&self, op: EditOperation) -> Self {
        let mut next = self.clone();
        next.apply(op);
        next
    }
}
