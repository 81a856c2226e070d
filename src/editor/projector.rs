//! Derives the member list to display from the current snapshot.

use std::cmp::Ordering;

use crate::models::{GroupMember, MemberField, MemberPage, PageQuery, SortOrder};

use super::edit_log::EditLog;

/// The rows to render and the count to show in the pager.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemberView {
    pub members: Vec<GroupMember>,
    pub total_count: usize,
}

/// Substring match against any field value, ignoring ASCII case.
///
/// Folding is ASCII-only so results agree with SQLite's `lower()`.
pub fn matches_search(member: &GroupMember, search: &str) -> bool {
    let needle = search.trim().to_ascii_lowercase();
    if needle.is_empty() {
        return true;
    }
    MemberField::ALL
        .iter()
        .filter_map(|field| member.field_value(*field))
        .any(|value| value.to_ascii_lowercase().contains(&needle))
}

/// Compare two members on one field. Missing or empty values tie.
pub fn compare_by_field(
    a: &GroupMember,
    b: &GroupMember,
    field: MemberField,
    order: SortOrder,
) -> Ordering {
    match (a.field_value(field), b.field_value(field)) {
        (Some(x), Some(y)) if !x.is_empty() && !y.is_empty() => match order {
            SortOrder::Asc => x.cmp(y),
            SortOrder::Desc => y.cmp(x),
        },
        _ => Ordering::Equal,
    }
}

/// Stable insertion sort.
///
/// Ties on missing values make `compare_by_field` non-transitive, which
/// `slice::sort_by` is allowed to reject.
fn stable_sort_by<T, F>(items: &mut [T], mut compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && compare(&items[j - 1], &items[j]) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Create mode: filter, sort and slice the in-memory list.
pub fn project_create(members: &[GroupMember], query: &PageQuery) -> MemberView {
    let mut filtered: Vec<GroupMember> = members
        .iter()
        .filter(|member| matches_search(member, &query.search))
        .cloned()
        .collect();

    if let Some(field) = query.sort_field {
        stable_sort_by(&mut filtered, |a, b| {
            compare_by_field(a, b, field, query.sort_order)
        });
    }

    let total_count = filtered.len();
    let members = filtered
        .into_iter()
        .skip(query.offset())
        .take(query.page_size)
        .collect();

    MemberView {
        members,
        total_count,
    }
}

/// Edit mode: merge the pending log into the loaded base page.
///
/// Updates only show on members present in `base`; off-page edits stay in
/// the log for submission. Additions are prepended regardless of page,
/// search or sort, and the total is the server total adjusted by the number
/// of pending additions and deletions.
pub fn project_edit(base: &MemberPage, log: &EditLog) -> MemberView {
    let mut members: Vec<GroupMember> = log.added_members().collect();

    members.extend(
        base.members
            .iter()
            .filter(|member| !log.is_deleted(&member.id))
            .map(|member| {
                let mut member = member.clone();
                if let Some(patch) = log.updated().get(&member.id) {
                    patch.apply_to(&mut member);
                }
                member
            }),
    );

    let total_count = (base.total_count + log.added().len()).saturating_sub(log.deleted().len());

    MemberView {
        members,
        total_count,
    }
}
