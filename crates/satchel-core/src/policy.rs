//! Visibility and mutation rights.
//!
//! Both are pure functions of the caller's [`Role`] tag and the
//! [`EntityKind`]; nothing here touches the store.

use crate::{
  UserId,
  kind::EntityKind,
  predicate::{Condition, Operand, Predicate},
  principal::{Principal, Role},
};

/// The base predicate restricting which rows of `kind` the principal may see.
///
/// Every listing starts from this predicate; caller filters are appended to
/// it and can only narrow the result.
pub fn scope(principal: &Principal, kind: EntityKind) -> Predicate {
  match (principal.role(), kind.owner_field()) {
    (Role::Staff, _) | (Role::Member, None) => Predicate::all(),
    (Role::Member, Some(field)) => Predicate::all()
      .and(Condition::eq(field, Operand::Int(principal.user_id))),
  }
}

/// Whether the principal may create, change or delete a row of `kind` whose
/// owning user (or creator, for assignments) is `owner`.
pub fn may_modify(
  principal: &Principal,
  kind: EntityKind,
  owner: Option<UserId>,
) -> bool {
  match (principal.role(), kind) {
    (Role::Staff, _) => true,
    (Role::Member, EntityKind::Subject) => false,
    (Role::Member, _) => owner == Some(principal.user_id),
  }
}

/// The user a newly created row is attributed to.
///
/// Staff may attribute a row to anyone; everyone else always writes as
/// themselves, whatever the request asked for.
pub fn attribute(principal: &Principal, requested: Option<UserId>) -> UserId {
  match principal.role() {
    Role::Staff => requested.unwrap_or(principal.user_id),
    Role::Member => principal.user_id,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::predicate::Field;

  const OWNED: [EntityKind; 4] = [
    EntityKind::Grade,
    EntityKind::Attendance,
    EntityKind::Event,
    EntityKind::Enrollment,
  ];

  #[test]
  fn staff_sees_everything() {
    let staff = Principal::staff(1);
    for kind in OWNED {
      assert!(scope(&staff, kind).is_all(), "{kind:?}");
    }
  }

  #[test]
  fn member_sees_only_own_rows() {
    let me = Principal::member(42);
    for kind in OWNED {
      let p = scope(&me, kind);
      assert_eq!(p.conditions().len(), 1);
      assert_eq!(p.conditions()[0].operand, Operand::Int(42));
    }
    assert_eq!(
      scope(&me, EntityKind::Event).conditions()[0].field,
      Field::OwnerId
    );
    assert_eq!(
      scope(&me, EntityKind::Grade).conditions()[0].field,
      Field::UserId
    );
  }

  #[test]
  fn subjects_and_assignments_are_public() {
    let me = Principal::member(42);
    assert!(scope(&me, EntityKind::Subject).is_all());
    assert!(scope(&me, EntityKind::Assignment).is_all());
  }

  #[test]
  fn members_cannot_write_subjects() {
    let me = Principal::member(5);
    assert!(!may_modify(&me, EntityKind::Subject, Some(5)));
    assert!(may_modify(&Principal::staff(1), EntityKind::Subject, None));
  }

  #[test]
  fn members_modify_only_their_own_rows() {
    let me = Principal::member(5);
    assert!(may_modify(&me, EntityKind::Enrollment, Some(5)));
    assert!(!may_modify(&me, EntityKind::Enrollment, Some(6)));
    assert!(!may_modify(&me, EntityKind::Assignment, None));
  }

  #[test]
  fn members_cannot_attribute_rows_to_others() {
    assert_eq!(attribute(&Principal::member(5), Some(9)), 5);
    assert_eq!(attribute(&Principal::staff(1), Some(9)), 9);
    assert_eq!(attribute(&Principal::staff(1), None), 1);
  }
}
