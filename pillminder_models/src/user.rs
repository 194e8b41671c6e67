/// Identifier of a signed-in user. Absence of an owner means the local
/// prescription cache is the source of reminder rules.
pub type OwnerId = String;
