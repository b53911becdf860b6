//! # Entities and Field References
//!
//! How the generic persistence facade sees a business record without knowing
//! its fields.
//!
//! ## Registration Instead of Reflection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Per-Type Registration Table                          │
//! │                                                                         │
//! │  impl Entity for Item {                                                │
//! │      const SCHEMA = EntitySchema {                                     │
//! │          tag: "items",                                                 │
//! │          fields: [                                                     │
//! │            ("name",     column "name",        Text),                   │
//! │            ("category", column "category_id", Reference → categories), │
//! │            ...                                                         │
//! │          ]                                                             │
//! │      }                                                                 │
//! │  }                                                                     │
//! │                                                                         │
//! │  Field::<Item>::new("category")                                        │
//! │       │  resolve() against Item::SCHEMA                               │
//! │       ▼                                                                 │
//! │  FieldDef { column: "category_id", kind: Reference, .. }               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  WHERE "category_id" = ?                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `Field<E>` can only be handed to facade calls for `E`, so using a field
//! against the wrong type does not compile. A field naming an attribute that
//! `E` does not declare is a coding mistake and panics on resolution.

use std::fmt;
use std::marker::PhantomData;

use crate::error::DecodeError;
use crate::value::Row;

// =============================================================================
// Schema
// =============================================================================

/// Storage kind of one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Real,
    Text,
    Bool,
    Date,
    Timestamp,
    /// Holds the identity of another entity (a foreign key).
    Reference,
}

/// One attribute of an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Attribute name used by field references and join specifications.
    pub name: &'static str,
    /// Column the attribute is stored in.
    pub column: &'static str,
    pub kind: FieldKind,
    /// Type tag of the referenced entity, for `Reference` fields.
    pub references: Option<&'static str>,
}

impl FieldDef {
    pub const fn scalar(name: &'static str, kind: FieldKind) -> Self {
        FieldDef {
            name,
            column: name,
            kind,
            references: None,
        }
    }

    pub const fn reference(name: &'static str, column: &'static str, target: &'static str) -> Self {
        FieldDef {
            name,
            column,
            kind: FieldKind::Reference,
            references: Some(target),
        }
    }

    pub fn is_association(&self) -> bool {
        self.kind == FieldKind::Reference
    }
}

/// The registration table of one entity type.
#[derive(Debug, PartialEq, Eq)]
pub struct EntitySchema {
    /// Type tag; also the table the entity is stored in.
    pub tag: &'static str,
    /// Every attribute except the identity.
    pub fields: &'static [FieldDef],
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        let fields: &'static [FieldDef] = self.fields;
        fields.iter().find(|f| f.name == name)
    }

    /// Resolves an attribute name, panicking on names the type doesn't declare.
    pub fn expect_field(&self, name: &str) -> &'static FieldDef {
        self.field(name).unwrap_or_else(|| {
            panic!(
                "field reference '{}' does not belong to entity '{}'",
                name, self.tag
            )
        })
    }

    /// Resolves a join name, panicking unless it names an association.
    pub fn expect_association(&self, name: &str) -> &'static FieldDef {
        let def = self.expect_field(name);
        assert!(
            def.is_association(),
            "'{}.{}' is not an association and cannot be joined",
            self.tag,
            name
        );
        def
    }

    pub fn associations(&self) -> impl Iterator<Item = &'static FieldDef> {
        let fields: &'static [FieldDef] = self.fields;
        fields.iter().filter(|f| f.is_association())
    }
}

// =============================================================================
// Entity
// =============================================================================

/// A business record the persistence facade can store.
///
/// Implementors describe themselves once through [`Entity::SCHEMA`] and
/// convert to and from [`Row`]s; everything else (lookups, joins, upsert,
/// cascade) is generic.
pub trait Entity: Clone + Send + Sync + 'static {
    const SCHEMA: &'static EntitySchema;

    /// The identity, `None` until the first successful persist.
    fn id(&self) -> Option<i64>;

    /// Called once by the facade after an insert.
    fn set_id(&mut self, id: i64);

    /// All attribute columns, without the identity.
    fn to_row(&self) -> Row;

    /// Builds the entity from a stored row (identity included).
    fn from_row(row: &Row) -> Result<Self, DecodeError>;

    /// Stores an eagerly fetched associated record under `association`.
    fn attach(&mut self, association: &str, _target: &Row) -> Result<(), DecodeError> {
        Err(DecodeError::UnknownAssociation {
            entity: Self::SCHEMA.tag,
            association: association.to_string(),
        })
    }
}

// =============================================================================
// Field References
// =============================================================================

/// A typed handle on one attribute of `E`, used to build equality predicates.
pub struct Field<E> {
    name: &'static str,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Field<E> {
    pub const fn new(name: &'static str) -> Self {
        Field {
            name,
            _entity: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Looks the attribute up in `E`'s registration table.
    ///
    /// ## Panics
    /// When `E` declares no attribute with this name.
    pub fn resolve(&self) -> &'static FieldDef {
        E::SCHEMA.expect_field(self.name)
    }

    /// Forgets the static type, keeping the schema it belongs to.
    pub fn erase(self) -> FieldRef {
        FieldRef {
            schema: E::SCHEMA,
            name: self.name,
        }
    }
}

impl<E> Clone for Field<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Field<E> {}

impl<E: Entity> fmt::Debug for Field<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field({}.{})", E::SCHEMA.tag, self.name)
    }
}

/// A type-erased field reference, for lists that span several entity types
/// (the dependents named in a cascade).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FieldRef {
    schema: &'static EntitySchema,
    name: &'static str,
}

impl FieldRef {
    pub fn entity(&self) -> &'static str {
        self.schema.tag
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn resolve(&self) -> &'static FieldDef {
        self.schema.expect_field(self.name)
    }
}

impl fmt::Debug for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldRef({}.{})", self.schema.tag, self.name)
    }
}

impl<E: Entity> From<Field<E>> for FieldRef {
    fn from(field: Field<E>) -> Self {
        field.erase()
    }
}

// =============================================================================
// Associations
// =============================================================================

/// A reference from one entity to another.
///
/// Holds the target's identity and, once resolved by a join, the target
/// itself. Two refs are equal when they point at the same identity, whether
/// or not either one is resolved.
#[derive(Clone)]
pub struct Ref<T> {
    id: Option<i64>,
    target: Option<Box<T>>,
}

impl<T: Entity> Ref<T> {
    /// Points at nothing.
    pub fn none() -> Self {
        Ref {
            id: None,
            target: None,
        }
    }

    /// Points at an identity without holding the target.
    pub fn to_id(id: i64) -> Self {
        Ref {
            id: Some(id),
            target: None,
        }
    }

    /// Points at `target`, holding it.
    pub fn to(target: T) -> Self {
        Ref {
            id: target.id(),
            target: Some(Box::new(target)),
        }
    }

    pub(crate) fn from_column(id: Option<i64>) -> Self {
        Ref { id, target: None }
    }

    /// The referenced identity. A held target that has since been persisted
    /// wins over the identity captured at construction.
    pub fn id(&self) -> Option<i64> {
        self.target.as_ref().and_then(|t| t.id()).or(self.id)
    }

    pub fn is_set(&self) -> bool {
        self.id().is_some()
    }

    /// The target, if a join (or the constructor) provided it.
    pub fn get(&self) -> Option<&T> {
        self.target.as_deref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.target.as_deref_mut()
    }

    pub fn is_resolved(&self) -> bool {
        self.target.is_some()
    }

    /// Stores a fetched target.
    pub fn resolve(&mut self, target: T) {
        self.id = target.id().or(self.id);
        self.target = Some(Box::new(target));
    }

    /// Drops both identity and target.
    pub fn clear(&mut self) {
        self.id = None;
        self.target = None;
    }
}

impl<T: Entity> Default for Ref<T> {
    fn default() -> Self {
        Ref::none()
    }
}

impl<T: Entity> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl<T: Entity + fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.target, self.id()) {
            (Some(target), _) => write!(f, "Ref({:?})", target),
            (None, Some(id)) => write!(f, "Ref(#{})", id),
            (None, None) => write!(f, "Ref(none)"),
        }
    }
}

/// Reads a reference column into an unresolved [`Ref`].
pub fn ref_from_row<T: Entity>(row: &Row, column: &str) -> Result<Ref<T>, DecodeError> {
    Ok(Ref::from_column(row.opt_i64(column)?))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Value, ID_COLUMN};

    #[derive(Debug, Clone, PartialEq)]
    struct Shelf {
        id: Option<i64>,
        label: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Bin {
        id: Option<i64>,
        shelf: Ref<Shelf>,
    }

    impl Entity for Shelf {
        const SCHEMA: &'static EntitySchema = &EntitySchema {
            tag: "shelves",
            fields: &[FieldDef::scalar("label", FieldKind::Text)],
        };
        fn id(&self) -> Option<i64> {
            self.id
        }
        fn set_id(&mut self, id: i64) {
            self.id = Some(id);
        }
        fn to_row(&self) -> Row {
            Row::new().with("label", &self.label)
        }
        fn from_row(row: &Row) -> Result<Self, DecodeError> {
            Ok(Shelf {
                id: row.opt_i64(ID_COLUMN)?,
                label: row.text("label")?,
            })
        }
    }

    impl Entity for Bin {
        const SCHEMA: &'static EntitySchema = &EntitySchema {
            tag: "bins",
            fields: &[FieldDef::reference("shelf", "shelf_id", "shelves")],
        };
        fn id(&self) -> Option<i64> {
            self.id
        }
        fn set_id(&mut self, id: i64) {
            self.id = Some(id);
        }
        fn to_row(&self) -> Row {
            Row::new().with("shelf_id", self.shelf.id())
        }
        fn from_row(row: &Row) -> Result<Self, DecodeError> {
            Ok(Bin {
                id: row.opt_i64(ID_COLUMN)?,
                shelf: ref_from_row(row, "shelf_id")?,
            })
        }
    }

    #[test]
    fn test_field_resolves_against_its_schema() {
        let def = Field::<Bin>::new("shelf").resolve();
        assert_eq!(def.column, "shelf_id");
        assert_eq!(def.references, Some("shelves"));
    }

    #[test]
    #[should_panic(expected = "does not belong to entity 'shelves'")]
    fn test_unknown_field_panics() {
        Field::<Shelf>::new("width").resolve();
    }

    #[test]
    #[should_panic(expected = "is not an association")]
    fn test_join_on_scalar_panics() {
        Shelf::SCHEMA.expect_association("label");
    }

    #[test]
    fn test_erased_ref_keeps_owner() {
        let erased: FieldRef = Field::<Bin>::new("shelf").into();
        assert_eq!(erased.entity(), "bins");
        assert_eq!(erased.resolve().kind, FieldKind::Reference);
    }

    #[test]
    fn test_ref_identity_follows_target() {
        let mut shelf = Shelf {
            id: None,
            label: "A".to_string(),
        };
        let unsaved = Ref::to(shelf.clone());
        assert!(!unsaved.is_set());

        shelf.id = Some(3);
        let saved = Ref::to(shelf);
        assert_eq!(saved.id(), Some(3));
        assert_eq!(saved, Ref::to_id(3));
    }

    #[test]
    fn test_default_attach_rejects() {
        let mut shelf = Shelf {
            id: Some(1),
            label: "A".to_string(),
        };
        let err = shelf.attach("bins", &Row::new()).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownAssociation { .. }));
    }

    #[test]
    fn test_bin_row_carries_null_reference() {
        let bin = Bin {
            id: None,
            shelf: Ref::none(),
        };
        assert_eq!(bin.to_row().get("shelf_id"), Some(&Value::Null));
    }
}
