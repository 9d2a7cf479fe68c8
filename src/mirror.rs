//! Layout descriptor for native-engine mirroring.
//!
//! Header generators mirror [`BasketEvent`](crate::BasketEvent),
//! [`BasketEventLog`](crate::BasketEventLog), [`TimeIndexPolicy`] and
//! [`DuplicatePolicy`] field-for-field and value-for-value. This module is the
//! machine-readable form of that contract. Any rename, reorder or renumber is
//! a breaking change and must bump [`MIRROR_VERSION`].

use serde::Serialize;

use crate::policy::{DuplicatePolicy, TimeIndexPolicy};

/// Version of the mirrored layout.
pub const MIRROR_VERSION: u32 = 1;

/// Type of a mirrored struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Caller-chosen key type, opaque to the engine.
    OpaqueKey,
    /// One-byte boolean.
    Bool,
    /// Ordered list of another mirrored struct.
    ListOf(&'static str),
}

/// One field of a mirrored struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: &'static str,
    /// Field type.
    pub ty: FieldType,
}

/// A mirrored struct layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructDescriptor {
    /// Struct name.
    pub name: &'static str,
    /// Fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
}

/// One member of a mirrored enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumMember {
    /// Member name as exported.
    pub name: &'static str,
    /// Fixed discriminant.
    pub value: u8,
}

/// A mirrored enum with its discriminants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumDescriptor {
    /// Enum name.
    pub name: &'static str,
    /// Members in discriminant order.
    pub members: Vec<EnumMember>,
}

/// The complete mirrored layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirrorSchema {
    /// Layout version, see [`MIRROR_VERSION`].
    pub version: u32,
    /// Mirrored structs.
    pub structs: Vec<StructDescriptor>,
    /// Mirrored enums.
    pub enums: Vec<EnumDescriptor>,
}

impl MirrorSchema {
    /// The layout this build of the crate exposes.
    #[must_use]
    pub fn current() -> Self {
        Self {
            version: MIRROR_VERSION,
            structs: vec![
                StructDescriptor {
                    name: "BasketEvent",
                    fields: vec![
                        FieldDescriptor {
                            name: "key",
                            ty: FieldType::OpaqueKey,
                        },
                        FieldDescriptor {
                            name: "added",
                            ty: FieldType::Bool,
                        },
                    ],
                },
                StructDescriptor {
                    name: "BasketEventLog",
                    fields: vec![FieldDescriptor {
                        name: "events",
                        ty: FieldType::ListOf("BasketEvent"),
                    }],
                },
            ],
            enums: vec![
                EnumDescriptor {
                    name: "TimeIndexPolicy",
                    members: TimeIndexPolicy::ALL
                        .into_iter()
                        .map(|p| EnumMember {
                            name: p.name(),
                            value: p.as_u8(),
                        })
                        .collect(),
                },
                EnumDescriptor {
                    name: "DuplicatePolicy",
                    members: DuplicatePolicy::ALL
                        .into_iter()
                        .map(|p| EnumMember {
                            name: p.name(),
                            value: p.as_u8(),
                        })
                        .collect(),
                },
            ],
        }
    }

    /// Looks up a struct by name.
    pub fn struct_named(&self, name: &str) -> Option<&StructDescriptor> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Looks up an enum by name.
    pub fn enum_named(&self, name: &str) -> Option<&EnumDescriptor> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// Pretty JSON for generator tooling.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basket_event_field_order() {
        let schema = MirrorSchema::current();
        let event = schema.struct_named("BasketEvent").unwrap();
        let names: Vec<_> = event.fields.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["key", "added"]);
        assert_eq!(event.fields[1].ty, FieldType::Bool);
    }

    #[test]
    fn test_enum_discriminants_locked() {
        let schema = MirrorSchema::current();

        let policy = schema.enum_named("TimeIndexPolicy").unwrap();
        let members: Vec<_> = policy.members.iter().map(|m| (m.name, m.value)).collect();
        assert_eq!(
            members,
            vec![("INCLUSIVE", 1), ("EXCLUSIVE", 2), ("EXTRAPOLATE", 3)]
        );

        let duplicates = schema.enum_named("DuplicatePolicy").unwrap();
        let members: Vec<_> = duplicates.members.iter().map(|m| (m.name, m.value)).collect();
        assert_eq!(members, vec![("LAST_VALUE", 1), ("FIRST_VALUE", 2)]);
    }

    #[test]
    fn test_version() {
        assert_eq!(MirrorSchema::current().version, MIRROR_VERSION);
    }

    #[test]
    fn test_to_json() {
        let json = MirrorSchema::current().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["structs"][1]["fields"][0]["ty"]["list_of"], "BasketEvent");
        assert_eq!(value["enums"][0]["members"][2]["value"], 3);
    }
}
