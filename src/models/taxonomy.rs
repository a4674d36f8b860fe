use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::DataType;

/// One named, typed slot in a taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: Uuid,
    pub taxonomy_id: Uuid,
    pub name: String,
    pub data_type: DataType,
    pub description: Option<String>,
    pub is_required: bool,
}

impl Field {
    pub fn new(taxonomy_id: Uuid, name: &str, data_type: DataType, is_required: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            taxonomy_id,
            name: name.to_string(),
            data_type,
            description: None,
            is_required,
        }
    }
}

/// Named, versioned set of fields that labels and predictions conform to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub is_active: bool,
    pub fields: Vec<Field>,
}

impl Taxonomy {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            version: None,
            is_active: true,
            fields: Vec::new(),
        }
    }

    /// Append a field owned by this taxonomy.
    pub fn with_field(mut self, name: &str, data_type: DataType, is_required: bool) -> Self {
        self.fields.push(Field::new(self.id, name, data_type, is_required));
        self
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_required)
    }
}
