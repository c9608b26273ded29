use serde::Serialize;

use crate::entities::families;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Family {
    pub id: i32,
    pub family_name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<families::Model> for Family {
    fn from(model: families::Model) -> Self {
        Self {
            id: model.id,
            family_name: model.family_name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
