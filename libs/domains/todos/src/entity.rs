use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use crate::models::{Todo, TodoDraft};

/// Row of the `todo` table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "todo")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "Text")]
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub deadline: DateTimeWithTimeZone,
    pub completed: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Todo {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            deadline: model.deadline.into(),
            completed: model.completed,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

// New row; the id comes from the sequence.
impl From<TodoDraft> for ActiveModel {
    fn from(draft: TodoDraft) -> Self {
        let now: DateTimeWithTimeZone = chrono::Utc::now().into();
        ActiveModel {
            id: NotSet,
            name: Set(draft.name),
            description: Set(draft.description),
            deadline: Set(draft.deadline.into()),
            completed: Set(draft.completed),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}
