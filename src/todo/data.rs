use chrono::{DateTime, NaiveDate, Utc};
use rocket::FromForm;
use serde::{Deserialize, Serialize};

pub type TodoID = i64;

/// One task. `id` and `created_date` are assigned by the store and never
/// change afterwards; everything else is editable.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoID,
    pub title: String,
    pub description: Option<String>,
    pub is_complete: bool,
    pub created_date: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
}

/// Fields accepted when creating a todo.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Fields applied by an update. `created_date` is deliberately absent:
/// the stored value is re-read and reasserted on every edit.
#[derive(Debug, Clone)]
pub struct TodoUpdate {
    pub title: String,
    pub description: Option<String>,
    pub is_complete: bool,
    pub due_date: Option<NaiveDate>,
}

/// Full-resource body of a PUT. A supplied `createdDate` is accepted for
/// wire compatibility and then ignored.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    pub id: TodoID,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl UpdateTodoRequest {
    pub fn into_update(self) -> TodoUpdate {
        TodoUpdate {
            title: self.title,
            description: self.description,
            is_complete: self.is_complete,
            due_date: self.due_date,
        }
    }
}

#[derive(FromForm, Debug)]
pub struct CreateTodoForm {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
}

#[derive(FromForm, Debug)]
pub struct EditTodoForm {
    pub id: TodoID,
    pub title: String,
    pub description: Option<String>,
    #[field(default = false)]
    pub is_complete: bool,
    pub due_date: Option<String>,
}
