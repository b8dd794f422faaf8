use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{delete, get, patch, post, put, State};

use crate::data::DBConnection;
use crate::error::{AppError, AppResult};

use super::data::*;
use super::helpers::*;

#[get("/todos")]
pub fn get_todos(db_connection: &State<DBConnection>) -> AppResult<Json<Vec<Todo>>> {
    let db_connection = db_connection.lock()?;

    let todos = get_all_todos_from_db(&db_connection)?;

    Ok(Json(todos))
}

#[get("/todos/<id>")]
pub fn get_todo(id: TodoID, db_connection: &State<DBConnection>) -> AppResult<Json<Todo>> {
    let db_connection = db_connection.lock()?;

    get_todo_from_db(&db_connection, id).map(Json)
}

#[post("/todos", format = "json", data = "<new_todo>")]
pub fn add_todo(
    new_todo: Json<NewTodo>,
    db_connection: &State<DBConnection>,
) -> AppResult<status::Created<Json<Todo>>> {
    let db_connection = db_connection.lock()?;

    let todo = add_todo_to_db(&db_connection, new_todo.into_inner())?;
    let location = format!("/api/todos/{}", todo.id);

    Ok(status::Created::new(location).body(Json(todo)))
}

#[put("/todos/<id>", format = "json", data = "<update_request>")]
pub fn set_todo(
    id: TodoID,
    update_request: Json<UpdateTodoRequest>,
    db_connection: &State<DBConnection>,
) -> AppResult<status::NoContent> {
    let update_request = update_request.into_inner();
    if update_request.id != id {
        return Err(AppError::Validation(format!(
            "path id {} does not match body id {}",
            id, update_request.id
        )));
    }

    let db_connection = db_connection.lock()?;
    update_todo_in_db(&db_connection, id, update_request.into_update())?;

    Ok(status::NoContent)
}

#[delete("/todos/<id>")]
pub fn delete_todo(
    id: TodoID,
    db_connection: &State<DBConnection>,
) -> AppResult<status::NoContent> {
    let db_connection = db_connection.lock()?;

    delete_todo_from_db(&db_connection, id)?;

    Ok(status::NoContent)
}

#[patch("/todos/<id>/toggle")]
pub fn toggle_todo(id: TodoID, db_connection: &State<DBConnection>) -> AppResult<Json<Todo>> {
    let db_connection = db_connection.lock()?;

    toggle_todo_in_db(&db_connection, id).map(Json)
}
