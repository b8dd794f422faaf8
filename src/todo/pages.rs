use chrono::NaiveDate;
use rocket::form::Form;
use rocket::response::Redirect;
use rocket::{catch, get, post, uri, Responder, State};
use rocket_dyn_templates::{context, Template};
use rusqlite::Connection;
use serde::Serialize;

use crate::data::DBConnection;
use crate::error::{AppError, AppResult};

use super::data::*;
use super::helpers::*;

/// Successful form posts redirect back to the list; rejected ones
/// re-render the form with a message and the submitted values.
#[derive(Responder)]
pub enum FormOutcome {
    Done(Redirect),
    Retry(Template),
}

#[derive(Serialize)]
struct TodoFormView {
    id: TodoID,
    title: String,
    description: String,
    is_complete: bool,
    due_date: String,
}

impl TodoFormView {
    fn from_form(form: &EditTodoForm) -> TodoFormView {
        TodoFormView {
            id: form.id,
            title: form.title.clone(),
            description: form.description.clone().unwrap_or_default(),
            is_complete: form.is_complete,
            due_date: form.due_date.clone().unwrap_or_default(),
        }
    }
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_due_date_field(raw: Option<&str>) -> AppResult<Option<NaiveDate>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::Validation(format!("invalid due date: {}", value))),
    }
}

#[get("/")]
pub fn index(db_connection: &State<DBConnection>) -> AppResult<Template> {
    let db_connection = db_connection.lock()?;

    let todos = get_all_todos_from_db(&db_connection)?;

    Ok(Template::render("index", context! { todos: todos }))
}

#[get("/create")]
pub fn create_form() -> Template {
    Template::render(
        "create",
        context! {
            error: Option::<String>::None,
            title: "",
            description: "",
            due_date: "",
        },
    )
}

#[post("/create", data = "<form>")]
pub fn create_submit(
    form: Form<CreateTodoForm>,
    db_connection: &State<DBConnection>,
) -> AppResult<FormOutcome> {
    let form = form.into_inner();
    let db_connection = db_connection.lock()?;

    match submit_create(&db_connection, &form) {
        Ok(()) => Ok(FormOutcome::Done(Redirect::to(uri!(index)))),
        Err(AppError::Validation(message)) => Ok(FormOutcome::Retry(Template::render(
            "create",
            context! {
                error: message,
                title: form.title,
                description: form.description.unwrap_or_default(),
                due_date: form.due_date.unwrap_or_default(),
            },
        ))),
        Err(other) => Err(other),
    }
}

fn submit_create(db_connection: &Connection, form: &CreateTodoForm) -> AppResult<()> {
    let due_date = parse_due_date_field(form.due_date.as_deref())?;

    add_todo_to_db(
        db_connection,
        NewTodo {
            title: form.title.clone(),
            description: none_if_blank(form.description.clone()),
            due_date,
        },
    )?;

    Ok(())
}

#[get("/edit/<id>")]
pub fn edit_form(id: TodoID, db_connection: &State<DBConnection>) -> AppResult<Template> {
    let db_connection = db_connection.lock()?;

    let todo = get_todo_from_db(&db_connection, id)?;

    Ok(Template::render(
        "edit",
        context! { error: Option::<String>::None, todo: todo },
    ))
}

#[post("/edit/<id>", data = "<form>")]
pub fn edit_submit(
    id: TodoID,
    form: Form<EditTodoForm>,
    db_connection: &State<DBConnection>,
) -> AppResult<FormOutcome> {
    let form = form.into_inner();
    if form.id != id {
        return Err(AppError::NotFound);
    }

    let db_connection = db_connection.lock()?;

    match submit_edit(&db_connection, id, &form) {
        Ok(()) => Ok(FormOutcome::Done(Redirect::to(uri!(index)))),
        Err(AppError::Validation(message)) => Ok(FormOutcome::Retry(Template::render(
            "edit",
            context! {
                error: message,
                todo: TodoFormView::from_form(&form),
            },
        ))),
        Err(other) => Err(other),
    }
}

fn submit_edit(db_connection: &Connection, id: TodoID, form: &EditTodoForm) -> AppResult<()> {
    let due_date = parse_due_date_field(form.due_date.as_deref())?;

    update_todo_in_db(
        db_connection,
        id,
        TodoUpdate {
            title: form.title.clone(),
            description: none_if_blank(form.description.clone()),
            is_complete: form.is_complete,
            due_date,
        },
    )
}

#[get("/delete/<id>")]
pub fn delete_confirm(id: TodoID, db_connection: &State<DBConnection>) -> AppResult<Template> {
    let db_connection = db_connection.lock()?;

    let todo = get_todo_from_db(&db_connection, id)?;

    Ok(Template::render("delete", context! { todo: todo }))
}

#[post("/delete/<id>")]
pub fn delete_submit(id: TodoID, db_connection: &State<DBConnection>) -> AppResult<Redirect> {
    let db_connection = db_connection.lock()?;

    delete_todo_from_db(&db_connection, id)?;

    Ok(Redirect::to(uri!(index)))
}

/// No-script fallback for the completion toggle; the browser script
/// calls the JSON API instead.
#[post("/toggle/<id>")]
pub fn toggle_submit(id: TodoID, db_connection: &State<DBConnection>) -> AppResult<Redirect> {
    let db_connection = db_connection.lock()?;

    toggle_todo_in_db(&db_connection, id)?;

    Ok(Redirect::to(uri!(index)))
}

#[catch(404)]
pub fn not_found() -> Template {
    Template::render(
        "404",
        context! { message: "The todo you are looking for does not exist. It may have been deleted." },
    )
}

#[catch(500)]
pub fn internal_error() -> Template {
    Template::render(
        "500",
        context! { message: "Something went wrong while talking to the store. Please try again." },
    )
}
