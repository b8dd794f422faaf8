use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use crate::error::{AppError, AppResult};

use super::data::*;

pub const MAX_TITLE_LEN: usize = 100;

const TODO_COLUMNS: &str = "id, title, description, is_complete, created_date, due_date";

/// Timestamps are kept as fixed-width RFC 3339 text so that string
/// ordering in SQL matches chronological ordering.
fn format_created_date(created_date: &DateTime<Utc>) -> String {
    created_date.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_created_date(raw: &str) -> chrono::ParseResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw).map(|parsed| parsed.with_timezone(&Utc))
}

fn format_due_date(due_date: &NaiveDate) -> String {
    due_date.format("%Y-%m-%d").to_string()
}

pub fn validate_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::Validation(String::from("title must not be empty")));
    }

    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::Validation(format!(
            "title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }

    Ok(())
}

fn todo_from_row(row: &Row) -> rusqlite::Result<Todo> {
    let created_raw: String = row.get(4)?;
    let created_date = parse_created_date(&created_raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    let due_raw: Option<String> = row.get(5)?;
    let due_date = match due_raw {
        Some(raw) => Some(
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e))
            })?,
        ),
        None => None,
    };

    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        is_complete: row.get(3)?,
        created_date,
        due_date,
    })
}

pub fn get_all_todos_from_db(db_connection: &Connection) -> AppResult<Vec<Todo>> {
    let mut todos_statement = db_connection.prepare(&format!(
        "SELECT {} FROM todos ORDER BY created_date DESC, id DESC",
        TODO_COLUMNS
    ))?;

    let todo_rows = todos_statement.query_map(params![], |row| todo_from_row(row))?;

    let mut todos = vec![];
    for row_result in todo_rows {
        todos.push(row_result?);
    }

    Ok(todos)
}

pub fn get_todo_from_db(db_connection: &Connection, todo_id: TodoID) -> AppResult<Todo> {
    let todo = db_connection.query_row(
        &format!("SELECT {} FROM todos WHERE id = (?1)", TODO_COLUMNS),
        params![todo_id],
        |row| todo_from_row(row),
    )?;

    Ok(todo)
}

pub fn todo_exists_in_db(db_connection: &Connection, todo_id: TodoID) -> AppResult<bool> {
    let exists: bool = db_connection.query_row(
        "SELECT EXISTS (SELECT 1 FROM todos WHERE id = (?1))",
        params![todo_id],
        |row| row.get(0),
    )?;

    Ok(exists)
}

pub fn add_todo_to_db(db_connection: &Connection, new_todo: NewTodo) -> AppResult<Todo> {
    validate_title(&new_todo.title)?;

    // Sub-microsecond precision would not survive the text round trip.
    let created_date = Utc::now().trunc_subsecs(6);

    db_connection.execute(
        "INSERT INTO todos (title, description, is_complete, created_date, due_date)
         VALUES ((?1), (?2), 0, (?3), (?4))",
        params![
            new_todo.title,
            new_todo.description,
            format_created_date(&created_date),
            new_todo.due_date.as_ref().map(format_due_date),
        ],
    )?;
    let id = db_connection.last_insert_rowid();

    Ok(Todo {
        id,
        title: new_todo.title,
        description: new_todo.description,
        is_complete: false,
        created_date,
        due_date: new_todo.due_date,
    })
}

/// Overwrites every editable field. The stored creation time is re-read
/// and written back, so nothing a caller supplies can change it. A row
/// that disappears between the read and the write reports not-found, and
/// a write failure against a row that still exists is a fatal conflict.
pub fn update_todo_in_db(
    db_connection: &Connection,
    todo_id: TodoID,
    update: TodoUpdate,
) -> AppResult<()> {
    validate_title(&update.title)?;

    let created_raw: String = db_connection.query_row(
        "SELECT created_date FROM todos WHERE id = (?1)",
        params![todo_id],
        |row| row.get(0),
    )?;

    let result = db_connection.execute(
        "UPDATE todos
         SET title = (?1), description = (?2), is_complete = (?3),
             created_date = (?4), due_date = (?5)
         WHERE id = (?6)",
        params![
            update.title,
            update.description,
            update.is_complete,
            created_raw,
            update.due_date.as_ref().map(format_due_date),
            todo_id,
        ],
    );

    match result {
        Ok(0) => Err(AppError::NotFound),
        Ok(_) => Ok(()),
        Err(e) => Err(reclassify_write_error(db_connection, todo_id, e)),
    }
}

pub fn delete_todo_from_db(db_connection: &Connection, todo_id: TodoID) -> AppResult<()> {
    let result = db_connection.execute("DELETE FROM todos WHERE id = (?1)", params![todo_id]);

    match result {
        Ok(0) => Err(AppError::NotFound),
        Ok(_) => Ok(()),
        Err(e) => Err(reclassify_write_error(db_connection, todo_id, e)),
    }
}

pub fn toggle_todo_in_db(db_connection: &Connection, todo_id: TodoID) -> AppResult<Todo> {
    let mut todo = get_todo_from_db(db_connection, todo_id)?;
    todo.is_complete = !todo.is_complete;

    let result = db_connection.execute(
        "UPDATE todos SET is_complete = (?1) WHERE id = (?2)",
        params![todo.is_complete, todo_id],
    );

    match result {
        Ok(0) => Err(AppError::NotFound),
        Ok(_) => Ok(todo),
        Err(e) => Err(reclassify_write_error(db_connection, todo_id, e)),
    }
}

/// A missing row always wins over a conflicting one: only report the
/// original failure when the row is still there.
fn reclassify_write_error(
    db_connection: &Connection,
    todo_id: TodoID,
    error: rusqlite::Error,
) -> AppError {
    match todo_exists_in_db(db_connection, todo_id) {
        Ok(false) => AppError::NotFound,
        Ok(true) => AppError::Conflict(error.to_string()),
        Err(probe_error) => probe_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::init_schema;

    fn test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        init_schema(&connection).unwrap();
        connection
    }

    fn new_todo(title: &str) -> NewTodo {
        NewTodo {
            title: String::from(title),
            description: None,
            due_date: None,
        }
    }

    fn insert_with_created_date(connection: &Connection, title: &str, created_date: &str) {
        connection
            .execute(
                "INSERT INTO todos (title, description, is_complete, created_date, due_date)
                 VALUES ((?1), NULL, 0, (?2), NULL)",
                params![title, created_date],
            )
            .unwrap();
    }

    #[test]
    fn add_assigns_id_and_round_trips_fields() {
        let connection = test_connection();

        let created = add_todo_to_db(
            &connection,
            NewTodo {
                title: String::from("Water the plants"),
                description: Some(String::from("The ones on the balcony")),
                due_date: Some(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()),
            },
        )
        .unwrap();

        assert!(created.id > 0);
        assert!(!created.is_complete);

        let fetched = get_todo_from_db(&connection, created.id).unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.title, "Water the plants");
        assert_eq!(fetched.description.as_deref(), Some("The ones on the balcony"));
        assert_eq!(fetched.due_date, created.due_date);
        assert_eq!(fetched.created_date, created.created_date);
    }

    #[test]
    fn add_rejects_blank_title_and_persists_nothing() {
        let connection = test_connection();

        assert!(matches!(
            add_todo_to_db(&connection, new_todo("")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            add_todo_to_db(&connection, new_todo("   ")),
            Err(AppError::Validation(_))
        ));

        assert!(get_all_todos_from_db(&connection).unwrap().is_empty());
    }

    #[test]
    fn add_enforces_title_length_limit() {
        let connection = test_connection();

        let at_limit = "x".repeat(MAX_TITLE_LEN);
        assert!(add_todo_to_db(&connection, new_todo(&at_limit)).is_ok());

        let over_limit = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(matches!(
            add_todo_to_db(&connection, new_todo(&over_limit)),
            Err(AppError::Validation(_))
        ));

        assert_eq!(get_all_todos_from_db(&connection).unwrap().len(), 1);
    }

    #[test]
    fn update_preserves_created_date() {
        let connection = test_connection();
        let created = add_todo_to_db(&connection, new_todo("Original")).unwrap();

        update_todo_in_db(
            &connection,
            created.id,
            TodoUpdate {
                title: String::from("Changed"),
                description: Some(String::from("now with details")),
                is_complete: true,
                due_date: Some(NaiveDate::from_ymd_opt(2027, 1, 15).unwrap()),
            },
        )
        .unwrap();

        let fetched = get_todo_from_db(&connection, created.id).unwrap();
        assert_eq!(fetched.title, "Changed");
        assert!(fetched.is_complete);
        assert_eq!(fetched.created_date, created.created_date);
    }

    #[test]
    fn update_rejects_invalid_title_without_writing() {
        let connection = test_connection();
        let created = add_todo_to_db(&connection, new_todo("Keep me")).unwrap();

        let result = update_todo_in_db(
            &connection,
            created.id,
            TodoUpdate {
                title: String::new(),
                description: None,
                is_complete: true,
                due_date: None,
            },
        );
        assert!(matches!(result, Err(AppError::Validation(_))));

        let fetched = get_todo_from_db(&connection, created.id).unwrap();
        assert_eq!(fetched.title, "Keep me");
        assert!(!fetched.is_complete);
    }

    #[test]
    fn list_returns_newest_first() {
        let connection = test_connection();
        insert_with_created_date(&connection, "a", "2026-01-01T08:00:00.000000Z");
        insert_with_created_date(&connection, "b", "2026-01-02T08:00:00.000000Z");
        insert_with_created_date(&connection, "c", "2026-01-03T08:00:00.000000Z");

        let titles: Vec<String> = get_all_todos_from_db(&connection)
            .unwrap()
            .into_iter()
            .map(|todo| todo.title)
            .collect();

        assert_eq!(titles, vec!["c", "b", "a"]);
    }

    #[test]
    fn list_breaks_created_date_ties_by_id() {
        let connection = test_connection();
        insert_with_created_date(&connection, "first", "2026-01-01T08:00:00.000000Z");
        insert_with_created_date(&connection, "second", "2026-01-01T08:00:00.000000Z");

        let titles: Vec<String> = get_all_todos_from_db(&connection)
            .unwrap()
            .into_iter()
            .map(|todo| todo.title)
            .collect();

        assert_eq!(titles, vec!["second", "first"]);
    }

    #[test]
    fn toggle_flips_exactly_once_per_call() {
        let connection = test_connection();
        let created = add_todo_to_db(&connection, new_todo("Flip me")).unwrap();

        let toggled = toggle_todo_in_db(&connection, created.id).unwrap();
        assert!(toggled.is_complete);
        assert!(get_todo_from_db(&connection, created.id).unwrap().is_complete);

        let toggled_back = toggle_todo_in_db(&connection, created.id).unwrap();
        assert!(!toggled_back.is_complete);
        assert!(!get_todo_from_db(&connection, created.id).unwrap().is_complete);
    }

    #[test]
    fn missing_id_reports_not_found_everywhere() {
        let connection = test_connection();

        assert!(matches!(
            get_todo_from_db(&connection, 999),
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            update_todo_in_db(
                &connection,
                999,
                TodoUpdate {
                    title: String::from("anything"),
                    description: None,
                    is_complete: false,
                    due_date: None,
                }
            ),
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            delete_todo_from_db(&connection, 999),
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            toggle_todo_in_db(&connection, 999),
            Err(AppError::NotFound)
        ));
    }

    #[test]
    fn update_after_delete_reports_not_found() {
        let connection = test_connection();
        let created = add_todo_to_db(&connection, new_todo("Short-lived")).unwrap();

        delete_todo_from_db(&connection, created.id).unwrap();

        let result = update_todo_in_db(
            &connection,
            created.id,
            TodoUpdate {
                title: String::from("Too late"),
                description: None,
                is_complete: false,
                due_date: None,
            },
        );
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[test]
    fn deleted_ids_are_not_reused() {
        let connection = test_connection();
        let first = add_todo_to_db(&connection, new_todo("first")).unwrap();
        delete_todo_from_db(&connection, first.id).unwrap();

        let second = add_todo_to_db(&connection, new_todo("second")).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn exists_probe_tracks_row_lifetime() {
        let connection = test_connection();
        let created = add_todo_to_db(&connection, new_todo("Here and gone")).unwrap();

        assert!(todo_exists_in_db(&connection, created.id).unwrap());
        delete_todo_from_db(&connection, created.id).unwrap();
        assert!(!todo_exists_in_db(&connection, created.id).unwrap());
    }
}
