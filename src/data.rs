use rusqlite::{params, Connection};

use std::sync::{Arc, Mutex};

use crate::error::AppResult;
use crate::todo::data::NewTodo;
use crate::todo::helpers::add_todo_to_db;

pub type DBConnection = Arc<Mutex<Connection>>;

/// Opens (or creates) the database file, makes sure the schema exists
/// and loads the starter rows into a freshly created empty store.
pub fn open_database(path: &str) -> AppResult<DBConnection> {
    let connection = Connection::open(path)?;

    init_schema(&connection)?;
    seed_todos(&connection)?;

    Ok(Arc::new(Mutex::new(connection)))
}

pub fn init_schema(connection: &Connection) -> AppResult<()> {
    // AUTOINCREMENT keeps the ids of deleted rows from ever coming back.
    connection.execute(
        "CREATE TABLE IF NOT EXISTS todos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            is_complete INTEGER NOT NULL DEFAULT 0,
            created_date TEXT NOT NULL,
            due_date TEXT
        )",
        params![],
    )?;

    Ok(())
}

/// Fixed starter fixtures for a first run. A store that already holds
/// rows is left untouched.
pub fn seed_todos(connection: &Connection) -> AppResult<()> {
    let count: i64 =
        connection.query_row("SELECT COUNT(*) FROM todos", params![], |row| row.get(0))?;
    if count > 0 {
        return Ok(());
    }

    let fixtures = [
        (
            "Learn Rocket basics",
            "Routing, request guards and managed state",
        ),
        (
            "Learn rusqlite",
            "Prepared statements and parameter binding",
        ),
        (
            "Build a complete web app",
            "Wire the templates and the JSON API together",
        ),
    ];

    for (title, description) in fixtures {
        add_todo_to_db(
            connection,
            NewTodo {
                title: String::from(title),
                description: Some(String::from(description)),
                due_date: None,
            },
        )?;
    }

    Ok(())
}
