#[macro_use]
extern crate rocket;

use rocket::fs::FileServer;
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;

use std::error::Error;

mod data;
mod error;
mod todo;


use data::{open_database, DBConnection};
use todo::{endpoints, pages};

#[rocket::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let rocket = rocket::build();

    let db_path: String = rocket
        .figment()
        .extract_inner("db_path")
        .unwrap_or_else(|_| String::from("todos.db"));
    let connection = open_database(&db_path)?;

    build_rocket(rocket, connection).launch().await?;

    Ok(())
}

fn build_rocket(rocket: Rocket<Build>, connection: DBConnection) -> Rocket<Build> {
    rocket
        .manage(connection)
        .attach(Template::fairing())
        .mount(
            "/api",
            routes![
                endpoints::get_todos,
                endpoints::get_todo,
                endpoints::add_todo,
                endpoints::set_todo,
                endpoints::delete_todo,
                endpoints::toggle_todo,
            ],
        )
        .mount(
            "/",
            routes![
                pages::index,
                pages::create_form,
                pages::create_submit,
                pages::edit_form,
                pages::edit_submit,
                pages::delete_confirm,
                pages::delete_submit,
                pages::toggle_submit,
            ],
        )
        .mount(
            "/",
            FileServer::from(concat!(env!("CARGO_MANIFEST_DIR"), "/web")).rank(15),
        )
        .register("/", catchers![pages::not_found, pages::internal_error])
}
