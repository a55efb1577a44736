#[macro_use]
extern crate rocket;

pub mod config;
pub mod guards;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod utils;
pub mod views;

use std::sync::Arc;

use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;

use crate::services::{Backend, BackendHandle};

fn mount(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .attach(Template::fairing())
        .mount("/", routes::routes())
        .register("/", routes::catchers())
}

/// Dashboard wired to an already constructed backend.
pub fn build(backend: Arc<dyn Backend>) -> Rocket<Build> {
    mount(rocket::build().manage(BackendHandle::new(backend)))
}

/// Dashboard whose backend is chosen by configuration at ignition.
pub fn from_config() -> Rocket<Build> {
    mount(rocket::build().attach(services::init()))
}
