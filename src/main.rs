use dotenvy::dotenv;
use rocket::{Build, Rocket};

#[rocket::launch]
fn rocket() -> Rocket<Build> {
    dotenv().ok();
    env_logger::init();

    log::info!("🚀 EcoWaste admin dashboard starting");
    ecowaste_admin::from_config()
}
