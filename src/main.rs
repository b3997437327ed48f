use log::error;

#[rocket::main]
async fn main() {
    // before the journal is opened, so a failure to open it is logged
    catalog_arena::init_logging();
    let rocket = match catalog_arena::rocket_initialize() {
        Ok(rocket) => rocket,
        Err(e) => {
            error!("Cannot start: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rocket.launch().await {
        error!("Server stopped with an error: {e}");
        std::process::exit(1);
    }
}
