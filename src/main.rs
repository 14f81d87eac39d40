use log::{error, info, LevelFilter};

async fn run() -> Result<(), rocket::Error> {
    info!("Configuring VoteHub...");
    let rocket = votehub_backend::build().ignite().await?;
    info!("...configuration complete!");
    // Rocket's own request logging is redundant with the logger fairing,
    // which also announces the listen address at liftoff.
    log4rs_dynamic_filters::DynamicLevelFilter::set("rocket", LevelFilter::Off);
    let _ = rocket.launch().await?;
    Ok(())
}

#[rocket::main]
async fn main() {
    // Set up logging.
    log4rs::init_file("log4rs.yaml", log4rs_dynamic_filters::default_deserializers())
        .expect("Failed to load log4rs.yaml");
    info!("Logging online");

    // Launch server.
    if let Err(err) = run().await {
        error!("{err}");
        error!("Fatal error, shutting down");
        std::process::exit(1)
    }
}
