#[macro_use] extern crate clap;

use clap::{App, ArgMatches};
use env_logger::Env;
use revprobe::{
    errors::ImageError, image::DEFAULT_REGISTRY_SUFFIX, Client, ImageCoordinates, RefreshToken,
};
use std::{env, process, time::Duration};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let yaml = load_yaml!("cli.yml");
    let matches = App::from_yaml(yaml).get_matches();

    let mut logger = match matches.value_of("log_level") {
        Some(filter) => {
            let mut logger = env_logger::Builder::new();
            logger.parse_filters(filter);
            logger
        }
        None => env_logger::Builder::from_env(Env::default().default_filter_or("warn")),
    };
    logger.init();

    let image = match image_coordinates(&matches) {
        Ok(image) => image,
        Err(err) => {
            log::error!("{}", err);
            process::exit(2);
        }
    };

    let timeout = match matches.value_of("timeout").map(parse_timeout) {
        None => None,
        Some(Ok(timeout)) => Some(timeout),
        Some(Err(value)) => {
            log::error!("invalid timeout {:?}, expected a positive number of seconds", value);
            process::exit(2);
        }
    };

    let client = match client(&matches, timeout) {
        Ok(client) => client,
        Err(err) => {
            log::error!("{}", err);
            process::exit(2);
        }
    };

    let token_env = matches
        .value_of("token_env")
        .unwrap_or("REGISTRY_REFRESH_TOKEN");
    let commit = match RefreshToken::new(env::var(token_env).unwrap_or_default()) {
        Ok(refresh_token) => client.resolve_commit(&image, &refresh_token).await,
        Err(err) => {
            log::warn!("no commit for {}: authentication failed: {} in ${}", image, err, token_env);
            None
        }
    };

    println!("{}", commit.unwrap_or_default());
}

fn image_coordinates(matches: &ArgMatches) -> Result<ImageCoordinates, ImageError> {
    ImageCoordinates::from_short_name(
        matches.value_of("registry").unwrap_or_default(),
        matches
            .value_of("registry_suffix")
            .unwrap_or(DEFAULT_REGISTRY_SUFFIX),
        matches.value_of("repository").unwrap_or_default(),
        matches.value_of("digest").unwrap_or_default(),
    )
}

fn parse_timeout(value: &str) -> Result<Duration, &str> {
    match value.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => Ok(Duration::from_secs_f64(seconds)),
        _ => Err(value),
    }
}

fn client(matches: &ArgMatches, timeout: Option<Duration>) -> Result<Client, ImageError> {
    let mut client = Client::builder();
    if let Some(label) = matches.value_of("label") {
        client = client.label(label);
    }
    if let Some(timeout) = timeout {
        client = client.request_timeout(timeout);
    }
    if matches.is_present("https_only") {
        client = client.disallow_http();
    }
    if matches.is_present("verify_digests") {
        client = client.verify_content_digests();
    }
    client.build()
}
